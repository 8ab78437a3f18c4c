//! Data table component types.
//!
//! These types describe the list tables in the admin panel: which columns
//! they show, which filters sit above them, and how a page of rows is cut.

use serde::{Deserialize, Serialize};

use coza_core::UserRole;

/// Rows per page on paginated tables.
pub const PAGE_SIZE: usize = 10;

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Right-align numeric columns.
    pub numeric: bool,
}

impl TableColumn {
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            numeric: false,
        }
    }

    #[must_use]
    pub fn numeric(key: &str, label: &str) -> Self {
        Self {
            numeric: true,
            ..Self::new(key, label)
        }
    }
}

/// Option for select filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Select filter shown next to the search box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFilter {
    /// Query parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Available options; the empty value means "any".
    pub options: Vec<FilterOption>,
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
}

impl DataTableConfig {
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            search_placeholder: "Search...".to_string(),
            empty_title: "No items found".to_string(),
            empty_description: None,
        }
    }

    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }
}

/// One page of rows plus what the pager needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number, clamped to the available range.
    pub number: usize,
    pub total_pages: usize,
    /// Rows across all pages.
    pub total_items: usize,
}

impl<T> Page<T> {
    /// Cut page `number` (1-based) out of `rows`. Out-of-range numbers snap
    /// to the nearest page; an empty list still has one (empty) page.
    #[must_use]
    pub fn paginate(rows: Vec<T>, number: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_items = rows.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let number = number.clamp(1, total_pages);

        let items = rows
            .into_iter()
            .skip((number - 1) * per_page)
            .take(per_page)
            .collect();

        Self {
            items,
            number,
            total_pages,
            total_items,
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// Build the products table configuration.
#[must_use]
pub fn products_table_config() -> DataTableConfig {
    DataTableConfig::new("products")
        .column(TableColumn::new("image", ""))
        .column(TableColumn::new("name", "Product"))
        .column(TableColumn::new("category", "Category"))
        .column(TableColumn::numeric("price", "Price"))
        .column(TableColumn::numeric("stock", "Stock"))
        .column(TableColumn::new("flags", "Flags"))
        .search_placeholder("Search by name or category...")
        .empty_state(
            "No products found",
            Some("Add a product or try a different search"),
        )
}

/// Build the users table configuration.
#[must_use]
pub fn users_table_config() -> DataTableConfig {
    let mut roles = vec![FilterOption::new("", "All roles")];
    roles.extend(UserRole::ALL.iter().map(|role| {
        let label = match role {
            UserRole::Customer => "Customers",
            UserRole::Admin => "Admins",
        };
        FilterOption::new(role.as_str(), label)
    }));

    DataTableConfig::new("users")
        .column(TableColumn::new("name", "Name"))
        .column(TableColumn::new("email", "Email"))
        .column(TableColumn::new("phone", "Phone"))
        .column(TableColumn::new("role", "Role"))
        .column(TableColumn::new("joined", "Joined"))
        .filter(TableFilter {
            key: "role".to_string(),
            label: "Role".to_string(),
            options: roles,
        })
        .search_placeholder("Search by name, email or phone...")
        .empty_state("No users found", Some("Try adjusting your search or filters"))
}
