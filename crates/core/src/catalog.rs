//! Product model and the shop listing pipeline.
//!
//! The storefront reads the whole product collection and narrows it in memory:
//! a free-text query, a category, and a price bucket filter the list, then a
//! single stable sort orders it. Everything here is a pure function of its
//! inputs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Categories offered by the shop filter, in display order.
pub const CATEGORIES: [&str; 6] = ["All", "Women", "Men", "Bag", "Shoes", "Watches"];

/// Categories a product can be filed under.
pub const PRODUCT_CATEGORIES: [&str; 5] = ["Women", "Men", "Bag", "Shoes", "Watches"];

/// Stock level below which the admin dashboard flags a product.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Pre-sale price, shown struck through when the product is on sale.
    pub original_price: Option<Price>,
    pub image: String,
    pub category: String,
    /// Average review score, 0 to 5.
    pub rating: Decimal,
    pub reviews: u32,
    pub stock: u32,
    pub is_sale: bool,
    pub is_new: bool,
    pub featured: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whole-percent discount against the original price, if there is one.
    ///
    /// ```
    /// # use coza_core::{Price, Product, ProductId};
    /// # use rust_decimal::Decimal;
    /// # let mut product = Product {
    /// #     id: ProductId::parse("p").unwrap(), name: "Shirt".into(),
    /// #     price: Price::parse("75").unwrap(), original_price: None,
    /// #     image: String::new(), category: "Men".into(), rating: Decimal::ZERO,
    /// #     reviews: 0, stock: 1, is_sale: true, is_new: false, featured: true,
    /// #     description: String::new(), created_at: chrono::Utc::now(),
    /// # };
    /// product.original_price = Some(Price::parse("100").unwrap());
    /// assert_eq!(product.discount_percent(), Some(25));
    /// ```
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?.amount();
        let price = self.price.amount();
        if original <= price || original.is_zero() {
            return None;
        }
        ((original - price) / original * Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock < LOW_STOCK_THRESHOLD
    }
}

/// Category selection in the shop filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Parse a category selection. Blank input and `all` (any case) select
    /// everything.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(s.to_owned())
        }
    }

    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected.to_lowercase() == category.to_lowercase(),
        }
    }

    /// Label to compare against [`CATEGORIES`] when rendering the filter.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::All => "All",
            Self::Only(selected) => selected,
        }
    }
}

/// Price range selection in the shop filter. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceBucket {
    #[default]
    Any,
    Under50,
    From50To100,
    From100To200,
    Over200,
}

impl PriceBucket {
    /// All buckets in display order.
    pub const ALL: [Self; 5] = [
        Self::Any,
        Self::Under50,
        Self::From50To100,
        Self::From100To200,
        Self::Over200,
    ];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Any => "All Prices",
            Self::Under50 => "Under $50",
            Self::From50To100 => "$50 - $100",
            Self::From100To200 => "$100 - $200",
            Self::Over200 => "Over $200",
        }
    }

    /// Inclusive `(min, max)` bounds in whole dollars; `None` means unbounded.
    #[must_use]
    pub const fn bounds(&self) -> (u32, Option<u32>) {
        match self {
            Self::Any => (0, None),
            Self::Under50 => (0, Some(50)),
            Self::From50To100 => (50, Some(100)),
            Self::From100To200 => (100, Some(200)),
            Self::Over200 => (200, None),
        }
    }

    #[must_use]
    pub fn contains(&self, price: Price) -> bool {
        let (min, max) = self.bounds();
        let amount = price.amount();
        amount >= Decimal::from(min) && max.is_none_or(|max| amount <= Decimal::from(max))
    }

    /// Position in [`PriceBucket::ALL`], used in query strings.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Any => 0,
            Self::Under50 => 1,
            Self::From50To100 => 2,
            Self::From100To200 => 3,
            Self::Over200 => 4,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::str::FromStr for PriceBucket {
    type Err = String;

    /// Accepts an index (`"2"`) or a label, ignoring case and whitespace, so
    /// `"$50-$100"` selects the same bucket as `"$50 - $100"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        if let Ok(index) = compact.parse::<usize>() {
            return Self::from_index(index).ok_or_else(|| format!("invalid price bucket: {s}"));
        }

        Self::ALL
            .into_iter()
            .find(|bucket| {
                bucket
                    .label()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_lowercase()
                    == compact
            })
            .ok_or_else(|| format!("invalid price bucket: {s}"))
    }
}

/// Ordering applied after filtering. Every order is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Input order.
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Rating,
    /// New products first.
    Newest,
    /// Sale products first.
    Sale,
}

impl SortOrder {
    pub const ALL: [Self; 6] = [
        Self::Featured,
        Self::PriceLow,
        Self::PriceHigh,
        Self::Rating,
        Self::Newest,
        Self::Sale,
    ];

    /// Key used in query strings.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLow => "price-low",
            Self::PriceHigh => "price-high",
            Self::Rating => "rating",
            Self::Newest => "newest",
            Self::Sale => "sale",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceLow => "Price: Low to High",
            Self::PriceHigh => "Price: High to Low",
            Self::Rating => "Top Rated",
            Self::Newest => "Newest",
            Self::Sale => "On Sale",
        }
    }

    /// Initial sort for the shop's `filter` link parameter
    /// (`new`, `sale`, `best`).
    #[must_use]
    pub fn from_filter_param(filter: &str) -> Self {
        match filter.trim().to_ascii_lowercase().as_str() {
            "new" => Self::Newest,
            "sale" => Self::Sale,
            "best" => Self::Rating,
            _ => Self::Featured,
        }
    }

    fn sort(self, products: &mut [Product]) {
        match self {
            Self::Featured => {}
            Self::PriceLow => products.sort_by(|a, b| a.price.cmp(&b.price)),
            Self::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Self::Rating => products.sort_by(|a, b| b.rating.cmp(&a.rating)),
            Self::Newest => products.sort_by_key(|p| !p.is_new),
            Self::Sale => products.sort_by_key(|p| !p.is_sale),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|order| order.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid sort order: {s}"))
    }
}

/// The shop's filter and sort selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub query: String,
    pub category: CategoryFilter,
    pub bucket: PriceBucket,
    pub sort: SortOrder,
}

impl ProductQuery {
    fn matches(&self, product: &Product, needle: &str) -> bool {
        let text_match = needle.is_empty()
            || product.name.to_lowercase().contains(needle)
            || product.category.to_lowercase().contains(needle);

        text_match && self.category.matches(&product.category) && self.bucket.contains(product.price)
    }

    /// Filter then sort `products`.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        filter_products(products, self)
    }
}

/// Keep the products matching `query`, then apply its sort order.
///
/// A product matches when its name or category contains the query text
/// (case-insensitive), its category matches the selected one, and its price
/// lies in the selected bucket.
#[must_use]
pub fn filter_products(products: &[Product], query: &ProductQuery) -> Vec<Product> {
    let needle = query.query.trim().to_lowercase();

    let mut matched: Vec<Product> = products
        .iter()
        .filter(|p| query.matches(p, &needle))
        .cloned()
        .collect();

    query.sort.sort(&mut matched);
    matched
}

/// Products whose name, category or description contains `term`.
///
/// A blank term yields nothing.
#[must_use]
pub fn search_products(products: &[Product], term: &str) -> Vec<Product> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Up to `limit` other products from the same category as `product`.
#[must_use]
pub fn related_products(products: &[Product], product: &Product, limit: usize) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.id != product.id && p.category.eq_ignore_ascii_case(&product.category))
        .take(limit)
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub fn product(id: &str, price: &str, category: &str) -> Product {
        Product {
            id: ProductId::parse(id).unwrap(),
            name: format!("Product {id}"),
            price: Price::parse(price).unwrap(),
            original_price: None,
            image: format!("/images/{id}.jpg"),
            category: category.to_owned(),
            rating: Decimal::new(40, 1),
            reviews: 10,
            stock: 10,
            is_sale: false,
            is_new: false,
            featured: false,
            description: String::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_bucket_example() {
        let products = vec![product("a", "10", "men"), product("b", "60", "women")];
        let query = ProductQuery {
            query: String::new(),
            category: CategoryFilter::parse("All"),
            bucket: "$50-$100".parse().unwrap(),
            sort: SortOrder::Featured,
        };
        assert_eq!(ids(&filter_products(&products, &query)), ["b"]);
    }

    #[test]
    fn test_bucket_bounds_inclusive() {
        let fifty = Price::parse("50").unwrap();
        assert!(PriceBucket::Under50.contains(fifty));
        assert!(PriceBucket::From50To100.contains(fifty));
        assert!(!PriceBucket::From100To200.contains(fifty));
        assert!(PriceBucket::Over200.contains(Price::parse("200").unwrap()));
        assert!(PriceBucket::Any.contains(Price::parse("100000").unwrap()));
    }

    #[test]
    fn test_bucket_parse() {
        assert_eq!("All Prices".parse::<PriceBucket>().unwrap(), PriceBucket::Any);
        assert_eq!("under $50".parse::<PriceBucket>().unwrap(), PriceBucket::Under50);
        assert_eq!("$100-$200".parse::<PriceBucket>().unwrap(), PriceBucket::From100To200);
        assert_eq!("4".parse::<PriceBucket>().unwrap(), PriceBucket::Over200);
        assert!("9".parse::<PriceBucket>().is_err());
        assert!("cheap".parse::<PriceBucket>().is_err());
        for bucket in PriceBucket::ALL {
            assert_eq!(PriceBucket::from_index(bucket.index()), Some(bucket));
        }
    }

    #[test]
    fn test_query_matches_name_or_category() {
        let mut shirt = product("a", "10", "Men");
        shirt.name = "Esprit Ruffle Shirt".to_owned();
        let bag = product("b", "10", "Bag");
        let products = vec![shirt, bag];

        let by_name = ProductQuery {
            query: "RUFFLE".to_owned(),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &by_name)), ["a"]);

        let by_category = ProductQuery {
            query: "bag".to_owned(),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &by_category)), ["b"]);
    }

    #[test]
    fn test_category_case_insensitive() {
        let products = vec![product("a", "10", "Women"), product("b", "10", "Men")];
        let query = ProductQuery {
            category: CategoryFilter::parse("women"),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &query)), ["a"]);
        assert_eq!(CategoryFilter::parse(" ALL "), CategoryFilter::All);
    }

    #[test]
    fn test_sort_by_price_is_stable() {
        let products = vec![
            product("a", "30", "Men"),
            product("b", "10", "Men"),
            product("c", "30", "Men"),
            product("d", "20", "Men"),
        ];

        let low = ProductQuery {
            sort: SortOrder::PriceLow,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &low)), ["b", "d", "a", "c"]);

        let high = ProductQuery {
            sort: SortOrder::PriceHigh,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &high)), ["a", "c", "d", "b"]);
    }

    #[test]
    fn test_sort_partitions() {
        let mut a = product("a", "10", "Men");
        let mut b = product("b", "10", "Men");
        let c = product("c", "10", "Men");
        let mut d = product("d", "10", "Men");
        b.is_new = true;
        d.is_new = true;
        a.is_sale = true;
        d.rating = Decimal::new(50, 1);
        let products = vec![a, b, c, d];

        let newest = ProductQuery {
            sort: SortOrder::Newest,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &newest)), ["b", "d", "a", "c"]);

        let sale = ProductQuery {
            sort: SortOrder::Sale,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &sale)), ["a", "b", "c", "d"]);

        let rating = ProductQuery {
            sort: SortOrder::Rating,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&products, &rating)), ["d", "a", "b", "c"]);

        let featured = ProductQuery::default();
        assert_eq!(ids(&featured.apply(&products)), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_filter_is_pure() {
        let products = vec![product("a", "30", "Men"), product("b", "10", "Women")];
        let query = ProductQuery {
            sort: SortOrder::PriceLow,
            ..ProductQuery::default()
        };
        let first = filter_products(&products, &query);
        let second = filter_products(&products, &query);
        assert_eq!(first, second);
        assert_eq!(ids(&products), ["a", "b"]);
    }

    mod props {
        use chrono::TimeZone;
        use proptest::prelude::*;

        use super::*;

        const TERMS: [&str; 6] = ["", "product p1", "MEN", "bag", " shoes ", "zzz"];
        const PRODUCT_CATEGORY_SPELLINGS: [&str; 6] = ["Women", "women", "Men", "Bag", "Shoes", "Watches"];

        fn product_strategy() -> impl Strategy<Value = Product> {
            (
                0..30_000u32,
                0..PRODUCT_CATEGORY_SPELLINGS.len(),
                0..=50i64,
                any::<bool>(),
                any::<bool>(),
                0..1_000_000i64,
            )
                .prop_map(|(cents, category, rating, is_sale, is_new, secs)| Product {
                    price: Price::from_cents(cents),
                    category: PRODUCT_CATEGORY_SPELLINGS[category].to_owned(),
                    rating: Decimal::new(rating, 1),
                    is_sale,
                    is_new,
                    created_at: Utc.timestamp_opt(secs, 0).unwrap(),
                    ..product("p0", "0", "Men")
                })
        }

        /// Up to 20 products with distinct ids `p0`, `p1`, ...
        fn catalog_strategy() -> impl Strategy<Value = Vec<Product>> {
            prop::collection::vec(product_strategy(), 0..20).prop_map(|mut products| {
                for (i, p) in products.iter_mut().enumerate() {
                    p.id = ProductId::parse(&format!("p{i}")).unwrap();
                    p.name = format!("Product p{i}");
                }
                products
            })
        }

        fn query_strategy() -> impl Strategy<Value = ProductQuery> {
            (
                0..TERMS.len(),
                0..CATEGORIES.len(),
                0..PriceBucket::ALL.len(),
                0..SortOrder::ALL.len(),
            )
                .prop_map(|(term, category, bucket, sort)| ProductQuery {
                    query: TERMS[term].to_owned(),
                    category: CategoryFilter::parse(CATEGORIES[category]),
                    bucket: PriceBucket::ALL[bucket],
                    sort: SortOrder::ALL[sort],
                })
        }

        fn sorted_ids(products: &[Product]) -> Vec<String> {
            let mut ids: Vec<String> = products.iter().map(|p| p.id.to_string()).collect();
            ids.sort();
            ids
        }

        proptest! {
            #[test]
            fn prop_filter_is_pure(
                products in catalog_strategy(),
                query in query_strategy(),
            ) {
                let input = products.clone();
                let first = filter_products(&products, &query);
                let second = filter_products(&products, &query);
                prop_assert_eq!(&first, &second);
                prop_assert_eq!(products, input);
            }

            #[test]
            fn prop_results_match_every_filter(
                products in catalog_strategy(),
                query in query_strategy(),
            ) {
                let needle = query.query.trim().to_lowercase();
                for p in filter_products(&products, &query) {
                    prop_assert!(products.contains(&p));
                    prop_assert!(query.bucket.contains(p.price));
                    prop_assert!(query.category.matches(&p.category));
                    prop_assert!(
                        needle.is_empty()
                            || p.name.to_lowercase().contains(&needle)
                            || p.category.to_lowercase().contains(&needle)
                    );
                }
            }

            #[test]
            fn prop_sort_only_reorders(
                products in catalog_strategy(),
                query in query_strategy(),
            ) {
                let unsorted = ProductQuery { sort: SortOrder::Featured, ..query.clone() };
                let featured = filter_products(&products, &unsorted);
                let sorted = filter_products(&products, &query);
                prop_assert_eq!(sorted_ids(&sorted), sorted_ids(&featured));

                // Featured keeps input order
                let positions: Vec<usize> = featured
                    .iter()
                    .map(|p| products.iter().position(|q| q.id == p.id).unwrap())
                    .collect();
                prop_assert!(positions.windows(2).all(|w| w[0] <= w[1]));
            }
        }
    }

    #[test]
    fn test_sort_order_keys() {
        for order in SortOrder::ALL {
            assert_eq!(order.key().parse::<SortOrder>().unwrap(), order);
        }
        assert_eq!(SortOrder::from_filter_param("new"), SortOrder::Newest);
        assert_eq!(SortOrder::from_filter_param("sale"), SortOrder::Sale);
        assert_eq!(SortOrder::from_filter_param("best"), SortOrder::Rating);
        assert_eq!(SortOrder::from_filter_param("other"), SortOrder::Featured);
    }

    #[test]
    fn test_search_matches_description() {
        let mut watch = product("w", "150", "Watches");
        watch.description = "Classic leather strap".to_owned();
        let products = vec![watch, product("s", "40", "Shoes")];

        assert_eq!(ids(&search_products(&products, "leather")), ["w"]);
        assert_eq!(ids(&search_products(&products, "shoes")), ["s"]);
        assert!(search_products(&products, "   ").is_empty());
    }

    #[test]
    fn test_related_products() {
        let products = vec![
            product("a", "10", "Bag"),
            product("b", "10", "Bag"),
            product("c", "10", "Men"),
            product("d", "10", "bag"),
        ];
        let related = related_products(&products, &products[0], 4);
        assert_eq!(ids(&related), ["b", "d"]);
        assert_eq!(related_products(&products, &products[0], 1).len(), 1);
    }

    #[test]
    fn test_discount_percent() {
        let mut p = product("a", "16.64", "Women");
        assert_eq!(p.discount_percent(), None);
        p.original_price = Some(Price::parse("24.99").unwrap());
        assert_eq!(p.discount_percent(), Some(33));
        p.original_price = Some(Price::parse("10").unwrap());
        assert_eq!(p.discount_percent(), None);
    }
}
