//! Shopping cart container.
//!
//! A cart is an ordered list of lines keyed by product id. Each browser owns
//! exactly one cart; the storefront keeps it in the session and writes the
//! whole container back after every mutation.
//!
//! Invariants:
//! - no two lines share a product id
//! - every line has a quantity of at least one
//! - lines keep the order in which their product was first added

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{Price, ProductId};

/// The product snapshot stored in a cart line.
///
/// Name, price and image are copied at add-to-cart time so the cart can be
/// rendered without re-reading the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
}

impl From<&Product> for CartItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
        }
    }
}

/// A cart line: an item plus its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub qty: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.item.price.times(self.qty)
    }
}

/// The shopping cart.
///
/// Serializes as a plain array of lines. Deserializing drops lines with a
/// zero quantity and merges duplicate ids, so a hand-edited or stale payload
/// still yields a valid cart.
///
/// ```
/// use coza_core::{Cart, CartItem, Price, ProductId};
///
/// let shirt = CartItem {
///     id: ProductId::parse("p1").unwrap(),
///     name: "Shirt".to_owned(),
///     price: Price::parse("10").unwrap(),
///     image: "/img/shirt.jpg".to_owned(),
/// };
///
/// let mut cart = Cart::default();
/// cart.add_item(shirt.clone(), 1);
/// cart.add_item(shirt, 2);
///
/// assert_eq!(cart.len(), 1);
/// assert_eq!(cart.total_items(), 3);
/// assert_eq!(cart.subtotal(), Price::parse("30").unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add `qty` units of an item.
    ///
    /// Merges into the existing line for the same id (summing quantities) or
    /// appends a new line. Adding zero units does nothing.
    pub fn add_item(&mut self, item: CartItem, qty: u32) {
        if qty == 0 {
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item.id) {
            line.qty = line.qty.saturating_add(qty);
        } else {
            self.lines.push(CartLine { item, qty });
        }
    }

    /// Replace the quantity of a line.
    ///
    /// A quantity of zero or less removes the line. Unknown ids are ignored.
    pub fn set_qty(&mut self, id: &ProductId, qty: i64) {
        if qty <= 0 {
            self.remove_item(id);
            return;
        }

        let qty = u32::try_from(qty).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|l| &l.item.id == id) {
            line.qty = qty;
        }
    }

    /// Remove the line for `id`, if present.
    pub fn remove_item(&mut self, id: &ProductId) {
        self.lines.retain(|l| &l.item.id != id);
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Σ price × quantity over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Σ quantity over all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.qty)).sum()
    }

    /// Look up the line for `id`.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.item.id == id)
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::default();
        for line in lines {
            cart.add_item(line.item, line.qty);
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}
