//! Wishlist container.
//!
//! A set of product snapshots keyed by id. Like the cart it lives in the
//! browser's session and is written back whole after every change.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{Price, ProductId};

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
}

impl From<&Product> for WishlistItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
        }
    }
}

/// The wishlist. Holds at most one entry per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<WishlistItem>", into = "Vec<WishlistItem>")]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    /// Insert `item` unless its id is already present.
    ///
    /// Returns `true` if the item was inserted.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        if self.has(&item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove the entry for `id`. Returns `true` if something was removed.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.id != id);
        self.items.len() != before
    }

    #[must_use]
    pub fn has(&self, id: &ProductId) -> bool {
        self.items.iter().any(|i| &i.id == id)
    }

    /// Add the item if absent, remove it if present.
    ///
    /// Returns whether the item is in the wishlist afterwards.
    pub fn toggle(&mut self, item: WishlistItem) -> bool {
        if self.remove(&item.id) {
            false
        } else {
            self.items.push(item);
            true
        }
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl From<Vec<WishlistItem>> for Wishlist {
    fn from(items: Vec<WishlistItem>) -> Self {
        let mut wishlist = Self::default();
        for item in items {
            wishlist.add(item);
        }
        wishlist
    }
}

impl From<Wishlist> for Vec<WishlistItem> {
    fn from(wishlist: Wishlist) -> Self {
        wishlist.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str) -> WishlistItem {
        WishlistItem {
            id: ProductId::parse(id).unwrap(),
            name: format!("Item {id}"),
            price: Price::parse("24.99").unwrap(),
            image: String::new(),
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.add(item("a")));
        assert!(!wishlist.add(item("a")));
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_remove_and_has() {
        let mut wishlist = Wishlist::default();
        wishlist.add(item("a"));
        wishlist.add(item("b"));

        let a = ProductId::parse("a").unwrap();
        assert!(wishlist.has(&a));
        assert!(wishlist.remove(&a));
        assert!(!wishlist.has(&a));
        assert!(!wishlist.remove(&a));
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.toggle(item("a")));
        assert!(!wishlist.toggle(item("a")));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_deserialize_drops_duplicates() {
        let json = r#"[
            {"id":"a","name":"A","price":"1","image":""},
            {"id":"a","name":"A again","price":"1","image":""}
        ]"#;
        let wishlist: Wishlist = serde_json::from_str(json).unwrap();
        assert_eq!(wishlist.len(), 1);
        assert_eq!(wishlist.items()[0].name, "A");
    }

    mod props {
        use std::collections::BTreeSet;

        use proptest::prelude::*;

        use super::*;

        const IDS: [&str; 4] = ["a", "b", "c", "d"];

        #[derive(Debug, Clone)]
        enum Op {
            Add(usize),
            Remove(usize),
            Toggle(usize),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0..IDS.len()).prop_map(Op::Add),
                (0..IDS.len()).prop_map(Op::Remove),
                (0..IDS.len()).prop_map(Op::Toggle),
            ]
        }

        fn apply(wishlist: &mut Wishlist, op: &Op) {
            match *op {
                Op::Add(i) => {
                    wishlist.add(item(IDS[i]));
                }
                Op::Remove(i) => {
                    wishlist.remove(&ProductId::parse(IDS[i]).unwrap());
                }
                Op::Toggle(i) => {
                    wishlist.toggle(item(IDS[i]));
                }
            }
        }

        fn build(ops: &[Op]) -> Wishlist {
            let mut wishlist = Wishlist::default();
            for op in ops {
                apply(&mut wishlist, op);
            }
            wishlist
        }

        proptest! {
            #[test]
            fn prop_matches_set_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
                let mut wishlist = Wishlist::default();
                let mut model = BTreeSet::new();
                for op in &ops {
                    apply(&mut wishlist, op);
                    match *op {
                        Op::Add(i) => {
                            model.insert(IDS[i]);
                        }
                        Op::Remove(i) => {
                            model.remove(IDS[i]);
                        }
                        Op::Toggle(i) => {
                            if !model.remove(IDS[i]) {
                                model.insert(IDS[i]);
                            }
                        }
                    }
                }

                let ids: BTreeSet<&str> = wishlist.items().iter().map(|i| i.id.as_str()).collect();
                prop_assert_eq!(ids.len(), wishlist.len());
                prop_assert_eq!(ids, model);
            }

            #[test]
            fn prop_add_is_idempotent(
                ops in prop::collection::vec(op_strategy(), 0..40),
                pick in 0..IDS.len(),
            ) {
                let mut once = build(&ops);
                once.add(item(IDS[pick]));
                let mut twice = once.clone();
                prop_assert!(!twice.add(item(IDS[pick])));
                prop_assert_eq!(twice, once);
            }

            #[test]
            fn prop_toggle_twice_restores(
                ops in prop::collection::vec(op_strategy(), 0..40),
                pick in 0..IDS.len(),
            ) {
                let before = build(&ops);
                let mut after = before.clone();
                let added = after.toggle(item(IDS[pick]));
                prop_assert_eq!(added, !before.has(&ProductId::parse(IDS[pick]).unwrap()));
                after.toggle(item(IDS[pick]));

                let ids = |w: &Wishlist| w.items().iter().map(|i| i.id.clone()).collect::<BTreeSet<_>>();
                prop_assert_eq!(ids(&after), ids(&before));
            }
        }
    }
}
