//! The client state object: user session, product cache, and cart

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::storage::{StateStorage, StorageError};

/// Logged-in user identity and session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: String,
    /// Full `Bearer <jwt>` header value as issued by the backend
    pub token: String,
}

/// Last-known product snapshot, the basis for client-side stock clamping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
}

/// One cart entry: a product snapshot plus the selected quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: ProductSnapshot,
    pub qty: i32,
}

/// The single persisted blob, restored on load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub products: Vec<ProductSnapshot>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

/// One line of the checkout request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutLine {
    pub id: i64,
    pub qty: i32,
}

/// Body for `POST /products/buy`
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPayload {
    pub cart: Vec<CheckoutLine>,
}

/// Client state store with an injected persistence adapter
///
/// Every mutation saves the full snapshot, so a reload restores the exact
/// state. Cart mutations never talk to the server; the server re-validates
/// quantities at checkout.
pub struct ClientState<S: StateStorage> {
    storage: S,
    user: Option<SessionUser>,
    products: Vec<ProductSnapshot>,
    cart: Vec<CartItem>,
}

impl<S: StateStorage> ClientState<S> {
    /// Restore the state from storage, starting empty when none was saved
    pub fn load(storage: S) -> Result<Self, StorageError> {
        let persisted = storage.load()?.unwrap_or_default();

        Ok(Self {
            storage,
            user: persisted.user,
            products: persisted.products,
            cart: persisted.cart,
        })
    }

    fn persist(&self) -> Result<(), StorageError> {
        self.storage.save(&PersistedState {
            user: self.user.clone(),
            products: self.products.clone(),
            cart: self.cart.clone(),
        })
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: SessionUser) -> Result<(), StorageError> {
        self.user = Some(user);
        self.persist()
    }

    /// Drop the session and the cart together
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.user = None;
        self.cart.clear();
        self.persist()
    }

    pub fn products(&self) -> &[ProductSnapshot] {
        &self.products
    }

    /// Replace the cached product list with a freshly fetched one
    pub fn set_products(&mut self, products: Vec<ProductSnapshot>) -> Result<(), StorageError> {
        self.products = products;
        self.persist()
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Add one unit of a product to the cart
    ///
    /// Increments the existing line when present; the quantity never
    /// exceeds the last-known stock, and out-of-stock products are not
    /// added at all.
    pub fn add_to_cart(&mut self, product: &ProductSnapshot) -> Result<(), StorageError> {
        if let Some(item) = self.cart.iter_mut().find(|item| item.product.id == product.id) {
            if item.qty + 1 <= product.stock {
                item.qty += 1;
                return self.persist();
            }
            return Ok(());
        }

        if product.stock >= 1 {
            self.cart.push(CartItem {
                product: product.clone(),
                qty: 1,
            });
            return self.persist();
        }

        Ok(())
    }

    pub fn remove_from_cart(&mut self, id: i64) -> Result<(), StorageError> {
        self.cart.retain(|item| item.product.id != id);
        self.persist()
    }

    /// Set a line's quantity, clamped to `1..=stock`
    ///
    /// Unknown ids are ignored.
    pub fn update_qty(&mut self, id: i64, qty: i32) -> Result<(), StorageError> {
        let Some(item) = self.cart.iter_mut().find(|item| item.product.id == id) else {
            return Ok(());
        };

        item.qty = qty.clamp(1, item.product.stock.max(1));
        self.persist()
    }

    pub fn clear_cart(&mut self) -> Result<(), StorageError> {
        self.cart.clear();
        self.persist()
    }

    /// Total number of units across all cart lines
    pub fn cart_count(&self) -> i32 {
        self.cart.iter().map(|item| item.qty).sum()
    }

    /// Total price of the cart
    pub fn cart_total(&self) -> Decimal {
        self.cart
            .iter()
            .map(|item| item.product.price * Decimal::from(item.qty))
            .sum()
    }

    /// The `{cart: [{id, qty}]}` body for the checkout endpoint
    pub fn checkout_payload(&self) -> CheckoutPayload {
        CheckoutPayload {
            cart: self
                .cart
                .iter()
                .map(|item| CheckoutLine {
                    id: item.product.id,
                    qty: item.qty,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn snapshot(id: i64, name: &str, price: Decimal, stock: i32) -> ProductSnapshot {
        ProductSnapshot {
            id,
            name: name.to_string(),
            price,
            stock,
            image_url: None,
        }
    }

    fn user() -> SessionUser {
        SessionUser {
            id: 1,
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: "cliente".to_string(),
            token: "Bearer abc".to_string(),
        }
    }

    #[test]
    fn add_to_cart_clamps_at_last_known_stock() {
        let mut state = ClientState::load(MemoryStorage::default()).unwrap();
        let widget = snapshot(1, "Widget", Decimal::new(1000, 2), 2);

        state.add_to_cart(&widget).unwrap();
        state.add_to_cart(&widget).unwrap();
        state.add_to_cart(&widget).unwrap();

        assert_eq!(state.cart().len(), 1);
        assert_eq!(state.cart()[0].qty, 2);
    }

    #[test]
    fn out_of_stock_product_is_not_added() {
        let mut state = ClientState::load(MemoryStorage::default()).unwrap();
        let sold_out = snapshot(1, "Widget", Decimal::ONE, 0);

        state.add_to_cart(&sold_out).unwrap();
        assert!(state.cart().is_empty());
    }

    #[test]
    fn update_qty_clamps_to_stock_and_floor_of_one() {
        let mut state = ClientState::load(MemoryStorage::default()).unwrap();
        let widget = snapshot(1, "Widget", Decimal::ONE, 5);
        state.add_to_cart(&widget).unwrap();

        state.update_qty(1, 99).unwrap();
        assert_eq!(state.cart()[0].qty, 5);

        state.update_qty(1, -3).unwrap();
        assert_eq!(state.cart()[0].qty, 1);

        // unknown id is a no-op
        state.update_qty(42, 3).unwrap();
        assert_eq!(state.cart().len(), 1);
    }

    #[test]
    fn logout_clears_user_and_cart() {
        let mut state = ClientState::load(MemoryStorage::default()).unwrap();
        state.set_user(user()).unwrap();
        state
            .add_to_cart(&snapshot(1, "Widget", Decimal::ONE, 3))
            .unwrap();

        state.logout().unwrap();

        assert!(state.user().is_none());
        assert!(state.cart().is_empty());
    }

    #[test]
    fn cart_totals_sum_price_times_qty() {
        let mut state = ClientState::load(MemoryStorage::default()).unwrap();
        let widget = snapshot(1, "Widget", Decimal::new(1050, 2), 5);
        let gadget = snapshot(2, "Gadget", Decimal::new(200, 2), 5);

        state.add_to_cart(&widget).unwrap();
        state.add_to_cart(&widget).unwrap();
        state.add_to_cart(&gadget).unwrap();

        assert_eq!(state.cart_count(), 3);
        assert_eq!(state.cart_total(), Decimal::new(2300, 2));
    }

    #[test]
    fn checkout_payload_carries_id_and_qty_per_line() {
        let mut state = ClientState::load(MemoryStorage::default()).unwrap();
        state
            .add_to_cart(&snapshot(7, "Widget", Decimal::ONE, 5))
            .unwrap();
        state.update_qty(7, 3).unwrap();

        let payload = state.checkout_payload();
        assert_eq!(payload.cart, vec![CheckoutLine { id: 7, qty: 3 }]);
    }

    #[test]
    fn state_round_trips_through_shared_storage() {
        let storage = MemoryStorage::default();

        {
            let mut state = ClientState::load(storage.clone()).unwrap();
            state.set_user(user()).unwrap();
            state
                .add_to_cart(&snapshot(1, "Widget", Decimal::new(999, 2), 4))
                .unwrap();
        }

        let restored = ClientState::load(storage).unwrap();
        assert_eq!(restored.user().unwrap().email, "ada@example.com");
        assert_eq!(restored.cart().len(), 1);
        assert_eq!(restored.cart()[0].product.name, "Widget");
    }

    #[test]
    fn json_file_storage_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_state.json");
        let storage = crate::storage::JsonFileStorage::new(&path);

        {
            let mut state = ClientState::load(storage.clone()).unwrap();
            state
                .add_to_cart(&snapshot(1, "Widget", Decimal::ONE, 2))
                .unwrap();
        }

        let restored = ClientState::load(crate::storage::JsonFileStorage::new(&path)).unwrap();
        assert_eq!(restored.cart().len(), 1);
    }
}
