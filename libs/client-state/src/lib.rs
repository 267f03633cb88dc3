//! Client-side state store for the Stockroom frontend
//!
//! Holds the current user identity and token, the last-fetched product
//! list, and the shopping cart. All cart mutations are local-only until
//! checkout; quantities are clamped to the last-known stock value. State
//! is persisted through an injected [`storage::StateStorage`] adapter and
//! restored on load, mirroring a browser-storage blob.

pub mod state;
pub mod storage;

pub use state::{
    CartItem, CheckoutLine, CheckoutPayload, ClientState, PersistedState, ProductSnapshot,
    SessionUser,
};
pub use storage::{JsonFileStorage, MemoryStorage, StateStorage, StorageError};
