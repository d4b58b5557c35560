//! In-memory session storage.
//!
//! One lane per Viber user, each a mutex-guarded [`Session`]. Holding a
//! lane's lock across the whole handle-one-event sequence is what makes
//! per-user processing atomic; different users never contend.
//!
//! [`Session`]: confab_dialog::Session

pub mod store;

pub use store::SessionStore;
