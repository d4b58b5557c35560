use std::sync::Arc;

use {confab_dialog::Session, dashmap::DashMap, tokio::sync::Mutex};

/// Keyed session map with one async mutex per user.
///
/// Callers take the user's lane with [`SessionStore::lane`] and hold its
/// lock for the full read-compute-write of one event, including any
/// downstream calls made along the way. tokio's mutex queues waiters, so
/// a user's events are handled in arrival order while other users proceed
/// on their own lanes.
///
/// Lanes live for the process lifetime; there is no eviction.
#[derive(Default)]
pub struct SessionStore {
    lanes: DashMap<String, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lane for `user`, created on first touch. A user never seen before
    /// starts from the default idle session.
    pub fn lane(&self, user: &str) -> Arc<Mutex<Session>> {
        self.lanes
            .entry(user.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Lane for `user` only if one already exists.
    pub fn peek(&self, user: &str) -> Option<Arc<Mutex<Session>>> {
        self.lanes.get(user).map(|entry| entry.value().clone())
    }

    pub fn exists(&self, user: &str) -> bool {
        self.lanes.contains_key(user)
    }

    /// Overwrite `user`'s session wholesale. Existing lane handles observe
    /// the new value on their next lock.
    pub async fn replace(&self, user: &str, session: Session) {
        let lane = self.lane(user);
        *lane.lock().await = session;
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}
