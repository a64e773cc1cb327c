use std::collections::HashMap;
use std::sync::Arc;

use rocket::tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::mongodb::Id;

/// Map from session IDs to their locks.
type LockMap = HashMap<Id, Arc<Mutex<()>>>;

/// One async mutex per session.
///
/// Every operation that reads a session's votes and then writes depending on
/// what it saw holds that session's lock throughout, so two votes can never
/// both pass the same check.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<LockMap>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the given session.
    pub async fn lock(&self, session: Id) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(session).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the lock of a deleted session.
    pub async fn forget(&self, session: Id) {
        self.locks.lock().await.remove(&session);
    }
}
