//! Reader/writer coordination between routing queries and traffic updates

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Error;

/// Shared access to the street network
///
/// Routing queries take read access and never block each other. Traffic
/// updates take write access for a whole batch, so readers see either all or
/// none of a batch. Lock acquisition has no timeout.
#[derive(Debug)]
pub struct StateGate<N> {
    inner: Arc<RwLock<N>>,
}

impl<N> Clone for StateGate<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N> StateGate<N> {
    pub fn new(network: N) -> Self {
        Self {
            inner: Arc::new(RwLock::new(network)),
        }
    }

    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked while holding the lock
    pub fn read(&self) -> Result<RwLockReadGuard<'_, N>, Error> {
        self.inner.read().map_err(|_| Error::LockPoisoned)
    }

    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked while holding the lock
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, N>, Error> {
        self.inner.write().map_err(|_| Error::LockPoisoned)
    }
}
