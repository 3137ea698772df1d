//! Shared observable client state.
//!
//! DESIGN
//! ======
//! State lives in `tokio::sync::watch` channels. Services own the sending
//! half and mutate it; UI code calls `subscribe()` and re-renders on change.
//! Writers do not coordinate: the last write wins, which matches the
//! request/refetch model of the services.

use std::sync::Arc;

use tokio::sync::watch;

// =============================================================================
// SESSION
// =============================================================================

/// Last known server-confirmed authentication state.
///
/// Clones share one flag; every service built from the same client sees the
/// same value. Only services in this crate write to it.
#[derive(Clone, Debug)]
pub struct SessionState {
    authenticated: Arc<watch::Sender<bool>>,
}

impl SessionState {
    /// Starts unauthenticated until the first session check resolves.
    #[must_use]
    pub fn new() -> Self {
        Self { authenticated: Arc::new(watch::Sender::new(false)) }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    pub(crate) fn set_authenticated(&self, value: bool) {
        let previous = self.authenticated.send_replace(value);
        if previous != value {
            tracing::debug!(authenticated = value, "session state changed");
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// LIST STATE
// =============================================================================

/// List snapshot rendered by admin screens.
///
/// A failed operation sets `error` and leaves `items` at the last good list.
#[derive(Clone, Debug, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self { items: Vec::new(), loading: false, error: None }
    }
}

/// Watch-backed owner of a [`ListState`].
#[derive(Clone, Debug)]
pub struct ListStore<T> {
    tx: Arc<watch::Sender<ListState<T>>>,
}

impl<T: Clone> ListStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { tx: Arc::new(watch::Sender::new(ListState::default())) }
    }

    #[must_use]
    pub fn snapshot(&self) -> ListState<T> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListState<T>> {
        self.tx.subscribe()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut ListState<T>)) {
        self.tx.send_modify(f);
    }

    /// Mark an operation as started: loading on, previous error cleared.
    pub(crate) fn begin(&self) {
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    pub(crate) fn finish(&self) {
        self.update(|s| s.loading = false);
    }

    pub(crate) fn replace_items(&self, items: Vec<T>) {
        self.update(|s| s.items = items);
    }

    pub(crate) fn fail(&self, message: String) {
        self.update(|s| s.error = Some(message));
    }
}

impl<T: Clone> Default for ListStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ROLES
// =============================================================================

/// Role set from the most recent successful user-info fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoleState {
    pub roles: Vec<String>,
    pub loading: bool,
    /// Result of the last screen-level admin gate; false until one has run.
    pub has_access: bool,
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
