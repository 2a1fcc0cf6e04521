//! Non-fatal problems noticed during evaluation

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

/// Warnings gathered while evaluating, such as reads of deprecated context
/// values. Each distinct message is kept once, in the order first seen.
///
/// Clones share the same messages, so anonymous functions created during an
/// evaluation keep reporting into it when they're called later.
#[derive(Debug, Clone, Default)]
pub struct Warnings(Arc<Mutex<Vec<String>>>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, message: impl Into<String>) {
        let message = message.into();
        let mut messages = self.lock();
        if !messages.contains(&message) {
            debug!(warning = %message, "evaluation warning");
            messages.push(message);
        }
    }

    pub(crate) fn deprecated_context(&self, message: &str) {
        self.add(format!("deprecated context value accessed: {}", message));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// A copy of the messages so far
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // a panic while holding the lock can't leave the list half-written
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PartialEq for Warnings {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.messages() == other.messages()
    }
}

impl fmt::Display for Warnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(", "))
    }
}
