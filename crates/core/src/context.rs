// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable context passed into every handler and observer
//!
//! A [`Context`] couples a cancellation token with an optional deadline.
//! Cancellation is cooperative: work that ignores its context keeps running,
//! the bus just stops waiting for it.

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why a context is done
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Clone, Debug)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A fresh root context: never canceled unless [`Context::cancel`] is called
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a context that is canceled with this one but can be canceled alone
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child whose deadline is at most `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child with the earlier of `deadline` and the inherited one
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(inherited) if inherited < deadline => inherited,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every context derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels this context when the guard is dropped
    pub(crate) fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The cause if the context is done, `None` while it is still live
    pub fn err(&self) -> Option<ContextError> {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(ContextError::DeadlineExceeded);
        }
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        None
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves once the context is canceled or its deadline passes
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => self.err().unwrap_or(ContextError::Canceled),
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
