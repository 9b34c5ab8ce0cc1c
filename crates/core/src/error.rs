// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for publication and registration

use crate::context::ContextError;
use crate::events::{EventName, SubscriptionId};
use std::fmt;
use thiserror::Error;

/// Error currency returned by subscription handlers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the bus
#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus is closed")]
    Closed,
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// A subscription handler returned an error; it is also the `source()`
    #[error("{0}")]
    Handler(#[source] BoxError),
    #[error("handler panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl BusError {
    pub fn is_closed(&self) -> bool {
        matches!(self, BusError::Closed)
    }

    /// The context cause, if this error came from cancellation or a deadline
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            BusError::Context(e) => Some(*e),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.context_error() == Some(ContextError::DeadlineExceeded)
    }

    pub fn as_aggregate(&self) -> Option<&AggregateError> {
        match self {
            BusError::Aggregate(agg) => Some(agg),
            _ => None,
        }
    }
}

/// One handler failure recorded while dispatch continued past it
#[derive(Debug)]
pub struct HandlerFailure {
    pub subscription: SubscriptionId,
    pub event: EventName,
    pub event_id: String,
    pub error: BusError,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subscription error; subscription: {}, event: {} ({}): {}",
            self.subscription, self.event, self.event_id, self.error
        )
    }
}

/// Handler failures in the order they happened, rendered one per line
#[derive(Debug)]
pub struct AggregateError {
    failures: Vec<HandlerFailure>,
}

impl AggregateError {
    pub(crate) fn new(failures: Vec<HandlerFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandlerFailure> {
        self.failures.iter()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

/// Chains to the first failure
impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|failure| &failure.error as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
