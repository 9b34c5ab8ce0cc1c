// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event names, payloads and the per-publication event record

use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Canonical name of an event
///
/// Exact matching compares this string form, case-sensitively. Domain enums
/// can implement `From<MyEvent> for EventName` to publish typed names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventName(Arc<str>);

impl EventName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for EventName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&EventName> for EventName {
    fn from(name: &EventName) -> Self {
        name.clone()
    }
}

impl PartialEq<str> for EventName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for EventName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Opaque, shareable event payload
///
/// Handlers recover the concrete value with [`Payload::downcast_ref`].
#[derive(Clone, Default)]
pub struct Payload(Option<Arc<dyn Any + Send + Sync>>);

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    /// A payload carrying nothing
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Payload(..)"),
            None => f.write_str("Payload(empty)"),
        }
    }
}

/// Per-publication delivery limits
///
/// Unset or zero durations mean "no limit".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishOptions {
    handler_timeout: Option<Duration>,
    publish_timeout: Option<Duration>,
}

impl PublishOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap each handler and observer invocation
    pub fn handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    /// Cap the whole publication: observer fan-out plus every handler
    pub fn publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = Some(timeout);
        self
    }

    pub(crate) fn with_limits(
        handler_timeout: Option<Duration>,
        publish_timeout: Option<Duration>,
    ) -> Self {
        Self {
            handler_timeout,
            publish_timeout,
        }
    }

    /// Fill limits this value leaves unset from `fallback`
    pub(crate) fn or(self, fallback: PublishOptions) -> Self {
        Self {
            handler_timeout: self.handler_timeout.or(fallback.handler_timeout),
            publish_timeout: self.publish_timeout.or(fallback.publish_timeout),
        }
    }
}

/// One publication: created by the bus on publish, never mutated afterwards
#[derive(Clone, Debug)]
pub struct Event {
    pub id: String,
    pub name: EventName,
    pub data: Payload,
    pub timestamp: DateTime<Utc>,
    handler_timeout: Option<Duration>,
    publish_timeout: Option<Duration>,
}

impl Event {
    pub(crate) fn new(id: String, name: EventName, data: Payload, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            data,
            timestamp,
            handler_timeout: None,
            publish_timeout: None,
        }
    }

    pub(crate) fn with_options(mut self, options: PublishOptions) -> Self {
        self.handler_timeout = options.handler_timeout;
        self.publish_timeout = options.publish_timeout;
        self
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout
    }

    pub fn publish_timeout(&self) -> Option<Duration> {
        self.publish_timeout
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
