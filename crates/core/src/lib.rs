// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! evbus-core: in-process publish/subscribe dispatcher
//!
//! This crate provides:
//! - A `Bus` that delivers named events with arbitrary payloads
//! - Exact, wildcard, regex and predicate matchers for subscriptions
//! - Sequential, matcher-gated handler dispatch with per-handler and
//!   per-publication timeouts
//! - Bounded-parallel observer fan-out
//! - Open/closed lifecycle with flush and wait
//!
//! Delivery is best-effort and at-most-once within one process.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod global;
pub mod id;
pub mod timeout;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BusConfig, ConfigError};
pub use context::{Context, ContextError};
pub use error::{AggregateError, BoxError, BusError, HandlerFailure};
pub use events::{
    predicate, Bus, BusBuilder, CaseInsensitiveMatcher, Event, EventName, ExactMatcher, Handler,
    Matcher, Observer, ObserverId, ObserverOptions, Payload, PredicateMatcher, PublishOptions,
    RegexMatcher, Subscription, SubscriptionBuilder, SubscriptionId, WildcardMatcher,
};
pub use global::{default_bus, set_default_bus};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
