// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events system: publication, matching and delivery
//!
//! This module provides:
//! - `Bus` - Publish events to observers and matching subscriptions
//! - `Matcher` - Decide which subscriptions an event reaches
//! - `Subscription` - Ordered handlers behind a set of matchers
//! - `Observer` - Global listeners notified of every event

mod bus;
mod event;
mod matcher;
mod observer;
mod subscription;

pub use bus::{Bus, BusBuilder};
pub use event::{Event, EventName, Payload, PublishOptions};
pub use matcher::{
    predicate, CaseInsensitiveMatcher, ExactMatcher, Matcher, PredicateMatcher, RegexMatcher,
    WildcardMatcher,
};
pub use observer::{Observer, ObserverId, ObserverOptions};
pub use subscription::{Handler, Subscription, SubscriptionBuilder, SubscriptionId};
