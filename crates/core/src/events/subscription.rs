// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriptions: matchers plus an ordered list of handlers

use super::event::{EventName, Payload};
use super::matcher::Matcher;
use crate::context::Context;
use crate::error::BoxError;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Subscription handle for unsubscribing
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub String);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Callback run for every event a subscription matches
///
/// Implemented for async closures `Fn(Context, EventName, Payload) -> impl Future<Output = Result<(), BoxError>>`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: Context, name: EventName, data: Payload) -> Result<(), BoxError>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Context, EventName, Payload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn handle(&self, ctx: Context, name: EventName, data: Payload) -> Result<(), BoxError> {
        (self)(ctx, name, data).await
    }
}

#[derive(Default)]
struct State {
    matchers: Vec<Arc<dyn Matcher>>,
    handlers: Vec<Arc<dyn Handler>>,
}

/// A matched interest with ordered handlers
///
/// Matchers are OR-combined. Handlers only ever get appended, and run in the
/// order they were added.
pub struct Subscription {
    id: SubscriptionId,
    state: RwLock<State>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, matchers: Vec<Arc<dyn Matcher>>) -> Self {
        Self {
            id,
            state: RwLock::new(State {
                matchers,
                handlers: Vec::new(),
            }),
        }
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Check if any matcher accepts the event
    pub fn matches(&self, name: &EventName, data: &Payload) -> bool {
        // Matchers run without the lock held so a predicate may touch the bus
        let matchers = self.read().matchers.clone();
        matchers.iter().any(|m| m.matches(name, data))
    }

    pub fn handler_count(&self) -> usize {
        self.read().handlers.len()
    }

    /// Matcher descriptions joined with `|`
    pub fn describe(&self) -> String {
        let state = self.read();
        let parts: Vec<String> = state.matchers.iter().map(|m| m.describe()).collect();
        parts.join(" | ")
    }

    pub(crate) fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.read().handlers.clone()
    }

    fn add_matcher(&self, matcher: Arc<dyn Matcher>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.matchers.push(matcher);
    }

    fn add_handler(&self, handler: Arc<dyn Handler>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.handlers.push(handler);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("matchers", &self.describe())
            .field("handlers", &self.handler_count())
            .finish()
    }
}

/// Returned by `Bus::on` / `Bus::when` to extend a registered subscription
#[derive(Clone, Debug)]
pub struct SubscriptionBuilder {
    subscription: Arc<Subscription>,
}

impl SubscriptionBuilder {
    pub(crate) fn new(subscription: Arc<Subscription>) -> Self {
        Self { subscription }
    }

    /// Also match events accepted by `matcher`
    pub fn or(self, matcher: impl Matcher + 'static) -> Self {
        self.subscription.add_matcher(Arc::new(matcher));
        self
    }

    /// Append a handler; call repeatedly to attach several
    pub fn handle(self, handler: impl Handler + 'static) -> Self {
        self.subscription.add_handler(Arc::new(handler));
        self
    }

    pub fn id(&self) -> SubscriptionId {
        self.subscription.id.clone()
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
