// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus: routes publications to observers and matching subscriptions
//!
//! ```text
//!   publish(ctx, name, data)
//!     ├─ ctx done? ──► Err(ctx cause)
//!     ├─ closed?   ──► Err(Closed)
//!     ├─ build Event (id, timestamp, options)
//!     └─ run_with_timeout(publish_timeout)
//!          ├─ in-flight += 1  (held by the dispatch task until it ends)
//!          ├─ observers: acquire slot ─► spawn notify   (≤ max_concurrency at once)
//!          │    notify runs under the caller's ctx, never the publish-scoped one
//!          └─ subscriptions: for each match, handlers in order,
//!             each under run_with_timeout(handler_timeout)
//! ```
//!
//! Handlers within one subscription run in registration order. Subscriptions
//! under the same name run in registration order too; across different
//! names or `when` registrations the order is unspecified.

use super::event::{Event, EventName, Payload, PublishOptions};
use super::matcher::{ExactMatcher, Matcher};
use super::observer::{Observer, ObserverEntry, ObserverId, ObserverOptions};
use super::subscription::{Subscription, SubscriptionBuilder, SubscriptionId};
use crate::clock::{Clock, SystemClock};
use crate::config::BusConfig;
use crate::context::{Context, ContextError};
use crate::error::{AggregateError, BusError, HandlerFailure};
use crate::id::{IdGen, UuidIdGen};
use crate::timeout::{run_detachable, run_with_timeout, shortest_timeout};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Registry key; `when` subscriptions get their own key so they can never
/// collide with a name registered through `on`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum SubscriptionKey {
    Name(EventName),
    Matchers(SubscriptionId),
}

struct Inner {
    subscriptions: RwLock<HashMap<SubscriptionKey, Vec<Arc<Subscription>>>>,
    observers: RwLock<HashMap<ObserverId, ObserverEntry>>,
    in_flight: watch::Sender<usize>,
    closed: CancellationToken,
    config: BusConfig,
    ids: Arc<dyn IdGen>,
    clock: Arc<dyn Clock>,
}

/// In-process publish/subscribe dispatcher
///
/// Cheap to clone; clones share registrations and lifecycle.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

/// Configures a [`Bus`] before construction
pub struct BusBuilder {
    config: BusConfig,
    ids: Arc<dyn IdGen>,
    clock: Arc<dyn Clock>,
}

impl BusBuilder {
    /// Observer fan-out ceiling, clamped to at least 1
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrency = n;
        self
    }

    /// Keep dispatching after handler failures and return them aggregated
    pub fn continue_on_error(mut self) -> Self {
        self.config.continue_on_error = true;
        self
    }

    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    pub fn id_gen(mut self, ids: impl IdGen + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn build(self) -> Bus {
        let (in_flight, _) = watch::channel(0);
        Bus {
            inner: Arc::new(Inner {
                subscriptions: RwLock::new(HashMap::new()),
                observers: RwLock::new(HashMap::new()),
                in_flight,
                closed: CancellationToken::new(),
                config: self.config.normalized(),
                ids: self.ids,
                clock: self.clock,
            }),
        }
    }
}

/// Counts a publish as in flight until dropped
///
/// Owned so it can move into the spawned dispatch, which may outlive the
/// `publish` future that started it.
struct InFlight(Arc<Inner>);

impl InFlight {
    fn enter(inner: &Arc<Inner>) -> Self {
        inner.in_flight.send_modify(|n| *n += 1);
        Self(Arc::clone(inner))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Bus {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> BusBuilder {
        BusBuilder {
            config: BusConfig::default(),
            ids: Arc::new(UuidIdGen),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_config(config: BusConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Subscribe to one event name
    pub fn on(&self, name: impl Into<EventName>) -> SubscriptionBuilder {
        let name = name.into();
        let matcher: Arc<dyn Matcher> = Arc::new(ExactMatcher::new(name.clone()));
        self.register(|_| SubscriptionKey::Name(name), vec![matcher])
    }

    /// Subscribe with an arbitrary matcher
    pub fn when(&self, matcher: impl Matcher + 'static) -> SubscriptionBuilder {
        self.when_any(vec![Arc::new(matcher) as Arc<dyn Matcher>])
    }

    /// Subscribe with several matchers, any of which may match
    pub fn when_any<I>(&self, matchers: I) -> SubscriptionBuilder
    where
        I: IntoIterator<Item = Arc<dyn Matcher>>,
    {
        let matchers = matchers.into_iter().collect();
        self.register(|id| SubscriptionKey::Matchers(id.clone()), matchers)
    }

    fn register(
        &self,
        key: impl FnOnce(&SubscriptionId) -> SubscriptionKey,
        matchers: Vec<Arc<dyn Matcher>>,
    ) -> SubscriptionBuilder {
        let id = SubscriptionId(self.inner.ids.next());
        let subscription = Arc::new(Subscription::new(id.clone(), matchers));
        let key = key(&id);

        let mut subs = self.write_subscriptions();
        subs.entry(key)
            .or_default()
            .push(Arc::clone(&subscription));
        drop(subs);

        tracing::debug!(subscription = %id, matchers = %subscription.describe(), "subscribed");
        SubscriptionBuilder::new(subscription)
    }

    /// Remove a subscription; returns whether it existed
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let mut subs = self.write_subscriptions();
        let mut removed = false;
        subs.retain(|_, list| {
            let before = list.len();
            list.retain(|s| s.id() != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        drop(subs);

        if removed {
            tracing::debug!(subscription = %id, "unsubscribed");
        }
        removed
    }

    pub fn subscription_count(&self) -> usize {
        self.read_subscriptions().values().map(Vec::len).sum()
    }

    pub fn add_observer(&self, observer: impl Observer + 'static) -> ObserverId {
        self.add_observer_with(observer, ObserverOptions::default())
    }

    /// Register an observer notified of every event
    pub fn add_observer_with(
        &self,
        observer: impl Observer + 'static,
        options: ObserverOptions,
    ) -> ObserverId {
        let id = ObserverId(self.inner.ids.next());
        let entry = ObserverEntry {
            observer: Arc::new(observer),
            options,
        };
        self.inner
            .observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), entry);

        tracing::debug!(observer = %id, "observer added");
        id
    }

    /// Remove an observer; returns whether it existed
    pub fn remove_observer(&self, id: &ObserverId) -> bool {
        let removed = self
            .inner
            .observers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .is_some();
        if removed {
            tracing::debug!(observer = %id, "observer removed");
        }
        removed
    }

    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub async fn publish(
        &self,
        ctx: &Context,
        name: impl Into<EventName>,
        data: Payload,
    ) -> Result<(), BusError> {
        self.publish_with(ctx, name, data, PublishOptions::default())
            .await
    }

    /// Publish an event and wait for subscription handlers
    ///
    /// Returns the first handler error, or every failure aggregated when the
    /// bus continues on error. Observers are launched but not awaited.
    pub async fn publish_with(
        &self,
        ctx: &Context,
        name: impl Into<EventName>,
        data: Payload,
        options: PublishOptions,
    ) -> Result<(), BusError> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let event = Arc::new(self.new_event(name.into(), data, options));
        let in_flight = InFlight::enter(&self.inner);

        let span = tracing::debug_span!("publish", event = %event.name, event_id = %event.id);
        let bus = self.clone();
        let caller = ctx.clone();
        let dispatched = Arc::clone(&event);
        let result = run_with_timeout(ctx, event.publish_timeout(), move |ctx| {
            async move {
                let _in_flight = in_flight;
                bus.notify_observers(&ctx, &caller, &dispatched).await?;
                bus.dispatch(&ctx, &dispatched).await
            }
            .instrument(span)
        })
        .await;

        if let Err(e) = &result {
            tracing::debug!(event = %event.name, event_id = %event.id, error = %e, "publish failed");
        }
        result
    }

    fn new_event(&self, name: EventName, data: Payload, options: PublishOptions) -> Event {
        let config = &self.inner.config;
        let defaults = PublishOptions::with_limits(config.handler_timeout, config.publish_timeout);

        Event::new(self.inner.ids.next(), name, data, self.inner.clock.now())
            .with_options(options.or(defaults))
    }

    /// Launch every observer, at most `max_concurrency` running at once.
    ///
    /// Only fails if `ctx` ends while waiting for a slot. Launched observers
    /// run under `caller`, so they are unaffected by the publish returning.
    async fn notify_observers(
        &self,
        ctx: &Context,
        caller: &Context,
        event: &Arc<Event>,
    ) -> Result<(), BusError> {
        let observers = self.observer_snapshot();
        if observers.is_empty() {
            return Ok(());
        }

        let slots = Arc::new(Semaphore::new(
            self.inner.config.max_concurrency.clamp(1, Semaphore::MAX_PERMITS),
        ));

        for (id, entry) in observers {
            if let Some(err) = ctx.err() {
                return Err(err.into());
            }

            let permit = tokio::select! {
                acquired = Arc::clone(&slots).acquire_owned() => {
                    acquired.map_err(|_| BusError::Context(ContextError::Canceled))?
                }
                cause = ctx.done() => return Err(cause.into()),
            };

            let ctx = caller.child();
            let event = Arc::clone(event);
            tokio::spawn(async move {
                let _permit = permit;
                let timeout = shortest_timeout([event.handler_timeout(), entry.options.get_timeout()]);
                let observer = entry.observer;
                let name = event.name.clone();
                let data = event.data.clone();

                let outcome = run_detachable(&ctx, timeout, move |ctx| async move {
                    observer.observe(ctx, name, data).await;
                    Ok(())
                })
                .await;

                if let Err(e) = outcome {
                    tracing::debug!(observer = %id, event_id = %event.id, error = %e, "observer notification abandoned");
                }
            });
        }

        Ok(())
    }

    /// Run handlers of every matching subscription, in sequence
    async fn dispatch(&self, ctx: &Context, event: &Arc<Event>) -> Result<(), BusError> {
        let mut failures = Vec::new();

        for subscription in self.subscription_snapshot() {
            if let Some(err) = ctx.err() {
                return Err(err.into());
            }
            if !subscription.matches(&event.name, &event.data) {
                continue;
            }

            for handler in subscription.handlers() {
                let name = event.name.clone();
                let data = event.data.clone();
                let result = run_with_timeout(ctx, event.handler_timeout(), move |ctx| async move {
                    handler.handle(ctx, name, data).await.map_err(BusError::Handler)
                })
                .await;

                let Err(error) = result else {
                    continue;
                };
                if !self.inner.config.continue_on_error {
                    return Err(error);
                }

                tracing::warn!(
                    subscription = %subscription.id(),
                    event = %event.name,
                    event_id = %event.id,
                    error = %error,
                    "handler failed, continuing"
                );
                failures.push(HandlerFailure {
                    subscription: subscription.id().clone(),
                    event: event.name.clone(),
                    event_id: event.id.clone(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError::new(failures).into())
        }
    }

    /// Number of publishes currently running
    pub fn in_flight(&self) -> usize {
        *self.inner.in_flight.borrow()
    }

    /// Wait until no publish is in flight, or `ctx` ends
    ///
    /// A publish counts until its dispatch ends, even if the caller dropped
    /// the `publish` future. Detached observer notifications are not
    /// counted. New publishes may start while this waits; it returns once
    /// the count reaches zero.
    pub async fn flush(&self, ctx: &Context) -> Result<(), ContextError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let mut in_flight = self.inner.in_flight.subscribe();
        tokio::select! {
            cause = ctx.done() => Err(cause),
            _ = in_flight.wait_for(|n| *n == 0) => Ok(()),
        }
    }

    /// Wait for [`Bus::close`], then flush
    pub async fn wait(&self, ctx: &Context) -> Result<(), ContextError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        tokio::select! {
            cause = ctx.done() => Err(cause),
            _ = self.inner.closed.cancelled() => self.flush(ctx).await,
        }
    }

    /// Stop accepting publishes. Idempotent and irreversible.
    pub fn close(&self) {
        if self.inner.closed.is_cancelled() {
            return;
        }
        self.inner.closed.cancel();
        tracing::info!(in_flight = self.in_flight(), "bus closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    fn subscription_snapshot(&self) -> Vec<Arc<Subscription>> {
        self.read_subscriptions()
            .values()
            .flat_map(|list| list.iter().cloned())
            .collect()
    }

    fn observer_snapshot(&self) -> Vec<(ObserverId, ObserverEntry)> {
        self.inner
            .observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    fn read_subscriptions(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<SubscriptionKey, Vec<Arc<Subscription>>>> {
        self.inner
            .subscriptions
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn write_subscriptions(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<SubscriptionKey, Vec<Arc<Subscription>>>> {
        self.inner
            .subscriptions
            .write()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("config", &self.inner.config)
            .field("closed", &self.is_closed())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
