// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observers: global listeners notified of every event in parallel

use super::event::{EventName, Payload};
use crate::context::Context;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Notified of every published event, regardless of subscriptions
///
/// Notifications are fire-and-forget: nothing an observer does is reported
/// back to the publisher.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn observe(&self, ctx: Context, name: EventName, data: Payload);
}

#[async_trait]
impl<F, Fut> Observer for F
where
    F: Fn(Context, EventName, Payload) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn observe(&self, ctx: Context, name: EventName, data: Payload) {
        (self)(ctx, name, data).await
    }
}

/// Observer handle for removal
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub String);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObserverOptions {
    timeout: Option<Duration>,
}

impl ObserverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap this observer's notification; the shorter of this and the
    /// event's handler timeout applies
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[derive(Clone)]
pub(crate) struct ObserverEntry {
    pub(crate) observer: Arc<dyn Observer>,
    pub(crate) options: ObserverOptions,
}
