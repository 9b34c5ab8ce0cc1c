// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deadline-bounded execution of a unit of work
//!
//! The bound is on how long the *caller* waits, not on the work itself:
//!
//! ```text
//!   run_with_timeout(ctx, d, work)
//!     ├─ ctx already done?  ──► Err(ctx cause), work never starts
//!     ├─ scoped = ctx.with_timeout(d)   (d == 0: scoped = ctx)
//!     ├─ spawn work(scoped)
//!     └─ select
//!          ├─ work finished  ──► its result
//!          └─ scoped done    ──► Err(cause); work keeps running detached,
//!                                its result is discarded
//! ```
//!
//! When a deadline was derived it is canceled on return, so work that
//! watches its context sees the abandonment and can exit early.

use crate::context::Context;
use crate::error::BusError;
use std::future::Future;
use std::time::Duration;

/// Run `work` under `ctx`, additionally bounded by `timeout` when it is non-zero.
pub async fn run_with_timeout<F, Fut>(
    ctx: &Context,
    timeout: Option<Duration>,
    work: F,
) -> Result<(), BusError>
where
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = Result<(), BusError>> + Send + 'static,
{
    if let Some(err) = ctx.err() {
        return Err(err.into());
    }
    run_detachable(ctx, timeout, work).await
}

/// [`run_with_timeout`] without the up-front check: `work` always starts,
/// even on a context that has already ended.
///
/// For fire-and-forget notifications whose launch was already admitted.
pub(crate) async fn run_detachable<F, Fut>(
    ctx: &Context,
    timeout: Option<Duration>,
    work: F,
) -> Result<(), BusError>
where
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = Result<(), BusError>> + Send + 'static,
{
    let (scoped, _cancel_on_return) = match timeout.filter(|d| !d.is_zero()) {
        Some(d) => {
            let scoped = ctx.with_timeout(d);
            let guard = scoped.cancel_on_drop();
            (scoped, Some(guard))
        }
        None => (ctx.clone(), None),
    };

    let handle = tokio::spawn(work(scoped.clone()));

    tokio::select! {
        // A context that has ended wins over work finishing in the same instant
        biased;
        cause = scoped.done() => {
            tracing::trace!(error = %cause, "abandoning work after context ended");
            Err(cause.into())
        }
        joined = handle => match joined {
            Ok(result) => result,
            Err(e) => Err(BusError::Panicked(e.to_string())),
        },
    }
}

/// The shortest of the given limits, ignoring unset and zero ones.
///
/// Returns `None` (no limit) when every input is unset or zero.
pub fn shortest_timeout<I>(timeouts: I) -> Option<Duration>
where
    I: IntoIterator<Item = Option<Duration>>,
{
    timeouts
        .into_iter()
        .flatten()
        .filter(|d| !d.is_zero())
        .min()
}

#[cfg(test)]
#[path = "timeout_tests.rs"]
mod tests;
