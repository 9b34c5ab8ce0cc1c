//! Observer specs
//!
//! Verify observers see every publication and cannot block it. Observer
//! tasks are detached from the publish, so specs let them run on paused time
//! rather than flushing.

use crate::prelude::*;
use similar_asserts::assert_eq;

fn recorder(journal: &Journal) -> impl evbus_core::Observer {
    let sink = journal.clone();
    move |_ctx: Context, name: EventName, _data: Payload| {
        let sink = sink.clone();
        async move { sink.push(name.as_str()) }
    }
}

async fn settle() {
    tokio::time::sleep(ms(1)).await;
}

#[tokio::test(start_paused = true)]
async fn observers_see_events_without_subscriptions() {
    let bus = bus();
    let journal = Journal::new();
    bus.add_observer(recorder(&journal));

    bus.publish(&ctx(), "a", Payload::empty()).await.unwrap();
    bus.publish(&ctx(), "b", Payload::empty()).await.unwrap();
    settle().await;

    let mut seen = journal.entries();
    seen.sort();
    assert_eq!(seen, vec!["a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn removed_observer_stops_receiving() {
    let bus = bus();
    let journal = Journal::new();
    let id = bus.add_observer(recorder(&journal));

    bus.publish(&ctx(), "a", Payload::empty()).await.unwrap();
    settle().await;
    assert!(bus.remove_observer(&id));
    assert!(!bus.remove_observer(&id));
    bus.publish(&ctx(), "b", Payload::empty()).await.unwrap();
    settle().await;

    assert_eq!(journal.entries(), vec!["a"]);
    assert_eq!(bus.observer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_observer_does_not_delay_publish() {
    let bus = bus();
    let journal = Journal::new();
    let sink = journal.clone();
    bus.add_observer(move |_ctx: Context, _name: EventName, _data: Payload| {
        let sink = sink.clone();
        async move {
            tokio::time::sleep(ms(500)).await;
            sink.push("observed");
        }
    });
    bus.on("a").handle(journal.ok("handled"));

    let started = tokio::time::Instant::now();
    bus.publish(&ctx(), "a", Payload::empty()).await.unwrap();

    assert!(started.elapsed() < ms(500));
    assert_eq!(journal.entries(), vec!["handled"]);

    tokio::time::sleep(ms(600)).await;
    assert_eq!(journal.entries(), vec!["handled", "observed"]);
}

#[tokio::test(start_paused = true)]
async fn observer_timeout_cancels_its_context() {
    let bus = bus();
    let journal = Journal::new();
    let sink = journal.clone();
    bus.add_observer_with(
        move |ctx: Context, _name: EventName, _data: Payload| {
            let sink = sink.clone();
            async move {
                let cause = ctx.done().await;
                sink.push(cause.to_string());
            }
        },
        ObserverOptions::new().timeout(ms(20)),
    );

    bus.publish(&ctx(), "a", Payload::empty()).await.unwrap();
    tokio::time::sleep(ms(50)).await;

    assert_eq!(journal.entries(), vec!["context deadline exceeded"]);
}

#[tokio::test(start_paused = true)]
async fn observers_keep_running_after_a_timed_publish_returns() {
    let bus = bus();
    let journal = Journal::new();
    let sink = journal.clone();
    bus.add_observer(move |ctx: Context, _name: EventName, _data: Payload| {
        let sink = sink.clone();
        async move {
            tokio::time::sleep(ms(20)).await;
            sink.push(if ctx.is_done() { "canceled" } else { "live" });
        }
    });

    bus.publish_with(
        &ctx(),
        "a",
        Payload::empty(),
        PublishOptions::new().publish_timeout(ms(100)),
    )
    .await
    .unwrap();
    tokio::time::sleep(ms(50)).await;

    assert_eq!(journal.entries(), vec!["live"]);
}

#[tokio::test(start_paused = true)]
async fn event_handler_limit_also_bounds_observers() {
    let bus = bus();
    let journal = Journal::new();
    let sink = journal.clone();
    bus.add_observer_with(
        move |ctx: Context, _name: EventName, _data: Payload| {
            let sink = sink.clone();
            async move {
                let cause = ctx.done().await;
                sink.push(cause.to_string());
            }
        },
        ObserverOptions::new().timeout(ms(500)),
    );

    bus.publish_with(
        &ctx(),
        "a",
        Payload::empty(),
        PublishOptions::new().handler_timeout(ms(10)),
    )
    .await
    .unwrap();
    tokio::time::sleep(ms(20)).await;

    assert_eq!(journal.entries(), vec!["context deadline exceeded"]);
}
