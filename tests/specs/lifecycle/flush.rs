//! Flush and wait specs

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn flush_on_idle_bus_returns_at_once() {
    let bus = bus();
    bus.flush(&ctx()).await.unwrap();
    assert_eq!(bus.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn flush_waits_for_inflight_publishes() {
    let bus = bus();
    let journal = Journal::new();
    bus.on("slow").handle(journal.slow("done", ms(50)));

    let publisher = bus.clone();
    let task = tokio::spawn(async move {
        publisher.publish(&ctx(), "slow", Payload::empty()).await
    });
    tokio::time::sleep(ms(1)).await;
    assert_eq!(bus.in_flight(), 1);

    bus.flush(&ctx()).await.unwrap();

    assert_eq!(journal.entries(), vec!["done"]);
    assert_eq!(bus.in_flight(), 0);
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn flush_gives_up_when_its_context_ends() {
    let bus = bus();
    let journal = Journal::new();
    bus.on("slow").handle(journal.slow("done", ms(500)));

    let publisher = bus.clone();
    tokio::spawn(async move { publisher.publish(&ctx(), "slow", Payload::empty()).await });
    tokio::time::sleep(ms(1)).await;

    let err = bus.flush(&ctx().with_timeout(ms(10))).await.unwrap_err();
    assert_eq!(err, ContextError::DeadlineExceeded);
}

#[tokio::test]
async fn flush_with_canceled_context_returns_immediately() {
    let bus = bus();
    let ctx = ctx();
    ctx.cancel();

    assert_eq!(bus.flush(&ctx).await, Err(ContextError::Canceled));
    assert_eq!(bus.wait(&ctx).await, Err(ContextError::Canceled));
}

#[tokio::test(start_paused = true)]
async fn wait_blocks_until_close_and_drain() {
    let bus = bus();
    let journal = Journal::new();
    bus.on("slow").handle(journal.slow("done", ms(20)));

    let waiter = {
        let bus = bus.clone();
        let journal = journal.clone();
        tokio::spawn(async move {
            bus.wait(&ctx()).await.unwrap();
            journal.push("waited");
        })
    };

    bus.publish(&ctx(), "slow", Payload::empty()).await.unwrap();
    tokio::time::sleep(ms(100)).await;
    assert_eq!(journal.entries(), vec!["done"]);

    bus.close();
    waiter.await.unwrap();
    assert_eq!(journal.entries(), vec!["done", "waited"]);
}

#[tokio::test(start_paused = true)]
async fn wait_honors_its_context() {
    let bus = bus();
    let err = bus.wait(&ctx().with_timeout(ms(10))).await.unwrap_err();
    assert_eq!(err, ContextError::DeadlineExceeded);
}
