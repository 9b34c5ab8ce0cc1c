//! Close specs

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn publish_after_close_is_rejected() {
    let bus = bus();
    let journal = Journal::new();
    bus.on("a").handle(journal.ok("handled"));

    bus.close();
    let err = bus.publish(&ctx(), "a", Payload::empty()).await.unwrap_err();

    assert!(err.is_closed());
    assert_eq!(err.to_string(), "bus is closed");
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn closing_twice_is_harmless() {
    let bus = bus();
    bus.close();
    bus.close();
    assert!(bus.is_closed());
}

#[tokio::test]
async fn clones_share_the_closed_state() {
    let bus = bus();
    let other = bus.clone();

    other.close();

    assert!(bus.is_closed());
    assert!(bus.publish(&ctx(), "a", Payload::empty()).await.unwrap_err().is_closed());
}

#[tokio::test]
async fn registrations_are_still_accepted_after_close() {
    let bus = bus();
    bus.close();
    bus.on("a").handle(|_ctx: Context, _name: EventName, _data: Payload| async {
        Ok::<(), BoxError>(())
    });
    assert_eq!(bus.subscription_count(), 1);
}
