//! Delivery specs
//!
//! Verify which handlers run for a publication, and in what order.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn publish_without_matching_subscriptions_runs_nothing() {
    let bus = bus();
    let journal = Journal::new();
    bus.on("user.created").handle(journal.ok("handler"));

    bus.publish(&ctx(), "order.created", Payload::empty())
        .await
        .unwrap();

    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn handler_receives_the_published_payload() {
    let bus = bus();
    let journal = Journal::new();
    let sink = journal.clone();
    bus.on("user.created")
        .handle(move |_ctx: Context, name: EventName, data: Payload| {
            let sink = sink.clone();
            async move {
                let login = data.downcast_ref::<String>().cloned().unwrap_or_default();
                sink.push(format!("{name}:{login}"));
                Ok::<(), BoxError>(())
            }
        });

    bus.publish(&ctx(), "user.created", Payload::new("ada".to_string()))
        .await
        .unwrap();

    assert_eq!(journal.entries(), vec!["user.created:ada"]);
}

#[tokio::test(start_paused = true)]
async fn handlers_complete_in_registration_order() {
    let bus = bus();
    let journal = Journal::new();
    bus.on("job.done")
        .handle(journal.slow("h1", ms(30)))
        .handle(journal.ok("h2"))
        .handle(journal.slow("h3", ms(5)));

    bus.publish(&ctx(), "job.done", Payload::empty())
        .await
        .unwrap();

    assert_eq!(journal.entries(), vec!["h1", "h2", "h3"]);
}

#[tokio::test]
async fn one_event_reaches_every_matching_subscription() {
    let bus = bus();
    let journal = Journal::new();
    bus.on("user.created").handle(journal.ok("exact"));
    bus.when(WildcardMatcher::new("user.*"))
        .handle(journal.ok("wildcard"));
    bus.when(RegexMatcher::new("^order").unwrap())
        .handle(journal.ok("regex"));

    bus.publish(&ctx(), "user.created", Payload::empty())
        .await
        .unwrap();

    let mut entries = journal.entries();
    entries.sort();
    assert_eq!(entries, vec!["exact", "wildcard"]);
}

#[tokio::test]
async fn unsubscribed_handlers_stop_receiving() {
    let bus = bus();
    let journal = Journal::new();
    let id = bus.on("tick").handle(journal.ok("tick")).id();

    bus.publish(&ctx(), "tick", Payload::empty()).await.unwrap();
    assert!(bus.unsubscribe(&id));
    bus.publish(&ctx(), "tick", Payload::empty()).await.unwrap();

    assert_eq!(journal.entries(), vec!["tick"]);
}

#[tokio::test]
async fn default_bus_delivers_like_any_other() {
    init_tracing();
    let journal = Journal::new();
    let bus = evbus_core::default_bus();
    let id = bus.on("specs.default.ping").handle(journal.ok("pong")).id();

    evbus_core::default_bus()
        .publish(&ctx(), "specs.default.ping", Payload::empty())
        .await
        .unwrap();

    assert_eq!(journal.entries(), vec!["pong"]);
    assert!(bus.unsubscribe(&id));
}
