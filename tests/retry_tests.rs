//! Backoff and fallback behaviour, timed on a paused tokio clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::*;
use elpris::error::ChatError;
use elpris::util::RetryPolicy;

fn policy() -> RetryPolicy {
    RetryPolicy::from_millis(&[500, 1000, 2000, 4000])
}

fn gaps(calls: &[RecordedCall]) -> Vec<Duration> {
    calls.windows(2).map(|pair| pair[1].at - pair[0].at).collect()
}

#[tokio::test(start_paused = true)]
async fn transient_failures_sleep_through_the_schedule_in_order() {
    let provider = Arc::new(MockProvider::new());
    provider
        .queue_error(overloaded())
        .queue_error(ChatError::RateLimited("RESOURCE_EXHAUSTED".into()))
        .queue_error(ChatError::api(429, "RESOURCE_EXHAUSTED: Quota exceeded"))
        .queue_text("Till slut ett svar.");
    let bridge = Arc::new(MockToolBridge::returning(json!({})));
    let orchestrator = orchestrator(provider.clone(), bridge, policy(), Some(FALLBACK));

    let reply = orchestrator.handle_turn("Hej").await.unwrap();

    assert_eq!(reply.reply, "Till slut ett svar.");
    let calls = provider.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|call| call.model_id == PRIMARY));
    assert_eq!(
        gaps(&calls),
        vec![
            Duration::from_millis(500),
            Duration::from_millis(1000),
            Duration::from_millis(2000),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn fallback_runs_after_a_full_primary_cycle() {
    let provider = Arc::new(MockProvider::new());
    for _ in 0..5 {
        provider.queue_error(overloaded());
    }
    provider.queue_text("Svar från reservmodellen.");
    let bridge = Arc::new(MockToolBridge::returning(json!({})));
    let orchestrator = orchestrator(provider.clone(), bridge, policy(), Some(FALLBACK));

    let reply = orchestrator.handle_turn("Hej").await.unwrap();

    assert_eq!(reply.reply, "Svar från reservmodellen.");
    let models: Vec<_> = provider
        .calls()
        .into_iter()
        .map(|call| call.model_id)
        .collect();
    assert_eq!(models.iter().filter(|m| *m == PRIMARY).count(), 5);
    assert_eq!(models.last().map(String::as_str), Some(FALLBACK));
}

#[tokio::test(start_paused = true)]
async fn exhausted_fallback_reports_the_fallback_model() {
    let provider = Arc::new(MockProvider::new());
    for _ in 0..4 {
        provider.queue_error(overloaded());
    }
    let bridge = Arc::new(MockToolBridge::returning(json!({})));
    let orchestrator = orchestrator(
        provider.clone(),
        bridge,
        RetryPolicy::from_millis(&[10]),
        Some(FALLBACK),
    );

    let err = orchestrator.handle_turn("Hej").await.unwrap_err();

    match err {
        ChatError::RetriesExhausted {
            model, attempts, ..
        } => {
            assert_eq!(model, FALLBACK);
            assert_eq!(attempts, 2);
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert_eq!(provider.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn fatal_error_skips_retries_but_still_falls_back() {
    let provider = Arc::new(MockProvider::new());
    provider
        .queue_error(ChatError::api(400, "INVALID_ARGUMENT: bad request"))
        .queue_text("Reserv.");
    let bridge = Arc::new(MockToolBridge::returning(json!({})));
    let orchestrator = orchestrator(provider.clone(), bridge, policy(), Some(FALLBACK));

    let reply = orchestrator.handle_turn("Hej").await.unwrap();

    assert_eq!(reply.reply, "Reserv.");
    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].model_id, FALLBACK);
    assert_eq!(calls[1].at, calls[0].at);
}

#[tokio::test(start_paused = true)]
async fn internal_server_error_surfaces_without_retry() {
    let provider = Arc::new(MockProvider::new());
    provider
        .queue_error(ChatError::api(500, "INTERNAL: An internal error has occurred."))
        .queue_text("ska aldrig användas");
    let bridge = Arc::new(MockToolBridge::returning(json!({})));
    let orchestrator = orchestrator(provider.clone(), bridge, policy(), None);

    let err = orchestrator.handle_turn("Hej").await.unwrap_err();

    assert!(matches!(err, ChatError::Api { status: 500, .. }));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_surfaces_without_retry() {
    let provider = Arc::new(MockProvider::new());
    provider
        .queue_error(ChatError::Timeout(60_000))
        .queue_text("ska aldrig användas");
    let bridge = Arc::new(MockToolBridge::returning(json!({})));
    let orchestrator = orchestrator(provider.clone(), bridge, policy(), None);

    let err = orchestrator.handle_turn("Hej").await.unwrap_err();

    assert!(matches!(err, ChatError::Timeout(60_000)));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_on_primary_goes_straight_to_fallback() {
    let provider = Arc::new(MockProvider::new());
    provider
        .queue_error(ChatError::Timeout(60_000))
        .queue_text("Reservsvar.");
    let bridge = Arc::new(MockToolBridge::returning(json!({})));
    let orchestrator = orchestrator(provider.clone(), bridge, policy(), Some(FALLBACK));

    let reply = orchestrator.handle_turn("Hej").await.unwrap();

    assert_eq!(reply.reply, "Reservsvar.");
    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].model_id, FALLBACK);
    assert_eq!(calls[1].at, calls[0].at);
}

#[tokio::test(start_paused = true)]
async fn fallback_equal_to_primary_is_ignored() {
    let provider = Arc::new(MockProvider::new());
    provider
        .queue_error(ChatError::Authentication("API key not valid".into()))
        .queue_text("ska aldrig användas");
    let bridge = Arc::new(MockToolBridge::returning(json!({})));
    let orchestrator = orchestrator(provider.clone(), bridge, policy(), Some(PRIMARY));

    let err = orchestrator.handle_turn("Hej").await.unwrap_err();

    assert!(matches!(err, ChatError::Authentication(_)));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn each_round_gets_its_own_retry_budget() {
    let provider = Arc::new(MockProvider::new());
    provider
        .queue_error(overloaded())
        .queue_tool_calls(&[("get_el_price", json!({ "area": "SE3" }))])
        .queue_error(overloaded())
        .queue_text("Snittpriset i SE3 idag är 1.23 SEK/kWh.");
    let bridge = Arc::new(MockToolBridge::returning(se3_price_payload()));
    let orchestrator = orchestrator(
        provider.clone(),
        bridge.clone(),
        RetryPolicy::from_millis(&[250]),
        None,
    );

    let reply = orchestrator.handle_turn("Pris i SE3?").await.unwrap();

    assert_eq!(reply.reply, "Snittpriset i SE3 idag är 1.23 SEK/kWh.");
    assert_eq!(provider.call_count(), 4);
    assert_eq!(bridge.calls().len(), 1);
}
