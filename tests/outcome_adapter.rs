// tests/outcome_adapter.rs

mod common;
use crate::common::{init_tracing, with_timeout, TestResult};

use std::io;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use workerchain::engine::LifecycleOutcome;
use workerchain::errors::{FaultStage, LaunchError, ProcessFault};
use workerchain::events::{EventBus, LifecycleEvent};

fn watch(bus: &EventBus) -> workerchain::engine::PendingOutcome {
    LifecycleOutcome::watch(bus, CancellationToken::new(), "synthetic".to_string())
}

#[tokio::test]
async fn exit_zero_resolves_successfully() -> TestResult {
    init_tracing();

    let bus = EventBus::new(16);
    let pending = watch(&bus);

    bus.publish(LifecycleEvent::Data(b"noise".to_vec()));
    bus.publish(LifecycleEvent::Message(json!({"ok": true})));
    bus.publish(LifecycleEvent::Exit { code: Some(0) });

    let outcome = with_timeout(pending.wait()).await;
    assert_eq!(outcome?, LifecycleEvent::Exit { code: Some(0) });

    Ok(())
}

#[tokio::test]
async fn non_zero_exit_codes_are_failures() -> TestResult {
    for code in [1, 7, -1, 255] {
        let bus = EventBus::new(16);
        let pending = watch(&bus);
        bus.publish(LifecycleEvent::Exit { code: Some(code) });

        match with_timeout(pending).await {
            Err(LaunchError::NonZeroExit { code: got }) => assert_eq!(got, Some(code)),
            other => panic!("expected NonZeroExit for code {code}, got {other:?}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn exit_without_code_is_a_failure() -> TestResult {
    let bus = EventBus::new(16);
    let pending = watch(&bus);
    bus.publish(LifecycleEvent::Exit { code: None });

    let err = with_timeout(pending).await.unwrap_err();
    assert!(matches!(err, LaunchError::NonZeroExit { code: None }));
    assert_eq!(err.as_label(), "non_zero_exit");

    Ok(())
}

#[tokio::test]
async fn first_error_wins_over_a_later_exit() -> TestResult {
    let bus = EventBus::new(16);
    let pending = watch(&bus);

    let fault = ProcessFault::new(
        FaultStage::Ipc,
        "synthetic",
        &io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
    );
    bus.publish(LifecycleEvent::Error(fault.clone()));
    bus.publish(LifecycleEvent::Exit { code: Some(0) });

    match with_timeout(pending).await {
        Err(LaunchError::ProcessFault(got)) => assert_eq!(got, fault),
        other => panic!("expected ProcessFault, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn completion_without_exit_or_error_is_a_fault() -> TestResult {
    let bus = EventBus::new(16);
    let pending = watch(&bus);

    bus.publish(LifecycleEvent::Disconnect);
    bus.publish(LifecycleEvent::Close { code: Some(0) });

    match with_timeout(pending).await {
        Err(LaunchError::ProcessFault(fault)) => {
            assert_eq!(fault.stage, FaultStage::Terminate);
            assert_eq!(fault.worker, "synthetic");
        }
        other => panic!("expected terminate fault, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn cancellation_resolves_as_cancelled() -> TestResult {
    let bus = EventBus::new(16);
    let token = CancellationToken::new();
    let pending = LifecycleOutcome::watch(&bus, token.clone(), "synthetic".to_string());

    bus.publish(LifecycleEvent::Data(b"still running".to_vec()));
    token.cancel();

    let err = with_timeout(pending).await.unwrap_err();
    assert!(matches!(err, LaunchError::Cancelled));

    // The bus itself is untouched by the adapter.
    assert!(!bus.is_complete());

    Ok(())
}

#[tokio::test]
async fn outcome_resolves_exactly_once_even_if_more_events_follow() -> TestResult {
    let bus = EventBus::new(16);
    let pending = watch(&bus);

    bus.publish(LifecycleEvent::Exit { code: Some(2) });
    // Rejected: the bus is already complete.
    assert!(!bus.publish(LifecycleEvent::Exit { code: Some(0) }));

    let err = with_timeout(pending).await.unwrap_err();
    assert!(matches!(err, LaunchError::NonZeroExit { code: Some(2) }));

    Ok(())
}
