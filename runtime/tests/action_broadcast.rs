//! Integration tests for Store action broadcasting
//!
//! A fetch is modelled as an intent whose effect settles later with a
//! correlated result, the way the client's resource containers work.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use hawker_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use hawker_runtime::{Store, StoreConfig, StoreError};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    Fetch { id: u64, latency_ms: u64 },
    Fetched { id: u64 },
    Bump,
}

#[derive(Debug, Clone, Default)]
struct TestState {
    in_flight: u32,
    settled: Vec<u64>,
    bumps: u32,
}

#[derive(Clone)]
struct TestEnvironment;

#[derive(Clone)]
struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Fetch { id, latency_ms } => {
                state.in_flight += 1;
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(latency_ms)).await;
                    Some(TestAction::Fetched { id })
                }))]
            },
            TestAction::Fetched { id } => {
                state.in_flight -= 1;
                state.settled.push(id);
                SmallVec::new()
            },
            TestAction::Bump => {
                state.bumps += 1;
                SmallVec::new()
            },
        }
    }
}

fn store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::new(TestState::default(), TestReducer, TestEnvironment)
}

#[tokio::test]
async fn every_subscriber_sees_actions_in_application_order() {
    let store = store();
    let mut first = store.subscribe_actions();
    let mut second = store.subscribe_actions();

    let mut handle = store
        .send(TestAction::Fetch {
            id: 1,
            latency_ms: 5,
        })
        .await
        .unwrap();
    store.send(TestAction::Bump).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    let expected = vec![
        TestAction::Fetch {
            id: 1,
            latency_ms: 5,
        },
        TestAction::Bump,
        TestAction::Fetched { id: 1 },
    ];
    for rx in [&mut first, &mut second] {
        let mut seen = Vec::new();
        for _ in 0..expected.len() {
            seen.push(rx.recv().await.unwrap());
        }
        assert_eq!(seen, expected);
    }
}

#[tokio::test]
async fn concurrent_requests_match_their_own_settlement() {
    let store = store();

    let slow = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .send_and_wait_for(
                    TestAction::Fetch {
                        id: 1,
                        latency_ms: 60,
                    },
                    |a| matches!(a, TestAction::Fetched { id: 1 }),
                    Duration::from_secs(1),
                )
                .await
        })
    };
    let fast = store
        .send_and_wait_for(
            TestAction::Fetch {
                id: 2,
                latency_ms: 5,
            },
            |a| matches!(a, TestAction::Fetched { id: 2 }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(fast, TestAction::Fetched { id: 2 });
    assert_eq!(slow.await.unwrap().unwrap(), TestAction::Fetched { id: 1 });

    let state = store.state(Clone::clone).await;
    assert_eq!(state.settled, vec![2, 1]);
    assert_eq!(state.in_flight, 0);
}

#[tokio::test]
async fn lagging_subscriber_is_told_how_far_behind_it_is() {
    let store = Store::with_config(
        TestState::default(),
        TestReducer,
        TestEnvironment,
        StoreConfig::default().with_broadcast_capacity(2),
    );
    let mut rx = store.subscribe_actions();

    for _ in 0..5 {
        store.send(TestAction::Bump).await.unwrap();
    }

    match rx.recv().await {
        Err(RecvError::Lagged(skipped)) => assert_eq!(skipped, 3),
        other => panic!("expected lag, got {other:?}"),
    }
    assert_eq!(rx.recv().await.unwrap(), TestAction::Bump);
    assert_eq!(store.state(|s| s.bumps).await, 5);
}

#[tokio::test]
async fn shutdown_drains_in_flight_fetches() {
    let store = store();
    store
        .send(TestAction::Fetch {
            id: 7,
            latency_ms: 20,
        })
        .await
        .unwrap();

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(store.pending_effects(), 0);
    assert_eq!(
        store.send(TestAction::Bump).await.unwrap_err(),
        StoreError::ShutdownInProgress
    );
}
