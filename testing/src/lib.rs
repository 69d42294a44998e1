//! # Hawker Testing
//!
//! Testing utilities and helpers for the hawker client state container.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - Effect assertions and a helper that settles effects without a Store
//! - Deterministic implementations of Environment traits
//!
//! ## Example
//!
//! ```ignore
//! use hawker_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(CartReducer)
//!     .with_env(())
//!     .given_state(CartState::default())
//!     .when_action(CartAction::Clear)
//!     .then_state(|state| assert!(state.is_empty()))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use hawker_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Deterministic implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use hawker_testing::mocks::FixedClock;
    /// use hawker_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Helpers for driving effects outside a Store
pub mod helpers {
    use futures::future::join_all;
    use hawker_core::effect::Effect;

    /// Run effects to completion and collect the actions they feed back
    ///
    /// Futures are polled concurrently and their actions are returned in
    /// declaration order, so the result is deterministic. Actions produced
    /// here are *not* reduced again.
    ///
    /// ```
    /// use hawker_core::effect::Effect;
    /// use hawker_testing::helpers::settle_effects;
    ///
    /// # futures::executor::block_on(async {
    /// let effects = vec![
    ///     Effect::None,
    ///     Effect::Future(Box::pin(async { Some(1) })),
    /// ];
    /// assert_eq!(settle_effects(effects).await, vec![1]);
    /// # });
    /// ```
    pub async fn settle_effects<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let pending = effects.into_iter().filter_map(|effect| match effect {
            Effect::None => None,
            Effect::Future(fut) => Some(fut),
        });

        join_all(pending).await.into_iter().flatten().collect()
    }
}

pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use hawker_core::effect::Effect;
    use std::time::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_settle_effects_keeps_declaration_order() {
        let effects = vec![
            Effect::Future(Box::pin(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Some("slow")
            })),
            Effect::None,
            Effect::Future(Box::pin(async { None })),
            Effect::Future(Box::pin(async { Some("fast") })),
        ];

        assert_eq!(helpers::settle_effects(effects).await, vec!["slow", "fast"]);
    }
}
