//! Reducer composition utilities
//!
//! A parent feature embeds child features by *scoping* their reducers:
//! the child sees only its own slice of state, its own action type and its
//! own environment, and its effects are lifted back into the parent's
//! action type.
//!
//! # Examples
//!
//! ```
//! use hawker_core::composition::scope_reducer;
//! use hawker_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Default)]
//! struct CounterState {
//!     count: i32,
//! }
//!
//! #[derive(Clone)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! #[derive(Clone)]
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     counter: CounterState,
//!     title: String,
//! }
//!
//! #[derive(Clone)]
//! enum AppAction {
//!     Counter(CounterAction),
//!     Rename(String),
//! }
//!
//! fn counter_state(state: &mut AppState) -> &mut CounterState {
//!     &mut state.counter
//! }
//!
//! fn counter_action(action: AppAction) -> Option<CounterAction> {
//!     match action {
//!         AppAction::Counter(action) => Some(action),
//!         AppAction::Rename(_) => None,
//!     }
//! }
//!
//! fn no_environment(_env: &()) -> &() {
//!     &()
//! }
//!
//! let scoped = scope_reducer(
//!     CounterReducer,
//!     counter_state,
//!     counter_action,
//!     AppAction::Counter,
//!     no_environment,
//! );
//!
//! let mut state = AppState::default();
//! let _ = scoped.reduce(&mut state, AppAction::Counter(CounterAction::Increment), &());
//! assert_eq!(state.counter.count, 1);
//!
//! // Actions addressed to other features are ignored
//! let _ = scoped.reduce(&mut state, AppAction::Rename("x".into()), &());
//! assert_eq!(state.counter.count, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::marker::PhantomData;

/// Scopes a child reducer into a parent feature.
///
/// # Arguments
///
/// - `reducer`: The child reducer
/// - `state`: Projects the parent state onto the child's slice
/// - `extract`: Returns the child action if the parent action addresses the child
/// - `embed`: Wraps a child action into the parent action type (used for effects)
/// - `environment`: Projects the parent environment onto the child's dependencies
///
/// Parent actions for which `extract` returns `None` leave the child's state
/// untouched and produce no effects.
pub const fn scope_reducer<S, SubS, A, SubA, E, SubE, R>(
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    environment: fn(&E) -> &SubE,
) -> ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
        environment,
        _phantom: PhantomData,
    }
}

/// A child reducer embedded into a parent feature.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
{
    reducer: R,
    state: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    environment: fn(&E) -> &SubE,
    _phantom: PhantomData<fn() -> (S, A, E)>,
}

impl<S, SubS, A, SubA, E, SubE, R> Clone for ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            state: self.state,
            extract: self.extract,
            embed: self.embed,
            environment: self.environment,
            _phantom: PhantomData,
        }
    }
}

impl<S, SubS, A, SubA, E, SubE, R> std::fmt::Debug for ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE> + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedReducer")
            .field("reducer", &self.reducer)
            .finish_non_exhaustive()
    }
}

impl<S, SubS, A, SubA, E, SubE, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, SubE, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = SubE>,
    A: 'static,
    SubA: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let effects = self
            .reducer
            .reduce((self.state)(state), action, (self.environment)(env));

        effects
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}
