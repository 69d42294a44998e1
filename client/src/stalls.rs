//! Stall catalog: the list of vendor stalls and the selected stall.

use crate::api::StallsApi;
use crate::resource::{Fetched, Resource, ResourceAction, settle};
use crate::types::{Stall, StallId};
use hawker_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Shown when listing stalls fails without a server message
pub const FETCH_STALLS_FAILED: &str = "Failed to fetch stalls";
/// Shown when the proximity query fails without a server message
pub const FETCH_NEARBY_STALLS_FAILED: &str = "Failed to fetch nearby stalls";
/// Shown when fetching one stall fails without a server message
pub const FETCH_STALL_FAILED: &str = "Failed to fetch stall";

/// State of the stall catalog
pub type StallsState = Resource<Stall>;

/// Actions of the stall catalog
#[derive(Clone, Debug, PartialEq)]
pub enum StallsAction {
    /// Fetch every stall, replacing the list
    FetchAll,
    /// Fetch stalls near a coordinate, replacing the list
    FetchNearby {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
    },
    /// Fetch one stall into the selection
    FetchById {
        /// Stall to fetch
        id: StallId,
    },
    /// Lifecycle transition of the catalog
    Resource(ResourceAction<Stall>),
}

impl StallsAction {
    /// Select a stall, or deselect with `None`
    #[must_use]
    pub const fn set_selected(stall: Option<Stall>) -> Self {
        Self::Resource(ResourceAction::SetSelected(stall))
    }

    /// Dismiss the current error
    #[must_use]
    pub const fn clear_error() -> Self {
        Self::Resource(ResourceAction::ClearError)
    }
}

/// Dependencies of the stall catalog
#[derive(Clone)]
pub struct StallsEnvironment {
    /// Stall endpoints
    pub api: Arc<dyn StallsApi>,
}

impl StallsEnvironment {
    /// Creates an environment around a collaborator
    #[must_use]
    pub fn new(api: Arc<dyn StallsApi>) -> Self {
        Self { api }
    }
}

impl std::fmt::Debug for StallsEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StallsEnvironment").finish_non_exhaustive()
    }
}

/// Reducer of the stall catalog
#[derive(Clone, Debug, Default)]
pub struct StallsReducer;

impl StallsReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for StallsReducer {
    type State = StallsState;
    type Action = StallsAction;
    type Environment = StallsEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let api = Arc::clone(&env.api);
        let effect = match action {
            StallsAction::Resource(transition) => {
                state.apply(transition);
                return SmallVec::new();
            },
            StallsAction::FetchAll => settle(
                async move { api.get_all().await.map(Fetched::Many) },
                FETCH_STALLS_FAILED,
                StallsAction::Resource,
            ),
            StallsAction::FetchNearby {
                latitude,
                longitude,
            } => settle(
                async move { api.get_nearby(latitude, longitude).await.map(Fetched::Many) },
                FETCH_NEARBY_STALLS_FAILED,
                StallsAction::Resource,
            ),
            StallsAction::FetchById { id } => settle(
                async move { api.get_by_id(id).await.map(Fetched::One) },
                FETCH_STALL_FAILED,
                StallsAction::Resource,
            ),
        };

        state.apply(ResourceAction::Pending);
        smallvec![effect]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::mocks::StubStallsApi;
    use hawker_testing::{ReducerTest, assertions, helpers::settle_effects};

    fn stall(id: u64, name: &str) -> Stall {
        Stall {
            id: StallId::new(id),
            name: name.to_string(),
            location: "Maxwell Food Centre".to_string(),
            cuisine_type: "Chinese".to_string(),
            rating: 4.0,
            is_open: true,
            image_url: None,
            distance: None,
        }
    }

    fn env(api: StubStallsApi) -> StallsEnvironment {
        StallsEnvironment::new(Arc::new(api))
    }

    #[test]
    fn fetch_all_marks_loading_and_schedules_request() {
        ReducerTest::new(StallsReducer::new())
            .with_env(env(StubStallsApi::new()))
            .given_state(StallsState::new())
            .when_action(StallsAction::FetchAll)
            .then_state(|state| {
                assert!(state.is_loading());
                assert_eq!(state.error(), None);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn selection_is_synchronous() {
        let selected = stall(2, "Hainanese Chicken Rice");

        ReducerTest::new(StallsReducer::new())
            .with_env(env(StubStallsApi::new()))
            .given_state(StallsState::new())
            .when_action(StallsAction::set_selected(Some(selected.clone())))
            .then_state(move |state| {
                assert_eq!(state.selected(), Some(&selected));
                assert!(!state.is_loading());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn nearby_request_carries_coordinates() {
        let api = StubStallsApi::new().with_nearby(vec![Stall {
            distance: Some(0.4),
            ..stall(1, "Tian Tian")
        }]);
        let env = env(api.clone());
        let mut state = StallsState::new();

        let effects = StallsReducer::new().reduce(
            &mut state,
            StallsAction::FetchNearby {
                latitude: 1.2801,
                longitude: 103.8448,
            },
            &env,
        );
        let actions = settle_effects(effects).await;

        assert_eq!(api.nearby_queries(), vec![(1.2801, 103.8448)]);
        assert!(matches!(
            actions.as_slice(),
            [StallsAction::Resource(ResourceAction::Fulfilled(Fetched::Many(stalls)))]
                if stalls[0].distance == Some(0.4)
        ));
    }

    #[tokio::test]
    async fn failed_lookup_uses_fallback_message() {
        let api = StubStallsApi::new().failing(ApiError::Server {
            status: 500,
            detail: None,
        });
        let env = env(api);
        let mut state = StallsState::new();

        let effects = StallsReducer::new().reduce(
            &mut state,
            StallsAction::FetchById {
                id: StallId::new(5),
            },
            &env,
        );
        for action in settle_effects(effects).await {
            let _ = StallsReducer::new().reduce(&mut state, action, &env);
        }

        assert!(!state.is_loading());
        assert_eq!(state.error(), Some(FETCH_STALL_FAILED));
        assert_eq!(state.selected(), None);
    }
}
