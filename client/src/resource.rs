//! Generic container for an asynchronously fetched collection.
//!
//! Every fetch moves the container through the same lifecycle:
//!
//! ```text
//!            Pending                  Fulfilled / Rejected
//! idle ──────────────────▶ loading ─────────────────────────▶ settled
//!   (error cleared)                  (items, selected or error)
//! ```
//!
//! The stall catalog and the order ledger are both a [`Resource`] with a
//! different entity type; neither re-implements the transitions.

use crate::api::ApiError;
use hawker_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer};
use std::future::Future;
use std::marker::PhantomData;

/// State of one fetched collection
#[derive(Clone, Debug, PartialEq)]
pub struct Resource<T> {
    items: Vec<T>,
    selected: Option<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> Resource<T> {
    /// Creates an idle, empty container
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The fetched entities, in server order (newest first after a create)
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The currently selected entity
    #[must_use]
    pub const fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    /// Whether a fetch is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed fetch, until cleared
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Applies one lifecycle transition
    pub fn apply(&mut self, action: ResourceAction<T>) {
        match action {
            ResourceAction::Pending => {
                self.loading = true;
                self.error = None;
            },
            ResourceAction::Fulfilled(fetched) => {
                self.loading = false;
                self.error = None;
                match fetched {
                    Fetched::Many(items) => self.items = items,
                    Fetched::One(item) => self.selected = Some(item),
                    Fetched::Created(item) => self.items.insert(0, item),
                }
            },
            ResourceAction::Rejected { message } => {
                self.loading = false;
                self.error = Some(message);
            },
            ResourceAction::SetSelected(selected) => self.selected = selected,
            ResourceAction::ClearError => self.error = None,
        }
    }
}

/// Payload of a successful fetch
#[derive(Clone, Debug, PartialEq)]
pub enum Fetched<T> {
    /// A full listing; replaces the sequence
    Many(Vec<T>),
    /// A single entity; becomes the selection
    One(T),
    /// A newly created entity; prepended to the sequence
    Created(T),
}

/// Transitions of a [`Resource`]
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceAction<T> {
    /// A fetch started
    Pending,
    /// A fetch succeeded
    Fulfilled(Fetched<T>),
    /// A fetch failed
    Rejected {
        /// Message to display
        message: String,
    },
    /// Replace the selection (`None` deselects)
    SetSelected(Option<T>),
    /// Dismiss the current error
    ClearError,
}

impl<T> ResourceAction<T> {
    /// Whether this action settles a fetch
    #[must_use]
    pub const fn is_settlement(&self) -> bool {
        matches!(self, Self::Fulfilled(_) | Self::Rejected { .. })
    }
}

/// [`Resource::apply`] as a reducer, for use with `ReducerTest` and scoping
#[derive(Debug)]
pub struct ResourceReducer<T>(PhantomData<fn() -> T>);

impl<T> ResourceReducer<T> {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ResourceReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ResourceReducer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Reducer for ResourceReducer<T> {
    type State = Resource<T>;
    type Action = ResourceAction<T>;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        state.apply(action);
        SmallVec::new()
    }
}

/// Describes a fetch whose outcome is fed back as a settlement action
///
/// The returned effect always produces exactly one action: `Fulfilled` with
/// the payload, or `Rejected` carrying the server's message or `fallback`.
/// Failures never escape the effect.
pub fn settle<T, A, F>(
    request: F,
    fallback: &'static str,
    lift: fn(ResourceAction<T>) -> A,
) -> Effect<A>
where
    F: Future<Output = Result<Fetched<T>, ApiError>> + Send + 'static,
    T: Send + 'static,
    A: Send + 'static,
{
    async_effect! {
        let action = match request.await {
            Ok(fetched) => ResourceAction::Fulfilled(fetched),
            Err(error) => {
                tracing::warn!(error = %error, operation = fallback, "Fetch rejected");
                ResourceAction::Rejected {
                    message: error.message_or(fallback),
                }
            },
        };
        Some(lift(action))
    }
}
