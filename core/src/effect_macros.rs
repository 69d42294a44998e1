//! Declarative macro for effect construction
//!
//! Wraps an async block into an `Effect::Future`, the shape used for network
//! fetches whose settlement is fed back into the reducer.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use hawker_core::async_effect;
///
/// async_effect! {
///     let action = match api.get_all().await {
///         Ok(stalls) => ResourceAction::Fulfilled(Fetched::Many(stalls)),
///         Err(error) => ResourceAction::Rejected { message: error.message_or(FALLBACK) },
///     };
///     Some(StallsAction::Resource(action))
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}
