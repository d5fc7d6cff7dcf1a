//! # Lako Core Event System Errors
//!
//! Defines error types specific to the lifecycle event bus.
//!
//! [`EventSystemError`] covers listener failures surfaced by
//! [`EventManager::must_fire`](crate::event::EventManager::must_fire) and
//! custom event names that are empty or shadow a lifecycle event.
use crate::event::EventId;
use crate::kernel::error::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventSystemError {
    #[error("Listener {listener_id} for event '{event_name}' failed: {source}")]
    ListenerFailed {
        event_name: String,
        listener_id: EventId,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid event name '{event_name}': {reason}")]
    InvalidEventName {
        event_name: String,
        reason: String,
    },
}
