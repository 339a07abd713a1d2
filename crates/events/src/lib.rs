//! Domain events, commands and the in-process event bus.
//!
//! Deal operations emit events describing what happened (offer accepted,
//! CPCV signed, commission received). They are published after the owning
//! opportunity document has been written, for collaborators such as
//! dashboards or notification senders.

pub mod bus;
pub mod command;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use command::Command;
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
