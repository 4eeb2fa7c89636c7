pub mod event_bus;
pub mod event_types;

pub use event_bus::{EventBus, EventBusStats, EventHandler, EventNotifier, ListenerId, NoopNotifier};
pub use event_types::UiEvent;
