// Search-and-click automation
// Run state machine, background poll loop, template store and settings.

pub mod channels;
pub mod engine;
pub mod region;
pub mod settings;
pub mod template_store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export the main types and functions for easy access
pub use channels::{EventReceiver, EventSender, create_event_channel};
pub use engine::{STOP_SLICE, SearchEngine};
pub use region::{Point, Region};
pub use settings::{RunSnapshot, SearchAreaRecord, Settings, SettingsRecord};
pub use template_store::TemplateStore;
pub use types::{RunState, StatusEvent, WaitPhase};
