pub mod automation;
pub mod controller;
pub mod error;
pub mod platform;
pub mod template_matching;

pub use automation::{Point, Region, RunState, Settings, SettingsRecord, StatusEvent};
pub use controller::{Controller, Indicator, StatusView};
pub use error::{ClickerError, ClickerResult};
pub use template_matching::{Matcher, Template, TemplateId};
