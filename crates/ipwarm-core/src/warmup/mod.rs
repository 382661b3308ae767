//! Warm-up Module - Day schedule, quota split and the engine tying them together

mod engine;
mod routing;
mod schedule;
mod settings;

pub use engine::{WarmupEngine, WarmupResult};
pub use routing::QuotaSplit;
pub use schedule::{advance, calendar_days_between, DayProgress, DayTransition, WarmupPhase};
pub use settings::WarmupSettings;
