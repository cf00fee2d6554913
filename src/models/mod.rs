//! Shared data models spanning the engine layers.

pub mod candle;
pub mod indicators;
pub mod signal;
pub mod status;

pub use candle::{Candle, HistoryBuffer};
pub use indicators::IndicatorSnapshot;
pub use signal::{AlertEvent, EntryConditions, Evaluation, NoSignal, NoSignalReason};
pub use status::{CycleStats, DetectorStatus, SchedulerStatus};
