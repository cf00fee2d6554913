pub mod candle;
pub mod snapshot;
pub mod trend;

pub use candle::*;
pub use snapshot::compute_snapshot;
pub use trend::*;
