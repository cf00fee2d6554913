//! Core application primitives (orchestrator, scheduler, HTTP surface)

pub mod http;
pub mod messages;
pub mod orchestrator;
pub mod scheduler;
pub mod shutdown;

pub use http::{create_router, start_server, AppState};
pub use orchestrator::{CycleOrchestrator, CycleOutcome};
pub use scheduler::CycleScheduler;
pub use shutdown::{ShutdownReason, ShutdownSignal};
