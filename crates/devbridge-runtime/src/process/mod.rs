//! Process supervision: spawning, draining, and shutdown of external commands.

mod registry;
mod shutdown;
mod stream;
mod supervisor;

pub use registry::ProcessRegistry;
pub use shutdown::{pid_exists, shutdown_child};
pub use stream::{DrainContext, DrainSummary, LineWatch, drain_lines, spawn_drain};
pub use supervisor::{DEFAULT_STOP_GRACE, ProcessSupervisor, StreamHandles};
