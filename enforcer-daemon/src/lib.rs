//! Long-running enforcement loop: one detection cycle per tick until ctrl-c.

mod error;
mod logging;
mod runtime;

pub use error::DaemonError;
pub use logging::init_tracing;
pub use runtime::{run, start_blocking};
