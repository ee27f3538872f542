pub mod logging;
pub use logging::{FileLogger, StdoutLogger, init_file_logger, init_stdout_logger};

mod time;
pub use time::*;

// Re-export log crate so downstream crates can use base::log::*
pub use log;
