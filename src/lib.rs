// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod format;
pub mod history;
pub mod info;
pub mod keymap;
pub mod layout;
pub mod logging;
pub mod run;
pub mod run_file;
pub mod runtime;
pub mod session;

pub use run::{Run, RunStatus, Segment};
pub use session::Session;
