use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Environment variable holding the log filter, e.g. `SPLITZ_LOG=debug`
pub const LOG_ENV: &str = "SPLITZ_LOG";

/// Send log records to `path`. The terminal is in raw mode on the alternate
/// screen, so nothing may be written to stderr while the timer runs.
pub fn init_file_logger(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let result = Builder::from_env(Env::default().filter_or(LOG_ENV, "warn"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init();
    if result.is_ok() {
        log::info!("splitz {} starting", env!("CARGO_PKG_VERSION"));
    }
    Ok(())
}
