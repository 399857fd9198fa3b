use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CHORUS_LOG";
pub const LOG_FILE: &str = "chorus.log";
const DEFAULT_FILTER: &str = "chorus=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// The terminal is in raw mode while the player runs, so events go to
/// `<dir>/chorus.log`. Falls back to stderr when the file cannot be opened.
pub fn init_file(dir: &Path) {
    let file = fs::create_dir_all(dir).and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))
    });
    match file {
        Ok(f) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(f))
                .try_init();
        }
        Err(e) => {
            init_stderr();
            warn!(dir = %dir.display(), error = %e, "could not open log file");
        }
    }
}

pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(io::stderr)
        .try_init();
}
