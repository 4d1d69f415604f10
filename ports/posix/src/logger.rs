//! `log` backend writing diagnostics to stderr.

use std::io::{self, Write};
use std::thread;

use log::{LevelFilter, Log, Metadata, Record};

use crate::SimResult;

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let current = thread::current();
        let mut err = io::stderr().lock();
        let _ = writeln!(
            err,
            "{:<5} [{}] {}: {}",
            record.level(),
            current.name().unwrap_or("?"),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Installs the stderr logger with `level` as the maximum level.
pub fn init(level: LevelFilter) -> SimResult<()> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
