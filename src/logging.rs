//! Logging to the systemd user journal (`journalctl --user -t taskboard -f`).

use std::sync::atomic::{AtomicBool, Ordering};

use log::Log;

/// Whether debug logging is active, shared between the logger filter and the config toggle.
static DEBUG_LOGGING: AtomicBool = AtomicBool::new(false);

pub fn set_debug_logging(enabled: bool) {
    DEBUG_LOGGING.store(enabled, Ordering::Relaxed);
}

pub fn debug_logging() -> bool {
    DEBUG_LOGGING.load(Ordering::Relaxed)
}

/// Our own targets at info/debug (per the toggle), everything else at warn.
struct FilteredJournal {
    inner: systemd_journal_logger::JournalLog,
}

impl Log for FilteredJournal {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if is_own_target(metadata.target()) {
            metadata.level() <= own_max_level()
        } else {
            metadata.level() <= log::LevelFilter::Warn
        }
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

fn is_own_target(target: &str) -> bool {
    target.starts_with("taskboard") || target.starts_with("taskctl")
}

fn own_max_level() -> log::LevelFilter {
    if debug_logging() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// Install the journal logger under `identifier`. Without a journal the
/// process keeps running unlogged.
pub fn init(identifier: &str, debug: bool) {
    set_debug_logging(debug);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier(identifier.to_string()),
        Err(e) => {
            eprintln!("{}: journal unavailable, logging disabled: {}", identifier, e);
            return;
        }
    };

    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so our debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}
