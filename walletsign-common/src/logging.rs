//! Logging utilities.
//!
//! Log records go either to the systemd journal or to stderr, selected by [`LogTarget`].

use log::{LevelFilter, Log};
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use systemd_journal_logger::{JournalLog, connected_to_journal};

/// The identifier of journal entries.
const SYSLOG_IDENTIFIER: &str = "walletsign";

/// Logging setup error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The journal was requested, but can not be used.
    #[error("Unable to log to the systemd journal: {0}")]
    Journal(std::io::Error),

    /// Logger initialization error.
    #[error("Logger initialization error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// The destination of log records.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum LogTarget {
    /// The journal if the process is connected to it, stderr otherwise.
    #[default]
    Auto,

    /// The systemd journal.
    Journal,

    /// Standard error.
    Stderr,
}

impl LogTarget {
    /// Returns whether records for this target go to the journal.
    ///
    /// For [`LogTarget::Auto`] this depends on whether stderr is connected to the journal.
    pub fn uses_journal(&self) -> bool {
        match self {
            Self::Auto => connected_to_journal(),
            Self::Journal => true,
            Self::Stderr => false,
        }
    }
}

/// Creates a logger for the systemd journal.
fn journal_logger() -> Result<Box<dyn Log>, Error> {
    let log = JournalLog::new()
        .map_err(Error::Journal)?
        .with_syslog_identifier(SYSLOG_IDENTIFIER.to_string())
        .with_extra_fields(vec![("VERSION", env!("CARGO_PKG_VERSION"))]);
    Ok(Box::new(log))
}

/// Sets up logging to `target` for records up to `max_level`.
///
/// With [`LogTarget::Auto`] the terminal logger is used if the journal can not be opened.
///
/// # Errors
///
/// Returns an error if
/// * [`LogTarget::Journal`] is requested but the journal can not be opened,
/// * or a logger has already been set.
pub fn setup_logging(target: LogTarget, max_level: impl Into<LevelFilter>) -> Result<(), Error> {
    let max_level = max_level.into();
    if target.uses_journal() {
        match journal_logger() {
            Ok(log) => {
                log::set_boxed_logger(log)?;
                log::set_max_level(max_level);
                return Ok(());
            }
            Err(error) if target == LogTarget::Journal => return Err(error),
            Err(_) => {}
        }
    }

    TermLogger::init(
        max_level,
        Default::default(),
        // simplelog needs to be explicitly instructed to always use stderr
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    Ok(())
}
