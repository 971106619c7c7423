//! # Logger
//!
//! All crates in the workspace log through the `log` facade. Executables call
//! [`logger_init`] once with their `[log]` parameters. Records go to stdout
//! with coloured level tags and to the session's log file as plain text.
//!
//! Per-cycle control values are logged at `Trace`. The global level is
//! normally `debug`, with single modules raised to `trace` through
//! [`LogParams::modules`] when a run needs them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::{collections::BTreeMap, fmt, str::FromStr};

use colored::Colorize;
use log::{info, Level};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Logging parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogParams {
    /// Most verbose level logged, at least `info`
    pub level: String,

    /// Level overrides keyed by module path, e.g. `lf_lib::line_ctrl`
    pub modules: BTreeMap<String, String>,

    /// Colour the level tags on stdout. The log file is never coloured.
    pub colour: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Unknown log level \"{0}\"")]
    UnknownLevel(String),

    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(#[from] std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(#[from] log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LogParams {
    fn default() -> Self {
        Self {
            level: "debug".into(),
            modules: BTreeMap::new(),
            colour: true
        }
    }
}

impl LogParams {
    /// The global level filter.
    ///
    /// Warnings and errors on their own are not enough to follow a run, so
    /// anything quieter than `info` is rejected.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerInitError> {
        let level = parse_level(&self.level)?;

        if level < Level::Info {
            return Err(LoggerInitError::InvalidMinLogLevel(level))
        }

        Ok(level)
    }

    /// The per-module level overrides.
    pub fn module_filters(&self)
        -> Result<Vec<(String, LevelFilter)>, LoggerInitError>
    {
        self.modules
            .iter()
            .map(|(module, level)| {
                parse_level(level).map(|filter| (module.clone(), filter))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    params: &LogParams,
    session: &Session
) -> Result<(), LoggerInitError> {
    let level = params.level_filter()?;
    let modules = params.module_filters()?;

    let colour = params.colour;
    let stdout = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message,
                    colour
                )
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message,
                    false
                )
            ))
        })
        .chain(fern::log_file(&session.log_file_path)?);

    let mut dispatch = fern::Dispatch::new().level(level);
    for (module, filter) in modules.iter() {
        dispatch = dispatch.level_for(module.clone(), *filter);
    }

    dispatch
        .chain(stdout)
        .chain(file)
        .apply()?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", level);
    for (module, filter) in modules.iter() {
        info!("    {}: {:?}", module, filter);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn parse_level(name: &str) -> Result<LevelFilter, LoggerInitError> {
    LevelFilter::from_str(name)
        .map_err(|_| LoggerInitError::UnknownLevel(name.into()))
}

/// Format a single record. Debug and trace records carry their module.
fn format_line(
    elapsed_s: f64,
    level: Level,
    target: &str,
    message: &dyn fmt::Display,
    colour: bool
) -> String {
    let tag = level_tag(level, colour);

    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, tag, target, message)
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, tag, message)
    }
}

/// Three letter tag of a level
fn level_tag(level: Level, colour: bool) -> String {
    let tag = match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info  => "INF",
        Level::Warn  => "WRN",
        Level::Error => "ERR"
    };

    if !colour {
        return tag.to_string()
    }

    let coloured = match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info  => tag.normal(),
        Level::Warn  => tag.yellow(),
        Level::Error => tag.red().bold()
    };

    coloured.to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line(1.5, Level::Info, "lf_lib::calib", &"White value: 85.0", false),
            "[  1.500000 INF] White value: 85.0"
        );
        assert_eq!(
            format_line(12.25, Level::Debug, "lf_lib::ctrl_loop", &"Tracking", false),
            "[ 12.250000 DBG] lf_lib::ctrl_loop: Tracking"
        );
        assert_eq!(level_tag(Level::Error, false), "ERR");
    }

    #[test]
    fn test_level_params() {
        let mut params = LogParams::default();
        assert_eq!(params.level_filter().unwrap(), LevelFilter::Debug);

        params.level = "TRACE".into();
        assert_eq!(params.level_filter().unwrap(), LevelFilter::Trace);

        params.level = "warn".into();
        assert!(matches!(
            params.level_filter(),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));

        params.level = "loud".into();
        assert!(matches!(
            params.level_filter(),
            Err(LoggerInitError::UnknownLevel(_))
        ));
    }

    #[test]
    fn test_module_filters() {
        let mut params = LogParams::default();
        params.modules.insert("lf_lib::line_ctrl".into(), "trace".into());
        params.modules.insert("lf_lib::calib".into(), "info".into());

        // Ordered by module path
        assert_eq!(
            params.module_filters().unwrap(),
            vec![
                ("lf_lib::calib".to_string(), LevelFilter::Info),
                ("lf_lib::line_ctrl".to_string(), LevelFilter::Trace),
            ]
        );

        params.modules.insert("lf_lib::eqpt".into(), "chatty".into());
        assert!(params.module_filters().is_err());
    }
}
