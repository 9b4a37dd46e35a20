use std::io::Write;
use std::str::FromStr;

use log::LevelFilter;
use tern_common::config::TelemetryConfig;

use crate::error::{TelemetryError, TelemetryResult};

/// Installs the global logger.
///
/// `RUST_LOG` takes precedence over the configured level.
/// Calling this more than once returns an error.
pub fn init_logger(config: &TelemetryConfig) -> TelemetryResult<()> {
    let level = parse_level(&config.log_level)?;
    let logger = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.as_str()),
    )
    .format(move |buf, record| {
        let level = record.level();
        let target = record.target();
        let style = buf.default_level_style(level);
        let timestamp = buf.timestamp();
        let args = record.args();
        writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
    })
    .build();
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(())
}

fn parse_level(level: &str) -> TelemetryResult<LevelFilter> {
    LevelFilter::from_str(level)
        .map_err(|_| TelemetryError::invalid(format!("unknown log level: {level}")))
}
