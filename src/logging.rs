use std::fs::OpenOptions;

use anyhow::Context;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};

use crate::config::Config;

/// Installs the global logger. Logging is off unless `FORKLINE_LOG` asks for
/// it, so diagnostics meant for the user never interleave with log records.
pub fn init(config: &Config) -> anyhow::Result::<()> {
    if config.log_level == LevelFilter::Off {
        return Ok(())
    }

    let log_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Debug)
        .set_target_level(LevelFilter::Off)
        .build();

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("could not open log file {}", path.display()))?;
            WriteLogger::init(config.log_level, log_config, file)?
        }
        None => TermLogger::init(
            config.log_level,
            log_config,
            TerminalMode::Stderr,
            ColorChoice::Auto
        )?
    }

    Ok(())
}
