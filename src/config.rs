use std::env;
use std::str::FromStr;
use std::path::PathBuf;
use std::num::NonZeroUsize;

use anyhow::{bail, Context};
use log::LevelFilter;

pub const DEFAULT_PROMPT: &str = "forkline> ";
pub const DEFAULT_HISTORY: usize = 10;
pub const DEFAULT_MAX_ARGS: usize = 10;
pub const DEFAULT_MAX_LINE: usize = 100;

#[derive(Clone, Debug)]
pub struct Config {
    pub prompt: String,
    pub history_capacity: NonZeroUsize,
    /// Argument vector slots, the terminator included.
    pub max_args: usize,
    /// Longest accepted line in bytes, newline included.
    pub max_line: usize,
    pub log_level: LevelFilter,
    pub log_file: Option::<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            history_capacity: NonZeroUsize::new(DEFAULT_HISTORY).unwrap_or(NonZeroUsize::MIN),
            max_args: DEFAULT_MAX_ARGS,
            max_line: DEFAULT_MAX_LINE,
            log_level: LevelFilter::Off,
            log_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result::<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result::<Self>
    where
        F: Fn(&str) -> Option::<String>
    {
        #[inline]
        fn parse<T>(key: &str, value: Option::<String>) -> anyhow::Result::<Option::<T>>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static
        {
            value.map(|v| {
                v.trim().parse::<T>().with_context(|| format!("invalid {key}: {v:?}"))
            }).transpose()
        }

        let mut config = Self::default();

        if let Some(prompt) = lookup("FORKLINE_PROMPT") {
            config.prompt = prompt
        }
        if let Some(capacity) = parse::<usize>("FORKLINE_HISTORY", lookup("FORKLINE_HISTORY"))? {
            config.history_capacity = NonZeroUsize::new(capacity)
                .context("FORKLINE_HISTORY must be at least 1")?
        }
        if let Some(max_args) = parse::<usize>("FORKLINE_MAX_ARGS", lookup("FORKLINE_MAX_ARGS"))? {
            if max_args < 2 {
                bail!("FORKLINE_MAX_ARGS must be at least 2, got {max_args}")
            }
            config.max_args = max_args
        }
        if let Some(max_line) = parse::<usize>("FORKLINE_MAX_LINE", lookup("FORKLINE_MAX_LINE"))? {
            if max_line < 2 {
                bail!("FORKLINE_MAX_LINE must be at least 2, got {max_line}")
            }
            config.max_line = max_line
        }
        if let Some(level) = parse::<LevelFilter>("FORKLINE_LOG", lookup("FORKLINE_LOG"))? {
            config.log_level = level
        }
        config.log_file = lookup("FORKLINE_LOG_FILE")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}
