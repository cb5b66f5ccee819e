use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

pub const ENV_FONTS: &str = "REPORTFLOW_FONTS";
pub const ENV_MEASURER: &str = "REPORTFLOW_MEASURER";
pub const ENV_DEBOUNCE_MS: &str = "REPORTFLOW_DEBOUNCE_MS";

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Which height oracle drives pagination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeasurerKind {
    /// Line breaking against real font advance widths.
    #[default]
    Metrics,
    /// Characters-per-page estimate.
    Heuristic,
}

impl FromStr for MeasurerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metrics" => Ok(MeasurerKind::Metrics),
            "heuristic" => Ok(MeasurerKind::Heuristic),
            other => Err(Error::Config(format!(
                "unknown measurer '{other}' (expected metrics or heuristic)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Searched before the platform font directories.
    pub font_dirs: Vec<PathBuf>,
    pub measurer: MeasurerKind,
    pub debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            font_dirs: Vec::new(),
            measurer: MeasurerKind::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl Config {
    /// Defaults overridden by the `REPORTFLOW_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`. Invalid values
    /// are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(val) = lookup(ENV_FONTS) {
            let sep = if cfg!(windows) { ';' } else { ':' };
            config.font_dirs = val
                .split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Some(val) = lookup(ENV_MEASURER) {
            match val.parse() {
                Ok(kind) => config.measurer = kind,
                Err(e) => log::warn!("Ignoring {ENV_MEASURER}: {e}"),
            }
        }
        if let Some(val) = lookup(ENV_DEBOUNCE_MS) {
            match val.trim().parse::<u64>() {
                Ok(ms) => config.debounce = Duration::from_millis(ms),
                Err(e) => log::warn!("Ignoring {ENV_DEBOUNCE_MS}={val}: {e}"),
            }
        }
        config
    }
}
