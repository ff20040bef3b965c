//! Process settings
//!
//! Built-in defaults, then environment overrides, then command-line options.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::constants::config::*;
use crate::constants::xrandr;
use crate::engine::Steps;
use crate::state::Gamma;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub state_file: PathBuf,
    pub program: String,
    pub timeout: Duration,
    /// Steps used by records without their own overrides
    pub steps: Steps,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            program: xrandr::PROGRAM.to_string(),
            timeout: Duration::from_millis(xrandr::TIMEOUT_MS),
            steps: Steps::default(),
        }
    }
}

impl Settings {
    pub fn load(cli: &Cli) -> Self {
        let mut settings = Self::default();
        settings.apply_overrides(|var| env::var(var).ok());
        settings.apply_cli(cli);
        settings.validate();
        info!(
            state_file = %settings.state_file.display(),
            program = %settings.program,
            timeout = ?settings.timeout,
            brightness_step = settings.steps.brightness,
            gamma_step = %settings.steps.gamma,
            "Loaded settings"
        );
        settings
    }

    /// Apply overrides from `lookup` (the process environment outside tests)
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_STATE_FILE).filter(|s| !s.trim().is_empty()) {
            self.state_file = PathBuf::from(path.trim());
        }
        if let Some(program) = lookup(ENV_PROGRAM).filter(|s| !s.trim().is_empty()) {
            self.program = program.trim().to_string();
        }
        if let Some(millis) = parse_var::<u64>(&lookup, ENV_TIMEOUT_MS) {
            self.timeout = Duration::from_millis(millis);
        }
        if let Some(step) = parse_var::<f64>(&lookup, ENV_BRIGHTNESS_STEP) {
            self.steps.brightness = step;
        }
        if let Some(step) = parse_var::<Gamma>(&lookup, ENV_GAMMA_STEP) {
            self.steps.gamma = step;
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.state_file {
            self.state_file = path.clone();
        }
        if let Some(program) = &cli.program {
            self.program = program.clone();
        }
        if let Some(millis) = cli.timeout_ms {
            self.timeout = Duration::from_millis(millis);
        }
    }

    /// Replace unusable values with defaults
    fn validate(&mut self) {
        if self.timeout.is_zero() {
            warn!(using = xrandr::TIMEOUT_MS, "timeout of 0 ms would kill xrandr immediately, using default");
            self.timeout = Duration::from_millis(xrandr::TIMEOUT_MS);
        }
        let defaults = Steps::default();
        if !self.steps.brightness.is_finite() {
            warn!(brightness_step = self.steps.brightness, using = defaults.brightness, "brightness step is not finite, using default");
            self.steps.brightness = defaults.brightness;
        }
        if !self.steps.gamma.0.iter().all(|c| c.is_finite()) {
            warn!(gamma_step = %self.steps.gamma, using = %defaults.gamma, "gamma step is not finite, using default");
            self.steps.gamma = defaults.gamma;
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(var)?;
    raw.trim()
        .parse::<T>()
        .inspect_err(|e| error!(var = %var, value = %raw, error = %e, "failed to parse env var, ignoring"))
        .ok()
}

fn default_state_file() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push(STATE_FILENAME);
    path
}

fn default_log_file() -> PathBuf {
    let mut path = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push(LOG_FILENAME);
    path
}

/// Log file location, resolved before logging starts so settings can be logged
pub fn log_file(cli: &Cli) -> PathBuf {
    cli.log_file
        .clone()
        .or_else(|| env::var_os(ENV_LOG_FILE).filter(|s| !s.is_empty()).map(PathBuf::from))
        .unwrap_or_else(default_log_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.program, "xrandr");
        assert_eq!(settings.timeout, Duration::from_secs(1));
        assert_eq!(settings.steps.brightness, 0.1);
        assert_eq!(settings.steps.gamma, Gamma::new(0.0, 0.025, 0.05));
        assert!(settings.state_file.ends_with("xrandrctl/current_values.json"));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_overrides(lookup_from(&[
            (ENV_STATE_FILE, "/tmp/values.json"),
            (ENV_PROGRAM, "fake-xrandr"),
            (ENV_TIMEOUT_MS, "250"),
            (ENV_BRIGHTNESS_STEP, "0.05"),
            (ENV_GAMMA_STEP, "0.1:0.1:0.1"),
        ]));

        assert_eq!(settings.state_file, PathBuf::from("/tmp/values.json"));
        assert_eq!(settings.program, "fake-xrandr");
        assert_eq!(settings.timeout, Duration::from_millis(250));
        assert_eq!(settings.steps.brightness, 0.05);
        assert_eq!(settings.steps.gamma, Gamma::new(0.1, 0.1, 0.1));
    }

    #[test]
    fn test_malformed_env_values_ignored() {
        let mut settings = Settings::default();
        settings.apply_overrides(lookup_from(&[
            (ENV_TIMEOUT_MS, "soon"),
            (ENV_BRIGHTNESS_STEP, "lots"),
            (ENV_GAMMA_STEP, "1:2"),
            (ENV_PROGRAM, "   "),
        ]));

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_cli_beats_env() {
        let mut settings = Settings::default();
        settings.apply_overrides(lookup_from(&[(ENV_TIMEOUT_MS, "250"), (ENV_PROGRAM, "env-xrandr")]));
        let cli = Cli::try_parse_from(["xrandrctl", "--timeout-ms", "500", "--dimmer"]).unwrap();
        settings.apply_cli(&cli);

        assert_eq!(settings.timeout, Duration::from_millis(500));
        assert_eq!(settings.program, "env-xrandr");
    }

    #[test]
    fn test_validate_replaces_unusable_values() {
        let mut settings = Settings {
            timeout: Duration::ZERO,
            steps: Steps {
                brightness: f64::NAN,
                gamma: Gamma::new(0.0, f64::INFINITY, 0.0),
            },
            ..Settings::default()
        };
        settings.validate();

        assert_eq!(settings.timeout, Duration::from_millis(xrandr::TIMEOUT_MS));
        assert_eq!(settings.steps, Steps::default());
    }

    #[test]
    fn test_log_file_from_cli() {
        let cli = Cli::try_parse_from(["xrandrctl", "--log-file", "/tmp/x.log"]).unwrap();
        assert_eq!(log_file(&cli), PathBuf::from("/tmp/x.log"));
    }
}
