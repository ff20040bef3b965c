//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Step sizes used when a record carries no override of its own
pub mod steps {
    /// Brightness added by `--brighter` and removed by `--dimmer`
    pub const BRIGHTNESS: f64 = 0.1;

    /// Per-channel gamma added by `--bluer` and removed by `--redder` (R, G, B)
    pub const GAMMA: [f64; 3] = [0.0, 0.025, 0.05];
}

/// Values written by `--reset` before any directional change is applied
pub mod reset {
    pub const BRIGHTNESS: f64 = 1.0;
    pub const GAMMA: [f64; 3] = [1.0, 1.0, 1.0];
}

/// External display tool invocation
pub mod xrandr {
    /// Program spawned to apply the values
    pub const PROGRAM: &str = "xrandr";

    /// How long xrandr may run before it is killed
    pub const TIMEOUT_MS: u64 = 1000;

    pub const OUTPUT_ARG: &str = "--output";
    pub const GAMMA_ARG: &str = "--gamma";
    pub const BRIGHTNESS_ARG: &str = "--brightness";

    /// Separator between the R, G and B gamma components
    pub const GAMMA_SEPARATOR: char = ':';
}

/// Command-line token grammar
pub mod flags {
    /// Leading character of a flag token (usually doubled: `--brighter`)
    pub const PREFIX: char = '-';

    /// Selector that addresses every output
    pub const ALL: &str = "all";

    pub const REDDER: &str = "redder";
    pub const BLUER: &str = "bluer";
    pub const BRIGHTER: &str = "brighter";
    pub const DIMMER: &str = "dimmer";
    pub const RESET: &str = "reset";
    pub const FROM_FILE: &str = "from-file";
}

/// File locations and environment overrides
pub mod config {
    /// Directory created under the XDG config/state dirs
    pub const APP_DIR: &str = "xrandrctl";

    /// Persisted values file name
    pub const STATE_FILENAME: &str = "current_values.json";

    /// Log file name
    pub const LOG_FILENAME: &str = "xrandrctl.log";

    pub const ENV_STATE_FILE: &str = "XRANDRCTL_STATE_FILE";
    pub const ENV_LOG_FILE: &str = "XRANDRCTL_LOG_FILE";
    pub const ENV_PROGRAM: &str = "XRANDRCTL_PROGRAM";
    pub const ENV_TIMEOUT_MS: &str = "XRANDRCTL_TIMEOUT_MS";
    pub const ENV_BRIGHTNESS_STEP: &str = "XRANDRCTL_BRIGHTNESS_STEP";
    pub const ENV_GAMMA_STEP: &str = "XRANDRCTL_GAMMA_STEP";

    /// Log level variable shared with the rest of the tooling
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
}
