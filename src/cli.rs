use clap::Parser;
use clap::error::ErrorKind;
use std::ffi::OsString;
use std::path::PathBuf;

/// Token clap would otherwise consume as its end-of-options marker
const SEPARATOR: &str = "--";

/// Step xrandr brightness and gamma relative to the last run
#[derive(Parser, Debug)]
#[command(name = "xrandrctl", version, about)]
#[command(after_help = "ADJUSTMENTS:\n  \
    [OUTPUT|ALIAS|all] --brighter --dimmer --redder --bluer --reset --from-file <PATH>\n\n\
    Flags before any output apply to every output, e.g.\n  \
    xrandrctl --dimmer\n  \
    xrandrctl left --bluer HDMI-1 --brighter")]
pub struct Cli {
    /// Values file to read and update
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Append-only log file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Display tool to run
    #[arg(long, value_name = "PROGRAM")]
    pub program: Option<String>,

    /// Kill the display tool after this many milliseconds
    #[arg(long, value_name = "MILLIS")]
    pub timeout_ms: Option<u64>,

    /// Outputs and adjustment flags
    #[arg(
        value_name = "ADJUSTMENTS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub adjustments: Vec<String>,
}

impl Cli {
    /// Parse `args`, passing a bare `--` through to the adjustments
    ///
    /// A `--` before the first adjustment is kept so the adjustment grammar can
    /// reject it like any other dash-only token.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut cli = Self::try_parse_from(args.iter().cloned())?;

        let raw = args
            .iter()
            .skip(1)
            .filter(|arg| arg.to_str() == Some(SEPARATOR))
            .count();
        let kept = cli.adjustments.iter().filter(|arg| *arg == SEPARATOR).count();
        if raw > kept {
            cli.adjustments.insert(0, SEPARATOR.to_string());
        }
        Ok(cli)
    }
}

/// Whether a parse error is really `--help` or `--version` output
pub fn is_informational(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}
