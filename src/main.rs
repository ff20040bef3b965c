#![forbid(unsafe_code)]

mod app;
mod cli;
mod config;
mod constants;
mod directions;
mod dispatch;
mod engine;
mod logging;
mod state;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;
use tracing::error;

use cli::Cli;
use config::Settings;
use logging::LogSession;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            let code = if cli::is_informational(&err) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
            let _ = err.print();
            return code;
        }
    };

    let log_session = LogSession::start(&config::log_file(&cli));
    let settings = Settings::load(&cli);

    match app::run(&settings, cli.adjustments).await {
        Ok(()) => {
            log_session.finish(true);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let report = err.report();
            error!(error = %report, "Run aborted");
            log_session.finish(false);
            eprintln!("xrandrctl: {report}");
            ExitCode::FAILURE
        }
    }
}
