//! One run: resolve arguments, adjust, apply with xrandr, persist

use std::error::Error as StdError;
use thiserror::Error;
use tracing::info;

use crate::config::Settings;
use crate::directions::{self, ArgsError};
use crate::dispatch::{self, DispatchError, Dispatcher};
use crate::engine::{AdjustError, Engine};
use crate::state::{Presets, StateStore};

/// Every way a run can fail; all of them exit with status 1
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid arguments")]
    Input(#[from] ArgsError),

    #[error("could not load current values")]
    StateLoad(#[source] anyhow::Error),

    #[error("could not compute new values")]
    Adjust(#[from] AdjustError),

    #[error("values were not applied, current values left unchanged")]
    Dispatch(#[from] DispatchError),

    #[error("values were applied but could not be saved")]
    StateSave(#[source] anyhow::Error),
}

impl RunError {
    /// Message with every cause, outermost first
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Execute one adjustment run
///
/// The values file is only rewritten after xrandr finished within the timeout.
pub async fn run(settings: &Settings, tokens: Vec<String>) -> Result<(), RunError> {
    info!(?tokens, "Starting run");
    let directions = directions::resolve(tokens)?;
    if directions.is_empty() {
        info!("No adjustments requested, reasserting current values");
    } else {
        info!(targets = directions.len(), "Resolved adjustments");
    }

    let store = StateStore::new(&settings.state_file);
    let current = store.load().map_err(RunError::StateLoad)?;
    info!(path = %store.path().display(), outputs = current.output_values().len(), "Loaded current values");

    let mut presets = Presets::default();
    let adjusted = Engine::new(settings.steps, &mut presets).adjust(&current, &directions)?;

    let args = dispatch::build_args(&adjusted);
    info!(program = %settings.program, ?args, "Applying values");
    Dispatcher::new(settings.program.as_str(), settings.timeout)
        .dispatch(&args)
        .await?;

    store.save(&adjusted).map_err(RunError::StateSave)?;
    info!(values = ?adjusted, "Current values");
    Ok(())
}
