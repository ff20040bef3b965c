//! Brightness/gamma adjustment
//!
//! Computes the next values file from the current one and the requested
//! directions. The loaded document is never modified; a new document is built so
//! nothing is committed until xrandr has applied it.

use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::constants::reset;
use crate::directions::{Adjustment, DirectionSet};
use crate::state::{Gamma, Levels, Presets, StateDocument, StepOverrides};

#[derive(Debug, Error)]
pub enum AdjustError {
    #[error("no values for {outputs} found in {}", .path.display())]
    PresetOutputMissing { outputs: String, path: PathBuf },

    #[error("could not load preset values from {}", .path.display())]
    PresetLoad {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Increments applied by one directional flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steps {
    pub brightness: f64,
    pub gamma: Gamma,
}

impl Default for Steps {
    fn default() -> Self {
        Self {
            brightness: crate::constants::steps::BRIGHTNESS,
            gamma: Gamma(crate::constants::steps::GAMMA),
        }
    }
}

impl Steps {
    /// Steps for one record: its own overrides, else these defaults
    pub fn effective(&self, overrides: &StepOverrides) -> Steps {
        Steps {
            brightness: overrides.brightness.unwrap_or(self.brightness),
            gamma: overrides.gamma.unwrap_or(self.gamma),
        }
    }
}

/// Values written by `--reset`
pub const RESET_LEVELS: Levels = Levels {
    gamma: Gamma(reset::GAMMA),
    brightness: reset::BRIGHTNESS,
};

pub struct Engine<'a> {
    defaults: Steps,
    presets: &'a mut Presets,
}

impl<'a> Engine<'a> {
    pub fn new(defaults: Steps, presets: &'a mut Presets) -> Self {
        Self { defaults, presets }
    }

    /// Build the adjusted document
    ///
    /// Records no direction applies to are copied unchanged. Preset files are
    /// only read for records that ask for them.
    pub fn adjust(
        &mut self,
        document: &StateDocument,
        directions: &DirectionSet,
    ) -> Result<StateDocument, AdjustError> {
        match document {
            StateDocument::PerOutput(records) => records
                .iter()
                .map(|record| {
                    let names = [record.name.as_str()];
                    let Some((adjustment, selected)) =
                        directions.select(record.alias.as_deref(), &names)
                    else {
                        return Ok(record.clone());
                    };
                    debug!(output = %record.name, by = ?selected, ?adjustment, "Adjusting output");
                    let steps = self.defaults.effective(&record.step_overrides());
                    let levels = self.next_levels(record.levels(), steps, adjustment, &names)?;
                    Ok(record.with_levels(levels))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(StateDocument::PerOutput),
            StateDocument::Shared(shared) => {
                let names = shared.output_names();
                let Some((adjustment, selected)) = directions.select(shared.alias.as_deref(), &names)
                else {
                    return Ok(document.clone());
                };
                debug!(outputs = ?names, by = ?selected, ?adjustment, "Adjusting shared outputs");
                let steps = self.defaults.effective(&shared.step_overrides());
                let levels = self.next_levels(shared.levels(), steps, adjustment, &names)?;
                Ok(StateDocument::Shared(shared.with_levels(levels)))
            }
        }
    }

    fn next_levels(
        &mut self,
        current: Levels,
        steps: Steps,
        adjustment: &Adjustment,
        outputs: &[&str],
    ) -> Result<Levels, AdjustError> {
        if let Some(path) = &adjustment.from_file {
            return self.presets.levels_for(path, outputs);
        }
        let start = if adjustment.reset { RESET_LEVELS } else { current };
        Ok(apply(start, steps, adjustment))
    }
}

/// Move `levels` one step in each requested direction
///
/// No clamping: values drift as far as the user pushes them.
pub fn apply(levels: Levels, steps: Steps, adjustment: &Adjustment) -> Levels {
    let mut next = levels;
    let gamma_sign = adjustment.gamma_sign();
    if gamma_sign != 0.0 {
        next.gamma = levels.gamma.offset(steps.gamma, gamma_sign);
    }
    let brightness_sign = adjustment.brightness_sign();
    if brightness_sign != 0.0 {
        next.brightness = levels.brightness + steps.brightness * brightness_sign;
    }
    next
}
