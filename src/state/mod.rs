//! Persisted brightness/gamma values
//!
//! - **record**: the JSON shapes of the values file
//! - **store**: loading and atomically replacing the file
//! - **presets**: other values files referenced with `--from-file`

pub mod presets;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use presets::Presets;
pub use record::{Gamma, Levels, StateDocument, StepOverrides};
pub use store::StateStore;
