//! Command-line adjustment grammar
//!
//! Tokens are an optional output selector followed by flags for that selector:
//!
//! ```text
//! xrandrctl --dimmer                     # every output
//! xrandrctl left --bluer DP-2 --brighter # per output (name or alias)
//! ```
//!
//! Flags before any selector apply to `all`. Dashes around a flag name are
//! ignored, but a token of only dashes is rejected.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::constants::flags;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("'{0}' is an invalid option")]
    UnknownFlag(String),

    #[error("'{0}' is not a valid option (options look like '--brighter')")]
    MalformedFlag(String),

    #[error("option '--{0}' needs a value")]
    MissingValue(&'static str),
}

/// Who a run of flags applies to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Target {
    All,
    Named(String),
}

impl Target {
    fn from_token(token: String) -> Self {
        if token == flags::ALL {
            Target::All
        } else {
            Target::Named(token)
        }
    }
}

/// Requested changes for one target
///
/// Opposing flags may both be set; they cancel out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjustment {
    pub redder: bool,
    pub bluer: bool,
    pub brighter: bool,
    pub dimmer: bool,
    /// Start from brightness 1 and gamma 1:1:1
    pub reset: bool,
    /// Replace the values with those recorded in another values file
    pub from_file: Option<PathBuf>,
}

impl Adjustment {
    /// +1 bluer, -1 redder, 0 for neither or both
    pub fn gamma_sign(&self) -> f64 {
        f64::from(i8::from(self.bluer) - i8::from(self.redder))
    }

    /// +1 brighter, -1 dimmer, 0 for neither or both
    pub fn brightness_sign(&self) -> f64 {
        f64::from(i8::from(self.brighter) - i8::from(self.dimmer))
    }

    fn set_flag(&mut self, name: &str) -> Result<(), ArgsError> {
        match name {
            flags::REDDER => self.redder = true,
            flags::BLUER => self.bluer = true,
            flags::BRIGHTER => self.brighter = true,
            flags::DIMMER => self.dimmer = true,
            flags::RESET => self.reset = true,
            other => return Err(ArgsError::UnknownFlag(other.to_string())),
        }
        Ok(())
    }
}

/// Which selector picked the adjustment for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selected {
    Alias,
    Name,
    All,
}

/// Adjustments keyed by target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectionSet {
    all: Option<Adjustment>,
    named: BTreeMap<String, Adjustment>,
}

impl DirectionSet {
    pub fn is_empty(&self) -> bool {
        self.all.is_none() && self.named.is_empty()
    }

    pub fn len(&self) -> usize {
        self.named.len() + usize::from(self.all.is_some())
    }

    /// Later entries for the same target replace earlier ones
    pub fn insert(&mut self, target: Target, adjustment: Adjustment) {
        match target {
            Target::All => self.all = Some(adjustment),
            Target::Named(name) => {
                self.named.insert(name, adjustment);
            }
        }
    }

    pub fn get(&self, target: &Target) -> Option<&Adjustment> {
        match target {
            Target::All => self.all.as_ref(),
            Target::Named(name) => self.named.get(name),
        }
    }

    /// Adjustment for a record addressed by `alias` or any of `names`
    ///
    /// Alias beats name, name beats `all`.
    pub fn select(&self, alias: Option<&str>, names: &[&str]) -> Option<(&Adjustment, Selected)> {
        if let Some(alias) = alias
            && let Some(adjustment) = self.named.get(alias)
        {
            return Some((adjustment, Selected::Alias));
        }
        if let Some(adjustment) = names.iter().find_map(|name| self.named.get(*name)) {
            return Some((adjustment, Selected::Name));
        }
        self.get(&Target::All).map(|adjustment| (adjustment, Selected::All))
    }
}

/// Parse command-line tokens into a direction set
///
/// Fails before anything is read or run if a flag is not recognized.
pub fn resolve<I>(tokens: I) -> Result<DirectionSet, ArgsError>
where
    I: IntoIterator<Item = String>,
{
    let mut set = DirectionSet::default();
    let mut tokens = tokens.into_iter().peekable();

    while let Some(first) = tokens.peek() {
        let target = if first.starts_with(flags::PREFIX) {
            Target::All
        } else {
            match tokens.next() {
                Some(token) => Target::from_token(token),
                None => break,
            }
        };

        let mut adjustment = Adjustment::default();
        while let Some(token) = tokens.next_if(|token| token.starts_with(flags::PREFIX)) {
            let name = token.trim_matches(flags::PREFIX);
            if name.is_empty() {
                return Err(ArgsError::MalformedFlag(token));
            }
            if name == flags::FROM_FILE {
                let path = tokens.next().ok_or(ArgsError::MissingValue(flags::FROM_FILE))?;
                adjustment.from_file = Some(PathBuf::from(path.trim()));
            } else {
                adjustment.set_flag(name)?;
            }
        }
        set.insert(target, adjustment);
    }

    Ok(set)
}
