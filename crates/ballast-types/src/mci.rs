use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on the main chain index a stable lookup may see.
///
/// `Unbounded` is only meant for bootstrap, when the caller has no stable
/// point yet. Once real state exists, lookups should be bounded by the last
/// stable MCI the caller trusts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MciBound {
    #[default]
    Unbounded,
    AtMost(u64),
}

impl MciBound {
    /// Returns `true` if a unit at `mci` falls within the bound.
    pub fn admits(&self, mci: u64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::AtMost(max) => mci <= *max,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl From<Option<u64>> for MciBound {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Unbounded, Self::AtMost)
    }
}

impl fmt::Display for MciBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::AtMost(mci) => write!(f, "<= {mci}"),
        }
    }
}
