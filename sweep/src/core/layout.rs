//! Result tree layout shared by the sweep driver and the report stage.
//!
//! ```text
//! <root>/{singleTransponder|multipleTransponders}/C<skew>/demands<N>/<artifact files>
//! ```
//!
//! The directory names encode an [`ArtifactKey`]. Both stages build and parse
//! paths only through [`LayoutPath`] so the encoding lives in one place.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const SINGLE_DIR: &str = "singleTransponder";
pub const MULTIPLE_DIR: &str = "multipleTransponders";
const SKEW_PREFIX: &str = "C";
const DEMANDS_PREFIX: &str = "demands";

/// Whether the planner must use one transponder type for every demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransponderPolicy {
    Single,
    Multiple,
}

impl TransponderPolicy {
    pub const ALL: [TransponderPolicy; 2] = [TransponderPolicy::Single, TransponderPolicy::Multiple];

    pub fn from_single_flag(single: bool) -> Self {
        if single { Self::Single } else { Self::Multiple }
    }

    pub fn is_single(self) -> bool {
        self == Self::Single
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Single => SINGLE_DIR,
            Self::Multiple => MULTIPLE_DIR,
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        match name {
            SINGLE_DIR => Some(Self::Single),
            MULTIPLE_DIR => Some(Self::Multiple),
            _ => None,
        }
    }
}

impl fmt::Display for TransponderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Typed identity of one leaf directory of the result tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub policy: TransponderPolicy,
    /// Percentage of traffic generated by core nodes.
    pub skew: f64,
    pub demands: u64,
}

/// Render a float the way existing result trees name it: always with a
/// fractional part (`50` -> `50.0`).
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}

pub fn skew_segment(skew: f64) -> String {
    format!("{SKEW_PREFIX}{}", format_float(skew))
}

pub fn parse_skew_segment(name: &str) -> Option<f64> {
    name.strip_prefix(SKEW_PREFIX)?
        .parse::<f64>()
        .ok()
        .filter(|skew| skew.is_finite())
}

pub fn demands_segment(demands: u64) -> String {
    format!("{DEMANDS_PREFIX}{demands}")
}

pub fn parse_demands_segment(name: &str) -> Option<u64> {
    name.strip_prefix(DEMANDS_PREFIX)?.parse().ok()
}

/// Path builder rooted at the sweep output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPath {
    root: PathBuf,
}

impl LayoutPath {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy_dir(&self, policy: TransponderPolicy) -> PathBuf {
        self.root.join(policy.dir_name())
    }

    pub fn skew_dir(&self, policy: TransponderPolicy, skew: f64) -> PathBuf {
        self.policy_dir(policy).join(skew_segment(skew))
    }

    pub fn demands_dir(&self, key: &ArtifactKey) -> PathBuf {
        self.skew_dir(key.policy, key.skew)
            .join(demands_segment(key.demands))
    }

    /// Recover the key of a leaf directory below this root.
    ///
    /// Returns `None` when the path is not exactly three recognised segments
    /// below the root.
    pub fn key_for(&self, leaf: &Path) -> Option<ArtifactKey> {
        let relative = leaf.strip_prefix(&self.root).ok()?;
        let mut segments = relative.iter().map(|s| s.to_str());
        let policy = TransponderPolicy::from_dir_name(segments.next()??)?;
        let skew = parse_skew_segment(segments.next()??)?;
        let demands = parse_demands_segment(segments.next()??)?;
        if segments.next().is_some() {
            return None;
        }
        Some(ArtifactKey {
            policy,
            skew,
            demands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(policy: TransponderPolicy, skew: f64, demands: u64) -> ArtifactKey {
        ArtifactKey {
            policy,
            skew,
            demands,
        }
    }

    #[test]
    fn skew_segment_keeps_fractional_part() {
        assert_eq!(skew_segment(50.0), "C50.0");
        assert_eq!(skew_segment(33.3), "C33.3");
        assert_eq!(skew_segment(0.0), "C0.0");
    }

    #[test]
    fn demands_dir_nests_policy_skew_and_demands() {
        let layout = LayoutPath::new("/out");
        let dir = layout.demands_dir(&key(TransponderPolicy::Multiple, 25.0, 300));
        assert_eq!(
            dir,
            PathBuf::from("/out/multipleTransponders/C25.0/demands300")
        );
    }

    #[test]
    fn key_for_recovers_built_path() {
        let layout = LayoutPath::new("/out");
        let original = key(TransponderPolicy::Single, 12.5, 40);
        let recovered = layout.key_for(&layout.demands_dir(&original));
        assert_eq!(recovered, Some(original));
    }

    #[test]
    fn key_for_rejects_foreign_paths() {
        let layout = LayoutPath::new("/out");
        assert_eq!(layout.key_for(Path::new("/elsewhere/singleTransponder/C1.0/demands1")), None);
        assert_eq!(layout.key_for(Path::new("/out/plots/C1.0/demands1")), None);
        assert_eq!(layout.key_for(Path::new("/out/singleTransponder/C1.0")), None);
        assert_eq!(
            layout.key_for(Path::new("/out/singleTransponder/C1.0/demands1/extra")),
            None
        );
        assert_eq!(
            layout.key_for(Path::new("/out/singleTransponder/Cx/demands1")),
            None
        );
    }

    #[test]
    fn segment_parsers_accept_integer_skews() {
        assert_eq!(parse_skew_segment("C50"), Some(50.0));
        assert_eq!(parse_demands_segment("demands7"), Some(7));
        assert_eq!(parse_demands_segment("demand7"), None);
    }
}
