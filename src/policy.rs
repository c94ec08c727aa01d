//! Resolved scoring and progression policies. The host resolves precedence; operations read these as given.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Directing statuses need a participant on both sides.
    pub require_participants_for_scoring: bool,
    /// Run the score validator before committing a score.
    pub validate_scores: bool,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            require_participants_for_scoring: true,
            validate_scores: true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionPolicy {
    /// Callers may request that a winning-side change cascade through downstream match-ups.
    pub allow_winning_side_change_cascade: bool,
    /// Losers of exit statuses carry the exit into loser structures.
    pub propagate_exit_status: bool,
    /// Qualifying structures must be fully complete before any qualifier is placed.
    pub require_completed_qualifying_structures: bool,
    /// Upper bound on propagation steps; derived from the draw when absent.
    pub max_propagation_steps: Option<usize>,
}

impl Default for ProgressionPolicy {
    fn default() -> Self {
        Self {
            allow_winning_side_change_cascade: true,
            propagate_exit_status: false,
            require_completed_qualifying_structures: false,
            max_propagation_steps: None,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySet {
    pub scoring: ScoringPolicy,
    pub progression: ProgressionPolicy,
}
