//! MatchUpStatus and its classifications (directing, exit, double exit).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a single match-up.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchUpStatus {
    #[default]
    ToBePlayed,
    AwaitingResult,
    Completed,
    Bye,
    Walkover,
    DoubleWalkover,
    Defaulted,
    DoubleDefault,
    Retired,
    Suspended,
    Incomplete,
    Cancelled,
    Abandoned,
}

impl MatchUpStatus {
    pub const ALL: [MatchUpStatus; 13] = [
        MatchUpStatus::ToBePlayed,
        MatchUpStatus::AwaitingResult,
        MatchUpStatus::Completed,
        MatchUpStatus::Bye,
        MatchUpStatus::Walkover,
        MatchUpStatus::DoubleWalkover,
        MatchUpStatus::Defaulted,
        MatchUpStatus::DoubleDefault,
        MatchUpStatus::Retired,
        MatchUpStatus::Suspended,
        MatchUpStatus::Incomplete,
        MatchUpStatus::Cancelled,
        MatchUpStatus::Abandoned,
    ];

    /// Statuses that carry a winning side and may advance an occupant.
    pub fn is_directing(self) -> bool {
        use MatchUpStatus::*;
        matches!(self, Completed | Walkover | Defaulted | Retired)
    }

    /// Statuses that must never carry a winning side.
    pub fn is_non_directing(self) -> bool {
        !self.is_directing() && self != MatchUpStatus::Bye
    }

    /// Walkover, default, retirement and their double forms.
    pub fn is_exit(self) -> bool {
        use MatchUpStatus::*;
        matches!(
            self,
            Walkover | Defaulted | Retired | DoubleWalkover | DoubleDefault
        )
    }

    pub fn is_double_exit(self) -> bool {
        matches!(
            self,
            MatchUpStatus::DoubleWalkover | MatchUpStatus::DoubleDefault
        )
    }

    /// Whether a score may be recorded alongside this status.
    pub fn allows_score(self) -> bool {
        use MatchUpStatus::*;
        !matches!(self, ToBePlayed | Bye | Walkover | DoubleWalkover | Cancelled)
    }

    /// A match-up in one of these statuses has reached its end.
    pub fn is_concluded(self) -> bool {
        self.is_directing() || self.is_double_exit() || self == MatchUpStatus::Bye
    }

    /// Marker carried into a downstream match-up by a participant leaving through this status.
    pub fn exit_marker(self) -> Option<MatchUpStatus> {
        use MatchUpStatus::*;
        match self {
            Walkover | DoubleWalkover | Retired => Some(Walkover),
            Defaulted | DoubleDefault => Some(Defaulted),
            _ => None,
        }
    }

    /// Status a match-up takes when both of its sides exited with `self`.
    pub fn doubled(self) -> MatchUpStatus {
        match self {
            MatchUpStatus::Defaulted | MatchUpStatus::DoubleDefault => MatchUpStatus::DoubleDefault,
            _ => MatchUpStatus::DoubleWalkover,
        }
    }

    pub fn as_str(self) -> &'static str {
        use MatchUpStatus::*;
        match self {
            ToBePlayed => "TO_BE_PLAYED",
            AwaitingResult => "AWAITING_RESULT",
            Completed => "COMPLETED",
            Bye => "BYE",
            Walkover => "WALKOVER",
            DoubleWalkover => "DOUBLE_WALKOVER",
            Defaulted => "DEFAULTED",
            DoubleDefault => "DOUBLE_DEFAULT",
            Retired => "RETIRED",
            Suspended => "SUSPENDED",
            Incomplete => "INCOMPLETE",
            Cancelled => "CANCELLED",
            Abandoned => "ABANDONED",
        }
    }
}

impl fmt::Display for MatchUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
