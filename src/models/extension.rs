//! Typed extensions attached to structures, positions and match-ups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed set of extension kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    RoundTarget,
    Tally,
    DisableAutoCalc,
}

/// Round robin results for one group position.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParticipantTally {
    pub wins: u32,
    pub losses: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    /// Order within the group given the results so far.
    pub provisional_order: u32,
    /// Final order; only present once every group match-up is concluded.
    pub group_order: Option<u32>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extension {
    /// Main-draw round a qualifying structure feeds.
    RoundTarget(u32),
    Tally(ParticipantTally),
    /// TEAM match-up whose result is entered manually rather than aggregated.
    DisableAutoCalc,
}

impl Extension {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            Extension::RoundTarget(_) => ExtensionKind::RoundTarget,
            Extension::Tally(_) => ExtensionKind::Tally,
            Extension::DisableAutoCalc => ExtensionKind::DisableAutoCalc,
        }
    }
}

/// Per-entity extension map, at most one value per kind.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(BTreeMap<ExtensionKind, Extension>);

impl Extensions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, extension: Extension) {
        self.0.insert(extension.kind(), extension);
    }

    pub fn remove(&mut self, kind: ExtensionKind) -> Option<Extension> {
        self.0.remove(&kind)
    }

    pub fn round_target(&self) -> Option<u32> {
        match self.0.get(&ExtensionKind::RoundTarget) {
            Some(Extension::RoundTarget(round)) => Some(*round),
            _ => None,
        }
    }

    pub fn set_round_target(&mut self, round_number: u32) {
        self.insert(Extension::RoundTarget(round_number));
    }

    pub fn tally(&self) -> Option<&ParticipantTally> {
        match self.0.get(&ExtensionKind::Tally) {
            Some(Extension::Tally(tally)) => Some(tally),
            _ => None,
        }
    }

    pub fn set_tally(&mut self, tally: ParticipantTally) {
        self.insert(Extension::Tally(tally));
    }

    pub fn disable_auto_calc(&self) -> bool {
        self.0.contains_key(&ExtensionKind::DisableAutoCalc)
    }

    pub fn set_disable_auto_calc(&mut self, disabled: bool) {
        if disabled {
            self.insert(Extension::DisableAutoCalc);
        } else {
            self.remove(ExtensionKind::DisableAutoCalc);
        }
    }
}
