//! Per-operation context: resolved policies, the injected notifier and the score validator.

use crate::logic::score_validation::{ScoreValidator, SetsScoreValidator};
use crate::notify::{Notice, Notifier, Owner};
use crate::policy::PolicySet;

static SETS_VALIDATOR: SetsScoreValidator = SetsScoreValidator;

pub struct Context<'a> {
    pub policies: PolicySet,
    /// Identifiers stamped on every notice.
    pub owner: Owner,
    notifier: &'a mut dyn Notifier,
    score_validator: &'a dyn ScoreValidator,
}

impl<'a> Context<'a> {
    /// Default policies and the set-count score validator.
    pub fn new(notifier: &'a mut dyn Notifier) -> Self {
        Self {
            policies: PolicySet::default(),
            owner: Owner::default(),
            notifier,
            score_validator: &SETS_VALIDATOR,
        }
    }

    pub fn with_policies(mut self, policies: PolicySet) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_score_validator(mut self, score_validator: &'a dyn ScoreValidator) -> Self {
        self.score_validator = score_validator;
        self
    }

    pub fn score_validator(&self) -> &dyn ScoreValidator {
        self.score_validator
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        log::debug!("notice {:?}", notice.topic());
        self.notifier.notify(notice);
    }
}
