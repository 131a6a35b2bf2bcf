#![forbid(unsafe_code)]

//! Reduced-motion preference.

use crate::config::ReducedMotionPolicy;

/// The user's motion preference as probed once at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionPreference {
    #[default]
    NoPreference,
    Reduce,
}

impl MotionPreference {
    /// Interpret a capability probe. A host without a preference query
    /// reports `None`, which counts as no preference.
    #[must_use]
    pub fn from_probe(reduce: Option<bool>) -> Self {
        match reduce {
            Some(true) => Self::Reduce,
            Some(false) | None => Self::NoPreference,
        }
    }

    #[must_use]
    pub const fn is_reduced(self) -> bool {
        matches!(self, Self::Reduce)
    }
}

/// Combines the probed preference with the configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MotionGate {
    preference: MotionPreference,
    policy: ReducedMotionPolicy,
}

impl MotionGate {
    pub(crate) const fn new(policy: ReducedMotionPolicy) -> Self {
        Self {
            preference: MotionPreference::NoPreference,
            policy,
        }
    }

    pub(crate) fn set_preference(&mut self, preference: MotionPreference) {
        self.preference = preference;
    }

    pub(crate) const fn preference(&self) -> MotionPreference {
        self.preference
    }

    /// Refreshes may only cleanse.
    pub(crate) const fn suppresses_decoration(&self) -> bool {
        self.preference.is_reduced() && matches!(self.policy, ReducedMotionPolicy::Inert)
    }

    /// Load decorates, then strips once.
    pub(crate) const fn strips_after_load(&self) -> bool {
        self.preference.is_reduced() && matches!(self.policy, ReducedMotionPolicy::StripOnce)
    }
}
