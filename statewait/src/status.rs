//! Status vocabularies
//!
//! Every product reports job progress with its own strings. A [`Classify`]
//! implementation maps one observed status onto a [`Phase`] so the waiter
//! stays independent of any single product's enum.

use std::collections::BTreeSet;

/// Where an observed status places the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Non-terminal, keep polling.
    Pending,
    /// Terminal success.
    Target,
    /// Terminal failure reported by the server.
    Failed,
    /// A status outside the caller's vocabulary.
    Unknown,
    /// The response carried no status at all.
    Missing,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Target | Phase::Failed)
    }
}

/// Maps raw statuses to phases.
pub trait Classify: Send + Sync {
    fn classify(&self, status: &str) -> Phase;

    /// Whether a missing object is the goal of the wait (delete flows).
    fn awaits_absence(&self) -> bool {
        false
    }

    /// The statuses the waiter is prepared to see, for error messages.
    fn expected(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Vocabulary built from explicit pending, target and failure sets.
///
/// Matching is exact. When a status appears in several sets, target wins
/// over failure, and failure over pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSet {
    pending: BTreeSet<String>,
    target: BTreeSet<String>,
    failed: BTreeSet<String>,
    absence_is_target: bool,
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `PENDING` until `SUCCESS`, with `FAIL` as the failure status.
    pub fn job() -> Self {
        Self::new()
            .pending(["PENDING"])
            .target(["SUCCESS"])
            .failed(["FAIL"])
    }

    pub fn pending<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending.extend(statuses.into_iter().map(Into::into));
        self
    }

    pub fn target<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target.extend(statuses.into_iter().map(Into::into));
        self
    }

    pub fn failed<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failed.extend(statuses.into_iter().map(Into::into));
        self
    }

    /// Treat "object not found" as reaching the target.
    pub fn absence_is_target(mut self) -> Self {
        self.absence_is_target = true;
        self
    }

    pub fn pending_statuses(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn target_statuses(&self) -> impl Iterator<Item = &str> {
        self.target.iter().map(String::as_str)
    }

    pub fn failed_statuses(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(String::as_str)
    }
}

impl Classify for StatusSet {
    fn classify(&self, status: &str) -> Phase {
        if status.is_empty() {
            Phase::Missing
        } else if self.target.contains(status) {
            Phase::Target
        } else if self.failed.contains(status) {
            Phase::Failed
        } else if self.pending.contains(status) {
            Phase::Pending
        } else {
            Phase::Unknown
        }
    }

    fn awaits_absence(&self) -> bool {
        self.absence_is_target
    }

    fn expected(&self) -> Vec<String> {
        self.pending
            .iter()
            .chain(&self.target)
            .chain(&self.failed)
            .cloned()
            .collect()
    }
}
