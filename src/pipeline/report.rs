use std::collections::BTreeMap;

use super::UpsertOutcome;
use crate::error::PipelineError;

/// What one run did. Carries no behaviour; the binary logs it and tests
/// inspect it.
#[derive(Debug, Default)]
pub struct RunReport {
    pub services: usize,
    pub buckets: usize,
    pub written: usize,
    pub already_present: usize,
    pub dry_run: usize,
    pub diagnostics: Vec<PipelineError>,
}

impl RunReport {
    pub(crate) fn record_outcome(&mut self, outcome: UpsertOutcome) {
        let slot = match outcome {
            UpsertOutcome::Written => &mut self.written,
            UpsertOutcome::AlreadyPresent => &mut self.already_present,
            UpsertOutcome::DryRun => &mut self.dry_run,
        };
        *slot = slot.saturating_add(1);
    }

    pub(crate) fn record_failure(&mut self, error: PipelineError) {
        self.diagnostics.push(error);
    }

    pub(crate) fn absorb(&mut self, other: RunReport) {
        self.buckets = self.buckets.saturating_add(other.buckets);
        self.written = self.written.saturating_add(other.written);
        self.already_present = self.already_present.saturating_add(other.already_present);
        self.dry_run = self.dry_run.saturating_add(other.dry_run);
        self.diagnostics.extend(other.diagnostics);
    }

    #[must_use]
    pub fn failures_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for error in &self.diagnostics {
            let count = counts.entry(error.kind()).or_insert(0usize);
            *count = count.saturating_add(1);
        }
        counts
    }
}
