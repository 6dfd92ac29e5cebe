use futures_util::StreamExt;
use futures_util::stream;
use tracing::{info, warn};

use super::{
    PipelineConfig, RunReport, discover_services, partition, sample_bucket, upsert_record,
};
use crate::domain::{PercentileRecord, TimeRange};
use crate::error::PipelineError;
use crate::store::DocumentStore;

/// Drives discovery, partitioning, sampling and upsert for every service.
///
/// Failures are contained at the narrowest scope: a failed discovery yields
/// no services, a failed histogram skips one service, and a failed sample
/// or upsert skips one bucket. `run` itself never fails.
pub struct Orchestrator<'run, S: ?Sized> {
    store: &'run S,
    config: &'run PipelineConfig,
}

impl<'run, S> Orchestrator<'run, S>
where
    S: DocumentStore + ?Sized,
{
    #[must_use]
    pub const fn new(store: &'run S, config: &'run PipelineConfig) -> Self {
        Self { store, config }
    }

    pub async fn run(&self, range: &TimeRange) -> RunReport {
        let mut report = RunReport::default();

        let services = match discover_services(self.store, self.config, range).await {
            Ok(services) => services,
            Err(err) => {
                note_failure(&mut report, err);
                Vec::new()
            }
        };
        report.services = services.len();
        info!(services = services.len(), %range, "starting percentile rollup");

        let concurrency = self.config.concurrency.max(1);
        let outcomes: Vec<RunReport> = stream::iter(services.iter())
            .map(|service| self.run_service(range, service))
            .buffered(concurrency)
            .collect()
            .await;
        for outcome in outcomes {
            report.absorb(outcome);
        }

        info!(
            services = report.services,
            buckets = report.buckets,
            written = report.written,
            already_present = report.already_present,
            dry_run = report.dry_run,
            failures = report.diagnostics.len(),
            "percentile rollup finished"
        );
        report
    }

    async fn run_service(&self, range: &TimeRange, service: &str) -> RunReport {
        let mut report = RunReport::default();

        let buckets = match partition(self.store, self.config, range, service).await {
            Ok(buckets) => buckets,
            Err(err) => {
                note_failure(&mut report, err);
                return report;
            }
        };
        report.buckets = buckets.len();

        for bucket in buckets {
            let values = match sample_bucket(self.store, self.config, service, &bucket).await {
                Ok(values) => values,
                Err(err) => {
                    note_failure(&mut report, err);
                    continue;
                }
            };
            let record = PercentileRecord {
                service: service.to_owned(),
                bucket,
                values,
            };
            match upsert_record(self.store, self.config, &record).await {
                Ok(outcome) => report.record_outcome(outcome),
                Err(err) => note_failure(&mut report, err),
            }
        }
        report
    }
}

fn note_failure(report: &mut RunReport, error: PipelineError) {
    warn!(kind = error.kind(), error = %error, "rollup unit skipped");
    report.record_failure(error);
}
