use chrono::{Local, Utc};
use clap::Parser;
use tracing::{info, warn};

use percentile_rollup::args::RollupArgs;
use percentile_rollup::config::{RollupSettings, apply_config, load_config};
use percentile_rollup::domain::TimeRange;
use percentile_rollup::error::AppResult;
use percentile_rollup::pipeline::Orchestrator;
use percentile_rollup::store::ElasticsearchStore;

pub(crate) fn run() -> AppResult<()> {
    let args = RollupArgs::parse();

    crate::logger::init_logging(args.verbose, args.no_color);

    let config = load_config(args.config.as_deref())?;
    let settings = apply_config(&args, config.as_ref(), Local::now().date_naive())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(settings))
}

async fn run_async(settings: RollupSettings) -> AppResult<()> {
    let store = ElasticsearchStore::new(&settings.store)?;
    let range = TimeRange::trailing(Utc::now(), settings.lookback)?;
    info!(
        event_index = %settings.pipeline.event_index,
        percentile_index = %settings.pipeline.percentile_index,
        hosts = settings.store.hosts.len(),
        dry_run = settings.pipeline.dry_run,
        %range,
        "percentile rollup configured"
    );

    let report = Orchestrator::new(&store, &settings.pipeline)
        .run(&range)
        .await;
    for (kind, count) in report.failures_by_kind() {
        warn!(kind, count, "units skipped this run");
    }
    Ok(())
}
