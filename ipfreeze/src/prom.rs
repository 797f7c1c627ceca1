use lazy_static::lazy_static;
use prometheus::{exponential_buckets, Histogram, HistogramOpts, IntCounter, Opts, Registry};

lazy_static! {
    pub static ref FREEZE_HIST: Histogram = Histogram::with_opts(
        HistogramOpts::new("freeze_time", "Complete time to freeze a tree",)
            .namespace("ipfreeze")
            .buckets(exponential_buckets(0.0001, 2.0, 20).unwrap()),
    )
    .unwrap();
    pub static ref THAW_HIST: Histogram = Histogram::with_opts(
        HistogramOpts::new("thaw_time", "Complete time to thaw a tree",)
            .namespace("ipfreeze")
            .buckets(exponential_buckets(0.0001, 2.0, 20).unwrap()),
    )
    .unwrap();
    pub static ref FROZEN_RECORDS: IntCounter = IntCounter::with_opts(
        Opts::new("frozen_records", "Number of network records written").namespace("ipfreeze"),
    )
    .unwrap();
    pub static ref THAWED_RECORDS: IntCounter = IntCounter::with_opts(
        Opts::new("thawed_records", "Number of network records read").namespace("ipfreeze"),
    )
    .unwrap();
}

/// registers the freeze and thaw metrics with a prometheus registry
pub fn register_metrics(registry: &Registry) -> anyhow::Result<()> {
    registry.register(Box::new(FREEZE_HIST.clone()))?;
    registry.register(Box::new(THAW_HIST.clone()))?;
    registry.register(Box::new(FROZEN_RECORDS.clone()))?;
    registry.register(Box::new(THAWED_RECORDS.clone()))?;
    Ok(())
}
