use crate::config::{ConfigError, MatchConfig};
use crate::detect::DuplicateDetector;
use crate::dto::{RawRecord, Record};
use crate::normalize::Normalizer;
use crate::partition::partition;
use crate::report::{aggregate, Report};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

///
/// Normalize, partition, detect per group, aggregate.
///
/// Groups share no mutable state, so detection runs on the rayon pool and
/// the per-group results are merged by key afterwards.
///
pub struct Pipeline {
    config: MatchConfig,
    normalizer: Normalizer,
}

impl Pipeline {
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let normalizer = Normalizer::new(&config.normalizer);
        Ok(Pipeline { config, normalizer })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn normalize_records(&self, rows: Vec<RawRecord>) -> Vec<Record> {
        let start = Instant::now();
        let records: Vec<Record> = rows
            .into_par_iter()
            .map(|row| Record::new(row, &self.normalizer))
            .collect();
        info!(
            records = records.len(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "normalized addresses"
        );
        records
    }

    pub fn run<'a>(&self, records: &'a [Record]) -> Report<'a> {
        let start = Instant::now();
        let groups = partition(records);
        info!(groups = groups.len(), records = records.len(), "partitioned records");
        let detector = DuplicateDetector::new(&self.config);
        let per_group: Vec<_> = groups
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(group, members)| {
                let clusters = detector.detect(&members);
                debug!(group, members = members.len(), clusters = clusters.len(), "scanned group");
                (group.to_string(), clusters)
            })
            .collect();
        let report = aggregate(per_group);
        info!(
            clusters = report.summary().clusters,
            total_duplicates = report.total_duplicates,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "deduplication completed"
        );
        report
    }
}
