//! Per-lake feature extraction and batch runs
//!
//! A lake runs its primary snapshot first. The historical snapshots and the
//! glacier analysis only need that result and run side by side; lakes in a
//! batch share nothing but the configuration and the data sources.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use glofscan_core::model::{FeatureRecord, LakePoint, SnapshotMode};
use glofscan_core::source::{DataSources, RetryPolicy};
use glofscan_core::{Error, Result};

use crate::features::{aggregate, EXPANSION_SPANS};
use crate::glacier::{glacier_proximity, ProximityParams};
use crate::lake::{expansion_rate, snapshot, SnapshotParams};

/// One lake to process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LakeRequest {
    pub point: LakePoint,
    pub year: i32,
    #[serde(default)]
    pub mode: SnapshotMode,
}

impl LakeRequest {
    pub fn new(lon: f64, lat: f64, year: i32) -> Self {
        Self {
            point: LakePoint::new(lon, lat),
            year,
            mode: SnapshotMode::Baseline,
        }
    }

    pub fn with_mode(mut self, mode: SnapshotMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Everything a pipeline run can be tuned with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub snapshot: SnapshotParams,
    pub proximity: ProximityParams,
    /// Years back to the historical snapshots
    pub expansion_spans: Vec<i32>,
    /// Lakes processed at once; 0 uses every core
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            snapshot: SnapshotParams::default(),
            proximity: ProximityParams::default(),
            expansion_spans: EXPANSION_SPANS.to_vec(),
            max_concurrency: 0,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        for (i, span) in self.expansion_spans.iter().enumerate() {
            if !EXPANSION_SPANS.contains(span) {
                return Err(Error::invalid_parameter(
                    "expansion_spans",
                    span,
                    "supported spans are 5 and 10 years",
                ));
            }
            if self.expansion_spans[..i].contains(span) {
                return Err(Error::invalid_parameter(
                    "expansion_spans",
                    span,
                    "span listed twice",
                ));
            }
        }
        let water = &self.snapshot.water;
        if !water.threshold.is_finite() {
            return Err(Error::invalid_parameter(
                "threshold",
                water.threshold,
                "must be finite",
            ));
        }
        Ok(())
    }
}

/// A lake that could not be processed
#[derive(Debug, Clone)]
pub struct LakeFailure {
    pub request: LakeRequest,
    pub error: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Records in request order
    pub records: Vec<FeatureRecord>,
    pub failures: Vec<LakeFailure>,
}

impl BatchReport {
    pub fn complete(&self) -> usize {
        self.records.iter().filter(|r| r.is_complete()).count()
    }

    pub fn partial(&self) -> usize {
        self.records.len() - self.complete()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Extracts feature records for lakes from a set of data sources.
#[derive(Debug, Clone)]
pub struct LakePipeline {
    sources: DataSources,
    config: PipelineConfig,
}

impl LakePipeline {
    /// The pipeline applies `config.retry` to every source call.
    pub fn new(sources: DataSources, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let sources = sources.with_retry(config.retry.clone());
        Ok(Self { sources, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Feature record for one lake.
    ///
    /// Missing imagery, water or glaciers leave fields empty; only source
    /// failures and contract violations are errors.
    pub fn process(&self, request: &LakeRequest) -> Result<FeatureRecord> {
        let LakeRequest { point, year, mode } = *request;
        let params = &self.config.snapshot;

        let primary = snapshot(&self.sources, point, year, mode, params)?;

        let (history, glacier) = rayon::join(
            || {
                self.config
                    .expansion_spans
                    .par_iter()
                    .map(|&span| snapshot(&self.sources, point, year - span, mode, params))
                    .collect::<Result<Vec<_>>>()
            },
            || {
                primary
                    .polygon()
                    .map(|lake| {
                        glacier_proximity(&self.sources, point, lake, &self.config.proximity)
                    })
                    .transpose()
            },
        );

        let expansions = history?
            .iter()
            .map(|earlier| expansion_rate(&primary, earlier))
            .collect::<Result<Vec<_>>>()?;

        let record = aggregate(primary, expansions, glacier?)?;
        let missing = record.missing_fields();
        if !missing.is_empty() {
            debug!("{} {}: partial record, missing {}", point, year, missing.join(", "));
        }
        Ok(record)
    }

    /// Process `requests` on a pool of `max_concurrency` threads.
    ///
    /// `progress` is called once per lake as it finishes, in completion order.
    pub fn run_batch<F>(&self, requests: &[LakeRequest], progress: F) -> Result<BatchReport>
    where
        F: Fn(&LakeRequest) + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrency)
            .build()
            .map_err(|e| Error::Other(format!("failed to build thread pool: {}", e)))?;

        info!(
            "Processing {} lakes on {} threads",
            requests.len(),
            pool.current_num_threads()
        );

        let results: Vec<Result<FeatureRecord>> = pool.install(|| {
            requests
                .par_iter()
                .map(|request| {
                    let result = self.process(request);
                    progress(request);
                    result
                })
                .collect()
        });

        let mut report = BatchReport::default();
        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    error!("{} {}: {}", request.point, request.year, e);
                    report.failures.push(LakeFailure {
                        request: *request,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Batch done: {} complete, {} partial, {} failed",
            report.complete(),
            report.partial(),
            report.failed()
        );
        Ok(report)
    }
}
