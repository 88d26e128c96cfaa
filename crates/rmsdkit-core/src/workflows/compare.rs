use crate::core::io::memory::InMemorySource;
use crate::core::io::traits::StructureSource;
use crate::core::models::point_set::PointSet;
use crate::engine::config::{ComparisonConfig, Method};
use crate::engine::external::ExternalAligner;
use crate::engine::method::{MethodOutcome, run_method};
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Acceptable,
    HighDeviation,
    Failed,
}

impl Status {
    pub fn classify(deviation: f64, threshold: f64) -> Self {
        if deviation < threshold {
            Self::Acceptable
        } else {
            Self::HighDeviation
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Acceptable => "Acceptable",
            Self::HighDeviation => "High deviation",
            Self::Failed => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    Success(MethodOutcome),
    Failure { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    /// 1-based position of the candidate in the input list.
    pub structure_id: usize,
    pub candidate: String,
    pub outcome: Outcome,
    pub status: Status,
    /// 1-based rank after sorting; failures rank last.
    pub rank: usize,
}

impl ComparisonRecord {
    pub fn deviation(&self) -> Option<f64> {
        match &self.outcome {
            Outcome::Success(o) => Some(o.deviation),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure { reason } => Some(reason),
        }
    }

    pub fn fallback_used(&self) -> bool {
        matches!(&self.outcome, Outcome::Success(o) if o.fallback_used())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub reference: String,
    pub method: Method,
    pub threshold: f64,
    /// Sorted by rank.
    pub records: Vec<ComparisonRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub acceptable: usize,
    pub fallbacks: usize,
    pub mean_deviation: Option<f64>,
    pub min_deviation: Option<f64>,
    pub max_deviation: Option<f64>,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let deviations: Vec<f64> = self
            .records
            .iter()
            .filter_map(ComparisonRecord::deviation)
            .collect();
        let succeeded = deviations.len();
        let mean_deviation =
            (succeeded > 0).then(|| deviations.iter().sum::<f64>() / succeeded as f64);

        BatchSummary {
            total: self.records.len(),
            succeeded,
            failed: self.records.len() - succeeded,
            acceptable: self
                .records
                .iter()
                .filter(|r| r.status == Status::Acceptable)
                .count(),
            fallbacks: self.records.iter().filter(|r| r.fallback_used()).count(),
            mean_deviation,
            min_deviation: deviations.iter().copied().reduce(f64::min),
            max_deviation: deviations.iter().copied().reduce(f64::max),
        }
    }
}

/// Compares every candidate against `reference` with the configured method and
/// returns the ranked report.
///
/// Candidates are independent: a failing candidate becomes a failure record and
/// never aborts the batch. With the `parallel` feature candidates are processed
/// concurrently; the final order does not depend on scheduling.
#[instrument(skip_all, name = "compare_batch", fields(method = %config.method))]
pub fn compare_batch<C>(
    reference: &dyn StructureSource,
    candidates: &[C],
    config: &ComparisonConfig,
    external: Option<&dyn ExternalAligner>,
    reporter: &ProgressReporter,
) -> BatchReport
where
    C: StructureSource,
{
    info!(
        reference = reference.name(),
        candidates = candidates.len(),
        "Starting batch comparison."
    );
    reporter.report(Progress::BatchStart {
        total: candidates.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = candidates.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = candidates.par_iter().enumerate();

    let records: Vec<ComparisonRecord> = iterator
        .map(|(index, candidate)| {
            let record = compare_one(index, reference, candidate, config, external, reporter);
            reporter.report(Progress::CandidateFinished {
                name: record.candidate.clone(),
                success: record.status != Status::Failed,
            });
            record
        })
        .collect();

    let records = rank_records(records);
    reporter.report(Progress::BatchFinish);

    let report = BatchReport {
        reference: reference.name().to_string(),
        method: config.method,
        threshold: config.threshold,
        records,
    };
    let summary = report.summary();
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        fallbacks = summary.fallbacks,
        "Batch comparison complete."
    );
    report
}

/// Convenience wrapper over [`compare_batch`] for already-extracted point sets.
pub fn compare_point_sets(
    reference: &PointSet,
    candidates: &[(String, PointSet)],
    config: &ComparisonConfig,
    reporter: &ProgressReporter,
) -> BatchReport {
    let reference = InMemorySource::new("reference", reference.clone());
    let candidates: Vec<InMemorySource> = candidates
        .iter()
        .map(|(name, points)| InMemorySource::new(name.clone(), points.clone()))
        .collect();
    compare_batch(&reference, &candidates, config, None, reporter)
}

#[instrument(level = "debug", skip_all, fields(candidate = candidate.name()))]
fn compare_one(
    index: usize,
    reference: &dyn StructureSource,
    candidate: &dyn StructureSource,
    config: &ComparisonConfig,
    external: Option<&dyn ExternalAligner>,
    reporter: &ProgressReporter,
) -> ComparisonRecord {
    let (outcome, status) = match run_method(reference, candidate, config, external) {
        Ok(result) => {
            debug!(
                candidate = candidate.name(),
                deviation = result.deviation,
                "Candidate compared."
            );
            if let Some(reason) = &result.fallback {
                reporter.report(Progress::Message(format!(
                    "{}: fell back to Kabsch ({reason})",
                    candidate.name()
                )));
            }
            let status = Status::classify(result.deviation, config.threshold);
            (Outcome::Success(result), status)
        }
        Err(e) => {
            warn!(candidate = candidate.name(), error = %e, "Candidate comparison failed.");
            (
                Outcome::Failure {
                    reason: e.to_string(),
                },
                Status::Failed,
            )
        }
    };

    ComparisonRecord {
        structure_id: index + 1,
        candidate: candidate.name().to_string(),
        outcome,
        status,
        rank: 0,
    }
}

/// Orders successes by ascending deviation, then failures in input order, and
/// assigns contiguous 1-based ranks.
fn rank_records(mut records: Vec<ComparisonRecord>) -> Vec<ComparisonRecord> {
    records.sort_by(|a, b| {
        let by_deviation = match (a.deviation(), b.deviation()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_deviation.then(a.structure_id.cmp(&b.structure_id))
    });
    for (i, record) in records.iter_mut().enumerate() {
        record.rank = i + 1;
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::file::StructureFile;
    use crate::core::io::traits::{Extraction, ExtractionError};
    use crate::core::utils::geometry::rotation_from_axis_angle;
    use crate::engine::config::ComparisonConfigBuilder;
    use crate::engine::error::AlignError;
    use nalgebra::{Point3, Vector3};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    /// Deviations keyed by candidate file name; unknown names fail.
    struct TableAligner(HashMap<&'static str, f64>);

    impl ExternalAligner for TableAligner {
        fn name(&self) -> &str {
            "table"
        }

        fn align(&self, _reference: &Path, candidate: &Path) -> Result<f64, AlignError> {
            let key = candidate.file_name().and_then(|n| n.to_str()).unwrap_or("");
            self.0
                .get(key)
                .copied()
                .ok_or_else(|| AlignError::ExternalFailure(format!("no result for {key}")))
        }
    }

    fn tetra() -> PointSet {
        PointSet::from_coords(&[
            [0.0, 0.0, 0.0],
            [3.8, 0.0, 0.0],
            [1.9, 3.3, 0.0],
            [1.9, 1.1, 3.1],
        ])
    }

    fn external_config() -> ComparisonConfig {
        ComparisonConfigBuilder::new()
            .method(Method::External)
            .build()
            .unwrap()
    }

    #[test]
    fn ranks_by_deviation_with_failures_last() {
        let aligner = TableAligner(HashMap::from([("far.pdb", 3.0), ("close.pdb", 0.5)]));
        let reference = StructureFile::new("ref.pdb");
        let candidates = vec![
            StructureFile::new("far.pdb"),
            StructureFile::new("close.pdb"),
            StructureFile::new("broken.pdb"),
        ];

        let report = compare_batch(
            &reference,
            &candidates,
            &external_config(),
            Some(&aligner),
            &ProgressReporter::new(),
        );

        let rows: Vec<(&str, Option<f64>, Status, usize)> = report
            .records
            .iter()
            .map(|r| (r.candidate.as_str(), r.deviation(), r.status, r.rank))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("close.pdb", Some(0.5), Status::Acceptable, 1),
                ("far.pdb", Some(3.0), Status::HighDeviation, 2),
                ("broken.pdb", None, Status::Failed, 3),
            ]
        );
        assert_eq!(report.records[0].structure_id, 2);
        assert!(report.records[2].failure_reason().unwrap().contains("broken.pdb"));
    }

    #[test]
    fn failures_keep_input_order_among_themselves() {
        let candidates = vec![
            ("empty".to_string(), PointSet::default()),
            ("ok".to_string(), tetra()),
            ("short".to_string(), tetra().truncated(2)),
        ];
        let config = ComparisonConfigBuilder::new()
            .method(Method::Kabsch)
            .build()
            .unwrap();

        let report = compare_point_sets(&tetra(), &candidates, &config, &ProgressReporter::new());
        let names: Vec<&str> = report.records.iter().map(|r| r.candidate.as_str()).collect();
        assert_eq!(names, vec!["ok", "empty", "short"]);
        assert_eq!(
            report.records.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn recovers_a_rotated_copy_end_to_end() {
        let reference = tetra();
        let rotation = rotation_from_axis_angle(&Vector3::new(0.3, -0.7, 1.1), 90.0);
        let rotated = reference.transformed(&rotation, &Vector3::new(5.0, 0.0, -2.0));
        let mut distorted: Vec<Point3<f64>> = rotated.points().to_vec();
        distorted[3] += Vector3::new(2.5, 2.5, 2.5);

        let candidates = vec![
            ("distorted".to_string(), PointSet::new(distorted)),
            ("rotated".to_string(), rotated),
        ];
        let report = compare_point_sets(
            &reference,
            &candidates,
            &ComparisonConfig::default(),
            &ProgressReporter::new(),
        );

        let best = &report.records[0];
        assert_eq!(best.candidate, "rotated");
        assert!(best.deviation().unwrap() < 1e-6);
        assert_eq!(best.status, Status::Acceptable);
        assert!(!best.fallback_used());
        assert_eq!(report.records[1].candidate, "distorted");
    }

    #[test]
    fn summary_aggregates_successful_records() {
        let aligner = TableAligner(HashMap::from([
            ("a.pdb", 1.0),
            ("b.pdb", 2.0),
            ("c.pdb", 4.5),
        ]));
        let reference = StructureFile::new("ref.pdb");
        let candidates: Vec<StructureFile> = ["a.pdb", "b.pdb", "c.pdb", "d.pdb"]
            .into_iter()
            .map(StructureFile::new)
            .collect();

        let report = compare_batch(
            &reference,
            &candidates,
            &external_config(),
            Some(&aligner),
            &ProgressReporter::new(),
        );
        let summary = report.summary();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.acceptable, 1);
        assert_eq!(summary.fallbacks, 0);
        assert_eq!(summary.min_deviation, Some(1.0));
        assert_eq!(summary.max_deviation, Some(4.5));
        assert!((summary.mean_deviation.unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn threshold_boundary_is_high_deviation() {
        assert_eq!(Status::classify(1.999, 2.0), Status::Acceptable);
        assert_eq!(Status::classify(2.0, 2.0), Status::HighDeviation);
    }

    #[test]
    fn reports_progress_for_every_candidate() {
        let counter = Mutex::new((0u64, 0usize, false));
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let mut state = counter.lock().unwrap();
            match event {
                Progress::BatchStart { total } => state.0 = total,
                Progress::CandidateFinished { .. } => state.1 += 1,
                Progress::BatchFinish => state.2 = true,
                Progress::Message(_) => {}
            }
        }));
        let candidates = vec![
            ("x".to_string(), tetra()),
            ("y".to_string(), tetra()),
            ("z".to_string(), PointSet::default()),
        ];

        compare_point_sets(&tetra(), &candidates, &ComparisonConfig::default(), &reporter);
        drop(reporter);

        assert_eq!(counter.into_inner().unwrap(), (3, 3, true));
    }

    /// Serves scanned points only; structured extraction is unavailable.
    struct ScannedOnly(InMemorySource);

    impl StructureSource for ScannedOnly {
        fn name(&self) -> &str {
            self.0.name()
        }

        fn extract(&self, extraction: &Extraction) -> Result<PointSet, ExtractionError> {
            match extraction {
                Extraction::Scanned => self.0.extract(extraction),
                Extraction::Structured { .. } => {
                    Err(ExtractionError::ReaderUnavailable("no parser".to_string()))
                }
            }
        }
    }

    #[test]
    fn fallback_is_announced_and_counted() {
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(msg) = event {
                messages.lock().unwrap().push(msg);
            }
        }));
        let reference = InMemorySource::new("ref", tetra());
        let candidates = vec![ScannedOnly(InMemorySource::new("legacy.pdb", tetra()))];

        let report = compare_batch(
            &reference,
            &candidates,
            &ComparisonConfig::default(),
            None,
            &reporter,
        );
        drop(reporter);

        assert!(report.records[0].fallback_used());
        assert_eq!(report.summary().fallbacks, 1);
        let messages = messages.into_inner().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("legacy.pdb: fell back to Kabsch"));
        assert!(messages[0].contains("no parser"));
    }

    #[test]
    fn empty_batch_yields_empty_report() {
        let report = compare_point_sets(
            &tetra(),
            &[],
            &ComparisonConfig::default(),
            &ProgressReporter::new(),
        );
        assert!(report.records.is_empty());
        assert_eq!(report.summary().mean_deviation, None);
    }
}
