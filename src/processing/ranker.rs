//! Batch ranking of many resumes against one job description

use crate::error::{Result, ScreenerError};
use crate::processing::pipeline::ScoreResult;
use log::{debug, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;

/// Most resumes scored per batch
pub const DEFAULT_MAX_BATCH: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub id: String,
    pub result: ScoreResult,
}

/// Scored resumes, best first
#[derive(Debug, Clone, Serialize)]
pub struct RankedBatch {
    pub entries: Vec<RankedEntry>,
    /// Resumes handed in, before the cap
    pub submitted: usize,
    /// Resumes dropped by the cap, taken from the end of the input
    pub excluded: usize,
}

impl RankedBatch {
    pub fn is_truncated(&self) -> bool {
        self.excluded > 0
    }

    pub fn shortlisted(&self) -> impl Iterator<Item = &RankedEntry> {
        self.entries.iter().filter(|e| e.result.shortlisted())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Account for submissions dropped before they reached the ranker
    pub fn counting_submissions(mut self, submitted: usize) -> Self {
        self.submitted = self.submitted.max(submitted);
        self.excluded = self.submitted - self.entries.len();
        self
    }
}

/// Scores resumes on a bounded worker pool and sorts the results
pub struct BatchRanker {
    pool: ThreadPool,
}

impl BatchRanker {
    /// `workers == 0` uses one thread per available core; larger requests are
    /// capped at the core count.
    pub fn new(workers: usize) -> Result<Self> {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let threads = if workers == 0 { cores } else { workers.min(cores) };

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("screener-worker-{}", i))
            .build()
            .map_err(|e| {
                ScreenerError::Configuration(format!("Failed to build worker pool: {}", e))
            })?;
        debug!("Batch ranker using {} worker threads", threads);

        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Truncate to `max_count`, score every resume independently, then
    /// stable-sort by final score descending so ties keep input order.
    ///
    /// The first fatal error aborts the batch; `score` is expected to fold
    /// recoverable per-item failures into the result itself.
    pub fn rank<T, F>(&self, resumes: &[(String, T)], max_count: usize, score: F) -> Result<RankedBatch>
    where
        T: Sync,
        F: Fn(&str, &T) -> Result<ScoreResult> + Sync,
    {
        let submitted = resumes.len();
        let kept = &resumes[..submitted.min(max_count)];
        let excluded = submitted - kept.len();
        if excluded > 0 {
            warn!(
                "Batch capped at {} resumes; {} of {} submissions were not scored",
                max_count, excluded, submitted
            );
        }

        let scored: Vec<Result<RankedEntry>> = self.pool.install(|| {
            kept.par_iter()
                .map(|(id, text)| {
                    score(id, text).map(|result| RankedEntry {
                        id: id.clone(),
                        result,
                    })
                })
                .collect()
        });

        let mut entries = scored.into_iter().collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| b.result.final_score().total_cmp(&a.result.final_score()));

        Ok(RankedBatch {
            entries,
            submitted,
            excluded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::fusion::FusionWeights;
    use crate::processing::skills::SkillMatch;

    fn fixed(lexical: f64, semantic: f64) -> ScoreResult {
        ScoreResult::from_scores(lexical, semantic, SkillMatch::default(), &FusionWeights::default())
    }

    fn resumes(n: usize) -> Vec<(String, String)> {
        (0..n).map(|i| (format!("r{}", i), format!("{}", i))).collect()
    }

    #[test]
    fn test_sorted_descending_and_stable() {
        let ranker = BatchRanker::new(4).unwrap();
        // scores by index: 0 -> 10, 1 -> 90, 2 -> 10, 3 -> 50, 4 -> 90
        let scores = [10.0, 90.0, 10.0, 50.0, 90.0];
        let batch = ranker
            .rank(&resumes(5), DEFAULT_MAX_BATCH, |_, text| {
                let i: usize = text.parse().unwrap();
                Ok(fixed(scores[i], scores[i]))
            })
            .unwrap();

        let ids: Vec<&str> = batch.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r4", "r3", "r0", "r2"]);
        assert!(!batch.is_truncated());
        assert_eq!(batch.shortlisted().count(), 3);
    }

    #[test]
    fn test_cap_excludes_tail() {
        let ranker = BatchRanker::new(2).unwrap();
        let batch = ranker
            .rank(&resumes(25), 20, |_, _| Ok(fixed(0.0, 0.0)))
            .unwrap();

        assert_eq!(batch.len(), 20);
        assert_eq!(batch.submitted, 25);
        assert_eq!(batch.excluded, 5);
        assert!(batch.is_truncated());
        for i in 20..25 {
            let id = format!("r{}", i);
            assert!(batch.entries.iter().all(|e| e.id != id));
        }
    }

    #[test]
    fn test_fatal_error_aborts_batch() {
        let ranker = BatchRanker::new(2).unwrap();
        let result = ranker.rank(&resumes(3), 20, |_, text| {
            if text == "1" {
                Err(ScreenerError::ModelUnavailable("gone".into()))
            } else {
                Ok(fixed(1.0, 1.0))
            }
        });
        assert!(matches!(result, Err(ScreenerError::ModelUnavailable(_))));
    }

    #[test]
    fn test_worker_count_capped_by_cores() {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(BatchRanker::new(0).unwrap().workers(), cores);
        assert!(BatchRanker::new(10_000).unwrap().workers() <= cores);
    }

    #[test]
    fn test_empty_batch() {
        let ranker = BatchRanker::new(1).unwrap();
        let none: Vec<(String, String)> = Vec::new();
        let batch = ranker.rank(&none, 20, |_, _| Ok(fixed(0.0, 0.0))).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.submitted, 0);
    }

    #[test]
    fn test_counting_submissions_dropped_upstream() {
        let ranker = BatchRanker::new(1).unwrap();
        let batch = ranker
            .rank(&resumes(3), 3, |_, _| Ok(fixed(0.0, 0.0)))
            .unwrap()
            .counting_submissions(8);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.submitted, 8);
        assert_eq!(batch.excluded, 5);
        assert!(batch.is_truncated());

        let untouched = ranker
            .rank(&resumes(4), 2, |_, _| Ok(fixed(0.0, 0.0)))
            .unwrap()
            .counting_submissions(1);
        assert_eq!(untouched.submitted, 4);
        assert_eq!(untouched.excluded, 2);
    }
}
