/// Cold and warm batch procedures
///
/// A batch walks the selected files strictly one after another and reports
/// every phase change and every finished record through a progress sink.
/// Concurrent decodes would compete for the same CPU and skew the timings,
/// so nothing here runs in parallel.
use futures::{Sink, SinkExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::measure::{measure_cached, measure_file, time_preview_decode};
use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::state::cache::{entry_key, Cache};
use crate::state::data::{CacheSummary, MeasurementRecord, SelectedFile};
use crate::state::preview::{PreviewRef, PreviewRegistry};

/// Which procedure a batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Clear the cache, then measure everything (first visit)
    Cold,
    /// Fill the cache, then measure everything from it (repeat visit)
    Warm,
    /// Measure one file, using its cache entry if there is one
    Single(usize),
}

/// Where a batch currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ClearingCache,
    Warming { index: usize, total: usize },
    Measuring { index: usize, total: usize },
    Done(RunKind),
    Cancelled(RunKind),
}

impl Phase {
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Phase::ClearingCache | Phase::Warming { .. } | Phase::Measuring { .. }
        )
    }

    /// Short status line for the UI
    pub fn status(&self) -> String {
        match self {
            Phase::Idle => String::new(),
            Phase::ClearingCache => "Running cold load... (clearing cache)".to_string(),
            Phase::Warming { index, total } => {
                format!("Running warm load... caching file {} of {}", index + 1, total)
            }
            Phase::Measuring { index, total } => {
                format!("Measuring file {} of {}...", index + 1, total)
            }
            Phase::Done(RunKind::Cold) => "Cold load complete ✓".to_string(),
            Phase::Done(RunKind::Warm) => "Warm load complete ✓".to_string(),
            Phase::Done(RunKind::Single(index)) => format!("File {} measured ✓", index + 1),
            Phase::Cancelled(_) => "Run cancelled".to_string(),
        }
    }
}

/// Shared flag checked between sequential steps
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One file to measure, with the index it occupies in the session
#[derive(Debug, Clone)]
pub struct Target {
    pub index: usize,
    pub file: SelectedFile,
    pub preview: Option<PreviewRef>,
}

/// Everything a batch needs, detached from the session
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Selection generation the results belong to
    pub generation: u64,
    pub kind: RunKind,
    /// Number of files in the session
    pub total: usize,
    pub targets: Vec<Target>,
    pub cancel: CancelToken,
}

#[derive(Debug, Clone)]
pub enum Event {
    Phase(Phase),
    Measured {
        index: usize,
        record: MeasurementRecord,
    },
    CacheSummary(CacheSummary),
}

/// An event tagged with the selection generation it was produced for
#[derive(Debug, Clone)]
pub struct Progress {
    pub generation: u64,
    pub event: Event,
}

/// Runs batches against the cache and the preview registry
#[derive(Debug, Clone)]
pub struct Runner {
    pub cache: Cache,
    pub registry: PreviewRegistry,
    pub config: Arc<BenchConfig>,
}

impl Runner {
    pub fn new(cache: Cache, registry: PreviewRegistry, config: BenchConfig) -> Self {
        Self {
            cache,
            registry,
            config: Arc::new(config),
        }
    }

    /// Run `job` to completion (or cancellation), reporting into `sink`
    pub async fn run<S>(&self, job: BatchJob, mut sink: S)
    where
        S: Sink<Progress> + Unpin,
    {
        info!("🚀 Starting {:?} run over {} file(s)", job.kind, job.targets.len());

        let finished = match job.kind {
            RunKind::Cold => self.cold(&job, &mut sink).await,
            RunKind::Warm => self.warm(&job, &mut sink).await,
            RunKind::Single(_) => self.measure_all(&job, &mut sink, true).await,
        };

        let last = if finished {
            info!("✅ {:?} run complete", job.kind);
            Phase::Done(job.kind)
        } else {
            info!("⏹️  {:?} run cancelled", job.kind);
            Phase::Cancelled(job.kind)
        };
        emit(&mut sink, job.generation, Event::Phase(last)).await;
    }

    async fn cold<S>(&self, job: &BatchJob, sink: &mut S) -> bool
    where
        S: Sink<Progress> + Unpin,
    {
        emit(sink, job.generation, Event::Phase(Phase::ClearingCache)).await;
        if let Err(e) = self.cache.clear() {
            error!("❌ Clear cache failed: {}", e);
        }
        emit(sink, job.generation, Event::CacheSummary(self.cache.summary())).await;

        self.measure_all(job, sink, false).await
    }

    async fn warm<S>(&self, job: &BatchJob, sink: &mut S) -> bool
    where
        S: Sink<Progress> + Unpin,
    {
        for target in &job.targets {
            if job.cancel.is_cancelled() {
                return false;
            }
            let phase = Phase::Warming {
                index: target.index,
                total: job.total,
            };
            emit(sink, job.generation, Event::Phase(phase)).await;

            let key = entry_key(target.index);
            let stored = match target.file.source.read().await {
                Ok(bytes) => match self.cache.put(&key, &bytes) {
                    Ok(()) => true,
                    Err(e) => {
                        error!("❌ Cache failed for file {}: {}", target.index, e);
                        false
                    }
                },
                Err(e) => {
                    error!("❌ Could not read {} for caching: {}", target.file.name, e);
                    false
                }
            };
            // Whatever sits under this key belongs to some earlier selection
            if !stored && self.cache.is_available() {
                if let Err(e) = self.cache.remove(&key) {
                    warn!("⚠️  Could not drop stale entry {}: {}", key, e);
                }
            }
        }
        emit(sink, job.generation, Event::CacheSummary(self.cache.summary())).await;

        self.measure_all(job, sink, true).await
    }

    /// Measure every target in order. Returns false if cancelled.
    async fn measure_all<S>(&self, job: &BatchJob, sink: &mut S, use_cache: bool) -> bool
    where
        S: Sink<Progress> + Unpin,
    {
        for target in &job.targets {
            if job.cancel.is_cancelled() {
                return false;
            }
            let phase = Phase::Measuring {
                index: target.index,
                total: job.total,
            };
            emit(sink, job.generation, Event::Phase(phase)).await;

            let record = if use_cache {
                self.measure_with_cache(target).await
            } else {
                measure_file(&target.file, &self.registry, target.preview, &self.config).await
            };
            let event = Event::Measured {
                index: target.index,
                record,
            };
            emit(sink, job.generation, event).await;
        }
        true
    }

    /// Measure one file, timing the external path from its cache entry when present
    pub async fn measure_with_cache(&self, target: &Target) -> MeasurementRecord {
        let cached = match self.cache.get(&entry_key(target.index)) {
            Ok(cached) => cached,
            Err(BenchError::CacheUnavailable) => None,
            Err(e) => {
                warn!("⚠️  Cache lookup failed for file {}: {}", target.index, e);
                None
            }
        };

        let Some(bytes) = cached else {
            return measure_file(&target.file, &self.registry, target.preview, &self.config).await;
        };

        let temp = self.registry.create_from_bytes(bytes.into());
        let cached_decode = match time_preview_decode(&self.registry, Some(temp)).await {
            Ok(elapsed) => Some(elapsed),
            Err(e) => {
                warn!("⚠️  Cached decode failed for {}: {}", target.file.name, e);
                None
            }
        };

        let record = measure_cached(
            &target.file,
            &self.registry,
            target.preview,
            cached_decode,
            &self.config,
        )
        .await;

        self.registry.release_after(temp, self.config.preview_grace());
        record
    }
}

async fn emit<S>(sink: &mut S, generation: u64, event: Event)
where
    S: Sink<Progress> + Unpin,
{
    // A closed sink means nobody is listening anymore; the run still completes
    let _ = sink.send(Progress { generation, event }).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use futures::StreamExt;

    fn runner(dir: &tempfile::TempDir) -> Runner {
        let cache = Cache::open(Some(dir.path().join("cache.db")));
        Runner::new(cache, PreviewRegistry::new(), BenchConfig::default())
    }

    fn job(runner: &Runner, kind: RunKind, files: &[SelectedFile]) -> BatchJob {
        BatchJob {
            generation: 1,
            kind,
            total: files.len(),
            targets: files
                .iter()
                .enumerate()
                .map(|(index, file)| Target {
                    index,
                    file: file.clone(),
                    preview: Some(runner.registry.create(file)),
                })
                .collect(),
            cancel: CancelToken::new(),
        }
    }

    async fn collect(runner: &Runner, job: BatchJob) -> Vec<Event> {
        let (tx, rx) = mpsc::unbounded();
        runner.run(job, tx).await;
        rx.map(|progress| progress.event).collect().await
    }

    fn phases(events: &[Event]) -> Vec<Phase> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::Phase(phase) => Some(phase.clone()),
                _ => None,
            })
            .collect()
    }

    fn summaries(events: &[Event]) -> Vec<CacheSummary> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::CacheSummary(summary) => Some(*summary),
                _ => None,
            })
            .collect()
    }

    fn records(events: &[Event]) -> Vec<(usize, MeasurementRecord)> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::Measured { index, record } => Some((*index, record.clone())),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_cold_run_clears_then_measures() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&dir);
        runner.cache.put("img-7", &[1, 2, 3]).unwrap();
        let files = vec![
            SelectedFile::from_bytes("a.png", vec![1u8; 1000]),
            SelectedFile::from_bytes("b.png", vec![2u8; 3000]),
        ];

        let events = collect(&runner, job(&runner, RunKind::Cold, &files)).await;

        assert_eq!(
            phases(&events),
            vec![
                Phase::ClearingCache,
                Phase::Measuring { index: 0, total: 2 },
                Phase::Measuring { index: 1, total: 2 },
                Phase::Done(RunKind::Cold),
            ]
        );
        assert_eq!(summaries(&events)[0].entry_count, 0);
        let records = records(&events);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|(_, record)| !record.cached));
        assert_eq!(records[1].1.original_size, 3000);
    }

    #[tokio::test]
    async fn test_warm_run_fills_cache() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&dir);
        let files = vec![
            SelectedFile::from_bytes("a.png", vec![1u8; 1000]),
            SelectedFile::from_bytes("b.png", vec![2u8; 3000]),
        ];

        let events = collect(&runner, job(&runner, RunKind::Warm, &files)).await;

        assert_eq!(
            phases(&events),
            vec![
                Phase::Warming { index: 0, total: 2 },
                Phase::Warming { index: 1, total: 2 },
                Phase::Measuring { index: 0, total: 2 },
                Phase::Measuring { index: 1, total: 2 },
                Phase::Done(RunKind::Warm),
            ]
        );
        assert_eq!(
            summaries(&events),
            vec![CacheSummary {
                available: true,
                entry_count: 2,
                total_bytes: 4000,
            }]
        );
        assert!(records(&events).iter().all(|(_, record)| record.cached));
        assert_eq!(runner.cache.summary().total_bytes, 4000);
    }

    #[tokio::test]
    async fn test_warm_run_drops_entry_it_could_not_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&dir);
        runner.cache.put("img-0", &[7u8; 500]).unwrap();
        let files = vec![SelectedFile {
            name: "gone.png".into(),
            size: 500,
            source: crate::state::data::FileSource::Disk(dir.path().join("gone.png")),
        }];

        let events = collect(&runner, job(&runner, RunKind::Warm, &files)).await;

        assert_eq!(runner.cache.get("img-0").unwrap(), None);
        assert_eq!(summaries(&events)[0].entry_count, 0);
        let records = records(&events);
        assert_eq!(records.len(), 1);
        assert!(!records[0].1.cached);
    }

    #[tokio::test]
    async fn test_single_run_without_cache_entry() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&dir);
        let files = vec![SelectedFile::from_bytes("a.png", vec![1u8; 10])];
        let mut job = job(&runner, RunKind::Single(0), &files);
        job.total = 3;

        let events = collect(&runner, job).await;

        assert_eq!(
            phases(&events),
            vec![
                Phase::Measuring { index: 0, total: 3 },
                Phase::Done(RunKind::Single(0)),
            ]
        );
        assert!(!records(&events)[0].1.cached);
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_before_measuring() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&dir);
        let files = vec![SelectedFile::from_bytes("a.png", vec![1u8; 10])];
        let job = job(&runner, RunKind::Cold, &files);
        job.cancel.cancel();

        let events = collect(&runner, job).await;

        assert!(records(&events).is_empty());
        assert_eq!(phases(&events).last(), Some(&Phase::Cancelled(RunKind::Cold)));
    }

    #[tokio::test]
    async fn test_unavailable_cache_is_not_fatal() {
        let runner = Runner::new(Cache::unavailable(), PreviewRegistry::new(), BenchConfig::default());
        let files = vec![SelectedFile::from_bytes("a.png", vec![1u8; 10])];

        let events = collect(&runner, job(&runner, RunKind::Warm, &files)).await;

        assert_eq!(summaries(&events), vec![CacheSummary::unavailable()]);
        let records = records(&events);
        assert_eq!(records.len(), 1);
        assert!(!records[0].1.cached);
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(Phase::Idle.status(), "");
        assert!(Phase::ClearingCache.is_running());
        assert!(!Phase::Done(RunKind::Warm).is_running());
        assert_eq!(
            Phase::Measuring { index: 1, total: 4 }.status(),
            "Measuring file 2 of 4..."
        );
    }
}
