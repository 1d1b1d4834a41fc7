use std::collections::BTreeMap;
use tracing::{debug, info};

use super::data::{CacheSummary, MeasurementRecord, SelectedFile};
use super::preview::{PreviewRef, PreviewRegistry};
use crate::bench::batch::{BatchJob, CancelToken, Event, Phase, Progress, RunKind, Target};

/// The Session owns everything the user has selected and measured.
///
/// It is the single owner of the preview references it issues: they are
/// revoked on every new selection, on reset, and when the session is dropped.
pub struct Session {
    files: Vec<SelectedFile>,
    /// One preview per file, same index
    previews: Vec<PreviewRef>,
    records: BTreeMap<usize, MeasurementRecord>,
    cache_summary: Option<CacheSummary>,
    phase: Phase,
    /// Bumped on every selection change; older batch output is ignored
    generation: u64,
    /// Generation of the batch still running, even after a re-selection,
    /// until its final phase comes back
    in_flight: Option<u64>,
    cancel: CancelToken,
    registry: PreviewRegistry,
}

impl Session {
    pub fn new(registry: PreviewRegistry) -> Self {
        Self {
            files: Vec::new(),
            previews: Vec::new(),
            records: BTreeMap::new(),
            cache_summary: None,
            phase: Phase::Idle,
            generation: 0,
            in_flight: None,
            cancel: CancelToken::new(),
            registry,
        }
    }

    /// Replace the selection wholesale
    pub fn select(&mut self, files: Vec<SelectedFile>) {
        self.cancel.cancel();
        self.registry.revoke_all(&self.previews);

        self.previews = files.iter().map(|file| self.registry.create(file)).collect();
        self.files = files;
        self.records.clear();
        self.phase = Phase::Idle;
        self.generation += 1;

        info!("🖼️  Selected {} file(s)", self.files.len());
    }

    pub fn reset(&mut self) {
        self.select(Vec::new());
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn preview(&self, index: usize) -> Option<PreviewRef> {
        self.previews.get(index).copied()
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }

    pub fn record(&self, index: usize) -> Option<&MeasurementRecord> {
        self.records.get(&index)
    }

    pub fn records(&self) -> impl Iterator<Item = (usize, &MeasurementRecord)> {
        self.records.iter().map(|(index, record)| (*index, record))
    }

    pub fn cache_summary(&self) -> Option<CacheSummary> {
        self.cache_summary
    }

    pub fn set_cache_summary(&mut self, summary: CacheSummary) {
        self.cache_summary = Some(summary);
    }

    #[cfg(test)]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// True while a batch is working, including one cancelled by a
    /// re-selection that hasn't stopped yet
    pub fn is_running(&self) -> bool {
        self.phase.is_running() || self.in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Status line, naming the file being worked on
    pub fn status(&self) -> String {
        if self.in_flight.is_some() && !self.phase.is_running() {
            return "Stopping previous run...".to_string();
        }
        match &self.phase {
            Phase::Measuring { index, total } => match self.files.get(*index) {
                Some(file) => format!("Measuring {} ({} of {})...", file.name, index + 1, total),
                None => self.phase.status(),
            },
            phase => phase.status(),
        }
    }

    /// Prepare a batch. Returns `None` if there is nothing to run or a
    /// batch is already in flight.
    pub fn begin(&mut self, kind: RunKind) -> Option<BatchJob> {
        if self.files.is_empty() || self.is_running() {
            return None;
        }

        let total = self.files.len();
        let indices: Vec<usize> = match kind {
            RunKind::Cold | RunKind::Warm => (0..total).collect(),
            RunKind::Single(index) if index < total => vec![index],
            RunKind::Single(_) => return None,
        };

        let targets = indices
            .into_iter()
            .map(|index| Target {
                index,
                file: self.files[index].clone(),
                preview: self.preview(index),
            })
            .collect();

        self.cancel = CancelToken::new();
        self.in_flight = Some(self.generation);
        self.phase = match kind {
            RunKind::Cold => Phase::ClearingCache,
            RunKind::Warm => Phase::Warming { index: 0, total },
            RunKind::Single(index) => Phase::Measuring { index, total },
        };

        Some(BatchJob {
            generation: self.generation,
            kind,
            total,
            targets,
            cancel: self.cancel.clone(),
        })
    }

    /// Ask the running batch to stop after its current step
    pub fn cancel(&self) {
        if self.is_running() {
            info!("⏹️  Cancelling run");
            self.cancel.cancel();
        }
    }

    /// Fold batch output into the session. Returns false for stale output.
    pub fn apply(&mut self, progress: Progress) -> bool {
        if let Event::Phase(Phase::Done(_) | Phase::Cancelled(_)) = &progress.event {
            if self.in_flight == Some(progress.generation) {
                self.in_flight = None;
            }
        }

        if progress.generation != self.generation {
            debug!("Dropping progress from generation {}", progress.generation);
            return false;
        }

        match progress.event {
            Event::Phase(phase) => self.phase = phase,
            Event::Measured { index, record } => {
                if index >= self.files.len() {
                    return false;
                }
                self.records.insert(index, record);
            }
            Event::CacheSummary(summary) => self.cache_summary = Some(summary),
        }
        true
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.registry.revoke_all(&self.previews);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("files", &self.files.len())
            .field("records", &self.records.len())
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
