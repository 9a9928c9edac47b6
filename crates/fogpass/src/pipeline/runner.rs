use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, info_span, warn};

use crate::db::{route_repo, Database};
use crate::job::{JobStatus, JobTracker, ResultSummary};
use crate::landmark;
use crate::metrics::PipelineMetrics;
use crate::parser::{ParserRegistry, RowControl, SourceRow};
use crate::sanitize;
use crate::storage::ScratchSpace;
use crate::worker::IngestTask;

use super::batch::BatchPersister;
use super::config::PipelineConfig;
use super::context::JobTally;
use super::error::PipelineError;
use super::failures::FailureRecorder;

/// What became of one job run.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: String,
    pub status: JobStatus,
    /// `None` when the job could not be claimed.
    pub summary: Option<ResultSummary>,
    pub batches_written: usize,
    pub elapsed: Duration,
}

enum Finished {
    Completed(ResultSummary),
    NotClaimed,
}

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    db: Database,
    tracker: JobTracker,
    parsers: ParserRegistry,
    scratch: ScratchSpace,
}

impl Pipeline {
    pub fn from_config(config: Arc<PipelineConfig>, db: Database) -> Self {
        let tracker = JobTracker::new(db.clone());
        let scratch = ScratchSpace::new(&config.upload_dir);

        Self {
            config,
            db,
            tracker,
            parsers: ParserRegistry::new(),
            scratch,
        }
    }

    /// Ingests one staged upload and drives its job to a terminal state.
    ///
    /// Never returns an error: fatal problems are written to the job row.
    /// The staged file is removed and the duration recorded on every path.
    pub fn run(&self, task: &IngestTask) -> JobOutcome {
        let started = Instant::now();
        let file = sanitize::redact_path(&task.staged_path);
        let _span = info_span!("ingest",
            job_id = %task.job_id,
            route_id = task.route_id,
            file = %file,
        )
        .entered();

        let mut tally = JobTally::new();
        let mut batches_written = 0;

        let processed = guarded(|| self.process(task, &mut tally, &mut batches_written));
        let (status, summary) = match processed {
            Ok(Finished::Completed(summary)) => {
                PipelineMetrics::job_completed();
                (JobStatus::Completed, Some(summary))
            }
            Ok(Finished::NotClaimed) => {
                warn!("Job is not pending, skipping");
                (self.current_status(&task.job_id), None)
            }
            Err(e) => {
                let cause = e.to_string();
                error!(error = %cause, "Job failed");
                let summary = tally.fatal_summary(&cause);
                if let Err(db_err) = self.tracker.fail(&task.job_id, &summary) {
                    error!(error = %db_err, "Could not mark job failed");
                }
                PipelineMetrics::job_failed();
                (JobStatus::Failed, Some(summary))
            }
        };

        PipelineMetrics::rows_processed(tally.success_count(), tally.failure_count());
        self.cleanup(task);

        let elapsed = started.elapsed();
        PipelineMetrics::record_duration(elapsed.as_secs_f64());
        info!(
            status = %status,
            success = tally.success_count(),
            failure = tally.failure_count(),
            batches = batches_written,
            elapsed_ms = elapsed.as_millis() as u64,
            "Job finished"
        );

        JobOutcome {
            job_id: task.job_id.clone(),
            status,
            summary,
            batches_written,
            elapsed,
        }
    }

    fn process(
        &self,
        task: &IngestTask,
        tally: &mut JobTally,
        batches_written: &mut usize,
    ) -> Result<Finished, PipelineError> {
        if !self.tracker.mark_processing(&task.job_id)? {
            return Ok(Finished::NotClaimed);
        }

        {
            let _step = info_span!("resolve_route").entered();
            if route_repo::find_by_id(&self.db, task.route_id)?.is_none() {
                return Err(PipelineError::RouteVanished(task.route_id));
            }
        }

        {
            let _step = info_span!("parse", format = task.format.extension()).entered();
            let mut source = self.parsers.open(&task.staged_path, task.format)?;

            let mut persister =
                BatchPersister::new(self.db.clone(), task.route_id, self.config.batch_size);
            let recorder = FailureRecorder::new(self.db.clone(), &task.job_id);
            let max_rows = self.config.max_rows;
            let mut fatal = None;

            let read = source.read_rows(&mut |row: SourceRow| {
                let SourceRow {
                    row_number,
                    raw,
                    fields,
                } = row;

                let step = match fields.and_then(landmark::prepare) {
                    Ok(landmark) => {
                        tally.record_success();
                        let pushed = persister.push(landmark);
                        tally.set_committed(persister.rows_written() as u64);
                        pushed
                    }
                    Err(cause) => {
                        let message = cause.to_string();
                        debug!(row_number, error = %message, "Row rejected");
                        tally.record_failure(row_number, &message);
                        recorder.record(row_number, &raw, &message)
                    }
                };

                if let Err(e) = step {
                    fatal = Some(e);
                    return RowControl::Stop;
                }
                if tally.reached(max_rows) {
                    debug!(max_rows, "Row limit reached, ignoring the rest of the file");
                    return RowControl::Stop;
                }
                RowControl::Continue
            });

            *batches_written = persister.batches_written();
            read?;
            if let Some(e) = fatal {
                return Err(e);
            }

            let finished = persister.finish();
            *batches_written = persister.batches_written();
            tally.set_committed(persister.rows_written() as u64);
            finished?;
        }

        let _step = info_span!("finalize").entered();
        let summary = tally.summary();
        let changed = self
            .tracker
            .complete(&task.job_id, &summary)
            .map_err(PipelineError::Finalize)?;
        if !changed {
            warn!("Job left PROCESSING before it could be completed");
        }

        Ok(Finished::Completed(summary))
    }

    fn current_status(&self, job_id: &str) -> JobStatus {
        match self.tracker.find(job_id) {
            Ok(Some(job)) => job.status,
            _ => JobStatus::Failed,
        }
    }

    fn cleanup(&self, task: &IngestTask) {
        match self.scratch.remove(&task.staged_path) {
            Ok(true) => debug!("Removed staged upload"),
            Ok(false) => debug!("Staged upload already gone"),
            Err(e) => warn!(error = %e, "Failed to remove staged upload"),
        }
    }
}

/// Runs one ingest step, turning a panic into a job-fatal error so the job
/// still reaches `FAILED` and its staged file is cleaned up.
fn guarded<F>(step: F) -> Result<Finished, PipelineError>
where
    F: FnOnce() -> Result<Finished, PipelineError>,
{
    panic::catch_unwind(AssertUnwindSafe(step))
        .unwrap_or_else(|payload| Err(PipelineError::Aborted(panic_message(payload.as_ref()))))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}
