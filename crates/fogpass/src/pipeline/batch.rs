use crate::db::{landmark_repo, Database};
use crate::landmark::Landmark;

use super::error::PipelineError;

/// Buffers validated landmarks and writes them one transaction per batch.
pub struct BatchPersister {
    db: Database,
    route_id: i64,
    batch_size: usize,
    pending: Vec<Landmark>,
    batches_written: usize,
    rows_written: usize,
}

impl BatchPersister {
    pub fn new(db: Database, route_id: i64, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            db,
            route_id,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            batches_written: 0,
            rows_written: 0,
        }
    }

    /// Adds a landmark, flushing once the buffer reaches the batch size.
    pub fn push(&mut self, landmark: Landmark) -> Result<(), PipelineError> {
        self.pending.push(landmark);
        if self.pending.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes whatever is still buffered. A no-op when nothing is pending.
    pub fn finish(&mut self) -> Result<(), PipelineError> {
        self.flush()
    }

    pub fn batches_written(&self) -> usize {
        self.batches_written
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn flush(&mut self) -> Result<(), PipelineError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch = self.batches_written + 1;
        let written = landmark_repo::insert_batch(&self.db, self.route_id, &self.pending)
            .map_err(|e| PipelineError::BatchWrite { batch, source: e })?;

        tracing::debug!(batch, rows = written, "Landmark batch committed");
        self.batches_written = batch;
        self.rows_written += written;
        self.pending.clear();
        Ok(())
    }
}
