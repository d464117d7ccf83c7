use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::pipeline::CallPipeline;

/// Concurrency cap for [`run_batch`] callers without a tuned value.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 5;

/// Tally of one batch run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Run the pipeline for many calls with at most `concurrency` in flight.
///
/// Each call is processed independently; one failing call never stops the
/// others. A call counts as failed when any of its steps failed or the
/// run returned an error.
pub async fn run_batch(
    pipeline: Arc<CallPipeline>,
    call_ids: Vec<String>,
    concurrency: usize,
) -> BatchSummary {
    let total = call_ids.len();
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));

    info!(total, concurrency = concurrency.max(1), "Starting pipeline batch");

    let mut handles = Vec::with_capacity(total);
    for call_id in call_ids {
        let pipeline = Arc::clone(&pipeline);
        let permits = Arc::clone(&permits);
        handles.push(tokio::spawn(async move {
            // The semaphore is never closed, so holding the acquire result
            // is enough to hold the permit.
            let _permit = permits.acquire_owned().await;
            match pipeline.run(&call_id).await {
                Ok(report) if report.succeeded() => true,
                Ok(report) => {
                    warn!(
                        call_id = %report.call_id,
                        transcription = ?report.transcription,
                        analysis = ?report.analysis,
                        disposition = ?report.disposition,
                        "Pipeline finished with a failed step"
                    );
                    false
                }
                Err(err) => {
                    error!(call_id = %call_id, error = %err, "Pipeline run errored");
                    false
                }
            }
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await {
            Ok(true) => succeeded += 1,
            Ok(false) => {}
            Err(err) => {
                error!(error = %err, "Pipeline task aborted");
            }
        }
    }

    let summary = BatchSummary {
        total,
        succeeded,
        failed: total - succeeded,
    };
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Pipeline batch finished"
    );
    summary
}
