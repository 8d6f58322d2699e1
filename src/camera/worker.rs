//! Dedicated single-thread capture context.
//!
//! All hardware captures run on one named OS thread, one job at a time,
//! so overlapping requests queue instead of interleaving. Each job's
//! result goes back through its own oneshot channel.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::CaptureResult;
use crate::codec;
use crate::error::ErrorKind;
use crate::platform::{CameraHardware, PlatformError, UseCaseHandle};

/// Name of the worker thread.
const WORKER_THREAD_NAME: &str = "capture-worker";

/// One queued capture.
pub(crate) struct CaptureJob {
    pub(crate) request_id: Uuid,
    pub(crate) use_case: UseCaseHandle,
    pub(crate) reply: oneshot::Sender<CaptureResult>,
}

/// Sending half of the capture queue. Dropping it stops the thread once
/// the job in flight (if any) has finished.
pub(crate) struct CaptureWorker {
    tx: mpsc::Sender<CaptureJob>,
}

impl CaptureWorker {
    /// Start the worker thread.
    pub(crate) fn spawn(
        hardware: Arc<dyn CameraHardware>,
        ready: Arc<AtomicBool>,
        queue_depth: usize,
    ) -> std::io::Result<Self> {
        let (tx, mut rx) = mpsc::channel::<CaptureJob>(queue_depth.max(1));

        std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || {
                debug!("capture worker started");
                while let Some(job) = rx.blocking_recv() {
                    let result = run_job(hardware.as_ref(), &ready, &job);
                    if job.reply.send(result).is_err() {
                        debug!(request_id = %job.request_id, "capture requester went away");
                    }
                }
                info!("capture worker stopped");
            })?;

        Ok(Self { tx })
    }

    /// Queue a job without waiting.
    pub(crate) fn enqueue(&self, job: CaptureJob) -> Result<(), ErrorKind> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                ErrorKind::CaptureFailed("capture queue is full".to_owned())
            }
            mpsc::error::TrySendError::Closed(_) => {
                ErrorKind::CaptureFailed("capture worker has stopped".to_owned())
            }
        })
    }
}

/// Capture, encode, and classify one job. Never panics.
fn run_job(hardware: &dyn CameraHardware, ready: &AtomicBool, job: &CaptureJob) -> CaptureResult {
    // Snapshot only; a teardown racing this read makes the capture fail, not crash.
    if !ready.load(Ordering::Acquire) {
        warn!(request_id = %job.request_id, "session torn down before capture started");
        return CaptureResult::Failure {
            reason: ErrorKind::NotReady,
        };
    }

    debug!(request_id = %job.request_id, use_case = %job.use_case, "taking picture");
    let frame = match catch_unwind(AssertUnwindSafe(|| hardware.take_picture(job.use_case))) {
        Ok(Ok(frame)) => frame,
        Ok(Err(e)) => {
            warn!(request_id = %job.request_id, error = %e, "photo capture failed");
            return CaptureResult::Failure {
                reason: classify_capture_error(&e),
            };
        }
        Err(_) => {
            warn!(request_id = %job.request_id, "camera hardware panicked during capture");
            return CaptureResult::Failure {
                reason: ErrorKind::CaptureFailed("hardware fault".to_owned()),
            };
        }
    };

    debug!(
        request_id = %job.request_id,
        format = ?frame.format,
        width = frame.width,
        height = frame.height,
        "image captured"
    );

    let converted = catch_unwind(AssertUnwindSafe(|| {
        codec::encode(&frame).and_then(|jpeg| codec::to_data_url(&jpeg))
    }))
    .unwrap_or_else(|_| {
        warn!(request_id = %job.request_id, "image codec panicked");
        Err(ErrorKind::EncodingFailed("codec fault".to_owned()))
    });

    match converted {
        Ok(transport_image) => CaptureResult::Success { transport_image },
        Err(reason) => {
            warn!(request_id = %job.request_id, error = %reason, "image conversion failed");
            CaptureResult::Failure { reason }
        }
    }
}

fn classify_capture_error(error: &PlatformError) -> ErrorKind {
    match error {
        PlatformError::Hardware { code, .. } => ErrorKind::CaptureFailed(code.to_string()),
        other => ErrorKind::CaptureFailed(other.to_string()),
    }
}
