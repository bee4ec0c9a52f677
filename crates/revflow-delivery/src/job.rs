//! The persistent batch delivery job.

use crate::sender::{BatchSender, DeliveryConfig};
use async_trait::async_trait;
use revflow_events::Message;
use revflow_scheduler::{
    Job, JobCompletion, JobCreator, JobError, JobInfo, RetryDecision,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Job type identifier for batch delivery jobs.
pub const SEND_BATCH_JOB_TYPE: &str = "SendBatchingMessageJob";

/// Initial backoff for delivery retries.
const DELIVERY_BACKOFF_INITIAL: Duration = Duration::from_secs(5);

/// Params payload carried by a delivery job.
///
/// This is what the persister stores, so a restarted process can rebuild the
/// job with the exact batch and endpoint it was scheduled with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBatchParams {
    pub messages: Vec<Message>,
    pub configuration: DeliveryConfig,
}

/// Sends one batch to the ingestion endpoint, retrying transient failures
/// with exponential backoff.
pub struct SendBatchJob {
    params: SendBatchParams,
    sender: BatchSender,
}

impl SendBatchJob {
    /// Creates a job for the given batch and endpoint.
    pub fn new(params: SendBatchParams) -> Self {
        let sender = BatchSender::new(params.configuration.clone());
        Self { params, sender }
    }

    /// Rebuilds a job from persisted params.
    pub fn from_params(params: &serde_json::Value) -> serde_json::Result<Self> {
        let params: SendBatchParams = serde_json::from_value(params.clone())?;
        Ok(Self::new(params))
    }
}

#[async_trait]
impl Job for SendBatchJob {
    async fn on_run(&mut self, info: &JobInfo) -> Result<(), JobError> {
        debug!(
            uuid = %info.uuid,
            count = self.params.messages.len(),
            "Delivering batch"
        );
        self.sender.send_batch(&self.params.messages).await?;
        info!(
            uuid = %info.uuid,
            count = self.params.messages.len(),
            "Batch delivered"
        );
        Ok(())
    }

    fn on_retry(&self, _error: &JobError) -> RetryDecision {
        RetryDecision::Exponential {
            initial: DELIVERY_BACKOFF_INITIAL,
        }
    }

    fn on_remove(&mut self, completion: &JobCompletion) {
        match completion {
            JobCompletion::Success => {
                debug!(count = self.params.messages.len(), "Delivery job removed")
            }
            JobCompletion::Fail(e) => warn!(
                count = self.params.messages.len(),
                error = %e,
                "Batch delivery abandoned"
            ),
        }
    }
}

/// Creator for delivery jobs; serves fresh scheduling and restore.
pub struct SendBatchCreator;

impl JobCreator for SendBatchCreator {
    fn create(&self, job_type: &str, params: &serde_json::Value) -> Option<Box<dyn Job>> {
        if job_type != SEND_BATCH_JOB_TYPE {
            return None;
        }
        match SendBatchJob::from_params(params) {
            Ok(job) => Some(Box::new(job)),
            Err(e) => {
                warn!(error = %e, "Malformed delivery job params");
                None
            }
        }
    }
}
