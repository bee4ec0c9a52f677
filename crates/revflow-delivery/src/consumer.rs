//! The queue-to-scheduler bridge.

use crate::job::{SendBatchParams, SEND_BATCH_JOB_TYPE};
use crate::sender::DeliveryConfig;
use async_trait::async_trait;
use revflow_events::Message;
use revflow_queue::{ConsumeError, MessageConsumer};
use revflow_scheduler::{JobBuilder, JobScheduler, NetworkKind, QualityOfService};
use tracing::debug;

/// Consumes queue batches by scheduling one persistent delivery job each.
///
/// Consume succeeds once the job is durably scheduled — the queue then
/// deletes the batch from its own storage and the job owns delivery,
/// including waiting out network outages and retrying failed sends.
pub struct DeliveryConsumer {
    config: DeliveryConfig,
    scheduler: JobScheduler,
}

impl DeliveryConsumer {
    /// Creates a consumer that schedules onto the given scheduler.
    ///
    /// The scheduler must have [`SendBatchCreator`](crate::SendBatchCreator)
    /// registered, or every consume will fail.
    pub fn new(config: DeliveryConfig, scheduler: JobScheduler) -> Self {
        Self { config, scheduler }
    }
}

#[async_trait]
impl MessageConsumer for DeliveryConsumer {
    async fn consume(&self, batch: Vec<Message>) -> Result<(), ConsumeError> {
        let count = batch.len();
        let params = SendBatchParams {
            messages: batch,
            configuration: self.config.clone(),
        };
        let params =
            serde_json::to_value(&params).map_err(|e| ConsumeError::Scheduling(e.to_string()))?;

        let uuid = JobBuilder::new(SEND_BATCH_JOB_TYPE)
            .params(params)
            .internet(NetworkKind::Any)
            .persist()
            .retry(-1)
            .service(QualityOfService::Background)
            .schedule(&self.scheduler)
            .await
            .map_err(|e| ConsumeError::Scheduling(e.to_string()))?;

        debug!(uuid = %uuid, count = count, "Delivery job scheduled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SendBatchCreator;
    use revflow_events::{MessageContext, MessageType};
    use revflow_queue::{MessageQueue, QueueOptions};
    use revflow_scheduler::{
        HostNetworkMonitor, JobInfo, JobPersister, MemoryPersister, NetworkStatus,
    };
    use revflow_storage::MemoryStorage;
    use std::sync::Arc;
    use std::time::Duration;

    fn message_with_id(id: &str) -> Message {
        let mut message =
            Message::new(MessageType::Track, MessageContext::default()).with_event("tap");
        message.id = id.to_string();
        message
    }

    /// Scheduler gated offline, so scheduled jobs stay pending and visible.
    async fn offline_scheduler(persister: Arc<MemoryPersister>) -> JobScheduler {
        JobScheduler::builder("delivery-queue")
            .creator(Arc::new(SendBatchCreator))
            .persister(persister)
            .network(Arc::new(HostNetworkMonitor::new(NetworkStatus::Offline)))
            .build()
            .await
    }

    #[tokio::test]
    async fn consume_succeeds_once_the_job_is_durably_scheduled() {
        let persister = Arc::new(MemoryPersister::new());
        let scheduler = offline_scheduler(persister.clone()).await;
        let consumer = DeliveryConsumer::new(DeliveryConfig::new("http://127.0.0.1:9", "k"), scheduler.clone());

        consumer
            .consume(vec![message_with_id("m1"), message_with_id("m2")])
            .await
            .unwrap();

        // The job is persisted with the full batch even though it cannot run
        // yet (network is offline).
        let blobs = persister.restore("delivery-queue");
        assert_eq!(blobs.len(), 1);

        let info = JobInfo::from_json(&blobs[0]).unwrap();
        assert_eq!(info.job_type, SEND_BATCH_JOB_TYPE);
        assert_eq!(info.max_retries, -1);

        let params: SendBatchParams = serde_json::from_value(info.params).unwrap();
        assert_eq!(params.messages.len(), 2);
        assert_eq!(params.messages[0].id, "m1");
        assert_eq!(scheduler.live_count(), 1);
    }

    #[tokio::test]
    async fn consume_fails_without_a_registered_creator() {
        let scheduler = JobScheduler::builder("delivery-queue").build().await;
        let consumer = DeliveryConsumer::new(DeliveryConfig::new("http://127.0.0.1:9", "k"), scheduler);

        let err = consumer.consume(vec![message_with_id("m1")]).await.unwrap_err();
        assert!(matches!(err, ConsumeError::Scheduling(_)));
    }

    #[tokio::test]
    async fn queue_hands_batches_off_and_empties_itself() {
        let persister = Arc::new(MemoryPersister::new());
        let scheduler = offline_scheduler(persister.clone()).await;
        let consumer = Arc::new(DeliveryConsumer::new(
            DeliveryConfig::new("http://127.0.0.1:9", "k"),
            scheduler,
        ));

        let queue = MessageQueue::with_storage(
            "main",
            Arc::new(MemoryStorage::new()),
            QueueOptions::windowed(Duration::from_secs(10), 2),
            consumer,
        );
        queue.start_runloop().await;

        queue.emit(message_with_id("m1")).await;
        queue.emit(message_with_id("m2")).await;

        // The batch left the queue's storage and lives in the delivery job.
        assert_eq!(queue.size().await.unwrap(), 0);
        assert_eq!(persister.restore("delivery-queue").len(), 1);
    }
}
