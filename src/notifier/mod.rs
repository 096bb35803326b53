/// 알림 싱크: 엔진이 커밋 이후 단방향으로 이벤트를 내보내는 채널.
/// 발행 실패는 커밋된 결과에 영향을 주지 않는다 (로그만 남김).
// region:    --- Imports
use crate::events::DomainEvent;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Notification Sink Trait
/// 알림 싱크 트레이트
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<(), String>;
}

/// 커밋 이후 발행 전용 헬퍼. 실패해도 작업 결과에 전파하지 않는다.
pub async fn emit_best_effort(sink: &dyn NotificationSink, event: DomainEvent) {
    if let Err(e) = sink.publish(&event).await {
        warn!(
            "{:<12} --> 이벤트 발행 실패(무시): kind={}, {}",
            "Notifier",
            event.kind(),
            e
        );
    }
}
// endregion: --- Notification Sink Trait

// region:    --- Kafka Notifier
/// Kafka 기반 알림 싱크. 엔진은 쓰기만 하고 소비하지 않는다.
pub struct KafkaNotifier {
    producer: FutureProducer,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(brokers: &str, topic: &str) -> Self {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .expect("Producer creation error");

        KafkaNotifier {
            producer,
            topic: topic.to_string(),
        }
    }

    /// 환경 변수로부터 생성 (KAFKA_BROKERS, NOTIFY_TOPIC)
    pub fn from_env() -> Self {
        let brokers =
            std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());
        let topic =
            std::env::var("NOTIFY_TOPIC").unwrap_or_else(|_| "auction-events".to_string());
        Self::new(&brokers, &topic)
    }
}

#[async_trait]
impl NotificationSink for KafkaNotifier {
    async fn publish(&self, event: &DomainEvent) -> Result<(), String> {
        info!(
            "{:<12} --> 이벤트 발행: topic={}, kind={}",
            "Notifier", self.topic, event.kind()
        );
        let key = event.lot_id().to_string();
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;
        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }
}
// endregion: --- Kafka Notifier

// region:    --- Noop Notifier
/// 발행을 생략하는 싱크 (테스트 및 브로커 없는 환경용)
pub struct NoopNotifier;

#[async_trait]
impl NotificationSink for NoopNotifier {
    async fn publish(&self, _event: &DomainEvent) -> Result<(), String> {
        Ok(())
    }
}
// endregion: --- Noop Notifier
