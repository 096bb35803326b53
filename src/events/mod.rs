use crate::lot::model::LotStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 알림 채널로 내보내는 도메인 이벤트.
/// 하류 실시간 갱신 계층이 재조회 없이 렌더링할 수 있도록
/// 로트/사용자/금액/시각을 모두 담는다.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    // 신규 입찰 이벤트
    BidPlaced {
        lot_id: Uuid,
        user_id: Uuid,
        bid_amount: Decimal,
        timestamp: DateTime<Utc>,
    },
    // 입찰 수정 이벤트
    BidUpdated {
        lot_id: Uuid,
        user_id: Uuid,
        bid_id: Uuid,
        old_amount: Decimal,
        new_amount: Decimal,
        timestamp: DateTime<Utc>,
    },
    // 로트 상태 전이 이벤트
    LotStatusChanged {
        lot_id: Uuid,
        status: LotStatus,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// 이벤트가 속한 로트 (메시지 키로 사용)
    pub fn lot_id(&self) -> Uuid {
        match self {
            DomainEvent::BidPlaced { lot_id, .. } => *lot_id,
            DomainEvent::BidUpdated { lot_id, .. } => *lot_id,
            DomainEvent::LotStatusChanged { lot_id, .. } => *lot_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::BidPlaced { .. } => "bid_placed",
            DomainEvent::BidUpdated { .. } => "bid_updated",
            DomainEvent::LotStatusChanged { .. } => "lot_status_changed",
        }
    }
}
