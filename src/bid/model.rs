use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// 입찰 모델. (user_id, lot_id) 쌍당 살아있는 행은 하나뿐이며
/// 수정은 행을 새로 만들지 않고 금액을 제자리에서 갱신한다.
/// updated_at은 "이 금액에 도달한 시각"으로, 동점 처리의 기준이 된다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lot_id: Uuid,
    pub bid_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 입찰 변경 이력. 수정 시에만 기록되는 추가 전용 감사 로그이며
/// 낙찰 계산은 이 테이블을 읽지 않는다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BidHistoryEntry {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub old_amount: Decimal,
    pub new_amount: Decimal,
    pub edited_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 입찰자 정보가 붙은 입찰 행 (관리자 조회 및 낙찰 계산용)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BidWithBidder {
    pub bid_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub budget: Decimal,
    pub is_active: bool,
    pub bid_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
