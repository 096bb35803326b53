use crate::lot::model::LotStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// 낙찰 결과. 로트당 한 번만 생성되며 이후 수정되지 않는다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuctionResult {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub winner_user_id: Uuid,
    pub winning_bid_amount: Decimal,
    pub declared_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 낙찰자 정보가 붙은 결과 행 (관리자 조회용)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResultWithWinner {
    pub result_id: Uuid,
    pub lot_id: Uuid,
    pub winner_user_id: Uuid,
    pub winner_name: String,
    pub winner_email: String,
    pub winner_budget: Decimal,
    pub winner_is_active: bool,
    pub winning_bid_amount: Decimal,
    pub declared_at: DateTime<Utc>,
}

/// 결과 목록 행 (로트/낙찰자 요약 포함)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResultListRow {
    pub result_id: Uuid,
    pub lot_id: Uuid,
    pub lot_name: String,
    pub base_price: Decimal,
    #[sqlx(try_from = "String")]
    pub lot_status: LotStatus,
    pub winner_user_id: Uuid,
    pub winner_name: String,
    pub winner_email: String,
    pub winning_bid_amount: Decimal,
    pub declared_at: DateTime<Utc>,
}

/// 낙찰 확정 직후 응답에 쓰이는 요약
#[derive(Debug, Clone, Serialize)]
pub struct DeclaredResult {
    pub result: AuctionResult,
    pub lot_name: String,
    pub winner_name: String,
    pub total_bids: usize,
    pub active_bids: usize,
}
