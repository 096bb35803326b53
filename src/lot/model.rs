use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// region:    --- Lot Status
/// 로트 상태. DRAFT → ACTIVE → CLOSED → SOLD 순으로 전이하며
/// 재일정 시에만 DRAFT로 되돌아간다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LotStatus {
    Draft,
    Active,
    Closed,
    Sold,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Draft => "DRAFT",
            LotStatus::Active => "ACTIVE",
            LotStatus::Closed => "CLOSED",
            LotStatus::Sold => "SOLD",
        }
    }

    /// 편집/재일정/삭제가 허용되는 상태 (DRAFT, CLOSED)
    pub fn is_mutable(&self) -> bool {
        matches!(self, LotStatus::Draft | LotStatus::Closed)
    }
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 저장된 상태 문자열이 네 가지 상태 중 어느 것도 아닐 때의 디코드 오류
#[derive(Debug)]
pub struct ParseLotStatusError(String);

impl std::fmt::Display for ParseLotStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown lot status: {}", self.0)
    }
}

impl std::error::Error for ParseLotStatusError {}

impl TryFrom<String> for LotStatus {
    type Error = ParseLotStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "DRAFT" => Ok(LotStatus::Draft),
            "ACTIVE" => Ok(LotStatus::Active),
            "CLOSED" => Ok(LotStatus::Closed),
            "SOLD" => Ok(LotStatus::Sold),
            _ => Err(ParseLotStatusError(value)),
        }
    }
}
// endregion: --- Lot Status

// region:    --- Lot Model
/// 로트(다이아몬드) 모델
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Lot {
    pub id: Uuid,
    pub lot_name: String,
    pub base_price: Decimal,
    #[sqlx(try_from = "String")]
    pub status: LotStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 사용자 카탈로그 조회용 행: 로트 + 본인 입찰 + 결과 여부를 한 번에 조인
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AvailableLotRow {
    pub id: Uuid,
    pub lot_name: String,
    pub base_price: Decimal,
    #[sqlx(try_from = "String")]
    pub status: LotStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub bid_id: Option<Uuid>,
    pub bid_amount: Option<Decimal>,
    pub bid_updated_at: Option<DateTime<Utc>>,
    pub result_id: Option<Uuid>,
    pub winner_user_id: Option<Uuid>,
}
// endregion: --- Lot Model
