/// 도메인 오류 정의
/// 모든 비즈니스 규칙 위반은 쓰기 전에 감지되어 동기적으로 반환된다.
// region:    --- Imports
use crate::lot::model::LotStatus;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Domain Error
/// 도메인 오류
#[derive(Debug, Error)]
pub enum DomainError {
    /// 입력값 검증 실패 (이름 길이, 기준가, 시간 순서 등)
    #[error("{message}")]
    Validation { message: String },

    /// 대상 엔티티 없음
    #[error("{entity}을(를) 찾을 수 없습니다")]
    NotFound { entity: &'static str },

    /// 현재 로트 상태에서 허용되지 않는 작업
    #[error("현재 상태({status})에서는 허용되지 않는 작업입니다")]
    InvalidState { status: LotStatus },

    /// 입찰 가능 시간 밖의 입찰 시도
    #[error("{0}")]
    Window(WindowViolation),

    /// (user, lot) 쌍에 이미 살아있는 입찰이 존재
    #[error("이미 이 로트에 입찰 중입니다. 입찰 수정을 이용하세요")]
    DuplicateBid,

    /// 타인의 입찰 수정 시도
    #[error("본인의 입찰만 수정할 수 있습니다")]
    Forbidden,

    /// 기준가 미달 입찰
    #[error("입찰 금액은 기준가 {base_price} 이상이어야 합니다")]
    BidTooLow { base_price: Decimal },

    /// 다른 로트와 입찰 시간대가 겹침
    #[error("시간대 충돌: 로트 \"{lot_name}\"이(가) 이미 해당 시간대에 예정되어 있습니다")]
    Conflict {
        lot_id: Uuid,
        lot_name: String,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    },

    /// 기존 금액과 동일한 금액으로의 수정
    #[error("새 입찰 금액이 현재 입찰 금액과 같습니다")]
    NoOp,

    /// 입찰 기간 종료 전 낙찰 확정 시도
    #[error("입찰 기간이 끝나기 전에는 낙찰을 확정할 수 없습니다")]
    TooEarly { end_time: Option<DateTime<Utc>> },

    /// 이미 낙찰이 확정된 로트
    #[error("이미 낙찰이 확정된 로트입니다")]
    AlreadyDeclared {
        winner_user_id: Uuid,
        declared_at: DateTime<Utc>,
    },

    /// 낙찰 대상이 될 유효한 입찰 없음
    #[error("낙찰 대상이 될 유효한 입찰이 없습니다")]
    NoBids,

    /// 저장소/트랜잭션 오류. 트랜잭션은 롤백되며 내부 오류로 응답한다.
    #[error("저장소 오류: {0}")]
    Storage(#[from] sqlx::Error),
}

/// 입찰 시간 위반 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    NotStarted,
    Ended,
}

impl std::fmt::Display for WindowViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowViolation::NotStarted => write!(f, "입찰이 아직 시작되지 않았습니다"),
            WindowViolation::Ended => write!(f, "입찰 기간이 이미 종료되었습니다"),
        }
    }
}

impl DomainError {
    /// UI 분기용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation { .. } => "VALIDATION",
            DomainError::NotFound { .. } => "NOT_FOUND",
            DomainError::InvalidState { .. } => "INVALID_STATUS",
            DomainError::Window(WindowViolation::NotStarted) => "NOT_STARTED",
            DomainError::Window(WindowViolation::Ended) => "ALREADY_ENDED",
            DomainError::DuplicateBid => "DUPLICATE_BID",
            DomainError::Forbidden => "FORBIDDEN",
            DomainError::BidTooLow { .. } => "LOW_BID",
            DomainError::Conflict { .. } => "SCHEDULE_CONFLICT",
            DomainError::NoOp => "SAME_AMOUNT",
            DomainError::TooEarly { .. } => "TOO_EARLY",
            DomainError::AlreadyDeclared { .. } => "ALREADY_DECLARED",
            DomainError::NoBids => "NO_BIDS",
            DomainError::Storage(_) => "INTERNAL",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// 오류를 HTTP 응답으로 변환. 저장소 오류는 상세를 숨기고 로그로만 남긴다.
impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        match &self {
            DomainError::InvalidState { status } => {
                body["status"] = json!(status);
            }
            DomainError::BidTooLow { base_price } => {
                body["required_minimum"] = json!(base_price);
            }
            DomainError::Conflict {
                lot_id,
                lot_name,
                start_time,
                end_time,
            } => {
                body["conflict"] = json!({
                    "lot_id": lot_id,
                    "lot_name": lot_name,
                    "start_time": start_time,
                    "end_time": end_time,
                });
            }
            DomainError::TooEarly { end_time } => {
                body["end_time"] = json!(end_time);
            }
            DomainError::AlreadyDeclared {
                winner_user_id,
                declared_at,
            } => {
                body["winner_user_id"] = json!(winner_user_id);
                body["declared_at"] = json!(declared_at);
            }
            DomainError::Storage(e) => {
                error!("{:<12} --> 저장소 오류: {:?}", "Error", e);
                body["error"] = json!("내부 오류가 발생했습니다");
            }
            _ => {}
        }

        (self.status_code(), Json(body)).into_response()
    }
}

/// (user_id, lot_id) 유니크 제약 위반 여부 판별
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .as_deref()
        == Some("23505")
}
// endregion: --- Domain Error
