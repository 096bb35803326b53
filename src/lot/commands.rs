/// 로트 수명주기 커맨드
/// 생성 → 활성화 → 마감 → (낙찰) 전이와 편집/재일정/삭제를 담당한다.
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::DomainError;
use crate::events::DomainEvent;
use crate::lot::model::{Lot, LotStatus};
use crate::notifier::{emit_best_effort, NotificationSink};
use crate::query;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Commands
/// 로트 생성 명령
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLotCommand {
    pub lot_name: String,
    pub base_price: Decimal,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// 로트 편집 명령 (일정과 상태는 건드리지 않는다)
#[derive(Debug, Clone, Deserialize)]
pub struct EditLotCommand {
    pub lot_name: Option<String>,
    pub base_price: Option<Decimal>,
}

/// 로트 재일정 명령. 성공 시 상태는 무조건 DRAFT로 재설정된다.
#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleLotCommand {
    pub lot_name: Option<String>,
    pub base_price: Option<Decimal>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
// endregion: --- Commands

// region:    --- Mutation SQL
const INSERT_LOT: &str = r#"
    INSERT INTO lots (id, lot_name, base_price, status, start_time, end_time)
    VALUES ($1, $2, $3, 'DRAFT', $4, $5)
    RETURNING id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
"#;

const UPDATE_LOT_FIELDS: &str = r#"
    UPDATE lots
    SET lot_name = COALESCE($2, lot_name),
        base_price = COALESCE($3, base_price),
        updated_at = now()
    WHERE id = $1
    RETURNING id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
"#;

const RESCHEDULE_LOT: &str = r#"
    UPDATE lots
    SET lot_name = COALESCE($2, lot_name),
        base_price = COALESCE($3, base_price),
        start_time = $4,
        end_time = $5,
        status = 'DRAFT',
        updated_at = now()
    WHERE id = $1
    RETURNING id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
"#;

const UPDATE_LOT_STATUS: &str = r#"
    UPDATE lots
    SET status = $2, updated_at = now()
    WHERE id = $1
    RETURNING id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
"#;

// 연쇄 소프트 삭제는 이력 → 입찰 → 결과 → 로트 순서를 지킨다
const SOFT_DELETE_HISTORIES_FOR_LOT: &str = r#"
    UPDATE bid_histories
    SET deleted_at = now()
    WHERE deleted_at IS NULL
      AND bid_id IN (SELECT id FROM bids WHERE lot_id = $1 AND deleted_at IS NULL)
"#;

const SOFT_DELETE_BIDS_FOR_LOT: &str = r#"
    UPDATE bids SET deleted_at = now() WHERE deleted_at IS NULL AND lot_id = $1
"#;

const SOFT_DELETE_RESULT_FOR_LOT: &str = r#"
    UPDATE results SET deleted_at = now() WHERE deleted_at IS NULL AND lot_id = $1
"#;

const SOFT_DELETE_LOT: &str = r#"
    UPDATE lots SET deleted_at = now() WHERE id = $1
"#;
// endregion: --- Mutation SQL

// region:    --- Validation
/// 로트 이름 길이 검증 ([2, 255]자)
pub fn validate_lot_name(name: &str) -> Result<(), DomainError> {
    let len = name.chars().count();
    if !(2..=255).contains(&len) {
        return Err(DomainError::Validation {
            message: "로트 이름은 2자 이상 255자 이하여야 합니다".to_string(),
        });
    }
    Ok(())
}

/// 기준가 검증 (0보다 커야 한다)
pub fn validate_base_price(base_price: Decimal) -> Result<(), DomainError> {
    if base_price <= Decimal::ZERO {
        return Err(DomainError::Validation {
            message: "기준가는 0보다 커야 합니다".to_string(),
        });
    }
    Ok(())
}

/// 입찰 시간대 순서 검증 (종료가 시작 이후여야 한다)
pub fn validate_schedule(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<(), DomainError> {
    if end_time <= start_time {
        return Err(DomainError::Validation {
            message: "입찰 종료 시각은 시작 시각 이후여야 합니다".to_string(),
        });
    }
    Ok(())
}

/// 두 입찰 시간대의 겹침 판정. 경계가 맞닿기만 한 경우는 겹침이 아니다.
/// 네 가지 구간 관계를 모두 검사한다: 새 구간이 기존 구간 안에서 시작,
/// 안에서 끝, 기존 구간을 포함, 기존 구간에 포함.
pub fn windows_overlap(
    new_start: DateTime<Utc>,
    new_end: DateTime<Utc>,
    existing_start: Option<DateTime<Utc>>,
    existing_end: Option<DateTime<Utc>>,
) -> bool {
    let (Some(start), Some(end)) = (existing_start, existing_end) else {
        return false;
    };
    (start <= new_start && end > new_start)
        || (start < new_end && end >= new_end)
        || (start >= new_start && end <= new_end)
        || (start <= new_start && end >= new_end)
}

/// 살아있는 DRAFT/ACTIVE 로트와의 시간대 충돌 검사 (재일정 시 자신은 제외)
async fn ensure_no_conflict(
    tx: &mut Transaction<'_, Postgres>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Result<(), DomainError> {
    let candidates = sqlx::query_as::<_, Lot>(query::queries::CANDIDATE_WINDOW_LOTS)
        .fetch_all(&mut **tx)
        .await?;

    for lot in candidates {
        if Some(lot.id) == exclude {
            continue;
        }
        if windows_overlap(start_time, end_time, lot.start_time, lot.end_time) {
            return Err(DomainError::Conflict {
                lot_id: lot.id,
                lot_name: lot.lot_name,
                start_time: lot.start_time,
                end_time: lot.end_time,
            });
        }
    }
    Ok(())
}

/// 살아있는 로트를 행 잠금과 함께 조회
async fn fetch_lot_for_update(
    tx: &mut Transaction<'_, Postgres>,
    lot_id: Uuid,
) -> Result<Lot, DomainError> {
    sqlx::query_as::<_, Lot>(query::queries::GET_LOT_FOR_UPDATE)
        .bind(lot_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(DomainError::NotFound { entity: "로트" })
}
// endregion: --- Validation

// region:    --- Lot Commands
/// 로트 생성. 검증과 충돌 검사를 통과하면 DRAFT 상태로 만들어진다.
pub async fn create_lot(db: &DatabaseManager, cmd: CreateLotCommand) -> Result<Lot, DomainError> {
    info!("{:<12} --> 로트 생성 요청: {:?}", "LotCmd", cmd);
    validate_lot_name(&cmd.lot_name)?;
    validate_base_price(cmd.base_price)?;
    validate_schedule(cmd.start_time, cmd.end_time)?;

    let lot = db
        .transaction(|tx| {
            Box::pin(async move {
                ensure_no_conflict(tx, cmd.start_time, cmd.end_time, None).await?;

                let lot = sqlx::query_as::<_, Lot>(INSERT_LOT)
                    .bind(Uuid::new_v4())
                    .bind(&cmd.lot_name)
                    .bind(cmd.base_price)
                    .bind(cmd.start_time)
                    .bind(cmd.end_time)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(lot)
            })
        })
        .await?;

    info!(
        "{:<12} --> 로트 생성 완료: {} ({})",
        "LotCmd", lot.lot_name, lot.id
    );
    Ok(lot)
}

/// 로트 편집. DRAFT 또는 CLOSED 상태에서만 허용되며 일정/상태는 바꾸지 않는다.
pub async fn edit_lot(
    db: &DatabaseManager,
    lot_id: Uuid,
    cmd: EditLotCommand,
) -> Result<Lot, DomainError> {
    info!("{:<12} --> 로트 편집 요청: {} {:?}", "LotCmd", lot_id, cmd);
    if let Some(name) = cmd.lot_name.as_deref() {
        validate_lot_name(name)?;
    }
    if let Some(price) = cmd.base_price {
        validate_base_price(price)?;
    }

    db.transaction(|tx| {
        Box::pin(async move {
            let lot = fetch_lot_for_update(tx, lot_id).await?;
            if !lot.status.is_mutable() {
                return Err(DomainError::InvalidState { status: lot.status });
            }

            let updated = sqlx::query_as::<_, Lot>(UPDATE_LOT_FIELDS)
                .bind(lot_id)
                .bind(&cmd.lot_name)
                .bind(cmd.base_price)
                .fetch_one(&mut **tx)
                .await?;
            Ok(updated)
        })
    })
    .await
}

/// 로트 재일정. 생성과 동일한 검증/충돌 검사를 거치며(자신 제외)
/// 성공하면 이전 상태와 무관하게 DRAFT로 재설정된다.
pub async fn reschedule_lot(
    db: &DatabaseManager,
    lot_id: Uuid,
    cmd: RescheduleLotCommand,
) -> Result<Lot, DomainError> {
    info!("{:<12} --> 로트 재일정 요청: {} {:?}", "LotCmd", lot_id, cmd);
    if let Some(name) = cmd.lot_name.as_deref() {
        validate_lot_name(name)?;
    }
    if let Some(price) = cmd.base_price {
        validate_base_price(price)?;
    }
    validate_schedule(cmd.start_time, cmd.end_time)?;

    let lot = db
        .transaction(|tx| {
            Box::pin(async move {
                let lot = fetch_lot_for_update(tx, lot_id).await?;
                if !lot.status.is_mutable() {
                    return Err(DomainError::InvalidState { status: lot.status });
                }

                ensure_no_conflict(tx, cmd.start_time, cmd.end_time, Some(lot_id)).await?;

                let updated = sqlx::query_as::<_, Lot>(RESCHEDULE_LOT)
                    .bind(lot_id)
                    .bind(&cmd.lot_name)
                    .bind(cmd.base_price)
                    .bind(cmd.start_time)
                    .bind(cmd.end_time)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(updated)
            })
        })
        .await?;

    info!(
        "{:<12} --> 로트 재일정 완료 (상태 DRAFT로 재설정): {}",
        "LotCmd", lot.id
    );
    Ok(lot)
}

/// 로트 수동 활성화 (DRAFT → ACTIVE)
pub async fn activate_lot(
    db: &DatabaseManager,
    notifier: &dyn NotificationSink,
    lot_id: Uuid,
) -> Result<Lot, DomainError> {
    info!("{:<12} --> 로트 활성화 요청: {}", "LotCmd", lot_id);

    let lot = db
        .transaction(|tx| {
            Box::pin(async move {
                let lot = fetch_lot_for_update(tx, lot_id).await?;
                if lot.status != LotStatus::Draft {
                    return Err(DomainError::InvalidState { status: lot.status });
                }

                let updated = sqlx::query_as::<_, Lot>(UPDATE_LOT_STATUS)
                    .bind(lot_id)
                    .bind(LotStatus::Active.as_str())
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(updated)
            })
        })
        .await?;

    info!("{:<12} --> 로트 활성화 완료: {}", "LotCmd", lot.id);
    emit_best_effort(
        notifier,
        DomainEvent::LotStatusChanged {
            lot_id: lot.id,
            status: lot.status,
            timestamp: lot.updated_at,
        },
    )
    .await;
    Ok(lot)
}

/// 로트 조기 마감 (ACTIVE → CLOSED).
/// 마감 후 앞당길 수 있는 차기 DRAFT 로트 목록을 안내용으로 함께 돌려준다.
/// 안내는 제안일 뿐이며 어떤 상태도 자동으로 바꾸지 않는다.
pub async fn close_lot(
    db: &DatabaseManager,
    notifier: &dyn NotificationSink,
    lot_id: Uuid,
) -> Result<(Lot, Vec<Lot>), DomainError> {
    info!("{:<12} --> 로트 마감 요청: {}", "LotCmd", lot_id);

    let lot = db
        .transaction(|tx| {
            Box::pin(async move {
                let lot = fetch_lot_for_update(tx, lot_id).await?;
                if lot.status != LotStatus::Active {
                    return Err(DomainError::InvalidState { status: lot.status });
                }

                let updated = sqlx::query_as::<_, Lot>(UPDATE_LOT_STATUS)
                    .bind(lot_id)
                    .bind(LotStatus::Closed.as_str())
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(updated)
            })
        })
        .await?;

    let upcoming = query::handlers::upcoming_draft_lots(db).await?;

    info!("{:<12} --> 로트 마감 완료: {}", "LotCmd", lot.lot_name);
    if !upcoming.is_empty() {
        info!(
            "{:<12} --> 앞당길 수 있는 차기 DRAFT 로트 {}건",
            "LotCmd",
            upcoming.len()
        );
    }

    emit_best_effort(
        notifier,
        DomainEvent::LotStatusChanged {
            lot_id: lot.id,
            status: lot.status,
            timestamp: lot.updated_at,
        },
    )
    .await;
    Ok((lot, upcoming))
}

/// 로트 삭제. DRAFT/CLOSED 상태에서만 허용되며 한 트랜잭션 안에서
/// 이력 → 입찰 → 결과 → 로트 순으로 연쇄 소프트 삭제한다.
pub async fn delete_lot(db: &DatabaseManager, lot_id: Uuid) -> Result<Lot, DomainError> {
    info!("{:<12} --> 로트 삭제 요청: {}", "LotCmd", lot_id);

    let lot = db
        .transaction(|tx| {
            Box::pin(async move {
                let lot = fetch_lot_for_update(tx, lot_id).await?;
                if !lot.status.is_mutable() {
                    return Err(DomainError::InvalidState { status: lot.status });
                }

                let histories = sqlx::query(SOFT_DELETE_HISTORIES_FOR_LOT)
                    .bind(lot_id)
                    .execute(&mut **tx)
                    .await?;
                let bids = sqlx::query(SOFT_DELETE_BIDS_FOR_LOT)
                    .bind(lot_id)
                    .execute(&mut **tx)
                    .await?;
                sqlx::query(SOFT_DELETE_RESULT_FOR_LOT)
                    .bind(lot_id)
                    .execute(&mut **tx)
                    .await?;
                sqlx::query(SOFT_DELETE_LOT)
                    .bind(lot_id)
                    .execute(&mut **tx)
                    .await?;

                info!(
                    "{:<12} --> 연쇄 소프트 삭제: 이력 {}건, 입찰 {}건",
                    "LotCmd",
                    histories.rows_affected(),
                    bids.rows_affected()
                );
                Ok(lot)
            })
        })
        .await?;

    info!(
        "{:<12} --> 로트 삭제 완료: {} (삭제 시점 상태: {})",
        "LotCmd", lot.lot_name, lot.status
    );
    Ok(lot)
}
// endregion: --- Lot Commands

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_lot_name_length() {
        assert!(validate_lot_name("블루 다이아몬드").is_ok());
        assert!(validate_lot_name("a").is_err());
        assert!(validate_lot_name(&"x".repeat(256)).is_err());
        assert!(validate_lot_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_base_price_positive() {
        assert!(validate_base_price(dec!(0.01)).is_ok());
        assert!(validate_base_price(Decimal::ZERO).is_err());
        assert!(validate_base_price(dec!(-10)).is_err());
    }

    #[test]
    fn test_validate_schedule_ordering() {
        assert!(validate_schedule(at(10), at(12)).is_ok());
        assert!(validate_schedule(at(12), at(12)).is_err());
        assert!(validate_schedule(at(12), at(10)).is_err());
    }

    #[test]
    fn test_overlap_new_ends_inside_existing() {
        // 기존 [11, 13) 안에서 끝나는 새 구간 [10, 12) → 충돌
        assert!(windows_overlap(at(10), at(12), Some(at(11)), Some(at(13))));
    }

    #[test]
    fn test_overlap_new_starts_inside_existing() {
        assert!(windows_overlap(at(12), at(14), Some(at(11)), Some(at(13))));
    }

    #[test]
    fn test_overlap_containment_both_ways() {
        assert!(windows_overlap(at(9), at(15), Some(at(11)), Some(at(13))));
        assert!(windows_overlap(at(11), at(12), Some(at(10)), Some(at(14))));
    }

    #[test]
    fn test_touching_windows_do_not_overlap() {
        // 경계가 맞닿기만 한 [12, 13)은 기존 [10, 12)와 충돌하지 않는다
        assert!(!windows_overlap(at(12), at(13), Some(at(10)), Some(at(12))));
        assert!(!windows_overlap(at(8), at(10), Some(at(10)), Some(at(12))));
    }

    #[test]
    fn test_unscheduled_lot_never_conflicts() {
        assert!(!windows_overlap(at(10), at(12), None, None));
        assert!(!windows_overlap(at(10), at(12), Some(at(11)), None));
    }
}
// endregion: --- Tests
