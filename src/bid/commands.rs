/// 입찰 엔진 커맨드
/// 1. 입찰 등록 (최초 1회, 이력 없음)
/// 2. 입찰 수정 (이력 기록 후 금액 갱신)
// region:    --- Imports
use crate::bid::model::Bid;
use crate::database::DatabaseManager;
use crate::error::{is_unique_violation, DomainError, WindowViolation};
use crate::events::DomainEvent;
use crate::lot::model::{Lot, LotStatus};
use crate::notifier::{emit_best_effort, NotificationSink};
use crate::query;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Commands
/// 입찰 등록 명령 (호출자 식별은 인증 계층이 넘겨준다)
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBidCommand {
    pub lot_id: Uuid,
    pub bid_amount: Decimal,
}

/// 입찰 수정 명령
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBidCommand {
    pub bid_amount: Decimal,
}
// endregion: --- Commands

// region:    --- Mutation SQL
const INSERT_BID: &str = r#"
    INSERT INTO bids (id, user_id, lot_id, bid_amount)
    VALUES ($1, $2, $3, $4)
    RETURNING id, user_id, lot_id, bid_amount, created_at, updated_at, deleted_at
"#;

const INSERT_BID_HISTORY: &str = r#"
    INSERT INTO bid_histories (id, bid_id, old_amount, new_amount)
    VALUES ($1, $2, $3, $4)
"#;

// updated_at 갱신이 동점 처리의 기준이므로 수정 경로는 반드시 now()를 쓴다
const UPDATE_BID_AMOUNT: &str = r#"
    UPDATE bids
    SET bid_amount = $2, updated_at = now()
    WHERE id = $1
    RETURNING id, user_id, lot_id, bid_amount, created_at, updated_at, deleted_at
"#;
// endregion: --- Mutation SQL

// region:    --- Bid Rules
/// 입찰 가능 시간 검사. 시각이 설정된 경우에만 해당 경계를 검사한다.
/// 상태가 아직 ACTIVE여도 종료 시각이 지났으면 거부된다.
pub fn check_bid_window(lot: &Lot, now: DateTime<Utc>) -> Result<(), DomainError> {
    if let Some(start) = lot.start_time {
        if now < start {
            return Err(DomainError::Window(WindowViolation::NotStarted));
        }
    }
    if let Some(end) = lot.end_time {
        if now > end {
            return Err(DomainError::Window(WindowViolation::Ended));
        }
    }
    Ok(())
}

/// 입찰 공통 규칙. 상태 → 시간 → 기준가 순으로 검사한다.
pub fn check_bid_rules(lot: &Lot, amount: Decimal, now: DateTime<Utc>) -> Result<(), DomainError> {
    if lot.status != LotStatus::Active {
        return Err(DomainError::InvalidState { status: lot.status });
    }
    check_bid_window(lot, now)?;
    if amount < lot.base_price {
        return Err(DomainError::BidTooLow {
            base_price: lot.base_price,
        });
    }
    Ok(())
}
// endregion: --- Bid Rules

// region:    --- Bid Commands
/// 입찰 등록. 한 트랜잭션 안에서 검증과 삽입을 수행하고
/// 커밋 후에 bid_placed 이벤트를 발행한다 (발행 실패는 무시).
pub async fn place_bid(
    db: &DatabaseManager,
    notifier: &dyn NotificationSink,
    user_id: Uuid,
    cmd: PlaceBidCommand,
) -> Result<Bid, DomainError> {
    info!(
        "{:<12} --> 입찰 요청: user={}, {:?}",
        "BidCmd", user_id, cmd
    );
    let lot_id = cmd.lot_id;
    let amount = cmd.bid_amount;

    let bid = db
        .transaction(|tx| {
            Box::pin(async move {
                let lot = sqlx::query_as::<_, Lot>(query::queries::GET_LOT)
                    .bind(lot_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(DomainError::NotFound { entity: "로트" })?;

                check_bid_rules(&lot, amount, Utc::now())?;

                // 선제 중복 확인. 동시 요청은 (user_id, lot_id) 유니크 제약이
                // 최종적으로 막고, 그 위반은 DuplicateBid로 번역된다.
                let existing = sqlx::query_as::<_, Bid>(query::queries::FIND_OWN_BID)
                    .bind(user_id)
                    .bind(lot_id)
                    .fetch_optional(&mut **tx)
                    .await?;
                if existing.is_some() {
                    return Err(DomainError::DuplicateBid);
                }

                match sqlx::query_as::<_, Bid>(INSERT_BID)
                    .bind(Uuid::new_v4())
                    .bind(user_id)
                    .bind(lot_id)
                    .bind(amount)
                    .fetch_one(&mut **tx)
                    .await
                {
                    Ok(bid) => Ok(bid),
                    Err(e) if is_unique_violation(&e) => Err(DomainError::DuplicateBid),
                    Err(e) => Err(e.into()),
                }
            })
        })
        .await?;

    info!("{:<12} --> 입찰 등록 완료: {}", "BidCmd", bid.id);
    emit_best_effort(
        notifier,
        DomainEvent::BidPlaced {
            lot_id: bid.lot_id,
            user_id: bid.user_id,
            bid_amount: bid.bid_amount,
            timestamp: bid.created_at,
        },
    )
    .await;
    Ok(bid)
}

/// 입찰 수정. 본인 입찰만 수정할 수 있고, 등록과 동일한 규칙을 재검사한다.
/// 한 트랜잭션 안에서 이력(old → new)을 먼저 쓰고 금액을 갱신한다.
/// 반환값은 (갱신된 입찰, 이전 금액).
pub async fn update_bid(
    db: &DatabaseManager,
    notifier: &dyn NotificationSink,
    user_id: Uuid,
    bid_id: Uuid,
    cmd: UpdateBidCommand,
) -> Result<(Bid, Decimal), DomainError> {
    info!(
        "{:<12} --> 입찰 수정 요청: user={}, bid={}, {:?}",
        "BidCmd", user_id, bid_id, cmd
    );
    let new_amount = cmd.bid_amount;

    let (updated, old_amount) = db
        .transaction(|tx| {
            Box::pin(async move {
                let bid = sqlx::query_as::<_, Bid>(query::queries::GET_BID_FOR_UPDATE)
                    .bind(bid_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(DomainError::NotFound { entity: "입찰" })?;

                if bid.user_id != user_id {
                    return Err(DomainError::Forbidden);
                }

                let lot = sqlx::query_as::<_, Lot>(query::queries::GET_LOT)
                    .bind(bid.lot_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(DomainError::NotFound { entity: "로트" })?;

                check_bid_rules(&lot, new_amount, Utc::now())?;

                if new_amount == bid.bid_amount {
                    return Err(DomainError::NoOp);
                }

                sqlx::query(INSERT_BID_HISTORY)
                    .bind(Uuid::new_v4())
                    .bind(bid.id)
                    .bind(bid.bid_amount)
                    .bind(new_amount)
                    .execute(&mut **tx)
                    .await?;

                let updated = sqlx::query_as::<_, Bid>(UPDATE_BID_AMOUNT)
                    .bind(bid.id)
                    .bind(new_amount)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok((updated, bid.bid_amount))
            })
        })
        .await?;

    info!(
        "{:<12} --> 입찰 수정 완료: {} ({} → {})",
        "BidCmd", updated.id, old_amount, updated.bid_amount
    );
    emit_best_effort(
        notifier,
        DomainEvent::BidUpdated {
            lot_id: updated.lot_id,
            user_id: updated.user_id,
            bid_id: updated.id,
            old_amount,
            new_amount: updated.bid_amount,
            timestamp: updated.updated_at,
        },
    )
    .await;
    Ok((updated, old_amount))
}
// endregion: --- Bid Commands

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn lot_with(status: LotStatus, start_offset: i64, end_offset: i64) -> Lot {
        let now = base_time();
        Lot {
            id: Uuid::new_v4(),
            lot_name: "테스트 로트".to_string(),
            base_price: dec!(1000),
            status,
            start_time: Some(now + Duration::minutes(start_offset)),
            end_time: Some(now + Duration::minutes(end_offset)),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_bid_rejected_unless_lot_active() {
        let now = base_time();
        for status in [LotStatus::Draft, LotStatus::Closed, LotStatus::Sold] {
            let lot = lot_with(status, -60, 60);
            let err = check_bid_rules(&lot, dec!(1500), now).unwrap_err();
            assert!(matches!(err, DomainError::InvalidState { .. }));
        }
    }

    #[test]
    fn test_bid_rejected_before_window_opens() {
        let lot = lot_with(LotStatus::Active, 10, 60);
        let err = check_bid_rules(&lot, dec!(1500), base_time()).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Window(WindowViolation::NotStarted)
        ));
    }

    #[test]
    fn test_bid_rejected_after_window_even_if_still_active() {
        // 스케줄러가 아직 상태를 안 바꿨어도 종료 시각이 지났으면 거부
        let lot = lot_with(LotStatus::Active, -120, -10);
        let err = check_bid_rules(&lot, dec!(1500), base_time()).unwrap_err();
        assert!(matches!(err, DomainError::Window(WindowViolation::Ended)));
    }

    #[test]
    fn test_bid_below_base_price_rejected() {
        let lot = lot_with(LotStatus::Active, -60, 60);
        let err = check_bid_rules(&lot, dec!(999.99), base_time()).unwrap_err();
        assert!(matches!(err, DomainError::BidTooLow { .. }));
    }

    #[test]
    fn test_bid_at_base_price_accepted() {
        let lot = lot_with(LotStatus::Active, -60, 60);
        assert!(check_bid_rules(&lot, dec!(1000), base_time()).is_ok());
    }

    #[test]
    fn test_unscheduled_boundaries_are_not_checked() {
        let mut lot = lot_with(LotStatus::Active, -60, 60);
        lot.start_time = None;
        lot.end_time = None;
        assert!(check_bid_rules(&lot, dec!(1000), base_time()).is_ok());
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let lot = lot_with(LotStatus::Active, -60, 0);
        // 종료 시각 정각까지는 허용
        assert!(check_bid_window(&lot, base_time()).is_ok());
    }
}
// endregion: --- Tests
