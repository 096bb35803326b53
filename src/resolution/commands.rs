/// 낙찰 확정 커맨드
/// 상태 검사부터 결과 기록과 SOLD 전이까지 로트 행 잠금 아래
/// 한 트랜잭션으로 수행한다. 늦은 입찰이 확정 이후에 끼어들 수 없다.
// region:    --- Imports
use crate::bid::model::BidWithBidder;
use crate::database::DatabaseManager;
use crate::error::DomainError;
use crate::events::DomainEvent;
use crate::lot::model::{Lot, LotStatus};
use crate::notifier::{emit_best_effort, NotificationSink};
use crate::query;
use crate::resolution::model::{AuctionResult, DeclaredResult};
use crate::resolution::winner::select_winner;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Mutation SQL
const INSERT_RESULT: &str = r#"
    INSERT INTO results (id, lot_id, winner_user_id, winning_bid_amount)
    VALUES ($1, $2, $3, $4)
    RETURNING id, lot_id, winner_user_id, winning_bid_amount, declared_at, deleted_at
"#;

const MARK_LOT_SOLD: &str = r#"
    UPDATE lots SET status = 'SOLD', updated_at = now() WHERE id = $1
"#;
// endregion: --- Mutation SQL

// region:    --- Declare Result
/// 낙찰 확정.
/// 1. 로트 존재 확인 (행 잠금)
/// 2. CLOSED 상태이거나 종료 시각이 지났어야 한다
/// 3. 기존 결과가 없어야 한다
/// 4. 비활성 사용자 입찰을 제외하고 동점 규칙으로 낙찰자 선정
/// 5. 결과 기록 + 로트 SOLD 전이
pub async fn declare_result(
    db: &DatabaseManager,
    notifier: &dyn NotificationSink,
    lot_id: Uuid,
) -> Result<DeclaredResult, DomainError> {
    info!("{:<12} --> 낙찰 확정 요청: {}", "Resolution", lot_id);

    let declared = db
        .transaction(|tx| {
            Box::pin(async move {
                let lot = sqlx::query_as::<_, Lot>(query::queries::GET_LOT_FOR_UPDATE)
                    .bind(lot_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(DomainError::NotFound { entity: "로트" })?;

                // 명시적 CLOSED 전이가 아직 안 돌았어도 종료 시각 경과는 마감으로 본다
                let now = Utc::now();
                let deadline_passed = lot.end_time.map(|end| now >= end).unwrap_or(false);
                if lot.status != LotStatus::Closed && !deadline_passed {
                    return Err(DomainError::TooEarly {
                        end_time: lot.end_time,
                    });
                }

                if let Some(existing) =
                    sqlx::query_as::<_, AuctionResult>(query::queries::GET_RESULT_BY_LOT)
                        .bind(lot_id)
                        .fetch_optional(&mut **tx)
                        .await?
                {
                    return Err(DomainError::AlreadyDeclared {
                        winner_user_id: existing.winner_user_id,
                        declared_at: existing.declared_at,
                    });
                }

                let bids =
                    sqlx::query_as::<_, BidWithBidder>(query::queries::LIST_BIDS_WITH_BIDDERS)
                        .bind(lot_id)
                        .fetch_all(&mut **tx)
                        .await?;

                let total_bids = bids.len();
                let active_bids = bids.iter().filter(|b| b.is_active).count();
                let winner = select_winner(&bids).cloned().ok_or(DomainError::NoBids)?;

                let result = sqlx::query_as::<_, AuctionResult>(INSERT_RESULT)
                    .bind(Uuid::new_v4())
                    .bind(lot_id)
                    .bind(winner.user_id)
                    .bind(winner.bid_amount)
                    .fetch_one(&mut **tx)
                    .await?;

                sqlx::query(MARK_LOT_SOLD)
                    .bind(lot_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(DeclaredResult {
                    result,
                    lot_name: lot.lot_name,
                    winner_name: winner.user_name,
                    total_bids,
                    active_bids,
                })
            })
        })
        .await?;

    info!(
        "{:<12} --> 낙찰 확정: {} (낙찰자: {}, 금액: {})",
        "Resolution",
        declared.result.id,
        declared.winner_name,
        declared.result.winning_bid_amount
    );
    emit_best_effort(
        notifier,
        DomainEvent::LotStatusChanged {
            lot_id,
            status: LotStatus::Sold,
            timestamp: declared.result.declared_at,
        },
    )
    .await;
    Ok(declared)
}
// endregion: --- Declare Result
