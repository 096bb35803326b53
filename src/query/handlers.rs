/// 조회 핸들러. 스냅샷 일관성을 위해 모든 읽기를 트랜잭션 안에서 수행한다.
// region:    --- Imports
use super::queries;
use crate::bid::model::{Bid, BidHistoryEntry, BidWithBidder};
use crate::database::DatabaseManager;
use crate::error::DomainError;
use crate::lot::model::{AvailableLotRow, Lot};
use crate::resolution::model::{AuctionResult, ResultListRow, ResultWithWinner};
use crate::user::model::User;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Lot Queries
/// 로트 조회
pub async fn get_lot(db: &DatabaseManager, lot_id: Uuid) -> Result<Lot, DomainError> {
    info!("{:<12} --> 로트 조회 id: {}", "Query", lot_id);
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Lot>(queries::GET_LOT)
                .bind(lot_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(DomainError::NotFound { entity: "로트" })
        })
    })
    .await
}

/// 로트 조회 (관리자). include_deleted로 톰스톤 행까지 볼 수 있다.
pub async fn get_lot_admin(
    db: &DatabaseManager,
    lot_id: Uuid,
    include_deleted: bool,
) -> Result<Lot, DomainError> {
    info!(
        "{:<12} --> 로트 조회(관리자) id: {}, 톰스톤 포함: {}",
        "Query", lot_id, include_deleted
    );
    let sql = if include_deleted {
        queries::GET_LOT_ANY
    } else {
        queries::GET_LOT
    };
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Lot>(sql)
                .bind(lot_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(DomainError::NotFound { entity: "로트" })
        })
    })
    .await
}

/// 전체 로트 조회 (관리자)
pub async fn list_lots(db: &DatabaseManager) -> Result<Vec<Lot>, DomainError> {
    info!("{:<12} --> 전체 로트 조회", "Query");
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(sqlx::query_as::<_, Lot>(queries::LIST_LOTS)
                .fetch_all(&mut **tx)
                .await?)
        })
    })
    .await
}

/// 앞으로 시작할 DRAFT 로트 조회 (마감 직후 안내용)
pub async fn upcoming_draft_lots(db: &DatabaseManager) -> Result<Vec<Lot>, DomainError> {
    info!("{:<12} --> 차기 DRAFT 로트 조회", "Query");
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(sqlx::query_as::<_, Lot>(queries::UPCOMING_DRAFT_LOTS)
                .bind(Utc::now())
                .fetch_all(&mut **tx)
                .await?)
        })
    })
    .await
}

/// 사용자 카탈로그 조회 (본인 입찰/결과 상태 포함)
pub async fn list_available_lots(
    db: &DatabaseManager,
    user_id: Uuid,
) -> Result<Vec<AvailableLotRow>, DomainError> {
    info!("{:<12} --> 입찰 가능 로트 조회 user: {}", "Query", user_id);
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(
                sqlx::query_as::<_, AvailableLotRow>(queries::LIST_AVAILABLE_LOTS)
                    .bind(user_id)
                    .fetch_all(&mut **tx)
                    .await?,
            )
        })
    })
    .await
}

/// 사용자용 단일 로트 상세 조회
pub async fn get_available_lot_detail(
    db: &DatabaseManager,
    user_id: Uuid,
    lot_id: Uuid,
) -> Result<AvailableLotRow, DomainError> {
    info!(
        "{:<12} --> 로트 상세 조회 user: {}, lot: {}",
        "Query", user_id, lot_id
    );
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, AvailableLotRow>(queries::GET_AVAILABLE_LOT_DETAIL)
                .bind(user_id)
                .bind(lot_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(DomainError::NotFound { entity: "로트" })
        })
    })
    .await
}
// endregion: --- Lot Queries

// region:    --- Bid Queries
/// 본인 입찰 조회 (없으면 None)
pub async fn find_own_bid(
    db: &DatabaseManager,
    user_id: Uuid,
    lot_id: Uuid,
) -> Result<Option<Bid>, DomainError> {
    info!(
        "{:<12} --> 본인 입찰 조회 user: {}, lot: {}",
        "Query", user_id, lot_id
    );
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(sqlx::query_as::<_, Bid>(queries::FIND_OWN_BID)
                .bind(user_id)
                .bind(lot_id)
                .fetch_optional(&mut **tx)
                .await?)
        })
    })
    .await
}

/// 본인 입찰 + 로트 스냅샷 조회.
/// 조회는 호출자의 활성 여부와 무관하게 허용되므로 is_active를 재검사하지 않는다.
pub async fn get_own_bid(
    db: &DatabaseManager,
    user_id: Uuid,
    lot_id: Uuid,
) -> Result<(Bid, Lot), DomainError> {
    info!(
        "{:<12} --> 본인 입찰/로트 조회 user: {}, lot: {}",
        "Query", user_id, lot_id
    );
    db.transaction(|tx| {
        Box::pin(async move {
            let bid = sqlx::query_as::<_, Bid>(queries::FIND_OWN_BID)
                .bind(user_id)
                .bind(lot_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(DomainError::NotFound { entity: "입찰" })?;
            let lot = sqlx::query_as::<_, Lot>(queries::GET_LOT)
                .bind(lot_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(DomainError::NotFound { entity: "로트" })?;
            Ok((bid, lot))
        })
    })
    .await
}

/// 입찰 조회
pub async fn get_bid(db: &DatabaseManager, bid_id: Uuid) -> Result<Bid, DomainError> {
    info!("{:<12} --> 입찰 조회 id: {}", "Query", bid_id);
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, Bid>(queries::GET_BID)
                .bind(bid_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(DomainError::NotFound { entity: "입찰" })
        })
    })
    .await
}

/// 로트의 전체 입찰 + 입찰자 조회 (관리자, 금액 내림차순)
pub async fn list_bids_for_lot(
    db: &DatabaseManager,
    lot_id: Uuid,
) -> Result<Vec<BidWithBidder>, DomainError> {
    info!("{:<12} --> 로트 입찰 목록 조회 lot: {}", "Query", lot_id);
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(
                sqlx::query_as::<_, BidWithBidder>(queries::LIST_BIDS_WITH_BIDDERS)
                    .bind(lot_id)
                    .fetch_all(&mut **tx)
                    .await?,
            )
        })
    })
    .await
}

/// 입찰 변경 이력 조회 (관리자 감사용)
pub async fn list_bid_history(
    db: &DatabaseManager,
    bid_id: Uuid,
    include_deleted: bool,
) -> Result<Vec<BidHistoryEntry>, DomainError> {
    info!(
        "{:<12} --> 입찰 이력 조회 bid: {}, 톰스톤 포함: {}",
        "Query", bid_id, include_deleted
    );
    let sql = if include_deleted {
        queries::LIST_BID_HISTORY_ANY
    } else {
        queries::LIST_BID_HISTORY
    };
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(sqlx::query_as::<_, BidHistoryEntry>(sql)
                .bind(bid_id)
                .fetch_all(&mut **tx)
                .await?)
        })
    })
    .await
}
// endregion: --- Bid Queries

// region:    --- Result Queries
/// 로트의 낙찰 결과 조회 (없으면 None)
pub async fn get_result_by_lot(
    db: &DatabaseManager,
    lot_id: Uuid,
) -> Result<Option<AuctionResult>, DomainError> {
    info!("{:<12} --> 낙찰 결과 조회 lot: {}", "Query", lot_id);
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(sqlx::query_as::<_, AuctionResult>(queries::GET_RESULT_BY_LOT)
                .bind(lot_id)
                .fetch_optional(&mut **tx)
                .await?)
        })
    })
    .await
}

/// 로트의 낙찰 결과 + 낙찰자 조회 (없으면 None)
pub async fn get_result_with_winner(
    db: &DatabaseManager,
    lot_id: Uuid,
) -> Result<Option<ResultWithWinner>, DomainError> {
    info!(
        "{:<12} --> 낙찰 결과/낙찰자 조회 lot: {}",
        "Query", lot_id
    );
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(
                sqlx::query_as::<_, ResultWithWinner>(queries::GET_RESULT_WITH_WINNER)
                    .bind(lot_id)
                    .fetch_optional(&mut **tx)
                    .await?,
            )
        })
    })
    .await
}

/// 낙찰 결과 목록 조회 (최근 확정 순). (전체 건수, 행 목록) 반환.
pub async fn list_results(
    db: &DatabaseManager,
    page: i64,
    page_size: i64,
) -> Result<(i64, Vec<ResultListRow>), DomainError> {
    info!(
        "{:<12} --> 낙찰 결과 목록 조회 page: {}, size: {}",
        "Query", page, page_size
    );
    let offset = (page - 1) * page_size;
    db.transaction(|tx| {
        Box::pin(async move {
            let total: i64 = sqlx::query_scalar(queries::COUNT_RESULTS)
                .fetch_one(&mut **tx)
                .await?;
            let rows = sqlx::query_as::<_, ResultListRow>(queries::LIST_RESULTS)
                .bind(page_size)
                .bind(offset)
                .fetch_all(&mut **tx)
                .await?;
            Ok((total, rows))
        })
    })
    .await
}
// endregion: --- Result Queries

// region:    --- User Queries
/// 전체 사용자 조회 (관리자)
pub async fn list_users(db: &DatabaseManager) -> Result<Vec<User>, DomainError> {
    info!("{:<12} --> 전체 사용자 조회", "Query");
    db.transaction(|tx| {
        Box::pin(async move {
            Ok(sqlx::query_as::<_, User>(queries::LIST_USERS)
                .fetch_all(&mut **tx)
                .await?)
        })
    })
    .await
}

/// 사용자 조회
pub async fn get_user(db: &DatabaseManager, user_id: Uuid) -> Result<User, DomainError> {
    info!("{:<12} --> 사용자 조회 id: {}", "Query", user_id);
    db.transaction(|tx| {
        Box::pin(async move {
            sqlx::query_as::<_, User>(queries::GET_USER)
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(DomainError::NotFound { entity: "사용자" })
        })
    })
    .await
}
// endregion: --- User Queries
