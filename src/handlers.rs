/// HTTP 핸들러. 얇은 변환 계층으로, 인증/권한은 상류 게이트웨이가
/// 끝낸 상태라고 가정하고 x-user-id 헤더의 호출자 식별자만 받는다.
// region:    --- Imports
use crate::bid::commands::{self as bid_commands, PlaceBidCommand, UpdateBidCommand};
use crate::database::DatabaseManager;
use crate::error::DomainError;
use crate::lot::commands::{
    self as lot_commands, CreateLotCommand, EditLotCommand, RescheduleLotCommand,
};
use crate::lot::model::AvailableLotRow;
use crate::notifier::NotificationSink;
use crate::query;
use crate::resolution::commands as resolution_commands;
use crate::user::commands::{self as user_commands, SetUserActiveCommand};
use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

/// 핸들러 공유 상태 (원장 매니저, 알림 싱크)
pub type AppState = (Arc<DatabaseManager>, Arc<dyn NotificationSink>);

// region:    --- Caller Identity
/// 게이트웨이가 인증 후 전달하는 호출자 식별자 (x-user-id 헤더)
pub struct CallerId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .map(CallerId)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "호출자 식별자가 없습니다",
                        "code": "UNAUTHENTICATED"
                    })),
                )
            })
    }
}
// endregion: --- Caller Identity

// region:    --- Query Params
#[derive(Debug, Deserialize)]
pub struct TombstoneParams {
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
// endregion: --- Query Params

// region:    --- Admin Lot Handlers
/// 로트 생성
pub async fn handle_create_lot(
    State((db, _)): State<AppState>,
    Json(cmd): Json<CreateLotCommand>,
) -> Result<impl IntoResponse, DomainError> {
    let lot = lot_commands::create_lot(&db, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "로트가 생성되었습니다", "data": lot })),
    ))
}

/// 전체 로트 조회
pub async fn handle_list_lots(
    State((db, _)): State<AppState>,
) -> Result<impl IntoResponse, DomainError> {
    let lots = query::handlers::list_lots(&db).await?;
    Ok(Json(json!({ "data": lots })))
}

/// 로트 단건 조회 (include_deleted로 톰스톤 포함 가능)
pub async fn handle_get_lot(
    State((db, _)): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Query(params): Query<TombstoneParams>,
) -> Result<impl IntoResponse, DomainError> {
    let lot = query::handlers::get_lot_admin(&db, lot_id, params.include_deleted).await?;
    Ok(Json(json!({ "data": lot })))
}

/// 로트 편집 (DRAFT/CLOSED 전용, 일정과 상태는 불변)
pub async fn handle_edit_lot(
    State((db, _)): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(cmd): Json<EditLotCommand>,
) -> Result<impl IntoResponse, DomainError> {
    let lot = lot_commands::edit_lot(&db, lot_id, cmd).await?;
    Ok(Json(json!({ "message": "로트가 수정되었습니다", "data": lot })))
}

/// 로트 재일정 (성공 시 상태는 DRAFT로 재설정)
pub async fn handle_reschedule_lot(
    State((db, _)): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(cmd): Json<RescheduleLotCommand>,
) -> Result<impl IntoResponse, DomainError> {
    let lot = lot_commands::reschedule_lot(&db, lot_id, cmd).await?;
    Ok(Json(json!({
        "message": "로트가 재일정되었습니다. 상태가 DRAFT로 재설정되었습니다",
        "data": lot
    })))
}

/// 로트 수동 활성화
pub async fn handle_activate_lot(
    State((db, notifier)): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let lot = lot_commands::activate_lot(&db, notifier.as_ref(), lot_id).await?;
    Ok(Json(json!({ "message": "로트가 활성화되었습니다", "data": lot })))
}

/// 로트 조기 마감. 앞당길 수 있는 차기 DRAFT 로트 안내를 함께 돌려준다.
pub async fn handle_close_lot(
    State((db, notifier)): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let (lot, upcoming) = lot_commands::close_lot(&db, notifier.as_ref(), lot_id).await?;

    let suggestions = if upcoming.is_empty() {
        json!({
            "has_upcoming_lots": false,
            "count": 0,
            "message": "앞당길 DRAFT 로트가 없습니다"
        })
    } else {
        json!({
            "has_upcoming_lots": true,
            "count": upcoming.len(),
            "next_lot": upcoming.first(),
            "message": format!(
                "{}개의 DRAFT 로트가 예정되어 있습니다. 필요하면 일정을 앞당길 수 있습니다",
                upcoming.len()
            )
        })
    };

    Ok(Json(json!({
        "message": "로트가 마감되었습니다",
        "data": lot,
        "suggestions": suggestions
    })))
}

/// 로트 삭제 (연쇄 소프트 삭제)
pub async fn handle_delete_lot(
    State((db, _)): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    lot_commands::delete_lot(&db, lot_id).await?;
    Ok(Json(json!({
        "message": "로트와 관련 기록이 모두 삭제되었습니다"
    })))
}
// endregion: --- Admin Lot Handlers

// region:    --- Admin Bid Handlers
/// 로트의 전체 입찰 조회 (관리자). 결과가 확정된 경우 낙찰자 정보를 붙인다.
pub async fn handle_admin_bids_for_lot(
    State((db, _)): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let lot = query::handlers::get_lot(&db, lot_id).await?;
    let bids = query::handlers::list_bids_for_lot(&db, lot_id).await?;
    let result = query::handlers::get_result_with_winner(&db, lot_id).await?;

    let total_bids = bids.len();
    let active_bids = bids.iter().filter(|b| b.is_active).count();
    let highest_bid = bids.first().map(|b| b.bid_amount);
    let winner = result.map(|r| {
        json!({
            "id": r.winner_user_id,
            "name": r.winner_name,
            "email": r.winner_email,
            "winning_amount": r.winning_bid_amount,
        })
    });

    Ok(Json(json!({
        "lot": {
            "id": lot.id,
            "lot_name": lot.lot_name,
            "base_price": lot.base_price,
            "status": lot.status,
        },
        "stats": {
            "total_bids": total_bids,
            "active_bids": active_bids,
            "highest_bid": highest_bid,
        },
        "winner": winner,
        "bids": bids,
    })))
}

/// 입찰 변경 이력 조회 (관리자 감사용)
pub async fn handle_admin_bid_history(
    State((db, _)): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(params): Query<TombstoneParams>,
) -> Result<impl IntoResponse, DomainError> {
    let bid = query::handlers::get_bid(&db, bid_id).await?;
    let user = query::handlers::get_user(&db, bid.user_id).await?;
    let lot = query::handlers::get_lot(&db, bid.lot_id).await?;
    let history = query::handlers::list_bid_history(&db, bid_id, params.include_deleted).await?;
    let total_edits = history.len();

    Ok(Json(json!({
        "bid": {
            "bid_id": bid.id,
            "user": { "id": user.id, "name": user.name, "email": user.email },
            "lot": { "id": lot.id, "lot_name": lot.lot_name },
            "current_amount": bid.bid_amount,
            "created_at": bid.created_at,
            "updated_at": bid.updated_at,
        },
        "history": history,
        "total_edits": total_edits,
    })))
}
// endregion: --- Admin Bid Handlers

// region:    --- Admin Result Handlers
/// 낙찰 확정
pub async fn handle_declare_result(
    State((db, notifier)): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let declared = resolution_commands::declare_result(&db, notifier.as_ref(), lot_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "낙찰이 확정되었습니다",
            "data": {
                "result_id": declared.result.id,
                "lot_id": declared.result.lot_id,
                "lot_name": declared.lot_name,
                "winner_user_id": declared.result.winner_user_id,
                "winner_name": declared.winner_name,
                "winning_bid_amount": declared.result.winning_bid_amount,
                "total_bids": declared.total_bids,
                "active_bids": declared.active_bids,
                "declared_at": declared.result.declared_at,
            }
        })),
    ))
}

/// 낙찰 결과 상세 조회 (관리자). 낙찰자 정보와 전체 입찰을 모두 보여준다.
pub async fn handle_admin_result(
    State((db, _)): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let lot = query::handlers::get_lot(&db, lot_id).await?;
    let result = query::handlers::get_result_with_winner(&db, lot_id)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "낙찰 결과",
        })?;
    let bids = query::handlers::list_bids_for_lot(&db, lot_id).await?;

    let all_bids: Vec<Value> = bids
        .iter()
        .map(|b| {
            json!({
                "bid_id": b.bid_id,
                "user": {
                    "id": b.user_id,
                    "name": b.user_name,
                    "email": b.user_email,
                    "is_active": b.is_active,
                },
                "bid_amount": b.bid_amount,
                "is_winner": b.user_id == result.winner_user_id,
                "created_at": b.created_at,
                "updated_at": b.updated_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "result": {
            "result_id": result.result_id,
            "lot": {
                "id": lot.id,
                "lot_name": lot.lot_name,
                "base_price": lot.base_price,
                "status": lot.status,
            },
            "winner": {
                "id": result.winner_user_id,
                "name": result.winner_name,
                "email": result.winner_email,
                "budget": result.winner_budget,
                "is_active": result.winner_is_active,
            },
            "winning_bid_amount": result.winning_bid_amount,
            "declared_at": result.declared_at,
        },
        "all_bids": all_bids,
        "total_bids": bids.len(),
    })))
}

/// 낙찰 결과 목록 조회 (관리자, 페이지네이션)
pub async fn handle_admin_list_results(
    State((db, _)): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, DomainError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(10).clamp(1, 100);
    let (total, rows) = query::handlers::list_results(&db, page, page_size).await?;

    Ok(Json(json!({
        "pagination": {
            "total": total,
            "page": page,
            "page_size": page_size,
            "pages": (total + page_size - 1) / page_size,
        },
        "results": rows,
    })))
}
// endregion: --- Admin Result Handlers

// region:    --- Admin User Handlers
/// 전체 사용자 조회
pub async fn handle_admin_list_users(
    State((db, _)): State<AppState>,
) -> Result<impl IntoResponse, DomainError> {
    let users = query::handlers::list_users(&db).await?;
    Ok(Json(json!({ "data": users })))
}

/// 사용자 단건 조회
pub async fn handle_admin_get_user(
    State((db, _)): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let user = query::handlers::get_user(&db, user_id).await?;
    Ok(Json(json!({ "data": user })))
}

/// 사용자 활성/비활성 토글
pub async fn handle_set_user_active(
    State((db, _)): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(cmd): Json<SetUserActiveCommand>,
) -> Result<impl IntoResponse, DomainError> {
    let user = user_commands::set_user_active(&db, user_id, cmd.is_active).await?;
    Ok(Json(json!({
        "message": "사용자 활성 상태가 변경되었습니다",
        "data": user
    })))
}
// endregion: --- Admin User Handlers

// region:    --- User Handlers
/// 카탈로그 행을 사용자 응답으로 변환 (낙찰자 신원은 노출하지 않는다)
fn available_lot_view(row: &AvailableLotRow, user_id: Uuid) -> Value {
    let user_bid = row.bid_amount.map(|amount| {
        let mut bid = json!({
            "bid_id": row.bid_id,
            "bid_amount": amount,
            "updated_at": row.bid_updated_at,
        });
        if row.result_id.is_some() {
            let is_winner = row.winner_user_id == Some(user_id);
            bid["result"] = json!(if is_winner { "WON" } else { "LOST" });
            bid["is_winner"] = json!(is_winner);
        }
        bid
    });

    json!({
        "id": row.id,
        "lot_name": row.lot_name,
        "base_price": row.base_price,
        "status": row.status,
        "start_time": row.start_time,
        "end_time": row.end_time,
        "result_status": if row.result_id.is_some() { "DECLARED" } else { "PENDING" },
        "user_bid": user_bid,
    })
}

/// 입찰 가능 로트 목록 조회 (본인 입찰/결과 상태 포함)
pub async fn handle_available_lots(
    State((db, _)): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<impl IntoResponse, DomainError> {
    let rows = query::handlers::list_available_lots(&db, user_id).await?;
    let data: Vec<Value> = rows
        .iter()
        .map(|row| available_lot_view(row, user_id))
        .collect();
    Ok(Json(json!({ "data": data })))
}

/// 로트 상세 조회 (사용자)
pub async fn handle_user_lot_detail(
    State((db, _)): State<AppState>,
    CallerId(user_id): CallerId,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let row = query::handlers::get_available_lot_detail(&db, user_id, lot_id).await?;
    Ok(Json(json!({ "data": available_lot_view(&row, user_id) })))
}

/// 입찰 등록
pub async fn handle_place_bid(
    State((db, notifier)): State<AppState>,
    CallerId(user_id): CallerId,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse, DomainError> {
    let bid = bid_commands::place_bid(&db, notifier.as_ref(), user_id, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "입찰이 등록되었습니다",
            "data": {
                "bid_id": bid.id,
                "lot_id": bid.lot_id,
                "bid_amount": bid.bid_amount,
                "created_at": bid.created_at,
            }
        })),
    ))
}

/// 입찰 수정
pub async fn handle_update_bid(
    State((db, notifier)): State<AppState>,
    CallerId(user_id): CallerId,
    Path(bid_id): Path<Uuid>,
    Json(cmd): Json<UpdateBidCommand>,
) -> Result<impl IntoResponse, DomainError> {
    let (bid, old_amount) =
        bid_commands::update_bid(&db, notifier.as_ref(), user_id, bid_id, cmd).await?;
    Ok(Json(json!({
        "message": "입찰이 수정되었습니다",
        "data": {
            "bid_id": bid.id,
            "old_amount": old_amount,
            "new_amount": bid.bid_amount,
            "updated_at": bid.updated_at,
        }
    })))
}

/// 본인 입찰 조회 (로트 스냅샷 포함)
pub async fn handle_own_bid(
    State((db, _)): State<AppState>,
    CallerId(user_id): CallerId,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    let (bid, lot) = query::handlers::get_own_bid(&db, user_id, lot_id).await?;
    Ok(Json(json!({
        "data": {
            "bid_id": bid.id,
            "lot": {
                "id": lot.id,
                "lot_name": lot.lot_name,
                "base_price": lot.base_price,
                "status": lot.status,
                "start_time": lot.start_time,
                "end_time": lot.end_time,
            },
            "bid_amount": bid.bid_amount,
            "created_at": bid.created_at,
            "updated_at": bid.updated_at,
        }
    })))
}

/// 낙찰 결과 조회 (사용자).
/// - 결과 전: pending
/// - 미참여자: 낙찰자 정보 없이 declared/not_participated
/// - 낙찰자: won + 본인 금액
/// - 낙선자: lost + 본인 금액 (낙찰자 신원/금액은 비공개)
pub async fn handle_user_result(
    State((db, _)): State<AppState>,
    CallerId(user_id): CallerId,
    Path(lot_id): Path<Uuid>,
) -> Result<impl IntoResponse, DomainError> {
    info!(
        "{:<12} --> 사용자 결과 조회 user: {}, lot: {}",
        "Handler", user_id, lot_id
    );
    let lot = query::handlers::get_lot(&db, lot_id).await?;
    let lot_view = json!({
        "id": lot.id,
        "lot_name": lot.lot_name,
        "status": lot.status,
    });

    let result = match query::handlers::get_result_by_lot(&db, lot_id).await? {
        Some(result) => result,
        None => {
            return Ok(Json(json!({
                "lot": lot_view,
                "result_status": "pending",
                "message": "낙찰 결과가 곧 발표됩니다"
            })));
        }
    };

    let own_bid = query::handlers::find_own_bid(&db, user_id, lot_id).await?;
    let Some(own_bid) = own_bid else {
        return Ok(Json(json!({
            "lot": lot_view,
            "result_status": "declared",
            "participation": "not_participated",
            "message": "이 경매에 참여하지 않았습니다"
        })));
    };

    if user_id == result.winner_user_id {
        return Ok(Json(json!({
            "lot": lot_view,
            "result_status": "declared",
            "participation": "won",
            "your_bid_amount": own_bid.bid_amount,
            "message": "축하합니다! 이 경매에서 낙찰되었습니다",
            "declared_at": result.declared_at,
        })));
    }

    Ok(Json(json!({
        "lot": lot_view,
        "result_status": "declared",
        "participation": "lost",
        "your_bid_amount": own_bid.bid_amount,
        "message": "이 경매에서 낙찰되지 못했습니다",
        "declared_at": result.declared_at,
    })))
}
// endregion: --- User Handlers
