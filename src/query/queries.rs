//! 조회 SQL 모음. 모든 쿼리는 기본적으로 deleted_at IS NULL을 걸어
//! 살아있는 행만 보며, 감사용 쿼리만 명시적으로 톰스톤을 포함한다.

/// 로트 조회
pub const GET_LOT: &str = r#"
    SELECT id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
    FROM lots
    WHERE id = $1 AND deleted_at IS NULL
"#;

/// 로트 조회 (톰스톤 포함, 관리자/감사용)
pub const GET_LOT_ANY: &str = r#"
    SELECT id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
    FROM lots
    WHERE id = $1
"#;

/// 로트 조회 + 행 잠금 (상태 전이와 낙찰 확정 경로 전용)
pub const GET_LOT_FOR_UPDATE: &str = r#"
    SELECT id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
    FROM lots
    WHERE id = $1 AND deleted_at IS NULL
    FOR UPDATE
"#;

/// 전체 로트 조회 (관리자)
pub const LIST_LOTS: &str = r#"
    SELECT id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
    FROM lots
    WHERE deleted_at IS NULL
    ORDER BY created_at DESC
"#;

/// 시간대 충돌 검사 대상 (살아있는 DRAFT/ACTIVE 로트)
pub const CANDIDATE_WINDOW_LOTS: &str = r#"
    SELECT id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
    FROM lots
    WHERE deleted_at IS NULL AND status IN ('DRAFT', 'ACTIVE')
"#;

/// 앞으로 시작할 DRAFT 로트 (마감 직후 안내용, 가까운 순)
pub const UPCOMING_DRAFT_LOTS: &str = r#"
    SELECT id, lot_name, base_price, status, start_time, end_time, created_at, updated_at, deleted_at
    FROM lots
    WHERE deleted_at IS NULL AND status = 'DRAFT'
      AND start_time IS NOT NULL AND start_time > $1
    ORDER BY start_time ASC
    LIMIT 5
"#;

/// 사용자 카탈로그 조회: 로트 + 본인 입찰 + 결과 여부
pub const LIST_AVAILABLE_LOTS: &str = r#"
    SELECT l.id, l.lot_name, l.base_price, l.status, l.start_time, l.end_time,
           b.id AS bid_id, b.bid_amount, b.updated_at AS bid_updated_at,
           r.id AS result_id, r.winner_user_id
    FROM lots l
    LEFT JOIN bids b ON b.lot_id = l.id AND b.user_id = $1 AND b.deleted_at IS NULL
    LEFT JOIN results r ON r.lot_id = l.id AND r.deleted_at IS NULL
    WHERE l.deleted_at IS NULL AND l.status IN ('ACTIVE', 'CLOSED', 'SOLD')
    ORDER BY l.start_time ASC
"#;

/// 사용자용 단일 로트 상세 (본인 입찰/결과 포함)
pub const GET_AVAILABLE_LOT_DETAIL: &str = r#"
    SELECT l.id, l.lot_name, l.base_price, l.status, l.start_time, l.end_time,
           b.id AS bid_id, b.bid_amount, b.updated_at AS bid_updated_at,
           r.id AS result_id, r.winner_user_id
    FROM lots l
    LEFT JOIN bids b ON b.lot_id = l.id AND b.user_id = $1 AND b.deleted_at IS NULL
    LEFT JOIN results r ON r.lot_id = l.id AND r.deleted_at IS NULL
    WHERE l.deleted_at IS NULL AND l.id = $2
"#;

/// 본인 입찰 조회
pub const FIND_OWN_BID: &str = r#"
    SELECT id, user_id, lot_id, bid_amount, created_at, updated_at, deleted_at
    FROM bids
    WHERE user_id = $1 AND lot_id = $2 AND deleted_at IS NULL
"#;

/// 입찰 조회
pub const GET_BID: &str = r#"
    SELECT id, user_id, lot_id, bid_amount, created_at, updated_at, deleted_at
    FROM bids
    WHERE id = $1 AND deleted_at IS NULL
"#;

/// 입찰 조회 + 행 잠금 (수정 경로 전용)
pub const GET_BID_FOR_UPDATE: &str = r#"
    SELECT id, user_id, lot_id, bid_amount, created_at, updated_at, deleted_at
    FROM bids
    WHERE id = $1 AND deleted_at IS NULL
    FOR UPDATE
"#;

/// 로트의 전체 입찰 + 입찰자 정보 (금액 내림차순)
pub const LIST_BIDS_WITH_BIDDERS: &str = r#"
    SELECT b.id AS bid_id, b.user_id, u.name AS user_name, u.email AS user_email,
           u.budget, u.is_active, b.bid_amount, b.created_at, b.updated_at
    FROM bids b
    JOIN users u ON u.id = b.user_id AND u.deleted_at IS NULL
    WHERE b.lot_id = $1 AND b.deleted_at IS NULL
    ORDER BY b.bid_amount DESC
"#;

/// 입찰 변경 이력 조회 (최근 수정 순)
pub const LIST_BID_HISTORY: &str = r#"
    SELECT id, bid_id, old_amount, new_amount, edited_at, deleted_at
    FROM bid_histories
    WHERE bid_id = $1 AND deleted_at IS NULL
    ORDER BY edited_at DESC
"#;

/// 입찰 변경 이력 조회 (톰스톤 포함, 감사용)
pub const LIST_BID_HISTORY_ANY: &str = r#"
    SELECT id, bid_id, old_amount, new_amount, edited_at, deleted_at
    FROM bid_histories
    WHERE bid_id = $1
    ORDER BY edited_at DESC
"#;

/// 로트의 낙찰 결과 조회
pub const GET_RESULT_BY_LOT: &str = r#"
    SELECT id, lot_id, winner_user_id, winning_bid_amount, declared_at, deleted_at
    FROM results
    WHERE lot_id = $1 AND deleted_at IS NULL
"#;

/// 로트의 낙찰 결과 + 낙찰자 정보 조회
pub const GET_RESULT_WITH_WINNER: &str = r#"
    SELECT r.id AS result_id, r.lot_id, r.winner_user_id,
           u.name AS winner_name, u.email AS winner_email,
           u.budget AS winner_budget, u.is_active AS winner_is_active,
           r.winning_bid_amount, r.declared_at
    FROM results r
    JOIN users u ON u.id = r.winner_user_id
    WHERE r.lot_id = $1 AND r.deleted_at IS NULL
"#;

/// 낙찰 결과 목록 (최근 확정 순, 페이지네이션)
pub const LIST_RESULTS: &str = r#"
    SELECT r.id AS result_id, r.lot_id, l.lot_name, l.base_price, l.status AS lot_status,
           r.winner_user_id, u.name AS winner_name, u.email AS winner_email,
           r.winning_bid_amount, r.declared_at
    FROM results r
    JOIN lots l ON l.id = r.lot_id
    JOIN users u ON u.id = r.winner_user_id
    WHERE r.deleted_at IS NULL
    ORDER BY r.declared_at DESC
    LIMIT $1 OFFSET $2
"#;

/// 낙찰 결과 전체 건수
pub const COUNT_RESULTS: &str = r#"
    SELECT COUNT(*) FROM results WHERE deleted_at IS NULL
"#;

/// 전체 사용자 조회 (관리자)
pub const LIST_USERS: &str = r#"
    SELECT id, name, email, password, role, budget, is_active, created_at, updated_at, deleted_at
    FROM users
    WHERE deleted_at IS NULL
    ORDER BY created_at DESC
"#;

/// 사용자 조회
pub const GET_USER: &str = r#"
    SELECT id, name, email, password, role, budget, is_active, created_at, updated_at, deleted_at
    FROM users
    WHERE id = $1 AND deleted_at IS NULL
"#;
