use chrono::{DateTime, Duration, TimeZone, Utc};
use diamond_auction_service::bid::commands::{check_bid_rules, check_bid_window};
use diamond_auction_service::bid::model::BidWithBidder;
use diamond_auction_service::error::{DomainError, WindowViolation};
use diamond_auction_service::lot::commands::{
    validate_base_price, validate_lot_name, validate_schedule, windows_overlap,
};
use diamond_auction_service::lot::model::{Lot, LotStatus};
use diamond_auction_service::resolution::winner::select_winner;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// 테스트용 로트 생성
fn make_lot(status: LotStatus, start_offset_min: i64, end_offset_min: i64) -> Lot {
    Lot {
        id: Uuid::new_v4(),
        lot_name: "옐로 다이아몬드 3캐럿".to_string(),
        base_price: dec!(1000),
        status,
        start_time: Some(now() + Duration::minutes(start_offset_min)),
        end_time: Some(now() + Duration::minutes(end_offset_min)),
        created_at: now() - Duration::hours(24),
        updated_at: now() - Duration::hours(24),
        deleted_at: None,
    }
}

/// 테스트용 입찰 생성
fn make_bid(
    user_id: Uuid,
    amount: Decimal,
    updated_offset_secs: i64,
    budget: Decimal,
    is_active: bool,
) -> BidWithBidder {
    BidWithBidder {
        bid_id: Uuid::new_v4(),
        user_id,
        user_name: "입찰자".to_string(),
        user_email: "bidder@example.com".to_string(),
        budget,
        is_active,
        bid_amount: amount,
        created_at: now() - Duration::minutes(30),
        updated_at: now() + Duration::seconds(updated_offset_secs),
    }
}

#[test]
fn test_full_bidding_round_resolves_expected_winner() {
    // 기준가 1000, 한 시간 전에 시작해 한 시간 뒤에 끝나는 로트
    let lot = make_lot(LotStatus::Active, -60, 60);

    // 최초 입찰 1200은 모든 규칙을 통과한다
    assert!(check_bid_rules(&lot, dec!(1200), now()).is_ok());

    // 1500으로 수정해도 규칙을 통과한다
    assert!(check_bid_rules(&lot, dec!(1500), now()).is_ok());

    // 마감 후 낙찰 계산: 수정된 금액이 그대로 낙찰가가 된다
    let bidder = Uuid::new_v4();
    let rival = Uuid::new_v4();
    let bids = vec![
        make_bid(bidder, dec!(1500), 60, dec!(10000), true),
        make_bid(rival, dec!(1200), 0, dec!(99000), true),
    ];
    let winner = select_winner(&bids).unwrap();
    assert_eq!(winner.user_id, bidder);
    assert_eq!(winner.bid_amount, dec!(1500));
}

#[test]
fn test_lot_creation_validation_rules() {
    assert!(validate_lot_name("핑크 다이아몬드").is_ok());
    assert!(matches!(
        validate_lot_name("a"),
        Err(DomainError::Validation { .. })
    ));

    assert!(validate_base_price(dec!(1000)).is_ok());
    assert!(matches!(
        validate_base_price(dec!(0)),
        Err(DomainError::Validation { .. })
    ));

    assert!(validate_schedule(now(), now() + Duration::hours(2)).is_ok());
    assert!(matches!(
        validate_schedule(now() + Duration::hours(2), now()),
        Err(DomainError::Validation { .. })
    ));
}

#[test]
fn test_schedule_conflict_covers_all_interval_relationships() {
    let h = |hour: u32| Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap();

    // [10, 12)는 기존 [11, 13)와 충돌
    assert!(windows_overlap(h(10), h(12), Some(h(11)), Some(h(13))));
    // [12, 14)는 기존 [11, 13)와 충돌
    assert!(windows_overlap(h(12), h(14), Some(h(11)), Some(h(13))));
    // 포함 관계 양방향 모두 충돌
    assert!(windows_overlap(h(9), h(15), Some(h(11)), Some(h(13))));
    assert!(windows_overlap(h(11), h(12), Some(h(10)), Some(h(14))));
    // 경계만 맞닿은 [12, 13)는 기존 [10, 12)와 충돌하지 않는다
    assert!(!windows_overlap(h(12), h(13), Some(h(10)), Some(h(12))));
}

#[test]
fn test_bidding_window_overrides_stale_active_status() {
    // 스케줄러가 아직 마감 전이를 못 돌린 로트: 상태는 ACTIVE지만 종료 시각 경과
    let lot = make_lot(LotStatus::Active, -120, -5);
    let err = check_bid_window(&lot, now()).unwrap_err();
    assert!(matches!(err, DomainError::Window(WindowViolation::Ended)));

    // 상태 오류가 아니라 시간 오류로 구분되어야 한다
    let err = check_bid_rules(&lot, dec!(1500), now()).unwrap_err();
    assert!(matches!(err, DomainError::Window(WindowViolation::Ended)));
}

#[test]
fn test_bid_gated_by_lot_status_before_window() {
    let lot = make_lot(LotStatus::Draft, -60, 60);
    let err = check_bid_rules(&lot, dec!(1500), now()).unwrap_err();
    assert!(matches!(err, DomainError::InvalidState { .. }));
}

#[test]
fn test_tie_break_rewards_earliest_commitment_over_budget() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = Uuid::new_v4();
    let bids = vec![
        // B는 같은 금액이지만 더 늦게 도달했고 budget은 더 크다
        make_bid(b, dec!(25000), 90, dec!(60000), true),
        make_bid(a, dec!(25000), 0, dec!(50000), true),
        make_bid(c, dec!(20000), 0, dec!(80000), true),
    ];
    let winner = select_winner(&bids).unwrap();
    assert_eq!(winner.user_id, a);
}

#[test]
fn test_inactive_bidder_excluded_from_resolution() {
    let active = Uuid::new_v4();
    let bids = vec![
        make_bid(Uuid::new_v4(), dec!(90000), 0, dec!(99000), false),
        make_bid(active, dec!(25000), 0, dec!(50000), true),
    ];
    let winner = select_winner(&bids).unwrap();
    assert_eq!(winner.user_id, active);

    // 비활성 입찰만 남으면 낙찰자 없음
    let only_inactive = vec![make_bid(Uuid::new_v4(), dec!(90000), 0, dec!(99000), false)];
    assert!(select_winner(&only_inactive).is_none());
}
