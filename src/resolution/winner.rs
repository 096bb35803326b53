/// 낙찰자 선정 규칙
/// 우선순위 (엄격한 전순서):
/// 1. 최고 입찰 금액
/// 2. 같은 금액이면 먼저 도달한 쪽 (updated_at 오름차순)
/// 3. 그래도 같으면 신고 한도(budget)가 큰 쪽
/// 4. 최종적으로 사용자 id 오름차순 (id가 유일하므로 항상 결정된다)
// region:    --- Imports
use crate::bid::model::BidWithBidder;
use std::cmp::Ordering;

// endregion: --- Imports

/// 두 입찰의 우선순위 비교. Less가 더 우선이다.
pub fn winner_ordering(a: &BidWithBidder, b: &BidWithBidder) -> Ordering {
    b.bid_amount
        .cmp(&a.bid_amount)
        .then_with(|| a.updated_at.cmp(&b.updated_at))
        .then_with(|| b.budget.cmp(&a.budget))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// 낙찰자 선정. 비활성 사용자의 입찰은 금액과 무관하게 제외된다.
pub fn select_winner(bids: &[BidWithBidder]) -> Option<&BidWithBidder> {
    bids.iter()
        .filter(|b| b.is_active)
        .min_by(|a, b| winner_ordering(a, b))
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn bid(
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
            created_at: t0(),
            updated_at: t0() + Duration::seconds(updated_offset_secs),
        }
    }

    #[test]
    fn test_highest_amount_wins() {
        let a = bid(Uuid::new_v4(), dec!(25000), 0, dec!(50000), true);
        let b = bid(Uuid::new_v4(), dec!(20000), 0, dec!(90000), true);
        let winner = select_winner(&[a.clone(), b]).unwrap();
        assert_eq!(winner.bid_id, a.bid_id);
    }

    #[test]
    fn test_earliest_updated_at_beats_higher_budget_on_tie() {
        // 같은 25000이면 먼저 도달한 A가 budget이 큰 B를 이긴다
        let a = bid(Uuid::new_v4(), dec!(25000), 0, dec!(50000), true);
        let b = bid(Uuid::new_v4(), dec!(25000), 30, dec!(60000), true);
        let c = bid(Uuid::new_v4(), dec!(20000), 0, dec!(99000), true);
        let winner = select_winner(&[b, a.clone(), c]).unwrap();
        assert_eq!(winner.bid_id, a.bid_id);
    }

    #[test]
    fn test_budget_breaks_equal_amount_and_time() {
        let a = bid(Uuid::new_v4(), dec!(25000), 0, dec!(50000), true);
        let b = bid(Uuid::new_v4(), dec!(25000), 0, dec!(60000), true);
        let winner = select_winner(&[a, b.clone()]).unwrap();
        assert_eq!(winner.bid_id, b.bid_id);
    }

    #[test]
    fn test_smallest_user_id_is_final_fallback() {
        let low = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let high = Uuid::parse_str("ffffffff-ffff-ffff-ffff-ffffffffffff").unwrap();
        let a = bid(high, dec!(25000), 0, dec!(50000), true);
        let b = bid(low, dec!(25000), 0, dec!(50000), true);
        let winner = select_winner(&[a, b]).unwrap();
        assert_eq!(winner.user_id, low);
    }

    #[test]
    fn test_inactive_user_never_wins_even_with_highest_bid() {
        let a = bid(Uuid::new_v4(), dec!(90000), 0, dec!(99000), false);
        let b = bid(Uuid::new_v4(), dec!(25000), 0, dec!(50000), true);
        let winner = select_winner(&[a, b.clone()]).unwrap();
        assert_eq!(winner.bid_id, b.bid_id);
    }

    #[test]
    fn test_no_eligible_bid_yields_none() {
        assert!(select_winner(&[]).is_none());
        let only_inactive = bid(Uuid::new_v4(), dec!(25000), 0, dec!(50000), false);
        assert!(select_winner(&[only_inactive]).is_none());
    }

    #[test]
    fn test_ordering_is_total_and_antisymmetric() {
        let a = bid(Uuid::new_v4(), dec!(25000), 0, dec!(50000), true);
        let b = bid(Uuid::new_v4(), dec!(25000), 10, dec!(50000), true);
        assert_eq!(winner_ordering(&a, &b), Ordering::Less);
        assert_eq!(winner_ordering(&b, &a), Ordering::Greater);
        assert_eq!(winner_ordering(&a, &a), Ordering::Equal);
    }
}
// endregion: --- Tests
