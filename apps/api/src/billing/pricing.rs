//! Subscription pricing. All amounts are in paise.

use serde::Serialize;

use crate::gamification::VIRTUOSO_BADGE;
use crate::models::user::User;

pub const BASE_PRICE_PAISE: i64 = 49_900;
pub const CURRENCY: &str = "INR";

const XP_PER_DISCOUNT_POINT: i64 = 1_000;
const VIRTUOSO_BONUS_PERCENT: i64 = 5;
const MAX_DISCOUNT_PERCENT: i64 = 40;

/// One percent per 1000 XP, five more for the virtuoso badge, capped at 40.
pub fn calculate_discount(xp: i64, badges: &[String]) -> i64 {
    let mut discount = xp.max(0) / XP_PER_DISCOUNT_POINT;
    if badges.iter().any(|b| b == VIRTUOSO_BADGE) {
        discount += VIRTUOSO_BONUS_PERCENT;
    }
    discount.min(MAX_DISCOUNT_PERCENT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionDetails {
    pub base_price_paise: i64,
    pub discount_percent: i64,
    pub final_price_paise: i64,
}

impl SubscriptionDetails {
    /// Prices the subscription from the user's current XP and badges.
    pub fn for_user(user: &User) -> Self {
        let discount_percent = calculate_discount(user.xp, &user.badges);
        let discount_paise = BASE_PRICE_PAISE * discount_percent / 100;
        SubscriptionDetails {
            base_price_paise: BASE_PRICE_PAISE,
            discount_percent,
            final_price_paise: BASE_PRICE_PAISE - discount_paise,
        }
    }
}

/// Wire shape of `GET /get_subscription_details`.
#[derive(Debug, Serialize)]
pub struct SubscriptionDetailsResponse {
    pub base_price_inr: f64,
    pub discount_percent: i64,
    pub final_price_inr: f64,
    pub final_price_paise: i64,
}

impl From<SubscriptionDetails> for SubscriptionDetailsResponse {
    fn from(details: SubscriptionDetails) -> Self {
        SubscriptionDetailsResponse {
            base_price_inr: details.base_price_paise as f64 / 100.0,
            discount_percent: details.discount_percent,
            final_price_inr: details.final_price_paise as f64 / 100.0,
            final_price_paise: details.final_price_paise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::user_with;

    fn badges(list: &[&str]) -> Vec<String> {
        list.iter().map(|b| b.to_string()).collect()
    }

    #[test]
    fn test_discount_table() {
        assert_eq!(calculate_discount(0, &[]), 0);
        assert_eq!(calculate_discount(2_500, &[]), 2);
        assert_eq!(calculate_discount(0, &badges(&[VIRTUOSO_BADGE])), 5);
        assert_eq!(calculate_discount(40_000, &[]), 40);
        assert_eq!(calculate_discount(40_000, &badges(&[VIRTUOSO_BADGE])), 40);
    }

    #[test]
    fn test_other_badges_do_not_discount() {
        assert_eq!(calculate_discount(999, &badges(&["firstEcho", "curiousMind"])), 0);
    }

    #[test]
    fn test_details_floor_the_discount() {
        let user = user_with(2_500, &[]);
        let details = SubscriptionDetails::for_user(&user);
        assert_eq!(details.discount_percent, 2);
        // 49900 * 2 / 100 = 998
        assert_eq!(details.final_price_paise, 48_902);

        let user = user_with(3_000, &[]);
        let details = SubscriptionDetails::for_user(&user);
        // 49900 * 3 / 100 = 1497
        assert_eq!(details.final_price_paise, 48_403);
    }

    #[test]
    fn test_response_in_rupees() {
        let response: SubscriptionDetailsResponse =
            SubscriptionDetails::for_user(&user_with(0, &[VIRTUOSO_BADGE])).into();
        assert_eq!(response.base_price_inr, 499.0);
        assert_eq!(response.discount_percent, 5);
        assert_eq!(response.final_price_paise, 47_405);
        assert!((response.final_price_inr - 474.05).abs() < 1e-9);
    }
}
