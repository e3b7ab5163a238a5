//! Gamification: XP levels, the badge catalogue and validation of
//! client-reported progress.
//!
//! XP and badges feed the subscription discount, so updates are bounded
//! here: a delta must be positive and at most `MAX_XP_DELTA`, and only
//! catalogue badges are accepted. Every accepted update is written to the
//! `gamification_events` audit log by the user store.

pub mod handlers;

/// Largest XP delta accepted in one update.
pub const MAX_XP_DELTA: i64 = 100;

/// XP needed to reach level `index + 1`.
pub const LEVEL_THRESHOLDS: [i64; 11] = [0, 100, 250, 500, 800, 1200, 1700, 2300, 3000, 4000, 5500];

/// Awarded for trying all five personas; worth a flat subscription discount.
pub const VIRTUOSO_BADGE: &str = "personaVirtuoso";

pub const BADGES: [&str; 7] = [
    "firstEcho",
    "curiousMind",
    "level2Reached",
    "sessionWeaver",
    "timeTraveler",
    "dedicatedListener",
    VIRTUOSO_BADGE,
];

pub fn is_known_badge(badge: &str) -> bool {
    BADGES.contains(&badge)
}

/// Level for an XP total, starting at 1.
pub fn level_for_xp(xp: i64) -> usize {
    LEVEL_THRESHOLDS
        .iter()
        .take_while(|&&threshold| xp >= threshold)
        .count()
        .max(1)
}

/// The part of a client update that passes validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidatedUpdate {
    pub xp_delta: i64,
    pub badges: Vec<String>,
}

impl ValidatedUpdate {
    pub fn is_empty(&self) -> bool {
        self.xp_delta == 0 && self.badges.is_empty()
    }
}

/// Drops out-of-range XP deltas and unknown or repeated badges.
pub fn validate_update(xp: Option<i64>, badges: Option<&[String]>) -> ValidatedUpdate {
    let xp_delta = xp
        .filter(|delta| (1..=MAX_XP_DELTA).contains(delta))
        .unwrap_or(0);

    let mut accepted: Vec<String> = Vec::new();
    for badge in badges.unwrap_or_default() {
        let badge = badge.trim();
        if is_known_badge(badge) && !accepted.iter().any(|b| b == badge) {
            accepted.push(badge.to_string());
        }
    }

    ValidatedUpdate {
        xp_delta,
        badges: accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_xp() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(799), 4);
        assert_eq!(level_for_xp(5500), 11);
        assert_eq!(level_for_xp(1_000_000), 11);
        assert_eq!(level_for_xp(-5), 1);
    }

    #[test]
    fn test_validate_update_bounds_xp() {
        assert_eq!(validate_update(Some(15), None).xp_delta, 15);
        assert_eq!(validate_update(Some(MAX_XP_DELTA), None).xp_delta, 100);
        assert_eq!(validate_update(Some(101), None).xp_delta, 0);
        assert_eq!(validate_update(Some(0), None).xp_delta, 0);
        assert_eq!(validate_update(Some(-50), None).xp_delta, 0);
    }

    #[test]
    fn test_validate_update_filters_badges() {
        let badges = vec![
            "firstEcho".to_string(),
            "madeUpBadge".to_string(),
            "firstEcho".to_string(),
            " personaVirtuoso ".to_string(),
        ];
        let update = validate_update(None, Some(&badges));
        assert_eq!(update.badges, ["firstEcho", "personaVirtuoso"]);
    }

    #[test]
    fn test_nothing_valid_is_empty() {
        let badges = vec!["bogus".to_string()];
        assert!(validate_update(Some(40_000), Some(&badges)).is_empty());
        assert!(validate_update(None, None).is_empty());
    }
}
