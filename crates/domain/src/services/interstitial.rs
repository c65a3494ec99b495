//! Daily search counter that gates the guest interstitial.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Searches per day before a guest sees the interstitial.
pub const SEARCHES_BEFORE_INTERSTITIAL: u32 = 5;

/// Persisted gate state, one instance per device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchGateState {
    pub search_count: u32,
    pub search_count_date: Option<NaiveDate>,
    pub interstitial_shown_date: Option<NaiveDate>,
}

impl SearchGateState {
    /// Records one search on `today` and reports whether the interstitial fires.
    ///
    /// The counter restarts on a new day and after firing. At most one
    /// interstitial is shown per day. Signed-in users are never counted.
    pub fn record_search(&mut self, today: NaiveDate, is_guest: bool) -> bool {
        if !is_guest {
            return false;
        }

        if self.search_count_date != Some(today) {
            self.search_count = 0;
            self.search_count_date = Some(today);
        }
        self.search_count = self.search_count.saturating_add(1);

        let shown_today = self.interstitial_shown_date == Some(today);
        if self.search_count >= SEARCHES_BEFORE_INTERSTITIAL && !shown_today {
            self.search_count = 0;
            self.interstitial_shown_date = Some(today);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_fifth_search_triggers_once() {
        let mut state = SearchGateState::default();
        let fired: Vec<bool> = (0..5).map(|_| state.record_search(day(18), true)).collect();
        assert_eq!(fired, vec![false, false, false, false, true]);
        assert_eq!(state.search_count, 0);
        assert_eq!(state.interstitial_shown_date, Some(day(18)));

        assert!(!state.record_search(day(18), true));
        assert_eq!(state.search_count, 1);
    }

    #[test]
    fn test_no_retrigger_same_day_after_many_searches() {
        let mut state = SearchGateState::default();
        let fired = (0..20).filter(|_| state.record_search(day(18), true)).count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_counter_resets_on_new_day() {
        let mut state = SearchGateState::default();
        for _ in 0..4 {
            state.record_search(day(17), true);
        }
        assert!(!state.record_search(day(18), true));
        assert_eq!(state.search_count, 1);
        assert_eq!(state.search_count_date, Some(day(18)));
    }

    #[test]
    fn test_fires_again_next_day() {
        let mut state = SearchGateState::default();
        for _ in 0..5 {
            state.record_search(day(17), true);
        }
        let fired = (0..5).filter(|_| state.record_search(day(18), true)).count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_signed_in_users_not_counted() {
        let mut state = SearchGateState::default();
        for _ in 0..10 {
            assert!(!state.record_search(day(18), false));
        }
        assert_eq!(state, SearchGateState::default());
    }
}
