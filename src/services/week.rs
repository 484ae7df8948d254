use chrono::{Datelike, Days, NaiveDate};

/// Monday of the ISO week containing `date`.
///
/// Total over chrono's range: the first representable week has no Monday, so
/// dates in it map to `NaiveDate::MIN`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
    date.checked_sub_days(back).unwrap_or(NaiveDate::MIN)
}

/// The dates Monday..Sunday of the week starting at `week_start`. Shorter than
/// seven only for the last representable week.
pub fn week_dates(week_start: NaiveDate) -> Vec<NaiveDate> {
    (0..7)
        .map_while(|offset| week_start.checked_add_days(Days::new(offset)))
        .collect()
}

/// Parse a `YYYY-MM-DD` parameter. Blank or malformed input yields `None`.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (NaiveDate::MIN.num_days_from_ce()..=NaiveDate::MAX.num_days_from_ce())
            .prop_map(|n| NaiveDate::from_num_days_from_ce_opt(n).unwrap())
    }

    #[test]
    fn test_thursday_maps_to_preceding_monday() {
        assert_eq!(monday_of(d(2024, 3, 14)), d(2024, 3, 11));
    }

    #[test]
    fn test_sunday_stays_in_same_iso_week() {
        assert_eq!(monday_of(d(2024, 3, 17)), d(2024, 3, 11));
        assert_eq!(monday_of(d(2024, 3, 18)), d(2024, 3, 18));
    }

    #[test]
    fn test_monday_of_crosses_year_boundary() {
        // 2025-01-01 is a Wednesday.
        assert_eq!(monday_of(d(2025, 1, 1)), d(2024, 12, 30));
    }

    #[test]
    fn test_range_ends_do_not_panic() {
        assert_eq!(monday_of(NaiveDate::MIN), NaiveDate::MIN);
        assert_eq!(monday_of(NaiveDate::MAX).weekday(), Weekday::Mon);

        let last = week_dates(monday_of(NaiveDate::MAX));
        assert_eq!(last.last(), Some(&NaiveDate::MAX));
        assert!(last.len() <= 7);
    }

    #[test]
    fn test_week_dates_runs_monday_to_sunday() {
        let days = week_dates(d(2024, 3, 11));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], d(2024, 3, 11));
        assert_eq!(days[6], d(2024, 3, 17));
        assert_eq!(days[6].weekday(), Weekday::Sun);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(Some("2024-03-14")), Some(d(2024, 3, 14)));
        assert_eq!(parse_date(Some(" 2024-03-14 ")), Some(d(2024, 3, 14)));
        assert_eq!(parse_date(Some("14.03.2024")), None);
        assert_eq!(parse_date(Some("2024-02-30")), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(None), None);
    }

    proptest! {
        #[test]
        fn prop_monday_of_is_idempotent_and_bounded(day in any_date()) {
            let monday = monday_of(day);
            prop_assert_eq!(monday_of(monday), monday);
            prop_assert!(monday <= day);
            prop_assert!(day.signed_duration_since(monday).num_days() < 7);
            prop_assert!(monday.weekday() == Weekday::Mon || monday == NaiveDate::MIN);
        }

        #[test]
        fn prop_week_dates_are_consecutive(day in any_date()) {
            let days = week_dates(monday_of(day));
            prop_assert!(!days.is_empty());
            prop_assert!(days.contains(&day));
            for pair in days.windows(2) {
                prop_assert_eq!(pair[0].succ_opt(), Some(pair[1]));
            }
        }
    }
}
