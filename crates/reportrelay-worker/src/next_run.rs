use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Weekday,
};

/// Next firing instant for a weekly slot, in the time zone of `now`.
///
/// Today's slot counts while it has not passed yet; an instant equal to the
/// slot is still "not passed". Otherwise the next matching weekday is used,
/// one week out when the weekday matches but the time has passed.
pub fn next_run<Tz: TimeZone>(
    now: &DateTime<Tz>,
    at: NaiveTime,
    weekday: Weekday,
) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    let slot_today = resolve_local(&tz, today.and_time(at));

    let current = today.weekday().num_days_from_sunday() as i64;
    let target = weekday.num_days_from_sunday() as i64;

    let mut days = 0;
    if *now > slot_today || current != target {
        days = (target - current + 7) % 7;
        if days == 0 && *now > slot_today {
            days = 7;
        }
    }

    if days == 0 {
        return slot_today;
    }
    resolve_local(&tz, (today + Duration::days(days)).and_time(at))
}

// Gap: shift forward an hour. Overlap: earliest.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_same_weekday_after_slot_moves_a_week() {
        // 2024-01-01 is a Monday.
        let next = next_run(&utc(2024, 1, 1, 10, 0), nine(), Weekday::Mon);
        assert_eq!(next, utc(2024, 1, 8, 9, 0));
    }

    #[test]
    fn test_same_weekday_before_slot_fires_today() {
        let next = next_run(&utc(2024, 1, 1, 8, 0), nine(), Weekday::Mon);
        assert_eq!(next, utc(2024, 1, 1, 9, 0));
    }

    #[test]
    fn test_sunday_morning_targets_sunday() {
        // 2024-01-07 is a Sunday.
        let next = next_run(&utc(2024, 1, 7, 8, 0), nine(), Weekday::Sun);
        assert_eq!(next, utc(2024, 1, 7, 9, 0));
    }

    #[test]
    fn test_other_weekday_picks_next_occurrence() {
        // Wednesday -> following Monday.
        let next = next_run(&utc(2024, 1, 3, 8, 0), nine(), Weekday::Mon);
        assert_eq!(next, utc(2024, 1, 8, 9, 0));

        // Saturday -> next day.
        let next = next_run(&utc(2024, 1, 6, 23, 59), nine(), Weekday::Sun);
        assert_eq!(next, utc(2024, 1, 7, 9, 0));
    }

    #[test]
    fn test_exact_slot_is_not_passed() {
        let slot = utc(2024, 1, 1, 9, 0);
        assert_eq!(next_run(&slot, nine(), Weekday::Mon), slot);
    }

    #[test]
    fn test_same_now_gives_same_instant() {
        let now = utc(2024, 2, 14, 17, 30);
        assert_eq!(
            next_run(&now, nine(), Weekday::Fri),
            next_run(&now, nine(), Weekday::Fri)
        );
    }

    #[test]
    fn test_result_is_a_fixed_point() {
        let first = next_run(&utc(2024, 2, 14, 17, 30), nine(), Weekday::Fri);
        assert_eq!(next_run(&first, nine(), Weekday::Fri), first);
        assert!(first > utc(2024, 2, 14, 17, 30));
        assert_eq!(first.weekday(), Weekday::Fri);
    }

    #[test]
    fn test_keeps_time_zone_of_now() {
        let msk = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = msk.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();

        let next = next_run(&now, nine(), Weekday::Mon);

        assert_eq!(next, msk.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap());
        assert_eq!(next.offset(), &msk);
    }
}
