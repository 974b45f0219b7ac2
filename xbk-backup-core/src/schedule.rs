use chrono::{Datelike, Weekday};

/// Decides whether the archive goes out today.
///
/// No policy, or a blank one, means every day. Otherwise the policy is a
/// weekday name such as `friday`, compared without regard to case.
pub fn should_upload_today<D: Datelike>(weekday_policy: Option<&str>, today: &D) -> bool {
    let policy = match weekday_policy.map(str::trim) {
        None | Some("") => return true,
        Some(policy) => policy,
    };
    weekday_name(today.weekday()).eq_ignore_ascii_case(policy)
}

/// Lowercase English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
