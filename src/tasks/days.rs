use chrono::Weekday;

/// Resolves a plan's day label to a weekday. Accepts English names and
/// abbreviations, Japanese day characters (with or without 曜/曜日) and the
/// numbers 0-6 with 0 as Sunday. Matching ignores case and a trailing '.'.
pub fn weekday_from_label(label: &str) -> Option<Weekday> {
    let normalized = label.trim().trim_end_matches('.').to_lowercase();
    let normalized = normalized
        .trim_end_matches("曜日")
        .trim_end_matches('曜')
        .trim();

    let weekday = match normalized {
        "monday" | "mon" | "mo" | "月" | "1" => Weekday::Mon,
        "tuesday" | "tue" | "tues" | "tu" | "火" | "2" => Weekday::Tue,
        "wednesday" | "wed" | "we" | "水" | "3" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" | "th" | "木" | "4" => Weekday::Thu,
        "friday" | "fri" | "fr" | "金" | "5" => Weekday::Fri,
        "saturday" | "sat" | "sa" | "土" | "6" => Weekday::Sat,
        "sunday" | "sun" | "su" | "日" | "0" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Position in a Monday-start week, 0..=6.
pub fn week_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}
