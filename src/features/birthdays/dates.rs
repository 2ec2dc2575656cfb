//! Birthday dates and timezones

use chrono::NaiveDate;
use chrono_tz::TZ_VARIANTS;

/// Discord caps autocomplete responses at 25 choices
pub const MAX_TIMEZONE_SUGGESTIONS: usize = 25;

/// Parse a `YYYY-MM-DD` birthday; impossible dates are rejected
pub fn parse_birthday_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

/// Canonical IANA name for a timezone, matched case-insensitively
pub fn resolve_timezone(input: &str) -> Option<&'static str> {
    let wanted = input.trim().to_lowercase();
    TZ_VARIANTS
        .iter()
        .map(|tz| tz.name())
        .find(|name| name.to_lowercase() == wanted)
}

/// Timezones whose name contains `query` (case-insensitive), at most `limit`
pub fn search_timezones(query: &str, limit: usize) -> Vec<&'static str> {
    let needle = query.trim().to_lowercase();
    TZ_VARIANTS
        .iter()
        .map(|tz| tz.name())
        .filter(|name| name.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Render a user's birthday settings; the year is shown unless it is `current_year`
pub fn format_birthday_info(
    birthday: &crate::database::UserBirthday,
    current_year: i32,
) -> String {
    use chrono::Datelike;

    let date = if birthday.date.year() == current_year {
        birthday.date.format("%B %-d").to_string()
    } else {
        birthday.date.format("%B %-d, %Y").to_string()
    };
    let guilds = if birthday.announce_in_guild_ids.is_empty() {
        "None".to_string()
    } else {
        birthday.announce_in_guild_ids.join(", ")
    };

    format!(
        "### Your Birthday Information\n\
         - **Date:** {}\n\
         - **Timezone:** {}\n\
         - **Show Age:** {}\n\
         - **Announce in Guilds by Default:** {}\n\
         - **Announce in Specific Guilds:** {}",
        date,
        birthday.timezone,
        yes_no(birthday.show_age),
        yes_no(birthday.announce_in_guilds_by_default),
        guilds
    )
}
