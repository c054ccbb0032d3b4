//! User management rows: pills, relative dates and the activation action.

use std::fmt;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::api::Provider;
use crate::services::users::{User, UsersPage};

/// A label attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pill {
    pub label: String,
    pub highlight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UserAction {
    Activate,
    Deactivate,
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate => f.write_str("Activate"),
            Self::Deactivate => f.write_str("Deactivate"),
        }
    }
}

/// One row of the user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub pills: Vec<Pill>,
    pub last_seen: String,
    pub last_pr: String,
    pub activated: bool,
    /// What toggling the user would do.
    pub action: UserAction,
}

/// Rows for one page of users. Relative dates are computed against `now`.
pub fn create_users_table_data(provider: &str, page: &UsersPage, now: DateTime<Utc>) -> Vec<UserRow> {
    page.results
        .iter()
        .flatten()
        .map(|user| user_row(provider, user, now))
        .collect()
}

fn user_row(provider: &str, user: &User, now: DateTime<Utc>) -> UserRow {
    UserRow {
        username: user.username.clone(),
        name: user.name.clone(),
        avatar_url: owner_avatar_url(provider, &user.username),
        pills: create_pills(user),
        last_seen: relative_date(user.lastseen.as_deref(), now),
        last_pr: relative_date(user.latest_private_pr_date.as_deref(), now),
        activated: user.activated,
        action: if user.activated {
            UserAction::Deactivate
        } else {
            UserAction::Activate
        },
    }
}

pub fn create_pills(user: &User) -> Vec<Pill> {
    let mut pills = Vec::new();
    if user.is_admin == Some(true) {
        pills.push(Pill {
            label: "Admin".to_string(),
            highlight: true,
        });
    }
    if let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) {
        pills.push(Pill {
            label: email.to_string(),
            highlight: false,
        });
    }
    if user.student {
        pills.push(Pill {
            label: "Student".to_string(),
            highlight: false,
        });
    }
    pills
}

/// Avatar image of an owner on its provider; `None` for unknown providers.
pub fn owner_avatar_url(provider: &str, owner: &str) -> Option<String> {
    Provider::from_alias(provider).map(|p| match p {
        Provider::GitHub => format!("https://github.com/{owner}.png?size=40"),
        Provider::GitLab => format!("https://gitlab.com/{owner}.png?size=40"),
        Provider::Bitbucket => format!("https://bitbucket.org/account/{owner}/avatar/40"),
    })
}

/// Human distance between `date` and `now`, or `never` when the date is
/// absent or unreadable.
pub fn relative_date(date: Option<&str>, now: DateTime<Utc>) -> String {
    date.and_then(parse_timestamp)
        .map_or_else(|| "never".to_string(), |d| format_distance(d, now))
}

/// Accepts RFC 3339, naive ISO 8601 timestamps (taken as UTC) and plain dates.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2520;
const MINUTES_IN_MONTH: i64 = 43200;
const MINUTES_IN_TWO_MONTHS: i64 = 86400;

fn plural(count: i64, one: &str, many: &str) -> String {
    if count == 1 {
        one.to_string()
    } else {
        many.replace("{}", &count.to_string())
    }
}

/// Distance between two instants in words, without a suffix
/// (`less than a minute`, `about 3 hours`, `over 1 year`, ...).
pub fn format_distance(date: DateTime<Utc>, base: DateTime<Utc>) -> String {
    let (earlier, later) = if date <= base { (date, base) } else { (base, date) };
    let seconds = (later - earlier).num_seconds();
    let minutes = (seconds as f64 / 60.0).round() as i64;

    if minutes < 2 {
        let words = if minutes == 0 { "less than a minute" } else { "1 minute" };
        return words.to_string();
    }
    if minutes < 45 {
        return format!("{minutes} minutes");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if minutes < MINUTES_IN_DAY {
        let hours = (minutes as f64 / 60.0).round() as i64;
        return plural(hours, "about 1 hour", "about {} hours");
    }
    if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        return "1 day".to_string();
    }
    if minutes < MINUTES_IN_MONTH {
        let days = (minutes as f64 / MINUTES_IN_DAY as f64).round() as i64;
        return plural(days, "1 day", "{} days");
    }
    if minutes < MINUTES_IN_TWO_MONTHS {
        let months = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
        return plural(months, "about 1 month", "about {} months");
    }

    let months = months_between(earlier, later);
    if months < 12 {
        let nearest = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
        return plural(nearest, "1 month", "{} months");
    }

    let months_since_start_of_year = months % 12;
    let years = months / 12;
    if months_since_start_of_year < 3 {
        plural(years, "about 1 year", "about {} years")
    } else if months_since_start_of_year < 9 {
        plural(years, "over 1 year", "over {} years")
    } else {
        format!("almost {} years", years + 1)
    }
}

/// Whole calendar months from `earlier` to `later`.
fn months_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    use chrono::Datelike;

    let mut months = i64::from(later.year() - earlier.year()) * 12
        + i64::from(later.month()) - i64::from(earlier.month());
    while months > 0 {
        let anchored = u32::try_from(months)
            .ok()
            .and_then(|m| earlier.checked_add_months(Months::new(m)));
        match anchored {
            Some(anchored) if anchored > later => months -= 1,
            _ => break,
        }
    }
    months
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn ago(duration: Duration) -> String {
        format_distance(now() - duration, now())
    }

    fn user(value: serde_json::Value) -> User {
        serde_json::from_value(value).expect("valid user")
    }

    #[test]
    fn test_format_distance_buckets() {
        assert_eq!(ago(Duration::seconds(20)), "less than a minute");
        assert_eq!(ago(Duration::seconds(70)), "1 minute");
        assert_eq!(ago(Duration::minutes(10)), "10 minutes");
        assert_eq!(ago(Duration::minutes(50)), "about 1 hour");
        assert_eq!(ago(Duration::hours(5)), "about 5 hours");
        assert_eq!(ago(Duration::hours(30)), "1 day");
        assert_eq!(ago(Duration::days(5)), "5 days");
        assert_eq!(ago(Duration::days(45)), "about 2 months");
        assert_eq!(ago(Duration::days(100)), "3 months");
        assert_eq!(ago(Duration::days(366)), "about 1 year");
        assert_eq!(ago(Duration::days(365 + 180)), "over 1 year");
        assert_eq!(ago(Duration::days(365 + 300)), "almost 2 years");
    }

    #[test]
    fn test_format_distance_is_symmetric() {
        let later = now() + Duration::days(5);
        assert_eq!(format_distance(later, now()), "5 days");
    }

    #[test]
    fn test_relative_date() {
        assert_eq!(relative_date(None, now()), "never");
        assert_eq!(relative_date(Some("not a date"), now()), "never");
        assert_eq!(relative_date(Some("2024-06-10T12:00:00Z"), now()), "5 days");
        assert_eq!(relative_date(Some("2024-06-15T09:00:00.123456"), now()), "about 3 hours");
        assert_eq!(relative_date(Some("2024-06-14"), now()), "1 day");
    }

    #[test]
    fn test_pills() {
        let admin = user(json!({
            "username": "laudna",
            "email": "laudna@example.com",
            "isAdmin": true,
            "student": true
        }));
        assert_eq!(
            create_pills(&admin),
            vec![
                Pill { label: "Admin".to_string(), highlight: true },
                Pill { label: "laudna@example.com".to_string(), highlight: false },
                Pill { label: "Student".to_string(), highlight: false },
            ]
        );

        let plain = user(json!({ "username": "imogen", "email": "", "isAdmin": false }));
        assert!(create_pills(&plain).is_empty());
    }

    #[test]
    fn test_user_rows() {
        let page: UsersPage = serde_json::from_value(json!({
            "count": 2,
            "results": [
                { "username": "laudna", "name": "Laudna", "activated": true,
                  "lastseen": "2024-06-14T12:00:00Z", "latestPrivatePrDate": null },
                null,
                { "username": "imogen", "activated": false }
            ]
        }))
        .unwrap();

        let rows = create_users_table_data("gh", &page, now());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action, UserAction::Deactivate);
        assert_eq!(rows[0].last_seen, "1 day");
        assert_eq!(rows[0].last_pr, "never");
        assert_eq!(
            rows[0].avatar_url.as_deref(),
            Some("https://github.com/laudna.png?size=40")
        );
        assert_eq!(rows[1].action.to_string(), "Activate");
    }

    #[test]
    fn test_avatar_for_unknown_provider() {
        assert_eq!(owner_avatar_url("invalid", "laudna"), None);
        assert_eq!(
            owner_avatar_url("bb", "laudna").as_deref(),
            Some("https://bitbucket.org/account/laudna/avatar/40")
        );
    }
}
