//! Suggested publication times
//!
//! Short-form posts (X, Instagram) go out Tuesday 08:30 WAT, long-form
//! (Facebook) Friday 19:00 WAT. WAT is UTC+1 with no daylight saving.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Next suggested slot per content length class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationSlots {
    pub short_form: DateTime<Utc>,
    pub long_form: DateTime<Utc>,
}

/// First `weekday` at `minutes` past midnight UTC strictly after `now`
fn next_weekday_at(now: DateTime<Utc>, weekday: Weekday, minutes: i64) -> DateTime<Utc> {
    let days_ahead = (i64::from(weekday.num_days_from_monday())
        - i64::from(now.weekday().num_days_from_monday()))
    .rem_euclid(7);

    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let candidate =
        Utc.from_utc_datetime(&midnight) + Duration::days(days_ahead) + Duration::minutes(minutes);

    if candidate <= now {
        candidate + Duration::days(7)
    } else {
        candidate
    }
}

pub fn next_publication_slots(now: DateTime<Utc>) -> PublicationSlots {
    PublicationSlots {
        short_form: next_weekday_at(now, Weekday::Tue, 7 * 60 + 30),
        long_form: next_weekday_at(now, Weekday::Fri, 18 * 60),
    }
}
