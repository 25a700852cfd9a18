use chrono::{Local, NaiveDate};

/// The household's calendar day, in the server's local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days from `today` until `date`. Negative once expired.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}
