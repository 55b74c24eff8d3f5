use chrono::{DateTime, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar date recorded as a candidate's completion date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
