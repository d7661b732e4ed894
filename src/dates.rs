use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

use crate::error::{AppError, AppResult};

/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is kept.
pub fn parse_date(raw: &str) -> AppResult<Date> {
    let raw = raw.trim();
    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .map(|dt| dt.date())
        .map_err(|_| AppError::validation(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

/// Query-string bound: absent or blank means unbounded.
pub fn parse_bound(raw: Option<&str>) -> AppResult<Option<Date>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(Some)
            .map_err(|_| AppError::validation(format!("invalid date '{s}', expected YYYY-MM-DD"))),
    }
}

/// Serde adapter writing dates as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::Serializer;
    use time::{macros::format_description, Date};

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        let out = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(serde::ser::Error::custom)?;
        s.serialize_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn plain_and_rfc3339_dates() {
        assert_eq!(parse_date("2024-01-10").unwrap(), date!(2024 - 01 - 10));
        assert_eq!(parse_date("2024-01-10T18:30:00Z").unwrap(), date!(2024 - 01 - 10));
        assert!(matches!(parse_date("10/01/2024"), Err(AppError::Validation(_))));
    }

    #[test]
    fn bounds_may_be_absent() {
        assert_eq!(parse_bound(None).unwrap(), None);
        assert_eq!(parse_bound(Some(" ")).unwrap(), None);
        assert_eq!(parse_bound(Some("2024-02-29")).unwrap(), Some(date!(2024 - 02 - 29)));
        assert!(parse_bound(Some("2023-02-29")).is_err());
    }
}
