use chrono::{NaiveDate, NaiveDateTime};

/// Calendar formats accepted for date keys, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%Y", "%Y.%m.%d"];

/// Date-time formats whose date part is used when a key carries a time.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Minimum length of a date key that is admitted into aggregation.
pub const MIN_DATE_KEY_LEN: usize = 5;

/// Whether `key` is long enough to be treated as a date at all.
///
/// Keys are never parsed for admission, only for ordering.
pub fn is_admissible_date_key(key: &str) -> bool {
    key.chars().count() >= MIN_DATE_KEY_LEN
}

/// Parse a date key into a calendar date.
///
/// Returns `None` when the key matches none of the supported formats.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(key, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(key, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Sort `items` chronologically by the date key returned from `key_fn`.
///
/// Parseable keys sort by calendar date and come before unparseable ones.
/// Ties (equal dates written differently, or two unparseable keys) fall back
/// to byte order so the result is total and deterministic. Each key is parsed
/// once.
pub fn sort_by_date_key<T>(items: &mut [T], key_fn: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| {
        let key = key_fn(item);
        let parsed = parse_date_key(key);
        (parsed.is_none(), parsed, key.to_string())
    });
}
