//! As-of dates embedded in file names (`lineas_2024-03-31.csv`, `contactos 20240331.csv`).

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static DATE_TOKENS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\d{4})-(\d{2})-(\d{2})",
        r"(\d{4})_(\d{2})_(\d{2})",
        r"(?:^|\D)(\d{4})(\d{2})(\d{2})(?:\D|$)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Finds the first valid calendar date token in a file stem.
pub fn detect_as_of(stem: &str) -> Option<NaiveDate> {
    DATE_TOKENS.iter().find_map(|re| {
        re.captures_iter(stem).find_map(|caps| {
            let year = caps.get(1)?.as_str().parse().ok()?;
            let month = caps.get(2)?.as_str().parse().ok()?;
            let day = caps.get(3)?.as_str().parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
    })
}
