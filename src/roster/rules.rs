//! Category assignment and static club configuration

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};

use super::model::{Category, ScheduleItem};

/// Categories in display order
pub const CATEGORIES: [Category; 5] = [
    Category::Nucleo,
    Category::Sub11,
    Category::Sub13,
    Category::Sub15,
    Category::Sub17,
];

pub const POSITIONS: &[&str] = &[
    "Goleiro",
    "Zagueiro",
    "Lateral Direito",
    "Lateral Esquerdo",
    "Volante",
    "Meio-Campo",
    "Atacante",
    "Ponta Direita",
    "Ponta Esquerda",
];

const DEFAULT_LOCATION: &str = "Campo Principal";

/// Cohort for a birth year, `None` outside every range
pub fn category_for_year(year: i32) -> Option<Category> {
    CATEGORIES.into_iter().find(|category| {
        let (first, last) = category.birth_years();
        (first..=last).contains(&year)
    })
}

/// Cohort for a birth date given as `YYYY-MM-DD` or an RFC 3339 timestamp
///
/// Returns `None` for empty or unparsable input and for years outside every
/// category.
pub fn category_for_birth_date(birth_date: &str) -> Option<Category> {
    birth_year(birth_date).and_then(category_for_year)
}

fn birth_year(birth_date: &str) -> Option<i32> {
    let trimmed = birth_date.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.year());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|timestamp| timestamp.year())
}

/// Schedule used until someone publishes one
pub fn initial_schedules() -> Vec<ScheduleItem> {
    let slot = |category, days: &str, time: &str| ScheduleItem {
        category,
        days: days.to_string(),
        time: time.to_string(),
        location: DEFAULT_LOCATION.to_string(),
    };
    vec![
        slot(Category::Nucleo, "Terças e Quintas", "09:00 - 10:00"),
        slot(Category::Sub11, "Terças e Quintas", "10:00 - 11:30"),
        slot(Category::Sub13, "Segundas e Quartas", "14:00 - 15:30"),
        slot(Category::Sub15, "Segundas e Quartas", "15:30 - 17:00"),
        slot(Category::Sub17, "Sextas", "15:00 - 17:00"),
    ]
}

/// Identity for a new record: the current UTC time with milliseconds
pub fn generate_record_id() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
