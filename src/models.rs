use crate::calendar::MonthKey;
use crate::errors::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Programming,
    Fitness,
    Work,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Programming, Category::Fitness, Category::Work];

    pub fn label(self) -> &'static str {
        match self {
            Category::Programming => "Coding",
            Category::Fitness => "Fitness",
            Category::Work => "Work",
        }
    }
}

/// Minutes logged for one day; `None` is an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayEntry {
    pub programming: Option<u32>,
    pub fitness: Option<u32>,
    pub work: Option<u32>,
}

impl DayEntry {
    pub fn get(&self, category: Category) -> Option<u32> {
        match category {
            Category::Programming => self.programming,
            Category::Fitness => self.fitness,
            Category::Work => self.work,
        }
    }

    pub fn set(&mut self, category: Category, value: Option<u32>) {
        match category {
            Category::Programming => self.programming = value,
            Category::Fitness => self.fitness = value,
            Category::Work => self.work = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthRecord {
    pub days: Vec<DayEntry>,
}

impl MonthRecord {
    pub fn empty(key: &MonthKey) -> Self {
        Self {
            days: vec![DayEntry::default(); key.days_in_month()],
        }
    }

    pub fn validate_for(&self, key: &MonthKey) -> Result<(), GridError> {
        let expected = key.days_in_month();
        if self.days.len() != expected {
            return Err(GridError::Validation(format!(
                "{key} has {expected} days but the record has {}",
                self.days.len()
            )));
        }
        Ok(())
    }

    pub fn series(&self, category: Category) -> Vec<Option<u32>> {
        self.days.iter().map(|day| day.get(category)).collect()
    }

    /// Sum of every filled cell in one category.
    pub fn category_total(&self, category: Category) -> u64 {
        self.days
            .iter()
            .filter_map(|day| day.get(category))
            .map(u64::from)
            .sum()
    }
}

/// Parses user-typed cell text. Blank text clears the cell.
pub fn parse_cell(text: &str) -> Result<Option<u32>, GridError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GridError::Validation(format!(
            "'{text}' is not a whole number of minutes"
        )));
    }
    text.parse::<u32>()
        .map(Some)
        .map_err(|_| GridError::Validation(format!("'{text}' is too large")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCell {
    pub day_index: usize,
    pub category: Category,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct NewUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveRecordRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub days: Vec<DayEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalAndAverage {
    pub total: u64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub programming: TotalAndAverage,
    pub fitness: TotalAndAverage,
    pub work: TotalAndAverage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GridResponse {
    pub key: MonthKey,
    pub days: Vec<DayEntry>,
    pub summary: MonthSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub key: MonthKey,
    pub days: Vec<DayEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub label: String,
    pub programming: u64,
    pub fitness: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub total_hours: f64,
}

/// Optional owner check sent by clients that address records by user.
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct MonthsQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MonthOption {
    pub key: MonthKey,
    pub label: String,
    pub days: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Month;

    #[test]
    fn parse_cell_accepts_whole_minutes_and_blanks() {
        assert_eq!(parse_cell("45").unwrap(), Some(45));
        assert_eq!(parse_cell(" 7 ").unwrap(), Some(7));
        assert_eq!(parse_cell("").unwrap(), None);
        assert_eq!(parse_cell("   ").unwrap(), None);
    }

    #[test]
    fn parse_cell_rejects_invalid_text() {
        for text in ["-5", "7.5", "abc", "1e3", "99999999999"] {
            assert!(
                matches!(parse_cell(text), Err(GridError::Validation(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn empty_record_matches_month_length() {
        let key = MonthKey::new(Month::February, 2024).unwrap();
        let record = MonthRecord::empty(&key);
        assert_eq!(record.days.len(), 29);
        assert!(record.validate_for(&key).is_ok());

        let march = MonthKey::new(Month::March, 2024).unwrap();
        assert!(record.validate_for(&march).is_err());
    }

    #[test]
    fn record_serializes_unset_cells_as_null() {
        let mut entry = DayEntry::default();
        entry.set(Category::Fitness, Some(30));
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "programming": null, "fitness": 30, "work": null })
        );
    }
}
