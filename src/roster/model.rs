//! Roster records as stored in the shared bucket

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Training cohort, assigned from the birth year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Núcleo (2017-2021)")]
    Nucleo,
    #[serde(rename = "Sub-11 (2015-2016)")]
    Sub11,
    #[serde(rename = "Sub-13 (2013-2014)")]
    Sub13,
    #[serde(rename = "Sub-15 (2011-2012)")]
    Sub15,
    #[serde(rename = "Sub-17 (2009-2010)")]
    Sub17,
}

impl Category {
    /// Label shown to users and stored in documents
    pub fn label(&self) -> &'static str {
        match self {
            Category::Nucleo => "Núcleo (2017-2021)",
            Category::Sub11 => "Sub-11 (2015-2016)",
            Category::Sub13 => "Sub-13 (2013-2014)",
            Category::Sub15 => "Sub-15 (2011-2012)",
            Category::Sub17 => "Sub-17 (2009-2010)",
        }
    }

    /// Inclusive birth-year range of the cohort
    pub fn birth_years(&self) -> (i32, i32) {
        match self {
            Category::Nucleo => (2017, 2021),
            Category::Sub11 => (2015, 2016),
            Category::Sub13 => (2013, 2014),
            Category::Sub15 => (2011, 2012),
            Category::Sub17 => (2009, 2010),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Guardian {
    pub full_name: String,
    pub rg: String,
    pub cpf: String,
    pub address: String,
    pub whatsapp: String,
    pub people_working_in_house: u32,
    pub people_living_in_house: u32,
}

/// A registered athlete. `id` is the merge identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Athlete {
    pub id: String,
    pub full_name: String,
    pub birth_date: String,
    #[serde(default)]
    pub position: String,
    pub category: Category,
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub school_grade: String,
    #[serde(default)]
    pub school_hours: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub guardian: Guardian,
    /// Training date (`YYYY-MM-DD`) → present. Absences are not stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance: Option<BTreeMap<String, bool>>,
}

impl Athlete {
    pub fn was_present(&self, date: &str) -> bool {
        self.attendance
            .as_ref()
            .and_then(|days| days.get(date).copied())
            .unwrap_or(false)
    }
}

/// Weekly slot of one category. Has no `id`, so schedule documents are
/// last-writer-wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub category: Category,
    pub days: String,
    pub time: String,
    pub location: String,
}
