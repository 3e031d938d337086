//! Club roster on top of the replicated store
//!
//! Athletes live under one key as a collection of records (merged by `id`),
//! the weekly schedule under another as a plain list (last writer wins).
//! The functions here are pure document transformations suitable as
//! store updaters.

pub mod model;
pub mod rules;

pub use model::{Athlete, Category, Guardian, ScheduleItem};
pub use rules::{
    category_for_birth_date, category_for_year, generate_record_id, initial_schedules,
    CATEGORIES, POSITIONS,
};

use anyhow::Result;

pub const ATHLETES_KEY: &str = "athletes";
pub const SCHEDULES_KEY: &str = "schedules";

/// Fields collected when registering an athlete
#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub full_name: String,
    pub birth_date: String,
    pub position: String,
    pub school_name: String,
    pub school_grade: String,
    pub school_hours: String,
    pub address: String,
    pub whatsapp: String,
    pub guardian: Guardian,
}

impl Registration {
    /// Builds the athlete record, assigning category and identity
    pub fn into_athlete(self, id: String) -> Result<Athlete> {
        if self.full_name.trim().is_empty() {
            anyhow::bail!("athlete name is required");
        }
        let Some(category) = category_for_birth_date(&self.birth_date) else {
            anyhow::bail!(
                "birth date {:?} does not match any category",
                self.birth_date
            );
        };
        if !self.position.is_empty() && !POSITIONS.contains(&self.position.as_str()) {
            anyhow::bail!(
                "unknown position {:?} (expected one of: {})",
                self.position,
                POSITIONS.join(", ")
            );
        }

        Ok(Athlete {
            id,
            full_name: self.full_name.trim().to_string(),
            birth_date: self.birth_date,
            position: self.position,
            category,
            school_name: self.school_name,
            school_grade: self.school_grade,
            school_hours: self.school_hours,
            address: self.address,
            whatsapp: self.whatsapp,
            guardian: self.guardian,
            attendance: Some(Default::default()),
        })
    }
}

/// Adds an athlete, replacing any record with the same id
pub fn add_athlete(athletes: &[Athlete], athlete: &Athlete) -> Vec<Athlete> {
    let mut next: Vec<Athlete> = athletes
        .iter()
        .filter(|existing| existing.id != athlete.id)
        .cloned()
        .collect();
    next.push(athlete.clone());
    next
}

/// Records presence for one training date. Absence removes the entry.
pub fn mark_attendance(athletes: &[Athlete], id: &str, date: &str, present: bool) -> Vec<Athlete> {
    athletes
        .iter()
        .map(|athlete| {
            if athlete.id != id {
                return athlete.clone();
            }
            let mut updated = athlete.clone();
            let days = updated.attendance.get_or_insert_with(Default::default);
            if present {
                days.insert(date.to_string(), true);
            } else {
                days.remove(date);
            }
            updated
        })
        .collect()
}

/// Athletes of one category, in stored order
pub fn athletes_in(athletes: &[Athlete], category: Category) -> Vec<&Athlete> {
    athletes
        .iter()
        .filter(|athlete| athlete.category == category)
        .collect()
}

/// Replaces the slot of one category; other slots are kept
pub fn update_schedule(schedules: &[ScheduleItem], item: &ScheduleItem) -> Vec<ScheduleItem> {
    let mut replaced = false;
    let mut next: Vec<ScheduleItem> = schedules
        .iter()
        .map(|existing| {
            if existing.category == item.category {
                replaced = true;
                item.clone()
            } else {
                existing.clone()
            }
        })
        .collect();
    if !replaced {
        next.push(item.clone());
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(name: &str, birth_date: &str) -> Registration {
        Registration {
            full_name: name.to_string(),
            birth_date: birth_date.to_string(),
            position: "Goleiro".to_string(),
            ..Registration::default()
        }
    }

    #[test]
    fn test_registration_assigns_category() {
        let athlete = registration("Ana", "2014-05-01")
            .into_athlete("a1".to_string())
            .unwrap();
        assert_eq!(athlete.category, Category::Sub13);
        assert_eq!(athlete.attendance, Some(Default::default()));
    }

    #[test]
    fn test_registration_rejects_out_of_range_birth_date() {
        let result = registration("Bo", "2005-01-01").into_athlete("b1".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_registration_rejects_unknown_position() {
        let mut form = registration("Cid", "2016-01-01");
        form.position = "Pivô".to_string();
        assert!(form.into_athlete("c1".to_string()).is_err());
    }

    #[test]
    fn test_attendance_toggle_removes_absences() {
        let athlete = registration("Ana", "2014-05-01")
            .into_athlete("a1".to_string())
            .unwrap();
        let roster = vec![athlete];

        let roster = mark_attendance(&roster, "a1", "2026-03-02", true);
        assert!(roster[0].was_present("2026-03-02"));

        let roster = mark_attendance(&roster, "a1", "2026-03-02", false);
        assert!(!roster[0].was_present("2026-03-02"));
        assert!(roster[0].attendance.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_update_schedule_replaces_matching_category() {
        let schedules = initial_schedules();
        let item = ScheduleItem {
            category: Category::Sub17,
            days: "Sábados".to_string(),
            time: "08:00 - 10:00".to_string(),
            location: "Campo 2".to_string(),
        };
        let next = update_schedule(&schedules, &item);
        assert_eq!(next.len(), schedules.len());
        assert_eq!(next[4], item);
        assert_eq!(next[0], schedules[0]);
    }

    #[test]
    fn test_athlete_json_uses_camel_case() {
        let athlete = registration("Ana", "2014-05-01")
            .into_athlete("a1".to_string())
            .unwrap();
        let value = serde_json::to_value(&athlete).unwrap();
        assert_eq!(value["fullName"], "Ana");
        assert_eq!(value["category"], "Sub-13 (2013-2014)");
        assert_eq!(value["guardian"]["peopleLivingInHouse"], 0);
    }
}
