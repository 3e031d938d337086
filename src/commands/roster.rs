//! Roster workflows: registration, attendance, listing and the schedule

use anyhow::Result;
use std::sync::Arc;

use super::{settle, CommandContext};
use crate::roster::{
    add_athlete, athletes_in, category_for_birth_date, generate_record_id, initial_schedules,
    mark_attendance, update_schedule, Athlete, Category, Registration, ScheduleItem,
    ATHLETES_KEY, CATEGORIES, SCHEDULES_KEY,
};
use crate::store::PullOutcome;

/// Category names accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CategoryArg {
    Nucleo,
    Sub11,
    Sub13,
    Sub15,
    Sub17,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Nucleo => Category::Nucleo,
            CategoryArg::Sub11 => Category::Sub11,
            CategoryArg::Sub13 => Category::Sub13,
            CategoryArg::Sub15 => Category::Sub15,
            CategoryArg::Sub17 => Category::Sub17,
        }
    }
}

/// Registers an athlete and replicates the roster
pub async fn handle_register_command(
    ctx: &CommandContext,
    registration: Registration,
) -> Result<Athlete> {
    let athlete = registration.into_athlete(generate_record_id())?;

    let store = ctx.open(ATHLETES_KEY, Vec::<Athlete>::new())?;
    let added = Arc::new(athlete.clone());
    store.write(move |athletes| add_athlete(athletes, &added));
    settle(&store).await;

    println!(
        "🟢 Registered {} ({}) as {}",
        athlete.full_name, athlete.id, athlete.category
    );
    ctx.report(&store);
    Ok(athlete)
}

/// Marks an athlete present or absent on a training date
pub async fn handle_attend_command(
    ctx: &CommandContext,
    athlete_id: &str,
    date: Option<String>,
    present: bool,
) -> Result<()> {
    let date = date.unwrap_or_else(today);

    let store = ctx.open(ATHLETES_KEY, Vec::<Athlete>::new())?;
    if store.pull().await == PullOutcome::Failed {
        eprintln!("⚠️  Remote unavailable, using cached roster");
    }
    let Some(athlete) = store.read().into_iter().find(|a| a.id == athlete_id) else {
        anyhow::bail!("no athlete with id {athlete_id}");
    };

    let id = athlete_id.to_string();
    let day = date.clone();
    store.write(move |athletes| mark_attendance(athletes, &id, &day, present));
    settle(&store).await;

    let word = if present { "present" } else { "absent" };
    println!("🟢 {} marked {word} on {date}", athlete.full_name);
    ctx.report(&store);
    Ok(())
}

/// Lists athletes grouped by category
pub async fn handle_list_command(
    ctx: &CommandContext,
    only: Option<Category>,
    date: Option<String>,
) -> Result<Vec<Athlete>> {
    let store = ctx.open(ATHLETES_KEY, Vec::<Athlete>::new())?;
    if store.pull().await == PullOutcome::Failed {
        eprintln!("⚠️  Remote unavailable, showing cached roster");
    }
    let athletes = store.read();
    let date = date.unwrap_or_else(today);

    for category in CATEGORIES {
        if only.is_some_and(|wanted| wanted != category) {
            continue;
        }
        let members = athletes_in(&athletes, category);
        println!("\n{category} ({})", members.len());
        for athlete in members {
            let mark = if athlete.was_present(&date) { "✔" } else { " " };
            println!(
                "  [{mark}] {:<30} {:<16} {}",
                athlete.full_name, athlete.position, athlete.id
            );
        }
    }
    ctx.report(&store);
    Ok(athletes)
}

/// Prints the weekly schedule
pub async fn handle_schedule_show_command(ctx: &CommandContext) -> Result<Vec<ScheduleItem>> {
    let store = ctx.open(SCHEDULES_KEY, initial_schedules())?;
    store.pull().await;
    let schedules = store.read();
    for item in &schedules {
        println!(
            "{:<22} {:<20} {:<15} {}",
            item.category.label(),
            item.days,
            item.time,
            item.location
        );
    }
    ctx.report(&store);
    Ok(schedules)
}

/// Replaces the slot of one category
pub async fn handle_schedule_set_command(
    ctx: &CommandContext,
    item: ScheduleItem,
) -> Result<Vec<ScheduleItem>> {
    let store = ctx.open(SCHEDULES_KEY, initial_schedules())?;
    store.pull().await;

    let updated = item.clone();
    store.write(move |schedules| update_schedule(schedules, &updated));
    settle(&store).await;

    println!(
        "🟢 {}: {} {} at {}",
        item.category, item.days, item.time, item.location
    );
    ctx.report(&store);
    Ok(store.read())
}

/// Prints the category for a birth date, or "none"
pub fn handle_category_command(birth_date: &str) -> Option<Category> {
    let category = category_for_birth_date(birth_date);
    match category {
        Some(category) => println!("{category}"),
        None => println!("none"),
    }
    category
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
