//! kvsync: replicated JSON documents over a plain HTTP key-value bucket
//! Every command works from the local cache and replicates in the background.

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use std::path::PathBuf;

use kvsync::commands::kv::{handle_add_command, handle_get_command, handle_put_command};
use kvsync::commands::roster::{
    handle_attend_command, handle_category_command, handle_list_command,
    handle_register_command, handle_schedule_set_command, handle_schedule_show_command,
    CategoryArg,
};
use kvsync::commands::watch::handle_watch_command;
use kvsync::commands::CommandContext;
use kvsync::core::{resolve_config, ConfigOverrides};
use kvsync::logging::init_logging;
use kvsync::roster::{Category, Guardian, Registration, ScheduleItem};
use kvsync::utils::{set_terminal_title, set_terminal_title_and_flush};

const APP_TITLE: &str = "kvsync";

fn key_arg() -> Arg {
    Arg::new("key")
        .required(true)
        .help("Document key inside the bucket")
}

fn category_arg(required: bool) -> Arg {
    Arg::new("category")
        .long("category")
        .required(required)
        .value_parser(clap::value_parser!(CategoryArg))
        .help("Age category")
}

fn text_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).default_value("").help(help)
}

fn build_cli() -> ClapCommand {
    ClapCommand::new("kvsync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Replicated JSON documents over a plain HTTP key-value bucket")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(Arg::new("base-url").long("base-url").global(true).help("Key-value service URL"))
        .arg(Arg::new("bucket").long("bucket").global(true).help("Bucket identifier"))
        .arg(Arg::new("key-prefix").long("key-prefix").global(true).help("Prefix added to every key"))
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Directory of the local cache"),
        )
        .arg(
            Arg::new("poll-secs")
                .long("poll-secs")
                .global(true)
                .value_parser(clap::value_parser!(u64))
                .help("Pull interval in seconds, 0 pulls only once"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .global(true)
                .value_parser(clap::value_parser!(u64))
                .help("Timeout of each remote request"),
        )
        .arg(
            Arg::new("offline")
                .long("offline")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Work from the local cache only"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log sync activity and print statistics"),
        )
        .subcommand(ClapCommand::new("get").about("Print a document").arg(key_arg()))
        .subcommand(
            ClapCommand::new("put")
                .about("Replace a document")
                .arg(key_arg())
                .arg(Arg::new("json").required(true).help("New document as JSON")),
        )
        .subcommand(
            ClapCommand::new("add")
                .about("Append a record to a collection, assigning an id if missing")
                .arg(key_arg())
                .arg(Arg::new("json").required(true).help("Record as a JSON object")),
        )
        .subcommand(
            ClapCommand::new("watch")
                .about("Follow a document until interrupted")
                .arg(key_arg()),
        )
        .subcommand(
            ClapCommand::new("roster")
                .about("Club roster: athletes, attendance and schedule")
                .subcommand_required(true)
                .subcommand(
                    ClapCommand::new("register")
                        .about("Register an athlete")
                        .arg(Arg::new("name").long("name").required(true).help("Full name"))
                        .arg(
                            Arg::new("birth-date")
                                .long("birth-date")
                                .required(true)
                                .help("Birth date as YYYY-MM-DD"),
                        )
                        .arg(text_arg("position", "Playing position"))
                        .arg(text_arg("school", "School name"))
                        .arg(text_arg("grade", "School grade"))
                        .arg(text_arg("school-hours", "School hours"))
                        .arg(text_arg("address", "Home address"))
                        .arg(text_arg("whatsapp", "Contact number"))
                        .arg(text_arg("guardian", "Guardian name")),
                )
                .subcommand(
                    ClapCommand::new("attend")
                        .about("Record attendance for a training date")
                        .arg(Arg::new("id").required(true).help("Athlete id"))
                        .arg(Arg::new("date").long("date").help("Training date, default today"))
                        .arg(
                            Arg::new("absent")
                                .long("absent")
                                .action(ArgAction::SetTrue)
                                .help("Mark absent instead of present"),
                        ),
                )
                .subcommand(
                    ClapCommand::new("list")
                        .about("List athletes by category")
                        .arg(category_arg(false))
                        .arg(Arg::new("date").long("date").help("Attendance date shown, default today")),
                )
                .subcommand(
                    ClapCommand::new("schedule")
                        .about("Show the weekly schedule, or change one slot")
                        .arg(category_arg(false))
                        .arg(Arg::new("days").long("days").requires("category"))
                        .arg(Arg::new("time").long("time").requires("category"))
                        .arg(Arg::new("location").long("location").requires("category")),
                )
                .subcommand(
                    ClapCommand::new("category")
                        .about("Show the category for a birth date")
                        .arg(Arg::new("birth-date").required(true)),
                ),
        )
}

fn overrides_from(matches: &ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        base_url: matches.get_one::<String>("base-url").cloned(),
        bucket: matches.get_one::<String>("bucket").cloned(),
        key_prefix: matches.get_one::<String>("key-prefix").cloned(),
        poll_secs: matches.get_one::<u64>("poll-secs").copied(),
        timeout_secs: matches.get_one::<u64>("timeout-secs").copied(),
        cache_dir: matches.get_one::<PathBuf>("cache-dir").cloned(),
    }
}

fn text(matches: &ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

fn registration_from(matches: &ArgMatches) -> Registration {
    Registration {
        full_name: text(matches, "name"),
        birth_date: text(matches, "birth-date"),
        position: text(matches, "position"),
        school_name: text(matches, "school"),
        school_grade: text(matches, "grade"),
        school_hours: text(matches, "school-hours"),
        address: text(matches, "address"),
        whatsapp: text(matches, "whatsapp"),
        guardian: Guardian {
            full_name: text(matches, "guardian"),
            ..Guardian::default()
        },
    }
}

async fn run_roster(ctx: &CommandContext, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("register", sub)) => {
            handle_register_command(ctx, registration_from(sub)).await?;
        }
        Some(("attend", sub)) => {
            handle_attend_command(
                ctx,
                &text(sub, "id"),
                sub.get_one::<String>("date").cloned(),
                !sub.get_flag("absent"),
            )
            .await?;
        }
        Some(("list", sub)) => {
            let only = sub.get_one::<CategoryArg>("category").copied().map(Category::from);
            handle_list_command(ctx, only, sub.get_one::<String>("date").cloned()).await?;
        }
        Some(("schedule", sub)) => match sub.get_one::<CategoryArg>("category").copied() {
            Some(category) => {
                let (Some(days), Some(time), Some(location)) = (
                    sub.get_one::<String>("days"),
                    sub.get_one::<String>("time"),
                    sub.get_one::<String>("location"),
                ) else {
                    anyhow::bail!("--days, --time and --location are required with --category");
                };
                let item = ScheduleItem {
                    category: category.into(),
                    days: days.clone(),
                    time: time.clone(),
                    location: location.clone(),
                };
                handle_schedule_set_command(ctx, item).await?;
            }
            None => {
                handle_schedule_show_command(ctx).await?;
            }
        },
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let verbose = matches.get_flag("verbose");

    // Category lookup is pure and needs no bucket
    if let Some(("roster", roster)) = matches.subcommand() {
        if let Some(("category", sub)) = roster.subcommand() {
            handle_category_command(&text(sub, "birth-date"));
            return Ok(());
        }
    }

    let config = resolve_config(&overrides_from(matches))?;
    let ctx = CommandContext::new(config, matches.get_flag("offline"), verbose)?;

    match matches.subcommand() {
        Some(("get", sub)) => {
            handle_get_command(&ctx, &text(sub, "key")).await?;
        }
        Some(("put", sub)) => {
            handle_put_command(&ctx, &text(sub, "key"), &text(sub, "json")).await?;
        }
        Some(("add", sub)) => {
            handle_add_command(&ctx, &text(sub, "key"), &text(sub, "json")).await?;
        }
        Some(("watch", sub)) => {
            handle_watch_command(&ctx, &text(sub, "key")).await?;
        }
        Some(("roster", sub)) => run_roster(&ctx, sub).await?,
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    set_terminal_title(&format!("🔄 {APP_TITLE}"));
    let result = run(&matches).await;
    set_terminal_title_and_flush(&format!("✅ {APP_TITLE}"));
    result
}
