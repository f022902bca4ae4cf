use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::Subcommand;
use studymate_core::calendar::day_key;
use studymate_core::Config;

use super::{open_companion, print_json, CmdResult};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// List tasks, for one day or every marked day
    List {
        /// Day as YYYY-MM-DD
        #[arg(long)]
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// RFC 3339 or "YYYY-MM-DD HH:MM" in local time
        #[arg(long)]
        due: String,
    },
    /// Remove a task from a day
    Remove { id: String, day: String },
}

fn parse_due(input: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .map_err(|_| format!("invalid due time: {input}"))?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("{input} does not exist in the local time zone"))?;
    Ok(local.with_timezone(&Utc))
}

pub async fn run(action: CalendarAction) -> CmdResult {
    let mut app = open_companion(&Config::load()?).await?;

    match action {
        CalendarAction::List { day, json } => {
            let calendar = app.calendar();
            if json {
                return match day {
                    Some(day) => print_json(&calendar.tasks_on(&day)),
                    None => print_json(calendar),
                };
            }
            let days: Vec<String> = match day {
                Some(day) => vec![day],
                None => calendar.marked_days().map(str::to_string).collect(),
            };
            if days.iter().all(|d| calendar.tasks_on(d).is_empty()) {
                println!("no tasks");
            }
            for day in days {
                let tasks = calendar.tasks_on(&day);
                if tasks.is_empty() {
                    continue;
                }
                println!("{day}");
                for task in tasks {
                    let local = task.due_at.with_timezone(&Local);
                    println!("  {}  {}  [{}]", local.format("%H:%M"), task.title, task.id);
                    if let Some(desc) = &task.description {
                        println!("         {desc}");
                    }
                }
            }
        }
        CalendarAction::Add {
            title,
            description,
            due,
        } => {
            let due_at = parse_due(&due)?;
            let task = app.add_task(&title, description.as_deref(), due_at, Utc::now())?;
            println!("added {} on {}", task.id, day_key(&task.due_at));
        }
        CalendarAction::Remove { id, day } => {
            let task = app.remove_task(&id, &day)?;
            println!("removed {}", task.title);
        }
    }
    Ok(())
}
