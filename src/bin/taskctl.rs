use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use taskboard::config::TaskboardConfig;
use taskboard::core::category::Bucket;
use taskboard::core::task::parse_datetime;
use taskboard::error::TaskError;
use taskboard::render::render_snapshot;
use taskboard::sync::{SyncController, TaskClient};

/// Terminal client for a taskboard server.
#[derive(Parser, Debug)]
#[command(version, about = "taskctl: manage tasks on a taskboard server", long_about = None)]
struct Cli {
    /// Server base URL (defaults to the configured one).
    #[arg(long, global = true)]
    url: Option<String>,

    /// Show only one category: today, scheduled, important, place, noAlert or completed.
    #[arg(long, global = true, value_name = "KEY", value_parser = parse_bucket)]
    category: Option<Bucket>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Show the task list.
    List,
    /// Create a task.
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        /// Alert time, YYYY-MM-DDTHH:MM.
        #[arg(long, value_name = "DATETIME", value_parser = parse_at)]
        at: Option<NaiveDateTime>,
        #[arg(long)]
        star: bool,
    },
    /// Change title, alert time or star; omitted flags keep the current value.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_name = "DATETIME", value_parser = parse_at, conflicts_with = "no_alert")]
        at: Option<NaiveDateTime>,
        /// Remove the alert time.
        #[arg(long)]
        no_alert: bool,
        #[arg(long, conflicts_with = "unstar")]
        star: bool,
        #[arg(long)]
        unstar: bool,
    },
    /// Toggle completion.
    Done { id: String },
    /// Toggle the star.
    Star { id: String },
    Delete { id: String },
}

fn parse_bucket(key: &str) -> Result<Bucket, String> {
    Bucket::from_key(key).ok_or_else(|| {
        let keys: Vec<&str> = Bucket::ALL.iter().map(|b| b.as_key()).collect();
        format!("expected one of {}", keys.join(", "))
    })
}

fn parse_at(raw: &str) -> Result<NaiveDateTime, String> {
    match parse_datetime(raw) {
        Ok(Some(dt)) => Ok(dt),
        Ok(None) => Err("empty date-time; use --no-alert on edit".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

async fn run(
    controller: &SyncController<TaskClient>,
    command: Command,
) -> Result<(), TaskError> {
    match command {
        Command::List => Ok(()),
        Command::Add { title, at, star } => controller.add(&title.join(" "), at, star).await,
        Command::Edit {
            id,
            title,
            at,
            no_alert,
            star,
            unstar,
        } => {
            let current = controller
                .task(&id)
                .await
                .ok_or_else(|| TaskError::NotFound(id.clone()))?;
            let datetime = if no_alert { None } else { at.or(current.datetime) };
            let starred = match (star, unstar) {
                (true, _) => true,
                (_, true) => false,
                _ => current.starred,
            };
            controller
                .edit(
                    &id,
                    title.as_deref().unwrap_or(&current.title),
                    datetime,
                    starred,
                )
                .await
        }
        Command::Done { id } => controller.toggle_complete(&id).await,
        Command::Star { id } => controller.toggle_star(&id).await,
        Command::Delete { id } => controller.delete(&id).await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = TaskboardConfig::load()?;
    taskboard::logging::init("taskctl", config.debug_logging);

    let url = cli.url.unwrap_or(config.server_url);
    let controller = SyncController::new(TaskClient::new(&url)?);
    controller.load().await?;
    if let Some(bucket) = cli.category {
        controller.select(bucket).await;
    }

    let result = run(&controller, cli.command.unwrap_or(Command::List)).await;

    let now = chrono::Local::now().naive_local();
    print!("{}", render_snapshot(&controller.snapshot(now).await));

    result.map_err(Into::into)
}
