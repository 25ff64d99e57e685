use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use crewplan_core::time::local_date;
use crewplan_core::{
    calculate_business_duration, calculate_schedule, format_duration, format_hours_as_hmm,
    parse_instant, CompanyConfig,
};
use crewplan_ingest::{parse_employees_json, parse_tasks_json};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

mod config;
mod logging;
mod render;
mod state;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CREWPLAN_BUILD_SHA"),
    ")"
);

#[derive(Parser, Debug)]
#[command(
    name = "crewplan",
    version,
    long_version = LONG_VERSION,
    about = "Forecast developer timelines from task effort and work history"
)]
struct Cli {
    /// Emit logs as JSON (stderr). Filter with RUST_LOG.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate per-developer timelines from task and roster payloads
    Schedule(ScheduleArgs),

    /// Working hours elapsed between two instants
    BusinessHours {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[command(flatten)]
        company: CompanyArgs,
    },

    /// Manage ~/.crewplan/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

#[derive(Args, Debug, Clone)]
struct CompanyArgs {
    /// Start of the working day (hour, local)
    #[arg(long)]
    start_hour: Option<u32>,

    /// End of the working day (hour, local)
    #[arg(long)]
    end_hour: Option<u32>,

    /// IANA timezone used for hours of day and calendar dates
    #[arg(long)]
    timezone: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct ScheduleArgs {
    /// Task payload (array or {"data": [...]})
    #[arg(long)]
    tasks: PathBuf,

    /// Employee payload (array or {"data": [...]})
    #[arg(long)]
    developers: PathBuf,

    /// First simulated day (default: today, local)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Evaluation instant, RFC 3339 (default: current time)
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Print the schedule as JSON
    #[arg(long)]
    json: bool,

    /// Recompute every N seconds (default 60) until interrupted
    #[arg(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "60")]
    watch: Option<u64>,

    #[command(flatten)]
    company: CompanyArgs,
}

impl CompanyArgs {
    fn resolve(&self) -> Result<CompanyConfig> {
        let overrides = config::Overrides {
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            timezone: self.timezone.clone(),
        };
        config::load_config()?.company_config(&overrides)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_json);

    match cli.command {
        Command::Schedule(args) => {
            let company = args.company.resolve()?;
            match args.watch {
                Some(secs) => watch_schedule(&args, &company, secs).await?,
                None => print_schedule(&args, &company, args.now.unwrap_or_else(Utc::now))?,
            }
        }

        Command::BusinessHours { from, to, company } => {
            let company = company.resolve()?;
            let start = parse_instant(&from, company.timezone)
                .with_context(|| format!("unparseable --from {from:?}"))?;
            let end = parse_instant(&to, company.timezone)
                .with_context(|| format!("unparseable --to {to:?}"))?;
            let hours = calculate_business_duration(start, end, &company);
            println!("{} ({})", format_duration(hours), format_hours_as_hmm(hours));
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
            ConfigCommand::Path => println!("{}", config::config_path()?.display()),
        },
    }

    Ok(())
}

fn print_schedule(args: &ScheduleArgs, company: &CompanyConfig, now: DateTime<Utc>) -> Result<()> {
    let tasks = parse_tasks_json(&state::read_input(&args.tasks)?, company.timezone)
        .with_context(|| format!("parsing {}", args.tasks.display()))?;
    let roster = parse_employees_json(&state::read_input(&args.developers)?)
        .with_context(|| format!("parsing {}", args.developers.display()))?;
    if roster.is_empty() {
        bail!("no developers in {}", args.developers.display());
    }

    let start_date = args
        .date
        .unwrap_or_else(|| local_date(now, company.timezone));
    debug!(tasks = tasks.len(), developers = roster.len(), %start_date, %now, "scheduling");

    let schedule = calculate_schedule(&tasks, &roster, company, start_date, now)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        print!("{}", render::render_schedule(&schedule, &roster)?);
    }
    Ok(())
}

/// Inputs are re-read and `now` refreshed on every tick. A failed run is
/// logged and the next tick retries.
async fn watch_schedule(args: &ScheduleArgs, company: &CompanyConfig, secs: u64) -> Result<()> {
    let mut tick = tokio::time::interval(Duration::from_secs(secs.max(1)));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let now = Utc::now();
                if !args.json {
                    println!("== {} ==", now.with_timezone(&company.timezone).format("%Y-%m-%d %H:%M:%S %Z"));
                }
                if let Err(err) = print_schedule(args, company, now) {
                    error!(error = format!("{err:#}"), "schedule run failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping watch");
                break;
            }
        }
    }
    Ok(())
}
