mod api;
mod server;

use chrono::Utc;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use content_ops::config::AppConfig;
use content_ops::generation::GenerationClient;
use content_ops::kpi::{DashboardBuilder, KpiDashboard, RawDataBundle};
use content_ops::tasks::{
    merge_generated_tasks, DeriveTodayTasksInput, ScheduledPostItem, TaskDeriver, TodayTask,
};
use content_ops::{format_float, format_number, format_percent, logging, Error, StrategyPlan};

#[derive(Parser)]
#[command(name = "content-ops", about = "Social media KPI dashboard and daily task planner")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the KPI dashboard from a JSON data bundle
    Dashboard(DashboardArgs),
    /// Derive today's tasks from a strategy plan
    Tasks(TasksArgs),
    /// Run the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct DashboardArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct TasksArgs {
    /// Strategy plan JSON; omit to get the fallback suggestion
    #[arg(long)]
    plan: Option<PathBuf>,
    /// JSON array of scheduled posts
    #[arg(long)]
    scheduled: Option<PathBuf>,
    /// Local date (YYYY-MM-DD), defaults to today in the chosen zone
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    timezone: Option<String>,
    /// Call the generation API for every request
    #[arg(long)]
    resolve: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    #[arg(long, default_value = "web/dist")]
    web_root: String,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> content_ops::Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = AppConfig::load(cli.config)?;
    logging::init(&config.logging)?;
    if let Some(path) = config_path.filter(|path| path.exists()) {
        tracing::debug!(path = %path.display(), "loaded config file");
    }

    match cli.command {
        Command::Dashboard(args) => run_dashboard(args, &config),
        Command::Tasks(args) => run_tasks(args, &config).await,
        Command::Serve(args) => server::serve(args, config).await,
    }
}

fn run_dashboard(args: DashboardArgs, config: &AppConfig) -> content_ops::Result<()> {
    let bundle: RawDataBundle = read_json(&args.input)?;
    let dashboard = DashboardBuilder::from_config(config).build(&bundle);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    print_dashboard(&dashboard);
    Ok(())
}

fn print_dashboard(dashboard: &KpiDashboard) {
    let performance = &dashboard.performance;
    println!(
        "Performance score: {} ({:?}, {})",
        performance.score, performance.rating, performance.label
    );
    println!(
        "Breakdown: engagement {} | growth {} | quality {} | consistency {}",
        performance.breakdown.engagement,
        performance.breakdown.growth,
        performance.breakdown.quality,
        performance.breakdown.consistency
    );
    println!(
        "Posts: {} ({} with analytics)",
        format_number(dashboard.post_count as f64),
        format_number(dashboard.analyzed_count as f64)
    );

    let totals = &dashboard.totals;
    println!(
        "Totals: likes {} | comments {} | shares {} | saves {} | reach {} | followers {}",
        format_number(totals.likes as f64),
        format_number(totals.comments as f64),
        format_number(totals.shares as f64),
        format_number(totals.saves as f64),
        format_number(totals.reach as f64),
        format_number(totals.follower_increase as f64)
    );
    println!(
        "Average engagement rate: {} | average reach: {}",
        format_percent(performance.metrics.avg_engagement_rate),
        format_number(performance.metrics.avg_reach)
    );

    println!("\nTime slots:");
    for slot in &dashboard.time_slots.slots {
        if slot.posts_in_range == 0 {
            println!("  {:<14} {:<13} -", slot.label, slot.time_range);
            continue;
        }
        println!(
            "  {:<14} {:<13} posts {} | likes {} | reach {} | engagement {}",
            slot.label,
            slot.time_range,
            slot.posts_in_range,
            format_float(slot.avg_likes, 1),
            format_float(slot.avg_reach, 1),
            format_percent(slot.avg_engagement_rate)
        );
    }
    if let Some(best) = &dashboard.time_slots.best_slot {
        println!("Best slot: {}", best);
    }

    if !dashboard.hashtag_stats.is_empty() {
        println!("\nTop hashtags:");
        for stat in &dashboard.hashtag_stats {
            println!("  #{} ({})", stat.hashtag, stat.count);
        }
    }

    let audience = &dashboard.audience;
    if audience.sample_size > 0 {
        println!(
            "\nAudience: male {} | female {} | other {}",
            format_percent(audience.gender.male),
            format_percent(audience.gender.female),
            format_percent(audience.gender.other)
        );
        println!(
            "Ages: 18-24 {} | 25-34 {} | 35-44 {} | 45-54 {}",
            format_percent(audience.age.age_18_24),
            format_percent(audience.age.age_25_34),
            format_percent(audience.age.age_35_44),
            format_percent(audience.age.age_45_54)
        );
    }

    if let Some(trends) = &dashboard.trends {
        let change = |value: Option<f64>| match value {
            Some(value) => format!("{}%", format_float(value, 1)),
            None => "n/a".to_string(),
        };
        println!(
            "\nVs previous period: likes {} | reach {} | followers {}",
            change(trends.likes),
            change(trends.reach),
            change(trends.follower_increase)
        );
    }

    if let Some(goal) = &dashboard.goal_progress {
        println!(
            "Goal: {} of {} followers ({}), {} to go",
            format_number(goal.current_followers as f64),
            format_number(goal.target_followers as f64),
            format_percent(goal.progress_percent),
            format_number(goal.remaining_followers as f64)
        );
    }
}

async fn run_tasks(args: TasksArgs, config: &AppConfig) -> content_ops::Result<()> {
    let plan: Option<StrategyPlan> = args
        .plan
        .as_deref()
        .map(read_json::<StrategyPlan>)
        .transpose()?;
    let scheduled: Vec<ScheduledPostItem> = args
        .scheduled
        .as_deref()
        .map(read_json::<Vec<ScheduledPostItem>>)
        .transpose()?
        .unwrap_or_default();

    let now = Utc::now();
    let timezone = args
        .timezone
        .unwrap_or_else(|| config.tasks.default_timezone.clone());
    let date = args.date.unwrap_or_else(|| match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).format("%Y-%m-%d").to_string(),
        Err(_) => now.format("%Y-%m-%d").to_string(),
    });

    let deriver = TaskDeriver::new(config.tasks.clone());
    let derivation = deriver.derive(&DeriveTodayTasksInput {
        plan: plan.as_ref(),
        date: &date,
        timezone: &timezone,
        scheduled_posts: &scheduled,
        now,
    });
    for warning in &derivation.warnings {
        tracing::warn!("{}", warning.message());
    }

    let outcomes = if args.resolve {
        let client = GenerationClient::from_config(&config.generation)
            .ok_or_else(|| Error::Config("AI_API_KEY is not set".to_string()))?;
        let requests: Vec<_> = derivation.all_requests().into_iter().cloned().collect();
        client.resolve_all(&requests).await
    } else {
        HashMap::new()
    };
    let tasks = merge_generated_tasks(&derivation, &outcomes);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    println!("Tasks for {} ({})", derivation.date, derivation.timezone);
    print_tasks(&tasks.today);
    if !tasks.tomorrow.is_empty() {
        println!("\nPrepare for tomorrow:");
        print_tasks(&tasks.tomorrow);
    }
    Ok(())
}

fn print_tasks(tasks: &[TodayTask]) {
    for task in tasks {
        let time = task.recommended_time.as_deref().unwrap_or("--:--");
        println!("- [{:?}] {} {}", task.priority, time, task.title);
        println!("    {}", task.description);
        if let Some(content) = &task.content {
            println!("    {}", content.replace('\n', "\n    "));
        }
        if let Some(hashtags) = &task.hashtags {
            let tags: Vec<String> = hashtags.iter().map(|tag| format!("#{}", tag)).collect();
            println!("    {}", tags.join(" "));
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> content_ops::Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|err| {
        Error::InvalidInput(format!("failed reading {}: {}", path.display(), err))
    })?;
    serde_json::from_str(&contents)
        .map_err(|err| Error::InvalidInput(format!("failed parsing {}: {}", path.display(), err)))
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
