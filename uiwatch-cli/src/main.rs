//! uiwatch CLI
//!
//! Watch values of desktop UI elements and ring an alert when a condition holds.
//!
//! Usage from workspace root:
//!   cargo run --bin uiwatch -- capture --delay-secs 3                # Print the focused element's locator
//!   cargo run --bin uiwatch -- capture --list monitors.json --operator ">=" --target 50
//!   cargo run --bin uiwatch -- watch --list monitors.json            # Poll until Ctrl+C
//!   cargo run --bin uiwatch -- check --list monitors.json --tree dump.json
//!   cargo run --bin uiwatch -- dump-tree --pid 4242 --depth 5 --out dump.json
//!   cargo run --bin uiwatch -- eval "Progress: 57%" ">=" 50 --mode extract_integer

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use uiwatch::locator::DEFAULT_CAPTURE_DEPTH;
use uiwatch::{
    evaluate, extract_value, transform, AccessibilityEngine, AlertSink, Desktop, ExtractionMode,
    ItemStatus, LocatorDescriptor, Monitor, MonitorConfig, MonitorEvent, MonitorItem, NullAlert,
    Operator, PollOutcome, SnapshotEngine, TreeBuildConfig,
};

mod alert;
mod watchlist;

use alert::BellAlert;
use watchlist::{ElementInfo, WatchEntry, DEFAULT_WATCH_LIST};

#[derive(Parser)]
#[command(name = "uiwatch")]
#[command(about = "Watch values of desktop UI elements and alert when a condition is met")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[clap(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct WatchArgs {
    /// Watch list file
    #[clap(long, short = 'l', default_value = DEFAULT_WATCH_LIST)]
    list: PathBuf,

    /// Monitor settings file (JSON)
    #[clap(long, short = 'c', env = "UIWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Pause between poll cycles, overrides the settings file
    #[clap(long)]
    interval_ms: Option<u64>,

    /// Silence a ringing alert after this many seconds
    #[clap(long)]
    alert_secs: Option<u64>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Watch list file
    #[clap(long, short = 'l', default_value = DEFAULT_WATCH_LIST)]
    list: PathBuf,

    /// Check against a tree dump instead of the live desktop
    #[clap(long, short = 't')]
    tree: Option<PathBuf>,

    /// Monitor settings file (JSON)
    #[clap(long, short = 'c', env = "UIWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    /// Seconds to wait so the target element can be focused
    #[clap(long, default_value_t = 3)]
    delay_secs: u64,

    /// Ancestors recorded in the locator path
    #[clap(long, default_value_t = DEFAULT_CAPTURE_DEPTH)]
    depth: usize,

    /// Write the locator JSON here instead of stdout
    #[clap(long, short = 'o')]
    out: Option<PathBuf>,

    /// Append a watch entry for the captured element to this watch list
    #[clap(long, short = 'l', requires = "operator")]
    list: Option<PathBuf>,

    /// Condition operator for the new entry (>, <, =, >=, <=, !=, Contains, NotContains)
    #[clap(long)]
    operator: Option<String>,

    /// Target value for the new entry
    #[clap(long, default_value = "")]
    target: String,

    /// Extraction mode for the new entry
    #[clap(long, default_value = "raw")]
    mode: String,
}

#[derive(Parser, Debug)]
struct DumpTreeArgs {
    /// Dump only the first top-level window of this process
    #[clap(long, short = 'p')]
    pid: Option<u32>,

    /// Levels below the starting element
    #[clap(long, short = 'd')]
    depth: Option<usize>,

    /// Write the dump here instead of stdout
    #[clap(long, short = 'o')]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct EvalArgs {
    /// Raw value as read from an element
    current: String,

    /// Condition operator
    operator: String,

    /// Target value
    target: String,

    /// Extraction mode applied to the raw value
    #[clap(long, short = 'm', default_value = "raw")]
    mode: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the watch list until Ctrl+C
    Watch(WatchArgs),
    /// Run a single poll cycle and print the outcomes
    Check(CheckArgs),
    /// Capture a locator for the focused element
    Capture(CaptureArgs),
    /// Write a snapshot of the accessibility tree
    DumpTree(DumpTreeArgs),
    /// Transform a value and evaluate a condition on it
    Eval(EvalArgs),
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Watch(args) => watch(args).await,
        Commands::Check(args) => check(args),
        Commands::Capture(args) => capture(args).await,
        Commands::DumpTree(args) => dump_tree(args),
        Commands::Eval(args) => eval(args),
    }
}

fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    match path {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(MonitorConfig::default()),
    }
}

fn connect() -> Result<Desktop> {
    Desktop::new().context("Failed to connect to the desktop accessibility API")
}

fn write_or_print(out: Option<&Path>, json: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn watch(args: WatchArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(interval_ms) = args.interval_ms {
        config.poll_interval_ms = interval_ms;
    }

    let items = watchlist::to_monitor_items(&watchlist::load(&args.list)?);
    if !items.iter().any(|item| item.enabled) {
        bail!("Nothing to watch in {}", args.list.display());
    }

    let desktop = connect()?;
    let alert = Arc::new(BellAlert::new());
    let monitor = Monitor::new(
        desktop.engine().clone(),
        Arc::new(RwLock::new(items)),
        alert.clone(),
        config,
    );
    let handle = monitor.spawn()?;
    let mut events = handle.event_stream();
    let alert_limit = args.alert_secs.map(Duration::from_secs);
    let mut alert_check = tokio::time::interval(Duration::from_millis(250));
    let mut last_status: HashMap<usize, ItemStatus> = HashMap::new();

    info!("Watching {} (press Ctrl+C to stop)", args.list.display());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Ctrl+C received, stopping");
                break;
            }
            event = events.next() => match event {
                Some(event) => {
                    let changed = last_status.insert(event.index, event.status) != Some(event.status);
                    log_event(&event, changed);
                }
                None => {
                    warn!("Monitor stopped unexpectedly");
                    break;
                }
            },
            _ = alert_check.tick() => {
                if let (Some(limit), Some(ringing)) = (alert_limit, alert.alerting_for()) {
                    if ringing >= limit {
                        debug!("Alert rang for {:?}, silencing", ringing);
                        alert.stop_alert();
                    }
                }
            }
        }
    }

    tokio::task::spawn_blocking(move || handle.stop())
        .await
        .context("Monitor thread did not shut down cleanly")?;
    alert.stop_alert();
    Ok(())
}

fn log_event(event: &MonitorEvent, status_changed: bool) {
    match &event.outcome {
        PollOutcome::Value {
            current_value_display,
            ..
        } if status_changed => info!(
            item = %event.label,
            value = %current_value_display,
            "{}",
            event.status
        ),
        PollOutcome::Value {
            current_value_display,
            ..
        } => debug!(
            cycle = event.cycle,
            item = %event.label,
            value = %current_value_display,
            "{}",
            event.status
        ),
        PollOutcome::Unavailable if status_changed => {
            info!(item = %event.label, "{}", event.status)
        }
        PollOutcome::Unavailable => debug!(cycle = event.cycle, item = %event.label, "{}", event.status),
        PollOutcome::Error { message } => warn!(item = %event.label, "Poll failed: {}", message),
    }
}

fn check(args: CheckArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let engine: Arc<dyn AccessibilityEngine> = match &args.tree {
        Some(tree) => Arc::new(
            SnapshotEngine::from_file(tree)
                .with_context(|| format!("Failed to load tree dump {}", tree.display()))?,
        ),
        None => connect()?.engine().clone(),
    };

    let items = watchlist::to_monitor_items(&watchlist::load(&args.list)?);
    let monitor = Monitor::new(
        engine,
        Arc::new(RwLock::new(items.clone())),
        Arc::new(NullAlert),
        config,
    );
    let outcomes = monitor.run_cycle();
    print!("{}", render_table(&items, &outcomes));
    Ok(())
}

fn outcome_cells(outcome: Option<&PollOutcome>) -> (String, String) {
    let Some(outcome) = outcome else {
        return ("-".to_string(), "Disabled".to_string());
    };
    let current = match outcome {
        PollOutcome::Value {
            current_value_display,
            ..
        } => format!("{current_value_display:?}"),
        PollOutcome::Unavailable => "N/A".to_string(),
        PollOutcome::Error { message } => message.clone(),
    };
    (current, outcome.status().to_string())
}

/// One row per watch list item, in list order
fn render_table(items: &[MonitorItem], outcomes: &[(usize, PollOutcome)]) -> String {
    let header = [
        "#".to_string(),
        "ITEM".to_string(),
        "CONDITION".to_string(),
        "CURRENT".to_string(),
        "STATUS".to_string(),
    ];
    let mut rows = vec![header];
    for (index, item) in items.iter().enumerate() {
        let outcome = outcomes
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, outcome)| outcome);
        let (current, status) = outcome_cells(outcome);
        rows.push([
            index.to_string(),
            item.display_label().to_string(),
            format!(
                "[{}] {} {:?}",
                item.extraction_mode, item.operator, item.target_value
            ),
            current,
            status,
        ]);
    }

    let mut widths = [0usize; 5];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut table = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        table.push_str(line.join("  ").trim_end());
        table.push('\n');
    }
    table
}

async fn capture(args: CaptureArgs) -> Result<()> {
    let desktop = connect()?;
    if args.delay_secs > 0 {
        println!(
            "Focus the element to watch, capturing in {} seconds...",
            args.delay_secs
        );
        tokio::time::sleep(Duration::from_secs(args.delay_secs)).await;
    }

    desktop.engine().attach_thread()?;
    let element = desktop
        .focused_element()
        .context("No focused element to capture")?;
    let locator = LocatorDescriptor::capture(&element, args.depth);
    let value = extract_value(&element);
    info!(element = %locator.display_name(), value = %value, "Captured element");

    write_or_print(args.out.as_deref(), &locator.to_json()?)?;

    if let Some(list) = &args.list {
        let Some(operator) = &args.operator else {
            bail!("--operator is required to add a watch entry");
        };
        let operator: Operator = operator.parse()?;
        let mode: ExtractionMode = args.mode.parse()?;

        let mut entries = watchlist::load(list)?;
        entries.push(WatchEntry::new(
            ElementInfo::from_locator(locator, value),
            operator,
            args.target.clone(),
            mode,
        ));
        watchlist::save(list, &entries)?;
        println!("Added entry {} to {}", entries.len() - 1, list.display());
    }
    Ok(())
}

fn dump_tree(args: DumpTreeArgs) -> Result<()> {
    let desktop = connect()?;
    let config = TreeBuildConfig {
        max_depth: args.depth,
        ..TreeBuildConfig::default()
    };
    let tree = desktop.dump_tree(args.pid, &config)?;
    info!(nodes = tree.count(), "Tree captured");
    write_or_print(args.out.as_deref(), &serde_json::to_string_pretty(&tree)?)
}

fn eval(args: EvalArgs) -> Result<()> {
    let operator: Operator = args.operator.parse()?;
    let mode: ExtractionMode = args.mode.parse()?;
    let derived = transform(Some(args.current.as_str()), mode);
    let triggered = evaluate(&derived, operator, &args.target);
    println!("{derived:?} {operator} {:?} => {triggered}", args.target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uiwatch::UINode;

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from([
            "uiwatch", "-v", "watch", "--interval-ms", "250", "--alert-secs", "10",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.list, PathBuf::from(DEFAULT_WATCH_LIST));
                assert_eq!(args.interval_ms, Some(250));
                assert_eq!(args.alert_secs, Some(10));
            }
            _ => panic!("expected watch"),
        }

        let cli = Cli::try_parse_from(["uiwatch", "eval", "12.5 kg", ">=", "10", "-m", "提取小数"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Eval(ref args) if args.mode == "提取小数"));

        // Adding to a list needs an operator
        assert!(Cli::try_parse_from(["uiwatch", "capture", "--list", "monitors.json"]).is_err());
    }

    #[test]
    fn test_table_lists_every_item_in_order() {
        let root = UINode::new("PaneControl", "Desktop").with_child(
            UINode::new("WindowControl", "Ledger")
                .with_automation_id("winLedger")
                .with_class_name("LedgerMain"),
        );
        let engine = Arc::new(SnapshotEngine::new(root));
        let items = vec![
            MonitorItem::new(
                LocatorDescriptor::builder().automation_id("winLedger").build(),
                Operator::Contains,
                "Ledger",
            )
            .with_label("ledger title"),
            MonitorItem::new(
                LocatorDescriptor::builder().automation_id("gone").build(),
                Operator::Equal,
                "1",
            ),
            MonitorItem::new(LocatorDescriptor::default(), Operator::Equal, "1")
                .with_enabled(false),
        ];
        let monitor = Monitor::new(
            engine,
            Arc::new(RwLock::new(items.clone())),
            Arc::new(NullAlert),
            MonitorConfig::default(),
        );

        let table = render_table(&items, &monitor.run_cycle());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("#  ITEM"));
        assert!(lines[1].contains("ledger title"));
        assert!(lines[1].contains("\"Ledger\""));
        assert!(lines[1].ends_with("Triggered"));
        assert!(lines[2].contains("gone"));
        assert!(lines[2].ends_with("Monitoring (value unavailable)"));
        assert!(lines[3].contains("Unnamed"));
        assert!(lines[3].ends_with("Disabled"));
    }
}
