mod commands;
mod logging;
mod progress;

use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, ExportArgs, TabsArgs};
use dotenv::dotenv;
use progress::CliReporter;
use tab_harvest_core::sessions::{RankedTabRecovery, SnapshotStrategy};
use tab_harvest_core::{AppConfig, ExportEngine, UnifiedRecord};
use tracing::{error, info};

const PREVIEW_ROWS: usize = 20;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match tab_harvest_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Export(export_args)) => {
            if let Err(err) = run_export(config, &export_args) {
                error!("Error: {:#}", err);
                process::exit(1);
            }
        }
        Some(Commands::Tabs(tabs_args)) => run_tabs(&config, &tabs_args),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }
}

fn run_export(config: AppConfig, args: &ExportArgs) -> anyhow::Result<()> {
    let mut engine = ExportEngine::new(config).dry_run(args.dry_run);
    if let Some(dir) = &args.dir {
        engine = engine.with_output_dir(dir);
    }
    if let Some(name) = &args.output {
        engine = engine.with_file_name(name);
    }

    let reporter = CliReporter::new();
    let result = engine.run(&reporter).context("export failed")?;

    info!(
        "Extract: {}, Write: {}",
        format!("{:.2}s", result.extract_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.write_duration.as_secs_f64()).green(),
    );
    for (kind, count) in &result.counts {
        info!("{}: {}", kind, format!("{}", count).cyan());
    }

    match &result.output_path {
        Some(path) => println!(
            "{} Exported {} rows to {}",
            "Success!".green().bold(),
            result.total_rows(),
            path.display().to_string().underline()
        ),
        None => println!(
            "Found {} rows across {} sources.",
            format!("{}", result.total_rows()).cyan().bold(),
            result.counts.values().filter(|&&c| c > 0).count()
        ),
    }

    if args.print {
        print_preview(&result.records);
    }

    Ok(())
}

fn run_tabs(config: &AppConfig, args: &TabsArgs) {
    let tabs = match &args.dir {
        Some(dir) => {
            let strategy = SnapshotStrategy::from_config(&AppConfig {
                sessions_dir: dir.clone(),
                ..config.clone()
            });
            RankedTabRecovery::new(vec![Box::new(strategy)]).recover()
        }
        None => tab_harvest_core::sessions::recover_open_tabs(config),
    };

    for tab in &tabs {
        if tab.fallback {
            println!("{} {}", "fallback".yellow(), tab.url);
            continue;
        }
        println!(
            "{} {} {}",
            fit(&tab.title, 40).cyan(),
            tab.url.green(),
            format!("({})", tab.origin_file).dimmed()
        );
    }
    info!("{} tabs from {}", tabs.len(), sessions_dir_display(config, args));
}

fn sessions_dir_display(config: &AppConfig, args: &TabsArgs) -> String {
    let dir = args.dir.as_deref().unwrap_or(&config.sessions_dir);
    tab_harvest_core::config::expand_home(dir)
        .display()
        .to_string()
}

fn print_preview(records: &[UnifiedRecord]) {
    println!();
    println!(
        "{:<20} {:<19} {:<10} {:<30} {}",
        "Group".bold(),
        "Date Added".bold(),
        "Color".bold(),
        "Title".bold(),
        "URL".bold()
    );
    for record in records.iter().take(PREVIEW_ROWS) {
        println!(
            "{} {} {} {} {}",
            format!("{:<20}", fit(&record.category, 20)).magenta(),
            format!("{:<19}", record.date_display()).yellow(),
            format!("{:<10}", fit(&record.color_tag, 10)).blue(),
            format!("{:<30}", fit(&record.title, 30)).cyan(),
            fit(&record.url, 40).green()
        );
    }
    if records.len() > PREVIEW_ROWS {
        println!("... and {} more rows.", records.len() - PREVIEW_ROWS);
    }
}

/// Truncate to `width` characters, marking the cut with an ellipsis.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
