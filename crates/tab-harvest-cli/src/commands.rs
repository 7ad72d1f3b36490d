use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tab-harvest")]
#[command(about = "Export open tabs, OneTab groups, bookmarks and history to CSV", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract every source and write the combined CSV
    Export(ExportArgs),
    /// Recover and list the open tabs from session snapshots
    Tabs(TabsArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// CSV file name (defaults to <date>_BrowserExport.csv)
    #[arg(short, long)]
    pub output: Option<String>,
    /// Output directory
    #[arg(short, long)]
    pub dir: Option<String>,
    /// Count rows without writing the CSV
    #[arg(long)]
    pub dry_run: bool,
    /// Pretty print a preview of the results
    #[arg(short, long)]
    pub print: bool,
}

#[derive(Debug, Args)]
pub struct TabsArgs {
    /// Sessions directory to scan instead of the configured one
    #[arg(short, long)]
    pub dir: Option<String>,
}
