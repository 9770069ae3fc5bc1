use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use tenancy_architect::core::config::{self, ArchitectConfig};
use tenancy_architect::tui;

#[derive(Parser)]
#[command(
    name = "tenancy-architect",
    about = "Terminal chat with a Laravel multi-tenancy architect"
)]
struct Args {
    /// Gemini model id (overrides GEMINI_MODEL and the config file)
    #[arg(short, long)]
    model: Option<String>,

    /// File the log is written to
    #[arg(long, default_value = "tenancy-architect.log")]
    log_file: PathBuf,

    /// Log verbosity (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "debug")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // The terminal belongs to the TUI, so logs go to a file
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&args.log_file) {
        let _ = WriteLogger::init(args.log_level, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        warn!("Using default configuration: {e}");
        ArchitectConfig::default()
    });
    let resolved = config::resolve(&file_config, args.model.as_deref());
    info!("Tenancy Architect starting up: {resolved:?}");

    tui::run(resolved)
}
