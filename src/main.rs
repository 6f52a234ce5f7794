use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use log::{error, info};

use sensegrid::config::ConfigManager;
use sensegrid::{logger, pipeline, AppError};

/// Align sensor recordings on a time grid at several granularities
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file, defaults are used when absent
    #[arg(long, env = "SENSEGRID_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding accelerometer.csv, gyroscope.csv, magnetometer.csv and labelsOwn.csv
    #[arg(long, env = "SENSEGRID_DATASET_DIR")]
    dataset_dir: Option<PathBuf>,

    /// Directory the aligned table and run summary are written to
    #[arg(long, env = "SENSEGRID_RESULT_DIR")]
    result_dir: Option<PathBuf>,

    /// Bucket width in milliseconds, repeat to run several passes
    #[arg(long = "granularity", value_name = "MS")]
    granularities: Vec<u64>,

    /// Skip writing figures
    #[arg(long)]
    no_plots: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "FILE")]
    dump_config: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<ConfigManager, AppError> {
    let mut manager = match &args.config {
        Some(path) => {
            let manager = ConfigManager::load_from_file(path)?;
            info!("Loaded configuration from {}", path.display());
            manager
        }
        None => ConfigManager::new(),
    };

    let config = manager.get_config_mut();
    if let Some(dir) = &args.dataset_dir {
        config.paths.dataset_dir = dir.clone();
    }
    if let Some(dir) = &args.result_dir {
        config.paths.result_dir = dir.clone();
    }
    if !args.granularities.is_empty() {
        config.granularities_ms = args.granularities.clone();
    }
    if args.no_plots {
        config.plot.enabled = false;
    }
    config.validate()?;

    Ok(manager)
}

fn main() {
    dotenv().ok(); // 加载 .env 文件
    logger::init_logger();

    let args = Args::parse();
    info!("Application starting");

    let manager = match load_config(&args) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.dump_config {
        match manager.save_to_file(path) {
            Ok(()) => info!("Configuration written to {}", path.display()),
            Err(e) => {
                error!("Failed to write configuration: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config = manager.into_config();
    match pipeline::run(&config) {
        Ok(summary) => info!("{}", summary.message),
        Err(e) => {
            error!("Run failed: {}", e);
            std::process::exit(1);
        }
    }
}
