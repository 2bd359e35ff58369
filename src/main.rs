use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pipeboard::cli::Cli;
use pipeboard::config::Config;
use pipeboard::dashboard::Dashboard;
use pipeboard::render::render;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    info!(pipe_id = %config.pipe_id, page_size = config.page_size, "config loaded");

    let dashboard = Dashboard::new(&config);

    loop {
        let output = dashboard
            .build_report(&cli.command)
            .and_then(|report| render(&report, config.format));

        match (output, config.watch) {
            (Ok(text), _) => print!("{text}"),
            (Err(e), None) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
            (Err(e), Some(_)) => warn!(error = %e, "refresh failed, keeping watch"),
        }

        let Some(interval) = config.watch else {
            break;
        };
        std::thread::sleep(Duration::from_secs(interval));
        println!();
    }
}
