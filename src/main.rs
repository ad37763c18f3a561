use std::io::Read as _;

mod ai;
mod app;
mod config;
mod db;
mod error;
mod models;
mod services;

use app::App;
use config::Config;
use error::Result;
use models::Submission;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let config = Config::load()?;

    match args.get(1).map(String::as_str) {
        Some("submit") => {
            let submission = read_submission(args.get(2))?;
            let app = App::new(&config).await?;
            app.handle_submission(submission).await?;
        }
        Some("recap") => {
            let app = App::new(&config).await?;
            app.produce_recap().await?;
        }
        _ => {
            eprintln!("Usage: macrolog submit [submission.json|-]");
            eprintln!("       macrolog recap");
            eprintln!();
            eprintln!("Config: {}", Config::config_path().display());
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Read one submission as JSON from a file path, or from stdin when the
/// argument is absent or "-".
fn read_submission(path: Option<&String>) -> Result<Submission> {
    let raw = match path.map(String::as_str) {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };
    Ok(serde_json::from_str(&raw)?)
}
