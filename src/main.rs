use clap::Parser;

use retirement_buckets::cli::{Cli, Command, resolve_port, run_project};
use retirement_buckets::config::AppConfig;
use retirement_buckets::{api, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = AppConfig::from_env();
    if let Err(e) = logging::init_logging(&config.log_level) {
        eprintln!("Logging setup failed: {e}");
    }

    match cli.command {
        Command::Serve { port } => {
            let catalog = match config.load_catalog() {
                Ok(catalog) => catalog,
                Err(e) => {
                    eprintln!("Catalog error: {e}");
                    std::process::exit(1);
                }
            };
            tracing::info!(assets = catalog.len(), "asset catalog ready");

            if let Err(e) = api::run_http_server(resolve_port(port, &config), catalog).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Project(args) => match run_project(&args, &config) {
            Ok(report) => print!("{report}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }
}
