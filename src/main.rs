// src/main.rs

use chrono::Local;
use segexport::logging::{self, LogDestinations};
use segexport::{cli, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("segexport error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let destinations = LogDestinations::new(&args.effective_log_dir(), Local::now());
    logging::init_logging(args.log_level, &destinations)?;
    run(args).await
}
