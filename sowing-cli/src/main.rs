mod cli;
mod commands;
mod telemetry;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before parsing so it can supply flag defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    telemetry::init_logging(cli.global.log_format);

    let mut stdout = std::io::stdout();
    commands::run(cli, &mut stdout).await
}
