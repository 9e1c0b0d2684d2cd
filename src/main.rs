use anyhow::Result;
use clap::Parser;
use costbook::cli::Cli;
use costbook::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new()?;

    let level = if cli.verbose {
        "debug"
    } else {
        settings.log.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(format!("costbook={level}"))
        .with_writer(std::io::stderr)
        .init();

    cli.run(settings).await
}
