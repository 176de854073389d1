use clap::Parser;
use treemirror::config::Cli;
use treemirror::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Convert CLI args to Config - this validates immediately
    let config = Config::try_from(cli)?;

    treemirror::commands::run(config).await?;

    Ok(())
}
