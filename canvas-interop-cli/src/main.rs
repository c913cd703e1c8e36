mod cli;
mod commands;
mod project;

use clap::Parser;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { root, port, host } => {
            let cwd = std::env::current_dir()?;
            let settings = project::resolve_serve_settings(&cwd, root, port, host)?;
            commands::serve_cmd::run(settings).await
        }
    }
}
