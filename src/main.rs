mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    apiflow::logger::init_logger(cli.verbose);

    let ok = match cli.command {
        Commands::Run(args) => cli::run(args, cli.verbose).await?,
        Commands::Validate { file } => cli::validate(file)?,
        Commands::Generate { output } => cli::generate(output)?,
        Commands::Assertions => {
            cli::list_assertions();
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
