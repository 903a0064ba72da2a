use clap::Parser;

mod cli;
mod cmd;
mod util;

use cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    util::load_dotenv()?;
    let _guard = util::init_logger()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::View { view, json } => cmd::view::run(view, json).await,
        Commands::Facets { view, column } => cmd::facets::run(view, column).await,
        Commands::Send {
            view,
            rows,
            select_page,
            dry_run,
        } => cmd::send::run(view, rows, select_page, dry_run).await,
        Commands::Catalog {
            input,
            query,
            params,
        } => cmd::catalog::run(&input, query, &params),
    }
}
