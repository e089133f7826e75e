mod app;
mod cli;
mod config;
mod logging;
mod simulate;
mod terminal;

use clap::Parser;

use app::App;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init(&cli.log_level, cli.log_file.as_deref())?;
    App::new(cli).run()
}
