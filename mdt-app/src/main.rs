mod app;
mod cli;
mod console;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use app::App;

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout belongs to the session and `plan` output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let app = App::new(cli.command);
    app.run()?;

    Ok(())
}
