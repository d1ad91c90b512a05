use clap::Parser;
mod commands;
mod http;
mod logging;
use commands::cli;
use operator_core::api::{AppContext, CliError};
use operator_core::config;
use operator_plugins::services::PluginServicesFactory;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let args = cli::Args::parse();
    let cfg = config::load_from(args.config.as_deref())?;
    let _log_guard = logging::init(&cfg.logging);

    let ctx = AppContext::new(cfg)?;
    match args.command {
        cli::Commands::Serve(serve_args) => {
            commands::serve::handle_serve(serve_args, &ctx, &PluginServicesFactory).await?;
        }
        cli::Commands::Check(check_args) => {
            let code = commands::check::handle_check(check_args, &ctx);
            std::process::exit(code);
        }
    }
    Ok(())
}
