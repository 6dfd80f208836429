use account_forms::cli::commands::{
    build_pipeline, cmd_billing, cmd_pay, cmd_preferences, cmd_revoke_session, cmd_submit,
    cmd_two_factor,
};
use account_forms::cli::config::{Cli, Commands, load_config, resolve_settings};
use account_forms::trace::logger;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    logger::init(&config.log.clone().with_env().with_verbosity(cli.verbose));

    // Resolve settings: CLI > config > defaults
    let settings = resolve_settings(&cli, &config);
    let pipeline = build_pipeline(&settings, &cli.page_fields, cli.yes)?;

    let succeeded = match cli.command {
        Commands::Submit {
            endpoint,
            method,
            send,
        } => cmd_submit(&pipeline, &endpoint, &method, &send, &cli.page_fields).await?,
        Commands::Preferences => cmd_preferences(&pipeline).await?,
        Commands::Billing => cmd_billing(&pipeline).await?,
        Commands::TwoFactor { action } => cmd_two_factor(&pipeline, action).await?,
        Commands::RevokeSession { id } => cmd_revoke_session(&pipeline, id).await?,
        Commands::Pay { plan } => cmd_pay(&pipeline, plan).await?,
    };

    if !succeeded {
        std::process::exit(1);
    }

    Ok(())
}
