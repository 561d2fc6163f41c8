use dotenvy::dotenv;
use log::*;
use loyalty_server::{cli::handle_command_line_args, config::ServerConfig, service::LoyaltyService};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = ServerConfig::from_env_or_default();

    info!("🚀️ Starting loyalty service. Accrual system at {}", config.accrual.base_url);
    let service = match LoyaltyService::start(config).await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("{e}");
            return;
        },
    };
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("🚀️ Could not listen for the shutdown signal. {e}");
    }
    info!("🚀️ Shutdown requested");
    match service.shutdown().await {
        Ok(()) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
