use anyhow::Result;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;
use teloxide::Bot;

use alarm_sentry::commands::{run_dispatcher, BotContext};
use alarm_sentry::core::Config;
use alarm_sentry::database::Database;
use alarm_sentry::features::alarms::AlarmScheduler;
use alarm_sentry::features::alert_gate::HttpAlertGate;
use alarm_sentry::features::messaging::TelegramMessenger;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting alarm bot...");

    let database = Database::new(&config.database_path).await?;

    let bot = Bot::new(&config.telegram_token);
    let gate = Arc::new(HttpAlertGate::from_config(&config)?);
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));

    let scheduler = Arc::new(AlarmScheduler::new(
        Arc::new(database.clone()),
        gate,
        messenger,
        config.timezone,
    ));
    let handle = scheduler.start();
    info!("⏰ Alarm scheduler running in {}", config.timezone);

    let ctx = Arc::new(BotContext::new(database));
    run_dispatcher(bot, ctx).await;

    handle.stop().await;
    info!("Bot shut down");
    Ok(())
}
