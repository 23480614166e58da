//! Bot commands and the update dispatcher
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Commands parsed with BotCommands, callbacks routed through dptree
//! - 1.0.0: Initial implementation

use anyhow::Result;
use log::{error, info};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::commands::callbacks::handle_callback;
use crate::commands::context::BotContext;
use crate::commands::views;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "регистрация")]
    Start,
    #[command(description = "проверка работы бота")]
    Health,
    #[command(description = "новый будильник")]
    Alarm,
    #[command(description = "список будильников")]
    Alarms,
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<BotContext>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let tg_user_id = from.id.0 as i64;

    match cmd {
        Command::Start => {
            let user = ctx.database.upsert_user(tg_user_id, chat_id.0).await?;
            info!("Registered user {tg_user_id} (id {}) in chat {}", user.id, chat_id.0);
            bot.send_message(chat_id, "Привет! Установи будильник: /alarm")
                .await?;
        }
        Command::Health => {
            bot.send_message(chat_id, "Бот работает").await?;
        }
        Command::Alarm => {
            if ctx.database.get_user_by_tg(tg_user_id).await?.is_none() {
                bot.send_message(chat_id, "Сначала /start").await?;
                return Ok(());
            }
            bot.send_message(chat_id, views::HOURS_PROMPT)
                .reply_markup(views::hours_keyboard())
                .await?;
        }
        Command::Alarms => {
            let Some(user) = ctx.database.get_user_by_tg(tg_user_id).await? else {
                bot.send_message(chat_id, "Сначала /start").await?;
                return Ok(());
            };

            let alarms = ctx.database.list_alarms(user.id).await?;
            if alarms.is_empty() {
                bot.send_message(chat_id, views::NO_ALARMS_TEXT).await?;
                return Ok(());
            }

            for alarm in &alarms {
                bot.send_message(chat_id, views::alarm_line(alarm))
                    .reply_markup(views::alarm_actions_keyboard(alarm))
                    .await?;
            }
        }
    }

    Ok(())
}

/// Long-poll updates until Ctrl-C
pub async fn run_dispatcher(bot: Bot, ctx: Arc<BotContext>) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        error!("Failed to register bot commands: {e}");
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("Starting Telegram dispatcher");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
