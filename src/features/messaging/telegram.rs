//! Telegram delivery for alarm notifications

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;

/// Fire-and-forget text delivery to a chat
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Thin wrapper around teloxide::Bot used by the scheduler
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn notify(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text.to_string()).await?;
        Ok(())
    }
}
