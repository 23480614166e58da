//! # Inline Button Callbacks
//!
//! Parses callback payloads into [`CallbackAction`] and applies them to the
//! draft store or the database. [`apply_action`] has no Telegram I/O;
//! [`handle_callback`] renders its [`CallbackOutcome`].
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: toggle_{id} enables or disables a listed alarm
//! - 1.1.0: "Далее" refused while no weekday is selected
//! - 1.0.0: Initial release

use anyhow::Result;
use log::{debug, info, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;

use crate::commands::context::BotContext;
use crate::commands::views;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Hour(u32),
    Minute { hour: u32, minute: u32 },
    /// Weekday toggle, 1 = Monday
    Day(u32),
    AskRepeats,
    Repeats(u32),
    Interval(u32),
    Delete(i64),
    Toggle(i64),
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Hour(h) => write!(f, "hour_{h}"),
            CallbackAction::Minute { hour, minute } => write!(f, "minute_{hour}_{minute}"),
            CallbackAction::Day(d) => write!(f, "day_{d}"),
            CallbackAction::AskRepeats => write!(f, "ask_repeats"),
            CallbackAction::Repeats(n) => write!(f, "repeats_{n}"),
            CallbackAction::Interval(s) => write!(f, "interval_{s}"),
            CallbackAction::Delete(id) => write!(f, "del_{id}"),
            CallbackAction::Toggle(id) => write!(f, "toggle_{id}"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = anyhow::Error;

    fn from_str(data: &str) -> Result<Self> {
        fn num<T: FromStr>(data: &str, raw: &str) -> Result<T> {
            raw.parse()
                .map_err(|_| anyhow::anyhow!("Malformed callback data: {data}"))
        }

        if data == "ask_repeats" {
            return Ok(CallbackAction::AskRepeats);
        }

        let (prefix, rest) = data
            .split_once('_')
            .ok_or_else(|| anyhow::anyhow!("Unknown callback data: {data}"))?;

        let action = match prefix {
            "hour" => CallbackAction::Hour(num(data, rest)?),
            "minute" => {
                let (hour, minute) = rest
                    .split_once('_')
                    .ok_or_else(|| anyhow::anyhow!("Malformed callback data: {data}"))?;
                CallbackAction::Minute {
                    hour: num(data, hour)?,
                    minute: num(data, minute)?,
                }
            }
            "day" => CallbackAction::Day(num(data, rest)?),
            "repeats" => CallbackAction::Repeats(num(data, rest)?),
            "interval" => CallbackAction::Interval(num(data, rest)?),
            "del" => CallbackAction::Delete(num(data, rest)?),
            "toggle" => CallbackAction::Toggle(num(data, rest)?),
            _ => anyhow::bail!("Unknown callback data: {data}"),
        };
        Ok(action)
    }
}

/// What the bot should do with the message a button was pressed on
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// Replace the message text, optionally with a new keyboard
    Edit {
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
        notice: Option<String>,
    },
    /// Leave the message alone and show a short notice
    Notice(String),
    /// Acknowledge silently
    Ignore,
}

impl CallbackOutcome {
    fn edit(text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> Self {
        CallbackOutcome::Edit {
            text: text.into(),
            keyboard: Some(keyboard),
            notice: None,
        }
    }
}

const NEED_START: &str = "Сначала /start";
const NEED_DAYS: &str = "Выбери хотя бы один день";

/// Apply `action` for Telegram user `tg_user_id`
pub async fn apply_action(
    ctx: &BotContext,
    tg_user_id: i64,
    action: CallbackAction,
) -> Result<CallbackOutcome> {
    let drafts = &ctx.drafts;

    let outcome = match action {
        CallbackAction::Hour(hour) => {
            if hour > 23 {
                return Ok(CallbackOutcome::Ignore);
            }
            drafts.start(tg_user_id, hour);
            CallbackOutcome::edit(views::minutes_prompt(hour), views::minutes_keyboard(hour))
        }
        CallbackAction::Minute { hour, minute } => {
            if hour > 23 || minute > 59 {
                return Ok(CallbackOutcome::Ignore);
            }
            let draft = drafts.set_time(tg_user_id, hour, minute);
            CallbackOutcome::edit(views::days_prompt(&draft), views::days_keyboard(&draft))
        }
        CallbackAction::Day(day) => match drafts.update(tg_user_id, |d| d.toggle_day(day)) {
            Some(draft) => {
                CallbackOutcome::edit(views::days_prompt(&draft), views::days_keyboard(&draft))
            }
            None => CallbackOutcome::Ignore,
        },
        CallbackAction::AskRepeats => match drafts.get(tg_user_id) {
            Some(draft) if draft.days.is_empty() => CallbackOutcome::Notice(NEED_DAYS.to_string()),
            Some(_) => CallbackOutcome::edit(views::REPEATS_PROMPT, views::repeats_keyboard()),
            None => CallbackOutcome::Ignore,
        },
        CallbackAction::Repeats(repeats) => {
            match drafts.update(tg_user_id, |d| d.repeats = repeats) {
                Some(_) => CallbackOutcome::edit(views::INTERVAL_PROMPT, views::interval_keyboard()),
                None => CallbackOutcome::Ignore,
            }
        }
        CallbackAction::Interval(interval_secs) => {
            let Some(user) = ctx.database.get_user_by_tg(tg_user_id).await? else {
                return Ok(CallbackOutcome::Notice(NEED_START.to_string()));
            };
            let Some(draft) = drafts.update(tg_user_id, |d| d.interval_secs = interval_secs) else {
                return Ok(CallbackOutcome::Ignore);
            };

            let new_alarm = match draft.finalize(user.id) {
                Ok(new_alarm) => new_alarm,
                Err(e) => {
                    debug!("Rejected draft for user {tg_user_id}: {e:#}");
                    return Ok(CallbackOutcome::Notice(NEED_DAYS.to_string()));
                }
            };

            let alarm = ctx.database.insert_alarm(&new_alarm).await?;
            drafts.remove(tg_user_id);
            info!("User {tg_user_id} saved alarm {} ({})", alarm.id, alarm.label);

            CallbackOutcome::Edit {
                text: views::saved_summary(&alarm),
                keyboard: None,
                notice: None,
            }
        }
        CallbackAction::Delete(alarm_id) => {
            let Some(user) = ctx.database.get_user_by_tg(tg_user_id).await? else {
                return Ok(CallbackOutcome::Ignore);
            };
            if ctx.database.delete_alarm(alarm_id, user.id).await? {
                info!("User {tg_user_id} deleted alarm {alarm_id}");
            }
            CallbackOutcome::Edit {
                text: views::DELETED_TEXT.to_string(),
                keyboard: None,
                notice: Some("Удалено".to_string()),
            }
        }
        CallbackAction::Toggle(alarm_id) => {
            let Some(user) = ctx.database.get_user_by_tg(tg_user_id).await? else {
                return Ok(CallbackOutcome::Ignore);
            };
            let alarms = ctx.database.list_alarms(user.id).await?;
            let Some(mut alarm) = alarms.into_iter().find(|a| a.id == alarm_id) else {
                return Ok(CallbackOutcome::Ignore);
            };

            alarm.enabled = !alarm.enabled;
            ctx.database
                .set_alarm_enabled(alarm_id, user.id, alarm.enabled)
                .await?;
            info!(
                "User {tg_user_id} {} alarm {alarm_id}",
                if alarm.enabled { "enabled" } else { "disabled" }
            );

            CallbackOutcome::edit(views::alarm_line(&alarm), views::alarm_actions_keyboard(&alarm))
        }
    };

    Ok(outcome)
}

/// Endpoint for every callback query
pub async fn handle_callback(bot: Bot, q: CallbackQuery, ctx: Arc<BotContext>) -> Result<()> {
    let tg_user_id = q.from.id.0 as i64;

    let outcome = match q.data.as_deref().map(CallbackAction::from_str) {
        Some(Ok(action)) => {
            debug!("Callback {action} from user {tg_user_id}");
            apply_action(&ctx, tg_user_id, action).await?
        }
        Some(Err(e)) => {
            warn!("Ignoring callback from user {tg_user_id}: {e:#}");
            CallbackOutcome::Ignore
        }
        None => CallbackOutcome::Ignore,
    };

    let notice = match outcome {
        CallbackOutcome::Edit {
            text,
            keyboard,
            notice,
        } => {
            if let Some(message) = q.message.as_ref() {
                let edit = bot.edit_message_text(message.chat().id, message.id(), text);
                match keyboard {
                    Some(keyboard) => edit.reply_markup(keyboard).await?,
                    None => edit.await?,
                };
            }
            notice
        }
        CallbackOutcome::Notice(text) => Some(text),
        CallbackOutcome::Ignore => None,
    };

    let answer = bot.answer_callback_query(q.id.clone());
    match notice {
        Some(text) => answer.text(text).await?,
        None => answer.await?,
    };

    Ok(())
}
