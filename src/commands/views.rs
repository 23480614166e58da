//! # Inline Keyboards and Message Texts
//!
//! Builders for every screen of the alarm flow. Callback payloads come from
//! [`CallbackAction`] so parsing and rendering stay in one place.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::commands::callbacks::CallbackAction;
use crate::commands::drafts::AlarmDraft;
use crate::core::{format_hhmm, mask_to_days, DAY_NAMES};
use crate::features::alarms::Alarm;

pub const REPEAT_CHOICES: [u32; 6] = [1, 2, 3, 5, 10, 20];
pub const INTERVAL_CHOICES: [u32; 6] = [3, 5, 7, 10, 15, 20];

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_string())
}

/// 24 hours in 4 rows of 6
pub fn hours_keyboard() -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = (0..4u32)
        .map(|row| {
            (0..6u32)
                .map(|col| row * 6 + col)
                .map(|h| button(format!("{h:02}"), CallbackAction::Hour(h)))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Minutes in steps of five, 3 rows of 4
pub fn minutes_keyboard(hour: u32) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = (0..3u32)
        .map(|row| {
            (0..4u32)
                .map(|col| (row * 4 + col) * 5)
                .map(|minute| button(format!("{minute:02}"), CallbackAction::Minute { hour, minute }))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Weekday toggles (selected days marked) plus the "next" button
pub fn days_keyboard(draft: &AlarmDraft) -> InlineKeyboardMarkup {
    let days_row: Vec<InlineKeyboardButton> = DAY_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let day = i as u32 + 1;
            let text = if draft.days.contains(&day) {
                format!("✅ {name}")
            } else {
                name.to_string()
            };
            button(text, CallbackAction::Day(day))
        })
        .collect();

    InlineKeyboardMarkup::new(vec![
        days_row,
        vec![button("➡️ Далее", CallbackAction::AskRepeats)],
    ])
}

pub fn repeats_keyboard() -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = REPEAT_CHOICES
        .iter()
        .map(|&n| button(n.to_string(), CallbackAction::Repeats(n)))
        .collect();
    InlineKeyboardMarkup::new(vec![row])
}

pub fn interval_keyboard() -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = INTERVAL_CHOICES
        .iter()
        .map(|&s| button(format!("{s}с"), CallbackAction::Interval(s)))
        .collect();
    InlineKeyboardMarkup::new(vec![row])
}

/// Delete and enable/disable controls under a listed alarm
pub fn alarm_actions_keyboard(alarm: &Alarm) -> InlineKeyboardMarkup {
    let toggle_text = if alarm.enabled {
        "⏸ Выключить"
    } else {
        "▶️ Включить"
    };
    InlineKeyboardMarkup::new(vec![vec![
        button("❌ Удалить", CallbackAction::Delete(alarm.id)),
        button(toggle_text, CallbackAction::Toggle(alarm.id)),
    ]])
}

pub const HOURS_PROMPT: &str = "Выбери час:";
pub const REPEATS_PROMPT: &str = "Сколько раз повторять сигнал?";
pub const INTERVAL_PROMPT: &str = "Интервал между повторами?";
pub const DELETED_TEXT: &str = "❌ Будильник удалён";
pub const NO_ALARMS_TEXT: &str = "Будильников нет";

pub fn minutes_prompt(hour: u32) -> String {
    format!("Выбран час: {hour:02}\nТеперь выбери минуты:")
}

pub fn days_prompt(draft: &AlarmDraft) -> String {
    let minute = draft.minute.unwrap_or(0);
    if draft.days.is_empty() {
        format!(
            "Выбрано время: {}\nТеперь выбери дни недели:",
            format_hhmm(draft.hour, minute)
        )
    } else {
        format!(
            "Время: {}\nДни: {}\nВыбери дни или перейди дальше:",
            format_hhmm(draft.hour, minute),
            draft.day_names().join(", ")
        )
    }
}

pub fn saved_summary(alarm: &Alarm) -> String {
    format!(
        "✅ Будильник сохранён на {} ({}), повторов: {}, интервал: {}с",
        format_hhmm(alarm.hour, alarm.minute),
        mask_to_days(alarm.days_mask).join(", "),
        alarm.repeats,
        alarm.interval_secs
    )
}

/// One line of the /alarms listing
pub fn alarm_line(alarm: &Alarm) -> String {
    let mut line = format!(
        "{} → {}, повторов: {}, интервал: {}с",
        format_hhmm(alarm.hour, alarm.minute),
        mask_to_days(alarm.days_mask).join(", "),
        alarm.repeats,
        alarm.interval_secs
    );
    if !alarm.enabled {
        line.push_str(" (выключен)");
    }
    line
}
