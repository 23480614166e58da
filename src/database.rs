//! # SQLite Storage
//!
//! Users and alarms persisted through the `sqlite` crate. The handle is cheap to
//! clone and serialises access to the single connection.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Added set_alarm_enabled for the /alarms toggle button
//! - 1.1.0: find_due_alarms joins users to resolve the delivery chat
//! - 1.0.0: Initial schema with users and alarms tables

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use sqlite::{Connection, State, Statement};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::features::alarms::model::{default_label, Alarm, DueAlarm, NewAlarm, User};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id           INTEGER PRIMARY KEY,
        tg_user_id   INTEGER NOT NULL UNIQUE,
        tg_chat_id   INTEGER NOT NULL,
        created_at   INTEGER NOT NULL DEFAULT (strftime('%s','now')*1000)
    );

    CREATE TABLE IF NOT EXISTS alarms (
        id           INTEGER PRIMARY KEY,
        user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        label        TEXT,
        hour         INTEGER NOT NULL,
        minute       INTEGER NOT NULL,
        days_mask    INTEGER NOT NULL,
        enabled      INTEGER NOT NULL DEFAULT 1,
        repeats      INTEGER NOT NULL DEFAULT 3,
        interval     INTEGER NOT NULL DEFAULT 2,
        created_at   INTEGER NOT NULL DEFAULT (strftime('%s','now')*1000),
        updated_at   INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_alarms_due ON alarms(enabled, hour, minute);
";

const ALARM_COLUMNS: &str =
    "id, user_id, label, hour, minute, days_mask, enabled, repeats, interval, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `database_path`. `:memory:` opens a
    /// private in-memory database.
    pub async fn new(database_path: &str) -> Result<Self> {
        if database_path != ":memory:" {
            if let Some(parent) = Path::new(database_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let connection = sqlite::open(database_path)
            .with_context(|| format!("Failed to open database at {database_path}"))?;

        let database = Database {
            conn: Arc::new(Mutex::new(connection)),
        };
        database.initialize().await?;

        info!("Database ready at {database_path}");
        Ok(database)
    }

    async fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("PRAGMA journal_mode = WAL;")?;
        conn.execute("PRAGMA foreign_keys = ON;")?;
        conn.execute(SCHEMA).context("Failed to apply schema")?;
        Ok(())
    }

    /// Register a user on first contact or refresh the chat they talk from
    pub async fn upsert_user(&self, tg_user_id: i64, tg_chat_id: i64) -> Result<User> {
        let conn = self.conn.lock().await;

        let mut insert =
            conn.prepare("INSERT OR IGNORE INTO users (tg_user_id, tg_chat_id) VALUES (?, ?)")?;
        insert.bind((1, tg_user_id))?;
        insert.bind((2, tg_chat_id))?;
        insert.next()?;

        let mut update = conn.prepare("UPDATE users SET tg_chat_id = ? WHERE tg_user_id = ?")?;
        update.bind((1, tg_chat_id))?;
        update.bind((2, tg_user_id))?;
        update.next()?;

        let mut select = conn.prepare(
            "SELECT id, tg_user_id, tg_chat_id, created_at FROM users WHERE tg_user_id = ?",
        )?;
        select.bind((1, tg_user_id))?;
        if select.next()? == State::Row {
            read_user(&select)
        } else {
            Err(anyhow!("User {tg_user_id} missing right after upsert"))
        }
    }

    pub async fn get_user_by_tg(&self, tg_user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        let mut select = conn.prepare(
            "SELECT id, tg_user_id, tg_chat_id, created_at FROM users WHERE tg_user_id = ?",
        )?;
        select.bind((1, tg_user_id))?;

        if select.next()? == State::Row {
            Ok(Some(read_user(&select)?))
        } else {
            Ok(None)
        }
    }

    pub async fn insert_alarm(&self, alarm: &NewAlarm) -> Result<Alarm> {
        let conn = self.conn.lock().await;
        let mut insert = conn.prepare(format!(
            "INSERT INTO alarms (user_id, label, hour, minute, days_mask, repeats, interval)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {ALARM_COLUMNS}"
        ))?;
        insert.bind((1, alarm.user_id))?;
        insert.bind((2, alarm.label.as_str()))?;
        insert.bind((3, alarm.hour as i64))?;
        insert.bind((4, alarm.minute as i64))?;
        insert.bind((5, alarm.days_mask as i64))?;
        insert.bind((6, alarm.repeats as i64))?;
        insert.bind((7, alarm.interval_secs as i64))?;

        if insert.next()? != State::Row {
            return Err(anyhow!("Alarm insert returned no row"));
        }
        let stored = read_alarm(&insert)?;
        debug!("Inserted alarm {} for user {}", stored.id, stored.user_id);
        Ok(stored)
    }

    pub async fn list_alarms(&self, user_id: i64) -> Result<Vec<Alarm>> {
        let conn = self.conn.lock().await;
        let mut select = conn.prepare(format!(
            "SELECT {ALARM_COLUMNS} FROM alarms WHERE user_id = ? ORDER BY hour, minute"
        ))?;
        select.bind((1, user_id))?;

        let mut alarms = Vec::new();
        while select.next()? == State::Row {
            alarms.push(read_alarm(&select)?);
        }
        Ok(alarms)
    }

    /// Delete an alarm owned by `user_id`. Returns false when nothing matched.
    pub async fn delete_alarm(&self, alarm_id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        let mut delete = conn.prepare("DELETE FROM alarms WHERE id = ? AND user_id = ?")?;
        delete.bind((1, alarm_id))?;
        delete.bind((2, user_id))?;
        delete.next()?;
        drop(delete);

        Ok(conn.change_count() > 0)
    }

    pub async fn set_alarm_enabled(&self, alarm_id: i64, user_id: i64, enabled: bool) -> Result<bool> {
        let conn = self.conn.lock().await;
        let mut update = conn
            .prepare("UPDATE alarms SET enabled = ?, updated_at = ? WHERE id = ? AND user_id = ?")?;
        update.bind((1, enabled as i64))?;
        update.bind((2, chrono::Utc::now().timestamp_millis()))?;
        update.bind((3, alarm_id))?;
        update.bind((4, user_id))?;
        update.next()?;
        drop(update);

        Ok(conn.change_count() > 0)
    }

    /// Enabled alarms scheduled exactly at `hour:minute` whose mask shares a bit
    /// with `weekday_bit`, joined with their owner's chat.
    pub async fn find_due_alarms(&self, hour: u32, minute: u32, weekday_bit: u8) -> Result<Vec<DueAlarm>> {
        let conn = self.conn.lock().await;
        let mut select = conn.prepare(
            "SELECT a.id, a.label, a.hour, a.minute, a.repeats, a.interval, u.tg_chat_id
             FROM alarms a
             JOIN users u ON u.id = a.user_id
             WHERE a.enabled = 1
               AND a.hour = ?
               AND a.minute = ?
               AND (a.days_mask & ?) != 0
             ORDER BY a.id",
        )?;
        select.bind((1, hour as i64))?;
        select.bind((2, minute as i64))?;
        select.bind((3, weekday_bit as i64))?;

        let mut due = Vec::new();
        while select.next()? == State::Row {
            let label: Option<String> = select.read("label")?;
            let hour = read_u32(&select, "hour")?;
            let minute = read_u32(&select, "minute")?;
            due.push(DueAlarm {
                alarm_id: select.read("id")?,
                label: label
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| default_label(hour, minute)),
                repeats: read_u32(&select, "repeats")?,
                interval_secs: read_u32(&select, "interval")?,
                chat_id: select.read("tg_chat_id")?,
            });
        }
        Ok(due)
    }
}

fn read_u32(statement: &Statement<'_>, column: &str) -> Result<u32> {
    let value: i64 = statement.read(column)?;
    u32::try_from(value).with_context(|| format!("Column {column} out of range: {value}"))
}

fn read_user(statement: &Statement<'_>) -> Result<User> {
    Ok(User {
        id: statement.read("id")?,
        tg_user_id: statement.read("tg_user_id")?,
        tg_chat_id: statement.read("tg_chat_id")?,
        created_at: statement.read("created_at")?,
    })
}

fn read_alarm(statement: &Statement<'_>) -> Result<Alarm> {
    let hour = read_u32(statement, "hour")?;
    let minute = read_u32(statement, "minute")?;
    let label: Option<String> = statement.read("label")?;
    let days_mask: i64 = statement.read("days_mask")?;
    let enabled: i64 = statement.read("enabled")?;

    Ok(Alarm {
        id: statement.read("id")?,
        user_id: statement.read("user_id")?,
        label: label.unwrap_or_else(|| default_label(hour, minute)),
        hour,
        minute,
        days_mask: u8::try_from(days_mask)
            .with_context(|| format!("days_mask out of range: {days_mask}"))?,
        enabled: enabled != 0,
        repeats: read_u32(statement, "repeats")?,
        interval_secs: read_u32(statement, "interval")?,
        created_at: statement.read("created_at")?,
        updated_at: statement.read("updated_at")?,
    })
}
