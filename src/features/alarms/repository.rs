//! Storage seam used by the scanner

use anyhow::Result;
use async_trait::async_trait;

use crate::database::Database;
use crate::features::alarms::model::DueAlarm;

/// Read access to alarms the scheduler needs
#[async_trait]
pub trait AlarmRepository: Send + Sync {
    /// Enabled alarms at exactly `hour:minute` whose days-mask intersects `weekday_bit`
    async fn find_due_alarms(&self, hour: u32, minute: u32, weekday_bit: u8) -> Result<Vec<DueAlarm>>;
}

#[async_trait]
impl AlarmRepository for Database {
    async fn find_due_alarms(&self, hour: u32, minute: u32, weekday_bit: u8) -> Result<Vec<DueAlarm>> {
        Database::find_due_alarms(self, hour, minute, weekday_bit).await
    }
}
