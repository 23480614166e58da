//! # Alarm Scheduler
//!
//! Ticks at second 0 of every minute in the configured time zone, scans for due
//! alarms and hands each new match to its own [`DeliverySequencer`] task. A match
//! whose [`DeliveryKey`](crate::features::alarms::model::DeliveryKey) is still in
//! flight is skipped.
//!
//! - **Version**: 1.3.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.3.0: Never re-tick a minute after a backward clock step; stop waits for the loop to exit
//! - 1.2.0: start/stop lifecycle through SchedulerHandle
//! - 1.1.0: Ticks aligned to wall-clock minute boundaries instead of a free-running interval
//! - 1.0.0: Initial release

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::features::alarms::model::DueAlarm;
use crate::features::alarms::pending::PendingDeliveries;
use crate::features::alarms::repository::AlarmRepository;
use crate::features::alarms::scanner::DueAlarmScanner;
use crate::features::alarms::sequencer::DeliverySequencer;
use crate::features::alert_gate::AlertGate;
use crate::features::messaging::Messenger;

/// First whole-minute instant strictly after `now`
pub fn next_minute_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let next = (now.timestamp().div_euclid(60) + 1) * 60;
    DateTime::from_timestamp(next, 0).unwrap_or_else(|| now + ChronoDuration::minutes(1))
}

/// Boundary to tick next, given the wall clock and the last boundary ticked.
///
/// Always strictly after `last`, so a clock that steps backwards cannot
/// repeat a minute that was already scanned.
pub fn next_tick(now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let boundary = next_minute_boundary(now);
    match last {
        Some(last) => boundary.max(last + ChronoDuration::minutes(1)),
        None => boundary,
    }
}

/// Source of wall-clock time for the minute loop
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct AlarmScheduler {
    scanner: DueAlarmScanner,
    gate: Arc<dyn AlertGate>,
    messenger: Arc<dyn Messenger>,
    pending: PendingDeliveries,
    timezone: Tz,
    clock: Clock,
}

impl AlarmScheduler {
    pub fn new(
        repository: Arc<dyn AlarmRepository>,
        gate: Arc<dyn AlertGate>,
        messenger: Arc<dyn Messenger>,
        timezone: Tz,
    ) -> Self {
        Self {
            scanner: DueAlarmScanner::new(repository),
            gate,
            messenger,
            pending: PendingDeliveries::new(),
            timezone,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used by [`run`](Self::run)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn pending(&self) -> &PendingDeliveries {
        &self.pending
    }

    /// Scan once at `now` and dispatch newly due alarms. Returns how many were dispatched.
    ///
    /// A failed scan is logged and skipped; the next tick tries again.
    pub async fn tick(&self, now: DateTime<Tz>) -> usize {
        let due = match self.scanner.scan(&now).await {
            Ok(due) => due,
            Err(e) => {
                error!("Due alarm scan failed at {}: {e:#}", now.format("%a %H:%M"));
                return 0;
            }
        };

        debug!("Tick {} matched {} alarm(s)", now.format("%a %H:%M"), due.len());

        let mut dispatched = 0;
        for alarm in due {
            if self.dispatch(alarm) {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Start a delivery sequence for `due` unless its key is already in flight
    pub fn dispatch(&self, due: DueAlarm) -> bool {
        let key = due.key();
        let gate = Arc::clone(&self.gate);
        let messenger = Arc::clone(&self.messenger);
        let pending = self.pending.clone();

        let registered = self.pending.try_register(key, move || {
            let sequencer = DeliverySequencer::new(due, gate, messenger, pending);
            tokio::spawn(async move {
                sequencer.run().await;
            })
        });

        if registered {
            info!("Dispatched alarm delivery {key}");
        } else {
            debug!("Alarm delivery {key} already in flight, skipping");
        }
        registered
    }

    /// Minute-aligned loop; runs until the task is aborted
    pub async fn run(self: Arc<Self>) {
        info!("Alarm scheduler started (time zone: {})", self.timezone);

        let mut last: Option<DateTime<Utc>> = None;
        loop {
            let now = (self.clock)();
            let boundary = next_tick(now, last);
            if let Some(previous) = last {
                if now < previous {
                    warn!("Wall clock stepped back to {now}, holding until {boundary}");
                }
            }
            let wait = (boundary - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            self.tick(boundary.with_timezone(&self.timezone)).await;
            last = Some(boundary);
        }
    }

    pub fn start(self: &Arc<Self>) -> SchedulerHandle {
        let task = tokio::spawn(Arc::clone(self).run());
        SchedulerHandle {
            task,
            pending: self.pending.clone(),
        }
    }
}

/// Running scheduler. Dropping the handle leaves the loop running; call [`stop`](Self::stop).
pub struct SchedulerHandle {
    task: JoinHandle<()>,
    pending: PendingDeliveries,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop ticking and abandon in-flight deliveries without draining them.
    ///
    /// Waits for the loop task to exit before clearing the pending set, so a
    /// tick that was mid-dispatch cannot register a sequence afterwards.
    pub async fn stop(self) {
        self.task.abort();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!("Alarm scheduler loop ended abnormally: {e}");
            }
        }
        let abandoned = self.pending.abandon_all();
        info!("Alarm scheduler stopped, abandoned {abandoned} in-flight delivery(ies)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ALL_DAYS_MASK;
    use crate::database::Database;
    use crate::features::alarms::model::NewAlarm;
    use crate::features::alarms::testing::{due_alarm, RecordingMessenger, ScriptedGate, StaticRepository};
    use chrono::TimeZone;
    use chrono_tz::Europe::Kyiv;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

    /// Clock that replays `readings`, then keeps returning the last one
    fn scripted_clock(readings: Vec<DateTime<Utc>>) -> Clock {
        let readings = Mutex::new(VecDeque::from(readings));
        let last = Mutex::new(None);
        Arc::new(move || {
            let next = readings.lock().unwrap().pop_front();
            let mut last = last.lock().unwrap();
            if let Some(reading) = next {
                *last = Some(reading);
            }
            (*last).expect("scripted clock needs at least one reading")
        })
    }

    fn utc(h: u32, m: u32, s: u32, ms: u32) -> DateTime<Utc> {
        // 2024-05-13 is a Monday; Kyiv is UTC+3 in May
        Utc.with_ymd_and_hms(2024, 5, 13, h, m, s).unwrap() + ChronoDuration::milliseconds(i64::from(ms))
    }

    fn scheduler(
        repository: Arc<dyn AlarmRepository>,
        gate: &Arc<ScriptedGate>,
        messenger: &Arc<RecordingMessenger>,
    ) -> Arc<AlarmScheduler> {
        Arc::new(AlarmScheduler::new(repository, gate.clone(), messenger.clone(), Kyiv))
    }

    #[test]
    fn test_next_minute_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 8, 59, 30).unwrap();
        assert_eq!(
            next_minute_boundary(now),
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
        );

        let on_boundary = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        assert_eq!(
            next_minute_boundary(on_boundary),
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 1, 0).unwrap()
        );
    }

    #[test]
    fn test_next_tick_never_repeats_a_boundary() {
        let nine = utc(6, 0, 0, 0);
        assert_eq!(next_tick(utc(5, 59, 59, 500), None), nine);

        // Clock stepped back below the boundary just ticked
        assert_eq!(next_tick(utc(5, 59, 59, 600), Some(nine)), utc(6, 1, 0, 0));

        // Normal progress and forward jumps follow the wall clock
        assert_eq!(next_tick(utc(6, 0, 0, 20), Some(nine)), utc(6, 1, 0, 0));
        assert_eq!(next_tick(utc(6, 7, 30, 0), Some(nine)), utc(6, 8, 0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_does_not_rescan_minute_after_backward_clock_step() {
        let repository = Arc::new(StaticRepository::new(vec![due_alarm(1, 42, 1, 1)]));
        let gate = Arc::new(ScriptedGate::always(false));
        let messenger = Arc::new(RecordingMessenger::new());
        let clock = scripted_clock(vec![utc(5, 59, 59, 500), utc(5, 59, 59, 600)]);
        let scheduler = Arc::new(
            AlarmScheduler::new(repository.clone(), gate.clone(), messenger.clone(), Kyiv)
                .with_clock(clock),
        );

        let handle = scheduler.start();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(repository.queries(), vec![(9, 0, 0b1)]);
        assert_eq!(messenger.deliveries().len(), 1);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(repository.queries(), vec![(9, 0, 0b1), (9, 1, 0b1)]);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_sequences_dispatched_by_loop() {
        let repository = Arc::new(StaticRepository::new(vec![due_alarm(3, 30, 1, 1)]));
        let gate = Arc::new(ScriptedGate::always(true));
        let messenger = Arc::new(RecordingMessenger::new());
        let scheduler = Arc::new(
            AlarmScheduler::new(repository, gate.clone(), messenger.clone(), Kyiv)
                .with_clock(scripted_clock(vec![utc(5, 59, 59, 900)])),
        );

        let handle = scheduler.start();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(scheduler.pending().len(), 1);

        handle.stop().await;
        assert!(scheduler.pending().is_empty());

        let polls = gate.polls();
        sleep(Duration::from_secs(300)).await;
        assert_eq!(gate.polls(), polls);
        assert!(messenger.deliveries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_queries_local_components() {
        let repository = Arc::new(StaticRepository::new(Vec::new()));
        let gate = Arc::new(ScriptedGate::always(false));
        let messenger = Arc::new(RecordingMessenger::new());
        let scheduler = scheduler(repository.clone(), &gate, &messenger);

        // Wednesday 07:30 local
        let now = Kyiv.with_ymd_and_hms(2024, 5, 15, 7, 30, 0).unwrap();
        assert_eq!(scheduler.tick(now).await, 0);
        assert_eq!(repository.queries(), vec![(7, 30, 0b100)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_dispatched_once_while_awaiting_gate() {
        let repository = Arc::new(StaticRepository::new(vec![due_alarm(1, 100, 1, 1)]));
        let gate = Arc::new(ScriptedGate::always(true));
        let messenger = Arc::new(RecordingMessenger::new());
        let scheduler = scheduler(repository, &gate, &messenger);
        let now = Kyiv.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap();

        assert_eq!(scheduler.tick(now).await, 1);
        assert_eq!(scheduler.tick(now).await, 0);
        assert!(!scheduler.dispatch(due_alarm(1, 100, 1, 1)));
        assert_eq!(scheduler.pending().len(), 1);

        // Only one sequencer is polling the gate
        sleep(Duration::from_secs(1)).await;
        assert_eq!(gate.polls(), 1);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(gate.polls(), 2);
        assert!(messenger.deliveries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_destinations_dispatch_separately() {
        let repository = Arc::new(StaticRepository::new(vec![
            due_alarm(1, 100, 1, 1),
            due_alarm(1, 200, 1, 1),
            due_alarm(2, 100, 1, 1),
        ]));
        let gate = Arc::new(ScriptedGate::always(true));
        let messenger = Arc::new(RecordingMessenger::new());
        let scheduler = scheduler(repository, &gate, &messenger);

        let now = Kyiv.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap();
        assert_eq!(scheduler.tick(now).await, 3);
        assert_eq!(scheduler.pending().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_failure_skips_tick() {
        let repository = Arc::new(StaticRepository::failing());
        let gate = Arc::new(ScriptedGate::always(false));
        let messenger = Arc::new(RecordingMessenger::new());
        let scheduler = scheduler(repository.clone(), &gate, &messenger);

        let now = Kyiv.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap();
        assert_eq!(scheduler.tick(now).await, 0);
        assert_eq!(scheduler.tick(now).await, 0);
        assert_eq!(repository.queries().len(), 2);
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_alarm_delivers_twice_on_monday_morning() {
        let db = Database::new(":memory:").await.unwrap();
        let user = db.upsert_user(11, 4242).await.unwrap();
        db.insert_alarm(&NewAlarm::new(user.id, 9, 0, ALL_DAYS_MASK, 2, 10).unwrap())
            .await
            .unwrap();

        let gate = Arc::new(ScriptedGate::always(false));
        let messenger = Arc::new(RecordingMessenger::new());
        let scheduler = scheduler(Arc::new(db), &gate, &messenger);

        // 2024-05-13 is a Monday
        let monday_nine = Kyiv.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap();
        let started = Instant::now();
        assert_eq!(scheduler.tick(monday_nine).await, 1);

        sleep(Duration::from_secs(15)).await;

        let deliveries = messenger.deliveries();
        assert_eq!(deliveries.len(), 2);
        assert!(deliveries.iter().all(|d| d.chat_id == 4242));
        assert_eq!(deliveries[0].text, "⏰ #1 Будильник 09:00");
        assert_eq!(deliveries[1].text, "⏰ #2 Будильник 09:00");

        let first = deliveries[0].at - started;
        let second = deliveries[1].at - started;
        assert!(first < Duration::from_millis(50));
        assert!(second >= Duration::from_secs(10) && second < Duration::from_millis(10_050));
        assert!(scheduler.pending().is_empty());

        // Not due a minute later
        let monday_nine_one = Kyiv.with_ymd_and_hms(2024, 5, 13, 9, 1, 0).unwrap();
        assert_eq!(scheduler.tick(monday_nine_one).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_abandons_in_flight_deliveries() {
        let repository = Arc::new(StaticRepository::new(Vec::new()));
        let gate = Arc::new(ScriptedGate::always(true));
        let messenger = Arc::new(RecordingMessenger::new());
        let scheduler = scheduler(repository, &gate, &messenger);

        assert!(scheduler.dispatch(due_alarm(9, 900, 1, 1)));
        let handle = scheduler.start();
        assert!(handle.is_running());

        handle.stop().await;
        assert!(scheduler.pending().is_empty());

        sleep(Duration::from_secs(300)).await;
        assert!(gate.polls() <= 1);
        assert!(messenger.deliveries().is_empty());
    }
}
