//! Per-metric health state machine.
//!
//! Health flips only after `threshold` consecutive opposite observations.
//! While unhealthy, reminders are sent every `failure_reminder` for the
//! first `failure_reminder_count` reminders, then once a day at
//! `daily_reminder`.

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;

use chrono::{DateTime, Days, Local, NaiveTime, TimeDelta};
use minimon_config::{AlertConfig, TimeOfDay};
use minimon_protocols::Message;

/// Current health of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy,
}

/// Health tracker for a single metric.
#[derive(Debug, Clone)]
pub struct MetricStateMachine {
    healthy_threshold: u32,
    unhealthy_threshold: u32,
    failure_reminder: TimeDelta,
    failure_reminder_count: u32,
    daily_reminder: TimeOfDay,

    health: Health,
    opposite_in_a_row: u32,
    last_failure: Option<DateTime<Local>>,
    reminder_count: u32,
}

impl MetricStateMachine {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            healthy_threshold: config.healthy_threshold,
            unhealthy_threshold: config.unhealthy_threshold,
            failure_reminder: TimeDelta::from_std(config.failure_reminder).unwrap_or(TimeDelta::MAX),
            failure_reminder_count: config.failure_reminder_count,
            daily_reminder: config.daily_reminder,
            health: Health::Healthy,
            opposite_in_a_row: 0,
            last_failure: None,
            reminder_count: 0,
        }
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn is_healthy(&self) -> bool {
        self.health == Health::Healthy
    }

    /// Reminders sent since the last failure transition.
    pub fn reminder_count(&self) -> u32 {
        self.reminder_count
    }

    /// Feed one observation. Returns the message to send, if any.
    pub fn update(
        &mut self,
        observed_healthy: bool,
        name: &str,
        description: &str,
        now: DateTime<Local>,
    ) -> Option<Message> {
        if observed_healthy != self.is_healthy() {
            self.opposite_in_a_row += 1;
        } else {
            self.opposite_in_a_row = 0;
        }

        match self.health {
            Health::Healthy => {
                if self.opposite_in_a_row >= self.unhealthy_threshold {
                    self.health = Health::Unhealthy;
                    self.opposite_in_a_row = 0;
                    self.last_failure = Some(now);
                    self.reminder_count = 0;
                    return Some(Message::failure(format!("{} failed: {}", name, description)));
                }
                None
            }
            Health::Unhealthy => {
                if self.opposite_in_a_row >= self.healthy_threshold {
                    self.health = Health::Healthy;
                    self.opposite_in_a_row = 0;
                    return Some(Message::recovery(format!("{} recovered", name)));
                }
                if self.reminder_due(now) {
                    self.last_failure = Some(now);
                    self.reminder_count += 1;
                    return Some(Message::failure(format!(
                        "{} still failing (reminder #{}): {}",
                        name, self.reminder_count, description
                    )));
                }
                None
            }
        }
    }

    fn reminder_due(&self, now: DateTime<Local>) -> bool {
        let Some(last_failure) = self.last_failure else {
            return false;
        };
        if self.reminder_count < self.failure_reminder_count {
            now - last_failure >= self.failure_reminder
        } else {
            now >= self.next_daily_reminder(last_failure)
        }
    }

    /// First occurrence of the daily reminder time strictly after `after`.
    fn next_daily_reminder(&self, after: DateTime<Local>) -> DateTime<Local> {
        let time = NaiveTime::from_hms_opt(self.daily_reminder.hour, self.daily_reminder.minute, 0)
            .unwrap_or(NaiveTime::MIN);
        let at = |offset: u64| {
            after
                .date_naive()
                .checked_add_days(Days::new(offset))
                .and_then(|day| day.and_time(time).and_local_timezone(Local).earliest())
        };

        match at(0) {
            Some(today) if today > after => today,
            _ => at(1).unwrap_or(after + TimeDelta::days(1)),
        }
    }
}
