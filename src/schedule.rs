use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SCHEDULE: &str = "0 20 * * *";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("expected 5 cron fields, found {0}")]
    FieldCount(usize),

    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// A once-a-day UTC schedule written as a cron expression.
///
/// Only `M H * * *` is accepted: a fixed minute and hour, every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    hour: u32,
    minute: u32,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 {
            return Err(ScheduleError::InvalidField {
                field: "hour",
                value: hour.to_string(),
                reason: "must be between 0 and 23".to_string(),
            });
        }
        if minute > 59 {
            return Err(ScheduleError::InvalidField {
                field: "minute",
                value: minute.to_string(),
                reason: "must be between 0 and 59".to_string(),
            });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// First fire time strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = now.date_naive().and_time(NaiveTime::default()).and_utc();
        let today = midnight
            + Duration::hours(i64::from(self.hour))
            + Duration::minutes(i64::from(self.minute));
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Fire time following a run that was scheduled at `scheduled` and
    /// finished at `finished`. Fire times missed while the run was still
    /// going are skipped, not replayed.
    pub fn next_after_run(
        &self,
        scheduled: DateTime<Utc>,
        finished: DateTime<Utc>,
    ) -> DateTime<Utc> {
        self.next_after(scheduled.max(finished))
    }

    /// Fire times after `now`, in order
    pub fn upcoming(&self, now: DateTime<Utc>) -> impl Iterator<Item = DateTime<Utc>> {
        let schedule = *self;
        std::iter::successors(Some(schedule.next_after(now)), move |prev| {
            Some(schedule.next_after(*prev))
        })
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self {
            hour: 20,
            minute: 0,
        }
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<u32, ScheduleError> {
    value.parse::<u32>().map_err(|_| ScheduleError::InvalidField {
        field,
        value: value.to_string(),
        reason: "expected a single number".to_string(),
    })
}

impl FromStr for DailySchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ScheduleError::FieldCount(fields.len()));
        }

        let minute = parse_number("minute", fields[0])?;
        let hour = parse_number("hour", fields[1])?;

        for (name, value) in [
            ("day of month", fields[2]),
            ("month", fields[3]),
            ("day of week", fields[4]),
        ] {
            if value != "*" {
                return Err(ScheduleError::InvalidField {
                    field: name,
                    value: value.to_string(),
                    reason: "only '*' is supported".to_string(),
                });
            }
        }

        Self::new(hour, minute)
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} * * *", self.minute, self.hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_default_is_eight_pm_utc() {
        let schedule: DailySchedule = DEFAULT_SCHEDULE.parse().unwrap();
        assert_eq!(schedule, DailySchedule::default());
        assert_eq!(schedule.hour(), 20);
        assert_eq!(schedule.minute(), 0);
        assert_eq!(schedule.to_string(), DEFAULT_SCHEDULE);
    }

    #[test]
    fn test_next_after_same_day() {
        let schedule = DailySchedule::default();
        let next = schedule.next_after(utc(2025, 4, 21, 9, 15, 0));
        assert_eq!(next, utc(2025, 4, 21, 20, 0, 0));
    }

    #[test]
    fn test_next_after_rolls_to_tomorrow() {
        let schedule = DailySchedule::default();
        assert_eq!(
            schedule.next_after(utc(2025, 4, 21, 20, 0, 0)),
            utc(2025, 4, 22, 20, 0, 0)
        );
        assert_eq!(
            schedule.next_after(utc(2025, 12, 31, 23, 59, 59)),
            utc(2026, 1, 1, 20, 0, 0)
        );
    }

    #[test]
    fn test_upcoming_is_daily() {
        let schedule: DailySchedule = "30 6 * * *".parse().unwrap();
        let times: Vec<_> = schedule.upcoming(utc(2025, 2, 27, 12, 0, 0)).take(3).collect();
        assert_eq!(
            times,
            vec![
                utc(2025, 2, 28, 6, 30, 0),
                utc(2025, 3, 1, 6, 30, 0),
                utc(2025, 3, 2, 6, 30, 0),
            ]
        );
    }

    #[test]
    fn test_upcoming_is_lazy() {
        let schedule = DailySchedule::default();
        let mut times = schedule.upcoming(utc(2025, 4, 21, 0, 0, 0)).take(usize::MAX);
        assert_eq!(times.next(), Some(utc(2025, 4, 21, 20, 0, 0)));
    }

    #[test]
    fn test_next_after_quick_run_keeps_cadence() {
        let schedule = DailySchedule::default();
        let scheduled = utc(2025, 4, 21, 20, 0, 0);
        assert_eq!(
            schedule.next_after_run(scheduled, utc(2025, 4, 21, 20, 0, 4)),
            utc(2025, 4, 22, 20, 0, 0)
        );
    }

    #[test]
    fn test_next_after_long_run_skips_missed_fire_times() {
        let schedule = DailySchedule::default();
        let scheduled = utc(2025, 4, 21, 20, 0, 0);
        // The run hung for more than two days
        let finished = utc(2025, 4, 23, 20, 5, 0);
        assert_eq!(
            schedule.next_after_run(scheduled, finished),
            utc(2025, 4, 24, 20, 0, 0)
        );
    }

    #[test]
    fn test_parse_rejects_unsupported_expressions() {
        assert_eq!(
            "0 20 * *".parse::<DailySchedule>(),
            Err(ScheduleError::FieldCount(4))
        );
        assert!("*/5 20 * * *".parse::<DailySchedule>().is_err());
        assert!("0 24 * * *".parse::<DailySchedule>().is_err());
        assert!("60 1 * * *".parse::<DailySchedule>().is_err());
        assert!("0 20 * * 1-5".parse::<DailySchedule>().is_err());
    }
}
