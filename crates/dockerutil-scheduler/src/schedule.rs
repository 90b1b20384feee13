//! Cron expression parsing.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use cron::Schedule;

use crate::error::SchedulerError;

/// When a job fires.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Calendar schedule.
    Cron(Schedule),
    /// Fixed interval in whole seconds, from `@every <duration>`.
    Every(Duration),
}

impl Trigger {
    /// First firing strictly after `after`.
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Cron(schedule) => schedule.after(after).next(),
            Trigger::Every(interval) => {
                let interval = chrono::Duration::from_std(*interval).ok()?;
                after.with_nanosecond(0)?.checked_add_signed(interval)
            }
        }
    }
}

/// Parse a cron expression into a [`Trigger`].
///
/// Accepted forms:
/// - 5 fields, standard crontab: `minute hour day_of_month month day_of_week`.
///   A `0` seconds field is prepended and numeric days of week are shifted
///   from crontab numbering (0 or 7 = Sunday) to the `cron` crate's
///   (1 = Sunday .. 7 = Saturday).
/// - 6 fields: `second minute hour day_of_month month day_of_week`, passed
///   through unchanged.
/// - `@hourly`, `@daily`/`@midnight`, `@weekly`, `@monthly`,
///   `@yearly`/`@annually`.
/// - `@every <duration>` with Go-style durations such as `90s`, `5m` or
///   `1h30m`. Intervals are truncated to whole seconds, minimum one second.
pub fn parse_schedule(expr: &str) -> Result<Trigger, SchedulerError> {
    let invalid = |reason: String| SchedulerError::InvalidCron {
        expr: expr.to_string(),
        reason,
    };

    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(invalid("expression is empty".to_string()));
    }

    if let Some(interval) = trimmed.strip_prefix("@every") {
        let interval = interval.trim();
        if interval.is_empty() {
            return Err(invalid("@every needs a duration".to_string()));
        }
        let interval = parse_interval(interval).map_err(invalid)?;
        let seconds = interval.as_secs().max(1);
        return Ok(Trigger::Every(Duration::from_secs(seconds)));
    }

    let normalized = match trimmed {
        "@midnight" => "@daily".to_string(),
        "@annually" => "@yearly".to_string(),
        descriptor if descriptor.starts_with('@') => descriptor.to_string(),
        _ => {
            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            match fields.len() {
                5 => format!(
                    "0 {} {} {} {} {}",
                    fields[0],
                    fields[1],
                    fields[2],
                    fields[3],
                    crontab_day_of_week(fields[4])
                ),
                6 => fields.join(" "),
                n => return Err(invalid(format!("expected 5 or 6 fields, got {}", n))),
            }
        }
    };

    Schedule::from_str(&normalized)
        .map(Trigger::Cron)
        .map_err(|e| invalid(e.to_string()))
}

/// Parse a Go-style duration: one or more `<number><unit>` pairs with units
/// `ns`, `us`, `ms`, `s`, `m` or `h`. A bare `0` is allowed.
fn parse_interval(text: &str) -> Result<Duration, String> {
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = text;
    let mut seconds = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration '{}'", text))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => return Err(format!("missing unit in duration '{}'", text)),
            unit => return Err(format!("unknown unit '{}' in duration '{}'", unit, text)),
        };
        seconds += value * scale;
        rest = &rest[unit_len..];
    }

    Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid duration '{}': {}", text, e))
}

/// Rewrite a crontab day-of-week field into `cron` crate numbering.
///
/// Numeric items are expanded to explicit days; a field covering the whole
/// week becomes `*`. Names, `*` and `*/n` already mean the same thing in
/// both numberings and pass through.
fn crontab_day_of_week(field: &str) -> String {
    let mut days = BTreeSet::new();
    let mut passthrough = Vec::new();
    for item in field.split(',') {
        match crontab_days(item) {
            Some(expanded) => days.extend(expanded),
            None => passthrough.push(item.to_string()),
        }
    }

    if passthrough.is_empty() && days.len() == 7 {
        return "*".to_string();
    }
    days.iter()
        .map(|d| d.to_string())
        .chain(passthrough)
        .collect::<Vec<_>>()
        .join(",")
}

/// Days selected by one numeric crontab item (`d`, `a-b`, `a-b/s`, `a/s`),
/// in `cron` crate numbering. `None` for anything else.
fn crontab_days(item: &str) -> Option<Vec<u8>> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, step.parse::<usize>().ok().filter(|s| *s > 0)?),
        None => (item, 1),
    };
    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start.parse::<u8>().ok()?, end.parse::<u8>().ok()?),
        None => {
            let day = range.parse::<u8>().ok()?;
            (day, if item.contains('/') { 6 } else { day })
        }
    };
    if end > 7 || start > end {
        return None;
    }

    Some(
        (start..=end)
            .step_by(step)
            .map(|day| if day == 0 || day == 7 { 1 } else { day + 1 })
            .collect(),
    )
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
