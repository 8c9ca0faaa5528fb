// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily firing rule: a wall-clock time in an IANA timezone.
//!
//! The next fire instant is recomputed in the target zone before every
//! sleep -- never derived from a UTC offset cached at registration -- so
//! daylight-saving transitions cannot cause drift, double-fires, or skipped
//! days.
//!
//! DST policy:
//! - A wall-clock time erased by spring-forward fires at the first valid
//!   local minute after the gap (same day, shifted, never skipped).
//! - A wall-clock time repeated by fall-back fires on the earliest
//!   (pre-transition) mapping only.

use chrono::{DateTime, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

use digestif_core::DigestifError;

/// Bound on the spring-forward gap scan. DST gaps are at most two hours in
/// practice; three hours of slack covers exotic zones.
const MAX_GAP_SCAN_MINUTES: i64 = 180;

/// A chat's recurring daily firing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiringRule {
    hour: u32,
    minute: u32,
    tz: chrono_tz::Tz,
}

impl FiringRule {
    /// Parse and validate a `report_time` (`HH:MM`, 24-hour) and an IANA
    /// timezone name.
    ///
    /// Returns [`DigestifError::InvalidSchedule`] on malformed input; the
    /// caller must leave any previously installed timer untouched.
    pub fn parse(report_time: &str, timezone: &str) -> Result<Self, DigestifError> {
        let (hour, minute) =
            parse_report_time(report_time).ok_or_else(|| DigestifError::InvalidSchedule {
                reason: format!("report_time '{report_time}' is not a valid 24-hour HH:MM"),
            })?;

        let tz = timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| DigestifError::InvalidSchedule {
                reason: format!("timezone '{timezone}' is not a resolvable IANA zone"),
            })?;

        Ok(Self { hour, minute, tz })
    }

    /// The timezone this rule fires in.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.tz
    }

    /// The next fire instant strictly after `after`, computed in the rule's
    /// timezone.
    pub fn next_fire_after(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = after.with_timezone(&self.tz).date_naive();

        // Today or one of the next few days always yields a fire; the loop
        // bound only guards against a pathological zone database.
        for _ in 0..4 {
            if let Some(candidate) = date.and_hms_opt(self.hour, self.minute, 0)
                && let Some(fire) = self.resolve_local(candidate)
                && fire > after
            {
                return fire;
            }
            date = date.checked_add_days(Days::new(1)).unwrap_or(date);
        }

        // Safety net; unreachable for a valid rule.
        after + Duration::days(1)
    }

    /// Map a local wall-clock instant to UTC under the DST policy.
    ///
    /// Spring-forward gaps scan forward to the first valid local minute;
    /// fall-back overlaps resolve to the earliest (pre-transition) mapping.
    fn resolve_local(&self, candidate: NaiveDateTime) -> Option<DateTime<Utc>> {
        let mut candidate = candidate;
        for _ in 0..MAX_GAP_SCAN_MINUTES {
            match self.tz.from_local_datetime(&candidate) {
                LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
                LocalResult::Ambiguous(earliest, _) => {
                    return Some(earliest.with_timezone(&Utc));
                }
                LocalResult::None => {
                    candidate += Duration::minutes(1);
                }
            }
        }
        None
    }

    /// The report target for a scheduled fire: yesterday's date in the
    /// rule's timezone (the day that just ended).
    pub fn yesterday(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = now.with_timezone(&self.tz).date_naive();
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    }

    /// Today's date in the rule's timezone (on-demand previews).
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }
}

/// Parse `HH:MM` within 24-hour bounds.
fn parse_report_time(value: &str) -> Option<(u32, u32)> {
    let (hh, mm) = value.split_once(':')?;
    if hh.is_empty() || hh.len() > 2 || mm.len() != 2 {
        return None;
    }
    let hour = hh.parse::<u32>().ok()?;
    let minute = mm.parse::<u32>().ok()?;
    if hour <= 23 && minute <= 59 {
        Some((hour, minute))
    } else {
        None
    }
}
