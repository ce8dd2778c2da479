//! Quota ledger checks.
//!
//! The check is a pure function over the stored [`QuotaState`]; nothing is
//! mutated on denial. The engine commits counters through
//! `database::quota::commit_reply` only after a successful dispatch.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use database::QuotaState;

/// Why a reply was denied. Stable wire strings for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    DailyLimit,
    NewContactLimit,
    IntervalNotElapsed,
    Cooldown,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::DailyLimit => "DAILY_LIMIT",
            DenyReason::NewContactLimit => "NEW_CONTACT_LIMIT",
            DenyReason::IntervalNotElapsed => "INTERVAL_NOT_ELAPSED",
            DenyReason::Cooldown => "COOLDOWN",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caps and interval applying to one subject for one message.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    /// Maximum replies per calendar day.
    pub daily_cap: i64,
    /// Cumulative new-contact cap, when the contact is not yet personal.
    pub new_contact_cap: Option<i64>,
    /// Minimum gap since the last reply.
    pub min_interval: Duration,
    /// Group subjects report an interval miss as `COOLDOWN`.
    pub interval_reason: DenyReason,
}

impl QuotaPolicy {
    pub fn private(daily_cap: i64, new_contact_cap: Option<i64>, min_interval: Duration) -> Self {
        Self {
            daily_cap,
            new_contact_cap,
            min_interval,
            interval_reason: DenyReason::IntervalNotElapsed,
        }
    }

    pub fn group(daily_cap: i64, cooldown: Duration) -> Self {
        Self {
            daily_cap,
            new_contact_cap: None,
            min_interval: cooldown,
            interval_reason: DenyReason::Cooldown,
        }
    }
}

/// Replies already counted for today, after lazy rollover.
///
/// A stored date before today means the counter belongs to a finished day
/// and reads as zero.
fn replies_today(state: &QuotaState, today: NaiveDate) -> i64 {
    match state
        .last_reply_date
        .as_deref()
        .and_then(|d| d.parse::<NaiveDate>().ok())
    {
        Some(date) if date == today => state.replies_today,
        _ => 0,
    }
}

/// Would one more reply stay within policy?
///
/// `state` is `None` when no reply was ever committed for the subject.
pub fn check(
    state: Option<&QuotaState>,
    policy: &QuotaPolicy,
    now: DateTime<Utc>,
) -> Result<(), DenyReason> {
    // A missing row means zero counters, not an automatic allow: a cap of
    // zero must deny even the first-ever reply.
    let sent_today = state.map_or(0, |s| replies_today(s, now.date_naive()));
    if sent_today >= policy.daily_cap {
        return Err(DenyReason::DailyLimit);
    }

    if let Some(cap) = policy.new_contact_cap {
        if state.map_or(0, |s| s.new_contact_replies) >= cap {
            return Err(DenyReason::NewContactLimit);
        }
    }

    if !policy.min_interval.is_zero() {
        let last_reply = state
            .and_then(|s| s.last_reply_at.as_deref())
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        if let Some(last_reply) = last_reply {
            let elapsed = (now - last_reply).to_std().unwrap_or(Duration::ZERO);
            if elapsed < policy.min_interval {
                return Err(policy.interval_reason);
            }
        }
    }

    Ok(())
}
