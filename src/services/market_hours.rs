//! Trading-hours calendar and clock.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};

/// Clock and trading calendar injected into the orchestrator.
pub trait MarketCalendar: Send + Sync {
    fn is_market_open(&self) -> bool;

    /// Current instant; drives alert timestamps and the cooldown.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

const SESSION_OPEN_MINUTE: u32 = 9 * 60 + 15;
const SESSION_CLOSE_MINUTE: u32 = 15 * 60 + 30;

/// India Standard Time, UTC+05:30 with no daylight saving.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset is in range")
}

/// NSE cash session: weekdays 09:15 to 15:30 IST, the closing minute included.
#[derive(Debug, Default, Clone, Copy)]
pub struct NseCalendar;

impl NseCalendar {
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&ist());
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let minute = local.hour() * 60 + local.minute();
        (SESSION_OPEN_MINUTE..=SESSION_CLOSE_MINUTE).contains(&minute)
    }
}

impl MarketCalendar for NseCalendar {
    fn is_market_open(&self) -> bool {
        self.is_open_at(Utc::now())
    }
}
