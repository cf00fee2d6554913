//! External collaborators: candle source, notifier, market calendar.

pub mod market_data;
pub mod market_hours;
pub mod notifier;
pub mod option_chain;

pub use market_data::CandleSource;
pub use market_hours::{MarketCalendar, NseCalendar};
pub use notifier::{ConsoleNotifier, Notifier, WebhookNotifier};
pub use option_chain::OptionChainSource;
