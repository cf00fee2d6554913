//! Prometheus metrics mirroring the cycle counters.

use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub cycles_total: IntCounter,
    pub cycle_errors_total: IntCounter,
    pub alerts_sent_total: IntCounter,
    pub alerts_failed_total: IntCounter,
    pub history_length: Gauge,
    pub signal_armed: Gauge,
    pub market_open: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_total = IntCounter::new("alert_cycles_total", "Cycles started")?;
        let cycle_errors_total =
            IntCounter::new("alert_cycle_errors_total", "Cycles that failed or faulted")?;
        let alerts_sent_total = IntCounter::new("alerts_sent_total", "Alerts delivered")?;
        let alerts_failed_total =
            IntCounter::new("alerts_failed_total", "Alerts fired but not delivered")?;
        let history_length = Gauge::new("alert_history_length", "Candles in the history buffer")?;
        let signal_armed = Gauge::new("alert_signal_armed", "1 while a signal candle is held")?;
        let market_open = Gauge::new("alert_market_open", "1 while the market is open")?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycle_errors_total.clone()))?;
        registry.register(Box::new(alerts_sent_total.clone()))?;
        registry.register(Box::new(alerts_failed_total.clone()))?;
        registry.register(Box::new(history_length.clone()))?;
        registry.register(Box::new(signal_armed.clone()))?;
        registry.register(Box::new(market_open.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycle_errors_total,
            alerts_sent_total,
            alerts_failed_total,
            history_length,
            signal_armed,
            market_open,
        })
    }

    /// Render all metrics in the text exposition format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
