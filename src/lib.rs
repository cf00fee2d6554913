//! EMA breakdown alert engine for the at-the-money Nifty put.
//!
//! Each cycle fetches one candle, recomputes the fast/slow EMAs and the
//! volume average over the rolling history, and runs the breakdown detector.
//! A confirmed entry is pushed to the notifier as a text alert.

pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
