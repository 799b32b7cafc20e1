#![allow(clippy::doc_lazy_continuation)]

pub mod config;
pub mod logging;
pub mod metrics;
pub mod poll;
pub mod render;
pub mod terminal;

pub use config::{Config, ConfigOrigin};
pub use poll::{dashboard::run_dashboard, tail::run_tail, PollLoop};
