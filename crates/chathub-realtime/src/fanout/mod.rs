//! Fanout: scope resolution results and the non-blocking enqueue policy.

pub mod engine;
pub mod scope;

pub use engine::{FanoutReport, fan_out};
pub use scope::{Payload, Scope};
