//! Messaging abstractions: the outbound port, incoming/outgoing models and a
//! throttling decorator.

pub mod port;
pub mod throttled;
pub mod types;
