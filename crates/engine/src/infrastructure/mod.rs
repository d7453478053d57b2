//! Infrastructure - ports and their implementations.

pub mod cache;
pub mod clock;
pub mod config;
pub mod http;
pub mod in_memory;
pub mod ports;
