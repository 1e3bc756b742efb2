//! Motion-estimation and audio-mix core for a bicycle sound installation.
//!
//! The library holds the timestamp-driven state machines: wheel tachometer,
//! pedal direction/speed sensing, milestone accumulation and the per-track
//! volume curve engine. Nothing in here reads the clock or touches hardware;
//! callers feed `now_ms` timestamps and pulse counts, which keeps every core
//! deterministic under test. Task wiring lives in the binary.

pub mod config;
pub mod milestone;
pub mod mixer;
pub mod pedal;
pub mod pulse;
pub mod sound;
pub mod wheel;
