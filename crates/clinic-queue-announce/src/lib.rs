//! Queue-call announcements for the clinic front desk.
//!
//! A call plays a short notification chime and then speaks the queue number
//! digit by digit, once per configured locale. Playback itself belongs to the
//! host (browser speech synthesis, a native TTS engine, ...); this crate
//! builds the announcement plan and defines the [`Announcer`] seam the queue
//! controller hands plans to.

pub mod announcer;
pub mod phrase;

pub use announcer::*;
pub use phrase::*;
