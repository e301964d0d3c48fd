//! Shop detector: watches a camera (or one image), captions what it sees and
//! announces out loud when the caption describes a shop.  The same classifier
//! is also served over HTTP.

pub mod announce;
pub mod caption;
pub mod classify;
pub mod config;
pub mod frames;
pub mod pipeline;
pub mod server;
pub mod speech;
