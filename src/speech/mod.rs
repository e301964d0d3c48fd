//! Fire-and-forget speech output.
//!
//! [`SpeechSink`] is the seam the announcement controller talks to.
//! [`CommandSpeaker`] is the production sink: a background OS thread drains
//! a short bounded queue of phrases and hands each one to the platform's text-to-speech
//! command (`say` on macOS, `espeak-ng` elsewhere, or whatever
//! [`SpeechConfig::command`](crate::config::SpeechConfig) names).

pub mod speaker;

pub use speaker::{command_line, CommandSpeaker, SpeechError, SpeechSink, SPEECH_QUEUE_CAPACITY};

#[cfg(test)]
pub use speaker::RecordingSpeaker;
