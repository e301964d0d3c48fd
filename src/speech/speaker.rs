//! [`SpeechSink`] trait and the command-line backed [`CommandSpeaker`].

use std::process::{Command, Stdio};
use std::thread::JoinHandle;

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::SpeechConfig;

/// Phrases allowed to wait behind the one being spoken.
pub const SPEECH_QUEUE_CAPACITY: usize = 4;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Speech failures.  Logged by callers, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpeechError {
    /// The speaker has shut down and no longer accepts phrases.
    #[error("speech queue is closed")]
    Closed,

    /// Too many phrases are waiting; this one was dropped.
    #[error("speech queue is full, phrase dropped")]
    Busy,

    /// The speech worker thread could not be started.
    #[error("failed to start speech worker: {0}")]
    Worker(String),
}

// ---------------------------------------------------------------------------
// SpeechSink trait
// ---------------------------------------------------------------------------

/// Queue a phrase for playback and return immediately.
///
/// `Ok(())` means the phrase was accepted, not that audio was produced.
pub trait SpeechSink: Send + Sync {
    fn say(&self, phrase: &str) -> Result<(), SpeechError>;
}

// ---------------------------------------------------------------------------
// Command resolution
// ---------------------------------------------------------------------------

/// Program and arguments that speak `phrase` under `config`.
///
/// With no explicit command, `say -r <rate>` is used on macOS and
/// `espeak-ng -s <rate>` everywhere else.
///
/// ```
/// use shop_detector::config::SpeechConfig;
/// use shop_detector::speech::command_line;
///
/// let config = SpeechConfig {
///     command: Some("piper-say".into()),
///     args: vec!["--voice".into(), "amy".into()],
///     ..SpeechConfig::default()
/// };
/// let (program, args) = command_line(&config, "This is a shop");
/// assert_eq!(program, "piper-say");
/// assert_eq!(args, ["--voice", "amy", "This is a shop"]);
/// ```
pub fn command_line(config: &SpeechConfig, phrase: &str) -> (String, Vec<String>) {
    let (program, mut args) = match &config.command {
        Some(program) => (program.clone(), config.args.clone()),
        None if cfg!(target_os = "macos") => {
            ("say".to_string(), vec!["-r".into(), config.rate.to_string()])
        }
        None => (
            "espeak-ng".to_string(),
            vec!["-s".into(), config.rate.to_string()],
        ),
    };
    args.push(phrase.to_string());
    (program, args)
}

// ---------------------------------------------------------------------------
// CommandSpeaker
// ---------------------------------------------------------------------------

/// Speaks phrases one at a time on a dedicated worker thread.
///
/// Phrases are queued, so an announcement never blocks the detection loop.
/// The queue holds [`SPEECH_QUEUE_CAPACITY`] phrases; further ones are
/// rejected with [`SpeechError::Busy`] until the worker catches up.  Call [`shutdown`](Self::shutdown) to flush the queue before exiting;
/// dropping the speaker without it lets the worker finish in the background.
pub struct CommandSpeaker {
    tx: mpsc::Sender<String>,
    worker: Option<JoinHandle<()>>,
}

impl CommandSpeaker {
    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// [`SpeechError::Worker`] if the OS refuses to create the thread.
    pub fn start(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let (tx, mut rx) = mpsc::channel::<String>(SPEECH_QUEUE_CAPACITY);
        let config = config.clone();

        let worker = std::thread::Builder::new()
            .name("speech".into())
            .spawn(move || {
                while let Some(phrase) = rx.blocking_recv() {
                    speak(&config, &phrase);
                }
                log::debug!("speech: queue closed, worker exiting");
            })
            .map_err(|e| SpeechError::Worker(e.to_string()))?;

        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    /// Stop accepting phrases, speak whatever is still queued, then return.
    pub fn shutdown(mut self) {
        let worker = self.worker.take();
        drop(self);
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::error!("speech: worker thread panicked");
            }
        }
    }
}

impl SpeechSink for CommandSpeaker {
    fn say(&self, phrase: &str) -> Result<(), SpeechError> {
        self.tx.try_send(phrase.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => SpeechError::Busy,
            TrySendError::Closed(_) => SpeechError::Closed,
        })
    }
}

fn speak(config: &SpeechConfig, phrase: &str) {
    let (program, args) = command_line(config, phrase);
    log::debug!("speech: {program} {args:?}");

    let status = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(s) if s.success() => {}
        Ok(s) => log::warn!("speech: `{program}` exited with {s}"),
        Err(e) => log::warn!("speech: could not run `{program}`: {e}"),
    }
}

// ---------------------------------------------------------------------------
// RecordingSpeaker  (test-only)
// ---------------------------------------------------------------------------

/// Records every phrase it is asked to say; optionally fails each call.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: std::sync::Mutex<Vec<String>>,
    fail: bool,
}

#[cfg(test)]
impl RecordingSpeaker {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Phrases accepted (or attempted, when failing) so far.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SpeechSink for RecordingSpeaker {
    fn say(&self, phrase: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(phrase.to_string());
        if self.fail {
            Err(SpeechError::Closed)
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
