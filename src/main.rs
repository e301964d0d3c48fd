//! `shop-detector` — camera/image entry point.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line, load the settings file, build [`RunConfig`].
//! 3. Build the caption engine and the speech worker.
//! 4. Open the frame source (camera thread or single image).
//! 5. Create the tokio runtime and run the [`CameraLoop`] until Ctrl-C,
//!    `q` in the preview window, or the image source runs out.  With a live
//!    preview the loop runs on a runtime worker and the window stays on the
//!    main thread.
//! 6. Flush queued speech, release the camera, report.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use shop_detector::{
    announce::AnnouncementController,
    caption::{ApiCaptioner, SharedCaptioner},
    config::{AppConfig, ConfigError, DetectArgs, Mode, RunConfig},
    frames::{Frame, FrameSource, ImageSource},
    pipeline::{new_shared_status, CameraLoop, SharedStatus},
    speech::CommandSpeaker,
};

// ---------------------------------------------------------------------------
// Frame source construction
// ---------------------------------------------------------------------------

/// Runs the live preview window on the calling thread until the loop stops.
type MainThreadPreview = Box<dyn FnOnce()>;

#[cfg(feature = "camera")]
fn open_camera(
    index: i32,
    run: &RunConfig,
    status: &SharedStatus,
    cancel: &CancellationToken,
) -> Result<(Box<dyn FrameSource>, Option<MainThreadPreview>), ConfigError> {
    use shop_detector::frames::{
        preview_channel, run_preview, CameraFrames, CaptureOptions, LiveWindow, OpenCvCamera,
    };

    let (preview_tx, preview) = if run.show_window {
        let (tx, rx) = preview_channel();
        let status = Arc::clone(status);
        let cancel = cancel.clone();
        let window: MainThreadPreview = Box::new(move || {
            run_preview(LiveWindow::new(), rx, &status, &cancel);
        });
        (Some(tx), Some(window))
    } else {
        (None, None)
    };

    let options = CaptureOptions {
        interval: run.interval,
        preview: preview_tx,
        cancel: cancel.clone(),
    };
    let frames = CameraFrames::spawn(move || OpenCvCamera::open(index), options)?;
    Ok((Box::new(frames), preview))
}

#[cfg(not(feature = "camera"))]
fn open_camera(
    _index: i32,
    _run: &RunConfig,
    _status: &SharedStatus,
    _cancel: &CancellationToken,
) -> Result<(Box<dyn FrameSource>, Option<MainThreadPreview>), ConfigError> {
    Err(ConfigError::CameraUnsupported)
}

#[cfg(feature = "camera")]
fn show_still(frame: &Frame, status: &SharedStatus) {
    let snapshot = match status.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    if let Err(e) = shop_detector::frames::show_still(frame, &snapshot) {
        log::warn!("preview: {e}");
    }
}

#[cfg(not(feature = "camera"))]
fn show_still(_frame: &Frame, _status: &SharedStatus) {
    log::debug!("preview: built without the `camera` feature; skipping still window");
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn run(args: DetectArgs) -> anyhow::Result<()> {
    let file = AppConfig::resolve(args.config.as_deref())?;
    let run = RunConfig::from_args(&args, file)?;
    run.log_summary();

    let captioner = SharedCaptioner::new(Arc::new(ApiCaptioner::from_config(&run.caption)));
    let speaker = Arc::new(CommandSpeaker::start(&run.speech)?);
    let announcer = AnnouncementController::new(run.cooldown, run.phrase.clone(), speaker.clone());

    let cancel = CancellationToken::new();
    let status = new_shared_status();

    let (source, still, preview): (Box<dyn FrameSource>, Option<Frame>, _) = match &run.mode {
        Mode::Image { path } => {
            let source = ImageSource::open(path)?;
            let still = source.peek().cloned();
            (Box::new(source) as Box<dyn FrameSource>, still, None)
        }
        Mode::Camera { index } => {
            let (source, preview) = open_camera(*index, &run, &status, &cancel)?;
            (source, None, preview)
        }
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let camera_loop = CameraLoop::new(
        source,
        captioner,
        run.keywords.clone(),
        announcer,
        Arc::clone(&status),
    );

    let loop_cancel = cancel.clone();
    let pipeline = async move {
        let watcher = loop_cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        log::warn!("cannot listen for Ctrl-C: {e}");
                        return;
                    }
                    log::info!("Ctrl-C received, shutting down");
                    watcher.cancel();
                }
                _ = watcher.cancelled() => {}
            }
        });

        camera_loop.run(loop_cancel).await
    };

    let (summary, last) = match preview {
        None => rt.block_on(pipeline),
        Some(window) => {
            let handle = rt.spawn(pipeline);
            window();
            // The window may close on its own; make sure the loop follows.
            cancel.cancel();
            rt.block_on(handle).context("camera loop task failed")?
        }
    };
    log::debug!("loop summary: {summary:?}");

    match Arc::try_unwrap(speaker) {
        Ok(speaker) => speaker.shutdown(),
        Err(_) => log::warn!("speech worker still referenced; queued phrases may be cut off"),
    }

    if let Some(still) = still {
        match &last {
            Some(result) => println!("{}", serde_json::to_string_pretty(result)?),
            None => anyhow::bail!("no caption could be produced for the image"),
        }
        if run.show_window {
            show_still(&still, &status);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("shop-detector {} starting up", env!("CARGO_PKG_VERSION"));

    let args = DetectArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
