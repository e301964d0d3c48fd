//! `shop-detector-server` — HTTP entry point.
//!
//! Serves `POST /detect` and `GET /health` until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use shop_detector::{
    caption::{ApiCaptioner, SharedCaptioner},
    config::{AppConfig, ServeArgs, ServeConfig},
    server,
};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("shop-detector-server {} starting up", env!("CARGO_PKG_VERSION"));

    match run(ServeArgs::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let file = AppConfig::resolve(args.config.as_deref())?;
    let config = ServeConfig::from_args(&args, file)?;

    // One engine for the whole process; requests queue on its gate.
    let captioner = SharedCaptioner::new(Arc::new(ApiCaptioner::from_config(&config.caption)));

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Ctrl-C received, draining requests");
                trigger.cancel();
            }
            Err(e) => log::warn!("cannot listen for Ctrl-C: {e}"),
        }
    });

    server::serve(config, captioner, shutdown).await
}
