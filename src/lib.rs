pub mod app;
pub mod camera;
pub mod capture;
pub mod commands;
pub mod config;
pub mod crop;
pub mod extraction;
pub mod history;
pub mod mapper;
pub mod system;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use app::{view, AppState, Event, Runtime, RuntimeSettings};
use camera::{CameraSource, StillFrameCamera};
use commands::{parse_command, Command, USAGE};
use config::{AppConfig, ConfigLoad};
use extraction::{GeminiExtractor, TextExtractor};
use system::{ClipboardSink, SystemClipboard};

/// Starts TextLens on the terminal. `frame_source` overrides the configured frame image.
pub fn run(frame_source: Option<PathBuf>) {
    let load = ConfigLoad::read();

    // Logs go to stderr so they never interleave with the rendered screen on stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(load.log_level().as_filter())),
        )
        .init();

    let config = load.finish();

    info!(
        model = %config.model,
        log_level = config.log_level.as_str(),
        credential = config.api_key.is_some(),
        "Starting TextLens"
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            std::process::exit(1);
        }
    };

    let extractor = match GeminiExtractor::new(
        &config.api_base_url,
        &config.model,
        config.request_timeout,
    ) {
        Ok(extractor) => extractor,
        Err(e) => {
            error!(error = %e, "Failed to create text extractor");
            std::process::exit(1);
        }
    };

    let frame_source = frame_source.or_else(|| config.frame_source.clone());
    if frame_source.is_none() {
        warn!("No frame source configured, the camera will report as unsupported");
    }
    let camera = StillFrameCamera::new(frame_source);

    runtime.block_on(event_loop(config, camera, SystemClipboard::new(), Arc::new(extractor)));
}

async fn event_loop<C: CameraSource, K: ClipboardSink>(
    config: AppConfig,
    camera: C,
    clipboard: K,
    extractor: Arc<dyn TextExtractor>,
) {
    let (results_tx, mut results) = mpsc::unbounded_channel();
    let state = AppState::new(config.display, config.api_key.is_some());
    let settings = RuntimeSettings {
        credential: config.api_key.clone(),
        camera_request: config.camera,
        jpeg_quality: config.jpeg_quality,
        persist_credential: true,
    };
    let mut runtime = Runtime::new(state, camera, clipboard, extractor, settings, results_tx);

    runtime.start();
    println!("{}", view::render(runtime.state()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "Failed to read input");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Dispatch(event)) => runtime.dispatch(event),
                    Ok(Command::Capture) => runtime.capture(),
                    Ok(Command::History) => {
                        println!("{}", view::render_history(&runtime.state().history));
                        continue;
                    }
                    Ok(Command::Help) => {
                        println!("{USAGE}");
                        continue;
                    }
                    Ok(Command::Quit) => break,
                    Err(e) => {
                        println!("{e}. Type `help` for commands.");
                        continue;
                    }
                }
                println!("{}", view::render(runtime.state()));
            }
            Some(event) = results.recv() => {
                runtime.dispatch(event);
                println!("{}", view::render(runtime.state()));
            }
        }
    }

    if let Some(request) = runtime.state().in_flight {
        info!(request = request.0, "Waiting for the extraction in flight");
        if let Some(event) = results.recv().await {
            runtime.dispatch(event);
            println!("{}", view::render(runtime.state()));
        }
    }

    runtime.dispatch(Event::VisibilityChanged(false));
    debug!("Event loop finished");
}
