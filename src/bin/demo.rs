//! vision_demo - capture a still and run vision features over it from the terminal

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use capture_vision::detect::{StubProvider, StubScript};
use capture_vision::{
    can_capture, decode_capture, render, CaptureSource, FileConfig, FileSource, ProviderRegistry,
    Screen, UiState, VisionAdapter, VisionConfig, VisionSession,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Screen route to show (home, text_recognition, object_detection,
    /// barcode_scanning, face_detection, image_labeling) or "all".
    #[arg(default_value = "home")]
    screen: String,
    /// Image file standing in for the camera (overrides the config file).
    #[arg(long)]
    image: Option<String>,
    /// Stub provider script (JSON) with scripted replies per feature.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Print the state snapshot as JSON instead of the rendered screen.
    #[arg(long)]
    json: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let progress = ui::Progress::new(&args.ui, is_tty, args.json);

    let screens = select_screens(&args.screen)?;
    if screens == [Screen::Home] {
        print!("{}", render(Screen::Home, &UiState::default()));
        return Ok(());
    }

    let cfg = VisionConfig::load()?;
    let script = match args.script.as_ref().or(cfg.stub_script.as_ref()) {
        Some(path) => StubScript::from_file(path)?,
        None => {
            log::warn!("no stub script configured; every feature will report unsupported");
            StubScript::default()
        }
    };

    let mut registry = ProviderRegistry::new();
    registry.register(StubProvider::new(script));
    registry
        .set_default(&cfg.provider)
        .with_context(|| format!("registered providers: {}", registry.list().join(", ")))?;
    let adapter = VisionAdapter::new(Arc::new(registry), cfg.options.clone());
    let session = VisionSession::new(Arc::new(adapter));

    let image_path = args
        .image
        .or(cfg.capture.path.clone())
        .ok_or_else(|| anyhow!("no capture image: pass --image or set capture.path"))?;
    let mut source = FileSource::new(FileConfig { path: image_path })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let mut failures = 0usize;
    for screen in screens {
        let Some(kind) = screen.kind() else {
            continue;
        };
        if !can_capture(&session.state()) {
            return Err(anyhow!("a detection is still in flight"));
        }

        let step = progress.capture();
        let image =
            decode_capture(source.capture())?.with_rotation(cfg.capture.rotation_degrees)?;
        step.done();

        let step = progress.detection(kind);
        let state = runtime.block_on(session.run(kind, image));
        if !step.settle(kind, &state) {
            failures += 1;
        }

        if args.json {
            println!("{}", serde_json::to_string_pretty(&*state)?);
        } else {
            println!("# {}", screen.title());
            print!("{}", render(screen, &state));
        }
    }

    let stats = source.stats();
    log::info!(
        "capture stats: {} captures, {} failures from {}",
        stats.captures,
        stats.failures,
        stats.path
    );

    if failures > 0 {
        return Err(anyhow!("{} detection(s) failed", failures));
    }
    Ok(())
}

fn select_screens(route: &str) -> Result<Vec<Screen>> {
    if route == "all" {
        return Ok(Screen::ALL
            .into_iter()
            .filter(|screen| screen.kind().is_some())
            .collect());
    }
    Screen::from_route(route)
        .map(|screen| vec![screen])
        .ok_or_else(|| anyhow!("unknown screen '{}'", route))
}
