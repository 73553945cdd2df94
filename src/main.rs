mod args;

use args::{Args, Mode};
use snip_clicker::automation::TemplateStore;
use snip_clicker::{ClickerError, ClickerResult, Matcher, Settings, SettingsRecord};
use std::path::Path;

fn main() {
    let Some(args) = Args::parse() else {
        return;
    };

    let default_filter = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = rt.block_on(async {
        match &args.mode {
            Mode::Probe(screenshot) => probe(&args, screenshot).await,
            Mode::Run => run(&args).await,
        }
    });

    if let Err(e) = result {
        log::error!("❌ {e}");
        std::process::exit(1);
    }
}

async fn read_settings(path: &Path) -> ClickerResult<SettingsRecord> {
    log::debug!("📄 Reading settings from {}", path.display());
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ClickerError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
    SettingsRecord::from_json(&json)
}

/// Match the configured templates against a saved screenshot; never touches the pointer
async fn probe(args: &Args, screenshot: &Path) -> ClickerResult<()> {
    let record = read_settings(&args.settings_path).await?;
    let settings = record.to_settings()?;
    let confidence = Settings::validate_confidence(settings.confidence)?;

    let mut store = TemplateStore::new();
    for failure in store.load_all(&record.target_images) {
        log::warn!("⚠️ Skipping target image: {}", failure);
    }
    if store.is_empty() {
        return Err(ClickerError::invalid("no target images configured"));
    }

    let path = screenshot.to_path_buf();
    let frame = tokio::task::spawn_blocking(move || {
        image::open(&path).map(|img| img.to_rgba8()).map_err(|e| {
            ClickerError::capture(format!("Failed to open screenshot {}: {e}", path.display()))
        })
    })
    .await??;
    println!(
        "📸 Probing {} ({}x{}) with {} target image(s)",
        screenshot.display(),
        frame.width(),
        frame.height(),
        store.len()
    );

    let matcher = Matcher::detect();
    let templates = store.snapshot();
    let hit = tokio::task::spawn_blocking(move || {
        matcher.first_match(&frame, &templates, confidence, || true)
    })
    .await?;

    match hit {
        Some((template, result)) => {
            println!("✅ {}: {}", template.name(), result);
            if let (Some(region), Some(location)) = (settings.region, result.location) {
                println!(
                    "🎯 Would click at {} in search area {}",
                    region.click_point(location, &template),
                    region
                );
            }
        }
        None => println!("❌ No target image found (confidence {:.2})", confidence),
    }
    Ok(())
}

#[cfg(feature = "desktop")]
async fn run(args: &Args) -> ClickerResult<()> {
    use snip_clicker::platform::{EnigoExecutor, XcapFrameSource};
    use snip_clicker::{Controller, StatusEvent, StatusView};
    use std::sync::Arc;
    use tokio::time::{Duration, sleep};

    let record = read_settings(&args.settings_path).await?;
    let mut controller = Controller::new(
        tokio::runtime::Handle::current(),
        Arc::new(XcapFrameSource::new()),
        Arc::new(EnigoExecutor::new()),
        Matcher::detect(),
    );
    controller.apply_record(&record)?;
    if args.preview_only {
        let settings = Settings {
            preview_only: true,
            ..controller.settings().clone()
        };
        controller.configure(settings)?;
    }

    let Some(mut events) = controller.subscribe() else {
        return Err(ClickerError::invalid("status stream already taken"));
    };
    controller.start().await?;

    let reporter = tokio::spawn(async move {
        let mut view = StatusView::default();
        while let Some(event) = events.recv().await {
            view.apply(&event);
            println!("{:?} {}", view.indicator, view.text);
            if event == StatusEvent::Stopped {
                break;
            }
        }
    });

    let timeout = async {
        match args.timeout_secs {
            Some(secs) => sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => log::info!("🛑 Interrupted"),
        _ = timeout => log::info!("⏱️ Timeout reached"),
    }

    controller.stop();
    controller.wait().await;
    reporter.await?;
    Ok(())
}

#[cfg(not(feature = "desktop"))]
async fn run(_args: &Args) -> ClickerResult<()> {
    Err(ClickerError::invalid(
        "built without the `desktop` feature; only --probe is available",
    ))
}
