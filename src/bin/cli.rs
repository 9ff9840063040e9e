use anyhow::{anyhow, bail, Context};
use crabcapture::testing::{synthetic_face_frame, ScriptedPresence, SyntheticSource};
use crabcapture::{
    CaptureController, CapturedImage, CrabCaptureConfig, FacePresence, QualityEstimator,
    QualityMetrics,
};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crabcapture::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabcapture-cli <score|simulate|config> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "score" => cmd_score(&args),
        "simulate" => cmd_simulate(&args).await,
        "config" => cmd_config(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> anyhow::Result<Option<&'a str>> {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| anyhow!("{} requires a value", flag)),
        None => Ok(None),
    }
}

fn load_config(args: &[String]) -> anyhow::Result<CrabCaptureConfig> {
    match flag_value(args, "--config")? {
        Some(path) => Ok(CrabCaptureConfig::load_from_file(path)?),
        None => Ok(CrabCaptureConfig::load_or_default()),
    }
}

fn print_metrics(label: &str, metrics: &QualityMetrics, threshold: u8) {
    println!(
        "{}: overall={} ({:?}) brightness={} contrast={} sharpness={}",
        label,
        metrics.overall,
        metrics.grade(),
        metrics.brightness,
        metrics.contrast,
        metrics.sharpness
    );
    for hint in metrics.guidance(threshold) {
        println!("  - {}", hint.message());
    }
}

fn cmd_score(args: &[String]) -> anyhow::Result<()> {
    // score <image>... [--json] [--config <path>]
    let config = load_config(args)?;
    let json = args.contains(&"--json".to_string());
    let settings = config.settings();
    let estimator = QualityEstimator::new(settings.estimator);

    let mut paths = Vec::new();
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => {}
            "--config" => i += 1,
            path => paths.push(PathBuf::from(path)),
        }
        i += 1;
    }
    if paths.is_empty() {
        bail!("Usage: crabcapture-cli score <image>... [--json] [--config <path>]");
    }

    for path in paths {
        let img = image::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .to_rgb8();
        let metrics = estimator.analyze_image(&img)?;
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "path": path.display().to_string(),
                    "quality": metrics,
                    "acceptable": metrics.meets(settings.quality_threshold),
                })
            );
        } else {
            print_metrics(&path.display().to_string(), &metrics, settings.quality_threshold);
        }
    }
    Ok(())
}

async fn cmd_simulate(args: &[String]) -> anyhow::Result<()> {
    // simulate [--output <path>] [--json] [--config <path>]
    let config = load_config(args)?;
    let json = args.contains(&"--json".to_string());
    let output = flag_value(args, "--output")?.map(PathBuf::from);
    let settings = config.settings();

    let [width, height] = config.camera.ideal_resolution;
    let source = SyntheticSource::new(synthetic_face_frame(width, height));
    let controller = CaptureController::new(source, settings.clone());

    let (tx, mut rx) = mpsc::unbounded_channel::<Result<CapturedImage, String>>();
    let capture_tx = tx.clone();
    controller.on_capture(move |image| {
        let _ = capture_tx.send(Ok(image.clone()));
    });
    controller.on_error(move |e| {
        let _ = tx.send(Err(e.to_string()));
    });

    controller.start().await?;
    controller.attach_presence_source(ScriptedPresence::new([
        FacePresence::unstable(),
        FacePresence::stable(),
    ]))?;

    let deadline = settings.sample_interval
        + settings.presence_interval * 2
        + Duration::from_secs(settings.countdown_secs as u64 + 5);
    let result = tokio::time::timeout(deadline, rx.recv())
        .await
        .context("Timed out waiting for auto-capture")?
        .ok_or_else(|| anyhow!("Capture channel closed"))?;
    controller.stop();

    let image = result.map_err(|e| anyhow!(e))?;
    if let Some(path) = &output {
        std::fs::write(path, &image.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if json {
        println!("{}", image.metadata_json()?);
    } else {
        println!(
            "Captured {} ({} bytes) at {}",
            image.metadata.resolution,
            image.size_bytes(),
            image.metadata.timestamp
        );
        print_metrics("quality", &image.metadata.quality, settings.quality_threshold);
        if let Some(path) = output {
            println!("Saved to {}", path.display());
        }
    }
    Ok(())
}

fn cmd_config(args: &[String]) -> anyhow::Result<()> {
    // config [--write <path>]
    let config = CrabCaptureConfig::default();
    match flag_value(args, "--write")? {
        Some(path) => {
            config.save_to_file(path)?;
            println!("Wrote default configuration to {}", path);
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}
