use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use boundmap::api::BoundarySource;
use boundmap::config::FileConfig;
use boundmap::hover::PointerEvent;
use boundmap::layers::HOVER_STATE;
use boundmap::logging;
use boundmap::renderer::RecordingRenderer;
use boundmap::session::MapSession;

/// Reproject British National Grid boundary GeoJSON for slippy maps
///
/// Examples:
///   # Convert a local file, writing counties.wgs84.geojson
///   boundmap counties.geojson
///
///   # Fetch over HTTP and emit a loadable map style
///   boundmap https://example.com/boundaries.geojson -o out.geojson --style-out style.json
///
///   # Replay recorded pointer events against the hover tracker
///   boundmap counties.geojson --generate-ids --replay events.json
///
///   # Use a config file
///   boundmap counties.geojson --config my-settings.toml
#[derive(Parser, Debug)]
#[command(name = "boundmap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Boundary GeoJSON: a file path or an http(s) URL
    input: String,

    /// Output GeoJSON path (defaults to {input stem}.wgs84.geojson)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Write a map style (viewport, source, layers) to this path
    #[arg(long)]
    style_out: Option<PathBuf>,

    /// JSON list of pointer events to feed through the hover tracker
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Path to config file (optional, auto-searches boundmap.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the input's projected CRS
    #[arg(long)]
    source_crs: Option<String>,

    /// Proj-style definition for --source-crs
    #[arg(long, allow_hyphen_values = true)]
    source_crs_definition: Option<String>,

    /// Number features that have no id
    #[arg(long)]
    generate_ids: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    logging::init(args.verbose).context("Failed to initialise logging")?;

    let mut config = match args.config {
        Some(ref config_path) => FileConfig::from_path(config_path)?,
        None => FileConfig::load().unwrap_or_default(),
    };
    if let Some(ref crs) = args.source_crs {
        config.source_crs = crs.clone();
    }
    if let Some(ref definition) = args.source_crs_definition {
        config.source_crs_definition = definition.clone();
    }
    config.generate_ids |= args.generate_ids;

    let source = BoundarySource::parse(&args.input);
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| source.default_output_path());

    let mut renderer = RecordingRenderer::ready();

    let spinner = create_spinner(&format!("Loading boundaries from {}...", source));
    let start = Instant::now();
    let mut session = MapSession::load(&mut renderer, &source, &config)
        .with_context(|| format!("Failed to load boundaries from {}", source))?;
    let report = session.report();
    spinner.finish_with_message(format!(
        "Normalized {} features, {} positions {} -> {} [{:.1}s]",
        report.features,
        report.positions,
        config.source_crs,
        config.target_crs,
        start.elapsed().as_secs_f32()
    ));
    if report.legacy_groups > 0 || report.empty_slots > 0 {
        println!(
            "  {} legacy position groups, {} empty slots",
            report.legacy_groups, report.empty_slots
        );
    }

    println!(
        "  Bound {} source, {} layers ({})",
        renderer.sources().len(),
        renderer.layers().len(),
        renderer
            .layers()
            .iter()
            .map(|l| l.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let spinner = create_spinner("Writing GeoJSON...");
    let file = File::create(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    session
        .document()
        .document()
        .to_writer(BufWriter::new(file))
        .context("Failed to write normalized GeoJSON")?;
    spinner.finish_with_message(format!("Wrote {}", output_path.display()));

    if let Some(ref style_path) = args.style_out {
        let map = &config.map;
        let style = renderer.style_document(&map.style, map.center, map.zoom);
        write_json(style_path, &style).context("Failed to write map style")?;
        println!("Style: {}", style_path.display());
    }

    if let Some(ref replay_path) = args.replay {
        let file = File::open(replay_path)
            .with_context(|| format!("Failed to open replay file: {:?}", replay_path))?;
        let events: Vec<PointerEvent> =
            serde_json::from_reader(file).context("Failed to parse replay events")?;

        println!();
        println!(
            "Replaying {} pointer events on {}",
            events.len(),
            session.tracker().layer()
        );
        let transitions = session.replay(&events, &mut renderer)?;
        for (index, transition) in transitions.iter().enumerate() {
            println!("  [{}] {:?}", index, transition);
        }
        for write in renderer.writes() {
            println!(
                "  set_feature_state {}/{} {}",
                write.target.source,
                write.target.id,
                serde_json::Value::Object(write.state.clone())
            );
        }
        let hovered = renderer.flagged(&config.source_name, HOVER_STATE);
        match hovered.first() {
            Some(id) => println!("Hovered at end: {}", id),
            None => println!("Hovered at end: none"),
        }
    }

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
