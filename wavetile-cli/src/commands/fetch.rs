//! `wavetile fetch`: loads the tiles of a viewport for each forecast step.
//!
//! Every time step is its own loading episode: burst staging restarts, the
//! viewport's tiles are submitted center first, and the throttler keeps the
//! number of requests in flight within the configured limits.

use std::path::{Path, PathBuf};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::info;
use wavetile::app::WaveTileApp;
use wavetile::config::ConfigFile;
use wavetile::coord::{TileCoord, Viewport};
use wavetile::layer::{BatchSummary, TileOutcome, TileRequest};
use wavetile::logging::init_logging;
use wavetile::wms::{timeline, TimeStep, WmsLayer};

use crate::error::CliError;

/// Directory name used when no forecast time is requested.
const LATEST_LABEL: &str = "latest";

/// Arguments for `wavetile fetch`.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// WMS endpoint (defaults to wms.url from the config file)
    #[arg(long)]
    pub url: Option<String>,

    /// Layer name (defaults to wms.layer from the config file)
    #[arg(long)]
    pub layer: Option<String>,

    /// Viewport center latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Viewport center longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Zoom level
    #[arg(long, default_value = "6")]
    pub zoom: u8,

    /// Tiles to load on each side of the center tile
    #[arg(long, default_value = "1")]
    pub radius: u32,

    /// Forecast time (RFC 3339), repeat for several steps
    #[arg(long = "time", conflicts_with = "start")]
    pub times: Vec<String>,

    /// First forecast time (RFC 3339) of an evenly spaced animation
    #[arg(long)]
    pub start: Option<String>,

    /// Hours between animation steps
    #[arg(long, default_value = "1")]
    pub step_hours: i64,

    /// Number of animation steps
    #[arg(long, default_value = "1")]
    pub steps: usize,

    /// Write tiles to DIR/<time>/<z>/<x>/<y>.<ext>
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Override throttle.max_concurrent
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Override throttle.max_per_domain
    #[arg(long)]
    pub max_per_domain: Option<usize>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the fetch command.
pub fn run(args: FetchArgs, config_path: &Path) -> Result<(), CliError> {
    let mut config = ConfigFile::load_from(config_path)?;
    apply_overrides(&args, &mut config)?;

    let _logging = init_logging(&config.logging.directory, &config.logging.file)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let time_steps = resolve_time_steps(
        &args.times,
        args.start.as_deref(),
        args.step_hours,
        args.steps,
    )?;
    let viewport = Viewport::new(args.lat, args.lon, args.zoom, args.radius)
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    let app = WaveTileApp::from_config(&config)?;
    let layer = app.layer().cloned().ok_or_else(|| {
        CliError::Config(
            "no WMS layer configured: pass --url and --layer, or set wms.url and wms.layer"
                .to_string(),
        )
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    runtime.block_on(fetch(
        &app,
        &layer,
        &viewport,
        &time_steps,
        args.output.as_deref(),
        args.json,
    ))
}

/// Applies command-line overrides to the loaded configuration.
///
/// `--url` and `--layer` replace the `[wms]` values, so the layer can be given
/// entirely on the command line whatever the config file holds.
fn apply_overrides(args: &FetchArgs, config: &mut ConfigFile) -> Result<(), CliError> {
    if let Some(max) = args.max_concurrent {
        config.throttle.max_concurrent = max;
    }
    if let Some(max) = args.max_per_domain {
        config.throttle.max_per_domain = max;
    }

    if let Some(url) = &args.url {
        config.wms.url = Some(url.clone());
    }
    if let Some(layer) = &args.layer {
        config.wms.layer = Some(layer.clone());
    }

    match (&config.wms.url, &config.wms.layer) {
        (Some(_), None) if args.url.is_some() => Err(CliError::InvalidArgument(
            "--layer is required with --url".to_string(),
        )),
        (None, Some(_)) if args.layer.is_some() => Err(CliError::InvalidArgument(
            "--url is required with --layer".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Expands the time arguments into the list of episodes to load.
///
/// `None` means a single request without a `TIME` parameter (the server's
/// default time).
fn resolve_time_steps(
    times: &[String],
    start: Option<&str>,
    step_hours: i64,
    steps: usize,
) -> Result<Vec<Option<TimeStep>>, CliError> {
    if !times.is_empty() {
        return times
            .iter()
            .map(|time| {
                TimeStep::parse(time)
                    .map(Some)
                    .map_err(|e| CliError::InvalidArgument(e.to_string()))
            })
            .collect();
    }

    let Some(start) = start else {
        return Ok(vec![None]);
    };

    if steps == 0 {
        return Err(CliError::InvalidArgument(
            "--steps must be at least 1".to_string(),
        ));
    }
    if step_hours <= 0 {
        return Err(CliError::InvalidArgument(
            "--step-hours must be positive".to_string(),
        ));
    }

    let step = chrono::Duration::try_hours(step_hours).ok_or_else(|| {
        CliError::InvalidArgument(format!("--step-hours {} is too large", step_hours))
    })?;
    let start = TimeStep::parse(start).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let steps = timeline(start, step, steps).map_err(|e| {
        CliError::InvalidArgument(format!("animation runs past the supported dates: {}", e))
    })?;

    Ok(steps.into_iter().map(Some).collect())
}

async fn fetch(
    app: &WaveTileApp,
    layer: &WmsLayer,
    viewport: &Viewport,
    time_steps: &[Option<TimeStep>],
    output: Option<&Path>,
    json: bool,
) -> Result<(), CliError> {
    let loader = app.loader();
    let mut reports = Vec::with_capacity(time_steps.len());

    for time in time_steps {
        let label = time
            .as_ref()
            .map_or_else(|| LATEST_LABEL.to_string(), TimeStep::label);

        loader.begin_episode();
        let requests = TileRequest::for_viewport(layer, viewport, time.as_ref())
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        info!(
            time = %label,
            tiles = requests.len(),
            layer = layer.name(),
            "Fetching forecast step"
        );

        let progress = progress_bar(requests.len() as u64, &label);
        let target = app.target().clone();
        let outcomes = loader
            .load_all_with_progress(
                requests,
                |_| target.clone(),
                |outcome| {
                    progress.inc(1);
                    if let Err(e) = &outcome.result {
                        progress.println(format!("  {} {}", outcome.request.tile, e));
                    }
                },
            )
            .await;
        progress.finish_and_clear();

        if let Some(dir) = output {
            write_tiles(dir, &label, layer.extension(), &outcomes).await?;
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        let slowest_ms = outcomes
            .iter()
            .map(|o| o.elapsed.as_millis() as u64)
            .max()
            .unwrap_or(0);

        if !json {
            println!(
                "{}: {} tiles, {} ok, {} failed, {} timed out, {} abandoned (slowest {}ms)",
                label,
                summary.total(),
                summary.succeeded,
                summary.failed,
                summary.timed_out,
                summary.abandoned,
                slowest_ms
            );
        }

        reports.push(json!({
            "time": time.as_ref().map(TimeStep::to_wms_string),
            "tiles": summary.total(),
            "succeeded": summary.succeeded,
            "failed": summary.failed,
            "timed_out": summary.timed_out,
            "abandoned": summary.abandoned,
            "slowest_ms": slowest_ms,
        }));
    }

    let snapshot = loader.throttler().snapshot();
    if json {
        let document = json!({
            "layer": layer.name(),
            "steps": reports,
            "throttle": snapshot,
        });
        let rendered =
            serde_json::to_string_pretty(&document).map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", rendered);
    } else {
        let totals = snapshot.totals;
        println!();
        println!(
            "Throttle: {} submitted, {} queued at some point, peak {} in flight, {:.0}% success",
            totals.submitted,
            totals.queued,
            totals.peak_active,
            totals.success_ratio() * 100.0
        );
    }

    Ok(())
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    progress.set_message(label.to_string());
    progress
}

/// Output location of one tile.
fn tile_path(dir: &Path, label: &str, tile: &TileCoord, extension: &str) -> PathBuf {
    dir.join(label)
        .join(tile.zoom.to_string())
        .join(tile.col.to_string())
        .join(format!("{}.{}", tile.row, extension))
}

async fn write_tiles<O: AsRef<[u8]>>(
    dir: &Path,
    label: &str,
    extension: &str,
    outcomes: &[TileOutcome<O>],
) -> Result<(), CliError> {
    for outcome in outcomes {
        let Ok(body) = &outcome.result else {
            continue;
        };

        let path = tile_path(dir, label, &outcome.request.tile, extension);
        let to_error = |error| CliError::FileWrite {
            path: path.display().to_string(),
            error,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
        }
        tokio::fs::write(&path, body.as_ref())
            .await
            .map_err(to_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_time_arguments_means_server_default() {
        let steps = resolve_time_steps(&[], None, 1, 1).unwrap();
        assert_eq!(steps, vec![None]);
    }

    #[test]
    fn test_explicit_times() {
        let times = vec![
            "2024-03-01T00:00:00Z".to_string(),
            "2024-03-01T12:00:00Z".to_string(),
        ];
        let steps = resolve_time_steps(&times, None, 1, 1).unwrap();

        let labels: Vec<String> = steps.iter().flatten().map(TimeStep::label).collect();
        assert_eq!(labels, vec!["20240301T0000Z", "20240301T1200Z"]);
    }

    #[test]
    fn test_animation_from_start() {
        let steps = resolve_time_steps(&[], Some("2024-03-01T00:00:00Z"), 6, 3).unwrap();

        let rendered: Vec<String> = steps.iter().flatten().map(TimeStep::to_wms_string).collect();
        assert_eq!(
            rendered,
            vec![
                "2024-03-01T00:00:00Z",
                "2024-03-01T06:00:00Z",
                "2024-03-01T12:00:00Z"
            ]
        );
    }

    #[test]
    fn test_invalid_time_arguments() {
        assert!(resolve_time_steps(&["tomorrow".to_string()], None, 1, 1).is_err());
        assert!(resolve_time_steps(&[], Some("2024-03-01T00:00:00Z"), 0, 3).is_err());
        assert!(resolve_time_steps(&[], Some("2024-03-01T00:00:00Z"), 1, 0).is_err());
    }

    #[test]
    fn test_step_overflow_is_an_argument_error() {
        let start = Some("2024-03-01T00:00:00Z");

        // Past the largest representable duration
        let err = resolve_time_steps(&[], start, i64::MAX / 1000, 2).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));

        // A valid duration that pushes the second step past the last date
        let err = resolve_time_steps(&[], start, 10_000_000_000, 2).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    /// Parses `fetch` arguments the way clap does for the real command.
    fn fetch_args(extra: &[&str]) -> FetchArgs {
        #[derive(clap::Parser)]
        struct TestCli {
            #[command(flatten)]
            args: FetchArgs,
        }

        let mut argv = vec!["wavetile", "--lat", "-17.7", "--lon", "168.3"];
        argv.extend_from_slice(extra);
        <TestCli as clap::Parser>::try_parse_from(argv).unwrap().args
    }

    #[test]
    fn test_command_line_layer_completes_half_configured_file() {
        let mut config = ConfigFile::default();
        config.wms.url = Some("https://old.example.org/wms".to_string());

        let args = fetch_args(&[
            "--url",
            "https://thredds.example.org/wms",
            "--layer",
            "Hs",
            "--max-per-domain",
            "4",
        ]);
        apply_overrides(&args, &mut config).unwrap();

        let app = WaveTileApp::from_config(&config).unwrap();
        let layer = app.layer().unwrap();
        assert_eq!(layer.name(), "Hs");
        assert_eq!(layer.domain(), "thredds.example.org");
        assert_eq!(app.loader().throttler().config().max_per_domain, 4);
    }

    #[test]
    fn test_layer_flag_uses_configured_url() {
        let mut config = ConfigFile::default();
        config.wms.url = Some("https://thredds.example.org/wms".to_string());

        apply_overrides(&fetch_args(&["--layer", "Tm"]), &mut config).unwrap();
        assert_eq!(config.wms.layer.as_deref(), Some("Tm"));
    }

    #[test]
    fn test_url_flag_without_any_layer_is_rejected() {
        let mut config = ConfigFile::default();

        let err = apply_overrides(
            &fetch_args(&["--url", "https://thredds.example.org/wms"]),
            &mut config,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn test_tile_path_layout() {
        let tile = TileCoord {
            row: 35,
            col: 250,
            zoom: 8,
        };
        let path = tile_path(Path::new("/tmp/out"), "20240301T0600Z", &tile, "png");
        assert_eq!(
            path,
            PathBuf::from("/tmp/out/20240301T0600Z/8/250/35.png")
        );
    }

    #[tokio::test]
    async fn test_write_tiles_skips_failures() {
        use wavetile::throttle::ThrottleError;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let tile = TileCoord {
            row: 1,
            col: 2,
            zoom: 3,
        };
        let request = |url: &str| TileRequest {
            tile,
            url: url.to_string(),
            domain: "example.org".to_string(),
            priority: 0,
        };
        let outcomes = vec![
            TileOutcome {
                request: request("ok"),
                result: Ok(b"png-bytes".to_vec()),
                burst_delay: std::time::Duration::ZERO,
                elapsed: std::time::Duration::ZERO,
            },
            TileOutcome {
                request: request("lost"),
                result: Err(ThrottleError::Abandoned {
                    url: "lost".to_string(),
                }),
                burst_delay: std::time::Duration::ZERO,
                elapsed: std::time::Duration::ZERO,
            },
        ];

        write_tiles(temp_dir.path(), LATEST_LABEL, "png", &outcomes)
            .await
            .unwrap();

        let written = temp_dir.path().join("latest/3/2/1.png");
        assert_eq!(std::fs::read(written).unwrap(), b"png-bytes");
    }
}
