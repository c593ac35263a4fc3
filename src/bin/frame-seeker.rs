use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use frame_seeker::{
    Canvas, DriveMode, FfmpegSink, FfmpegSinkOpts, FnConsumer, Fps, FrameSink, FrameStep,
    NoOverlay, Overlay, PngSequenceSink, RecordSession, SeekDriver, SeekError, SeekerConfig,
    SimulatedOpts, SimulatedSource, StaticOverlay,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "frame-seeker", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Step through a simulated source and print every visited frame.
    Sample(SampleArgs),
    /// Record a simulated source to a PNG sequence or an MP4 (requires `ffmpeg` on PATH).
    Record(RecordArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Media duration in seconds.
    #[arg(long)]
    duration: f64,

    /// Frames per second used to derive the step.
    #[arg(long, conflicts_with = "step")]
    fps: Option<u32>,

    /// Explicit step in seconds.
    #[arg(long)]
    step: Option<f64>,

    /// Start position in seconds.
    #[arg(long)]
    start: Option<f64>,

    /// Wait for seek confirmation or step immediately.
    #[arg(long, value_enum)]
    mode: Option<ModeChoice>,

    /// Simulated delay between a seek and its confirmation.
    #[arg(long, default_value_t = 0)]
    seek_latency_ms: u64,

    /// Fail when a seek is not confirmed within this many milliseconds.
    #[arg(long)]
    seek_timeout_ms: Option<u64>,

    /// JSON config; flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args, Debug)]
struct RecordArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Output width in pixels.
    #[arg(long, default_value_t = 64)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 36)]
    height: u32,

    /// Output directory for a PNG sequence, or a `.mp4` file.
    #[arg(long)]
    out: PathBuf,

    /// PNG drawn on top of every frame; must match the output size.
    #[arg(long)]
    overlay: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Confirmed,
    Immediate,
}

impl From<ModeChoice> for DriveMode {
    fn from(m: ModeChoice) -> Self {
        match m {
            ModeChoice::Confirmed => DriveMode::Confirmed,
            ModeChoice::Immediate => DriveMode::Immediate,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Sample(args) => cmd_sample(args).await,
        Command::Record(args) => cmd_record(args).await,
    }
}

impl RunArgs {
    fn resolve(&self) -> anyhow::Result<SeekerConfig> {
        let mut cfg = match &self.config {
            Some(path) => SeekerConfig::from_path(path)?,
            None => SeekerConfig::default(),
        };
        if let Some(fps) = self.fps {
            cfg.fps = Some(Fps::new(fps, 1)?);
            cfg.step = None;
        }
        if let Some(step) = self.step {
            cfg.step = Some(FrameStep::new(step)?);
            cfg.fps = None;
        }
        if let Some(start) = self.start {
            cfg.start_time = start;
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode.into();
        }
        if self.seek_timeout_ms.is_some() {
            cfg.seek_timeout_ms = self.seek_timeout_ms;
        }
        Ok(cfg)
    }

    fn source_opts(&self, canvas: Canvas) -> SimulatedOpts {
        SimulatedOpts {
            duration: self.duration,
            canvas,
            seek_latency: Duration::from_millis(self.seek_latency_ms),
            ..SimulatedOpts::default()
        }
    }
}

async fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let cfg = args.run.resolve()?;
    let source = Arc::new(SimulatedSource::new(
        args.run.source_opts(SimulatedOpts::default().canvas),
    )?);
    let duration = args.run.duration;

    let mut index = 0u64;
    let consumer = FnConsumer(move |progress: f64| {
        println!("{index} {progress:.6} {:.6}", progress * duration);
        index += 1;
        std::future::ready(Ok::<(), SeekError>(()))
    });
    let driver = SeekDriver::with_opts(source, cfg.driver_opts()?, consumer);
    let outcome = driver.run(cfg.start_time, cfg.mode).await?;
    tracing::info!(?outcome, "sample done");
    Ok(())
}

async fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let cfg = args.run.resolve()?;
    let canvas = Canvas {
        width: args.width,
        height: args.height,
    };
    let source = Arc::new(SimulatedSource::new(args.run.source_opts(canvas))?);

    let is_mp4 = args
        .out
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
    let sink: Box<dyn FrameSink> = if is_mp4 {
        Box::new(FfmpegSink::new(FfmpegSinkOpts::new(&args.out)))
    } else {
        Box::new(PngSequenceSink::new(&args.out))
    };

    match &args.overlay {
        Some(path) => {
            let overlay = StaticOverlay::from_path(path)?;
            if overlay.canvas() != canvas {
                anyhow::bail!(
                    "overlay '{}' is {}x{} but the output is {}x{}",
                    path.display(),
                    overlay.canvas().width,
                    overlay.canvas().height,
                    canvas.width,
                    canvas.height
                );
            }
            record_with(source, sink, overlay, &cfg).await?
        }
        None => record_with(source, sink, NoOverlay, &cfg).await?,
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

async fn record_with<O: Overlay>(
    source: Arc<SimulatedSource>,
    sink: Box<dyn FrameSink>,
    overlay: O,
    cfg: &SeekerConfig,
) -> anyhow::Result<()> {
    let session = RecordSession::new(source, sink, overlay, cfg.driver_opts()?);
    let report = session
        .record(cfg.start_time, cfg.mode)
        .await
        .context("recording failed")?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
