use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use framestack::{
    Audio, AudioFormat, AudioRequest, Buffer, DEFAULT_CHANNELS, DEFAULT_FREQUENCY,
    DEFAULT_SAMPLES, Frame, Profile, keys,
};

#[derive(Parser, Debug)]
#[command(name = "framestack", version)]
struct Cli {
    /// Log resolution decisions to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an empty frame to its placeholder image and dump it as PPM.
    Testcard(TestcardArgs),
    /// Render the waveform of a generated tone as a grayscale PNG.
    Waveform(WaveformArgs),
}

#[derive(Parser, Debug)]
struct TestcardArgs {
    /// Output directory for `frame-NNNNN.ppm`.
    #[arg(long)]
    out_dir: PathBuf,

    /// Profile JSON (defaults to 720x576).
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Frame position, used for the file name.
    #[arg(long, default_value_t = 0)]
    position: i64,

    /// Mark the frame audio-only, which yields a flat white card.
    #[arg(long)]
    audio_only: bool,
}

#[derive(Parser, Debug)]
struct WaveformArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Bitmap width.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Bitmap height.
    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Tone frequency in Hz.
    #[arg(long, default_value_t = 440.0)]
    tone_hz: f64,

    /// Gain applied to the tone before rendering.
    #[arg(long, default_value_t = 1.0)]
    volume: f64,

    /// Frame position.
    #[arg(long, default_value_t = 0)]
    position: i64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Testcard(args) => cmd_testcard(args),
        Command::Waveform(args) => cmd_waveform(args),
    }
}

fn cmd_testcard(args: TestcardArgs) -> anyhow::Result<()> {
    let profile = args
        .profile
        .as_ref()
        .map(|p| {
            Profile::from_path(p).with_context(|| format!("load profile '{}'", p.display()))
        })
        .transpose()?;

    let frame = Frame::create(profile.as_ref());
    frame.set_position(args.position);
    if args.audio_only {
        frame.properties().set_int(keys::TEST_AUDIO, 1);
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let path = frame.write_ppm(&args.out_dir).context("dump test card")?;

    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_waveform(args: WaveformArgs) -> anyhow::Result<()> {
    let frame = Frame::create(None);
    frame.set_position(args.position);
    let tone_hz = args.tone_hz;
    frame.push_audio_operation(move |_frame, request| Ok(sine_tone(request, tone_hz)));
    if args.volume != 1.0 {
        frame.properties().set_double(keys::VOLUME, args.volume);
    }

    let bitmap = frame
        .get_waveform(args.width, args.height)
        .context("render waveform")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &bitmap.read(),
        args.width,
        args.height,
        image::ColorType::L8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn sine_tone(request: AudioRequest, tone_hz: f64) -> Audio {
    let or_default = |v: u32, default: u32| if v == 0 { default } else { v };
    let frequency = or_default(request.frequency, DEFAULT_FREQUENCY);
    let channels = or_default(request.channels, DEFAULT_CHANNELS);
    let samples = or_default(request.samples, DEFAULT_SAMPLES);

    let mut bytes = Vec::with_capacity(AudioFormat::S16.buffer_size(samples, channels));
    for i in 0..samples {
        let t = f64::from(i) / f64::from(frequency);
        let v = (t * tone_hz * std::f64::consts::TAU).sin() * f64::from(i16::MAX) * 0.8;
        for _ in 0..channels {
            bytes.extend_from_slice(&(v as i16).to_ne_bytes());
        }
    }
    Audio::new(
        Buffer::new(bytes),
        AudioFormat::S16,
        frequency,
        channels,
        samples,
    )
}
