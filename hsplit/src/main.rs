use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use segment::policy::{
    from_fn, FixedRate, Index, IndexWriter, Instruction, NalPolicy, Passthrough, PtsUnit,
    UptimeDts, UptimePts,
};
use segment::{MappedSource, NalHeader, NalParser, NalType, ParserConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Split H.264 Annex-B streams into NAL units")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every unit the policy chain cuts.
    List(ListArgs),

    /// Author an index file for the stream.
    Index(IndexArgs),
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    file_path: PathBuf,

    /// Split by this index file instead of by start codes.
    #[arg(short, long)]
    index: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = PtsUnitArg::Us)]
    pts_unit: PtsUnitArg,

    /// Stamp a synthetic pts at this frame rate.
    #[arg(long)]
    fps: Option<f64>,

    /// Release units no faster than their timestamps.
    #[arg(long)]
    pace: bool,

    /// With --pace, release units this many milliseconds early.
    #[arg(long, default_value_t = 0)]
    early_ms: u64,

    /// Remap timestamps onto the local monotonic clock.
    #[arg(long)]
    uptime_pts: bool,

    #[arg(long)]
    max_buffer: Option<usize>,
}

#[derive(clap::Args, Debug)]
struct IndexArgs {
    file_path: PathBuf,

    /// Defaults to `<FILE_PATH>.index`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = 60)]
    fps: u32,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PtsUnitArg {
    Ms,
    Us,
    Ns,
}

impl From<PtsUnitArg> for PtsUnit {
    fn from(unit: PtsUnitArg) -> Self {
        match unit {
            PtsUnitArg::Ms => PtsUnit::Millisecond,
            PtsUnitArg::Us => PtsUnit::Microsecond,
            PtsUnitArg::Ns => PtsUnit::Nanosecond,
        }
    }
}

/// Builds the chain inside out: index (or plain cut), fixed rate, dts pacing, uptime pts.
fn build_chain(args: &ListArgs) -> Result<Box<dyn NalPolicy>> {
    let leaf: Passthrough<Box<dyn NalPolicy>> = match &args.index {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open index {}", path.display()))?;
            let index: Box<dyn NalPolicy> =
                Box::new(Index::new(BufReader::new(file)).with_pts_unit(args.pts_unit.into()));
            Passthrough::new(index)
        }
        None => Passthrough::empty(),
    };

    let mut chain: Box<dyn NalPolicy> = Box::new(leaf);
    if let Some(fps) = args.fps {
        if !(fps.is_finite() && fps > 0.0) {
            bail!("--fps must be a positive number, got {fps}");
        }
        chain = Box::new(FixedRate::new(chain, fps));
    }
    if args.pace {
        chain = Box::new(UptimeDts::new(chain).with_early_ms(args.early_ms));
    }
    if args.uptime_pts {
        chain = Box::new(UptimePts::new(chain));
    }

    Ok(chain)
}

fn list(args: &ListArgs, out: &mut impl Write) -> Result<usize> {
    let mut config = ParserConfig::default();
    if let Some(max_buffer) = args.max_buffer {
        config = config.with_max_buffer(max_buffer);
    }

    let source = MappedSource::from_file_path(&args.file_path)?;
    let parser = NalParser::with_config(source, build_chain(args)?, config);

    let mut count = 0;
    for unit in parser {
        let unit = unit.with_context(|| format!("failed to split unit {count}"))?;
        writeln!(
            out,
            "count:{} type:{} size:{} pts:{} flag:{}",
            count,
            unit.nal_type(),
            unit.size(),
            unit.pts(),
            unit.nal_type().buffer_flag()
        )?;
        count += 1;
    }

    Ok(count)
}

/// Index files sit next to the stream they describe.
fn default_index_path(path: &Path) -> PathBuf {
    let mut index_path = path.as_os_str().to_owned();
    index_path.push(".index");
    PathBuf::from(index_path)
}

/// Merges SPS into PPS and SEI into the IDR behind it, then records one entry per merged unit,
/// the n-th stamped `n * (1_000_000 / fps)` microseconds in. The interval truncates.
fn generate_index(args: &IndexArgs) -> Result<(PathBuf, usize)> {
    if args.fps == 0 {
        bail!("--fps must be a positive number, got {}", args.fps);
    }

    let merge = from_fn(|header: &mut NalHeader, _nal: &[u8]| match header.nal_type {
        NalType::Sps | NalType::Sei => Instruction::Continue,
        _ => Instruction::Cut,
    });
    let mut parser = NalParser::from_file_path(&args.file_path, merge)?;
    let interval = 1_000_000 / i64::from(args.fps);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_index_path(&args.file_path));
    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = IndexWriter::new(BufWriter::new(file));

    while let Some(unit) = parser.parse()? {
        let mut header = unit.header;
        header.pts = writer.records() as i64 * interval;
        tracing::debug!(
            count = writer.records(),
            nal_type = %header.nal_type,
            size = header.size,
            pts = header.pts,
            "index"
        );
        writer.write(&header)?;
    }

    let records = writer.records();
    writer.into_inner()?;
    Ok((output, records))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::List(args) => {
            let stdout = io::stdout();
            let count = list(&args, &mut stdout.lock())?;
            tracing::info!("{} units in {}", count, args.file_path.display());
        }
        Command::Index(args) => {
            let (output, records) = generate_index(&args)?;
            println!("Index complete: {} ({} records)", output.display(), records);
        }
    }

    Ok(())
}
