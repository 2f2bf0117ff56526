use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::thread;

use anyhow::{bail, Context};
use chord_oracle::*;
use clap::{Args, Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(version, about = "Estimate chord labels from chroma features")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Label chroma frames with chords and write a lab track.
    Label(LabelArgs),
    /// Score estimated lab tracks against references.
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
struct LabelArgs {
    /// YAML run configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// YAML mapping of chord name to template vector.
    #[arg(long)]
    templates: Option<PathBuf>,
    /// Chroma YAML document, a `.txt` file of rows, or `-` for rows on stdin.
    #[arg(long)]
    features: PathBuf,
    /// Sample rate of the analysed audio, required for row input.
    #[arg(long)]
    sample_rate: Option<u32>,
    #[arg(long)]
    hop_length: Option<usize>,
    /// Drop segments no longer than this many seconds.
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long, value_enum)]
    gap_policy: Option<GapPolicy>,
    #[arg(long, value_enum)]
    norm: Option<Norm>,
    /// Where to write the lab track (default: stdout).
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    #[arg(long, required = true)]
    reference: Vec<PathBuf>,
    #[arg(long, required = true)]
    estimate: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Label(args) => label(args),
        Command::Evaluate(args) => evaluate_tracks(args),
    }
}

fn label(args: LabelArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if args.templates.is_some() {
        config.templates = args.templates.clone();
    }
    if let Some(hop) = args.hop_length {
        config.hop_length = hop;
    }
    if args.threshold.is_some() {
        config.threshold = args.threshold;
    }
    if let Some(p) = args.gap_policy {
        config.gap_policy = p;
    }
    if let Some(n) = args.norm {
        config.norm = n;
    }
    config.validate()?;

    let oracle = Oracle::from_config(&config).context("loading chord templates")?;
    info!(
        "{} templates of width {}",
        oracle.templates().len(),
        oracle.templates().dimension()
    );

    let segments = if is_row_input(&args.features) {
        let sample_rate = match args.sample_rate {
            Some(sr) => sr,
            None => bail!("--sample-rate is required for chroma rows"),
        };
        label_rows(&oracle, &args.features, sample_rate, config.hop_length)?
    } else {
        let mut doc = ChromaDocument::open(&args.features);
        oracle.label(&mut doc)?
    };

    match &args.output {
        Some(path) => lab::save_lab(&segments, path)
            .with_context(|| format!("writing {}", path.display()))?,
        None => lab::write_lab(&segments, BufWriter::new(std::io::stdout().lock()))?,
    }
    Ok(())
}

fn is_row_input(path: &Path) -> bool {
    path.as_os_str() == "-" || path.extension().is_some_and(|e| e == "txt")
}

/// Streams rows into the oracle from a reader thread so labelling keeps up
/// with an extractor writing to our stdin.
fn label_rows(
    oracle: &Oracle,
    path: &Path,
    sample_rate: u32,
    hop_length: usize,
) -> anyhow::Result<Vec<Segment>> {
    let path = path.to_path_buf();
    let (tx, rx) = channel();

    let reader = thread::spawn(move || -> chord_oracle::Result<()> {
        let frames = if path.as_os_str() == "-" {
            ChromaRows::new(
                Box::new(BufReader::new(std::io::stdin())) as Box<dyn std::io::BufRead + Send>,
                sample_rate,
                hop_length,
            )?
            .frames()
        } else {
            ChromaRows::new(
                Box::new(BufReader::new(File::open(&path)?)) as Box<dyn std::io::BufRead + Send>,
                sample_rate,
                hop_length,
            )?
            .frames()
        };
        for frame in frames {
            if tx.send(frame?).is_err() {
                break;
            }
        }
        Ok(())
    });

    let labelled = oracle.run_stream(rx, sample_rate, hop_length);
    match reader.join() {
        Ok(res) => res.context("reading chroma rows")?,
        Err(_) => bail!("chroma reader thread panicked"),
    }
    Ok(labelled?)
}

fn evaluate_tracks(args: EvaluateArgs) -> anyhow::Result<()> {
    if args.reference.len() != args.estimate.len() {
        bail!(
            "got {} references but {} estimates",
            args.reference.len(),
            args.estimate.len()
        );
    }

    let mut report = serde_yaml::Mapping::new();
    let mut results = Vec::with_capacity(args.reference.len());
    for (r, e) in args.reference.iter().zip(&args.estimate) {
        let reference =
            lab::load_lab(r).with_context(|| format!("reading {}", r.display()))?;
        let estimate = lab::load_lab(e).with_context(|| format!("reading {}", e.display()))?;
        let result = evaluate(&reference, &estimate);
        report.insert(
            e.display().to_string().into(),
            serde_yaml::to_value(result)?,
        );
        results.push(result);
    }
    report.insert("mean".into(), serde_yaml::to_value(Evaluation::mean(&results))?);

    print!("{}", serde_yaml::to_string(&report)?);
    Ok(())
}
