use anyhow::{Context, Result, bail};
use clap::Parser;
use roadwatch_core::{ClassTable, CountingLine};
use roadwatch_cv::{Session, SessionConfig};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod replay;

#[derive(Parser, Debug)]
#[command(
    name = "roadwatch",
    about = "Line-crossing counts and violation evidence from detector output"
)]
struct Args {
    /// Detection log, one JSON frame per line
    #[arg(long, value_name = "PATH")]
    detections: PathBuf,
    /// Session configuration (JSON); defaults are used when omitted
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Class table (`id, name, roles` per line); the helmet model table when omitted
    #[arg(long, value_name = "PATH")]
    classes: Option<PathBuf>,
    /// Counting line, overriding the configured start line
    #[arg(long, value_name = "X1,Y1,X2,Y2", value_parser = parse_line)]
    line: Option<CountingLine>,
    /// Write session events here as JSON lines
    #[arg(long, value_name = "PATH")]
    events: Option<PathBuf>,
}

fn parse_line(s: &str) -> Result<CountingLine> {
    let coords = s
        .split(',')
        .map(|c| c.trim().parse::<i32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid coordinate in '{}'", s))?;

    match coords.as_slice() {
        &[x1, y1, x2, y2] => Ok(CountingLine::from_coords(x1, y1, x2, y2)),
        _ => bail!("expected four comma-separated coordinates, got '{}'", s),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("roadwatch=info,roadwatch_cv=info,roadwatch_core=info")
            }),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    info!("Mode: {:?}", config.mode);

    let classes = match &args.classes {
        Some(path) => ClassTable::load(path)?,
        None => ClassTable::helmet_default(),
    };

    let line = args.line.unwrap_or(config.counting.start_line);
    let mut session = Session::from_config(config, classes)?;

    let log = File::open(&args.detections)
        .with_context(|| format!("Failed to open detection log: {:?}", args.detections))?;
    let base_dir = args
        .detections
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut events_file = match &args.events {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        )),
        None => None,
    };

    info!("Starting replay of {:?}", args.detections);
    let summary = replay::replay(
        BufReader::new(log),
        &base_dir,
        &mut session,
        line,
        events_file.as_mut().map(|w| w as &mut dyn Write),
    )?;

    if let Some(mut writer) = events_file {
        writer.flush().context("Failed to flush events file")?;
    }

    let stats = session.stats();
    info!(
        "Processing complete: {} frames, {} crossings, {} violations ({} evidence saved, {} failed)",
        stats.frames, stats.crossings, stats.violations, stats.evidence_saved, stats.evidence_failures
    );
    info!(
        "Rejected {} detections, {} dropped on load, {} frame images missing",
        stats.rejected_detections, summary.dropped_detections, summary.missing_images
    );
    for (class_name, count) in session.counts().iter() {
        info!("  {}: {}", class_name, count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("100, 500,1800,500").unwrap(),
            CountingLine::from_coords(100, 500, 1800, 500)
        );
        assert!(parse_line("1,2,3").is_err());
        assert!(parse_line("a,b,c,d").is_err());
    }
}
