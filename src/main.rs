use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use rtti_scanner::config::{self, ConfigLoader};
use rtti_scanner::{
    logging, Abi, DebugSession, LiveProcess, MemorySource, MinidumpSource, MsvcUndecorator,
    OutputStyle, ScanOutcome, SnapshotSource, TargetPlatform,
};

#[derive(Parser, Debug)]
#[command(name = "rtti-scanner")]
#[command(version)]
#[command(about = "Resolves the dynamic C++ type of objects in a live or captured process", long_about = None)]
struct Args {
    /// Minidump (`.dmp`/`.mdmp`), snapshot JSON file, or `pid:<N>` to attach
    /// to a live process
    target: String,

    /// Override ABI detection
    #[arg(long)]
    abi: Option<Abi>,

    /// Configuration file (defaults to rtti-scanner.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured output style
    #[arg(long)]
    style: Option<OutputStyle>,
}

fn open_source(target: &str, config: &config::Config) -> Result<Box<dyn MemorySource>> {
    if let Some(pid) = target.strip_prefix("pid:") {
        let pid = pid
            .trim()
            .parse()
            .with_context(|| format!("invalid process id '{}'", pid))?;
        let process = LiveProcess::open(pid, config.target.width()?)?;
        return Ok(Box::new(process));
    }

    let lower = target.to_ascii_lowercase();
    if lower.ends_with(".dmp") || lower.ends_with(".mdmp") {
        let dump = MinidumpSource::open(target)
            .with_context(|| format!("failed to load minidump '{}'", target))?;
        return Ok(Box::new(dump));
    }

    let snapshot = SnapshotSource::from_file(target)
        .with_context(|| format!("failed to load snapshot '{}'", target))?;
    Ok(Box::new(snapshot))
}

/// Address text of one input line: only a stray line terminator is removed
fn address_text(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

fn platform_for(abi: Abi) -> TargetPlatform {
    match abi {
        Abi::Msvc => TargetPlatform::Windows,
        Abi::Itanium => TargetPlatform::Linux,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::new(path).load()?,
        None => config::load_config()?,
    };
    config::validate_config(&config)?;
    logging::init(&config.logging);

    info!("Starting RTTI-Scanner v{}", env!("CARGO_PKG_VERSION"));

    let source = open_source(&args.target, &config)?;
    let undecorator = Arc::new(MsvcUndecorator);
    let session = match args.abi {
        Some(abi) => DebugSession::open(source, platform_for(abi), undecorator, &config.scanner)?,
        None => DebugSession::detect(source, undecorator, &config.scanner)?,
    };
    let style = match args.style {
        Some(style) => style,
        None => config.output.style()?,
    };
    let session = session.with_style(style);

    info!("{} session ready, reading object addresses from stdin", session.abi());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = address_text(&line);
        if text.is_empty() {
            continue;
        }

        match session.scan(text).await {
            Ok(ScanOutcome::Completed(hierarchy)) => {
                for line in session.render(&hierarchy) {
                    println!("{}", line);
                }
            }
            Ok(ScanOutcome::Superseded) => {}
            Err(e) => println!("{}", e),
        }
    }

    info!("Shutting down RTTI-Scanner");
    Ok(())
}
