use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use intrin_probe::config::ProbeConfig;
use intrin_probe::matrix::BuildPlan;
use intrin_probe::probe;
use intrin_probe::probe::toolchain::CcToolchain;

/// Probe a toolchain/target pair and report the capability matrix.
#[derive(Parser, Debug, Clone)]
#[command(author, about, long_about = None)]
struct Args {
    /// Compiler command to probe with
    #[arg(short, long, default_value = "cc")]
    compiler: String,

    /// Target architecture string (defaults to the host)
    #[arg(short, long)]
    target_arch: Option<String>,

    /// Host OS family (defaults to the host)
    #[arg(long)]
    host_os: Option<String>,

    /// Prefer host-auto-detected flags and allow execution probes
    #[arg(long)]
    native: bool,

    /// Target differs from host; forces compile-only validation
    #[arg(long)]
    cross: bool,

    /// Write the matrix and build plan to this JSON file
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(serde::Serialize)]
struct Report<'a> {
    config: &'a ProbeConfig,
    matrix: &'a intrin_probe::matrix::CapabilityMatrix,
    plan: &'a BuildPlan,
    cargo_directives: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let target_arch = args
        .target_arch
        .unwrap_or_else(|| std::env::consts::ARCH.to_string());
    let host_os = args
        .host_os
        .unwrap_or_else(|| std::env::consts::OS.to_string());
    let config = ProbeConfig::new(&args.compiler, &target_arch, &host_os, args.native, args.cross);

    let toolchain = CcToolchain::new(&config)?;
    let matrix = probe::probe_all(&config, &toolchain)?;
    let plan = BuildPlan::from_matrix(&matrix);

    println!(
        "{} ({:?}) targeting {} ({:?})",
        config.compiler, config.family, config.target_arch, config.arch
    );
    for (name, result) in matrix.iter() {
        let verdict = if result.supported { "yes" } else { "no" };
        println!("  {:<12} {:<3} {}", name, verdict, result.flag);
    }

    if let Some(path) = args.out {
        let report = Report {
            config: &config,
            matrix: &matrix,
            plan: &plan,
            cargo_directives: plan.cargo_directives(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        let mut file = File::create(&path)?;
        file.write_all(json.as_bytes())?;
        println!("Wrote report to {:?}", path);
    }

    Ok(())
}
