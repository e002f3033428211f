use intrin_probe::config::ProbeConfig;
use intrin_probe::matrix::BuildPlan;
use intrin_probe::probe;
use intrin_probe::probe::toolchain::CcToolchain;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Intrinsics Probe Demo ===");

    // 1. Classify the host toolchain/target pair
    println!("\n[1] Detecting host configuration...");
    let config = ProbeConfig::detect_host();
    println!("    Compiler: {} ({:?})", config.compiler, config.family);
    println!(
        "    Target:   {} ({:?}) on {}",
        config.target_arch, config.arch, config.host_os
    );

    // 2. Run every catalog probe
    println!("\n[2] Probing features...");
    let toolchain = CcToolchain::new(&config)?;
    let matrix = probe::probe_all(&config, &toolchain)?;
    for (name, result) in matrix.iter() {
        let verdict = if result.supported { "yes" } else { "no" };
        println!("    {:<12} {:<3} {}", name, verdict, result.flag);
    }

    // 3. What the surrounding build would compile
    println!("\n[3] Build plan...");
    let plan = BuildPlan::from_matrix(&matrix);
    if plan.units.is_empty() {
        println!("    (portable fallbacks only)");
    }
    for unit in &plan.units {
        println!("    {:<20} -D{} {}", unit.source_file, unit.define, unit.flags);
    }

    println!("\n=== Probe Complete ===");
    Ok(())
}
