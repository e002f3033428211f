//! Probe runner: resolves and executes every catalog feature under one
//! ambient config and assembles the capability matrix.

pub mod executor;
pub mod resolver;
pub mod toolchain;

use rayon::prelude::*;
use tracing::info;

use crate::catalog::{self, Feature};
use crate::config::ProbeConfig;
use crate::matrix::{self, CapabilityMatrix, ProbeResult};
use self::toolchain::{Toolchain, ToolingError};

/// Probe the full catalog. Features without prerequisites share nothing but
/// the read-only config, so they probe in parallel; dependent features run
/// afterwards so failed prerequisites short-circuit them without a compile.
pub fn probe_all(
    config: &ProbeConfig,
    toolchain: &(dyn Toolchain + Sync),
) -> Result<CapabilityMatrix, ToolingError> {
    let (roots, dependents): (Vec<&Feature>, Vec<&Feature>) = catalog::CATALOG
        .iter()
        .partition(|feature| feature.requires.is_empty());

    let mut matrix = CapabilityMatrix::new();

    let results: Vec<(&str, Result<ProbeResult, ToolingError>)> = roots
        .par_iter()
        .map(|feature| (feature.name, probe_one(feature, config, toolchain)))
        .collect();
    for (name, result) in results {
        matrix.insert(name, result?);
    }

    // Catalog order lists prerequisites before dependents.
    for feature in dependents {
        if let Some(missing) = feature
            .requires
            .iter()
            .find(|req| !matrix.is_supported(req))
        {
            info!(
                feature = feature.name,
                prerequisite = missing,
                "short-circuited, prerequisite unsupported"
            );
            matrix.insert(
                feature.name,
                ProbeResult::unsupported(&format!("prerequisite {missing} unsupported")),
            );
            continue;
        }
        matrix.insert(feature.name, probe_one(feature, config, toolchain)?);
    }

    matrix::apply_platform_overrides(&mut matrix, config);

    for (name, result) in matrix.iter() {
        info!(
            feature = name,
            supported = result.supported,
            flag = %result.flag,
            "probe verdict"
        );
    }
    Ok(matrix)
}

fn probe_one(
    feature: &Feature,
    config: &ProbeConfig,
    toolchain: &dyn Toolchain,
) -> Result<ProbeResult, ToolingError> {
    let candidates = resolver::resolve(feature, config);
    executor::probe_feature(feature, config, &candidates, toolchain)
}
