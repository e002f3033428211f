//! Probe Executor: tries each resolved flag candidate in order and folds
//! the outcome into a single `ProbeResult`. Pure over the `Toolchain` seam;
//! no state survives a call except the returned result.

use tracing::debug;

use super::resolver::FlagSet;
use super::toolchain::{Toolchain, ToolingError};
use crate::catalog::Feature;
use crate::config::{FlagDialect, ProbeConfig};
use crate::matrix::ProbeResult;

pub fn probe_feature(
    feature: &Feature,
    config: &ProbeConfig,
    candidates: &[FlagSet],
    toolchain: &dyn Toolchain,
) -> Result<ProbeResult, ToolingError> {
    if candidates.is_empty() {
        debug!(feature = feature.name, "inapplicable for this config");
        return Ok(ProbeResult::unsupported(""));
    }

    let source = feature.program.render();
    let mut last_diagnostic = String::new();

    for flags in candidates {
        let outcome = toolchain.compile(&source, flags)?;
        if !outcome.success {
            debug!(feature = feature.name, flags = ?flags, "compile rejected");
            last_diagnostic = outcome.output;
            continue;
        }

        if let Some(marker) = rejection_marker(feature, &outcome.output) {
            debug!(feature = feature.name, marker, "diagnostic-pattern rejection");
            last_diagnostic = outcome.output;
            continue;
        }

        if feature.requires_execution && config.allows_execution() {
            let artifact = match &outcome.artifact {
                Some(path) => path,
                None => {
                    debug!(feature = feature.name, flags = ?flags, "no artifact to execute");
                    last_diagnostic = "compile produced no artifact to execute".to_string();
                    continue;
                }
            };
            let run = toolchain.run(artifact);
            if !run.success {
                debug!(feature = feature.name, flags = ?flags, "execution probe failed");
                last_diagnostic = run.output;
                continue;
            }
        }

        let mut accepted = flags.clone();
        if let Some(tune) = select_tune_flag(feature, config, &source, flags, toolchain)? {
            accepted.push(tune);
        }
        return Ok(ProbeResult::supported(&accepted.join(" ")));
    }

    Ok(ProbeResult::unsupported(&last_diagnostic))
}

fn rejection_marker<'a>(feature: &'a Feature, output: &str) -> Option<&'a str> {
    feature
        .rejection_markers
        .iter()
        .copied()
        .find(|marker| output.contains(marker))
}

/// Best-effort tuning sub-probe: append the first tune flag the compiler
/// accepts on top of the winning flag set, or nothing. Never fails the
/// feature; only a tooling failure propagates.
fn select_tune_flag(
    feature: &Feature,
    config: &ProbeConfig,
    source: &str,
    flags: &FlagSet,
    toolchain: &dyn Toolchain,
) -> Result<Option<String>, ToolingError> {
    if feature.tune_candidates.is_empty() || config.family.dialect() != Some(FlagDialect::Gnu) {
        return Ok(None);
    }

    for tune in feature.tune_candidates {
        let mut with_tune = flags.clone();
        with_tune.push(tune.to_string());
        let outcome = toolchain.compile(source, &with_tune)?;
        if outcome.success && rejection_marker(feature, &outcome.output).is_none() {
            return Ok(Some(tune.to_string()));
        }
        debug!(feature = feature.name, tune, "tune flag rejected, dropping");
    }
    Ok(None)
}
