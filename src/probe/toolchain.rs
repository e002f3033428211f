//! The seam between the probe executor and the real compiler.
//!
//! `CcToolchain` shells out to the configured C compiler inside a scratch
//! directory. Compile *failures* are data (the probe's negative signal);
//! only "the compiler cannot be invoked at all" is an error, because that
//! invalidates every subsequent probe.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

use crate::config::{FlagDialect, ProbeConfig};

#[derive(Error, Debug)]
pub enum ToolingError {
    #[error("failed to invoke compiler `{compiler}`: {source}")]
    CompilerSpawn {
        compiler: String,
        source: std::io::Error,
    },
    #[error("probe scratch space: {0}")]
    Scratch(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct CompileOutcome {
    pub success: bool,
    /// Combined stdout+stderr, used for negative-diagnostic matching.
    pub output: String,
    pub artifact: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub success: bool,
    pub output: String,
}

pub trait Toolchain {
    /// Compile `source` with `flags` scoped to this attempt only.
    fn compile(&self, source: &str, flags: &[String]) -> Result<CompileOutcome, ToolingError>;

    /// Execute a previously compiled probe. A binary that cannot be spawned
    /// or exits abnormally is a failed probe, not a tooling error.
    fn run(&self, artifact: &Path) -> RunOutcome;
}

/// Real toolchain: one scratch dir per run, one subdirectory per compile so
/// concurrent probes never share state.
pub struct CcToolchain {
    compiler: String,
    dialect: Option<FlagDialect>,
    scratch: TempDir,
    counter: AtomicUsize,
}

impl CcToolchain {
    pub fn new(config: &ProbeConfig) -> Result<Self, ToolingError> {
        Ok(Self {
            compiler: config.compiler.clone(),
            dialect: config.family.dialect(),
            scratch: TempDir::with_prefix("intrin-probe-")?,
            counter: AtomicUsize::new(0),
        })
    }
}

impl Toolchain for CcToolchain {
    fn compile(&self, source: &str, flags: &[String]) -> Result<CompileOutcome, ToolingError> {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        let dir = self.scratch.path().join(format!("probe{id}"));
        std::fs::create_dir(&dir)?;
        std::fs::write(dir.join("probe.c"), source)?;

        let artifact = dir.join(if self.dialect == Some(FlagDialect::Msvc) {
            "probe.exe"
        } else {
            "probe.bin"
        });

        let mut cmd = Command::new(&self.compiler);
        cmd.current_dir(&dir);
        match self.dialect {
            Some(FlagDialect::Msvc) => {
                cmd.arg("/nologo")
                    .args(flags)
                    .arg("probe.c")
                    .arg(format!("/Fe:{}", artifact.display()));
            }
            _ => {
                cmd.args(flags).arg("probe.c").arg("-o").arg(&artifact);
            }
        }

        let output = cmd.output().map_err(|source| ToolingError::CompilerSpawn {
            compiler: self.compiler.clone(),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let success = output.status.success();
        debug!(flags = ?flags, success, "compile probe finished");

        Ok(CompileOutcome {
            success,
            output: text,
            artifact: success.then_some(artifact),
        })
    }

    fn run(&self, artifact: &Path) -> RunOutcome {
        match Command::new(artifact).output() {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                RunOutcome {
                    success: output.status.success(),
                    output: text,
                }
            }
            Err(e) => RunOutcome {
                success: false,
                output: e.to_string(),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_compiler_is_fatal() {
        let config = ProbeConfig::new(
            "definitely-not-a-compiler-9f3",
            "x86_64",
            "linux",
            false,
            false,
        );
        let tc = CcToolchain::new(&config).unwrap();
        let err = tc.compile("int main(void) { return 0; }\n", &[]).unwrap_err();
        assert!(matches!(err, ToolingError::CompilerSpawn { .. }));
    }
}
