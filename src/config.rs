/// Probe Configuration Module
/// Classifies the active toolchain/target pair once, at the start of a run.
use serde::Serialize;

/// Compiler vendors we know how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompilerFamily {
    Gcc,
    Clang,
    Msvc,
    Intel,
    Other,
}

/// The flag vocabulary a compiler family speaks.
/// GCC, Clang and Intel all accept `-m<feature>` / `-march=` style flags;
/// MSVC only knows `/arch:NAME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FlagDialect {
    Gnu,
    Msvc,
}

impl CompilerFamily {
    pub fn parse(id: &str) -> Self {
        let id = id.to_ascii_lowercase();
        if id.contains("clang") {
            Self::Clang
        } else if id.contains("icc") || id.contains("icx") || id.contains("intel") {
            Self::Intel
        } else if id.contains("msvc") || id == "cl" || id.ends_with("cl.exe") {
            Self::Msvc
        } else if id.contains("gcc") || id.contains("g++") || id.contains("cc") {
            Self::Gcc
        } else {
            Self::Other
        }
    }

    pub fn dialect(&self) -> Option<FlagDialect> {
        match self {
            Self::Gcc | Self::Clang | Self::Intel => Some(FlagDialect::Gnu),
            Self::Msvc => Some(FlagDialect::Msvc),
            Self::Other => None,
        }
    }
}

/// Architecture classes the catalog keys flag rules on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[allow(non_camel_case_types)]
pub enum ArchClass {
    X86,
    X86_64,
    Aarch64,
    Arm32,
    Other,
}

impl ArchClass {
    pub fn parse(arch: &str) -> Self {
        let arch = arch.to_ascii_lowercase();
        if arch.contains("x86_64") || arch.contains("amd64") {
            Self::X86_64
        } else if arch.contains("aarch64") || arch.contains("arm64") {
            Self::Aarch64
        } else if arch.starts_with("arm") {
            Self::Arm32
        } else if arch.starts_with('i') && arch.ends_with("86") || arch == "x86" {
            Self::X86
        } else {
            Self::Other
        }
    }
}

/// Ambient configuration for one probe run. Constructed once per build
/// configuration and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeConfig {
    /// Compiler command to invoke (e.g. "cc", "clang-17", "cl").
    pub compiler: String,
    pub family: CompilerFamily,
    pub arch: ArchClass,
    /// Raw target architecture string the class was parsed from.
    pub target_arch: String,
    pub host_os: String,
    /// Prefer host-auto-detected flags and permit execution-based probes.
    pub native_instructions: bool,
    /// Target differs from host; execution probes degrade to compile-only.
    pub cross_compiling: bool,
}

impl ProbeConfig {
    pub fn new(
        compiler: &str,
        target_arch: &str,
        host_os: &str,
        native_instructions: bool,
        cross_compiling: bool,
    ) -> Self {
        Self {
            family: CompilerFamily::parse(compiler),
            arch: ArchClass::parse(target_arch),
            compiler: compiler.to_string(),
            target_arch: target_arch.to_string(),
            host_os: host_os.to_string(),
            native_instructions,
            cross_compiling,
        }
    }

    /// Build a config for the machine we are running on, honoring `CC`.
    pub fn detect_host() -> Self {
        let compiler = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());
        Self::new(
            &compiler,
            std::env::consts::ARCH,
            std::env::consts::OS,
            false,
            false,
        )
    }

    /// Execution-based validation is only meaningful when we build for the
    /// host and native mode asked for it. Cross-compiling always wins.
    pub fn allows_execution(&self) -> bool {
        self.native_instructions && !self.cross_compiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parsing() {
        assert_eq!(CompilerFamily::parse("gcc-13"), CompilerFamily::Gcc);
        assert_eq!(CompilerFamily::parse("cc"), CompilerFamily::Gcc);
        assert_eq!(CompilerFamily::parse("clang-17"), CompilerFamily::Clang);
        assert_eq!(CompilerFamily::parse("cl"), CompilerFamily::Msvc);
        assert_eq!(CompilerFamily::parse("MSVC"), CompilerFamily::Msvc);
        assert_eq!(CompilerFamily::parse("icx"), CompilerFamily::Intel);
        assert_eq!(CompilerFamily::parse("tcc-ish"), CompilerFamily::Gcc); // contains "cc"
        assert_eq!(CompilerFamily::parse("dmc"), CompilerFamily::Other);
    }

    #[test]
    fn test_arch_parsing() {
        assert_eq!(ArchClass::parse("x86_64"), ArchClass::X86_64);
        assert_eq!(ArchClass::parse("amd64"), ArchClass::X86_64);
        assert_eq!(ArchClass::parse("i386"), ArchClass::X86);
        assert_eq!(ArchClass::parse("i686"), ArchClass::X86);
        assert_eq!(ArchClass::parse("aarch64"), ArchClass::Aarch64);
        assert_eq!(ArchClass::parse("arm64"), ArchClass::Aarch64);
        assert_eq!(ArchClass::parse("armv7l"), ArchClass::Arm32);
        assert_eq!(ArchClass::parse("riscv64"), ArchClass::Other);
    }

    #[test]
    fn test_execution_policy() {
        let mut config = ProbeConfig::new("gcc", "x86_64", "linux", true, false);
        assert!(config.allows_execution());

        config.cross_compiling = true;
        assert!(!config.allows_execution(), "cross-compiling must win");

        config.cross_compiling = false;
        config.native_instructions = false;
        assert!(!config.allows_execution());
    }
}
