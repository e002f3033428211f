//! Capability Matrix: the one artifact the rest of the build consumes.
//!
//! Assembled write-once (each feature inserted exactly once by the probe
//! runner), then read-only. Platform overrides are the only sanctioned
//! post-assembly mutation and can only downgrade a result.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog;
use crate::config::{ArchClass, ProbeConfig};

/// Final verdict for one feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub supported: bool,
    /// The winning flag string, empty when unsupported or no flag needed.
    pub flag: String,
    /// Captured compiler/runtime output from the last rejection, for
    /// post-mortem reading. Empty on success.
    pub diagnostic: String,
}

impl ProbeResult {
    pub fn supported(flag: &str) -> Self {
        Self {
            supported: true,
            flag: flag.to_string(),
            diagnostic: String::new(),
        }
    }

    pub fn unsupported(diagnostic: &str) -> Self {
        Self {
            supported: false,
            flag: String::new(),
            diagnostic: diagnostic.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct CapabilityMatrix {
    entries: BTreeMap<String, ProbeResult>,
}

impl CapabilityMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each feature is probed exactly once; entries are write-once. A second
    /// insert is a runner bug and is discarded so the first verdict stands in
    /// release builds too.
    pub fn insert(&mut self, name: &str, result: ProbeResult) {
        match self.entries.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(result);
            }
            Entry::Occupied(_) => {
                warn!(feature = name, "feature probed twice, duplicate result discarded");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ProbeResult> {
        self.entries.get(name)
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.entries.get(name).map(|r| r.supported).unwrap_or(false)
    }

    pub fn flag(&self, name: &str) -> &str {
        self.entries.get(name).map(|r| r.flag.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProbeResult)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }

    fn force_unsupported(&mut self, name: &str, reason: &str) {
        if let Some(entry) = self.entries.get_mut(name) {
            if entry.supported {
                entry.supported = false;
                entry.flag.clear();
                entry.diagnostic = reason.to_string();
            }
        }
    }
}

/// A known-broken (feature, OS, architecture) combination that must stay
/// off regardless of what the probe said. Overrides never turn a feature on.
struct PlatformOverride {
    feature: &'static str,
    os: &'static str,
    arch: ArchClass,
    reason: &'static str,
}

const PLATFORM_OVERRIDES: &[PlatformOverride] = &[
    PlatformOverride {
        feature: "neon",
        os: "windows",
        arch: ArchClass::Arm32,
        reason: "NEON state is not reliably preserved on 32-bit Windows on ARM",
    },
    PlatformOverride {
        feature: "avx512",
        os: "windows",
        arch: ArchClass::X86,
        reason: "AVX-512 state is not preserved for 32-bit processes on Windows",
    },
];

pub fn apply_platform_overrides(matrix: &mut CapabilityMatrix, config: &ProbeConfig) {
    for rule in PLATFORM_OVERRIDES {
        if rule.os == config.host_os && rule.arch == config.arch {
            info!(feature = rule.feature, reason = rule.reason, "platform override");
            matrix.force_unsupported(rule.feature, rule.reason);
        }
    }

    // An override may have downgraded a prerequisite after its dependents
    // probed clean. Cascade in catalog order (prerequisites come first) so
    // no feature stays supported once a prerequisite is off.
    for feature in catalog::CATALOG {
        if !matrix.is_supported(feature.name) {
            continue;
        }
        if let Some(missing) = feature.requires.iter().find(|req| !matrix.is_supported(req)) {
            info!(
                feature = feature.name,
                prerequisite = missing,
                "downgraded, prerequisite unsupported"
            );
            matrix.force_unsupported(
                feature.name,
                &format!("prerequisite {missing} unsupported"),
            );
        }
    }
}

/// Consumer glue: the per-feature compilation units the surrounding build
/// should add, with the flags and defines to attach to just those units.
#[derive(Debug, Serialize)]
pub struct PlannedUnit {
    pub feature: String,
    pub source_file: String,
    pub flags: String,
    pub define: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BuildPlan {
    pub units: Vec<PlannedUnit>,
}

impl BuildPlan {
    pub fn from_matrix(matrix: &CapabilityMatrix) -> Self {
        let units = catalog::CATALOG
            .iter()
            .filter_map(|feature| {
                let result = matrix.get(feature.name)?;
                result.supported.then(|| PlannedUnit {
                    feature: feature.name.to_string(),
                    source_file: format!("{}.c", feature.variant_stem),
                    flags: result.flag.clone(),
                    define: feature.define.to_string(),
                })
            })
            .collect();
        Self { units }
    }

    /// Lines a build script forwards to Cargo so dispatch code can branch on
    /// probed capabilities with `cfg(...)`.
    pub fn cargo_directives(&self) -> Vec<String> {
        self.units
            .iter()
            .map(|unit| format!("cargo:rustc-cfg=intrin_{}", unit.feature))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut matrix = CapabilityMatrix::new();
        matrix.insert("avx2", ProbeResult::supported("-mavx2"));
        matrix.insert("avx512", ProbeResult::unsupported("nope"));

        assert!(matrix.is_supported("avx2"));
        assert_eq!(matrix.flag("avx2"), "-mavx2");
        assert!(!matrix.is_supported("avx512"));
        assert!(!matrix.is_supported("absent"));
        assert_eq!(matrix.flag("absent"), "");
        assert_eq!(matrix.len(), 2);
    }

    #[test]
    fn test_insert_is_write_once() {
        let mut matrix = CapabilityMatrix::new();
        matrix.insert("avx2", ProbeResult::supported("-mavx2"));
        matrix.insert("avx2", ProbeResult::unsupported("late overwrite"));

        let avx2 = matrix.get("avx2").unwrap();
        assert!(avx2.supported, "first verdict must stand");
        assert_eq!(avx2.flag, "-mavx2");
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn test_overrides_downgrade_only() {
        let config = ProbeConfig::new("clang", "armv7", "windows", false, false);

        // Raw probe said supported; the override must force it off.
        let mut matrix = CapabilityMatrix::new();
        matrix.insert("neon", ProbeResult::supported("-mfpu=neon"));
        apply_platform_overrides(&mut matrix, &config);
        let neon = matrix.get("neon").unwrap();
        assert!(!neon.supported);
        assert_eq!(neon.flag, "");
        assert!(neon.diagnostic.contains("Windows on ARM"));

        // Raw probe said unsupported; the override must not invent support
        // or clobber the probe's diagnostic.
        let mut matrix = CapabilityMatrix::new();
        matrix.insert("neon", ProbeResult::unsupported("compile failed"));
        apply_platform_overrides(&mut matrix, &config);
        let neon = matrix.get("neon").unwrap();
        assert!(!neon.supported);
        assert_eq!(neon.diagnostic, "compile failed");
    }

    #[test]
    fn test_override_cascades_through_prerequisites() {
        let config = ProbeConfig::new("cl", "i686", "windows", false, false);
        let mut matrix = CapabilityMatrix::new();
        matrix.insert("pclmulqdq", ProbeResult::supported(""));
        matrix.insert("avx512", ProbeResult::supported("/arch:AVX512"));
        matrix.insert("vpclmulqdq", ProbeResult::supported("/arch:AVX512"));

        apply_platform_overrides(&mut matrix, &config);

        assert!(!matrix.is_supported("avx512"));
        assert!(
            !matrix.is_supported("vpclmulqdq"),
            "dependent must fall with its overridden prerequisite"
        );
        assert!(matrix.is_supported("pclmulqdq"), "unrelated feature untouched");
        let vpclmul = matrix.get("vpclmulqdq").unwrap();
        assert!(vpclmul.diagnostic.contains("prerequisite avx512"));
    }

    #[test]
    fn test_overrides_ignore_other_platforms() {
        let config = ProbeConfig::new("clang", "armv7", "linux", false, false);
        let mut matrix = CapabilityMatrix::new();
        matrix.insert("neon", ProbeResult::supported("-mfpu=neon"));
        apply_platform_overrides(&mut matrix, &config);
        assert!(matrix.is_supported("neon"));
    }

    #[test]
    fn test_build_plan_covers_supported_features_only() {
        let mut matrix = CapabilityMatrix::new();
        matrix.insert("avx2", ProbeResult::supported("-mavx2"));
        matrix.insert("sse42", ProbeResult::supported(""));
        matrix.insert("avx512", ProbeResult::unsupported(""));

        let plan = BuildPlan::from_matrix(&matrix);
        assert_eq!(plan.units.len(), 2);

        let avx2 = plan.units.iter().find(|u| u.feature == "avx2").unwrap();
        assert_eq!(avx2.source_file, "chunkops_avx2.c");
        assert_eq!(avx2.flags, "-mavx2");
        assert_eq!(avx2.define, "HAVE_AVX2");

        let directives = plan.cargo_directives();
        assert!(directives.contains(&"cargo:rustc-cfg=intrin_avx2".to_string()));
        assert!(!directives.iter().any(|d| d.contains("avx512")));
    }

    #[test]
    fn test_json_export() {
        let mut matrix = CapabilityMatrix::new();
        matrix.insert("avx2", ProbeResult::supported("-mavx2"));
        let json = matrix.to_json().unwrap();
        assert!(json.contains("\"avx2\""));
        assert!(json.contains("\"supported\": true"));
        assert!(json.contains("\"flag\": \"-mavx2\""));
    }
}
