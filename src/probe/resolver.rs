//! Flag Resolver: turns (feature, config) into an ordered list of flag-set
//! candidates for the executor to try. Resolution never fails; an empty list
//! means the feature is inapplicable for this toolchain/target pair and the
//! executor records it unsupported without touching the compiler.

use crate::catalog::Feature;
use crate::config::{FlagDialect, ProbeConfig};

/// Flags for one compile attempt. Empty means "no flag needed".
pub type FlagSet = Vec<String>;

pub fn resolve(feature: &Feature, config: &ProbeConfig) -> Vec<FlagSet> {
    let dialect = match config.family.dialect() {
        Some(d) => d,
        None => return Vec::new(),
    };

    let tiers: Vec<FlagSet> = feature
        .rules
        .iter()
        .filter(|rule| rule.dialect == dialect && rule.arch.contains(&config.arch))
        .flat_map(|rule| rule.tiers.iter())
        .map(|tier| tier.iter().map(|flag| flag.to_string()).collect())
        .collect();

    if tiers.is_empty() {
        // Inapplicable, not "try with no flags".
        return tiers;
    }

    if config.native_instructions {
        // Let the toolchain auto-detect the host first; the explicit tiers
        // stay behind it as fallback for compilers that reject the auto flag.
        let auto: FlagSet = match dialect {
            FlagDialect::Gnu => vec!["-march=native".to_string()],
            FlagDialect::Msvc => Vec::new(),
        };
        let mut candidates = vec![auto];
        for tier in tiers {
            if tier != candidates[0] {
                candidates.push(tier);
            }
        }
        return candidates;
    }

    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn gcc_x86_64() -> ProbeConfig {
        ProbeConfig::new("gcc", "x86_64", "linux", false, false)
    }

    #[test]
    fn test_unknown_compiler_resolves_nothing() {
        let config = ProbeConfig::new("dmc", "x86_64", "windows", false, false);
        let avx2 = catalog::find("avx2").unwrap();
        assert!(resolve(avx2, &config).is_empty());
    }

    #[test]
    fn test_gnu_x86_64_avx2() {
        let avx2 = catalog::find("avx2").unwrap();
        assert_eq!(resolve(avx2, &gcc_x86_64()), vec![vec!["-mavx2".to_string()]]);
    }

    #[test]
    fn test_msvc_arch_gating() {
        let sse2 = catalog::find("sse2").unwrap();

        // 32-bit MSVC needs the explicit flag.
        let x86 = ProbeConfig::new("cl", "i686", "windows", false, false);
        assert_eq!(resolve(sse2, &x86), vec![vec!["/arch:SSE2".to_string()]]);

        // 64-bit MSVC compiles SSE2 with no flag at all.
        let x64 = ProbeConfig::new("cl", "x86_64", "windows", false, false);
        assert_eq!(resolve(sse2, &x64), vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_arm_feature_inapplicable_on_x86() {
        let crc = catalog::find("armv8_crc").unwrap();
        assert!(resolve(crc, &gcc_x86_64()).is_empty());
    }

    #[test]
    fn test_escalation_tiers_in_order() {
        let crc = catalog::find("armv8_crc").unwrap();
        let config = ProbeConfig::new("clang", "aarch64", "linux", false, false);
        let candidates = resolve(crc, &config);
        assert_eq!(
            candidates,
            vec![
                vec!["-march=armv8-a+crc".to_string()],
                vec!["-march=armv8-a+crc+simd".to_string()],
            ]
        );
    }

    #[test]
    fn test_native_mode_prefers_auto_detect() {
        let avx2 = catalog::find("avx2").unwrap();
        let config = ProbeConfig::new("gcc", "x86_64", "linux", true, false);
        let candidates = resolve(avx2, &config);
        assert_eq!(candidates[0], vec!["-march=native".to_string()]);
        assert_eq!(candidates[1], vec!["-mavx2".to_string()]);
    }

    #[test]
    fn test_native_mode_msvc_dedupes_empty_candidate() {
        let ssse3 = catalog::find("ssse3").unwrap();
        let config = ProbeConfig::new("cl", "x86_64", "windows", true, false);
        // Auto-detect under MSVC is "no flag", which equals the explicit
        // tier; it must appear once.
        assert_eq!(resolve(ssse3, &config), vec![Vec::<String>::new()]);
    }
}
