//! Static registry of probeable hardware features.
//!
//! Everything here is read-only data: which flags unlock a feature per
//! (compiler dialect, architecture class), in what escalation order, what
//! test program proves the instructions work, and what downstream consumers
//! get when the probe succeeds. Adding a platform or a tier is a table edit.

pub mod programs;

use crate::config::{ArchClass, FlagDialect};

/// A minimal C program proving a feature's instructions are usable.
#[derive(Debug, Clone, Copy)]
pub struct TestProgram {
    pub headers: &'static [&'static str],
    pub body: &'static str,
}

impl TestProgram {
    pub fn render(&self) -> String {
        let mut src = String::new();
        for header in self.headers {
            src.push_str("#include <");
            src.push_str(header);
            src.push_str(">\n");
        }
        src.push_str("\nint main(void) {\n");
        src.push_str(self.body);
        src.push_str("\n}\n");
        src
    }
}

/// One row of the flag dispatch table: for this dialect on these
/// architecture classes, try the tiers in order until one probes clean.
/// A tier of `&[]` means "no flag needed" and is a valid candidate;
/// a feature with no matching row is inapplicable for the config.
#[derive(Debug, Clone, Copy)]
pub struct FlagRule {
    pub dialect: FlagDialect,
    pub arch: &'static [ArchClass],
    pub tiers: &'static [&'static [&'static str]],
}

#[derive(Debug, Clone, Copy)]
pub struct Feature {
    pub name: &'static str,
    pub program: TestProgram,
    /// Compile success alone is weak evidence; these features must also run
    /// cleanly when the config permits execution.
    pub requires_execution: bool,
    /// Prerequisite feature names; if any probed unsupported this feature is
    /// unsupported without invoking the compiler.
    pub requires: &'static [&'static str],
    pub rules: &'static [FlagRule],
    /// Best-effort tuning sub-flags, first accepted one is appended to the
    /// winning flag set. Rejection here never fails the feature.
    pub tune_candidates: &'static [&'static str],
    /// Substrings in compiler output that mean "accepted the flag, rejected
    /// the feature". Matching any of these fails the candidate.
    pub rejection_markers: &'static [&'static str],
    /// Preprocessor symbol consumers define when the feature is supported.
    pub define: &'static str,
    /// Stem of the optimized source variant this feature unlocks.
    pub variant_stem: &'static str,
}

const X86_ANY: &[ArchClass] = &[ArchClass::X86, ArchClass::X86_64];
const X86_64_ONLY: &[ArchClass] = &[ArchClass::X86_64];
const X86_32_ONLY: &[ArchClass] = &[ArchClass::X86];
const AARCH64_ONLY: &[ArchClass] = &[ArchClass::Aarch64];
const ARM32_ONLY: &[ArchClass] = &[ArchClass::Arm32];

/// MSVC compiles most x86 intrinsics without any arch flag.
const NO_FLAG_NEEDED: &[&[&str]] = &[&[]];

const DEFAULT_REJECTIONS: &[&str] = &[
    "not supported",
    "is not recognized",
    "unsupported option",
    "ignoring unknown option",
];

pub static CATALOG: &[Feature] = &[
    Feature {
        name: "sse2",
        program: programs::SSE2,
        requires_execution: false,
        requires: &[],
        rules: &[
            FlagRule { dialect: FlagDialect::Gnu, arch: X86_ANY, tiers: &[&["-msse2"]] },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_32_ONLY, tiers: &[&["/arch:SSE2"]] },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_64_ONLY, tiers: NO_FLAG_NEEDED },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_SSE2",
        variant_stem: "chunkops_sse2",
    },
    Feature {
        name: "ssse3",
        program: programs::SSSE3,
        requires_execution: false,
        requires: &[],
        rules: &[
            FlagRule { dialect: FlagDialect::Gnu, arch: X86_ANY, tiers: &[&["-mssse3"]] },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_ANY, tiers: NO_FLAG_NEEDED },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_SSSE3",
        variant_stem: "chunkops_ssse3",
    },
    Feature {
        name: "sse42",
        program: programs::SSE42,
        requires_execution: false,
        requires: &[],
        rules: &[
            FlagRule { dialect: FlagDialect::Gnu, arch: X86_ANY, tiers: &[&["-msse4.2"]] },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_ANY, tiers: NO_FLAG_NEEDED },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_SSE42",
        variant_stem: "crc32_sse42",
    },
    Feature {
        name: "pclmulqdq",
        program: programs::PCLMULQDQ,
        requires_execution: true,
        requires: &[],
        rules: &[
            FlagRule { dialect: FlagDialect::Gnu, arch: X86_ANY, tiers: &[&["-mpclmul"]] },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_ANY, tiers: NO_FLAG_NEEDED },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_PCLMULQDQ",
        variant_stem: "crc32_pclmul",
    },
    Feature {
        name: "avx2",
        program: programs::AVX2,
        requires_execution: false,
        requires: &[],
        rules: &[
            FlagRule { dialect: FlagDialect::Gnu, arch: X86_ANY, tiers: &[&["-mavx2"]] },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_ANY, tiers: &[&["/arch:AVX2"]] },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_AVX2",
        variant_stem: "chunkops_avx2",
    },
    Feature {
        name: "avx512",
        program: programs::AVX512,
        requires_execution: false,
        requires: &[],
        rules: &[
            FlagRule {
                dialect: FlagDialect::Gnu,
                arch: X86_ANY,
                tiers: &[&["-mavx512f", "-mavx512dq", "-mavx512bw", "-mavx512vl"]],
            },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_ANY, tiers: &[&["/arch:AVX512"]] },
        ],
        // Older GCC releases reject cascadelake; fall back one generation.
        tune_candidates: &["-mtune=cascadelake", "-mtune=skylake-avx512"],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_AVX512",
        variant_stem: "chunkops_avx512",
    },
    Feature {
        name: "avx512vnni",
        program: programs::AVX512VNNI,
        requires_execution: false,
        requires: &["avx512"],
        rules: &[
            FlagRule {
                dialect: FlagDialect::Gnu,
                arch: X86_ANY,
                tiers: &[&["-mavx512vnni", "-mavx512vl", "-mavx512bw"]],
            },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_ANY, tiers: &[&["/arch:AVX512"]] },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_AVX512VNNI",
        variant_stem: "dot_avx512vnni",
    },
    Feature {
        name: "vpclmulqdq",
        program: programs::VPCLMULQDQ,
        requires_execution: false,
        requires: &["avx512", "pclmulqdq"],
        rules: &[
            FlagRule {
                dialect: FlagDialect::Gnu,
                arch: X86_ANY,
                tiers: &[&["-mvpclmulqdq", "-mavx512f", "-mavx512vl"]],
            },
            FlagRule { dialect: FlagDialect::Msvc, arch: X86_ANY, tiers: &[&["/arch:AVX512"]] },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_VPCLMULQDQ",
        variant_stem: "crc32_vpclmul",
    },
    Feature {
        name: "neon",
        program: programs::NEON,
        requires_execution: false,
        requires: &[],
        rules: &[
            FlagRule { dialect: FlagDialect::Gnu, arch: AARCH64_ONLY, tiers: NO_FLAG_NEEDED },
            FlagRule { dialect: FlagDialect::Gnu, arch: ARM32_ONLY, tiers: &[&["-mfpu=neon"]] },
            FlagRule { dialect: FlagDialect::Msvc, arch: AARCH64_ONLY, tiers: NO_FLAG_NEEDED },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_NEON",
        variant_stem: "chunkops_neon",
    },
    Feature {
        name: "armv8_crc",
        program: programs::ARMV8_CRC,
        requires_execution: true,
        requires: &[],
        rules: &[
            // Some toolchains want the bare +crc string, others only accept
            // it with +simd spelled out. Narrowest first.
            FlagRule {
                dialect: FlagDialect::Gnu,
                arch: AARCH64_ONLY,
                tiers: &[&["-march=armv8-a+crc"], &["-march=armv8-a+crc+simd"]],
            },
        ],
        tune_candidates: &[],
        rejection_markers: DEFAULT_REJECTIONS,
        define: "HAVE_ARMV8_CRC",
        variant_stem: "crc32_acle",
    },
];

pub fn find(name: &str) -> Option<&'static Feature> {
    CATALOG.iter().find(|f| f.name == name)
}
