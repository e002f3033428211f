//! Minimal C test programs, one per probeable feature.
//!
//! Each program must exercise an instruction that only exists when the
//! feature is enabled, so a compiler that merely tolerates the flag still
//! fails the probe. Bodies return 0 on success so execution-based probes
//! can reuse the same source.

use super::TestProgram;

pub const SSE2: TestProgram = TestProgram {
    headers: &["emmintrin.h"],
    body: "    __m128i a = _mm_set1_epi32(7);\n    \
    __m128i b = _mm_add_epi32(a, a);\n    \
    return _mm_cvtsi128_si32(b) == 14 ? 0 : 1;",
};

pub const SSSE3: TestProgram = TestProgram {
    headers: &["tmmintrin.h"],
    body: "    __m128i a = _mm_set1_epi16(-3);\n    \
    __m128i r = _mm_abs_epi16(a);\n    \
    return _mm_extract_epi16(r, 0) == 3 ? 0 : 1;",
};

pub const SSE42: TestProgram = TestProgram {
    headers: &["nmmintrin.h"],
    body: "    unsigned crc = _mm_crc32_u32(0u, 42u);\n    \
    return crc != 0u ? 0 : 1;",
};

pub const PCLMULQDQ: TestProgram = TestProgram {
    headers: &["emmintrin.h", "wmmintrin.h"],
    body: "    __m128i a = _mm_set_epi64x(0, 2);\n    \
    __m128i r = _mm_clmulepi64_si128(a, a, 0);\n    \
    return _mm_cvtsi128_si32(r) == 4 ? 0 : 1;",
};

pub const AVX2: TestProgram = TestProgram {
    headers: &["immintrin.h"],
    body: "    __m256i a = _mm256_set1_epi32(1);\n    \
    __m256i s = _mm256_add_epi32(a, a);\n    \
    return _mm256_extract_epi32(s, 0) == 2 ? 0 : 1;",
};

pub const AVX512: TestProgram = TestProgram {
    headers: &["immintrin.h"],
    body: "    __m512i a = _mm512_set1_epi32(1);\n    \
    __m512i b = _mm512_add_epi32(a, a);\n    \
    __mmask16 m = _mm512_cmpeq_epi32_mask(b, _mm512_set1_epi32(2));\n    \
    return m == (__mmask16)0xFFFF ? 0 : 1;",
};

pub const AVX512VNNI: TestProgram = TestProgram {
    headers: &["immintrin.h"],
    body: "    __m512i acc = _mm512_setzero_si512();\n    \
    __m512i one = _mm512_set1_epi8(1);\n    \
    acc = _mm512_dpbusd_epi32(acc, one, one);\n    \
    return _mm512_reduce_add_epi32(acc) != 0 ? 0 : 1;",
};

pub const VPCLMULQDQ: TestProgram = TestProgram {
    headers: &["immintrin.h", "wmmintrin.h"],
    body: "    __m512i a = _mm512_set1_epi64(2);\n    \
    __m512i r = _mm512_clmulepi64_epi128(a, a, 0);\n    \
    return _mm512_reduce_add_epi64(r) != 0 ? 0 : 1;",
};

pub const NEON: TestProgram = TestProgram {
    headers: &["arm_neon.h"],
    body: "    float32x4_t v = vdupq_n_f32(2.0f);\n    \
    v = vaddq_f32(v, v);\n    \
    return vgetq_lane_f32(v, 0) == 4.0f ? 0 : 1;",
};

pub const ARMV8_CRC: TestProgram = TestProgram {
    headers: &["arm_acle.h"],
    body: "    unsigned crc = __crc32w(0u, 42u);\n    \
    return crc != 0u ? 0 : 1;",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_headers_and_main() {
        let src = PCLMULQDQ.render();
        assert!(src.starts_with("#include <emmintrin.h>"));
        assert!(src.contains("#include <wmmintrin.h>"));
        assert!(src.contains("int main(void)"));
        assert!(src.contains("_mm_clmulepi64_si128"));
        assert!(src.ends_with("}\n"));
    }
}
