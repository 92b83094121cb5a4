//! Quantization detection from artifact filenames.
//!
//! Filenames embed their precision as a marker such as `Q4_K_M`, `Q8_0` or
//! `F16`. [`classify`] finds that marker with case-insensitive substring
//! matching and maps it onto a fixed ranking where less lossy variants come
//! first. A filename with no recognised marker is classified as
//! [`UNKNOWN_TAG`] and ranked after everything else.

use serde::Serialize;

/// Tag given to filenames without a recognised marker.
pub const UNKNOWN_TAG: &str = "Unknown";

/// Rank of [`UNKNOWN_TAG`]; larger than every recognised rank.
pub const UNKNOWN_RANK: u32 = 42;

/// Result of classifying a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Quantization {
    /// Canonical tag, e.g. `Q4_K_M`.
    pub tag: &'static str,
    /// Human-readable description of the variant.
    pub description: &'static str,
    /// Position in the quality ordering; lower is better.
    pub rank: u32,
}

impl Quantization {
    pub fn is_unknown(&self) -> bool {
        self.rank == UNKNOWN_RANK
    }
}

/// One recognised marker.
struct QuantPattern {
    /// Lowercase substring to look for.
    needle: &'static str,
    /// Also requires the Unsloth dynamic `ud-` marker.
    unsloth_dynamic: bool,
    tag: &'static str,
    description: &'static str,
    rank: u32,
}

const fn pattern(
    needle: &'static str,
    unsloth_dynamic: bool,
    tag: &'static str,
    description: &'static str,
    rank: u32,
) -> QuantPattern {
    QuantPattern {
        needle,
        unsloth_dynamic,
        tag,
        description,
        rank,
    }
}

/// Patterns in match order. More specific needles precede the ones they
/// contain (`ud-` variants, then `_xl`, `_k_l` before `_k`, `bf16` before `f16`).
const PATTERNS: &[QuantPattern] = &[
    // Unsloth dynamic variants
    pattern("iq1_s", true, "UD-IQ1_S", "1-bit Unsloth Dynamic quantization (small)", 41),
    pattern("iq1_m", true, "UD-IQ1_M", "1-bit Unsloth Dynamic quantization (medium)", 39),
    pattern("iq2_xxs", true, "UD-IQ2_XXS", "2-bit Unsloth Dynamic quantization (extra extra small)", 37),
    pattern("iq2_m", true, "UD-IQ2_M", "2-bit Unsloth Dynamic quantization (medium)", 35),
    pattern("iq3_xxs", true, "UD-IQ3_XXS", "3-bit Unsloth Dynamic quantization (extra extra small)", 29),
    pattern("q2_k_xl", true, "UD-Q2_K_XL", "2-bit Unsloth Dynamic K-quantization (XL)", 31),
    pattern("q3_k_xl", true, "UD-Q3_K_XL", "3-bit Unsloth Dynamic K-quantization (XL)", 24),
    pattern("q4_k_xl", true, "UD-Q4_K_XL", "4-bit Unsloth Dynamic K-quantization (XL)", 15),
    pattern("q5_k_xl", true, "UD-Q5_K_XL", "5-bit Unsloth Dynamic K-quantization (XL)", 10),
    pattern("q6_k_xl", true, "UD-Q6_K_XL", "6-bit Unsloth Dynamic K-quantization (XL)", 7),
    pattern("q8_k_xl", true, "UD-Q8_K_XL", "8-bit Unsloth Dynamic K-quantization (XL)", 4),
    // XL K-quants
    pattern("q8_k_xl", false, "Q8_K_XL", "8-bit K-quantization (XL), maximum quality", 3),
    pattern("q6_k_xl", false, "Q6_K_XL", "6-bit K-quantization (XL), very high quality", 6),
    pattern("q5_k_xl", false, "Q5_K_XL", "5-bit K-quantization (XL), high quality", 9),
    pattern("q4_k_xl", false, "Q4_K_XL", "4-bit K-quantization (XL), good quality", 14),
    pattern("q3_k_xl", false, "Q3_K_XL", "3-bit K-quantization (XL), compact with quality", 23),
    pattern("q2_k_xl", false, "Q2_K_XL", "2-bit K-quantization (XL), very compact", 30),
    // 8-bit
    pattern("q8_0", false, "Q8_0", "8-bit quantization, excellent quality", 5),
    // 6-bit
    pattern("q6_k", false, "Q6_K", "6-bit quantization, high quality with smaller size", 8),
    // 5-bit
    pattern("q5_k_m", false, "Q5_K_M", "5-bit quantization (medium), good quality/size balance", 11),
    pattern("q5_k_s", false, "Q5_K_S", "5-bit quantization (small), smaller size", 12),
    pattern("q5_0", false, "Q5_0", "5-bit quantization, legacy format", 13),
    // 4-bit
    pattern("iq4_nl", false, "IQ4_NL", "4-bit improved quantization (non-linear)", 21),
    pattern("iq4_xs", false, "IQ4_XS", "4-bit improved quantization (extra small)", 22),
    pattern("q4_k_m", false, "Q4_K_M", "4-bit quantization (medium), good for most use cases", 17),
    pattern("q4_k_l", false, "Q4_K_L", "4-bit quantization (large), better quality at 4-bit", 16),
    pattern("q4_k_s", false, "Q4_K_S", "4-bit quantization (small), very compact", 18),
    pattern("q4_1", false, "Q4_1", "4-bit quantization v1, improved legacy format", 19),
    pattern("q4_0", false, "Q4_0", "4-bit quantization, legacy format", 20),
    // 3-bit
    pattern("iq3_xxs", false, "IQ3_XXS", "3-bit improved quantization (extra extra small)", 28),
    pattern("q3_k_l", false, "Q3_K_L", "3-bit quantization (large)", 25),
    pattern("q3_k_m", false, "Q3_K_M", "3-bit quantization (medium), very small size", 26),
    pattern("q3_k_s", false, "Q3_K_S", "3-bit quantization (small), ultra compact", 27),
    // 2-bit
    pattern("iq2_xxs", false, "IQ2_XXS", "2-bit improved quantization (extra extra small)", 36),
    pattern("iq2_m", false, "IQ2_M", "2-bit improved quantization (medium)", 34),
    pattern("q2_k_l", false, "Q2_K_L", "2-bit quantization (large), better quality at 2-bit", 32),
    pattern("q2_k", false, "Q2_K", "2-bit quantization, extremely small but lower quality", 33),
    // 1-bit
    pattern("iq1_s", false, "IQ1_S", "1-bit improved quantization (small), experimental", 40),
    pattern("iq1_m", false, "IQ1_M", "1-bit improved quantization (medium), experimental", 38),
    // Floating point
    pattern("bf16", false, "BF16", "16-bit brain floating point, near-original precision", 2),
    pattern("fp16", false, "F16", "16-bit floating point, highest quality but large size", 1),
    pattern("f16", false, "F16", "16-bit floating point, highest quality but large size", 1),
    pattern("fp32", false, "F32", "32-bit floating point, original precision", 0),
    pattern("f32", false, "F32", "32-bit floating point, original precision", 0),
];

const UNKNOWN: Quantization = Quantization {
    tag: UNKNOWN_TAG,
    description: "Unknown quantization type",
    rank: UNKNOWN_RANK,
};

/// True when `lower` carries a `ud-` marker at the start of a name segment,
/// e.g. `qwen3-ud-q4_k_xl` but not `cloud-q4_k_xl`.
fn has_dynamic_marker(lower: &str) -> bool {
    lower
        .match_indices("ud-")
        .any(|(idx, _)| idx == 0 || !lower.as_bytes()[idx - 1].is_ascii_alphanumeric())
}

/// Infer the quantization of an artifact from its filename.
///
/// Never fails; a filename without a recognised marker yields the unknown
/// classification.
pub fn classify(filename: &str) -> Quantization {
    let lower = filename.to_lowercase();
    let is_dynamic = has_dynamic_marker(&lower);

    PATTERNS
        .iter()
        .find(|p| (!p.unsloth_dynamic || is_dynamic) && lower.contains(p.needle))
        .map(|p| Quantization {
            tag: p.tag,
            description: p.description,
            rank: p.rank,
        })
        .unwrap_or(UNKNOWN)
}

/// Every recognised tag with its rank, best first.
pub fn ranked_tags() -> Vec<(&'static str, u32)> {
    let mut tags: Vec<(&'static str, u32)> = PATTERNS.iter().map(|p| (p.tag, p.rank)).collect();
    tags.sort_by_key(|&(_, rank)| rank);
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_common_markers() {
        assert_eq!(classify("model.Q8_0.gguf").tag, "Q8_0");
        assert_eq!(classify("model.Q4_K_M.gguf").tag, "Q4_K_M");
        assert_eq!(classify("model-f16.gguf").tag, "F16");
        assert_eq!(classify("model.BF16.gguf").tag, "BF16");
        assert_eq!(classify("model.fp32.gguf").tag, "F32");
        assert_eq!(classify("model-IQ4_XS.gguf").tag, "IQ4_XS");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("MODEL.q4_k_m.GGUF"), classify("model.Q4_K_M.gguf"));
    }

    #[test]
    fn test_specific_before_general() {
        assert_eq!(classify("m.Q6_K_XL.gguf").tag, "Q6_K_XL");
        assert_eq!(classify("m.Q6_K.gguf").tag, "Q6_K");
        assert_eq!(classify("m.Q2_K_L.gguf").tag, "Q2_K_L");
        assert_eq!(classify("m.Q2_K.gguf").tag, "Q2_K");
        assert_eq!(classify("m-bf16.gguf").tag, "BF16");
    }

    #[test]
    fn test_unsloth_dynamic_requires_marker() {
        assert_eq!(classify("Qwen3-UD-Q4_K_XL.gguf").tag, "UD-Q4_K_XL");
        assert_eq!(classify("Qwen3-Q4_K_XL.gguf").tag, "Q4_K_XL");
        assert_eq!(classify("m-UD-IQ1_S.gguf").tag, "UD-IQ1_S");
        assert_eq!(classify("m-IQ1_S.gguf").tag, "IQ1_S");
        assert_eq!(classify("UD-Q2_K_XL.gguf").tag, "UD-Q2_K_XL");
        assert_eq!(classify("m_ud-q8_k_xl.gguf").tag, "UD-Q8_K_XL");
    }

    #[test]
    fn test_dynamic_marker_must_start_a_segment() {
        assert_eq!(classify("cloud-Q4_K_XL.gguf").tag, "Q4_K_XL");
        assert_eq!(classify("mud-IQ1_S.gguf").tag, "IQ1_S");
        assert_eq!(classify("cloud/UD-Q4_K_XL.gguf").tag, "UD-Q4_K_XL");
    }

    #[test]
    fn test_eight_bit_beats_four_bit() {
        let eight = ["a.Q8_0.gguf", "a.Q8_K_XL.gguf", "a-UD-Q8_K_XL.gguf"];
        let four = [
            "a.Q4_K_M.gguf",
            "a.Q4_K_S.gguf",
            "a.Q4_K_L.gguf",
            "a.Q4_0.gguf",
            "a.Q4_1.gguf",
            "a.IQ4_NL.gguf",
            "a.IQ4_XS.gguf",
            "a.Q4_K_XL.gguf",
        ];
        for e in eight {
            for f in four {
                assert!(
                    classify(e).rank < classify(f).rank,
                    "{} should rank before {}",
                    e,
                    f
                );
            }
        }
    }

    #[test]
    fn test_unknown_ranks_last() {
        let unknown = classify("weights.gguf");
        assert_eq!(unknown.tag, UNKNOWN_TAG);
        assert!(unknown.is_unknown());
        for (_, rank) in ranked_tags() {
            assert!(rank < unknown.rank);
        }
    }

    #[test]
    fn test_ranking_is_a_total_order_over_tags() {
        // Each tag owns exactly one rank and each rank one tag.
        let mut by_tag: HashMap<&str, u32> = HashMap::new();
        let mut by_rank: HashMap<u32, &str> = HashMap::new();
        for p in PATTERNS {
            assert_eq!(*by_tag.entry(p.tag).or_insert(p.rank), p.rank, "{}", p.tag);
            assert_eq!(*by_rank.entry(p.rank).or_insert(p.tag), p.tag, "{}", p.rank);
        }
        let ranks: Vec<u32> = ranked_tags().into_iter().map(|(_, r)| r).collect();
        assert_eq!(ranks, (0..UNKNOWN_RANK).collect::<Vec<_>>());
    }

    #[test]
    fn test_float_ranks_before_quantized() {
        assert!(classify("m.F16.gguf").rank < classify("m.Q8_0.gguf").rank);
        assert!(classify("m.F32.gguf").rank < classify("m.F16.gguf").rank);
    }

    #[test]
    fn test_deterministic() {
        for name in ["x.Q5_K_M.gguf", "nothing-here", ""] {
            assert_eq!(classify(name), classify(name));
        }
    }
}
