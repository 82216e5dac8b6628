//! Stopping Oracle — pure decision ladder evaluated after each hop. Does
//! not mutate Coverage; only reads a snapshot of it plus the last hop's
//! passages and the run's budgets.

use deep_research_core::Passage;

use crate::coverage;
use crate::model::Coverage;

/// Why the oracle decided to stop, or why it chose to continue. Matches
/// the reason strings used in `ResearchMetadata.stop_reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Stop,
}

pub const REASON_MAX_HOPS: &str = "max_hops";
pub const REASON_BELOW_MIN_HOPS: &str = "below_min_hops";
pub const REASON_CORE_ASPECTS_COVERED: &str = "core_aspects_covered";
pub const REASON_CORE_ASPECTS_UNCOVERED: &str = "core_aspects_uncovered";
pub const REASON_SUFFICIENT_QUALITY: &str = "sufficient_quality";
pub const REASON_CONTINUE_DEFAULT: &str = "continue";

pub struct StoppingInput<'a> {
    pub hop: u32,
    pub last_hop_passages: &'a [Passage],
    pub coverage: &'a Coverage,
    pub aspect_coverage_enabled: bool,
    pub min_hops: u32,
    pub max_hops: u32,
    pub cover_threshold: f64,
    pub quality_threshold: f64,
}

/// Evaluates the decision ladder below in order; the first matching rule
/// fires. Returns `(Decision, reason)`.
pub fn decide(input: &StoppingInput) -> (Decision, &'static str) {
    if input.hop >= input.max_hops {
        return (Decision::Stop, REASON_MAX_HOPS);
    }
    if input.hop < input.min_hops {
        return (Decision::Continue, REASON_BELOW_MIN_HOPS);
    }

    let has_aspects = !input.coverage.is_empty();
    if input.aspect_coverage_enabled && has_aspects {
        let uncovered_core = coverage::uncovered_core(input.coverage, input.cover_threshold);
        let weighted = coverage::weighted(input.coverage);
        if uncovered_core.is_empty() && weighted >= 0.7 {
            return (Decision::Stop, REASON_CORE_ASPECTS_COVERED);
        }
        if !uncovered_core.is_empty() {
            return (Decision::Continue, REASON_CORE_ASPECTS_UNCOVERED);
        }
    }

    if !input.last_hop_passages.is_empty() {
        let avg_score: f32 = input.last_hop_passages.iter().map(|p| p.score).sum::<f32>()
            / input.last_hop_passages.len() as f32;
        if avg_score as f64 >= input.quality_threshold {
            return (Decision::Stop, REASON_SUFFICIENT_QUALITY);
        }
    }

    (Decision::Continue, REASON_CONTINUE_DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aspect, AspectType, CoverageEntry};
    use std::collections::BTreeMap as Map;

    fn passage(score: f32) -> Passage {
        Passage {
            id: "p".to_string(),
            text: "text".to_string(),
            title: String::new(),
            filename: String::new(),
            score,
            metadata: Map::new(),
        }
    }

    fn covered_coverage(importance: f64, score: f64) -> Coverage {
        let aspect = Aspect::new("A", AspectType::Other, importance, vec!["a".into()]);
        let mut map = Coverage::new();
        map.insert(
            aspect.canonical_name(),
            CoverageEntry {
                aspect,
                score,
                covered_at_hop: if score >= 0.5 { Some(1) } else { None },
            },
        );
        map
    }

    #[test]
    fn test_max_hops_always_stops() {
        let coverage = covered_coverage(1.0, 0.0);
        let input = StoppingInput {
            hop: 10,
            last_hop_passages: &[],
            coverage: &coverage,
            aspect_coverage_enabled: true,
            min_hops: 3,
            max_hops: 10,
            cover_threshold: 0.5,
            quality_threshold: 0.5,
        };
        assert_eq!(decide(&input), (Decision::Stop, REASON_MAX_HOPS));
    }

    #[test]
    fn test_below_min_hops_always_continues() {
        let coverage = covered_coverage(1.0, 1.0);
        let input = StoppingInput {
            hop: 1,
            last_hop_passages: &[passage(0.99)],
            coverage: &coverage,
            aspect_coverage_enabled: true,
            min_hops: 3,
            max_hops: 10,
            cover_threshold: 0.5,
            quality_threshold: 0.5,
        };
        assert_eq!(decide(&input), (Decision::Continue, REASON_BELOW_MIN_HOPS));
    }

    #[test]
    fn test_core_covered_and_high_weighted_stops() {
        let coverage = covered_coverage(1.0, 0.9);
        let input = StoppingInput {
            hop: 3,
            last_hop_passages: &[passage(0.9)],
            coverage: &coverage,
            aspect_coverage_enabled: true,
            min_hops: 3,
            max_hops: 10,
            cover_threshold: 0.5,
            quality_threshold: 0.5,
        };
        assert_eq!(decide(&input), (Decision::Stop, REASON_CORE_ASPECTS_COVERED));
    }

    #[test]
    fn test_core_uncovered_continues() {
        let coverage = covered_coverage(1.0, 0.1);
        let input = StoppingInput {
            hop: 3,
            last_hop_passages: &[passage(0.1)],
            coverage: &coverage,
            aspect_coverage_enabled: true,
            min_hops: 3,
            max_hops: 10,
            cover_threshold: 0.5,
            quality_threshold: 0.5,
        };
        assert_eq!(decide(&input), (Decision::Continue, REASON_CORE_ASPECTS_UNCOVERED));
    }

    #[test]
    fn test_fallback_quality_when_coverage_disabled() {
        let coverage = Coverage::new();
        let input = StoppingInput {
            hop: 4,
            last_hop_passages: &[passage(0.8), passage(0.7)],
            coverage: &coverage,
            aspect_coverage_enabled: false,
            min_hops: 3,
            max_hops: 10,
            cover_threshold: 0.5,
            quality_threshold: 0.5,
        };
        assert_eq!(decide(&input), (Decision::Stop, REASON_SUFFICIENT_QUALITY));
    }

    #[test]
    fn test_fallback_continue_when_no_passages_and_no_aspects() {
        let coverage = Coverage::new();
        let input = StoppingInput {
            hop: 4,
            last_hop_passages: &[],
            coverage: &coverage,
            aspect_coverage_enabled: false,
            min_hops: 3,
            max_hops: 10,
            cover_threshold: 0.5,
            quality_threshold: 0.5,
        };
        assert_eq!(decide(&input), (Decision::Continue, REASON_CONTINUE_DEFAULT));
    }

    #[test]
    fn test_min_equals_max_stops_at_first_eligible_hop() {
        let coverage = covered_coverage(1.0, 0.0);
        let input = StoppingInput {
            hop: 1,
            last_hop_passages: &[],
            coverage: &coverage,
            aspect_coverage_enabled: true,
            min_hops: 1,
            max_hops: 1,
            cover_threshold: 0.5,
            quality_threshold: 0.5,
        };
        assert_eq!(decide(&input), (Decision::Stop, REASON_MAX_HOPS));
    }
}
