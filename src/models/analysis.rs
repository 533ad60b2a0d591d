use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of rubric dimensions and the raw-score ceiling they imply.
pub const SCORE_DIMENSIONS: u32 = 6;
pub const MAX_RAW_SCORE: u32 = SCORE_DIMENSIONS * 10;

/// Six rubric dimensions, each scored 1–10 by the analysis model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub clarification: u8,
    pub empathy_tone: u8,
    pub solution_accuracy: u8,
    pub actionability: u8,
    pub confirmation_closure: u8,
    pub compliance_safety: u8,
}

impl Scores {
    pub fn as_array(&self) -> [u8; 6] {
        [
            self.clarification,
            self.empathy_tone,
            self.solution_accuracy,
            self.actionability,
            self.confirmation_closure,
            self.compliance_safety,
        ]
    }

    /// Every dimension must be strictly within [1, 10].
    pub fn validate(&self) -> Result<(), ScoreOutOfRange> {
        const NAMES: [&str; 6] = [
            "clarification",
            "empathy_tone",
            "solution_accuracy",
            "actionability",
            "confirmation_closure",
            "compliance_safety",
        ];
        for (name, value) in NAMES.iter().zip(self.as_array()) {
            if !(1..=10).contains(&value) {
                return Err(ScoreOutOfRange {
                    dimension: name,
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn raw_sum(&self) -> u32 {
        self.as_array().iter().map(|&v| v as u32).sum()
    }

    /// Deterministic total on a 0–100 scale: `round(sum / 60 * 100)`.
    ///
    /// The model's own total is never used; this keeps the total consistent
    /// with the six dimension scores.
    pub fn total_score(&self) -> u8 {
        ((self.raw_sum() as f64 / MAX_RAW_SCORE as f64) * 100.0).round() as u8
    }
}

/// A dimension score outside the 1–10 bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("score {value} for {dimension} is outside 1..=10")]
pub struct ScoreOutOfRange {
    pub dimension: &'static str,
    pub value: u8,
}

/// One dimension score with the supporting excerpt the model cited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWithEvidence {
    pub score: u8,
    pub evidence: String,
}

/// All six dimensions with evidence; reducible to plain [`Scores`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoresWithEvidence {
    pub clarification: ScoreWithEvidence,
    pub empathy_tone: ScoreWithEvidence,
    pub solution_accuracy: ScoreWithEvidence,
    pub actionability: ScoreWithEvidence,
    pub confirmation_closure: ScoreWithEvidence,
    pub compliance_safety: ScoreWithEvidence,
}

impl ScoresWithEvidence {
    pub fn to_scores(&self) -> Scores {
        Scores {
            clarification: self.clarification.score,
            empathy_tone: self.empathy_tone.score,
            solution_accuracy: self.solution_accuracy.score,
            actionability: self.actionability.score,
            confirmation_closure: self.confirmation_closure.score,
            compliance_safety: self.compliance_safety.score,
        }
    }
}

/// A concrete coaching suggestion for one problematic utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Improvement {
    pub issue: String,
    pub original_excerpt: String,
    pub suggested_rewrite: String,
    pub reason: String,
}

/// FAQ-accuracy assessment, present only when FAQ context was supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqAccuracy {
    pub has_faq_context: bool,
    #[serde(default)]
    pub correct_info: Vec<String>,
    #[serde(default)]
    pub incorrect_info: Vec<String>,
    #[serde(default)]
    pub missing_info: Vec<String>,
}

/// The full output of one analysis pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub request_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
    pub analyzed_at: DateTime<Utc>,
    pub scores: Scores,
    pub scores_with_evidence: ScoresWithEvidence,
    pub total_score: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<Improvement>,
    pub overall_feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faq_accuracy: Option<FaqAccuracy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csat_score: Option<u8>,
}

/// Letter bucket derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Grade boundaries are total-score-inclusive:
    /// [90,100]→A, [80,89]→B, [70,79]→C, [60,69]→D, [0,59]→F.
    pub fn from_total(total_score: u8) -> Self {
        match total_score {
            90..=100 => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

/// Sort key for analysis history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Date,
    Score,
}

/// Condensed line item for the analysis history view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub request_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub total_score: u8,
    pub grade: Grade,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: [u8; 6]) -> Scores {
        Scores {
            clarification: values[0],
            empathy_tone: values[1],
            solution_accuracy: values[2],
            actionability: values[3],
            confirmation_closure: values[4],
            compliance_safety: values[5],
        }
    }

    #[test]
    fn total_score_matches_formula_for_all_combinations() {
        // Property over a spread of valid score vectors: total must always be
        // round(sum / 60 * 100). A deterministic LCG stands in for a
        // quickcheck-style generator.
        let mut seed: u64 = 0x2545F4914F6CDD1D;
        for _ in 0..500 {
            let mut values = [0u8; 6];
            for v in values.iter_mut() {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                *v = ((seed >> 33) % 10) as u8 + 1;
            }
            let s = scores(values);
            let sum: u32 = values.iter().map(|&v| v as u32).sum();
            let expected = ((sum as f64 / 60.0) * 100.0).round() as u8;
            assert_eq!(s.total_score(), expected, "values {values:?}");
        }
    }

    #[test]
    fn total_score_bounds() {
        assert_eq!(scores([1; 6]).total_score(), 10); // 6/60 → 10
        assert_eq!(scores([10; 6]).total_score(), 100);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(scores([5; 6]).validate().is_ok());
        let err = scores([0, 5, 5, 5, 5, 5]).validate().unwrap_err();
        assert_eq!(err.dimension, "clarification");
        let err = scores([5, 5, 5, 5, 5, 11]).validate().unwrap_err();
        assert_eq!(err.dimension, "compliance_safety");
    }

    #[test]
    fn grade_boundaries_are_inclusive() {
        assert_eq!(Grade::from_total(100), Grade::A);
        assert_eq!(Grade::from_total(90), Grade::A);
        assert_eq!(Grade::from_total(89), Grade::B);
        assert_eq!(Grade::from_total(80), Grade::B);
        assert_eq!(Grade::from_total(79), Grade::C);
        assert_eq!(Grade::from_total(78), Grade::C);
        assert_eq!(Grade::from_total(70), Grade::C);
        assert_eq!(Grade::from_total(69), Grade::D);
        assert_eq!(Grade::from_total(60), Grade::D);
        assert_eq!(Grade::from_total(59), Grade::F);
        assert_eq!(Grade::from_total(55), Grade::F);
        assert_eq!(Grade::from_total(0), Grade::F);
    }

    #[test]
    fn scores_with_evidence_reduce_to_scores() {
        let ev = |score| ScoreWithEvidence {
            score,
            evidence: "근거".into(),
        };
        let swe = ScoresWithEvidence {
            clarification: ev(7),
            empathy_tone: ev(8),
            solution_accuracy: ev(6),
            actionability: ev(9),
            confirmation_closure: ev(5),
            compliance_safety: ev(10),
        };
        let s = swe.to_scores();
        assert_eq!(s.as_array(), [7, 8, 6, 9, 5, 10]);
        assert_eq!(s.total_score(), 75);
    }
}
