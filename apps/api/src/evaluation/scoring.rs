use serde::{Deserialize, Serialize};

use crate::models::candidate::ScoreTiers;
use crate::models::evaluation::AtqBreakdown;

/// Weights of the Accomplishments / Trajectory / Qualifications composite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtqWeights {
    pub accomplishments: f64,
    pub trajectory: f64,
    pub qualifications: f64,
}

impl Default for AtqWeights {
    fn default() -> Self {
        Self {
            accomplishments: 0.5,
            trajectory: 0.3,
            qualifications: 0.2,
        }
    }
}

/// Composite score: 0.5*A + 0.3*T + 0.2*Q, clamped to 0..=100.
pub fn compute_atq_score(atq: &AtqBreakdown, weights: &AtqWeights) -> f64 {
    (weights.accomplishments * atq.accomplishments
        + weights.trajectory * atq.trajectory
        + weights.qualifications * atq.qualifications)
        .clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Quick,
    Stage1,
    Stage2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TieredScore {
    pub score: f64,
    pub tier: ScoreTier,
}

/// The score to show for a candidate: stage2, then stage1, then quick.
pub fn display_score(tiers: &ScoreTiers) -> Option<TieredScore> {
    if let Some(stage2) = &tiers.stage2 {
        return Some(TieredScore {
            score: stage2.score,
            tier: ScoreTier::Stage2,
        });
    }
    if let Some(stage1) = &tiers.stage1 {
        return Some(TieredScore {
            score: stage1.score,
            tier: ScoreTier::Stage1,
        });
    }
    tiers.quick.as_ref().map(|quick| TieredScore {
        score: quick.score,
        tier: ScoreTier::Quick,
    })
}
