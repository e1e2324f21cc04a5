use serde::{Deserialize, Serialize};

use crate::AnalyticsRecord;

/// Constants of the composite performance score. The defaults are the
/// production values; each component is capped at its `*_cap`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub engagement_multiplier: f64,
    pub engagement_cap: f64,
    pub growth_per_follower: f64,
    pub growth_cap: f64,
    pub quality_reach_divisor: f64,
    pub quality_cap: f64,
    pub consistency_posts_target: f64,
    pub consistency_factor: f64,
    pub consistency_cap: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            engagement_multiplier: 10.0,
            engagement_cap: 50.0,
            growth_per_follower: 0.05,
            growth_cap: 25.0,
            quality_reach_divisor: 2000.0,
            quality_cap: 15.0,
            consistency_posts_target: 4.0,
            consistency_factor: 3.33,
            consistency_cap: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Rating {
    /// Maps a total score to its band: 85 S, 70 A, 55 B, 40 C, 25 D, else F.
    ///
    /// The bands are authoritative. A single post scoring 51 therefore rates
    /// C, even though older worked examples quote that case as B.
    pub fn from_score(score: u32) -> Self {
        if score >= 85 {
            Rating::S
        } else if score >= 70 {
            Rating::A
        } else if score >= 55 {
            Rating::B
        } else if score >= 40 {
            Rating::C
        } else if score >= 25 {
            Rating::D
        } else {
            Rating::F
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::S => "Outstanding",
            Rating::A => "Excellent",
            Rating::B => "Good",
            Rating::C => "Fair",
            Rating::D => "Needs work",
            Rating::F => "Getting started",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Rating::S => "purple",
            Rating::A => "blue",
            Rating::B => "green",
            Rating::C => "yellow",
            Rating::D => "orange",
            Rating::F => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KpiTotals {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saves: u64,
    pub reach: u64,
    pub follower_increase: i64,
}

impl KpiTotals {
    pub fn from_analytics(analytics: &[AnalyticsRecord]) -> Self {
        analytics.iter().fold(KpiTotals::default(), |mut totals, record| {
            totals.likes += record.likes;
            totals.comments += record.comments;
            totals.shares += record.shares;
            totals.saves += record.saves;
            totals.reach += record.reach;
            totals.follower_increase += record.follower_increase;
            totals
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PerformanceInput<'a> {
    pub post_count: usize,
    pub analyzed_count: usize,
    pub has_plan: bool,
    pub totals: KpiTotals,
    pub analytics: &'a [AnalyticsRecord],
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub engagement: u32,
    pub growth: u32,
    pub quality: u32,
    pub consistency: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub post_count: usize,
    pub analyzed_count: usize,
    pub has_plan: bool,
    pub avg_engagement_rate: f64,
    pub avg_reach: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceScoreResult {
    pub score: u32,
    pub rating: Rating,
    pub label: String,
    pub color: String,
    pub breakdown: ScoreBreakdown,
    pub kpis: KpiTotals,
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone)]
pub struct PerformanceScorer {
    weights: ScoreWeights,
}

impl Default for PerformanceScorer {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}

impl PerformanceScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, input: &PerformanceInput<'_>) -> PerformanceScoreResult {
        let mut metrics = PerformanceMetrics {
            post_count: input.post_count,
            analyzed_count: input.analyzed_count,
            has_plan: input.has_plan,
            avg_engagement_rate: 0.0,
            avg_reach: 0.0,
        };

        if input.analytics.is_empty() {
            return self.finish(ScoreBreakdown::default(), input.totals, metrics);
        }

        let entries = input.analytics.len() as f64;
        metrics.avg_engagement_rate = input
            .analytics
            .iter()
            .map(AnalyticsRecord::engagement_rate)
            .sum::<f64>()
            / entries;
        metrics.avg_reach = input.analytics.iter().map(|a| a.reach as f64).sum::<f64>() / entries;

        let w = &self.weights;
        let engagement = metrics.avg_engagement_rate * w.engagement_multiplier;
        let growth = input.totals.follower_increase as f64 * w.growth_per_follower;
        let quality = metrics.avg_reach / w.quality_reach_divisor.max(f64::EPSILON);
        let consistency = input.post_count as f64 / w.consistency_posts_target.max(f64::EPSILON)
            * w.consistency_factor;

        // Components are rounded one by one and then summed.
        let breakdown = ScoreBreakdown {
            engagement: round_component(engagement, w.engagement_cap),
            growth: round_component(growth, w.growth_cap),
            quality: round_component(quality, w.quality_cap),
            consistency: round_component(consistency, w.consistency_cap),
        };

        self.finish(breakdown, input.totals, metrics)
    }

    fn finish(
        &self,
        breakdown: ScoreBreakdown,
        kpis: KpiTotals,
        metrics: PerformanceMetrics,
    ) -> PerformanceScoreResult {
        let score = breakdown.engagement + breakdown.growth + breakdown.quality + breakdown.consistency;
        let rating = Rating::from_score(score);
        PerformanceScoreResult {
            score,
            rating,
            label: rating.label().to_string(),
            color: rating.color().to_string(),
            breakdown,
            kpis,
            metrics,
        }
    }
}

fn round_component(value: f64, cap: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.min(cap).max(0.0).round() as u32
}

pub fn calculate_performance_score(input: &PerformanceInput<'_>) -> PerformanceScoreResult {
    PerformanceScorer::default().score(input)
}
