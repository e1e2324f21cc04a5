use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AppConfig;
use crate::kpi::audience::{calculate_audience_breakdown, AudienceBreakdown};
use crate::kpi::hashtags::{top_hashtags, HashtagStat, DEFAULT_TOP_HASHTAGS};
use crate::kpi::performance::{
    KpiTotals, PerformanceInput, PerformanceScoreResult, PerformanceScorer, ScoreWeights,
};
use crate::kpi::time_slot::{analyze_time_slots, TimeSlotKpiAnalysis};
use crate::{AnalyticsRecord, PostRecord, PostWithAnalytics, StrategyPlan};

/// Billing-cycle window, resolved by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Everything the dashboard needs, already fetched for one user and period.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawDataBundle {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub period: Option<ReportingPeriod>,
    #[serde(default)]
    pub posts: Vec<PostRecord>,
    #[serde(default)]
    pub analytics: Vec<AnalyticsRecord>,
    #[serde(default)]
    pub plan: Option<StrategyPlan>,
    /// Totals of the previous period, taken from a stored snapshot.
    #[serde(default)]
    pub previous_totals: Option<KpiTotals>,
}

/// Percent change against the previous period; `None` where the previous
/// value was zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiTrends {
    pub likes: Option<f64>,
    pub comments: Option<f64>,
    pub shares: Option<f64>,
    pub saves: Option<f64>,
    pub reach: Option<f64>,
    pub follower_increase: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub target_followers: u64,
    pub current_followers: i64,
    pub remaining_followers: u64,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiDashboard {
    pub user_id: String,
    pub period: Option<ReportingPeriod>,
    pub post_count: usize,
    pub analyzed_count: usize,
    pub totals: KpiTotals,
    pub time_slots: TimeSlotKpiAnalysis,
    pub hashtag_stats: Vec<HashtagStat>,
    pub audience: AudienceBreakdown,
    pub performance: PerformanceScoreResult,
    pub trends: Option<KpiTrends>,
    pub goal_progress: Option<GoalProgress>,
}

/// Joins posts to their analytics by post id and normalizes hashtags.
///
/// When several analytics records point at one post, the one with the latest
/// `published_at` wins; ties go to the later record.
pub fn normalize_posts(posts: &[PostRecord], analytics: &[AnalyticsRecord]) -> Vec<PostWithAnalytics> {
    let mut latest: HashMap<&str, &AnalyticsRecord> = HashMap::new();
    for record in analytics {
        match latest.get(record.post_id.as_str()) {
            Some(existing) if existing.published_at > record.published_at => {}
            _ => {
                latest.insert(record.post_id.as_str(), record);
            }
        }
    }

    posts
        .iter()
        .map(|post| {
            let summary = latest.get(post.id.as_str()).map(|record| (*record).clone());
            PostWithAnalytics::from_parts(post, summary)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct DashboardBuilder {
    scorer: PerformanceScorer,
    hashtag_limit: usize,
}

impl Default for DashboardBuilder {
    fn default() -> Self {
        Self::new(ScoreWeights::default(), DEFAULT_TOP_HASHTAGS)
    }
}

impl DashboardBuilder {
    pub fn new(weights: ScoreWeights, hashtag_limit: usize) -> Self {
        Self {
            scorer: PerformanceScorer::new(weights),
            hashtag_limit,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.scoring.clone(), config.hashtags.top_limit)
    }

    pub fn build(&self, bundle: &RawDataBundle) -> KpiDashboard {
        let posts = normalize_posts(&bundle.posts, &bundle.analytics);
        // One record per joined post: duplicates and orphans are already gone.
        let analytics: Vec<AnalyticsRecord> = posts
            .iter()
            .filter_map(|post| post.analytics_summary.clone())
            .collect();
        let analyzed_count = analytics.len();
        let totals = KpiTotals::from_analytics(&analytics);

        let time_slots = analyze_time_slots(&posts);
        let hashtag_stats = top_hashtags(&posts, self.hashtag_limit);
        let audience = calculate_audience_breakdown(&posts);
        let performance = self.scorer.score(&PerformanceInput {
            post_count: posts.len(),
            analyzed_count,
            has_plan: bundle.plan.is_some(),
            totals,
            analytics: &analytics,
        });

        tracing::debug!(
            user_id = %bundle.user_id,
            posts = posts.len(),
            analyzed = analyzed_count,
            score = performance.score,
            "built KPI dashboard"
        );

        KpiDashboard {
            user_id: bundle.user_id.clone(),
            period: bundle.period,
            post_count: posts.len(),
            analyzed_count,
            totals,
            time_slots,
            hashtag_stats,
            audience,
            performance,
            trends: bundle.previous_totals.map(|previous| compute_trends(&totals, &previous)),
            goal_progress: bundle
                .plan
                .as_ref()
                .and_then(|plan| goal_progress(plan, totals.follower_increase)),
        }
    }
}

pub fn build_dashboard(bundle: &RawDataBundle) -> KpiDashboard {
    DashboardBuilder::default().build(bundle)
}

pub fn compute_trends(current: &KpiTotals, previous: &KpiTotals) -> KpiTrends {
    KpiTrends {
        likes: percent_change(current.likes as f64, previous.likes as f64),
        comments: percent_change(current.comments as f64, previous.comments as f64),
        shares: percent_change(current.shares as f64, previous.shares as f64),
        saves: percent_change(current.saves as f64, previous.saves as f64),
        reach: percent_change(current.reach as f64, previous.reach as f64),
        follower_increase: percent_change(
            current.follower_increase as f64,
            previous.follower_increase as f64,
        ),
    }
}

fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous.abs() * 100.0)
}

fn goal_progress(plan: &StrategyPlan, follower_increase: i64) -> Option<GoalProgress> {
    let target = plan.target_followers?;
    let start = plan.current_followers?;
    let current = start as i64 + follower_increase;
    let progress_percent = if target == 0 {
        100.0
    } else {
        (current as f64 / target as f64 * 100.0).clamp(0.0, 100.0)
    };
    let remaining_followers = (target as i64 - current).max(0) as u64;
    Some(GoalProgress {
        target_followers: target,
        current_followers: current,
        remaining_followers,
        progress_percent,
    })
}
