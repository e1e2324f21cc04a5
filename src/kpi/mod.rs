pub mod audience;
pub mod dashboard;
pub mod hashtags;
pub mod performance;
pub mod time_slot;

pub use audience::{calculate_audience_breakdown, AudienceBreakdown};
pub use dashboard::{
    build_dashboard, normalize_posts, DashboardBuilder, GoalProgress, KpiDashboard, KpiTrends,
    RawDataBundle, ReportingPeriod,
};
pub use hashtags::{calculate_hashtag_stats, normalize_hashtags, top_hashtags, HashtagStat};
pub use performance::{
    calculate_performance_score, KpiTotals, PerformanceInput, PerformanceScoreResult,
    PerformanceScorer, Rating, ScoreBreakdown, ScoreWeights,
};
pub use time_slot::{analyze_time_slots, TimeSlotEntry, TimeSlotKpiAnalysis, TIME_SLOTS};

/// Mean that reports 0 for an empty set instead of NaN.
pub(crate) fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
