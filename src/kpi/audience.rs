use serde::{Deserialize, Serialize};

use crate::kpi::mean;
use crate::{AgeShares, AudienceData, GenderShares, PostWithAnalytics};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudienceBreakdown {
    pub gender: GenderShares,
    pub age: AgeShares,
    /// Number of posts that carried audience data.
    #[serde(skip_serializing_if = "is_zero", default)]
    pub sample_size: usize,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// Averages demographic shares over the posts that actually report an
/// audience. Posts without audience data do not dilute the means.
pub fn calculate_audience_breakdown(posts: &[PostWithAnalytics]) -> AudienceBreakdown {
    let audiences: Vec<&AudienceData> = posts
        .iter()
        .filter_map(|post| post.analytics_summary.as_ref()?.audience.as_ref())
        .collect();

    let count = audiences.len();
    if count == 0 {
        return AudienceBreakdown::default();
    }

    let sum = |pick: fn(&AudienceData) -> f64| audiences.iter().map(|audience| pick(audience)).sum::<f64>();

    AudienceBreakdown {
        gender: GenderShares {
            male: mean(sum(|a| a.gender.male), count),
            female: mean(sum(|a| a.gender.female), count),
            other: mean(sum(|a| a.gender.other), count),
        },
        age: AgeShares {
            age_18_24: mean(sum(|a| a.age.age_18_24), count),
            age_25_34: mean(sum(|a| a.age.age_25_34), count),
            age_35_44: mean(sum(|a| a.age.age_35_44), count),
            age_45_54: mean(sum(|a| a.age.age_45_54), count),
        },
        sample_size: count,
    }
}
