use serde::{Deserialize, Serialize};

use crate::kpi::mean;
use crate::{AnalyticsRecord, PostType, PostWithAnalytics};

/// One of the fixed daily posting windows. `end_hour` is exclusive; a window
/// whose start is after its end wraps across midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlotWindow {
    pub label: &'static str,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeSlotWindow {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    pub fn range_label(&self) -> String {
        format!("{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

pub const TIME_SLOTS: [TimeSlotWindow; 6] = [
    TimeSlotWindow {
        label: "early-morning",
        start_hour: 6,
        end_hour: 9,
    },
    TimeSlotWindow {
        label: "morning",
        start_hour: 9,
        end_hour: 12,
    },
    TimeSlotWindow {
        label: "midday",
        start_hour: 12,
        end_hour: 15,
    },
    TimeSlotWindow {
        label: "afternoon",
        start_hour: 15,
        end_hour: 18,
    },
    TimeSlotWindow {
        label: "evening",
        start_hour: 18,
        end_hour: 21,
    },
    TimeSlotWindow {
        label: "late-night",
        start_hour: 21,
        end_hour: 6,
    },
];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostTypeSlotStats {
    pub post_count: usize,
    pub avg_likes: f64,
    pub avg_reach: f64,
    pub avg_engagement_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotEntry {
    pub label: String,
    pub time_range: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub posts_in_range: usize,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub avg_shares: f64,
    pub avg_saves: f64,
    pub avg_reach: f64,
    pub avg_follower_increase: f64,
    pub avg_engagement_rate: f64,
    pub feed: PostTypeSlotStats,
    pub reel: PostTypeSlotStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotKpiAnalysis {
    pub slots: Vec<TimeSlotEntry>,
    /// Label of the non-empty slot with the highest average engagement rate.
    pub best_slot: Option<String>,
    pub analyzed_posts: usize,
}

/// Extracts the hour from an "H:M", "HH:MM" or "HH:MM:SS" string.
///
/// A minute field is required: a bare "12" is rejected so that stray numbers
/// are not read as publish times. Hours above 23 and minutes above 59 are
/// rejected too.
pub fn parse_hour(value: &str) -> Option<u32> {
    let mut parts = value.trim().split(':');
    let hour_part = parts.next()?.trim();
    let minute_part = parts.next()?.trim();
    if hour_part.is_empty() || hour_part.len() > 2 {
        return None;
    }
    if minute_part.is_empty() || minute_part.len() > 2 {
        return None;
    }
    let hour = hour_part.parse::<u32>().ok()?;
    let minute = minute_part.parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour)
}

#[derive(Default)]
struct SlotAccumulator {
    count: usize,
    likes: f64,
    comments: f64,
    shares: f64,
    saves: f64,
    reach: f64,
    follower_increase: f64,
    engagement_rate: f64,
}

impl SlotAccumulator {
    fn add(&mut self, analytics: &AnalyticsRecord) {
        self.count += 1;
        self.likes += analytics.likes as f64;
        self.comments += analytics.comments as f64;
        self.shares += analytics.shares as f64;
        self.saves += analytics.saves as f64;
        self.reach += analytics.reach as f64;
        self.follower_increase += analytics.follower_increase as f64;
        self.engagement_rate += analytics.engagement_rate();
    }

    fn type_stats(&self) -> PostTypeSlotStats {
        PostTypeSlotStats {
            post_count: self.count,
            avg_likes: mean(self.likes, self.count),
            avg_reach: mean(self.reach, self.count),
            avg_engagement_rate: mean(self.engagement_rate, self.count),
        }
    }
}

pub fn analyze_time_slots(posts: &[PostWithAnalytics]) -> TimeSlotKpiAnalysis {
    let timed: Vec<(u32, PostType, &AnalyticsRecord)> = posts
        .iter()
        .filter_map(|post| {
            let analytics = post.analytics_summary.as_ref()?;
            let raw = analytics.published_time.as_deref()?;
            match parse_hour(raw) {
                Some(hour) => Some((hour, post.post_type, analytics)),
                None => {
                    tracing::debug!(post_id = %post.id, published_time = raw, "skipping unparsable publish time");
                    None
                }
            }
        })
        .collect();

    let slots: Vec<TimeSlotEntry> = TIME_SLOTS
        .iter()
        .map(|window| {
            let mut all = SlotAccumulator::default();
            let mut feed = SlotAccumulator::default();
            let mut reel = SlotAccumulator::default();

            for (hour, post_type, analytics) in &timed {
                if !window.contains(*hour) {
                    continue;
                }
                all.add(analytics);
                match post_type {
                    PostType::Feed => feed.add(analytics),
                    PostType::Reel => reel.add(analytics),
                    PostType::Story => {}
                }
            }

            TimeSlotEntry {
                label: window.label.to_string(),
                time_range: window.range_label(),
                start_hour: window.start_hour,
                end_hour: window.end_hour,
                posts_in_range: all.count,
                avg_likes: mean(all.likes, all.count),
                avg_comments: mean(all.comments, all.count),
                avg_shares: mean(all.shares, all.count),
                avg_saves: mean(all.saves, all.count),
                avg_reach: mean(all.reach, all.count),
                avg_follower_increase: mean(all.follower_increase, all.count),
                avg_engagement_rate: mean(all.engagement_rate, all.count),
                feed: feed.type_stats(),
                reel: reel.type_stats(),
            }
        })
        .collect();

    let mut best: Option<&TimeSlotEntry> = None;
    for slot in slots.iter().filter(|slot| slot.posts_in_range > 0) {
        match best {
            Some(current) if current.avg_engagement_rate >= slot.avg_engagement_rate => {}
            _ => best = Some(slot),
        }
    }
    let best_slot = best.map(|slot| slot.label.clone());

    TimeSlotKpiAnalysis {
        best_slot,
        analyzed_posts: timed.len(),
        slots,
    }
}
