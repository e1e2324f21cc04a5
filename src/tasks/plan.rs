use chrono::{NaiveDate, Weekday};
use thiserror::Error;

use crate::kpi::time_slot::parse_hour;
use crate::tasks::days::{week_index, weekday_from_label, weekday_label};
use crate::{PostType, StrategyPlan};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("plan is missing {0}")]
    MissingField(&'static str),

    #[error("plan has an invalid weekly count for {0:?}")]
    InvalidQuota(PostType),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaSpec {
    pub post_type: PostType,
    pub weekly_count: f64,
    pub follower_effect: f64,
}

/// A plan whose numeric fields have been checked.
#[derive(Debug, Clone)]
pub struct ValidPlan<'a> {
    pub plan: &'a StrategyPlan,
    pub target_followers: u64,
    pub current_followers: u64,
    pub quotas: Vec<QuotaSpec>,
}

impl<'a> ValidPlan<'a> {
    pub fn quota(&self, post_type: PostType) -> Option<&QuotaSpec> {
        self.quotas.iter().find(|quota| quota.post_type == post_type)
    }

    /// Whether `date` falls inside the plan period. Open ends always match.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.plan.period_start.map_or(true, |start| date >= start)
            && self.plan.period_end.map_or(true, |end| date <= end)
    }

    /// Post types sharing the largest positive expected follower effect.
    pub fn strongest_types(&self) -> Vec<PostType> {
        let best = self
            .quotas
            .iter()
            .map(|quota| quota.follower_effect)
            .fold(0.0_f64, f64::max);
        if best <= 0.0 {
            return Vec::new();
        }
        self.quotas
            .iter()
            .filter(|quota| quota.follower_effect >= best)
            .map(|quota| quota.post_type)
            .collect()
    }
}

impl StrategyPlan {
    pub fn validate(&self) -> Result<ValidPlan<'_>, PlanError> {
        let target_followers = self
            .target_followers
            .ok_or(PlanError::MissingField("targetFollowers"))?;
        let current_followers = self
            .current_followers
            .ok_or(PlanError::MissingField("currentFollowers"))?;

        let mut quotas: Vec<QuotaSpec> = Vec::new();
        for quota in &self.post_quotas {
            let weekly_count = quota
                .weekly_count
                .ok_or(PlanError::MissingField("weeklyCount"))?;
            if !weekly_count.is_finite() || weekly_count < 0.0 {
                return Err(PlanError::InvalidQuota(quota.post_type));
            }
            let follower_effect = quota
                .follower_effect
                .filter(|value| value.is_finite())
                .unwrap_or(0.0);

            // A repeated post type adds to the first entry.
            match quotas.iter_mut().find(|q| q.post_type == quota.post_type) {
                Some(existing) => {
                    existing.weekly_count += weekly_count;
                    existing.follower_effect = existing.follower_effect.max(follower_effect);
                }
                None => quotas.push(QuotaSpec {
                    post_type: quota.post_type,
                    weekly_count,
                    follower_effect,
                }),
            }
        }

        Ok(ValidPlan {
            plan: self,
            target_followers,
            current_followers,
            quotas,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CadenceEntry {
    pub post_type: PostType,
    pub count: u32,
    /// "HH:MM" from an explicit schedule entry.
    pub time: Option<String>,
    pub reason: String,
}

/// Expected posts per weekday, Monday first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeeklyCadence {
    days: [Vec<CadenceEntry>; 7],
}

impl WeeklyCadence {
    pub fn from_plan(plan: &ValidPlan<'_>) -> Self {
        let mut cadence = WeeklyCadence::default();

        for post_type in PostType::ALL {
            let scheduled: Vec<(Weekday, Option<String>)> = plan
                .plan
                .posting_schedule
                .iter()
                .filter(|entry| entry.post_type == post_type)
                .filter_map(|entry| match weekday_from_label(&entry.day) {
                    Some(weekday) => Some((weekday, valid_time(entry.time.as_deref()))),
                    None => {
                        tracing::debug!(day = %entry.day, "ignoring unknown day label in plan");
                        None
                    }
                })
                .collect();

            if !scheduled.is_empty() {
                for (weekday, time) in scheduled {
                    cadence.add_scheduled(weekday, post_type, time);
                }
                continue;
            }

            if let Some(quota) = plan.quota(post_type) {
                for day in 0..7 {
                    let count = spread_count(quota.weekly_count, day);
                    if count > 0 {
                        cadence.days[day].push(CadenceEntry {
                            post_type,
                            count,
                            time: None,
                            reason: format!(
                                "Plan targets {} {} per week",
                                format_quota(quota.weekly_count),
                                post_type.plural_name()
                            ),
                        });
                    }
                }
            }
        }

        for day in cadence.days.iter_mut() {
            day.sort_by_key(|entry| entry.post_type);
        }
        cadence
    }

    fn add_scheduled(&mut self, weekday: Weekday, post_type: PostType, time: Option<String>) {
        let day = &mut self.days[week_index(weekday)];
        match day.iter_mut().find(|entry| entry.post_type == post_type) {
            Some(entry) => {
                entry.count += 1;
                if entry.time.is_none() {
                    entry.time = time;
                }
            }
            None => day.push(CadenceEntry {
                post_type,
                count: 1,
                time,
                reason: format!(
                    "Plan schedules a {} every {}",
                    post_type.display_name(),
                    weekday_label(weekday)
                ),
            }),
        }
    }

    pub fn due_on(&self, weekday: Weekday) -> &[CadenceEntry] {
        &self.days[week_index(weekday)]
    }
}

/// Posts due on `day` (0 = Monday) when `weekly` posts are spread over the
/// week. The running total by the end of day d is ceil(weekly * (d+1) / 7),
/// so any fractional remainder lands on the earliest days.
pub fn spread_count(weekly: f64, day: usize) -> u32 {
    if !weekly.is_finite() || weekly <= 0.0 || day > 6 {
        return 0;
    }
    let cumulative = |days: usize| -> u32 {
        let expected = weekly * days as f64 / 7.0;
        (expected - 1e-9).ceil().max(0.0) as u32
    };
    cumulative(day + 1).saturating_sub(cumulative(day))
}

fn valid_time(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    parse_hour(value).map(|_| value.to_string())
}

fn format_quota(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{:.1}", value)
    }
}
