use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tasks::derive::{DeriveTodayTasksOutput, GenerationRequest};
use crate::tasks::priority::rank_tasks;
use crate::tasks::{TaskType, TodayTask};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GenerationOutcome {
    Generated(GeneratedContent),
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MergedTasks {
    pub today: Vec<TodayTask>,
    pub tomorrow: Vec<TodayTask>,
}

impl GenerationRequest {
    /// The task this request stands for, before any content is generated.
    pub fn to_task(&self) -> TodayTask {
        TodayTask {
            id: self.id.clone(),
            task_type: TaskType::from(self.post_type),
            title: self.title.clone(),
            description: format!(
                "Write and schedule a {} for {}.",
                self.post_type.display_name(),
                self.target_date.format("%Y-%m-%d")
            ),
            recommended_time: self.recommended_time.clone(),
            content: None,
            hashtags: None,
            count: None,
            reason: self.reason.clone(),
            priority: self.priority,
        }
    }

    fn resolve(&self, outcome: Option<&GenerationOutcome>) -> TodayTask {
        let mut task = self.to_task();
        match outcome {
            Some(GenerationOutcome::Generated(generated)) => {
                if let Some(title) = generated.title.as_deref().map(str::trim) {
                    if !title.is_empty() {
                        task.description = format!("{} ({})", task.description, title);
                    }
                }
                task.content = Some(generated.content.clone());
                if !generated.hashtags.is_empty() {
                    task.hashtags = Some(generated.hashtags.clone());
                }
            }
            Some(GenerationOutcome::Failed { reason }) => {
                tracing::debug!(request_id = %self.id, %reason, "generation failed, keeping bare task");
            }
            None => {}
        }
        task
    }
}

/// Combines derived tasks with whatever generation results the caller has.
///
/// Today's list is base tasks, then today's AI tasks in request order, then
/// the fallback, ranked by priority. Requests without a result still become
/// tasks, just without content.
pub fn merge_generated_tasks(
    output: &DeriveTodayTasksOutput,
    outcomes: &HashMap<String, GenerationOutcome>,
) -> MergedTasks {
    let mut today: Vec<TodayTask> = output.base_tasks.clone();
    today.extend(
        output
            .ai_requests
            .iter()
            .chain(output.fallback_request.iter())
            .map(|request| request.resolve(outcomes.get(&request.id))),
    );

    let tomorrow: Vec<TodayTask> = output
        .tomorrow_requests
        .iter()
        .map(|request| request.resolve(outcomes.get(&request.id)))
        .collect();

    MergedTasks {
        today: rank_tasks(today),
        tomorrow: rank_tasks(tomorrow),
    }
}
