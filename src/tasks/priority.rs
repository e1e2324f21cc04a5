use crate::tasks::{Priority, TaskType, TodayTask};
use crate::PostType;

/// Orders tasks high > medium > low. The sort is stable, so tasks within a
/// tier keep the order they were derived in.
pub fn rank_tasks(mut tasks: Vec<TodayTask>) -> Vec<TodayTask> {
    tasks.sort_by_key(|task| task.priority.rank());
    tasks
}

/// Priority of a post that still has to be written. Reels and feed posts are
/// high when their type carries the plan's strongest follower effect.
pub fn generated_post_priority(post_type: PostType, strongest: &[PostType]) -> Priority {
    match post_type {
        PostType::Story => Priority::Medium,
        PostType::Feed | PostType::Reel => {
            if strongest.contains(&post_type) {
                Priority::High
            } else {
                Priority::Medium
            }
        }
    }
}

pub fn base_priority(task_type: TaskType) -> Priority {
    match task_type {
        TaskType::Feed | TaskType::Reel | TaskType::Story => Priority::High,
        TaskType::Comment => Priority::Low,
    }
}
