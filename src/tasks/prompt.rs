use chrono::{Datelike, NaiveDate};

use crate::tasks::days::weekday_label;
use crate::{PostType, StrategyPlan};

const RESPONSE_FORMAT: &str = r#"Return a single JSON object with these fields:
- title (short working title)
- content (the full caption or script, ready to post)
- hashtags (array of 5-10 tags without the leading #)
Output JSON only, no markdown or commentary."#;

fn post_type_brief(post_type: PostType) -> &'static str {
    match post_type {
        PostType::Feed => {
            "Write an Instagram feed post caption: a strong first line, 3-5 short paragraphs, and a clear call to save or comment."
        }
        PostType::Reel => {
            "Write a short-form reel script: a hook in the first 2 seconds, 3-5 scenes with on-screen text, and a caption."
        }
        PostType::Story => {
            "Write an Instagram story sequence of 2-4 frames with one interactive element (poll, question or quiz)."
        }
    }
}

/// Prompt for one plan-driven post, seeded from the plan's persona.
pub fn build_generation_prompt(
    plan: &StrategyPlan,
    post_type: PostType,
    date: NaiveDate,
    recommended_time: Option<&str>,
) -> String {
    let persona = &plan.ai_persona;
    let mut lines = vec![format!(
        "You are the content writer for an account posting on {} {}.",
        weekday_label(date.weekday()),
        date.format("%Y-%m-%d")
    )];

    if !plan.category.trim().is_empty() {
        lines.push(format!("Account category: {}", plan.category.trim()));
    }
    if !plan.target_audience.trim().is_empty() {
        lines.push(format!("Target audience: {}", plan.target_audience.trim()));
    }
    if !persona.tone.trim().is_empty() {
        lines.push(format!("Tone: {}", persona.tone.trim()));
    }
    if !persona.style.trim().is_empty() {
        lines.push(format!("Style: {}", persona.style.trim()));
    }
    if !persona.personality.trim().is_empty() {
        lines.push(format!("Personality: {}", persona.personality.trim()));
    }
    let interests: Vec<&str> = persona
        .interests
        .iter()
        .map(|interest| interest.trim())
        .filter(|interest| !interest.is_empty())
        .collect();
    if !interests.is_empty() {
        lines.push(format!("Interests: {}", interests.join(", ")));
    }
    if !plan.strategy.trim().is_empty() {
        lines.push(format!("Growth strategy: {}", plan.strategy.trim()));
    }
    if let Some(time) = recommended_time {
        lines.push(format!("It will be published around {}.", time));
    }

    lines.push(post_type_brief(post_type).to_string());
    lines.push(RESPONSE_FORMAT.to_string());
    lines.join("\n")
}

/// Generic feed-post prompt used when the plan yields nothing to do.
pub fn fallback_prompt(date: NaiveDate) -> String {
    [
        format!(
            "You are a social media content writer. Suggest one feed post for {} {} that would resonate with a general audience and invite saves.",
            weekday_label(date.weekday()),
            date.format("%Y-%m-%d")
        ),
        post_type_brief(PostType::Feed).to_string(),
        RESPONSE_FORMAT.to_string(),
    ]
    .join("\n")
}
