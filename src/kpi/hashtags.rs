use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{PostWithAnalytics, RawHashtags};

pub const DEFAULT_TOP_HASHTAGS: usize = 10;

static HASHTAG_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[^\s#,、，]+").expect("Failed to compile hashtag regex"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashtagStat {
    pub hashtag: String,
    pub count: usize,
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ',' | '、' | '，')
}

/// Splits one stored hashtag entry into bare tags.
///
/// An entry holding several `#token`s is cut at every `#`; anything else has
/// its leading `#`s stripped and is split on whitespace and commas. Case is
/// preserved and empty pieces are dropped.
pub fn split_hashtag_entry(entry: &str) -> Vec<String> {
    let pieces: Vec<&str> = if HASHTAG_TOKEN.find_iter(entry).count() > 1 {
        entry.split('#').collect()
    } else {
        vec![entry.trim_start().trim_start_matches('#')]
    };

    pieces
        .into_iter()
        .flat_map(|piece| piece.split(is_separator))
        .map(|token| token.trim_start_matches('#').trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn normalize_hashtags(raw: &RawHashtags) -> Vec<String> {
    match raw {
        RawHashtags::List(entries) => entries
            .iter()
            .flat_map(|entry| split_hashtag_entry(entry))
            .collect(),
        RawHashtags::Text(text) => split_hashtag_entry(text),
    }
}

/// Counts tags across posts and returns the `limit` most frequent.
/// Equal counts keep the order in which the tags were first seen.
pub fn top_hashtags(posts: &[PostWithAnalytics], limit: usize) -> Vec<HashtagStat> {
    let mut stats: Vec<HashtagStat> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tag in posts.iter().flat_map(|post| post.hashtags.iter()) {
        match index.get(tag) {
            Some(&position) => stats[position].count += 1,
            None => {
                index.insert(tag.clone(), stats.len());
                stats.push(HashtagStat {
                    hashtag: tag.clone(),
                    count: 1,
                });
            }
        }
    }

    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats.truncate(limit);
    stats
}

pub fn calculate_hashtag_stats(posts: &[PostWithAnalytics]) -> Vec<HashtagStat> {
    top_hashtags(posts, DEFAULT_TOP_HASHTAGS)
}
