use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{MediaKind, Recommendation},
    services::providers::CompletionProvider,
};

/// Separates the title list from the free-text explanation in model replies
pub const RESPONSE_SEPARATOR: &str = "+++";

/// Builds the single prompt sent for one account and library
pub fn build_prompt(watched: &[String], kind: MediaKind, count: usize) -> String {
    format!(
        "Based on the following {plural} I've watched: {watched}. \
         Please provide new and unique recommendations that are not in this list. \
         I need around {count}. \
         Focus on titles from the last 10 years in similar genres. \
         Only recommend titles with IMDb ratings above 7.0 or Rotten Tomatoes scores above 80%. \
         Prefer titles available on major streaming platforms like Netflix, Amazon Prime, Hulu, Disney+, HBO Max, or Apple TV+. \
         Consider similar genres, themes, and storytelling styles. \
         \n\nIMPORTANT: Format your response EXACTLY as follows:\n\
         Title1, Title2, Title3, Title4, Title5{sep}Brief explanation of recommendations\n\n\
         ONLY provide the title names in the first part, NO descriptions or additional text before the {sep}. \
         Do not include any titles from the input list in your response.",
        plural = kind.plural(),
        watched = watched.join(", "),
        count = count,
        sep = RESPONSE_SEPARATOR,
    )
}

/// Parses `Title1, Title2+++Description` into titles and description
///
/// Only the first separator splits; blank titles are dropped and a missing
/// description becomes the empty string.
pub fn parse_recommendations(raw: &str) -> Recommendation {
    let (list, description) = match raw.split_once(RESPONSE_SEPARATOR) {
        Some((list, rest)) => (list, rest.trim()),
        None => (raw, ""),
    };

    let titles = list
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    Recommendation {
        titles,
        description: description.to_string(),
    }
}

/// Drops recommended titles the account has already watched (case-insensitive)
pub fn exclude_watched(recommendation: &mut Recommendation, watched: &[String]) -> usize {
    let seen: HashSet<String> = watched.iter().map(|t| t.to_lowercase()).collect();
    let before = recommendation.titles.len();
    recommendation
        .titles
        .retain(|t| !seen.contains(&t.to_lowercase()));
    before - recommendation.titles.len()
}

/// Requests recommendations for one account and library
pub async fn request_recommendations(
    provider: &dyn CompletionProvider,
    watched: &[String],
    kind: MediaKind,
    count: usize,
) -> AppResult<Recommendation> {
    let prompt = build_prompt(watched, kind, count);
    tracing::debug!(prompt = %prompt, "Sending recommendation prompt");

    let raw = provider.complete(&prompt).await?;
    tracing::info!(kind = %kind, response = %raw, "Model response received");

    let mut recommendation = parse_recommendations(&raw);
    let dropped = exclude_watched(&mut recommendation, watched);
    if dropped > 0 {
        tracing::info!(dropped, "Removed already-watched titles from recommendations");
    }

    Ok(recommendation)
}
