use crate::catalog::{is_issue_label, mentions_product, ISSUE_FALLBACK};
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, Sentiment, SentimentLabel};
use crate::prompts::Classification;

/// Out-of-grammar answers are rejected instead of defaulted.
pub fn normalize_sentiment(completion: &str) -> Result<Sentiment, AnalysisError> {
    Sentiment::parse(completion).ok_or_else(|| AnalysisError::Normalization {
        axis: Classification::Sentiment,
        completion: completion.to_string(),
    })
}

pub fn normalize_products(completion: &str) -> Vec<String> {
    let trimmed = completion.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|segment| mentions_product(segment))
        .map(ToString::to_string)
        .collect()
}

pub fn normalize_issues(completion: &str) -> Vec<String> {
    let trimmed = completion.trim();
    let label = if is_issue_label(trimmed) {
        trimmed
    } else {
        ISSUE_FALLBACK
    };
    vec![label.to_string()]
}

pub fn assemble(sentiment: Sentiment, products: Vec<String>, issues: Vec<String>) -> AnalysisResult {
    AnalysisResult {
        sentiment: SentimentLabel::from(sentiment),
        products,
        issues,
    }
}
