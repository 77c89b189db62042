use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    /// Maps an exact sentiment word (any case) to its label. Anything else is
    /// out of grammar and yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }

    /// Presentation hint carried on the wire for existing consumers.
    pub fn color(self) -> &'static str {
        match self {
            Self::Positive => "green",
            Self::Negative => "red",
            Self::Neutral => "gray",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentLabel {
    pub label: String,
    pub color: String,
}

impl From<Sentiment> for SentimentLabel {
    fn from(value: Sentiment) -> Self {
        Self {
            label: value.label().to_string(),
            color: value.color().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    text: String,
}

impl AnalysisRequest {
    /// Trims the input and rejects blank text. Returns `None` when nothing is
    /// left to classify.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(Self {
            text: trimmed.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: SentimentLabel,
    pub products: Vec<String>,
    pub issues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_parses_back_to_itself() {
        for sentiment in Sentiment::ALL {
            assert_eq!(Sentiment::parse(sentiment.label()), Some(sentiment));
            assert_eq!(
                Sentiment::parse(&sentiment.label().to_uppercase()),
                Some(sentiment)
            );

            let wire = SentimentLabel::from(sentiment);
            assert_eq!(wire.label, sentiment.label());
            assert_eq!(wire.color, sentiment.color());
        }
    }

    #[test]
    fn colors_are_distinct() {
        let [a, b, c] = Sentiment::ALL.map(Sentiment::color);
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn blank_request_text_is_refused() {
        assert!(AnalysisRequest::new(" \n\t").is_none());
        assert_eq!(AnalysisRequest::new(" D1 ").unwrap().text(), "D1");
    }
}
