use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::catalog::{ISSUE_TAXONOMY, PRODUCT_CATALOG};

const SENTIMENT_PROMPT: &str = "You are a sentiment classifier for customer feedback. \
Respond with exactly one word: positive, negative, or neutral. \
Do not add punctuation or any explanation.";

static PRODUCTS_PROMPT: Lazy<String> = Lazy::new(|| {
    format!(
        "You detect which products are mentioned in customer feedback. \
Known products: {}. \
Respond with a comma-separated list of the mentioned products, using the names exactly as listed. \
If no product from the list is mentioned, respond with exactly: none",
        PRODUCT_CATALOG.join(", ")
    )
});

static ISSUES_PROMPT: Lazy<String> = Lazy::new(|| {
    format!(
        "You categorize customer feedback into one issue category. \
Categories: {}. \
Respond with exactly one category name from the list and nothing else.",
        ISSUE_TAXONOMY.join(", ")
    )
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Sentiment,
    Products,
    Issues,
}

impl Classification {
    pub const ALL: [Classification; 3] = [Self::Sentiment, Self::Products, Self::Issues];

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Sentiment => SENTIMENT_PROMPT,
            Self::Products => PRODUCTS_PROMPT.as_str(),
            Self::Issues => ISSUES_PROMPT.as_str(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sentiment => "sentiment",
            Self::Products => "products",
            Self::Issues => "issues",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
