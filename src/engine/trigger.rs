//! Activity text scanning.
//!
//! Every activity is normalised once before it meets any item: lower-cased, whitespace
//! collapsed, and kept in hyphen/space/joined forms (see [`NormalizedText`]). The scan also
//! records the alphanumeric tokens of the text so canonical game-object ids can be looked up
//! without another pass over the string.
//!
//! `details` is appended to `text`; feeds put the interesting half of a drop message in either.

use std::collections::HashSet;

use crate::rules::helpers::NormalizedText;

#[derive(Debug, Clone)]
pub struct ActivityText {
    pub text: NormalizedText,
    pub tokens: HashSet<String>,
}

impl ActivityText {
    pub fn scan(text: &str, details: Option<&str>) -> Self {
        let combined = match details {
            Some(details) if !details.trim().is_empty() => format!("{text} {details}"),
            _ => text.to_string(),
        };
        let text = NormalizedText::new(&combined);
        let tokens = text
            .as_str()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        ActivityText { text, tokens }
    }
}
