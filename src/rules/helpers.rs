/// Lower-case, turn non-breaking spaces into plain spaces and collapse runs of whitespace.
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase().replace('\u{a0}', " ");
    regex!(r"\s+").replace_all(lower.trim(), " ").into_owned()
}

/// The spellings a term may take in game text: as written, hyphens as spaces, spaces as
/// hyphens, and with both removed ("dragon-hide" / "dragon hide" / "dragonhide").
pub fn punctuation_forms(term: &str) -> Vec<String> {
    let mut forms = vec![term.to_string()];
    if term.contains('-') || term.contains(' ') {
        for form in [term.replace('-', " "), term.replace(' ', "-"), term.replace(['-', ' '], "")] {
            if !form.is_empty() && !forms.contains(&form) {
                forms.push(form);
            }
        }
    }
    forms
}

/// True when `needle` occurs in `haystack` with no alphanumeric neighbour on either side.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    find_phrase(haystack, needle, 0).is_some()
}

/// Replace every whole-phrase occurrence of `from` with `to`. `None` when nothing matched.
pub fn replace_phrase(s: &str, from: &str, to: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut cursor = 0;
    let mut replaced = false;
    while let Some(start) = find_phrase(s, from, cursor) {
        out.push_str(&s[cursor..start]);
        out.push_str(to);
        cursor = start + from.len();
        replaced = true;
    }
    if !replaced {
        return None;
    }
    out.push_str(&s[cursor..]);
    Some(out)
}

/// True when any word of `words` appears as a whole phrase in `s`.
pub fn mentions_any(s: &str, words: &[String]) -> bool {
    words.iter().any(|w| contains_phrase(s, w))
}

/// Normalised text kept in every punctuation form a term may be compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    forms: Vec<String>,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        let base = normalize(text);
        let mut forms = vec![base.clone()];
        if base.contains('-') {
            let spaced = regex!(r"\s+").replace_all(&base.replace('-', " "), " ").into_owned();
            for form in [spaced, base.replace('-', "")] {
                if !forms.contains(&form) {
                    forms.push(form);
                }
            }
        }
        NormalizedText { forms }
    }

    /// The plain normalised text.
    pub fn as_str(&self) -> &str {
        &self.forms[0]
    }

    pub fn is_empty(&self) -> bool {
        self.forms[0].is_empty()
    }

    /// Substring search over every form of the text and of `term`.
    pub fn contains(&self, term: &str) -> bool {
        punctuation_forms(term).iter().any(|t| self.forms.iter().any(|f| f.contains(t.as_str())))
    }

    /// Whole-phrase search over every form of the text and of `term`.
    pub fn contains_word(&self, term: &str) -> bool {
        punctuation_forms(term).iter().any(|t| self.forms.iter().any(|f| contains_phrase(f, t)))
    }

    pub fn contains_any(&self, terms: &[String]) -> bool {
        terms.iter().any(|t| self.contains(t))
    }
}

fn find_phrase(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    let mut offset = from;
    while let Some(pos) = haystack[offset..].find(needle) {
        let start = offset + pos;
        let end = start + needle.len();
        let before_ok = haystack[..start].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(start);
        }
        offset = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  I found a\u{a0}Dragon   Claw "), "i found a dragon claw");
    }

    #[test]
    fn punctuation_forms_cover_hyphen_space_and_joined() {
        let forms = punctuation_forms("dragon-hide");
        assert!(forms.contains(&"dragon-hide".to_string()));
        assert!(forms.contains(&"dragon hide".to_string()));
        assert!(forms.contains(&"dragonhide".to_string()));
        assert_eq!(punctuation_forms("whip"), vec!["whip".to_string()]);
    }

    #[test]
    fn contains_phrase_respects_word_edges() {
        assert!(contains_phrase("got an aby whip!", "aby whip"));
        assert!(!contains_phrase("a dragon longsword", "sword"));
        assert!(contains_phrase("sword", "sword"));
        assert!(!contains_phrase("annexed", "nex"));
    }

    #[test]
    fn normalized_text_absorbs_hyphens() {
        let text = NormalizedText::new("Received a Zaryte-Bow");
        assert!(text.contains("zaryte bow"));
        assert!(text.contains("zarytebow"));
        assert!(NormalizedText::new("got a dragonhide body").contains("dragon-hide"));
        assert!(!NormalizedText::new("got a dragon hide body").contains_word("dragonhide"));
    }

    #[test]
    fn replace_phrase_replaces_all_whole_occurrences() {
        assert_eq!(replace_phrase("rune 2h sword", "sword", "scim").as_deref(), Some("rune 2h scim"));
        assert_eq!(replace_phrase("dragon longsword", "sword", "scim"), None);
        assert_eq!(replace_phrase("r r", "r", "rune").as_deref(), Some("rune rune"));
    }
}
