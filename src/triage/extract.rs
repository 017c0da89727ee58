//! Symptom extraction from free text.
//!
//! Policy: exact substring match against the knowledge-base keywords, longest
//! keyword first. A shorter keyword is ignored when every occurrence of it
//! lies inside an already accepted longer match ("剧烈头痛" does not also
//! yield "头痛"). Latin keywords match case-insensitively and must start at a
//! word boundary; CJK keywords match as written.

use std::sync::LazyLock;

use regex::Regex;

use super::knowledge::KnowledgeBase;
use super::types::Symptom;

static DURATION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)((?:\d+|[一二三四五六七八九十两几半]+)\s*个?\s*(?:分钟|小时|天|日|周|星期|月|年)|昨天|前天|今天|上周|刚才|\b(?:\d+|a|an|one|two|three|four|five|six|seven|several|a\s+few|few)\s+(?:minutes?|hours?|days?|weeks?|months?|years?)\b|\bsince\s+(?:yesterday|last\s+night|last\s+week|this\s+morning|today)\b)",
    )
    .map_err(|e| tracing::error!(error = %e, "Duration pattern failed to compile"))
    .ok()
});

static SEVERITY_TERMS: &[&str] = &[
    "剧烈", "严重", "很痛", "中等", "轻微", "有点",
    "unbearable", "severe", "terrible", "moderate", "mild", "slight",
];

static FREQUENCY_TERMS: &[&str] = &[
    "时有时无", "一直", "持续", "反复", "经常", "偶尔", "每天",
    "all the time", "comes and goes", "on and off", "constantly", "constant",
    "intermittent", "every day", "daily", "often", "occasionally", "sometimes",
];

/// Detail about symptoms stated in one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomAttributes {
    pub duration: Option<String>,
    pub severity: Option<String>,
    pub frequency: Option<String>,
}

impl SymptomAttributes {
    pub fn is_empty(&self) -> bool {
        self.duration.is_none() && self.severity.is_none() && self.frequency.is_none()
    }

    /// Set every attribute this message provided, keeping existing values
    /// where it provided none.
    pub fn fill_missing(&self, symptom: &mut Symptom) {
        if symptom.duration.is_none() {
            symptom.duration.clone_from(&self.duration);
        }
        if symptom.severity.is_none() {
            symptom.severity.clone_from(&self.severity);
        }
        if symptom.frequency.is_none() {
            symptom.frequency.clone_from(&self.frequency);
        }
    }
}

/// Duration, severity and frequency mentioned anywhere in `text`.
pub fn extract_attributes(text: &str) -> SymptomAttributes {
    let lower = text.to_lowercase();
    SymptomAttributes {
        duration: DURATION_RE
            .as_ref()
            .and_then(|re| re.find(&lower))
            .map(|m| m.as_str().trim().to_string()),
        severity: first_term(&lower, SEVERITY_TERMS),
        frequency: first_term(&lower, FREQUENCY_TERMS),
    }
}

fn first_term(lower: &str, terms: &[&str]) -> Option<String> {
    terms
        .iter()
        .find(|term| lower.contains(**term))
        .map(|term| term.to_string())
}

/// Known symptoms mentioned in `text`, in order of first mention, each
/// carrying the message-level attributes.
pub fn extract_symptoms(text: &str, kb: &KnowledgeBase) -> Vec<Symptom> {
    let lower = text.to_lowercase();
    let attributes = extract_attributes(text);

    let mut accepted_spans: Vec<(usize, usize)> = Vec::new();
    let mut found: Vec<(usize, &'static str)> = Vec::new();

    for &keyword in kb.keywords_by_length() {
        let occurrences: Vec<(usize, usize)> = lower
            .match_indices(keyword)
            .map(|(start, m)| (start, start + m.len()))
            .filter(|&(start, _)| starts_at_boundary(&lower, start, keyword))
            .collect();

        let uncovered: Vec<(usize, usize)> = occurrences
            .into_iter()
            .filter(|&(start, end)| {
                !accepted_spans
                    .iter()
                    .any(|&(s, e)| start >= s && end <= e)
            })
            .collect();

        let Some(&(first, _)) = uncovered.first() else {
            continue;
        };
        accepted_spans.extend(uncovered);
        found.push((first, keyword));
    }

    found.sort_by_key(|&(position, _)| position);
    found
        .into_iter()
        .map(|(_, keyword)| {
            let mut symptom = Symptom::new(keyword);
            attributes.fill_missing(&mut symptom);
            symptom
        })
        .collect()
}

/// Latin keywords must not start mid-word ("rash" is not in "crash").
fn starts_at_boundary(text: &str, start: usize, keyword: &str) -> bool {
    if !keyword.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return true;
    }
    text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(symptoms: &[Symptom]) -> Vec<&str> {
        symptoms.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn extracts_chinese_keywords_in_mention_order() {
        let kb = KnowledgeBase::builtin();
        let symptoms = extract_symptoms("最近咳嗽，还有点头痛和发烧", &kb);
        assert_eq!(names(&symptoms), vec!["咳嗽", "头痛", "发烧"]);
    }

    #[test]
    fn longer_keyword_suppresses_contained_shorter_one() {
        let kb = KnowledgeBase::builtin();
        let symptoms = extract_symptoms("剧烈头痛", &kb);
        assert_eq!(names(&symptoms), vec!["剧烈头痛"]);

        let symptoms = extract_symptoms("I have a severe headache", &kb);
        assert_eq!(names(&symptoms), vec!["severe headache"]);
    }

    #[test]
    fn shorter_keyword_kept_when_also_mentioned_alone() {
        let kb = KnowledgeBase::builtin();
        let symptoms = extract_symptoms("昨天剧烈头痛，今天还是头痛", &kb);
        assert_eq!(names(&symptoms), vec!["剧烈头痛", "头痛"]);
    }

    #[test]
    fn english_keywords_case_insensitive() {
        let kb = KnowledgeBase::builtin();
        let symptoms = extract_symptoms("Headache and a COUGH", &kb);
        assert_eq!(names(&symptoms), vec!["headache", "cough"]);
    }

    #[test]
    fn english_keyword_needs_word_start() {
        let kb = KnowledgeBase::builtin();
        assert!(extract_symptoms("I was in a car crash", &kb).is_empty());
        assert_eq!(names(&extract_symptoms("coughing a lot", &kb)), vec!["cough"]);
    }

    #[test]
    fn unknown_text_yields_nothing() {
        let kb = KnowledgeBase::builtin();
        assert!(extract_symptoms("I just feel off today", &kb).is_empty());
        assert!(extract_symptoms("", &kb).is_empty());
    }

    #[test]
    fn attributes_attached_to_symptoms() {
        let kb = KnowledgeBase::builtin();
        let symptoms = extract_symptoms("发烧三天了，一直很严重", &kb);
        assert_eq!(symptoms.len(), 1);
        assert_eq!(symptoms[0].duration.as_deref(), Some("三天"));
        assert_eq!(symptoms[0].severity.as_deref(), Some("严重"));
        assert_eq!(symptoms[0].frequency.as_deref(), Some("一直"));
    }

    #[test]
    fn english_attributes() {
        let attributes = extract_attributes("It's mild, comes and goes, for 2 days now");
        assert_eq!(attributes.duration.as_deref(), Some("2 days"));
        assert_eq!(attributes.severity.as_deref(), Some("mild"));
        assert_eq!(attributes.frequency.as_deref(), Some("comes and goes"));
    }

    #[test]
    fn no_attributes_in_plain_text() {
        assert!(extract_attributes("hello there").is_empty());
    }

    #[test]
    fn fill_missing_keeps_existing_values() {
        let mut symptom = Symptom::new("头痛");
        symptom.duration = Some("两天".into());
        let attributes = SymptomAttributes {
            duration: Some("一周".into()),
            severity: Some("轻微".into()),
            frequency: None,
        };
        attributes.fill_missing(&mut symptom);
        assert_eq!(symptom.duration.as_deref(), Some("两天"));
        assert_eq!(symptom.severity.as_deref(), Some("轻微"));
        assert_eq!(symptom.frequency, None);
    }
}
