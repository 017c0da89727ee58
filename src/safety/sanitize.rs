/// Maximum inbound message length in bytes.
pub const MAX_MESSAGE_LENGTH: usize = 2_000;

/// Normalized inbound text plus what was changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub text: String,
    pub modifications: Vec<InputModification>,
}

impl NormalizedInput {
    pub fn was_modified(&self) -> bool {
        !self.modifications.is_empty()
    }
}

/// Kinds of normalization applied to user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModification {
    InvisibleUnicodeRemoved,
    ControlCharacterRemoved,
    ExcessiveLengthTruncated,
}

impl InputModification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvisibleUnicodeRemoved => "invisible_unicode_removed",
            Self::ControlCharacterRemoved => "control_character_removed",
            Self::ExcessiveLengthTruncated => "excessive_length_truncated",
        }
    }
}

/// Normalize a user message before any pattern is evaluated against it.
///
/// Zero-width and directional characters are removed so they cannot split a
/// dangerous phrase and slip past the matchers.
pub fn normalize_input(raw: &str, max_length: usize) -> NormalizedInput {
    let mut modifications = Vec::new();

    let text = remove_invisible_unicode(raw);
    if text.len() != raw.len() {
        modifications.push(InputModification::InvisibleUnicodeRemoved);
    }

    let before = text.len();
    let mut text = remove_control_characters(&text);
    if text.len() != before {
        modifications.push(InputModification::ControlCharacterRemoved);
    }

    if text.len() > max_length {
        text = truncate_at_word_boundary(&text, max_length);
        modifications.push(InputModification::ExcessiveLengthTruncated);
    }

    NormalizedInput {
        text,
        modifications,
    }
}

/// Normalize with the default length limit, logging what was changed.
pub fn normalize(raw: &str) -> String {
    let normalized = normalize_input(raw, MAX_MESSAGE_LENGTH);
    if normalized.was_modified() {
        let applied: Vec<&str> = normalized.modifications.iter().map(|m| m.as_str()).collect();
        if normalized
            .modifications
            .contains(&InputModification::ExcessiveLengthTruncated)
        {
            tracing::warn!(
                original_len = raw.len(),
                kept_len = normalized.text.len(),
                max_len = MAX_MESSAGE_LENGTH,
                modifications = ?applied,
                "User input truncated"
            );
        } else {
            tracing::debug!(modifications = ?applied, "User input normalized");
        }
    }
    normalized.text
}

fn remove_invisible_unicode(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'
                | '\u{202A}'..='\u{202E}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{2069}'
                | '\u{FEFF}'
                | '\u{00AD}'
                | '\u{034F}'
                | '\u{061C}'
                | '\u{180E}'
            )
        })
        .collect()
}

/// Keeps newline and tab.
fn remove_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Truncate to at most `max` bytes, preferring the last whitespace and never
/// splitting a UTF-8 sequence.
fn truncate_at_word_boundary(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &text[..end];
    match truncated.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => truncated[..pos].to_string(),
        _ => truncated.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_input_unchanged() {
        let result = normalize_input("I have had a headache for two days", 2000);
        assert!(!result.was_modified());
        assert_eq!(result.text, "I have had a headache for two days");
    }

    #[test]
    fn zero_width_characters_removed() {
        let result = normalize_input("hurt\u{200B} my\u{FEFF}self", 2000);
        assert_eq!(result.text, "hurt myself");
        assert!(result
            .modifications
            .contains(&InputModification::InvisibleUnicodeRemoved));
    }

    #[test]
    fn control_characters_removed_newline_kept() {
        let result = normalize_input("fever\x07 since\nyesterday\t", 2000);
        assert_eq!(result.text, "fever since\nyesterday\t");
        assert!(result
            .modifications
            .contains(&InputModification::ControlCharacterRemoved));
    }

    #[test]
    fn long_input_truncated_at_word() {
        let input = "cough ".repeat(500);
        let result = normalize_input(&input, 100);
        assert!(result.text.len() <= 100);
        assert!(result.text.ends_with("cough"));
        assert!(result
            .modifications
            .contains(&InputModification::ExcessiveLengthTruncated));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let input = "头痛".repeat(400);
        let result = normalize_input(&input, 100);
        assert!(result.text.len() <= 100);
        assert!(result.text.chars().all(|c| c == '头' || c == '痛'));
    }

    #[test]
    fn default_normalize_truncates_long_input() {
        let input = "咳嗽 ".repeat(1000);
        let text = normalize(&input);
        assert!(text.len() <= MAX_MESSAGE_LENGTH);
        assert!(text.ends_with("咳嗽"));
    }

    #[test]
    fn modification_labels_are_distinct() {
        let labels = [
            InputModification::InvisibleUnicodeRemoved.as_str(),
            InputModification::ControlCharacterRemoved.as_str(),
            InputModification::ExcessiveLengthTruncated.as_str(),
        ];
        assert_eq!(labels[2], "excessive_length_truncated");
        assert!(labels[0] != labels[1] && labels[1] != labels[2]);
    }

    #[test]
    fn chinese_text_preserved() {
        assert_eq!(normalize("我发烧三天了，还咳嗽"), "我发烧三天了，还咳嗽");
    }

    #[test]
    fn empty_input() {
        let result = normalize_input("", 2000);
        assert!(result.text.is_empty());
        assert!(!result.was_modified());
    }
}
