//! Creator and video identifiers mentioned in a question.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words that introduce a creator id ("у автора X", "креатора с id X").
const CREATOR_MARKERS: &[&str] = &[
    "автора",
    "креатора",
    "создателя",
    "автор",
    "креатор",
    "creator",
    "creator_id",
];

/// Words allowed between a marker and the id itself.
const FILLER_WORDS: &[&str] = &[
    "с", "c", "id", "айди", "номером", "номер", "идентификатором", "=", ":", "-", "—",
];

const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '«', '»', '“', '”', '(', ')',
];

static HEX_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9a-f]{32}\b").expect("hex id pattern is valid"));

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b")
        .expect("uuid pattern is valid")
});

/// Creator id: the first token after a marker word, or any bare 32-hex id.
///
/// The token is returned as written; it is only ever bound as a query parameter.
pub fn extract_creator_id(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        let bare = word.trim_matches(PUNCTUATION);
        if !CREATOR_MARKERS.contains(&bare) {
            continue;
        }
        let candidate = words[i + 1..]
            .iter()
            .map(|w| w.trim_matches(PUNCTUATION))
            .find(|w| !w.is_empty() && !FILLER_WORDS.contains(w));
        if let Some(id) = candidate.filter(|id| id.chars().any(|c| c.is_ascii_alphanumeric())) {
            return Some(id.to_string());
        }
    }

    HEX_ID_RE.find(text).map(|m| m.as_str().to_string())
}

/// Video id: a UUID that is not the creator id.
pub fn extract_video_id(text: &str, creator_id: Option<&str>) -> Option<String> {
    UUID_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|id| Some(*id) != creator_id)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_after_marker() {
        assert_eq!(
            extract_creator_id("сколько видео у автора abc123 вышло"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_creator_after_marker_with_filler_words() {
        assert_eq!(
            extract_creator_id("сколько видео у креатора с id aca1061a9d324ecf8c3fa2bb32d7be63?"),
            Some("aca1061a9d324ecf8c3fa2bb32d7be63".to_string())
        );
        assert_eq!(
            extract_creator_id("видео автора с идентификатором: x-42, пожалуйста"),
            Some("x-42".to_string())
        );
    }

    #[test]
    fn test_bare_hex_id_without_marker() {
        assert_eq!(
            extract_creator_id("сколько видео у aca1061a9d324ecf8c3fa2bb32d7be63"),
            Some("aca1061a9d324ecf8c3fa2bb32d7be63".to_string())
        );
    }

    #[test]
    fn test_marker_followed_by_plain_word_is_ignored() {
        assert_eq!(extract_creator_id("сколько видео у автора есть"), None);
        assert_eq!(extract_creator_id("сколько всего видео"), None);
    }

    #[test]
    fn test_hostile_token_is_kept_verbatim() {
        assert_eq!(
            extract_creator_id("видео у автора 1';drop--"),
            Some("1';drop--".to_string())
        );
    }

    #[test]
    fn test_video_uuid() {
        let text = "на сколько выросли просмотры видео 3fa85f64-5717-4562-b3fc-2c963f66afa6";
        assert_eq!(
            extract_video_id(text, None),
            Some("3fa85f64-5717-4562-b3fc-2c963f66afa6".to_string())
        );
    }

    #[test]
    fn test_video_uuid_skips_creator() {
        let creator = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
        let text = format!("у автора {creator} видео");
        assert_eq!(extract_creator_id(&text).as_deref(), Some(creator));
        assert_eq!(extract_video_id(&text, Some(creator)), None);
    }
}
