// Language preference resolution

use super::models::CaptionTrack;

/// Pick the best caption track for an ordered language preference.
///
/// Preferred tags are tried in order; for each, the first track whose
/// language code case-insensitively starts with the tag wins, so a
/// short preferred tag like `zh` matches regional variants like
/// `zh-CN`. When nothing matches, the first available track is the
/// deterministic default - the caller decides whether an unmatched
/// language is acceptable.
///
/// # Panics
///
/// Panics if `available` is empty. A caller holding zero tracks must
/// treat that as its own failure before selection.
pub fn select_track<'a>(preferred: &[String], available: &'a [CaptionTrack]) -> &'a CaptionTrack {
    select_by_code(preferred, available, |track| track.language_code.as_str())
}

/// Same prefix-match algorithm over any track-like type.
pub(crate) fn select_by_code<'a, T, F>(preferred: &[String], available: &'a [T], code: F) -> &'a T
where
    F: Fn(&T) -> &str,
{
    for lang in preferred {
        let lang = lang.to_lowercase();
        for item in available {
            if code(item).to_lowercase().starts_with(&lang) {
                return item;
            }
        }
    }
    &available[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(code: &str) -> CaptionTrack {
        CaptionTrack {
            language_code: code.to_string(),
            fetch_locator: format!("https://example.com/{code}"),
        }
    }

    #[test]
    fn test_prefix_match_takes_priority_over_list_order() {
        let available = vec![track("en-US"), track("zh-CN")];
        let preferred = vec!["zh".to_string(), "en".to_string()];
        assert_eq!(select_track(&preferred, &available).language_code, "zh-CN");
    }

    #[test]
    fn test_empty_preference_falls_back_to_first() {
        let available = vec![track("en-US")];
        assert_eq!(select_track(&[], &available).language_code, "en-US");
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let available = vec![track("DE"), track("EN-gb")];
        let preferred = vec!["en".to_string()];
        assert_eq!(select_track(&preferred, &available).language_code, "EN-gb");
    }

    #[test]
    fn test_no_match_falls_back_to_first() {
        let available = vec![track("fr"), track("de")];
        let preferred = vec!["ja".to_string()];
        assert_eq!(select_track(&preferred, &available).language_code, "fr");
    }
}
