//! Non-Latin script heuristic
//!
//! Patent titles scraped from the English page of a CN, JP or KR patent are
//! sometimes still in the original script. Those titles can never score well
//! against an English claimed title, so they get an informational note.

/// Note attached to records whose scraped title is mostly non-Latin
pub const LANGUAGE_NOTE: &str = "Non-Latin script title - similarity may be affected by language";

/// Latin letters, digits, ASCII punctuation and general punctuation
fn is_latin_script(c: char) -> bool {
    c.is_ascii()
        || matches!(
            c as u32,
            // Latin-1 Supplement, Latin Extended-A and -B
            0x00A0..=0x024F
            // Latin Extended Additional
            | 0x1E00..=0x1EFF
            // General Punctuation
            | 0x2000..=0x206F
        )
}

/// Share of non-whitespace characters that fall outside the Latin script
pub fn non_latin_fraction(text: &str) -> f64 {
    let (total, foreign) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(total, foreign), c| {
            (total + 1, foreign + usize::from(!is_latin_script(c)))
        });

    if total == 0 {
        0.0
    } else {
        foreign as f64 / total as f64
    }
}

/// True when the non-Latin share strictly exceeds `threshold`
pub fn is_non_latin(text: &str, threshold: f64) -> bool {
    non_latin_fraction(text) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjk_title_flagged() {
        assert!(is_non_latin("一种化合物的制备方法", 0.3));
        assert!(is_non_latin("化合物の製造方法", 0.3));
        assert!(is_non_latin("화합물의 제조 방법", 0.3));
    }

    #[test]
    fn test_ascii_title_not_flagged() {
        assert_eq!(non_latin_fraction("Process for preparing 3-(trifluoromethyl)pyridine"), 0.0);
        assert!(!is_non_latin("Process for preparing pyridine", 0.3));
    }

    #[test]
    fn test_accented_latin_not_flagged() {
        assert!(!is_non_latin("Procédé de préparation d'un dérivé", 0.3));
    }

    #[test]
    fn test_threshold_is_strict() {
        // 3 CJK characters out of 10 non-whitespace characters
        let text = "abcdefg 化合物";
        assert!((non_latin_fraction(text) - 0.3).abs() < 1e-9);
        assert!(!is_non_latin(text, 0.3));
        assert!(is_non_latin(text, 0.29));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(non_latin_fraction("   "), 0.0);
    }
}
