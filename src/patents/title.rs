//! Title extraction from Google Patents pages
//!
//! The page carries the title in `<span itemprop="title">`; older layouts only
//! have `<h1 itemprop="pageTitle">` of the form `US1234567A - Title - Google
//! Patents`. On some pages the span holds the abstract instead, so every
//! extracted string goes through [`TitleRules::validate`] before it is used.

use super::TitleError;
use scraper::{Html, Selector};
use tracing::debug;

const PAGE_TITLE_SUFFIX: &str = " - Google Patents";

/// Limits that separate a title from abstract prose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleRules {
    pub max_chars: usize,
    pub max_sentences: usize,
}

impl Default for TitleRules {
    fn default() -> Self {
        Self {
            max_chars: 300,
            max_sentences: 1,
        }
    }
}

impl TitleRules {
    /// Ok when `text` plausibly is a title; otherwise the rejection reason
    pub fn validate(&self, text: &str) -> Result<(), String> {
        if text.is_empty() {
            return Err("empty text".to_string());
        }
        if text.to_lowercase().starts_with("abstract") {
            return Err("text starts with \"Abstract\"".to_string());
        }

        let chars = text.chars().count();
        if chars > self.max_chars {
            return Err(format!("{} characters exceeds the limit of {}", chars, self.max_chars));
        }

        let sentences = sentence_terminators(text);
        if sentences > self.max_sentences {
            return Err(format!("{} sentences, likely an abstract", sentences));
        }

        Ok(())
    }
}

/// Count `.`, `!` and `?` that end a sentence, i.e. are followed by
/// whitespace or the end of the text. Dots inside chemical names such as
/// "N,N-dimethyl-2.5-xylidine" are not counted.
fn sentence_terminators(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            matches!(c, '.' | '!' | '?')
                && chars.get(i + 1).map_or(true, |next| next.is_whitespace())
        })
        .count()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let Ok(sel) = Selector::parse(selector) else {
        return None;
    };
    document
        .select(&sel)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
}

/// Strip `"{id} - "` and `" - Google Patents"` from an `<h1>` page title
fn clean_page_title(full_title: &str, patent_id: &str) -> String {
    let title = full_title.split(PAGE_TITLE_SUFFIX).next().unwrap_or(full_title);
    let prefix = format!("{} - ", patent_id);
    title.strip_prefix(&prefix).unwrap_or(title).trim().to_string()
}

/// Extract and validate the patent title from a Google Patents page
pub fn extract_title(html: &str, patent_id: &str, rules: &TitleRules) -> Result<String, TitleError> {
    let document = Html::parse_document(html);
    let mut rejection = None;

    if let Some(title) = select_text(&document, r#"span[itemprop="title"]"#) {
        match rules.validate(&title) {
            Ok(()) => return Ok(title),
            Err(reason) => {
                debug!(patent_id, reason = %reason, "Rejected itemprop title");
                rejection = Some(reason);
            }
        }
    }

    if let Some(full_title) = select_text(&document, r#"h1[itemprop="pageTitle"]"#) {
        let title = clean_page_title(&full_title, patent_id);
        match rules.validate(&title) {
            Ok(()) => return Ok(title),
            Err(reason) => {
                debug!(patent_id, reason = %reason, "Rejected page title");
                rejection = Some(reason);
            }
        }
    }

    match rejection {
        Some(reason) => Err(TitleError::ValidationRejected(reason)),
        None => Err(TitleError::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABSTRACT: &str = "The invention discloses a preparation method of a compound. \
        The method comprises the following steps of reacting the starting material. \
        The yield is high.";

    fn page(body: &str) -> String {
        format!("<html><head><title>ignored</title></head><body>{}</body></html>", body)
    }

    #[test]
    fn test_itemprop_title_extracted() {
        let html = page(r#"<span itemprop="title">  Process for preparing
            pyridine carboxamides </span>"#);
        let title = extract_title(&html, "US1234567A", &TitleRules::default()).unwrap();
        assert_eq!(title, "Process for preparing pyridine carboxamides");
    }

    #[test]
    fn test_page_title_fallback_cleaned() {
        let html = page(r#"<h1 itemprop="pageTitle">US1234567A - Process for preparing pyridine - Google Patents</h1>"#);
        let title = extract_title(&html, "US1234567A", &TitleRules::default()).unwrap();
        assert_eq!(title, "Process for preparing pyridine");
    }

    #[test]
    fn test_abstract_in_span_falls_back_to_h1() {
        let html = page(&format!(
            r#"<span itemprop="title">{}</span><h1 itemprop="pageTitle">CN1A - Preparation method - Google Patents</h1>"#,
            ABSTRACT
        ));
        let title = extract_title(&html, "CN1A", &TitleRules::default()).unwrap();
        assert_eq!(title, "Preparation method");
    }

    #[test]
    fn test_abstract_only_is_rejected() {
        let html = page(&format!(r#"<span itemprop="title">{}</span>"#, ABSTRACT));
        let err = extract_title(&html, "CN1A", &TitleRules::default()).unwrap_err();
        assert!(matches!(err, TitleError::ValidationRejected(_)));
    }

    #[test]
    fn test_missing_title() {
        let html = page("<p>nothing here</p>");
        assert_eq!(
            extract_title(&html, "US1", &TitleRules::default()),
            Err(TitleError::Missing)
        );
    }

    #[test]
    fn test_validation_rules() {
        let rules = TitleRules::default();
        assert!(rules.validate("Synthesis of compound X").is_ok());
        assert!(rules.validate("Synthesis of compound X.").is_ok());
        assert!(rules.validate("Use of 2.5-dimethylpyridine as solvent").is_ok());
        assert!(rules.validate("Abstract: a method for making X").is_err());
        assert!(rules.validate("One sentence. Two sentences.").is_err());
        assert!(rules.validate(&"x".repeat(301)).is_err());
        assert!(rules.validate(&"x".repeat(300)).is_ok());
        assert!(rules.validate("").is_err());
    }

    #[test]
    fn test_custom_ceiling() {
        let rules = TitleRules {
            max_chars: 10,
            max_sentences: 0,
        };
        assert!(rules.validate("Short").is_ok());
        assert!(rules.validate("Short one.").is_err());
        assert!(rules.validate("Much longer title").is_err());
    }
}
