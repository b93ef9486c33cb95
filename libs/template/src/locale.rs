//! Locale negotiation and number/date formatting conventions

use std::fmt;

/// A language tag such as `en`, `en-GB` or `nl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    language: String,
    region: Option<String>,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            language: String::from("en"),
            region: None,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.language, region),
            None => f.write_str(&self.language),
        }
    }
}

impl Locale {
    /// Parse a tag, accepting both `en-GB` and `en_GB` (optionally with a `.UTF-8` suffix)
    pub fn parse(tag: &str) -> Option<Locale> {
        let tag = tag.trim();
        let tag = tag.split('.').next().unwrap_or(tag);
        let mut parts = tag.split(['-', '_']);

        let language = parts.next()?.trim().to_ascii_lowercase();
        if language.is_empty() || language == "*" || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return None;
        }

        let region = parts
            .next()
            .map(|r| r.trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty());

        Some(Locale { language, region })
    }

    /// Pick the entry with the highest quality from an `Accept-Language` header. Entries
    /// with equal quality keep their order; an unusable header yields the default locale.
    pub fn from_accept_language(header: &str) -> Locale {
        let mut best: Option<(f32, Locale)> = None;

        for entry in header.split(',') {
            let mut fields = entry.split(';');
            let Some(locale) = fields.next().and_then(Locale::parse) else {
                continue;
            };

            let quality = fields
                .filter_map(|f| f.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            if best.as_ref().map_or(true, |(q, _)| quality > *q) {
                best = Some((quality, locale));
            }
        }

        best.map(|(_, locale)| locale).unwrap_or_default()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn decimal_separator(&self) -> &'static str {
        match self.language.as_str() {
            "nl" | "de" | "da" | "es" | "it" | "pt" | "fr" | "sv" | "nb" | "fi" | "pl" | "cs"
            | "ru" | "tr" | "id" => ",",
            _ => ".",
        }
    }

    pub fn grouping_separator(&self) -> &'static str {
        match self.language.as_str() {
            "nl" | "de" | "da" | "es" | "it" | "pt" | "tr" | "id" => ".",
            "fr" | "sv" | "nb" | "fi" | "pl" | "cs" | "ru" => "\u{202f}",
            _ => ",",
        }
    }

    /// Locale used for month and day names in date formatting
    pub fn chrono_locale(&self) -> chrono::Locale {
        use chrono::Locale as L;

        match (self.language.as_str(), self.region()) {
            ("en", Some("GB")) => L::en_GB,
            ("en", _) => L::en_US,
            ("nl", Some("BE")) => L::nl_BE,
            ("nl", _) => L::nl_NL,
            ("de", Some("AT")) => L::de_AT,
            ("de", Some("CH")) => L::de_CH,
            ("de", _) => L::de_DE,
            ("da", _) => L::da_DK,
            ("fr", Some("BE")) => L::fr_BE,
            ("fr", Some("CA")) => L::fr_CA,
            ("fr", _) => L::fr_FR,
            ("es", _) => L::es_ES,
            ("it", _) => L::it_IT,
            ("pt", Some("BR")) => L::pt_BR,
            ("pt", _) => L::pt_PT,
            ("sv", _) => L::sv_SE,
            ("nb", _) => L::nb_NO,
            ("fi", _) => L::fi_FI,
            ("pl", _) => L::pl_PL,
            _ => L::POSIX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_quality_wins() {
        let locale = Locale::from_accept_language("en-US;q=0.7, nl, en;q=0.3");
        assert_eq!(locale.language(), "nl");

        let locale = Locale::from_accept_language("en-GB, en-US;q=0.7");
        assert_eq!(locale.to_string(), "en-GB");
    }

    #[test]
    fn underscore_tags_and_garbage() {
        assert_eq!(Locale::parse("fr_FR.UTF-8").unwrap().to_string(), "fr-FR");
        assert_eq!(Locale::from_accept_language("*"), Locale::default());
        assert_eq!(Locale::from_accept_language(""), Locale::default());
    }

    #[test]
    fn separators_follow_language() {
        let nl = Locale::parse("nl").unwrap();
        assert_eq!((nl.decimal_separator(), nl.grouping_separator()), (",", "."));
        let en = Locale::parse("en-GB").unwrap();
        assert_eq!((en.decimal_separator(), en.grouping_separator()), (".", ","));
    }
}
