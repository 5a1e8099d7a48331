//! Keyword classifier: is this text a gift-code announcement?

use crate::config::RelayConfig;

/// Case-insensitive substring match against a fixed keyword set.
#[derive(Debug, Clone)]
pub struct Classifier {
    keywords: Vec<String>,
}

impl Classifier {
    /// Build from configured phrases. Phrases are lower-cased; blank ones dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(&config.keywords)
    }

    /// The first configured keyword found in `text`, if any.
    pub fn matched_keyword(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn is_announcement(&self, text: &str) -> bool {
        self.matched_keyword(text).is_some()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_default_keywords_case_insensitively() {
        let classifier = Classifier::default();
        assert!(classifier.is_announcement("New GIFT CODE today"));
        assert!(classifier.is_announcement("Redeem this now"));
        assert!(classifier.is_announcement("vip12 reward"));
    }

    #[test]
    fn substring_not_word_boundary() {
        let classifier = Classifier::default();
        assert!(classifier.is_announcement("giftcodes inside"));
        assert!(classifier.is_announcement("redeemable"));
        assert!(!classifier.is_announcement("a new provider launched"));
    }

    #[test]
    fn no_keywords_means_not_an_announcement() {
        let classifier = Classifier::default();
        assert!(!classifier.is_announcement("https://example.com/ABCDEF123456"));
        assert!(!classifier.is_announcement(""));
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let classifier = Classifier::new(["Promo", " "]);
        assert!(classifier.is_announcement("PROMO drop"));
        assert!(!classifier.is_announcement("gift code"));
        assert_eq!(classifier.matched_keyword("promo"), Some("promo"));
    }

    #[test]
    fn first_configured_keyword_wins() {
        let classifier = Classifier::new(["voucher", "vip"]);
        assert_eq!(classifier.matched_keyword("VIP voucher"), Some("voucher"));
    }
}
