/// Case-insensitive substring filter over the configured mute terms.
#[derive(Debug, Clone, Default)]
pub struct MuteFilter {
    terms: Vec<String>,
}

impl MuteFilter {
    /// Terms are lowercased here as well, so callers may pass raw input.
    pub fn new(terms: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_muted(&self, text: &str) -> bool {
        self.matched_term(text).is_some()
    }

    /// The first configured term found in `text`.
    pub fn matched_term(&self, text: &str) -> Option<&str> {
        if self.terms.is_empty() {
            return None;
        }
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| haystack.contains(term.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_ignores_case() {
        let filter = MuteFilter::new(["crypto"]);
        assert!(filter.is_muted("Check out my new Crypto project"));
        assert!(!filter.is_muted("Check out my new compiler"));
    }

    #[test]
    fn test_empty_terms_never_match() {
        let filter = MuteFilter::new(["", "   "]);
        assert!(filter.is_empty());
        assert!(!filter.is_muted("anything at all"));
    }

    #[test]
    fn test_reports_first_matching_term() {
        let filter = MuteFilter::new(["Hiring", "web3"]);
        assert_eq!(filter.matched_term("WEB3 and we're hiring"), Some("hiring"));
    }
}
