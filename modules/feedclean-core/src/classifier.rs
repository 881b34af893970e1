use ai_client::{first_json_object, truncate_to_char_boundary, TextGenerator};
use feedclean_common::prompt::{AUTHOR_PLACEHOLDER, CONTENT_PLACEHOLDER};
use feedclean_common::{Category, ClassificationResult, FALLBACK_SCORE};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::rate_limit::RateLimiter;

// =============================================================================
// Prompt
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute the first `{{author}}` and the first `{{content}}`.
    ///
    /// The author goes in first, so a name containing the literal content
    /// placeholder would receive the content. Later occurrences stay verbatim.
    pub fn render(&self, author: &str, content: &str) -> String {
        self.0
            .replacen(AUTHOR_PLACEHOLDER, author, 1)
            .replacen(CONTENT_PLACEHOLDER, content, 1)
    }
}

// =============================================================================
// Verdict parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct OracleVerdict {
    #[serde(default)]
    informativeness: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerdictError {
    #[error("no JSON object in oracle output")]
    NoObject,
    #[error("malformed oracle JSON: {0}")]
    Malformed(String),
    #[error("oracle reported error: {0}")]
    Reported(String),
}

/// Parse the first brace-delimited object in the oracle's generated text.
pub fn parse_verdict(text: &str) -> Result<ClassificationResult, VerdictError> {
    let object = first_json_object(text).ok_or(VerdictError::NoObject)?;
    let verdict: OracleVerdict =
        serde_json::from_str(object).map_err(|e| VerdictError::Malformed(e.to_string()))?;

    if let Some(error) = verdict.error.as_ref().filter(|e| is_truthy(e)) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(VerdictError::Reported(message));
    }

    let score = verdict
        .informativeness
        .as_ref()
        .and_then(parse_score)
        .unwrap_or(FALLBACK_SCORE as i64);
    let category = match verdict.category {
        Some(Value::String(label)) => Category::from_label(&label),
        _ => Category::Normal,
    };
    Ok(ClassificationResult::new(score, category))
}

/// Integer prefix of a score written as a number or a numeric string:
/// `7`, `7.9` and `"7/10"` all read as 7.
fn parse_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Anything too long to fit still clamps to the top of the scale.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// =============================================================================
// Client
// =============================================================================

/// Scores content through the oracle and falls open on every failure.
pub struct ClassificationClient<G> {
    generator: Option<G>,
    template: PromptTemplate,
    limiter: RateLimiter,
}

impl<G: TextGenerator> ClassificationClient<G> {
    /// `generator` is `None` when no credential is configured.
    pub fn new(generator: Option<G>, template: PromptTemplate, limiter: RateLimiter) -> Self {
        Self {
            generator,
            template,
            limiter,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.generator.is_some()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub async fn classify(&mut self, content: &str, author: &str) -> ClassificationResult {
        let Some(generator) = self.generator.as_ref() else {
            warn!("No oracle credential configured, using fallback classification");
            return ClassificationResult::fallback();
        };

        if !self.limiter.try_acquire() {
            warn!(
                limit = self.limiter.budget().limit,
                "Oracle rate limit reached, using fallback classification"
            );
            return ClassificationResult::fallback();
        }

        let prompt = self.template.render(author, content);
        debug!(author, prompt_len = prompt.len(), "Classifying item");

        let text = match generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Oracle request failed, using fallback classification");
                return ClassificationResult::fallback();
            }
        };

        match parse_verdict(&text) {
            Ok(result) => {
                debug!(
                    score = result.score(),
                    category = %result.category(),
                    "Oracle verdict"
                );
                result
            }
            Err(e) => {
                warn!(
                    error = %e,
                    output = truncate_to_char_boundary(&text, 200),
                    "Unusable oracle verdict, using fallback classification"
                );
                ClassificationResult::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{FailingOracle, MockOracle};

    fn client<G: TextGenerator>(generator: Option<G>) -> ClassificationClient<G> {
        ClassificationClient::new(
            generator,
            PromptTemplate::new("Author: {{author}}\nPost: {{content}}"),
            RateLimiter::default(),
        )
    }

    #[test]
    fn test_render_substitutes_first_occurrence_only() {
        let template = PromptTemplate::new("{{author}} / {{content}} / {{author}}");
        assert_eq!(template.render("Ada", "hello"), "Ada / hello / {{author}}");
    }

    #[test]
    fn test_parse_verdict_in_prose() {
        let result =
            parse_verdict("Sure! ```json\n{\"informativeness\": 3, \"category\": \"activity\"}\n```")
                .unwrap();
        assert_eq!(result.score(), 3);
        assert_eq!(result.category(), Category::Activity);
    }

    #[test]
    fn test_parse_verdict_score_forms() {
        let score = |json: &str| parse_verdict(json).unwrap().score();
        assert_eq!(score(r#"{"informativeness": 7.9}"#), 7);
        assert_eq!(score(r#"{"informativeness": "6/10"}"#), 6);
        assert_eq!(score(r#"{"informativeness": "high"}"#), 8);
        assert_eq!(score(r#"{"informativeness": 42}"#), 10);
        assert_eq!(score(r#"{"informativeness": -1}"#), 0);
        assert_eq!(score(r#"{"informativeness": 0}"#), 0);
        assert_eq!(score(r#"{"category": "normal"}"#), 8);
    }

    #[test]
    fn test_parse_verdict_unknown_category() {
        let result = parse_verdict(r#"{"informativeness": 2, "category": "spam"}"#).unwrap();
        assert_eq!(result.category(), Category::Normal);
        let result = parse_verdict(r#"{"informativeness": 2, "category": 5}"#).unwrap();
        assert_eq!(result.category(), Category::Normal);
    }

    #[test]
    fn test_parse_verdict_errors() {
        assert!(matches!(
            parse_verdict(r#"{"error": "bad request"}"#),
            Err(VerdictError::Reported(m)) if m == "bad request"
        ));
        assert_eq!(parse_verdict("no json here"), Err(VerdictError::NoObject));
        assert!(matches!(
            parse_verdict("{not json}"),
            Err(VerdictError::Malformed(_))
        ));
        // A falsy error member is ignored.
        assert!(parse_verdict(r#"{"error": "", "informativeness": 9}"#).is_ok());
    }

    #[tokio::test]
    async fn test_no_credential_falls_back() {
        let mut client = client::<MockOracle>(None);
        assert_eq!(
            client.classify("text", "Ada").await,
            ClassificationResult::fallback()
        );
    }

    #[tokio::test]
    async fn test_oracle_error_body_falls_back() {
        let oracle = MockOracle::new().respond(r#"{"error": "bad request"}"#);
        let mut client = client(Some(oracle));
        assert_eq!(
            client.classify("text", "Ada").await,
            ClassificationResult::fallback()
        );
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        let mut client = client(Some(FailingOracle));
        assert_eq!(
            client.classify("text", "Ada").await,
            ClassificationResult::fallback()
        );
    }

    #[tokio::test]
    async fn test_prompt_reaches_oracle() {
        let oracle = MockOracle::new().respond(r#"{"informativeness": 9, "category": "normal"}"#);
        let mut client = client(Some(oracle.clone()));
        let result = client.classify("Rust 1.80 is out", "Ada").await;
        assert_eq!(result.score(), 9);
        assert_eq!(oracle.prompts(), vec!["Author: Ada\nPost: Rust 1.80 is out"]);
    }

    #[tokio::test]
    async fn test_rate_limit_denial_skips_oracle() {
        let oracle = MockOracle::new()
            .respond(r#"{"informativeness": 2, "category": "promotional"}"#)
            .respond(r#"{"informativeness": 2, "category": "promotional"}"#);
        let mut client = ClassificationClient::new(
            Some(oracle.clone()),
            PromptTemplate::new("{{content}}"),
            RateLimiter::new(1, Duration::from_secs(60)),
        );

        assert_eq!(client.classify("a", "x").await.score(), 2);
        assert_eq!(
            client.classify("b", "x").await,
            ClassificationResult::fallback()
        );
        assert_eq!(oracle.call_count(), 1);
    }
}
