// Test doubles for the feed pipeline.
//
// - MockOracle (TextGenerator): scripted responses, records every prompt
// - FailingOracle (TextGenerator): every request fails
// - PostFixture / feed_html: feed markup shaped like the live site

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ai_client::TextGenerator;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// MockOracle
// ---------------------------------------------------------------------------

#[derive(Default)]
struct OracleScript {
    by_content: Vec<(String, String)>,
    queue: VecDeque<String>,
    otherwise: Option<String>,
    prompts: Vec<String>,
}

/// Scripted oracle. Clones share the same script and prompt log.
///
/// A prompt is answered by the first `on_content` needle it contains, then by
/// the next queued `respond`, then by `otherwise`; with none left it errors.
#[derive(Clone, Default)]
pub struct MockOracle {
    script: Arc<Mutex<OracleScript>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_content(self, needle: &str, response: &str) -> Self {
        self.lock()
            .by_content
            .push((needle.to_string(), response.to_string()));
        self
    }

    pub fn respond(self, response: &str) -> Self {
        self.lock().queue.push_back(response.to_string());
        self
    }

    pub fn otherwise(self, response: &str) -> Self {
        self.lock().otherwise = Some(response.to_string());
        self
    }

    /// `{"informativeness": score, "category": category}`
    pub fn verdict(score: i64, category: &str) -> String {
        serde_json::json!({ "informativeness": score, "category": category }).to_string()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OracleScript> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TextGenerator for MockOracle {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut script = self.lock();
        script.prompts.push(prompt.to_string());

        if let Some((_, response)) = script
            .by_content
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
        {
            return Ok(response.clone());
        }
        if let Some(response) = script.queue.pop_front() {
            return Ok(response);
        }
        script
            .otherwise
            .clone()
            .ok_or_else(|| anyhow!("MockOracle: no response scripted for prompt"))
    }
}

// ---------------------------------------------------------------------------
// FailingOracle
// ---------------------------------------------------------------------------

/// Every request fails as if the network were down.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingOracle;

#[async_trait]
impl TextGenerator for FailingOracle {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("FailingOracle: connection refused")
    }
}

// ---------------------------------------------------------------------------
// Feed fixtures
// ---------------------------------------------------------------------------

/// One post as the feed renders it: an occludable wrapper around an activity
/// article with an actor block and a text body.
#[derive(Debug, Clone)]
pub struct PostFixture {
    urn: Option<String>,
    name: String,
    role: String,
    avatar: Option<String>,
    text: String,
    displayed: bool,
}

impl PostFixture {
    pub fn new(activity_id: u64, text: &str) -> Self {
        Self {
            urn: Some(format!("urn:li:activity:{activity_id}")),
            name: "Jane Smith".to_string(),
            role: "Staff Engineer at Initech".to_string(),
            avatar: None,
            text: text.to_string(),
            displayed: true,
        }
    }

    /// A post with no stable identifier, identified by its text.
    pub fn anonymous(text: &str) -> Self {
        Self {
            urn: None,
            ..Self::new(0, text)
        }
    }

    pub fn author(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    pub fn avatar(mut self, src: &str) -> Self {
        self.avatar = Some(src.to_string());
        self
    }

    pub fn not_rendered(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Identity the pipeline is expected to assign.
    pub fn identity(&self) -> Option<String> {
        self.urn.as_ref().map(|urn| format!("urn:{urn}"))
    }

    pub fn to_html(&self) -> String {
        let style = if self.displayed { "" } else { r#" style="display:none""# };
        let urn = self
            .urn
            .as_ref()
            .map(|u| format!(r#" data-urn="{u}""#))
            .unwrap_or_default();
        let avatar = self
            .avatar
            .as_ref()
            .map(|src| format!(r#"<img class="update-components-actor__avatar-image" src="{src}">"#))
            .unwrap_or_default();
        let slug = self.name.to_lowercase().replace(' ', "-");
        format!(
            r#"<div class="occludable-update"{style}>
  <article class="feed-shared-update-v2"{urn}>
    <div class="update-components-actor">
      {avatar}
      <span class="update-components-actor__name"><a href="/in/{slug}">{name}</a></span>
      <span class="update-components-actor__sub-description">{role}</span>
    </div>
    <div class="feed-shared-text">{text}</div>
  </article>
</div>"#,
            name = self.name,
            role = self.role,
            text = self.text,
        )
    }
}

/// A full page with `posts` in the main feed column.
pub fn feed_html(posts: &[PostFixture]) -> String {
    let body: Vec<String> = posts.iter().map(PostFixture::to_html).collect();
    format!(
        "<!DOCTYPE html><html><head><title>Feed</title></head><body><main class=\"scaffold-finite-scroll\">{}</main></body></html>",
        body.join("\n")
    )
}
