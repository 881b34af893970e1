use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// TextGenerator Trait
// =============================================================================

/// Single-shot prompt → text completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}
