//! The generation backend seam.

use async_trait::async_trait;

/// Turns a prompt into generated test code.
///
/// Implementations never fail: any provider or transport error is logged and
/// reported as an empty string.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generates text for `prompt`.
    async fn generate(&self, prompt: &str) -> String;
}
