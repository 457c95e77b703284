pub mod gemini;
pub mod prompt;

use crate::digest::render_digest;
use crate::error::GenerationError;
use crate::models::{DiscussionItem, RankedSectorList};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{error, info, warn};

pub use self::gemini::GeminiClient;
pub use self::prompt::{build_prompt, render_sectors};

pub const MISSING_KEY_PLACEHOLDER: &str = "⚠️ Gemini API Key Missing";
pub const GENERATION_FAILED_PLACEHOLDER: &str = "⚠️ Briefing generation failed";

/// Text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub struct BriefingComposer<'a> {
    /// `None` when no API key is configured.
    generator: Option<&'a dyn TextGenerator>,
    top_n: usize,
    threshold: f64,
    language: &'a str,
}

impl<'a> BriefingComposer<'a> {
    pub fn new(generator: Option<&'a dyn TextGenerator>, top_n: usize, threshold: f64, language: &'a str) -> Self {
        Self { generator, top_n, threshold, language }
    }

    pub fn prompt_for(&self, macro_text: &str, ranked: &RankedSectorList, discussions: &[DiscussionItem]) -> String {
        let sector_text = render_sectors(ranked.top_movers(self.top_n, self.threshold));
        build_prompt(macro_text, &sector_text, &render_digest(discussions), self.language)
    }

    /// Narrative from the generator, or a fixed placeholder. Never fails.
    pub async fn compose(&self, macro_text: &str, ranked: &RankedSectorList, discussions: &[DiscussionItem]) -> String {
        let Some(generator) = self.generator else {
            warn!("No generation key configured; using placeholder");
            return MISSING_KEY_PLACEHOLDER.to_string();
        };

        let prompt = self.prompt_for(macro_text, ranked, discussions);
        info!("Requesting briefing ({} chars of prompt)", prompt.chars().count());

        match generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Briefing generation failed: {}", e);
                GENERATION_FAILED_PLACEHOLDER.to_string()
            }
        }
    }
}

/// The message that goes to the chat: dated title, blank line, narrative.
pub fn final_message(date: NaiveDate, narrative: &str) -> String {
    format!("🗽 **{} Global Market Brief** 🗽\n\n{}", date.format("%Y-%m-%d"), narrative)
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Echoes a canned reply, or fails, and remembers every prompt.
    #[derive(Default)]
    pub struct FakeGenerator {
        pub reply: Option<String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        pub fn replying(text: &str) -> Self {
            Self { reply: Some(text.to_string()), ..Default::default() }
        }

        pub fn failing() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().ok_or(GenerationError::Status {
                status: 503,
                body: "overloaded".into(),
            })
        }
    }
}
