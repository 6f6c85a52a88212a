//! Grounded answer generation.

use super::Context;
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatTurn, LanguageModel};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Asks the language model to answer from the supplied context only.
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self { llm, prompts }
    }

    /// Answer returned when there is nothing to ground on.
    pub fn no_context_answer(&self) -> &str {
        &self.prompts.rag.no_context_answer
    }

    /// The two turns sent to the model: the grounding instruction, then the
    /// context followed by the literal question.
    pub fn turns(&self, question: &str, context: &str) -> Vec<ChatTurn> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());

        vec![
            ChatTurn::system(self.prompts.rag.system.clone()),
            ChatTurn::user(self.prompts.render_with_custom(&self.prompts.rag.user, &vars)),
        ]
    }

    /// Generate an answer. An empty context short-circuits to the fixed
    /// fallback without calling the model. Model failures propagate unchanged.
    #[instrument(skip(self, context), fields(model = %self.llm.model()))]
    pub async fn answer(&self, question: &str, context: &Context) -> Result<String> {
        if context.is_empty() {
            debug!("Empty context, skipping model call");
            return Ok(self.no_context_answer().to_string());
        }

        let turns = self.turns(question, context.as_str());
        self.llm.generate(&turns).await
    }
}
