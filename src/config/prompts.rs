//! Prompt templates for Cinerag.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for grounded answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// System turn. Restricts the model to the supplied context and names the
    /// phrase it must use when the context is insufficient.
    pub system: String,
    /// User turn. `{{context}}` and `{{question}}` are substituted.
    pub user: String,
    /// Returned verbatim when retrieval produced no candidates.
    pub no_context_answer: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "Eres un asistente de IMDB. Responde únicamente usando el CONTEXTO \
                     proporcionado. Si la información no está allí, responde: \
                     'No puedo responder con la información disponible.'"
                .to_string(),
            user: "Contexto:\n{{context}}\n\nPregunta: {{question}}".to_string(),
            no_context_answer: "No se encontraron documentos similares.".to_string(),
        }
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder regex is valid")
    })
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass: text inserted for one placeholder is never
    /// scanned for further placeholders. Unknown placeholders are left untouched.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_pattern()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.system.contains("No puedo responder con la información disponible."));
        assert!(prompts.rag.user.contains("{{context}}"));
        assert!(prompts.rag.user.contains("{{question}}"));
        assert_eq!(prompts.rag.no_context_answer, "No se encontraron documentos similares.");
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_reexpand_values() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "Título: Up.".to_string());
        vars.insert("question".to_string(), "what is {{context}}?".to_string());

        let result = Prompts::render("Contexto:\n{{context}}\n\nPregunta: {{question}}", &vars);
        assert_eq!(result, "Contexto:\nTítulo: Up.\n\nPregunta: what is {{context}}?");
    }

    #[test]
    fn test_render_with_custom_precedence() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("tone".to_string(), "formal".to_string());
        prompts.variables.insert("question".to_string(), "shadowed".to_string());

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "real".to_string());

        let result = prompts.render_with_custom("{{tone}} {{question}} {{missing}}", &vars);
        assert_eq!(result, "formal real {{missing}}");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "system = \"Answer in English.\"\nno_context_answer = \"Nothing found.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.system, "Answer in English.");
        assert_eq!(prompts.rag.no_context_answer, "Nothing found.");
        // Unset keys keep their defaults.
        assert!(prompts.rag.user.contains("{{question}}"));
    }
}
