//! Spanish translation of generated scripts.

use std::sync::Arc;

use tracing::{info, warn};

use vscript_llm::{strip_code_fences, GenerationRequest, LlmResult, TextGenerator};
use vscript_models::{GeneratedScript, SeoMetadata};

use crate::metrics;
use crate::script::spoken_word_count;

/// Tag count cap after adding Spanish variants.
pub const MAX_TAGS: usize = 30;

/// Prefix of the script body when content translation fails.
pub const TRANSLATION_FAILED_PREFIX: &str = "⚠️ Translation failed. Original script below:";

/// Generic English tags with a Spanish variant.
const TAG_TRANSLATIONS: &[(&str, &str)] = &[
    ("tutorial", "tutorial"),
    ("guide", "guía"),
    ("beginner", "principiante"),
    ("beginners", "principiantes"),
    ("installation", "instalación"),
    ("setup", "configuración"),
    ("how to", "cómo"),
    ("step by step", "paso a paso"),
    ("quick start", "inicio rápido"),
    ("getting started", "primeros pasos"),
    ("automation", "automatización"),
    ("workflow", "flujo de trabajo"),
    ("free", "gratis"),
    ("local", "local"),
    ("self-hosted", "auto-alojado"),
];

/// Translates scripts to Spanish, keeping technical terms and markdown.
pub struct ScriptTranslator {
    generator: Arc<dyn TextGenerator>,
}

impl ScriptTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Spanish copy of `script`. Never fails: each part falls back to the
    /// original on error.
    pub async fn translate_to_spanish(&self, script: &GeneratedScript) -> GeneratedScript {
        info!(title = %script.seo.title, "Translating script to Spanish");

        let script_markdown = match self
            .ask(content_prompt(&script.script_markdown, &script.seo.title))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Script translation failed, keeping original");
                format!(
                    "{TRANSLATION_FAILED_PREFIX}\n\n{}",
                    script.script_markdown
                )
            }
        };

        let title = match self.ask(title_prompt(&script.seo.title)).await {
            Ok(text) => strip_quotes(&text).to_string(),
            Err(e) => {
                warn!(error = %e, "Title translation failed, using original");
                script.seo.title.clone()
            }
        };

        let description = match self.ask(description_prompt(&script.seo.description)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Description translation failed, using original");
                script.seo.description.clone()
            }
        };

        let seo = SeoMetadata {
            title,
            description,
            tags: adapt_tags(&script.seo.tags),
        };
        let seo_validation = seo.validate();
        metrics::record_script_generated("es");

        GeneratedScript {
            word_count: spoken_word_count(&script_markdown),
            script_markdown,
            seo_validation,
            seo,
            language: "es".to_string(),
            ..script.clone()
        }
    }

    /// One translation call; blank output counts as a failure.
    async fn ask(&self, prompt: String) -> LlmResult<String> {
        let text = self
            .generator
            .generate(GenerationRequest::new(prompt).with_temperature(0.3))
            .await?;
        let text = strip_code_fences(&text).trim().to_string();
        if text.is_empty() {
            return Err(vscript_llm::LlmError::empty("translation"));
        }
        Ok(text)
    }
}

/// Original tags plus Spanish variants of generic ones, capped at [`MAX_TAGS`].
pub fn adapt_tags(tags: &[String]) -> Vec<String> {
    let mut adapted: Vec<String> = tags.to_vec();
    for tag in tags {
        let lower = tag.trim().to_lowercase();
        let variant = TAG_TRANSLATIONS
            .iter()
            .find(|(en, _)| *en == lower)
            .map(|(_, es)| *es);
        if let Some(es) = variant {
            if !adapted.iter().any(|t| t == es) {
                adapted.push(es.to_string());
            }
        }
    }
    adapted.truncate(MAX_TAGS);
    adapted
}

fn strip_quotes(text: &str) -> &str {
    let text = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    text
}

fn content_prompt(content: &str, title: &str) -> String {
    format!(
        r#"Translate the following YouTube script to Spanish.

CONTEXT: a technical tutorial script titled "{title}"

RULES:
1. Natural, neutral Spanish (Spain and Latin America)
2. Keep software names, programming terms, commands and code blocks in English
3. Adapt expressions idiomatically, not literally
4. Keep the markdown exactly: headers, bold, lists, code blocks
5. Adapt CTAs to Spanish style ("Subscribe" -> "Suscríbete", "Comment below" -> "Déjame un comentario")
6. Keep every timestamp

SCRIPT TO TRANSLATE:
{content}

OUTPUT: only the translated script."#
    )
}

fn title_prompt(title: &str) -> String {
    format!(
        r#"Translate this YouTube video title to Spanish.

RULES: SEO-friendly and engaging, keep tool and software names, at most 100 characters.

ORIGINAL TITLE:
{title}

OUTPUT: only the translated title."#
    )
}

fn description_prompt(description: &str) -> String {
    format!(
        r#"Translate this YouTube video description to Spanish.

RULES: engaging and SEO-friendly, keep technical terms and tool names, similar length.

ORIGINAL DESCRIPTION:
{description}

OUTPUT: only the translated description."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vscript_llm::{CannedGenerator, CannedReply};

    fn script() -> GeneratedScript {
        let seo = SeoMetadata {
            title: "Install n8n locally".to_string(),
            description: "Learn to install n8n.".to_string(),
            tags: vec!["n8n".to_string(), "Tutorial".to_string(), "setup".to_string()],
        };
        GeneratedScript {
            user_idea: "n8n".to_string(),
            script_markdown: "# Intro\n[00:00] Hello everyone".to_string(),
            seo_validation: seo.validate(),
            seo,
            estimated_duration_minutes: 10.0,
            word_count: 2,
            target_duration_minutes: 10.0,
            language: "en".to_string(),
            style: None,
            synthesis_topic: "n8n".to_string(),
            reference_count: 3,
            estimated_quality_score: 50,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_adapt_tags() {
        let tags: Vec<String> = ["n8n", "Tutorial", "setup", "how to", "configuración"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            adapt_tags(&tags),
            vec!["n8n", "Tutorial", "setup", "how to", "configuración", "tutorial", "cómo"]
        );
    }

    #[test]
    fn test_adapt_tags_caps() {
        let tags: Vec<String> = (0..29).map(|i| format!("t{i}")).chain(["guide".into(), "free".into()]).collect();
        assert_eq!(adapt_tags(&tags).len(), MAX_TAGS);
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"Instala n8n\""), "Instala n8n");
        assert_eq!(strip_quotes("Sin comillas"), "Sin comillas");
    }

    #[tokio::test]
    async fn test_translate_to_spanish() {
        let generator = CannedGenerator::new("unused")
            .when("SCRIPT TO TRANSLATE", CannedReply::text("# Intro\n[00:00] Hola a todos"))
            .when("ORIGINAL TITLE", CannedReply::text("\"Instala n8n en local\""))
            .when("ORIGINAL DESCRIPTION", CannedReply::Network);
        let translated = ScriptTranslator::new(Arc::new(generator))
            .translate_to_spanish(&script())
            .await;

        assert_eq!(translated.language, "es");
        assert_eq!(translated.script_markdown, "# Intro\n[00:00] Hola a todos");
        assert_eq!(translated.seo.title, "Instala n8n en local");
        assert_eq!(translated.seo.description, "Learn to install n8n.");
        assert_eq!(translated.seo.tags, vec!["n8n", "Tutorial", "setup", "tutorial", "configuración"]);
        assert_eq!(translated.word_count, 3);
    }

    #[tokio::test]
    async fn test_translation_failure_keeps_original() {
        let translated = ScriptTranslator::new(Arc::new(CannedGenerator::unavailable()))
            .translate_to_spanish(&script())
            .await;

        assert!(translated.script_markdown.starts_with(TRANSLATION_FAILED_PREFIX));
        assert!(translated.script_markdown.ends_with("[00:00] Hello everyone"));
        assert_eq!(translated.seo.title, "Install n8n locally");
    }
}
