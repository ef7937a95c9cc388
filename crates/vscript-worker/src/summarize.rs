//! Single-video summarizer: transcript in, executive summary out.
//!
//! The generative service answers in a fixed markdown layout (executive
//! summary, key points, important moments, conclusion, action items) that
//! is parsed back into a [`VideoSummary`]. Headings are matched by their
//! English or Spanish label; decoration such as emoji is ignored.

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use regex::Regex;
use tracing::info;

use vscript_llm::{strip_code_fences, GenerationRequest, LlmError, TextGenerator};
use vscript_models::{extract_youtube_id, TimestampedSection, Transcript, VideoSummary};

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::retry::{retry_async, RetryConfig};
use crate::script::{round1, WORDS_PER_MINUTE};

/// Words sampled for language detection.
const LANGUAGE_SAMPLE_WORDS: usize = 500;

const ENGLISH_MARKERS: &[&str] = &[
    "the", "is", "are", "and", "or", "but", "in", "on", "at", "to", "for", "with", "this", "that",
    "how", "what", "english",
];

const SPANISH_MARKERS: &[&str] = &[
    "el", "la", "los", "las", "de", "que", "es", "en", "un", "una", "para", "con", "por", "está",
    "son", "pero", "cómo", "qué", "español",
];

/// `1. item`, `- item`, `* item`
static LIST_ITEM_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+\.|[-*])\s+(.+?)\s*$").ok());

/// `- **05:30** - description`
static MOMENT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*]\s+\*\*(\d{1,2}:\d{2}(?::\d{2})?)\*\*\s*[-–—:]\s*(.+?)\s*$").ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Executive,
    KeyPoints,
    Moments,
    Conclusion,
    Actions,
}

/// Summarizes one transcribed video.
pub struct VideoSummarizer {
    generator: Arc<dyn TextGenerator>,
    retry: RetryConfig,
    transcript_chars: usize,
}

impl VideoSummarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            retry: RetryConfig::new("video_summary"),
            transcript_chars: 120_000,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_transcript_chars(mut self, chars: usize) -> Self {
        self.transcript_chars = chars.max(1);
        self
    }

    /// Summarize the video at `url`. Fails when the transcript is blank,
    /// the service fails, or the reply has neither an executive summary nor
    /// key points.
    pub async fn summarize(
        &self,
        url: &str,
        title: &str,
        transcript: &Transcript,
    ) -> WorkerResult<VideoSummary> {
        if transcript.is_blank() {
            return Err(WorkerError::invalid_input("transcript is empty"));
        }

        let language = transcript
            .language
            .as_deref()
            .and_then(supported_language)
            .unwrap_or_else(|| detect_language(&transcript.text));
        let word_count = transcript.word_count();
        let duration_minutes = round1(word_count as f64 / WORDS_PER_MINUTE);
        info!(title = %title, language = language, words = word_count, "Summarizing video");

        let prompt = build_prompt(
            title,
            &transcript.to_prompt_text(self.transcript_chars),
            word_count,
            duration_minutes,
            language,
        );
        let reply = retry_async(&self.retry, LlmError::is_retryable, || {
            let request = GenerationRequest::new(prompt.clone()).with_temperature(0.3);
            self.generator.generate(request)
        })
        .await?;

        let summary = parse_summary(strip_code_fences(&reply));
        if summary.executive_summary.is_empty() && summary.key_points.is_empty() {
            return Err(WorkerError::summary_failed(
                "reply had neither an executive summary nor key points",
            ));
        }

        metrics::record_summary(language);
        info!(
            key_points = summary.key_points.len(),
            moments = summary.timestamps.len(),
            actions = summary.action_items.len(),
            "Summary generated"
        );

        Ok(VideoSummary {
            video_url: url.to_string(),
            video_title: title.to_string(),
            video_id: extract_youtube_id(url).ok(),
            executive_summary: summary.executive_summary,
            key_points: summary.key_points,
            timestamps: summary.timestamps,
            conclusion: summary.conclusion,
            action_items: summary.action_items,
            word_count,
            estimated_duration_minutes: duration_minutes,
            language: language.to_string(),
            generated_at: Utc::now(),
        })
    }
}

/// `en` or `es` from a language tag such as `en-US`; `None` for others.
fn supported_language(tag: &str) -> Option<&'static str> {
    match tag.trim().to_lowercase().get(..2) {
        Some("en") => Some("en"),
        Some("es") => Some("es"),
        _ => None,
    }
}

/// Guess `en` or `es` from common function words in the first few hundred
/// words. Inconclusive text is treated as Spanish.
pub fn detect_language(text: &str) -> &'static str {
    let mut english = 0usize;
    let mut spanish = 0usize;
    for word in text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .take(LANGUAGE_SAMPLE_WORDS)
    {
        let word = word.to_lowercase();
        if ENGLISH_MARKERS.contains(&word.as_str()) {
            english += 1;
        }
        if SPANISH_MARKERS.contains(&word.as_str()) {
            spanish += 1;
        }
    }
    if spanish >= english {
        "es"
    } else {
        "en"
    }
}

/// Sections recovered from a summary reply.
#[derive(Debug, Default, PartialEq)]
struct ParsedSummary {
    executive_summary: String,
    key_points: Vec<String>,
    timestamps: Vec<TimestampedSection>,
    conclusion: String,
    action_items: Vec<String>,
}

fn parse_summary(markdown: &str) -> ParsedSummary {
    let mut parsed = ParsedSummary::default();
    for (part, body) in split_sections(markdown) {
        match part {
            Part::Executive if parsed.executive_summary.is_empty() => {
                parsed.executive_summary = paragraph(&body);
            }
            Part::KeyPoints if parsed.key_points.is_empty() => {
                parsed.key_points = list_items(&body);
            }
            Part::Moments if parsed.timestamps.is_empty() => {
                parsed.timestamps = moments(&body);
            }
            Part::Conclusion if parsed.conclusion.is_empty() => {
                parsed.conclusion = paragraph(&body);
            }
            Part::Actions if parsed.action_items.is_empty() => {
                parsed.action_items = list_items(&body);
            }
            _ => {}
        }
    }
    parsed
}

/// Bodies of the recognised `##` sections, in document order. A section
/// ends at the next `##` heading or a `---` rule.
fn split_sections(markdown: &str) -> Vec<(Part, String)> {
    let mut sections = Vec::new();
    let mut current: Option<(Part, Vec<&str>)> = None;

    for line in markdown.lines() {
        let trimmed = line.trim();
        let is_heading = trimmed.starts_with("##");
        if is_heading || trimmed == "---" {
            if let Some((part, lines)) = current.take() {
                sections.push((part, lines.join("\n")));
            }
            if is_heading {
                current = classify_heading(trimmed).map(|part| (part, Vec::new()));
            }
            continue;
        }
        if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((part, lines)) = current {
        sections.push((part, lines.join("\n")));
    }
    sections
}

fn classify_heading(heading: &str) -> Option<Part> {
    let label: String = heading
        .trim_start_matches('#')
        .chars()
        .skip_while(|c| !c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();

    let table: [(&[&str], Part); 5] = [
        (&["executive summary", "resumen ejecutivo"], Part::Executive),
        (&["key points", "puntos clave"], Part::KeyPoints),
        (&["important moments", "momentos importantes", "timestamps"], Part::Moments),
        (&["conclusion", "conclusión"], Part::Conclusion),
        (&["action items", "acciones"], Part::Actions),
    ];
    table
        .into_iter()
        .find(|(labels, _)| labels.iter().any(|l| label.starts_with(l)))
        .map(|(_, part)| part)
}

fn paragraph(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn list_items(body: &str) -> Vec<String> {
    let Some(re) = LIST_ITEM_RE.as_ref() else {
        return Vec::new();
    };
    body.lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|item| !item.is_empty())
        .collect()
}

fn moments(body: &str) -> Vec<TimestampedSection> {
    let Some(re) = MOMENT_RE.as_ref() else {
        return Vec::new();
    };
    body.lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| Some(TimestampedSection::new(caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect()
}

fn build_prompt(
    title: &str,
    transcript: &str,
    word_count: usize,
    duration_minutes: f64,
    language: &str,
) -> String {
    if language == "es" {
        format!(
            r#"Analiza la siguiente transcripción de un video de YouTube y genera un resumen ejecutivo.

VIDEO: {title}
DURACIÓN: ~{duration_minutes:.1} minutos
PALABRAS: {word_count}

TRANSCRIPCIÓN:
{transcript}

---

Genera un resumen estructurado siguiendo EXACTAMENTE este formato Markdown:

# Resumen: {title}

## Resumen Ejecutivo
[2-3 líneas: de qué trata el video, qué temas cubre y qué se aprende]

## Puntos Clave
1. **[Tema]**: [explicación breve]
[5-7 puntos]

## Momentos Importantes
- **00:00** - [descripción breve]
- **MM:SS** - [descripción]
[5-8 momentos; usa los timestamps de la transcripción si existen, si no infiérelos por la secuencia]

## Conclusión
[1-2 líneas con el mensaje principal]

## Action Items
1. [acción concreta que el espectador puede tomar]
[3-5 acciones]

Reglas:
- Usa exactamente los encabezados de arriba
- Timestamps en formato **MM:SS** en negrita
- No inventes información que no esté en la transcripción"#
        )
    } else {
        format!(
            r#"Analyze the following YouTube video transcript and generate an executive summary.

VIDEO: {title}
DURATION: ~{duration_minutes:.1} minutes
WORDS: {word_count}

TRANSCRIPT:
{transcript}

---

Generate a structured summary following EXACTLY this Markdown format:

# Summary: {title}

## Executive Summary
[2-3 lines: what the video is about, which topics it covers, what viewers learn]

## Key Points
1. **[Topic]**: [brief explanation]
[5-7 points]

## Important Moments
- **00:00** - [brief description]
- **MM:SS** - [description]
[5-8 moments; use the transcript's timestamps when present, otherwise infer them from the sequence]

## Conclusion
[1-2 lines with the main takeaway]

## Action Items
1. [concrete action the viewer can take]
[3-5 actions]

Rules:
- Use exactly the headings above
- Timestamps in bold **MM:SS** format
- Do not invent information that is not in the transcript"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vscript_llm::{CannedGenerator, CannedReply};
    use vscript_models::TranscriptSource;

    const REPLY: &str = "
# 📹 Summary: Python Tutorial

## 🎯 Executive Summary
This is a test summary about Python programming.
It covers functions and classes.

## 🔑 Key Points
1. **Functions**: How to define them
2. **Classes**: How to use them
3. **Modules**: How to split code

## ⏱️ Important Moments
- **00:00** - Introduction to the topic
- **05:30** - Main concept explained
- **1:02:45** - Practical demo
- 07:00 - missing bold is ignored

## 💡 Conclusion
Great video about Python.

## ✅ Action Items
- Practice Python
* Build a project
3. Share knowledge

---
**📊 Statistics**: 9 words | ~0.1 minutes of content
";

    #[test]
    fn test_detect_language() {
        assert_eq!(
            detect_language("This is a video about Python. We learn how to use the functions."),
            "en"
        );
        assert_eq!(
            detect_language("Este es un video sobre Python. Vamos a aprender cómo usar las funciones."),
            "es"
        );
        assert_eq!(detect_language("n8n docker compose"), "es");
    }

    #[test]
    fn test_supported_language() {
        assert_eq!(supported_language("en-US"), Some("en"));
        assert_eq!(supported_language("ES"), Some("es"));
        assert_eq!(supported_language("fr"), None);
        assert_eq!(supported_language(""), None);
    }

    #[test]
    fn test_parse_summary_sections() {
        let parsed = parse_summary(REPLY);
        assert_eq!(
            parsed.executive_summary,
            "This is a test summary about Python programming. It covers functions and classes."
        );
        assert_eq!(parsed.key_points.len(), 3);
        assert_eq!(parsed.key_points[0], "**Functions**: How to define them");
        assert_eq!(parsed.conclusion, "Great video about Python.");
        assert_eq!(
            parsed.action_items,
            vec!["Practice Python", "Build a project", "Share knowledge"]
        );

        let stamps: Vec<_> = parsed.timestamps.iter().map(|t| t.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["00:00", "05:30", "1:02:45"]);
        assert_eq!(parsed.timestamps[1].description, "Main concept explained");
    }

    #[test]
    fn test_parse_spanish_headings() {
        let reply = "## 🎯 Resumen Ejecutivo\nUn video sobre n8n.\n\n## 🔑 Puntos Clave\n1. Instalar\n2. Configurar\n\n## 💡 Conclusión\nMuy útil.";
        let parsed = parse_summary(reply);
        assert_eq!(parsed.executive_summary, "Un video sobre n8n.");
        assert_eq!(parsed.key_points, vec!["Instalar", "Configurar"]);
        assert_eq!(parsed.conclusion, "Muy útil.");
        assert!(parsed.timestamps.is_empty());
    }

    #[test]
    fn test_parse_fenced_reply() {
        let fenced = format!("```markdown\n{REPLY}\n```");
        let parsed = parse_summary(strip_code_fences(&fenced));
        assert_eq!(parsed.key_points.len(), 3);
        assert_eq!(parsed.action_items.len(), 3);
    }

    #[test]
    fn test_unknown_headings_ignored() {
        let parsed = parse_summary("## Something else\n1. not a key point\n");
        assert_eq!(parsed, ParsedSummary::default());
    }

    fn transcript(text: &str) -> Transcript {
        Transcript::from_text(text, TranscriptSource::Provided)
    }

    #[tokio::test]
    async fn test_summarize_builds_summary() {
        let generator = CannedGenerator::with_fallback(CannedReply::text(REPLY));
        let summarizer = VideoSummarizer::new(Arc::new(generator));

        let summary = summarizer
            .summarize(
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "Python Tutorial",
                &transcript("This is a test transcript about the Python language."),
            )
            .await
            .unwrap();

        assert_eq!(summary.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(summary.language, "en");
        assert_eq!(summary.word_count, 9);
        assert_eq!(summary.estimated_duration_minutes, 0.1);
        assert_eq!(summary.key_points.len(), 3);
        assert_eq!(summary.timestamps.len(), 3);
        assert_eq!(summary.action_items.len(), 3);
    }

    #[tokio::test]
    async fn test_summarize_prefers_transcript_language_and_spanish_prompt() {
        let generator = Arc::new(
            CannedGenerator::unavailable()
                .when("Genera un resumen estructurado", CannedReply::text(REPLY)),
        );
        let summarizer = VideoSummarizer::new(generator);

        let summary = summarizer
            .summarize(
                "https://youtu.be/dQw4w9WgXcQ",
                "Tutorial",
                &transcript("the the the").with_language("es"),
            )
            .await
            .unwrap();
        assert_eq!(summary.language, "es");
    }

    #[tokio::test]
    async fn test_summarize_failures() {
        let summarizer = VideoSummarizer::new(Arc::new(CannedGenerator::with_fallback(
            CannedReply::text("Sorry, I can't help with that."),
        )));
        let err = summarizer
            .summarize("https://youtu.be/x", "t", &transcript("some words here"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::SummaryFailed(_)));

        let err = summarizer
            .summarize("https://youtu.be/x", "t", &transcript("   "))
            .await
            .unwrap_err();
        assert!(err.is_client_error());

        let summarizer = VideoSummarizer::new(Arc::new(CannedGenerator::with_fallback(
            CannedReply::QuotaExceeded,
        )));
        let err = summarizer
            .summarize("https://youtu.be/x", "t", &transcript("some words here"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Llm(_)));
    }
}
