//! Single-video executive summaries.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Importance given to moments parsed without an explicit rating.
pub const DEFAULT_MOMENT_IMPORTANCE: u8 = 3;

/// A notable moment in the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimestampedSection {
    /// `MM:SS` or `HH:MM:SS`, as written in the summary
    pub timestamp: String,
    pub description: String,
    /// 1-5
    pub importance: u8,
}

impl TimestampedSection {
    pub fn new(timestamp: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            description: description.into(),
            importance: DEFAULT_MOMENT_IMPORTANCE,
        }
    }
}

/// Executive summary of one video, parsed from the generative service's
/// markdown reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSummary {
    pub video_url: String,
    pub video_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,

    pub executive_summary: String,
    pub key_points: Vec<String>,
    pub timestamps: Vec<TimestampedSection>,
    pub conclusion: String,
    pub action_items: Vec<String>,

    /// Transcript word count
    pub word_count: usize,
    /// Spoken duration estimate from the word count
    pub estimated_duration_minutes: f64,
    /// `en` or `es`
    pub language: String,

    pub generated_at: DateTime<Utc>,
}

impl VideoSummary {
    pub fn is_spanish(&self) -> bool {
        self.language == "es"
    }

    /// Markdown rendering with headings in the summary's language.
    pub fn to_markdown(&self) -> String {
        let labels = if self.is_spanish() {
            &SPANISH_LABELS
        } else {
            &ENGLISH_LABELS
        };

        let mut out = format!("# {}: {}\n\n", labels.title, self.video_title);
        out.push_str(&format!("{}\n\n", self.video_url));

        out.push_str(&format!("## {}\n\n{}\n\n", labels.executive, self.executive_summary));

        out.push_str(&format!("## {}\n\n", labels.key_points));
        for (i, point) in self.key_points.iter().enumerate() {
            out.push_str(&format!("{}. {point}\n", i + 1));
        }

        out.push_str(&format!("\n## {}\n\n", labels.moments));
        for moment in &self.timestamps {
            out.push_str(&format!("- **{}** - {}\n", moment.timestamp, moment.description));
        }

        out.push_str(&format!("\n## {}\n\n{}\n\n", labels.conclusion, self.conclusion));

        out.push_str(&format!("## {}\n\n", labels.actions));
        for (i, action) in self.action_items.iter().enumerate() {
            out.push_str(&format!("{}. {action}\n", i + 1));
        }

        out.push_str(&format!(
            "\n---\n**{}**: {} {} | ~{:.1} {}\n",
            labels.stats, self.word_count, labels.words, self.estimated_duration_minutes, labels.minutes
        ));
        out
    }
}

struct Labels {
    title: &'static str,
    executive: &'static str,
    key_points: &'static str,
    moments: &'static str,
    conclusion: &'static str,
    actions: &'static str,
    stats: &'static str,
    words: &'static str,
    minutes: &'static str,
}

const ENGLISH_LABELS: Labels = Labels {
    title: "Summary",
    executive: "Executive Summary",
    key_points: "Key Points",
    moments: "Important Moments",
    conclusion: "Conclusion",
    actions: "Action Items",
    stats: "Statistics",
    words: "words",
    minutes: "minutes",
};

const SPANISH_LABELS: Labels = Labels {
    title: "Resumen",
    executive: "Resumen Ejecutivo",
    key_points: "Puntos Clave",
    moments: "Momentos Importantes",
    conclusion: "Conclusión",
    actions: "Action Items",
    stats: "Estadísticas",
    words: "palabras",
    minutes: "minutos",
};
