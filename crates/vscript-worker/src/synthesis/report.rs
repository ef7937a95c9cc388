//! Synthesis report rendering.
//!
//! The narrative report is prose over the structured patterns. The
//! generative service writes it when available; [`render_template_report`]
//! fills the same headings deterministically otherwise.

use std::fmt::Write as _;

use vscript_models::timestamp::format_clock;
use vscript_models::{SynthesisPatterns, TermCount};

/// Fixed report headings, in order.
pub const REPORT_HEADINGS: [&str; 6] = ["Hooks", "Structure", "CTAs", "Vocabulary", "Techniques", "SEO"];

/// Prompt asking the generative service to narrate `patterns`.
pub fn build_narrative_prompt(
    topic: &str,
    patterns: &SynthesisPatterns,
    items_analyzed: usize,
) -> String {
    let context = serde_json::to_string_pretty(patterns).unwrap_or_default();
    let headings = REPORT_HEADINGS
        .iter()
        .map(|h| format!("## {h}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Write a pattern synthesis report for YouTube videos about "{topic}".

The statistics below were aggregated from {items_analyzed} successful videos, weighted by
each video's effectiveness score. Summarize them as markdown using exactly these headings,
in this order:

{headings}

Use only facts present in the data. Do not invent examples, numbers or techniques.
Quote hook and CTA texts verbatim. Keep it under 600 words.

DATA:
{context}"#
    )
}

/// Whether a generated narrative carries every fixed heading.
pub fn has_required_headings(markdown: &str) -> bool {
    let headings: Vec<String> = markdown
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            line.starts_with('#')
                .then(|| line.trim_start_matches('#').trim().to_lowercase())
        })
        .collect();
    REPORT_HEADINGS.iter().all(|required| {
        let required = required.to_lowercase();
        headings.iter().any(|h| h.starts_with(&required))
    })
}

/// Deterministic report over the structured fields.
pub fn render_template_report(
    topic: &str,
    patterns: &SynthesisPatterns,
    items_analyzed: usize,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Pattern Synthesis: {topic}\n");
    let _ = write!(out, "Based on {items_analyzed} analyzed videos");
    match patterns.average_effectiveness {
        Some(avg) => {
            let _ = writeln!(out, " (average effectiveness {avg:.2}/5).\n");
        }
        None => {
            let _ = writeln!(out, ".\n");
        }
    }

    // Hooks
    let _ = writeln!(out, "## Hooks\n");
    if patterns.top_hooks.is_empty() {
        let _ = writeln!(out, "No opening hooks were identified.");
    }
    for (i, hook) in patterns.top_hooks.iter().enumerate() {
        let _ = write!(
            out,
            "{}. \"{}\" ({}, used by {} video{}",
            i + 1,
            hook.text,
            hook.hook_type.as_str(),
            hook.frequency,
            plural(hook.frequency)
        );
        if let Some(score) = hook.effectiveness {
            let _ = write!(out, ", effectiveness {score:.2}");
        }
        let _ = writeln!(out, ")");
    }
    if !patterns.hook_groups.is_empty() {
        let _ = writeln!(out, "\nHook types:");
        for group in &patterns.hook_groups {
            let _ = writeln!(
                out,
                "- {}: {} video{}",
                group.hook_type.as_str(),
                group.frequency,
                plural(group.frequency)
            );
        }
    }

    // Structure
    let s = &patterns.optimal_structure;
    let _ = writeln!(out, "\n## Structure\n");
    let _ = writeln!(out, "- Target length: {}", format_clock(s.total_target_seconds as f64));
    if let Some(secs) = s.hook_duration_seconds {
        let _ = write!(out, "- Hook length: {secs}s");
        if let Some(range) = s.hook_duration_range {
            let _ = write!(out, " (observed {}-{}s)", range.min_seconds, range.max_seconds);
        }
        let _ = writeln!(out);
    }
    if let Some(secs) = s.intro_duration_seconds {
        let _ = writeln!(out, "- Intro ends at: {}", format_clock(secs as f64));
    }
    if let Some(count) = s.section_count {
        let _ = writeln!(out, "- Sections: {count}");
    }
    if let Some(secs) = s.section_duration_seconds {
        let _ = writeln!(out, "- Average section length: {}", format_clock(secs as f64));
    }

    // CTAs
    let _ = writeln!(out, "\n## CTAs\n");
    if patterns.effective_ctas.is_empty() {
        let _ = writeln!(out, "No calls to action were identified.");
    }
    for cta in &patterns.effective_ctas {
        let _ = write!(
            out,
            "- \"{}\" ({}, {} video{}",
            cta.text,
            cta.cta_type.as_str(),
            cta.frequency,
            plural(cta.frequency)
        );
        if let Some(pos) = cta.position_percent {
            let _ = write!(out, ", at ~{pos:.0}% of the video");
        }
        let _ = writeln!(out, ")");
    }

    // Vocabulary
    let v = &patterns.key_vocabulary;
    let _ = writeln!(out, "\n## Vocabulary\n");
    let _ = writeln!(out, "- Technical terms: {}", term_list(&v.technical_terms));
    let _ = writeln!(out, "- Transition phrases: {}", term_list(&v.transition_phrases));
    if !v.common_phrases.is_empty() {
        let _ = writeln!(out, "- Common phrases: {}", term_list(&v.common_phrases));
    }

    // Techniques
    let _ = writeln!(out, "\n## Techniques\n");
    if patterns.notable_techniques.is_empty() {
        let _ = writeln!(out, "No notable techniques were identified.");
    }
    for t in &patterns.notable_techniques {
        if t.description.is_empty() {
            let _ = writeln!(out, "- **{}** ({}x)", t.name, t.frequency);
        } else {
            let _ = writeln!(out, "- **{}** ({}x): {}", t.name, t.frequency, t.description);
        }
    }

    // SEO
    let seo = &patterns.seo_patterns;
    let _ = writeln!(out, "\n## SEO\n");
    let _ = writeln!(out, "- Title keywords: {}", term_list(&seo.title_keywords));
    let _ = writeln!(out, "- Tags: {}", term_list(&seo.tags));

    out
}

fn term_list(terms: &[TermCount]) -> String {
    if terms.is_empty() {
        return "none".to_string();
    }
    terms
        .iter()
        .map(|t| format!("{} ({})", t.term, t.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
