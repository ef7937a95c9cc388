//! Weighted aggregation of per-item analyses.
//!
//! Pure and order-independent: the input is put into a canonical order
//! first and every ranking ends in a total tie-break, so any permutation of
//! the same analyses yields identical output.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use vscript_models::{
    CallToAction, CtaType, HookGroup, HookType, ItemAnalysis, KeyVocabulary, OpeningHook,
    OptimalStructure, RankedCta, RankedHook, RankedTechnique, SecondsRange, SeoPatterns,
    SeoSource, SeoTerm, SynthesisPatterns, TermCount,
};

use crate::error::{WorkerError, WorkerResult};

pub const TOP_HOOKS: usize = 10;
pub const TOP_CTAS: usize = 15;
pub const TOP_TECHNICAL_TERMS: usize = 20;
pub const TOP_TRANSITION_PHRASES: usize = 10;
pub const TOP_COMMON_PHRASES: usize = 10;
pub const TOP_SEO_TERMS: usize = 20;

/// Aggregate `analyses` into the structured part of a synthesis.
///
/// Fails only when `analyses` is empty. Items missing a field simply do
/// not contribute to that field.
pub fn aggregate(
    topic: &str,
    analyses: &[ItemAnalysis],
    target_minutes: f64,
) -> WorkerResult<SynthesisPatterns> {
    if analyses.is_empty() {
        return Err(WorkerError::insufficient_data(None, 0));
    }

    let cohort = canonical_order(analyses);
    let weights: Vec<f64> = cohort.iter().filter_map(|a| a.weight()).collect();

    let (top_hooks, hook_groups) = rank_hooks(&cohort);
    let patterns = SynthesisPatterns {
        top_hooks,
        hook_groups,
        optimal_structure: optimal_structure(&cohort, target_minutes),
        effective_ctas: rank_ctas(&cohort),
        key_vocabulary: key_vocabulary(&cohort),
        notable_techniques: notable_techniques(&cohort),
        seo_patterns: seo_patterns(&cohort),
        average_effectiveness: mean(&weights).map(round2),
        weighted_items: weights.len(),
    };

    debug!(
        topic = %topic,
        items = cohort.len(),
        weighted = patterns.weighted_items,
        hooks = patterns.top_hooks.len(),
        ctas = patterns.effective_ctas.len(),
        "Aggregated cohort"
    );
    Ok(patterns)
}

fn canonical_order(analyses: &[ItemAnalysis]) -> Vec<&ItemAnalysis> {
    let mut keyed: Vec<(String, &ItemAnalysis)> = analyses
        .iter()
        .map(|a| (serde_json::to_string(a).unwrap_or_default(), a))
        .collect();
    keyed.sort_by(|(ka, a), (kb, b)| a.item_id.cmp(&b.item_id).then_with(|| ka.cmp(kb)));
    keyed.into_iter().map(|(_, a)| a).collect()
}

// ============================================================================
// Hooks
// ============================================================================

struct HookBucket<'a> {
    hook_type: HookType,
    contributors: Vec<(&'a ItemAnalysis, &'a OpeningHook)>,
}

/// Contributor order: weight desc, recency desc, shorter text, text, item ID.
fn cmp_hook_contributor(
    (a_item, a_hook): &(&ItemAnalysis, &OpeningHook),
    (b_item, b_hook): &(&ItemAnalysis, &OpeningHook),
) -> Ordering {
    cmp_desc_some_first(a_item.weight(), b_item.weight())
        .then_with(|| cmp_date_desc(a_item.published_at, b_item.published_at))
        .then_with(|| a_hook.text.chars().count().cmp(&b_hook.text.chars().count()))
        .then_with(|| a_hook.text.cmp(&b_hook.text))
        .then_with(|| a_item.item_id.cmp(&b_item.item_id))
}

fn rank_hooks(cohort: &[&ItemAnalysis]) -> (Vec<RankedHook>, Vec<HookGroup>) {
    let mut buckets: BTreeMap<(HookType, String), HookBucket> = BTreeMap::new();
    let mut by_type: BTreeMap<HookType, Vec<(&ItemAnalysis, &OpeningHook)>> = BTreeMap::new();

    for item in cohort {
        let Some(hook) = item.hook.as_ref() else {
            continue;
        };
        let key = phrase_key(&hook.text);
        if key.is_empty() {
            continue;
        }
        buckets
            .entry((hook.hook_type, key))
            .or_insert_with(|| HookBucket {
                hook_type: hook.hook_type,
                contributors: Vec::new(),
            })
            .contributors
            .push((*item, hook));
        by_type.entry(hook.hook_type).or_default().push((*item, hook));
    }

    let type_frequency: BTreeMap<HookType, usize> = by_type
        .iter()
        .map(|(t, contributors)| (*t, distinct_items(contributors.iter().map(|(i, _)| *i))))
        .collect();

    let mut ranked: Vec<(_, RankedHook)> = buckets
        .into_values()
        .filter_map(|mut bucket| {
            bucket.contributors.sort_by(cmp_hook_contributor);
            let best = *bucket.contributors.first()?;
            let weights: Vec<f64> = bucket.contributors.iter().filter_map(|(i, _)| i.weight()).collect();
            let hook = RankedHook {
                text: best.1.text.trim().to_string(),
                hook_type: bucket.hook_type,
                effectiveness: mean(&weights).map(round2),
                frequency: type_frequency.get(&bucket.hook_type).copied().unwrap_or(0),
                source_item_id: best.0.item_id.clone(),
            };
            Some((best, hook))
        })
        .collect();

    ranked.sort_by(|(a_best, a), (b_best, b)| {
        cmp_hook_contributor(a_best, b_best).then_with(|| a.hook_type.cmp(&b.hook_type))
    });
    let top_hooks = ranked
        .into_iter()
        .take(TOP_HOOKS)
        .map(|(_, hook)| hook)
        .collect();

    let mut groups: Vec<HookGroup> = by_type
        .into_iter()
        .filter_map(|(hook_type, mut contributors)| {
            contributors.sort_by(cmp_hook_contributor);
            let best = contributors.first()?;
            let weights: Vec<f64> = contributors.iter().filter_map(|(i, _)| i.weight()).collect();
            Some(HookGroup {
                hook_type,
                frequency: type_frequency.get(&hook_type).copied().unwrap_or(0),
                mean_effectiveness: mean(&weights).map(round2),
                best_text: best.1.text.trim().to_string(),
            })
        })
        .collect();
    groups.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| cmp_desc_some_first(a.mean_effectiveness, b.mean_effectiveness))
            .then_with(|| a.hook_type.cmp(&b.hook_type))
    });

    (top_hooks, groups)
}

// ============================================================================
// Structure
// ============================================================================

fn optimal_structure(cohort: &[&ItemAnalysis], target_minutes: f64) -> OptimalStructure {
    let hook_durations: Vec<(f64, Option<f64>)> = cohort
        .iter()
        .filter_map(|a| Some((a.hook.as_ref()?.duration_seconds()?, a.weight())))
        .collect();
    let intro: Vec<(f64, Option<f64>)> = cohort
        .iter()
        .filter_map(|a| Some((a.structure.intro_end_seconds?, a.weight())))
        .collect();
    let section_counts: Vec<(f64, Option<f64>)> = cohort
        .iter()
        .filter_map(|a| Some((a.structure.section_count()? as f64, a.weight())))
        .collect();
    let section_durations: Vec<(f64, Option<f64>)> = cohort
        .iter()
        .filter_map(|a| Some((a.structure.mean_section_seconds()?, a.weight())))
        .collect();

    let hook_duration_range = {
        let rounded: Vec<u32> = usable(&hook_durations)
            .map(|(v, _)| round_half_up_u32(v))
            .collect();
        match (rounded.iter().min(), rounded.iter().max()) {
            (Some(&min_seconds), Some(&max_seconds)) => Some(SecondsRange {
                min_seconds,
                max_seconds,
            }),
            _ => None,
        }
    };

    OptimalStructure {
        hook_duration_seconds: weighted_stat(&hook_durations).map(round_half_up_u32),
        hook_duration_range,
        intro_duration_seconds: weighted_stat(&intro).map(round_half_up_u32),
        section_count: weighted_stat(&section_counts).map(round_half_up_u32),
        section_duration_seconds: weighted_stat(&section_durations).map(round_half_up_u32),
        total_target_seconds: if target_minutes.is_finite() && target_minutes > 0.0 {
            round_half_up_u32(target_minutes * 60.0)
        } else {
            0
        },
    }
}

fn usable(values: &[(f64, Option<f64>)]) -> impl Iterator<Item = (f64, Option<f64>)> + '_ {
    values
        .iter()
        .copied()
        .filter(|(v, _)| v.is_finite() && *v >= 0.0)
}

/// Weighted mean of `(value, weight)` pairs.
///
/// One contributor yields its own value; zero yields `None`. With several
/// contributors only the weighted ones count, unless none are weighted, in
/// which case the plain mean is used.
pub fn weighted_stat(values: &[(f64, Option<f64>)]) -> Option<f64> {
    let values: Vec<(f64, Option<f64>)> = usable(values).collect();
    match values.as_slice() {
        [] => None,
        [(only, _)] => Some(*only),
        _ => {
            let (sum, total_weight) = values
                .iter()
                .filter_map(|(v, w)| w.map(|w| (v * w, w)))
                .fold((0.0, 0.0), |(s, t), (vw, w)| (s + vw, t + w));
            if total_weight > 0.0 {
                Some(sum / total_weight)
            } else {
                let plain: Vec<f64> = values.iter().map(|(v, _)| *v).collect();
                mean(&plain)
            }
        }
    }
}

/// Round half up to a non-negative whole number, saturating at `u32::MAX`.
fn round_half_up_u32(value: f64) -> u32 {
    value.max(0.0).round().min(u32::MAX as f64) as u32
}

// ============================================================================
// CTAs
// ============================================================================

fn rank_ctas(cohort: &[&ItemAnalysis]) -> Vec<RankedCta> {
    let mut buckets: BTreeMap<String, Vec<(&ItemAnalysis, &CallToAction)>> = BTreeMap::new();
    for item in cohort {
        for cta in item.ctas.iter().flatten() {
            let key = phrase_key(&cta.text);
            if !key.is_empty() {
                buckets.entry(key).or_default().push((*item, cta));
            }
        }
    }

    let mut ranked: Vec<(String, RankedCta)> = buckets
        .into_iter()
        .filter_map(|(key, mut contributors)| {
            contributors.sort_by(|(a_item, a), (b_item, b)| {
                cmp_desc_some_first(a_item.weight(), b_item.weight())
                    .then_with(|| cmp_date_desc(a_item.published_at, b_item.published_at))
                    .then_with(|| a.text.cmp(&b.text))
                    .then_with(|| a_item.item_id.cmp(&b_item.item_id))
            });
            let (_, best) = *contributors.first()?;

            let positions: Vec<(f64, Option<f64>)> = contributors
                .iter()
                .filter_map(|(item, cta)| Some((cta.position_percent?, item.weight())))
                .collect();
            let weights: Vec<f64> = contributors.iter().filter_map(|(i, _)| i.weight()).collect();

            let cta = RankedCta {
                text: best.text.trim().to_string(),
                cta_type: dominant_cta_type(&contributors).unwrap_or(best.cta_type),
                position_percent: weighted_stat(&positions).map(round1),
                frequency: distinct_items(contributors.iter().map(|(i, _)| *i)),
                effectiveness: mean(&weights).map(round2),
            };
            Some((key, cta))
        })
        .collect();

    ranked.sort_by(|(ka, a), (kb, b)| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| cmp_desc_some_first(a.effectiveness, b.effectiveness))
            .then_with(|| ka.cmp(kb))
    });
    ranked.into_iter().take(TOP_CTAS).map(|(_, cta)| cta).collect()
}

/// Most common type label in a bucket; ties go to the smallest type.
fn dominant_cta_type(contributors: &[(&ItemAnalysis, &CallToAction)]) -> Option<CtaType> {
    let mut counts: BTreeMap<CtaType, usize> = BTreeMap::new();
    for (_, cta) in contributors {
        *counts.entry(cta.cta_type).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(ta, ca), (tb, cb)| ca.cmp(cb).then_with(|| tb.cmp(ta)))
        .map(|(t, _)| t)
}

// ============================================================================
// Vocabulary, techniques, SEO
// ============================================================================

fn key_vocabulary(cohort: &[&ItemAnalysis]) -> KeyVocabulary {
    KeyVocabulary {
        technical_terms: count_terms(
            cohort.iter().map(|a| a.vocabulary.technical_terms.as_slice()),
            TOP_TECHNICAL_TERMS,
        ),
        transition_phrases: count_terms(
            cohort.iter().map(|a| a.vocabulary.transition_phrases.as_slice()),
            TOP_TRANSITION_PHRASES,
        ),
        common_phrases: count_terms(
            cohort.iter().map(|a| a.vocabulary.common_phrases.as_slice()),
            TOP_COMMON_PHRASES,
        ),
    }
}

/// Unweighted frequency table: how many items use each term.
///
/// Terms are bucketed case-insensitively; the display spelling is the most
/// common one (then the smallest). Ties in count break alphabetically.
pub fn count_terms<'a>(
    per_item: impl Iterator<Item = &'a [String]>,
    limit: usize,
) -> Vec<TermCount> {
    let mut buckets: BTreeMap<String, (usize, BTreeMap<String, usize>)> = BTreeMap::new();
    for terms in per_item {
        let mut seen = BTreeSet::new();
        for term in terms {
            let key = normalize_text(term);
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }
            let entry = buckets.entry(key).or_default();
            entry.0 += 1;
            *entry.1.entry(collapse_whitespace(term)).or_default() += 1;
        }
    }

    let mut counted: Vec<(String, TermCount)> = buckets
        .into_iter()
        .map(|(key, (count, spellings))| {
            let term = preferred_spelling(spellings).unwrap_or_else(|| key.clone());
            (key, TermCount { term, count })
        })
        .collect();
    counted.sort_by(|(ka, a), (kb, b)| b.count.cmp(&a.count).then_with(|| ka.cmp(kb)));
    counted.into_iter().take(limit).map(|(_, t)| t).collect()
}

fn preferred_spelling(spellings: BTreeMap<String, usize>) -> Option<String> {
    // Highest count, then smallest spelling.
    spellings
        .into_iter()
        .min_by(|(sa, ca), (sb, cb)| cb.cmp(ca).then_with(|| sa.cmp(sb)))
        .map(|(s, _)| s)
}

fn notable_techniques(cohort: &[&ItemAnalysis]) -> Vec<RankedTechnique> {
    let mut weights: Vec<f64> = cohort.iter().filter_map(|a| a.weight()).collect();
    weights.sort_by(|a, b| b.total_cmp(a));
    // Top half by score; an odd cohort includes its median.
    let threshold = (!weights.is_empty()).then(|| weights[weights.len().div_ceil(2) - 1]);

    let selected = cohort.iter().filter(|a| match threshold {
        Some(t) => a.weight().is_some_and(|w| w >= t),
        None => true,
    });

    struct Merged {
        spellings: BTreeMap<String, usize>,
        description: String,
        items: BTreeSet<String>,
    }

    let mut merged: BTreeMap<String, Merged> = BTreeMap::new();
    for item in selected {
        for technique in &item.techniques {
            let key = normalize_text(&technique.name);
            if key.is_empty() {
                continue;
            }
            let entry = merged.entry(key).or_insert_with(|| Merged {
                spellings: BTreeMap::new(),
                description: String::new(),
                items: BTreeSet::new(),
            });
            *entry
                .spellings
                .entry(collapse_whitespace(&technique.name))
                .or_default() += 1;
            entry.items.insert(item.item_id.clone());

            let description = technique.description.trim();
            let longer = description.chars().count() > entry.description.chars().count();
            let same_len_smaller = description.chars().count() == entry.description.chars().count()
                && description < entry.description.as_str();
            if longer || same_len_smaller {
                entry.description = description.to_string();
            }
        }
    }

    let mut techniques: Vec<(String, RankedTechnique)> = merged
        .into_iter()
        .map(|(key, m)| {
            let name = preferred_spelling(m.spellings).unwrap_or_else(|| key.clone());
            (
                key,
                RankedTechnique {
                    name,
                    description: m.description,
                    frequency: m.items.len(),
                },
            )
        })
        .collect();
    techniques.sort_by(|(ka, a), (kb, b)| b.frequency.cmp(&a.frequency).then_with(|| ka.cmp(kb)));
    techniques.into_iter().map(|(_, t)| t).collect()
}

fn seo_patterns(cohort: &[&ItemAnalysis]) -> SeoPatterns {
    let title_keywords = count_terms(
        cohort.iter().map(|a| a.seo.title_keywords.as_slice()),
        TOP_SEO_TERMS,
    );
    let tags = count_terms(
        cohort.iter().map(|a| a.seo.estimated_tags.as_slice()),
        TOP_SEO_TERMS,
    );

    let mut pool: BTreeMap<String, SeoTerm> = BTreeMap::new();
    for (terms, source) in [(&title_keywords, SeoSource::Keyword), (&tags, SeoSource::Tag)] {
        for t in terms {
            pool.entry(normalize_text(&t.term))
                .and_modify(|existing| {
                    existing.count += t.count;
                    if existing.source != source {
                        existing.source = SeoSource::Both;
                    }
                })
                .or_insert_with(|| SeoTerm {
                    term: t.term.clone(),
                    count: t.count,
                    source,
                });
        }
    }

    let mut pool: Vec<(String, SeoTerm)> = pool.into_iter().collect();
    pool.sort_by(|(ka, a), (kb, b)| b.count.cmp(&a.count).then_with(|| ka.cmp(kb)));

    SeoPatterns {
        title_keywords,
        tags,
        pool: pool.into_iter().map(|(_, t)| t).collect(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Case-folded, whitespace-collapsed bucketing key.
pub fn normalize_text(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Bucketing key for spoken phrases: [`normalize_text`] without leading or
/// trailing punctuation, so "Subscribe!" and "subscribe" share a bucket.
fn phrase_key(text: &str) -> String {
    normalize_text(text)
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn distinct_items<'a>(items: impl Iterator<Item = &'a ItemAnalysis>) -> usize {
    items.map(|i| i.item_id.as_str()).collect::<BTreeSet<_>>().len()
}

/// Descending, with `None` after every value.
fn cmp_desc_some_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// More recent first, unknown dates last.
fn cmp_date_desc(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
