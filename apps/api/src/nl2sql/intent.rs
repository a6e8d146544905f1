//! Intent matcher: picks one query template for a normalized question.
//!
//! Templates are tried in the order of [`RULES`]. A rule inspects the extracted
//! parameters and the question's cue words and either returns a fully-populated
//! `Template` or declines. The more specific shapes (threshold, delta-based) sit ahead
//! of the plain "how many videos" counts so a qualified question is never answered as
//! an unqualified one.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::nl2sql::dates::{DateOutcome, DateRange};
use crate::nl2sql::numbers::NumberOutcome;
use crate::nl2sql::query::{Comparator, Filters, Metric, ParsedQuery, Template};

const VIDEO_WORDS: &[&str] = &["видео", "ролик"];
const GROWTH_CUES: &[&str] = &["вырос", "прирост", "увелич", "прибав", "на сколько"];
const NOVELTY_CUES: &[&str] = &["получ", "нов", "разн", "уник"];
const TOTAL_CUES: &[&str] = &["всего", "суммар", "в сумме", "общее", "общая", "итого"];

/// "сколько/число/количество … видео". Group 1 catches "на сколько", group 2 the words
/// in between.
static VIDEO_COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^а-я])(на\s+)?(?:сколько|число|количество|кол-во)((?:\s+[^\s]+){0,3}?)\s+(?:видео|ролик)",
    )
    .expect("video count pattern is valid")
});

/// Lower-cases, folds `ё` into `е` and collapses whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace('ё', "е")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything the rules look at: the normalized text and the independent extractions.
#[derive(Debug, Clone)]
pub struct Signals<'a> {
    pub text: &'a str,
    pub metric: Option<Metric>,
    pub comparator: Option<Comparator>,
    pub number: NumberOutcome,
    pub date: DateOutcome,
    pub creator_id: Option<String>,
    pub video_id: Option<String>,
}

impl<'a> Signals<'a> {
    fn period(&self) -> Option<DateRange> {
        self.date.period()
    }

    fn mentions_video(&self) -> bool {
        has_any(self.text, VIDEO_WORDS)
    }

    /// Counting videos themselves, not a metric of videos ("сколько лайков у видео").
    fn asks_video_count(&self) -> bool {
        VIDEO_COUNT_RE.captures_iter(self.text).any(|caps| {
            let between = caps.get(2).map_or("", |m| m.as_str());
            caps.get(1).is_none() && Metric::detect(between).is_none()
        })
    }
}

/// A tagged entry of the priority list.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Signals<'_>) -> Option<Template>,
}

/// Template priority list. First match wins.
pub const RULES: &[Rule] = &[
    Rule {
        name: "count_videos_threshold",
        matches: match_threshold,
    },
    Rule {
        name: "count_distinct_videos_with_delta",
        matches: match_distinct_delta,
    },
    Rule {
        name: "sum_delta_for_date",
        matches: match_sum_delta,
    },
    Rule {
        name: "sum_metric_total",
        matches: match_sum_total,
    },
    Rule {
        name: "count_videos_by_creator",
        matches: match_count_by_creator,
    },
    Rule {
        name: "count_videos_by_date_range",
        matches: match_count_by_date,
    },
    Rule {
        name: "count_videos_total",
        matches: match_count_total,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matched(ParsedQuery),
    /// A date phrase failed validation; no template is tried.
    MalformedDate { reason: String },
    NoMatch { reason: String },
}

/// Classifies a question. A malformed date disqualifies every template, since
/// dropping it would silently widen the question.
pub fn classify(signals: &Signals<'_>) -> Classification {
    if let DateOutcome::Malformed(reason) = &signals.date {
        return Classification::MalformedDate {
            reason: reason.clone(),
        };
    }

    for rule in RULES {
        if let Some(template) = (rule.matches)(signals) {
            debug!(rule = rule.name, "Template matched");
            return Classification::Matched(with_leftover_filters(template, signals));
        }
    }

    Classification::NoMatch {
        reason: "no template requirements satisfied".to_string(),
    }
}

/// Attaches the extracted parameters the template did not consume.
fn with_leftover_filters(template: Template, signals: &Signals<'_>) -> ParsedQuery {
    let mut filters = Filters {
        creator_id: signals.creator_id.clone(),
        video_id: signals.video_id.clone(),
        period: signals.period(),
    };
    match &template {
        Template::CountVideosByCreator { .. } => filters.creator_id = None,
        Template::CountVideosByDateRange { .. }
        | Template::SumDeltaForDate { .. }
        | Template::CountDistinctVideosWithDelta { .. } => filters.period = None,
        _ => {}
    }
    ParsedQuery { template, filters }
}

fn match_threshold(s: &Signals<'_>) -> Option<Template> {
    if !s.mentions_video() {
        return None;
    }
    Some(Template::CountVideosThreshold {
        metric: s.metric?,
        comparator: s.comparator?,
        threshold: s.number.value()?,
    })
}

fn match_distinct_delta(s: &Signals<'_>) -> Option<Template> {
    let cued = s.asks_video_count()
        && (has_any(s.text, NOVELTY_CUES) || has_any(s.text, GROWTH_CUES));
    if !cued {
        return None;
    }
    Some(Template::CountDistinctVideosWithDelta {
        metric: s.metric?,
        period: s.period()?,
    })
}

fn match_sum_delta(s: &Signals<'_>) -> Option<Template> {
    if !has_any(s.text, GROWTH_CUES) {
        return None;
    }
    Some(Template::SumDeltaForDate {
        metric: s.metric?,
        period: s.period()?,
    })
}

fn match_sum_total(s: &Signals<'_>) -> Option<Template> {
    let cued = has_any(s.text, TOTAL_CUES) || s.text.contains("сколько");
    if !cued || s.asks_video_count() || has_any(s.text, GROWTH_CUES) {
        return None;
    }
    Some(Template::SumMetricTotal { metric: s.metric? })
}

fn match_count_by_creator(s: &Signals<'_>) -> Option<Template> {
    if !plain_video_count(s) {
        return None;
    }
    Some(Template::CountVideosByCreator {
        creator_id: s.creator_id.clone()?,
    })
}

fn match_count_by_date(s: &Signals<'_>) -> Option<Template> {
    if !plain_video_count(s) {
        return None;
    }
    Some(Template::CountVideosByDateRange { period: s.period()? })
}

fn match_count_total(s: &Signals<'_>) -> Option<Template> {
    plain_video_count(s).then_some(Template::CountVideosTotal)
}

/// "How many videos" with no metric attached.
fn plain_video_count(s: &Signals<'_>) -> bool {
    s.metric.is_none() && s.asks_video_count()
}

fn has_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}
