//! Parsed query model: the typed hand-off between the intent matcher and the SQL builder.
//!
//! Each `Template` variant carries the parameters it requires, so a query that cannot be
//! satisfied is unrepresentable by the time it reaches `sql::build`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::nl2sql::dates::DateRange;

/// One of the four counters stored on both `videos` and `video_snapshots`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Views,
    Likes,
    Comments,
    Reports,
}

impl Metric {
    /// Word stems that name each metric, in detection order.
    pub const STEMS: &'static [(&'static str, Metric)] = &[
        ("просмотр", Metric::Views),
        ("лайк", Metric::Likes),
        ("коммент", Metric::Comments),
        ("жалоб", Metric::Reports),
        ("репорт", Metric::Reports),
        ("report", Metric::Reports),
    ];

    pub fn detect(text: &str) -> Option<Metric> {
        Self::STEMS
            .iter()
            .find(|(stem, _)| text.contains(stem))
            .map(|&(_, metric)| metric)
    }
}

/// Threshold comparison operator. Rendered only from this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
}

/// Phrases matched as stems with any ending ("превышает", "превышающих").
const OPEN_ENDED: &[&str] = &["превыш"];

/// One capture group per entry of `Comparator::PHRASES`, each anchored on word boundaries.
static COMPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = Comparator::PHRASES
        .iter()
        .map(|(phrase, _)| {
            if OPEN_ENDED.contains(phrase) {
                format!(r"({}\w*)", regex::escape(phrase))
            } else {
                format!("({})", regex::escape(phrase))
            }
        })
        .collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
        .expect("comparator pattern is valid")
});

/// A comparison phrase found in the text, as a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparatorSpan {
    pub start: usize,
    pub end: usize,
    pub comparator: Comparator,
}

impl Comparator {
    /// Comparison phrases, matched as whole words. When several start at the same word
    /// the earlier entry wins, so compound phrases come before the words they contain
    /// ("больше или равно" before "больше").
    pub const PHRASES: &'static [(&'static str, Comparator)] = &[
        ("больше или равно", Comparator::Ge),
        ("меньше или равно", Comparator::Le),
        ("и более", Comparator::Ge),
        ("и больше", Comparator::Ge),
        ("и менее", Comparator::Le),
        ("и меньше", Comparator::Le),
        ("не меньше", Comparator::Ge),
        ("не менее", Comparator::Ge),
        ("не ниже", Comparator::Ge),
        ("как минимум", Comparator::Ge),
        ("минимум", Comparator::Ge),
        ("не больше", Comparator::Le),
        ("не более", Comparator::Le),
        ("не выше", Comparator::Le),
        ("как максимум", Comparator::Le),
        ("максимум", Comparator::Le),
        ("больше", Comparator::Gt),
        ("более", Comparator::Gt),
        ("выше", Comparator::Gt),
        ("свыше", Comparator::Gt),
        ("превыш", Comparator::Gt),
        ("меньше", Comparator::Lt),
        ("менее", Comparator::Lt),
        ("ниже", Comparator::Lt),
        ("равно", Comparator::Eq),
        ("ровно", Comparator::Eq),
    ];

    /// Every comparison phrase in reading order.
    pub fn spans(text: &str) -> Vec<ComparatorSpan> {
        COMPARATOR_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let index = caps.iter().skip(1).position(|g| g.is_some())?;
                Some(ComparatorSpan {
                    start: whole.start(),
                    end: whole.end(),
                    comparator: Self::PHRASES[index].1,
                })
            })
            .collect()
    }

    /// The first comparison phrase in the text.
    pub fn detect(text: &str) -> Option<Comparator> {
        Self::spans(text).first().map(|span| span.comparator)
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::Eq => "=",
        }
    }
}

/// The finite set of query shapes the engine can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum Template {
    CountVideosTotal,
    CountVideosByCreator {
        creator_id: String,
    },
    CountVideosByDateRange {
        period: DateRange,
    },
    CountVideosThreshold {
        metric: Metric,
        comparator: Comparator,
        threshold: i64,
    },
    SumDeltaForDate {
        metric: Metric,
        period: DateRange,
    },
    CountDistinctVideosWithDelta {
        metric: Metric,
        period: DateRange,
    },
    SumMetricTotal {
        metric: Metric,
    },
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::CountVideosTotal => "count_videos_total",
            Template::CountVideosByCreator { .. } => "count_videos_by_creator",
            Template::CountVideosByDateRange { .. } => "count_videos_by_date_range",
            Template::CountVideosThreshold { .. } => "count_videos_threshold",
            Template::SumDeltaForDate { .. } => "sum_delta_for_date",
            Template::CountDistinctVideosWithDelta { .. } => "count_distinct_videos_with_delta",
            Template::SumMetricTotal { .. } => "sum_metric_total",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Total,
    ByCreator,
    ByDateRange,
    Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    CountVideos,
    CountDistinctVideosWithPositiveDelta,
    SumDelta,
    SumTotal,
}

/// Optional filters the template did not consume as required parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub creator_id: Option<String>,
    pub video_id: Option<String>,
    pub period: Option<DateRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    #[serde(flatten)]
    pub template: Template,
    pub filters: Filters,
}

impl ParsedQuery {
    pub fn metric(&self) -> Option<Metric> {
        match &self.template {
            Template::CountVideosThreshold { metric, .. }
            | Template::SumDeltaForDate { metric, .. }
            | Template::CountDistinctVideosWithDelta { metric, .. }
            | Template::SumMetricTotal { metric } => Some(*metric),
            _ => None,
        }
    }

    /// Creator filter, whether required by the template or carried as an extra filter.
    pub fn creator_id(&self) -> Option<&str> {
        match &self.template {
            Template::CountVideosByCreator { creator_id } => Some(creator_id),
            _ => self.filters.creator_id.as_deref(),
        }
    }

    pub fn period(&self) -> Option<&DateRange> {
        match &self.template {
            Template::CountVideosByDateRange { period }
            | Template::SumDeltaForDate { period, .. }
            | Template::CountDistinctVideosWithDelta { period, .. } => Some(period),
            _ => self.filters.period.as_ref(),
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        self.filters.video_id.as_deref()
    }

    pub fn scope(&self) -> Scope {
        match &self.template {
            Template::CountVideosThreshold { .. } => Scope::Threshold,
            _ if self.creator_id().is_some() => Scope::ByCreator,
            _ if self.period().is_some() => Scope::ByDateRange,
            _ => Scope::Total,
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match &self.template {
            Template::SumDeltaForDate { .. } => Aggregation::SumDelta,
            Template::CountDistinctVideosWithDelta { .. } => {
                Aggregation::CountDistinctVideosWithPositiveDelta
            }
            Template::SumMetricTotal { .. } => Aggregation::SumTotal,
            _ => Aggregation::CountVideos,
        }
    }
}
