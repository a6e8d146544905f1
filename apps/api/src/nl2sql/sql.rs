//! SQL builder: renders a `ParsedQuery` into a parameterized statement.
//!
//! Table and column names come only from the enums below. Extracted values (numbers,
//! dates, ids) are always bound as `$n` parameters, never spliced into the SQL text.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::nl2sql::dates::DateRange;
use crate::nl2sql::query::{Comparator, Metric, ParsedQuery, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Videos,
    VideoSnapshots,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Videos => "videos",
            Table::VideoSnapshots => "video_snapshots",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    VideoId,
    CreatorId,
    VideoCreatedAt,
    CreatedAt,
    Total(Metric),
    Delta(Metric),
}

impl Column {
    fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::VideoId => "video_id",
            Column::CreatorId => "creator_id",
            Column::VideoCreatedAt => "video_created_at",
            Column::CreatedAt => "created_at",
            Column::Total(metric) => match metric {
                Metric::Views => "views_count",
                Metric::Likes => "likes_count",
                Metric::Comments => "comments_count",
                Metric::Reports => "reports_count",
            },
            Column::Delta(metric) => match metric {
                Metric::Views => "delta_views_count",
                Metric::Likes => "delta_likes_count",
                Metric::Comments => "delta_comments_count",
                Metric::Reports => "delta_reports_count",
            },
        }
    }
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// SQL text with `$1..$n` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Source of the rows being aggregated. Snapshot queries join `videos` only when they
/// need the creator column.
#[derive(Debug, Clone, Copy)]
enum Source {
    Videos,
    Snapshots,
    SnapshotsJoinedToVideos,
}

impl Source {
    fn from_clause(self) -> String {
        match self {
            Source::Videos => Table::Videos.name().to_string(),
            Source::Snapshots => Table::VideoSnapshots.name().to_string(),
            Source::SnapshotsJoinedToVideos => format!(
                "{} s JOIN {} v ON v.{} = s.{}",
                Table::VideoSnapshots.name(),
                Table::Videos.name(),
                Column::Id.name(),
                Column::VideoId.name()
            ),
        }
    }

    /// Qualified name of a column on the aggregated (snapshot or video) table.
    fn own(self, column: Column) -> String {
        match self {
            Source::SnapshotsJoinedToVideos => format!("s.{}", column.name()),
            Source::Videos | Source::Snapshots => column.name().to_string(),
        }
    }

    /// Qualified name of a column that lives on `videos`.
    fn video(self, column: Column) -> String {
        match self {
            Source::SnapshotsJoinedToVideos => format!("v.{}", column.name()),
            Source::Videos | Source::Snapshots => column.name().to_string(),
        }
    }

    fn is_snapshots(self) -> bool {
        !matches!(self, Source::Videos)
    }
}

/// Accumulates WHERE conditions and their bound values.
#[derive(Default)]
struct StatementBuilder {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl StatementBuilder {
    fn bind(&mut self, value: SqlParam) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn condition(&mut self, column: String, op: &str, value: SqlParam) {
        let placeholder = self.bind(value);
        self.conditions.push(format!("{column} {op} {placeholder}"));
    }

    fn literal(&mut self, condition: String) {
        self.conditions.push(condition);
    }

    fn period(&mut self, column: String, period: &DateRange) {
        self.condition(column.clone(), ">=", SqlParam::Timestamp(period.start_utc()));
        self.condition(column, "<", SqlParam::Timestamp(period.end_exclusive_utc()));
    }

    fn finish(self, select: String, source: Source) -> Statement {
        let mut sql = format!("SELECT {select} FROM {}", source.from_clause());
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        Statement {
            sql,
            params: self.params,
        }
    }
}

/// Builds the statement for a classified question.
pub fn build(query: &ParsedQuery) -> Statement {
    let source = match &query.template {
        Template::SumDeltaForDate { .. } | Template::CountDistinctVideosWithDelta { .. } => {
            if query.creator_id().is_some() {
                Source::SnapshotsJoinedToVideos
            } else {
                Source::Snapshots
            }
        }
        _ => Source::Videos,
    };

    let mut b = StatementBuilder::default();

    let select = match &query.template {
        Template::CountVideosTotal
        | Template::CountVideosByCreator { .. }
        | Template::CountVideosByDateRange { .. } => "COUNT(*)".to_string(),
        Template::CountVideosThreshold {
            metric,
            comparator,
            threshold,
        } => {
            threshold_condition(&mut b, *metric, *comparator, *threshold);
            "COUNT(*)".to_string()
        }
        Template::SumDeltaForDate { metric, .. } => {
            format!("SUM({})::bigint", source.own(Column::Delta(*metric)))
        }
        Template::CountDistinctVideosWithDelta { metric, .. } => {
            b.literal(format!("{} > 0", source.own(Column::Delta(*metric))));
            format!("COUNT(DISTINCT {})", source.own(Column::VideoId))
        }
        Template::SumMetricTotal { metric } => {
            format!("SUM({})::bigint", Column::Total(*metric).name())
        }
    };

    if let Some(creator_id) = query.creator_id() {
        b.condition(
            source.video(Column::CreatorId),
            "=",
            SqlParam::Text(creator_id.to_string()),
        );
    }

    if let Some(video_id) = query.video_id() {
        let column = if source.is_snapshots() {
            source.own(Column::VideoId)
        } else {
            Column::Id.name().to_string()
        };
        b.condition(column, "=", SqlParam::Text(video_id.to_string()));
    }

    if let Some(period) = query.period() {
        let column = if source.is_snapshots() {
            source.own(Column::CreatedAt)
        } else {
            Column::VideoCreatedAt.name().to_string()
        };
        b.period(column, period);
    }

    b.finish(select, source)
}

fn threshold_condition(
    b: &mut StatementBuilder,
    metric: Metric,
    comparator: Comparator,
    threshold: i64,
) {
    b.condition(
        Column::Total(metric).name().to_string(),
        comparator.as_sql(),
        SqlParam::Int(threshold),
    );
}
