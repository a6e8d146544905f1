//! Orchestrator: question in, one non-negative integer out.
//!
//! normalize → extract (number, date, creator, video) → classify → build → execute.
//! Every failure along the way is logged and answered with 0.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::EngineError;
use crate::nl2sql::dates::extract_date;
use crate::nl2sql::entities::{extract_creator_id, extract_video_id};
use crate::nl2sql::executor::{self, QueryExecutor};
use crate::nl2sql::intent::{classify, normalize, Classification, Signals};
use crate::nl2sql::numbers::extract_number;
use crate::nl2sql::query::{Aggregation, Comparator, Metric, ParsedQuery, Scope};
use crate::nl2sql::sql::{self, Statement};

/// How a question was understood, for operators.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub query: ParsedQuery,
    pub scope: Scope,
    pub aggregation: Aggregation,
    pub statement: Statement,
}

/// Translates a question into a classified query. Pure: no clock, no I/O.
pub fn translate(question: &str, current_year: i32) -> Result<ParsedQuery, EngineError> {
    let text = normalize(question);

    let creator_id = extract_creator_id(&text);
    let video_id = extract_video_id(&text, creator_id.as_deref());
    let date = extract_date(&text, current_year);

    let signals = Signals {
        text: &text,
        metric: Metric::detect(&text),
        comparator: Comparator::detect(&text),
        number: extract_number(&text),
        date,
        creator_id,
        video_id,
    };

    match classify(&signals) {
        Classification::Matched(query) => Ok(query),
        Classification::MalformedDate { reason } => Err(EngineError::Parse(reason)),
        Classification::NoMatch { reason } => Err(EngineError::NoMatch(reason)),
    }
}

/// Shared, stateless question answerer. Cheap to share across requests behind an `Arc`.
pub struct Engine {
    executor: Arc<dyn QueryExecutor>,
    query_timeout: Duration,
    /// Overrides the year assumed for dates written without one.
    current_year: Option<i32>,
}

impl Engine {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        query_timeout: Duration,
        current_year: Option<i32>,
    ) -> Self {
        Self {
            executor,
            query_timeout,
            current_year,
        }
    }

    fn current_year(&self) -> i32 {
        self.current_year.unwrap_or_else(|| Utc::now().year())
    }

    /// Classifies and builds without executing.
    pub fn explain(&self, question: &str) -> Result<Explanation, EngineError> {
        let query = translate(question, self.current_year())?;
        let statement = sql::build(&query);
        Ok(Explanation {
            scope: query.scope(),
            aggregation: query.aggregation(),
            query,
            statement,
        })
    }

    /// Answers a question. Always returns a non-negative integer; 0 on any failure.
    pub async fn answer(&self, question: &str) -> i64 {
        match self.try_answer(question).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, question, "Answering with 0");
                0
            }
        }
    }

    async fn try_answer(&self, question: &str) -> Result<i64, EngineError> {
        let query = translate(question, self.current_year())?;
        let statement = sql::build(&query);
        let value = executor::run(self.executor.as_ref(), &statement, self.query_timeout).await?;
        info!(
            template = query.template.name(),
            metric = ?query.metric(),
            params = statement.params.len(),
            value,
            "Answered question"
        );
        Ok(value)
    }
}
