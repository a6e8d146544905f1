// Question engine: Russian question text in, one non-negative integer out.
// Implements: number/date/id extraction, template matching, SQL building, execution.
// Only `sql::build` produces SQL text; extracted values are always bound parameters.

pub mod dates;
pub mod engine;
pub mod entities;
pub mod executor;
pub mod intent;
pub mod numbers;
pub mod query;
pub mod sql;
