//! Fixed SQL templates behind the HTTP routes.
//!
//! `limit` arrives here already range-checked as a `u32`, so formatting it
//! cannot alter the statement. Every caller-supplied string is bound as a
//! `?` execution parameter instead of being spliced into the text.

use scrapetok_athena::{validate_identifier, Query, SqlError};

/// Users ranked by scraped accounts, with their active filter count.
pub fn users_most_scraped(limit: u32) -> Query {
    Query::new(format!(
        "SELECT
  sa.userId AS user_id,
  COUNT(sa.id) AS accounts_scraped,
  COUNT(uf.id) AS active_filters
FROM scraped_acount sa
LEFT JOIN user_apify_filters uf ON uf.historial_id IN (
  SELECT id FROM user_apify_call_historial WHERE user_id = sa.userId
)
GROUP BY sa.userId
ORDER BY accounts_scraped DESC
LIMIT {limit}"
    ))
}

/// Admins filtered by `is_active`, with questions answered and average views.
pub fn admins_questions_and_views(is_active: &str, limit: u32) -> Query {
    Query::new(format!(
        "SELECT
  ap.id AS admin_id,
  ap.is_active,
  COUNT(qa.id) AS questions_answered,
  COALESCE(AVG(atm.views), 0) AS avg_views
FROM admin_profiles ap
LEFT JOIN quest_and_answer qa ON qa.admin_id = ap.id
LEFT JOIN admin_tiktok_metrics atm ON atm.adminid = ap.id
WHERE ap.is_active = ?
GROUP BY ap.id, ap.is_active
ORDER BY questions_answered DESC
LIMIT {limit}"
    ))
    .bind(is_active)
}

pub fn users_list(limit: u32) -> Query {
    Query::new(format!("SELECT * FROM users LIMIT {limit}"))
}

/// Posts with the most views.
pub fn posts_top(limit: u32) -> Query {
    Query::new(format!(
        "SELECT * FROM admin_tiktok_metrics ORDER BY views DESC LIMIT {limit}"
    ))
}

/// Tables of `database`. Uses `information_schema` rather than `SHOW TABLES`
/// because DDL results carry no header row.
pub fn list_tables(database: &str) -> Query {
    Query::new(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = ? ORDER BY table_name",
    )
    .bind(database)
}

/// Columns of `table_name`, optionally qualified as `schema.table`;
/// unqualified names resolve against `database`.
pub fn describe_table(table_name: &str, database: &str) -> Result<Query, SqlError> {
    let name = validate_identifier(table_name)?;
    let (schema, table) = name.split_once('.').unwrap_or((database, name));

    Ok(Query::new(
        "SELECT column_name, data_type, is_nullable
FROM information_schema.columns
WHERE table_schema = ? AND table_name = ?
ORDER BY ordinal_position",
    )
    .bind(schema)
    .bind(table))
}
