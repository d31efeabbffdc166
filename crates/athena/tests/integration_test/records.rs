//! Header/data reshaping through the full executor path.

use scrapetok_athena::*;

use crate::fake::{settings, FakeBackend};

async fn run(rows: Vec<Vec<Option<&str>>>) -> Result<Vec<Record>, AthenaError> {
    let executor = QueryExecutor::new(FakeBackend::succeeding(rows), settings());
    executor
        .execute(&Query::new("SELECT * FROM t"), "scrapetok_db", "s3://out/")
        .await
}

#[tokio::test(start_paused = true)]
async fn test_one_record_per_data_row() {
    let header = vec![Some("user_id"), Some("accounts_scraped"), Some("active_filters")];
    for data_rows in [0usize, 1, 5, 40] {
        let mut rows = vec![header.clone()];
        for _ in 0..data_rows {
            rows.push(vec![Some("u"), Some("3"), None]);
        }

        let records = run(rows).await.unwrap();
        assert_eq!(records.len(), data_rows);
        for record in &records {
            let keys: Vec<&str> = record.keys().map(String::as_str).collect();
            assert_eq!(keys, ["user_id", "accounts_scraped", "active_filters"]);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_concrete_record_shapes() {
    let records = run(vec![
        vec![Some("user_id"), Some("count")],
        vec![Some("42"), Some("7")],
        vec![Some("42"), None],
    ])
    .await
    .unwrap();

    let json = serde_json::to_value(&records).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"user_id": "42", "count": "7"},
            {"user_id": "42", "count": null},
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_header_only_succeeds_empty() {
    let records = run(vec![vec![Some("user_id")]]).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_no_header_is_malformed() {
    let err = run(vec![]).await.unwrap_err();
    assert!(matches!(err, AthenaError::MalformedResult(_)));
}
