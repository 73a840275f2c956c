use chrono::NaiveDate;
use serde_json::json;
use sql_stmt_middleware::prelude::*;

const DDL: &str = "CREATE TABLE typed (
    id INTEGER PRIMARY KEY,
    i INTEGER,
    f REAL,
    b INTEGER,
    s TEXT,
    blob BLOB,
    ts TEXT,
    doc TEXT
)";

const INSERT: &str =
    "INSERT INTO typed (id, i, f, b, s, blob, ts, doc) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

#[test]
fn every_value_kind_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();
    conn.execute_write(DDL, &[])?;

    let ts = NaiveDate::from_ymd_opt(2024, 1, 31)
        .unwrap()
        .and_hms_milli_opt(23, 59, 58, 250)
        .unwrap();
    conn.execute_write(
        INSERT,
        &[
            RowValues::Int(1),
            RowValues::Int(-42),
            RowValues::Float(2.5),
            RowValues::Bool(true),
            RowValues::Text("héllo".into()),
            RowValues::Blob(vec![0, 255, 7]),
            RowValues::Timestamp(ts),
            RowValues::JSON(json!({"tags": ["a", "b"]})),
        ],
    )?;

    let rs = conn.execute_read("SELECT * FROM typed WHERE id = ?1", &[RowValues::Int(1)])?;
    let row = &rs.results[0];
    assert_eq!(row.get("i"), Some(&RowValues::Int(-42)));
    assert_eq!(row.get("f").and_then(RowValues::as_float), Some(2.5));
    assert_eq!(row.get("b").and_then(RowValues::as_bool), Some(true));
    assert_eq!(row.get("s").and_then(RowValues::as_text), Some("héllo"));
    assert_eq!(row.get("blob").and_then(RowValues::as_blob), Some(&[0, 255, 7][..]));
    assert_eq!(row.get("ts").and_then(RowValues::as_timestamp), Some(ts));

    let doc = row.get("doc").and_then(RowValues::as_text).unwrap();
    assert_eq!(serde_json::from_str::<serde_json::Value>(doc)?, json!({"tags": ["a", "b"]}));
    Ok(())
}

#[test]
fn null_stays_null_in_every_column() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();
    conn.execute_write(DDL, &[])?;

    let mut params = vec![RowValues::Int(7)];
    params.extend(std::iter::repeat_n(RowValues::Null, 7));
    conn.execute_write(INSERT, &params)?;

    let rs = conn.execute_read("SELECT i, f, b, s, blob, ts, doc FROM typed", &[])?;
    let row = &rs.results[0];
    for idx in 0..7 {
        assert_eq!(row.get_by_index(idx), Some(&RowValues::Null), "column {idx}");
    }

    // a NULL integer must not have been coerced to zero
    let zeros = conn.execute_read("SELECT COUNT(*) AS n FROM typed WHERE i = 0", &[])?;
    assert_eq!(zeros.results[0].get("n"), Some(&RowValues::Int(0)));
    Ok(())
}

#[test]
fn false_is_stored_as_zero() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();
    let rs = conn.execute_read(
        "SELECT ?1 AS yes, ?2 AS no, typeof(?2) AS kind",
        &[RowValues::Bool(true), RowValues::Bool(false)],
    )?;
    let row = &rs.results[0];
    assert_eq!(row.get("yes"), Some(&RowValues::Int(1)));
    assert_eq!(row.get("no"), Some(&RowValues::Int(0)));
    assert_eq!(row.get("kind").and_then(RowValues::as_text), Some("integer"));
    Ok(())
}

#[test]
fn parameter_count_mismatch_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();
    conn.execute_write("CREATE TABLE t (a INTEGER, b INTEGER)", &[])?;

    let too_many = conn.execute_write(
        "INSERT INTO t (a, b) VALUES (?1, ?2)",
        &[RowValues::Int(1), RowValues::Int(2), RowValues::Int(3)],
    );
    assert!(matches!(too_many, Err(SqlMiddlewareDbError::BindError(_))));

    let none = conn.execute_write("INSERT INTO t (a, b) VALUES (?1, ?2)", &[]);
    assert!(matches!(none, Err(SqlMiddlewareDbError::BindError(_))));

    let count = conn.execute_read("SELECT COUNT(*) AS n FROM t", &[])?;
    assert_eq!(count.results[0].get("n"), Some(&RowValues::Int(0)));
    Ok(())
}
