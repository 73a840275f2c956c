use sql_stmt_middleware::prelude::*;

fn labels(conn: &mut Connection<'_>) -> Result<Vec<String>, SqlMiddlewareDbError> {
    let rs = conn.execute_read("SELECT label FROM notes ORDER BY id", &[])?;
    Ok(rs
        .iter()
        .filter_map(|row| row.get("label").and_then(RowValues::as_text).map(str::to_owned))
        .collect())
}

#[test]
fn script_returns_one_outcome_per_statement() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();

    let outcomes = conn.execute_script(
        "CREATE TABLE notes (id INTEGER PRIMARY KEY, label TEXT NOT NULL);
         INSERT INTO notes (label) VALUES ('a'), ('b');
         SELECT label FROM notes ORDER BY id;
         UPDATE notes SET label = 'z' WHERE label = 'b';",
    )?;

    assert_eq!(outcomes.len(), 4);
    assert!(matches!(outcomes[0], StatementOutcome::Done { .. }));
    assert_eq!(outcomes[1].rows_affected(), 2);
    let selected = outcomes[2].result_set().expect("select yields rows");
    assert_eq!(selected.len(), 2);
    assert_eq!(
        selected.results[1].get("label"),
        Some(&RowValues::Text("b".into()))
    );
    assert_eq!(outcomes[3].rows_affected(), 1);
    assert_eq!(conn.executed_statements(), 4);
    Ok(())
}

#[test]
fn failure_mid_script_keeps_prior_effects_and_skips_the_rest()
-> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();
    conn.execute_script("CREATE TABLE notes (id INTEGER PRIMARY KEY, label TEXT NOT NULL UNIQUE);")?;

    conn.reset_executed_statements();
    let err = conn
        .execute_script(
            "INSERT INTO notes (label) VALUES ('first');
             INSERT INTO notes (label) VALUES ('first');
             INSERT INTO notes (label) VALUES ('never');",
        )
        .unwrap_err();

    let SqlMiddlewareDbError::ExecutionError { code, message } = &err else {
        panic!("expected an execution error, got {err:?}");
    };
    assert_eq!(code & 0xff, 19);
    assert!(message.contains("UNIQUE"));
    assert_eq!(conn.last_error_code(), *code);
    assert_eq!(conn.executed_statements(), 2);

    // the connection is immediately usable and only the first insert landed
    assert_eq!(labels(&mut conn)?, vec!["first".to_string()]);
    Ok(())
}

#[test]
fn syntax_error_later_in_script_is_a_prepare_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();

    let err = conn
        .execute_script(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY, label TEXT NOT NULL);
             INSERT INTO notes (label) VALUES ('kept');
             INSRT INTO notes (label) VALUES ('lost');
             INSERT INTO notes (label) VALUES ('lost too');",
        )
        .unwrap_err();
    assert!(matches!(err, SqlMiddlewareDbError::PrepareError { .. }));
    assert_eq!(labels(&mut conn)?, vec!["kept".to_string()]);
    Ok(())
}

#[test]
fn failing_script_inside_transaction_can_be_rolled_back() -> Result<(), Box<dyn std::error::Error>>
{
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();
    conn.execute_script("CREATE TABLE notes (id INTEGER PRIMARY KEY, label TEXT NOT NULL);")?;

    conn.begin()?;
    let result = conn.execute_script(
        "INSERT INTO notes (label) VALUES ('tx');
         INSERT INTO notes (label) VALUES (NULL);",
    );
    assert!(result.is_err());
    assert!(conn.in_transaction());
    conn.rollback()?;

    assert!(labels(&mut conn)?.is_empty());
    assert_eq!(conn.transaction_state(), TransactionState::RolledBack);
    Ok(())
}

#[test]
fn empty_script_has_no_outcomes() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();
    assert!(conn.execute_script("")?.is_empty());
    assert!(conn.execute_script("  ;  ; ")?.is_empty());
    Ok(())
}

#[test]
fn transaction_statements_in_scripts_move_the_state() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();
    conn.execute_script("CREATE TABLE notes (id INTEGER PRIMARY KEY, label TEXT NOT NULL);")?;

    conn.execute_script("BEGIN; INSERT INTO notes (label) VALUES ('kept');")?;
    assert!(conn.in_transaction());
    assert_eq!(conn.transaction_state(), TransactionState::Active);

    conn.execute_script("COMMIT;")?;
    assert!(!conn.in_transaction());
    assert_eq!(conn.transaction_state(), TransactionState::Committed);

    conn.execute_script(
        "BEGIN;
         INSERT INTO notes (label) VALUES ('dropped');
         ROLLBACK;",
    )?;
    assert_eq!(conn.transaction_state(), TransactionState::RolledBack);
    assert_eq!(labels(&mut conn)?, vec!["kept".to_string()]);

    // the coordinator picks up a transaction a script opened
    conn.execute_script("BEGIN;")?;
    conn.execute_write("INSERT INTO notes (label) VALUES ('late')", &[])?;
    conn.commit()?;
    assert_eq!(conn.transaction_state(), TransactionState::Committed);
    assert_eq!(labels(&mut conn)?.len(), 2);
    Ok(())
}

#[test]
fn schema_statements_report_no_affected_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open_in_memory()?;
    let mut conn = db.connect();

    let outcomes = conn.execute_script(
        "CREATE TABLE notes (id INTEGER PRIMARY KEY, label TEXT NOT NULL);
         INSERT INTO notes (label) VALUES ('a'), ('b'), ('c');
         CREATE INDEX notes_label ON notes (label);
         DROP INDEX notes_label;",
    )?;

    let affected: Vec<_> = outcomes.iter().map(StatementOutcome::rows_affected).collect();
    assert_eq!(affected, vec![0, 3, 0, 0]);
    assert_eq!(conn.affected_rows(), 0);
    Ok(())
}
