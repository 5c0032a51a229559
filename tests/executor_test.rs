//! End-to-end tests: SQL text in, rows out

use strata::buffer::BufferPool;
use strata::common::StrataError;
use strata::execution::{Executor, QueryResult};
use strata::sql::parse;
use strata::tuple::Value;
use tempfile::TempDir;

fn executor() -> (Executor, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = BufferPool::new(dir.path(), 8, 2).unwrap();
    (Executor::new(pool), dir)
}

fn run(executor: &Executor, sql: &str) -> Option<QueryResult> {
    let mut last = None;
    for statement in parse(sql).unwrap() {
        last = executor.execute(statement).unwrap();
    }
    last
}

fn run_err(executor: &Executor, sql: &str) -> StrataError {
    let statement = parse(sql).unwrap().remove(0);
    executor.execute(statement).unwrap_err()
}

#[test]
fn test_create_insert_select() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE users (id INT, name TEXT);");
    run(&executor, "INSERT INTO users VALUES (1, 'ada');");
    run(&executor, "INSERT INTO users VALUES (2, 'grace');");
    run(&executor, "INSERT INTO users VALUES (3, NULL);");

    let result = run(&executor, "SELECT * FROM users;").unwrap();
    assert_eq!(result.columns, vec!["id", "name"]);
    assert_eq!(
        result.rows,
        vec![
            vec![Value::Int32(1), Value::Text("ada".into())],
            vec![Value::Int32(2), Value::Text("grace".into())],
            vec![Value::Int32(3), Value::Null],
        ]
    );
}

#[test]
fn test_select_projection() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE users (id INT, name TEXT, age INT);");
    run(&executor, "INSERT INTO users VALUES (1, 'ada', 36);");

    let result = run(&executor, "SELECT name, id FROM users;").unwrap();
    assert_eq!(result.columns, vec!["name", "id"]);
    assert_eq!(
        result.rows,
        vec![vec![Value::Text("ada".into()), Value::Int32(1)]]
    );
}

#[test]
fn test_select_from_empty_table() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE empty (id INT);");
    let result = run(&executor, "SELECT * FROM empty;").unwrap();
    assert!(result.rows.is_empty());
}

#[test]
fn test_inserts_spill_to_new_pages() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE blobs (id INT, body TEXT);");

    // Each row is roughly a kilobyte, so a 4 KB page holds three of
    // them and ten rows need four pages.
    let body = "b".repeat(1000);
    for i in 0..10 {
        run(
            &executor,
            &format!("INSERT INTO blobs VALUES ({}, '{}');", i, body),
        );
    }

    let result = run(&executor, "SELECT id FROM blobs;").unwrap();
    assert_eq!(result.rows.len(), 10);
    for (i, row) in result.rows.iter().enumerate() {
        assert_eq!(row[0], Value::Int32(i as i32));
    }

    let info = executor.pool().read_meta("blobs").unwrap();
    assert!(info.data_header.pages_count >= 3);
    assert_eq!(info.data_header.record_count, 10);
    // The executor keeps the page directory in step with the data file.
    assert_eq!(
        info.directory.header.page_count,
        info.data_header.pages_count
    );
    assert_eq!(
        info.directory.header.next_page_id,
        info.data_header.pages_count + 1
    );
}

#[test]
fn test_insert_validation_errors() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE users (id INT, name TEXT);");

    assert!(matches!(
        run_err(&executor, "INSERT INTO users VALUES (1);"),
        StrataError::Validation(_)
    ));
    assert!(matches!(
        run_err(&executor, "INSERT INTO users VALUES ('x', 'y');"),
        StrataError::Validation(_)
    ));
    assert!(matches!(
        run_err(&executor, "INSERT INTO ghost VALUES (1, 'x');"),
        StrataError::TableNotFound(_)
    ));

    // Nothing was written by the failed statements.
    let result = run(&executor, "SELECT * FROM users;").unwrap();
    assert!(result.rows.is_empty());
}

#[test]
fn test_oversized_row_is_rejected() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE blobs (body TEXT);");
    let body = "x".repeat(5000);
    assert!(matches!(
        run_err(&executor, &format!("INSERT INTO blobs VALUES ('{}');", body)),
        StrataError::Validation(_)
    ));

    // The table is untouched; no page was allocated.
    let result = run(&executor, "SELECT * FROM blobs;").unwrap();
    assert!(result.rows.is_empty());
    let info = executor.pool().read_meta("blobs").unwrap();
    assert_eq!(info.data_header.pages_count, 0);
}

#[test]
fn test_select_validation_errors() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE users (id INT, name TEXT);");

    assert!(matches!(
        run_err(&executor, "SELECT nope FROM users;"),
        StrataError::Validation(_)
    ));
    assert!(matches!(
        run_err(&executor, "SELECT * FROM ghost;"),
        StrataError::TableNotFound(_)
    ));
}

#[test]
fn test_create_twice_and_drop() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE t (id INT);");
    assert!(matches!(
        run_err(&executor, "CREATE TABLE t (id INT);"),
        StrataError::TableAlreadyExists(_)
    ));

    run(&executor, "DROP TABLE t;");
    assert!(matches!(
        run_err(&executor, "DROP TABLE t;"),
        StrataError::TableNotFound(_)
    ));
    assert!(matches!(
        run_err(&executor, "SELECT * FROM t;"),
        StrataError::TableNotFound(_)
    ));
}

#[test]
fn test_identifiers_are_case_insensitive() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE Users (Id INT, Name TEXT);");
    run(&executor, "INSERT INTO USERS VALUES (1, 'ada');");

    let result = run(&executor, "SELECT ID FROM users;").unwrap();
    assert_eq!(result.columns, vec!["id"]);
    assert_eq!(result.rows, vec![vec![Value::Int32(1)]]);
}

#[test]
fn test_string_escapes_survive_storage() {
    let (executor, _dir) = executor();

    run(&executor, "CREATE TABLE notes (body TEXT);");
    run(&executor, "INSERT INTO notes VALUES ('it''s a test');");

    let result = run(&executor, "SELECT * FROM notes;").unwrap();
    assert_eq!(result.rows, vec![vec![Value::Text("it's a test".into())]]);
}

#[test]
fn test_rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let pool = BufferPool::new(dir.path(), 8, 2).unwrap();
        let executor = Executor::new(pool);
        run(&executor, "CREATE TABLE users (id INT, name TEXT);");
        run(&executor, "INSERT INTO users VALUES (1, 'ada');");
        run(&executor, "INSERT INTO users VALUES (2, 'grace');");
        // Dropping the executor shuts the pool down; the final flusher
        // pass writes the dirty page back.
    }

    let pool = BufferPool::new(dir.path(), 8, 2).unwrap();
    let executor = Executor::new(pool);
    let result = run(&executor, "SELECT * FROM users;").unwrap();
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[1][1], Value::Text("grace".into()));
}

#[test]
fn test_small_pool_scans_under_eviction_pressure() {
    let dir = tempfile::tempdir().unwrap();
    let pool = BufferPool::new(dir.path(), 2, 2).unwrap();
    let executor = Executor::new(pool);

    run(&executor, "CREATE TABLE blobs (id INT, body TEXT);");
    let body = "b".repeat(1000);
    for i in 0..12 {
        run(
            &executor,
            &format!("INSERT INTO blobs VALUES ({}, '{}');", i, body),
        );
    }

    // More pages than frames: the scan has to evict and re-read.
    let result = run(&executor, "SELECT id FROM blobs;").unwrap();
    assert_eq!(result.rows.len(), 12);
    assert!(executor.pool().resident_count() <= 2);
}
