use std::time::Duration;

use snip_core::{Entry, Link, ShortCode};
use snip_storage::{Backend, Change, PostgresBackend, PostgresSettings, Relation, StorageError};
use snip_test_infra::postgres::{PostgresConfig, PostgresServer};

struct Fixture {
    _postgres: PostgresServer,
    backend: PostgresBackend,
}

impl Fixture {
    async fn start() -> Self {
        let postgres = PostgresServer::new(PostgresConfig::builder().build())
            .await
            .expect("start postgres");
        let url = postgres.database_url().await.expect("postgres url");
        let backend = connect_with_retry(&url).await;

        Self {
            _postgres: postgres,
            backend,
        }
    }
}

async fn connect_with_retry(url: &str) -> PostgresBackend {
    let settings = PostgresSettings::builder().dsn(url).build();
    let mut last_error = None;

    for _ in 0..20 {
        match PostgresBackend::connect(&settings).await {
            Ok(backend) => return backend,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect postgres: {last_error:?}");
}

fn entry(owner: &str, code: &str, url: &str) -> Entry {
    Entry::new(owner, ShortCode::new_unchecked(code), url)
}

async fn insert(backend: &PostgresBackend, relation: &mut Relation, e: Entry) {
    relation.insert(e.clone());
    backend
        .commit(&Change::Insert(e), relation)
        .await
        .expect("insert");
}

#[tokio::test]
async fn insert_and_load() {
    let fixture = Fixture::start().await;
    let mut relation = Relation::new();

    insert(&fixture.backend, &mut relation, entry("u1", "abc123", "https://example.com")).await;
    insert(&fixture.backend, &mut relation, entry("u2", "def456", "/relative/path")).await;

    let loaded = fixture.backend.load().await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded.get("abc123"),
        Some(("u1", &Link::new("https://example.com")))
    );
    assert_eq!(loaded.get("def456").unwrap().0, "u2");
}

#[tokio::test]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start().await;
    let mut relation = Relation::new();

    insert(&fixture.backend, &mut relation, entry("u1", "abc123", "https://one.example")).await;

    let err = fixture
        .backend
        .commit(
            &Change::Insert(entry("u2", "abc123", "https://two.example")),
            &relation,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(code) if code == "abc123"));
}

#[tokio::test]
async fn mark_deleted_survives_reload() {
    let fixture = Fixture::start().await;
    let mut relation = Relation::new();

    insert(&fixture.backend, &mut relation, entry("u1", "gone", "https://example.com")).await;
    relation.set_deleted("u1", "gone", true);
    fixture
        .backend
        .commit(
            &Change::MarkDeleted {
                owner: "u1".to_string(),
                code: ShortCode::new_unchecked("gone"),
            },
            &relation,
        )
        .await
        .unwrap();

    let loaded = fixture.backend.load().await.unwrap();
    assert!(loaded.get("gone").unwrap().1.deleted);
}

#[tokio::test]
async fn mark_deleted_of_unknown_row_is_invalid_data() {
    let fixture = Fixture::start().await;

    let err = fixture
        .backend
        .commit(
            &Change::MarkDeleted {
                owner: "u1".to_string(),
                code: ShortCode::new_unchecked("nope"),
            },
            &Relation::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::InvalidData(_)));
}

#[tokio::test]
async fn health_check_tracks_pool_state() {
    let fixture = Fixture::start().await;

    assert!(fixture.backend.health_check().await);

    fixture.backend.close().await;
    assert!(!fixture.backend.health_check().await);
}

#[tokio::test]
async fn ensure_schema_is_idempotent() {
    let fixture = Fixture::start().await;

    fixture.backend.ensure_schema().await.unwrap();
    fixture.backend.ensure_schema().await.unwrap();
}

#[tokio::test]
async fn legacy_table_rows_are_imported_once() {
    let fixture = Fixture::start().await;
    let pool = fixture.backend.pool();

    sqlx::query("CREATE TABLE shortener (usr text, short text unique, long text)")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO shortener VALUES ($1, $2, $3), ($4, $5, $6)")
        .bind("u1")
        .bind("old1")
        .bind("https://old.example/1")
        .bind("u2")
        .bind("old2")
        .bind("https://old.example/2")
        .execute(pool)
        .await
        .unwrap();

    fixture.backend.ensure_schema().await.unwrap();
    fixture.backend.ensure_schema().await.unwrap();

    let loaded = fixture.backend.load().await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded.get("old1"),
        Some(("u1", &Link::new("https://old.example/1")))
    );
    assert_eq!(loaded.get("old2").unwrap().0, "u2");
}
