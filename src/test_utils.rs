use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::io::{Cursor, Write};
use std::sync::Once;

use crate::database::user_repo::{self, NewUser};

static INIT: Once = Once::new();

pub struct TestContext {
    pub pool: Pool<Sqlite>,
}

pub async fn init_test_db() -> TestContext {
    INIT.call_once(|| {
        // Initialize logger only once
        let _ = env_logger::builder().is_test(true).try_init();
    });

    // Single connection: every connection to `sqlite::memory:` is a separate database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    TestContext { pool }
}

/// Insert a user with predictable fields derived from `username`.
pub async fn seed_user(pool: &Pool<Sqlite>, username: &str) -> i64 {
    let email = format!("{username}@example.com");
    user_repo::insert_user(
        pool,
        &NewUser {
            username,
            email: &email,
            serial_number: None,
            phone_number: None,
            password_hash: "not-a-real-hash",
        },
    )
    .await
    .expect("seed user")
    .id
}

/// Build an in-memory ZIP (stored, uncompressed) from `(name, content)` pairs.
pub fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (entry_name, content) in files {
        writer.start_file(entry_name.to_string(), options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Router bound to an ephemeral local port, backed by `pool` and a temp media root.
pub struct TestApp {
    pub base_url: String,
    pub state: crate::state::SharedState,
    pub media_dir: tempfile::TempDir,
}

pub async fn spawn_app(pool: Pool<Sqlite>) -> TestApp {
    use crate::services::config::AppConfig;

    let media_dir = tempfile::TempDir::new().expect("temp media dir");
    let mut config = AppConfig::from_lookup(|_| None).expect("default config");
    config.media_root = media_dir.path().to_path_buf();

    let state = crate::state::AppState::with_pool(config, pool).expect("app state");
    let app = crate::routes::router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    TestApp {
        base_url: format!("http://{addr}"),
        state,
        media_dir,
    }
}
