use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Once;

use footscan_lib::services::config::AppConfig;
use footscan_lib::state::AppState;
use tempfile::TempDir;

static INIT: Once = Once::new();

pub struct TestServer {
    pub base_url: String,
    pub media_root: PathBuf,
    _dir: TempDir,
}

/// Boot the full stack (file-backed SQLite, migrations, media dir) on an ephemeral port.
/// `env` overrides configuration keys the same way the process environment would.
pub async fn spawn_server(env: &[(&str, &str)]) -> TestServer {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });

    let dir = TempDir::new().expect("temp dir");
    let media_root = dir.path().join("media");
    let mut vars: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.insert(
        "DATABASE_URL".into(),
        format!("sqlite://{}", dir.path().join("footscan.db").display()),
    );
    vars.insert("MEDIA_ROOT".into(), media_root.display().to_string());

    let config = AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("config");
    let state = AppState::init(config).await.expect("app state");
    let app = footscan_lib::routes::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        media_root,
        _dir: dir,
    }
}

/// Build an in-memory ZIP from `(name, content)` pairs.
pub fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in files {
        writer.start_file(name.to_string(), options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
