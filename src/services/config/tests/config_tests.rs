use super::*;
use std::collections::HashMap;

fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|key| map.get(key).cloned())
}

#[test]
fn test_defaults_when_env_is_empty() {
    let config = config_from(&[]).unwrap();

    assert_eq!(config.port, 8000);
    assert_eq!(config.media_url, "/media/");
    assert_eq!(config.media_root, PathBuf::from("media"));
    assert!(config.blob_base_url.is_none());
    assert_eq!(config.stl.subdir, "stl_files");
    assert_eq!(config.stl.layout, StlLayout::PerExamination);
    assert_eq!(config.stl.fetch_timeout, Duration::from_secs(30));
    assert_eq!(config.stl.allow_list.names().len(), 10);
}

#[test]
fn test_overrides_are_parsed() {
    let config = config_from(&[
        ("PORT", "9100"),
        ("MEDIA_URL", "files"),
        ("BLOB_BASE_URL", "http://blobs.internal:9000/"),
        ("STL_LAYOUT", "flat"),
        ("STL_FETCH_TIMEOUT_SECS", "5"),
        ("STL_MAX_ENTRY_BYTES", "1024"),
        ("STL_SUBDIR", "/meshes/"),
    ])
    .unwrap();

    assert_eq!(config.port, 9100);
    assert_eq!(config.media_url, "/files/");
    assert_eq!(config.blob_base_url.as_deref(), Some("http://blobs.internal:9000"));
    assert_eq!(config.stl.layout, StlLayout::Flat);
    assert_eq!(config.stl.fetch_timeout, Duration::from_secs(5));
    assert_eq!(config.stl.limits.max_entry_bytes, 1024);
    assert_eq!(config.stl.subdir, "meshes");
}

#[test]
fn test_invalid_value_is_an_error() {
    let err = config_from(&[("PORT", "eighty")]).unwrap_err();
    match err {
        ConfigError::Invalid { key, value, .. } => {
            assert_eq!(key, "PORT");
            assert_eq!(value, "eighty");
        }
    }

    assert!(config_from(&[("STL_LAYOUT", "nested")]).is_err());
}

#[test]
fn test_custom_allow_list() {
    let config = config_from(&[("STL_ALLOWED_FILES", "A.STL, B.STL,,")]).unwrap();
    assert_eq!(config.stl.allow_list.names(), ["A.STL", "B.STL"]);

    assert!(config_from(&[("STL_ALLOWED_FILES", "../escape.STL")]).is_err());
    assert!(config_from(&[("STL_ALLOWED_FILES", " , ")]).is_err());
}

#[test]
fn test_zero_fetch_timeout_is_rejected() {
    let err = config_from(&[("STL_FETCH_TIMEOUT_SECS", "0")]).unwrap_err();
    match err {
        ConfigError::Invalid { key, .. } => assert_eq!(key, "STL_FETCH_TIMEOUT_SECS"),
    }
}

#[test]
fn test_byte_limits_must_be_bounded() {
    let max = u64::MAX.to_string();
    for key in ["STL_MAX_ARCHIVE_BYTES", "STL_MAX_ENTRY_BYTES"] {
        for value in ["0", max.as_str()] {
            match config_from(&[(key, value)]).unwrap_err() {
                ConfigError::Invalid { key: got, .. } => assert_eq!(got, key),
            }
        }
    }

    let config = config_from(&[("STL_MAX_ARCHIVE_BYTES", "1")]).unwrap();
    assert_eq!(config.stl.limits.max_archive_bytes, 1);
}
