use pairsync_fs::{ConfigStore, Error, NormalizedPath, RobustnessConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct PairList {
    pairs: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Entry {
    name: String,
    source: String,
    target: String,
}

fn sample() -> PairList {
    PairList {
        pairs: vec![Entry {
            name: "notes".into(),
            source: "/a/notes.md".into(),
            target: "/b/notes.md".into(),
        }],
    }
}

#[rstest]
#[case("pairs.json")]
#[case("pairs.toml")]
#[case("pairs.yaml")]
#[case("pairs.yml")]
fn save_then_load_in_every_format(#[case] name: &str) {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(name));
    let store = ConfigStore::new();

    store.save(&path, &sample()).unwrap();
    let loaded: PairList = store.load(&path).unwrap();

    assert_eq!(loaded, sample());
}

#[test]
fn save_without_fsync() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("nested").join("pairs.json"));
    let store = ConfigStore::with_robustness(RobustnessConfig {
        enable_fsync: false,
        ..RobustnessConfig::default()
    });

    store.save(&path, &sample()).unwrap();

    assert!(path.is_file());
    assert_eq!(store.load::<PairList>(&path).unwrap(), sample());
}

#[test]
fn load_json_written_by_hand() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("sync-config.json");
    fs::write(
        &file_path,
        r#"{"pairs": [{"name": "notes", "source": "/a/notes.md", "target": "/b/notes.md"}]}"#,
    )
    .unwrap();

    let loaded: PairList = ConfigStore::new()
        .load(&NormalizedPath::new(&file_path))
        .unwrap();
    assert_eq!(loaded, sample());
}

#[test]
fn malformed_json_reports_format_and_path() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("broken.json");
    fs::write(&file_path, "{ not json").unwrap();

    let err = ConfigStore::new()
        .load::<PairList>(&NormalizedPath::new(&file_path))
        .unwrap_err();

    match err {
        Error::ConfigParse { format, path, .. } => {
            assert_eq!(format, "JSON");
            assert_eq!(path, file_path);
        }
        other => panic!("expected ConfigParse, got {other:?}"),
    }
}

#[test]
fn unsupported_extension_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("pairs.ini"));

    let err = ConfigStore::new().save(&path, &sample()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { extension } if extension == "ini"));
}

#[test]
fn load_optional_missing_file_is_none() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("absent.json"));

    let loaded: Option<PairList> = ConfigStore::new().load_optional(&path).unwrap();
    assert!(loaded.is_none());
}
