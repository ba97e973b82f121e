use approx::assert_abs_diff_eq;
use fftb_core::RgbChannels;
use fftb_io::{IoError, ResultLog, load_rgb, save_rgb};
use serde_json::{Value, json};
use std::fs;

#[test]
fn png_round_trip_normalizes_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uniform.png");
    let rgb = [128.0 / 255.0, 64.0 / 255.0, 32.0 / 255.0];
    save_rgb(&path, &RgbChannels::uniform(3, 2, rgb)).expect("save png");

    let loaded = load_rgb(&path).expect("load png");
    assert_eq!((loaded.width, loaded.height), (3, 2));
    for (plane, expected) in loaded.planes().iter().zip(rgb) {
        for &v in plane.iter() {
            assert_abs_diff_eq!(v, expected, epsilon = 1e-12);
        }
    }
}

#[test]
fn save_clamps_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clamped.png");
    let img = RgbChannels::new(2, 1, vec![1.7, -0.2], vec![0.0, 1.0], vec![0.5, 0.5]).unwrap();
    save_rgb(&path, &img).unwrap();
    let loaded = load_rgb(&path).unwrap();
    assert_eq!(loaded.red, vec![1.0, 0.0]);
    assert_eq!(loaded.pixel(1, 0)[1], 1.0);
}

#[test]
fn undecodable_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.png");
    fs::write(&path, b"not an image").unwrap();
    match load_rgb(&path) {
        Err(IoError::Decode { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn append_preserves_existing_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    let log = ResultLog::new(&path);

    let first = json!({"performance_results": {"inputs": {"threads": 1}}});
    let second = json!({"performance_results": {"inputs": {"threads": 8}}});
    log.append_with_key("2026-1-2 3:4:5", &first).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    log.append_with_key("2026-1-2 3:4:6", &second).unwrap();
    let after = fs::read_to_string(&path).unwrap();

    let kept = before.trim_end().strip_suffix('}').unwrap().trim_end();
    assert!(after.starts_with(kept));

    let doc: Value = serde_json::from_str(&after).unwrap();
    let map = doc.as_object().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["2026-1-2 3:4:5"], first);
    assert_eq!(map["2026-1-2 3:4:6"], second);

    // Every level of the written log steps by four spaces.
    for line in after.lines() {
        let indent = line.len() - line.trim_start().len();
        assert_eq!(indent % 4, 0, "line {line:?}");
    }
    assert!(after.contains("\n            \"inputs\": {\n                \"threads\": 8"));
}

#[test]
fn append_keeps_duplicate_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let log = ResultLog::new(dir.path().join("results.json"));
    assert_eq!(log.append_with_key("t", &json!(1)).unwrap(), "t");
    assert_eq!(log.append_with_key("t", &json!(2)).unwrap(), "t #2");
    assert_eq!(log.append_with_key("t", &json!(3)).unwrap(), "t #3");

    let doc: Value = serde_json::from_str(&fs::read_to_string(log.path()).unwrap()).unwrap();
    assert_eq!(doc["t #3"], 3);
    assert_eq!(doc.as_object().unwrap().len(), 3);
}

#[test]
fn append_to_empty_object_and_hand_written_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    fs::write(&path, "{}").unwrap();
    let log = ResultLog::new(&path);
    log.append(&json!({"a": 1})).unwrap();
    let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc.as_object().unwrap().len(), 1);

    fs::write(&path, "{\n    \"old\": {\"x\": [1, 2]}\n}").unwrap();
    log.append_with_key("new", &json!({"y": true})).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("{\n    \"old\": {\"x\": [1, 2]},\n"));
    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["new"]["y"], true);
}

#[test]
fn malformed_log_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    for bad in ["[1, 2]", "{\"a\": 1", "plain text"] {
        fs::write(&path, bad).unwrap();
        let err = ResultLog::new(&path).append(&json!({})).unwrap_err();
        assert!(matches!(err, IoError::MalformedRecord { .. }), "{bad}");
        assert_eq!(fs::read_to_string(&path).unwrap(), bad);
    }
}
