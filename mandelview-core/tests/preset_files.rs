use std::path::PathBuf;

use serde_json::Value;

use mandelview_core::preset::{parse_preset, to_json};
use mandelview_core::{load_preset, save_preset, CoreError, DVec2, Parms, PresetLibrary};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mandelview_core_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Normalise every number to f64 so `1` and `1.0` compare equal.
fn normalise(v: &Value) -> Value {
    match v {
        Value::Number(n) => Value::from(n.as_f64().expect("finite number")),
        Value::Array(items) => Value::Array(items.iter().map(normalise).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalise(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

const SCENARIO: &str = r#"{
    "width": 100,
    "height": 100,
    "maxIterations": 50,
    "offset": [0, 0],
    "zoom": 1.0,
    "colors": [
        [1, 0, 0, 1], [0, 1, 0, 1], [0, 0, 1, 1], [1, 1, 0, 1], [0, 1, 1, 1],
        [1, 0, 1, 1], [0.5, 0.5, 0.5, 1], [0.25, 0.75, 0.125, 1], [0, 0, 0, 1], [1, 1, 1, 1]
    ]
}"#;

#[test]
fn load_then_save_reproduces_document() {
    let dir = scratch_dir("scenario");
    let input = dir.join("scenario.json");
    std::fs::write(&input, SCENARIO).unwrap();

    let parms = load_preset(&input).unwrap().expect("preset exists");
    assert_eq!((parms.width, parms.height), (100, 100));
    assert_eq!(parms.max_iterations, 50);

    let output = dir.join("saved.json");
    save_preset(&output, &parms).unwrap();

    let original: Value = serde_json::from_str(SCENARIO).unwrap();
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(normalise(&original), normalise(&saved));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn save_load_round_trip_on_disk() {
    let dir = scratch_dir("round_trip");
    let path = dir.join("view.json");

    let mut parms = Parms::default();
    parms.offset = DVec2::new(-1234.5, 98.765);
    parms.zoom = 1.0e9;
    parms.max_iterations = 4000;
    parms.set_resolution(1024, 768);
    for (i, c) in parms.colors.iter_mut().enumerate() {
        *c = [i as f32 / 9.0, 1.0 - i as f32 / 9.0, 0.5, 1.0];
    }

    save_preset(&path, &parms).unwrap();
    let back = load_preset(&path).unwrap().unwrap();
    assert_eq!(back, parms);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_a_no_op() {
    let dir = scratch_dir("missing");
    assert!(load_preset(&dir.join("nope.json")).unwrap().is_none());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn malformed_file_is_reported() {
    let dir = scratch_dir("malformed");
    let path = dir.join("bad.json");
    std::fs::write(&path, SCENARIO.replace("\"offset\": [0, 0]", "\"offset\": [0]")).unwrap();

    match load_preset(&path) {
        Err(CoreError::MalformedConfig { field, .. }) => assert_eq!(field, "offset"),
        other => panic!("expected MalformedConfig, got {other:?}"),
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unwritable_target_is_an_error() {
    let dir = scratch_dir("unwritable");
    let path = dir.join("no_such_subdir").join("x.json");
    assert!(matches!(
        save_preset(&path, &Parms::default()),
        Err(CoreError::Io { .. })
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn library_lists_sorted_presets() {
    let dir = scratch_dir("library");
    let lib = PresetLibrary::new(&dir);
    assert!(lib.list().is_empty());

    lib.ensure_default(&Parms::default()).unwrap();
    let names: Vec<_> = lib.list().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["default"]);

    lib.save("zeta", &Parms::default()).unwrap();
    lib.save("alpha", &Parms::default()).unwrap();
    std::fs::write(dir.join("notes.txt"), "not a preset").unwrap();

    let names: Vec<_> = lib.list().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["alpha", "default", "zeta"]);

    // Seeding again does not overwrite or add anything.
    lib.ensure_default(&Parms::default()).unwrap();
    assert_eq!(lib.list().len(), 3);

    let mut parms = Parms::default();
    parms.zoom = 2.5;
    lib.save("alpha", &parms).unwrap();
    assert_eq!(lib.load("alpha").unwrap().unwrap().zoom, 2.5);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listing_follows_files_changed_outside_the_library() {
    let dir = scratch_dir("external");
    let lib = PresetLibrary::new(&dir);
    lib.save("first", &Parms::default()).unwrap();
    assert_eq!(lib.list().len(), 1);

    // Copied in by hand after the first listing.
    let json = to_json(&Parms::default()).unwrap();
    std::fs::write(dir.join("dropped.json"), json).unwrap();
    let names: Vec<_> = lib.list().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["dropped", "first"]);

    std::fs::remove_file(dir.join("first.json")).unwrap();
    let names: Vec<_> = lib.list().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["dropped"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn string_round_trip_keeps_colors() {
    let mut parms = Parms::default();
    parms.colors[0] = [0.123, 0.456, 0.789, 0.5];
    let back = parse_preset(&to_json(&parms).unwrap()).unwrap();
    assert_eq!(back.colors, parms.colors);
}
