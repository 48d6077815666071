//! Persistence properties of the stores and zoom bounds.

use crate::common::{open_session, ScriptedPrompt};
use mdpad_core::store::{FileStore, MemoryStore, SettingsStore, DOCUMENT_KEY};
use mdpad_core::zoom::{ZoomBounds, ZoomDirection};
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_text_round_trips_through_file_store(text in "\\PC{0,200}") {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let mut session = open_session(
                Arc::new(FileStore::open(&path)),
                ScriptedPrompt::answering(false),
                dir.path(),
            );
            session.set_text(text.clone());
        }
        let reopened = open_session(
            Arc::new(FileStore::open(&path)),
            ScriptedPrompt::answering(false),
            dir.path(),
        );
        prop_assert_eq!(reopened.text(), text.as_str());
    }

    #[test]
    fn prop_zoom_stays_in_bounds(
        start in any::<i32>(),
        steps in proptest::collection::vec(any::<bool>(), 0..40),
    ) {
        let bounds = ZoomBounds::default();
        let mut current = bounds.clamp(start);
        for zoom_in in steps {
            let direction = if zoom_in { ZoomDirection::In } else { ZoomDirection::Out };
            let next = bounds.step_from(current, direction);
            prop_assert!(next >= bounds.min && next <= bounds.max);
            prop_assert!((next - current).abs() <= bounds.step);
            current = next;
        }
    }

    #[test]
    fn prop_stored_zoom_parses_into_bounds(raw in "\\PC{0,12}") {
        let bounds = ZoomBounds::default();
        let value = bounds.parse(Some(raw.as_str()));
        prop_assert!(value >= bounds.min && value <= bounds.max);
    }
}

#[test]
fn test_memory_store_matches_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let stores: [Box<dyn SettingsStore>; 2] = [
        Box::new(MemoryStore::new()),
        Box::new(FileStore::open(dir.path().join("s.json"))),
    ];
    for store in &stores {
        assert_eq!(store.load(DOCUMENT_KEY), None);
        store.save(DOCUMENT_KEY, "a").unwrap();
        store.save(DOCUMENT_KEY, "b").unwrap();
        assert_eq!(store.load(DOCUMENT_KEY).as_deref(), Some("b"));
    }
}

#[test]
fn test_file_store_writes_plain_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");
    FileStore::open(&path).save("mdpad.zoom.editor", "120").unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["mdpad.zoom.editor"], "120");
}
