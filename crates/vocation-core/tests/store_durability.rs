//! File-backed ResultStore tests: restart durability and concurrent writers.

use std::collections::HashSet;
use std::thread;

use tempfile::TempDir;
use vocation_core::{
    PredictionResult, QuestionnaireResponse, ResultStore, SpecialtyScore, StoreError,
    QUESTION_COUNT,
};

fn prediction(top: &str) -> PredictionResult {
    PredictionResult {
        raw_scores: [(top.to_string(), 61.25), ("Other".to_string(), 38.75)]
            .into_iter()
            .collect(),
        top: vec![
            SpecialtyScore {
                name: top.to_string(),
                score: 61.25,
                rank: 1,
            },
            SpecialtyScore {
                name: "Other".to_string(),
                score: 38.75,
                rank: 2,
            },
        ],
    }
}

fn answers(v: u8) -> QuestionnaireResponse {
    QuestionnaireResponse::from_answers([v; QUESTION_COUNT]).unwrap()
}

#[test]
fn test_record_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("results.db");

    let id = {
        let store = ResultStore::open(&path).unwrap();
        store
            .save("Ada", "ada@example.org", &answers(4), &prediction("Medicine"))
            .unwrap()
    };

    let reopened = ResultStore::open(&path).unwrap();
    let record = reopened.get(id).unwrap();
    assert_eq!(record.display_name, "Ada");
    assert_eq!(record.contact_email, "ada@example.org");
    assert_eq!(record.answers, answers(4));
    assert_eq!(record.prediction, prediction("Medicine"));
}

#[test]
fn test_ids_not_reused_across_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.db");

    let first = ResultStore::open(&path)
        .unwrap()
        .save("A", "", &answers(1), &prediction("X"))
        .unwrap();
    let second = ResultStore::open(&path)
        .unwrap()
        .save("B", "", &answers(2), &prediction("X"))
        .unwrap();

    assert!(second > first);
}

#[test]
fn test_fifty_concurrent_saves_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let store = ResultStore::open(&dir.path().join("results.db")).unwrap();

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                store.save(
                    &format!("user-{}", i),
                    "",
                    &answers((i % 5) as u8 + 1),
                    &prediction("X"),
                )
            })
        })
        .collect();

    let ids: Vec<i64> = handles
        .into_iter()
        .map(|h| h.join().unwrap().expect("save failed"))
        .collect();

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 50, "duplicate ids: {:?}", ids);
    assert_eq!(store.count().unwrap(), 50);

    for id in ids {
        let record = store.get(id).unwrap();
        assert!(record.display_name.starts_with("user-"));
    }
}

#[test]
fn test_two_connections_share_id_sequence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.db");
    let store1 = ResultStore::open(&path).unwrap();
    let store2 = ResultStore::open(&path).unwrap();

    let h1 = {
        let s = store1.clone();
        thread::spawn(move || {
            (0..10)
                .map(|_| s.save("one", "", &answers(1), &prediction("X")).unwrap())
                .collect::<Vec<_>>()
        })
    };
    let h2 = {
        let s = store2.clone();
        thread::spawn(move || {
            (0..10)
                .map(|_| s.save("two", "", &answers(2), &prediction("X")).unwrap())
                .collect::<Vec<_>>()
        })
    };

    let mut ids = h1.join().unwrap();
    ids.extend(h2.join().unwrap());
    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 20);
    assert_eq!(store1.count().unwrap(), 20);
}

#[test]
fn test_ping_fails_when_database_file_removed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.db");
    let store = ResultStore::open(&path).unwrap();
    assert!(store.ping().is_ok());

    std::fs::remove_file(&path).unwrap();
    assert!(matches!(store.ping(), Err(StoreError::Read { .. })));
}

#[test]
fn test_open_fails_when_parent_is_a_file() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let result = ResultStore::open(&blocker.join("results.db"));
    assert!(matches!(result, Err(StoreError::Open { .. })));
}
