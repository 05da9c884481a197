use bulletin_core::{
    decode_announcements, encode_announcements, AnnouncementDraft, AnnouncementStore,
    CorruptState, DurableStorage, ManualClock, MemoryStorage, StoreError, ANNOUNCEMENTS_KEY,
};

fn draft(title: &str) -> AnnouncementDraft {
    AnnouncementDraft::new(title, format!("{title} body"))
}

fn titles<S: DurableStorage, C: bulletin_core::Clock>(store: &AnnouncementStore<S, C>) -> Vec<String> {
    store
        .announcements()
        .iter()
        .map(|announcement| announcement.title.clone())
        .collect()
}

fn mirror(storage: &MemoryStorage) -> Vec<bulletin_core::Announcement> {
    let raw = storage
        .get_item(ANNOUNCEMENTS_KEY)
        .unwrap()
        .expect("mirror should be written");
    decode_announcements(&raw).unwrap()
}

#[test]
fn adds_come_out_newest_first() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(1_700_000_000_000);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);

    for title in ["one", "two", "three", "four"] {
        store.add(draft(title)).unwrap();
        clock.advance(3);
    }

    assert_eq!(titles(&store), vec!["four", "three", "two", "one"]);
}

#[test]
fn scenario_add_a_then_b() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(1_000);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);

    let a = store.add(AnnouncementDraft::new("A", "")).unwrap();
    let b = store.add(AnnouncementDraft::new("B", "")).unwrap();

    assert_eq!(titles(&store), vec!["B", "A"]);
    let t1 = a.id.as_millis().unwrap();
    let t2 = b.id.as_millis().unwrap();
    assert!(t2 >= t1);
    assert_ne!(a.id, b.id, "same-tick adds must not share an id");
    assert_eq!(store.announcements()[0].id, b.id);
    assert_eq!(store.announcements()[1].id, a.id);
}

#[test]
fn scenario_delete_middle_rewrites_mirror() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(10);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    store.add(draft("Z")).unwrap();
    store.add(draft("Y")).unwrap();
    store.add(draft("X")).unwrap();
    assert_eq!(titles(&store), vec!["X", "Y", "Z"]);

    let removed = store.delete_at(1).unwrap();

    assert_eq!(removed.title, "Y");
    assert_eq!(titles(&store), vec!["X", "Z"]);
    assert_eq!(mirror(&storage), store.announcements());
}

#[test]
fn reopening_yields_the_last_persisted_list() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(500);
    {
        let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
        store.add(draft("first")).unwrap();
        store.add(draft("second")).unwrap();
        store.add(draft("third")).unwrap();
        store.update_at(2, draft("first (edited)")).unwrap();
        store.delete_at(0).unwrap();

        let reopened = AnnouncementStore::open_with_clock(&storage, &clock);
        assert_eq!(reopened.announcements(), store.announcements());
        assert!(reopened.startup_issue().is_none());
    }

    let reopened = AnnouncementStore::open_with_clock(&storage, &clock);
    assert_eq!(titles(&reopened), vec!["second", "first (edited)"]);
}

#[test]
fn reopened_store_never_reissues_loaded_ids() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(2_000);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    let existing = store.add(draft("kept")).unwrap();

    clock.set(1_000);
    let mut reopened = AnnouncementStore::open_with_clock(&storage, &clock);
    let fresh = reopened.add(draft("new")).unwrap();

    assert!(fresh.id.as_millis().unwrap() > existing.id.as_millis().unwrap());
}

#[test]
fn delete_then_update_never_resurrects() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(1);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    for title in ["c", "b", "a"] {
        store.add(draft(title)).unwrap();
    }

    let deleted = store.delete_at(1).unwrap();
    for index in 0..store.len() {
        store.update_at(index, draft("rewritten")).unwrap();
        assert!(store.find(&deleted.id).is_none());
        assert!(mirror(&storage).iter().all(|a| a.id != deleted.id));
    }
}

#[test]
fn update_replaces_wholesale_and_keeps_identity() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(77);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    let original = store
        .add(AnnouncementDraft::new("title", "body").with_author("staff"))
        .unwrap();

    clock.advance(1_000);
    let updated = store.update_at(0, AnnouncementDraft::new("new title", "")).unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.author, None);
    assert_eq!(updated.body, "");
    assert_eq!(mirror(&storage), vec![updated]);
}

#[test]
fn persistence_failure_keeps_memory_and_flush_recovers() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(1);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    store.add(draft("saved")).unwrap();

    storage.set_read_only(true);
    let err = store.add(draft("unsaved")).unwrap_err();
    assert!(matches!(err, StoreError::PersistenceFailed(_)));
    assert_eq!(titles(&store), vec!["unsaved", "saved"]);
    assert!(store.is_dirty());
    assert_eq!(mirror(&storage).len(), 1);

    storage.set_read_only(false);
    store.flush().unwrap();
    assert!(!store.is_dirty());
    assert_eq!(mirror(&storage), store.announcements());
}

#[test]
fn quota_exceeded_is_reported_as_persistence_failure() {
    let storage = MemoryStorage::with_quota(200);
    let clock = ManualClock::new(1);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);

    let big = "x".repeat(300);
    let err = store.add(AnnouncementDraft::new("big", big)).unwrap_err();
    assert!(matches!(err, StoreError::PersistenceFailed(_)));
    assert_eq!(store.len(), 1);
    assert_eq!(storage.get_item(ANNOUNCEMENTS_KEY).unwrap(), None);
}

#[test]
fn corrupt_mirror_recovers_to_empty_and_is_replaced_on_next_write() {
    let storage = MemoryStorage::new();
    storage
        .set_item(ANNOUNCEMENTS_KEY, r#"[{"id":"abc","title":"bad"}]"#)
        .unwrap();
    let clock = ManualClock::new(1);

    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    assert!(store.is_empty());
    assert!(store.startup_issue().is_some());

    store.add(draft("fresh")).unwrap();
    assert_eq!(titles(&AnnouncementStore::open_with_clock(&storage, &clock)), vec!["fresh"]);
}

#[test]
fn invalid_records_are_skipped_without_losing_valid_ones() {
    let storage = MemoryStorage::new();
    storage
        .set_item(
            ANNOUNCEMENTS_KEY,
            r#"[{"id":"1","title":"keep me"},{"id":"2","title":""}]"#,
        )
        .unwrap();
    let clock = ManualClock::new(1);

    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    assert_eq!(titles(&store), vec!["keep me"]);
    match store.startup_issue() {
        Some(CorruptState::InvalidRecords(skipped)) => assert_eq!(skipped.len(), 1),
        other => panic!("unexpected startup issue: {other:?}"),
    }

    let added = store.add(draft("B")).unwrap();
    assert_ne!(added.id.as_str(), "1");
    let titles: Vec<String> = mirror(&storage).into_iter().map(|a| a.title).collect();
    assert_eq!(titles, vec!["B", "keep me"]);

    assert!(matches!(
        AnnouncementStore::open_strict_with_clock(&storage, &clock),
        Ok(_)
    ));
}

#[test]
fn strict_open_rejects_partially_invalid_mirror() {
    let storage = MemoryStorage::new();
    storage
        .set_item(
            ANNOUNCEMENTS_KEY,
            r#"[{"id":"1","title":"ok"},{"id":"x","title":"bad"}]"#,
        )
        .unwrap();

    let result = AnnouncementStore::open_strict_with_clock(&storage, ManualClock::new(1));
    assert!(matches!(
        result,
        Err(StoreError::CorruptState(CorruptState::InvalidRecords(_)))
    ));
}

#[test]
fn unknown_record_fields_survive_later_writes() {
    let storage = MemoryStorage::new();
    storage
        .set_item(
            ANNOUNCEMENTS_KEY,
            r#"[{"id":"1700000000000","title":"A","content":"hello","image":"x.png"}]"#,
        )
        .unwrap();
    let clock = ManualClock::new(1_700_000_000_000);

    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    store.add(draft("B")).unwrap();
    store.update_at(1, AnnouncementDraft::new("A edited", "")).unwrap();

    let raw = storage.get_item(ANNOUNCEMENTS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["title"], "B");
    assert!(value[0].get("content").is_none());
    assert_eq!(value[1]["id"], "1700000000000");
    assert_eq!(value[1]["title"], "A edited");
    assert_eq!(value[1]["content"], "hello");
    assert_eq!(value[1]["image"], "x.png");
}

#[test]
fn durable_format_roundtrips_store_contents() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(1_700_000_000_000);
    let mut store = AnnouncementStore::open_with_clock(&storage, &clock);
    store.add(draft("a")).unwrap();
    store
        .add(AnnouncementDraft::new("b", "multi\nline \"quoted\"").with_author("ädmin"))
        .unwrap();

    let encoded = encode_announcements(store.announcements()).unwrap();
    assert_eq!(decode_announcements(&encoded).unwrap(), store.announcements());
}
