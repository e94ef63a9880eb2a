use chrono::{Days, NaiveDate, TimeZone, Utc};
use tasklet_core::datastore::TaskStore;
use tasklet_core::filter::{SortMode, StatusFilter, View, ViewQuery};
use tasklet_core::kv::{FileStore, KeyValueStore, THEME_KEY, TODOS_KEY};
use tasklet_core::task::Priority;
use tasklet_core::validate::{Field, TaskForm, ValidationError};
use tempfile::tempdir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn tomorrow() -> NaiveDate {
    today().checked_add_days(Days::new(1)).expect("valid date")
}

fn yesterday() -> NaiveDate {
    today().checked_sub_days(Days::new(1)).expect("valid date")
}

#[test]
fn add_survives_restart() {
    let temp = tempdir().expect("tempdir");
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).single().expect("valid now");

    let added = {
        let kv = FileStore::open(temp.path()).expect("open store");
        let mut store = TaskStore::open(kv);
        let task = store
            .add(
                &TaskForm::new("Buy milk", iso(tomorrow())).with_priority(Priority::Low),
                today(),
                now,
            )
            .expect("valid form");

        let view = View::build(store.tasks(), &ViewQuery::default());
        assert_eq!(view.shown(), 1);
        assert!(view.summary().starts_with("1 task shown"));
        task
    };

    let kv = FileStore::open(temp.path()).expect("reopen store");
    let store = TaskStore::open(kv);
    assert_eq!(store.len(), 1);
    let restored = &store.tasks()[0];
    assert_eq!(restored.id, added.id);
    assert_eq!(restored.text, "Buy milk");
    assert_eq!(restored.due, tomorrow());
    assert_eq!(restored.priority, Priority::Low);
    assert!(!restored.completed);
}

#[test]
fn rejected_forms_leave_collection_unchanged() {
    let temp = tempdir().expect("tempdir");
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).single().expect("valid now");
    let kv = FileStore::open(temp.path()).expect("open store");
    let mut store = TaskStore::open(kv);

    let errors = store
        .add(&TaskForm::new("hi", iso(tomorrow())), today(), now)
        .expect_err("too short");
    assert_eq!(errors.for_field(Field::Text), Some(&ValidationError::TooShort { len: 2 }));
    assert!(errors.for_field(Field::Date).is_none());

    let errors = store
        .add(&TaskForm::new("Buy milk", iso(yesterday())), today(), now)
        .expect_err("past date");
    assert!(matches!(
        errors.for_field(Field::Date),
        Some(ValidationError::PastDate { .. })
    ));

    assert!(store.is_empty());
    assert!(store.kv().get(TODOS_KEY).expect("read").is_none());
}

#[test]
fn toggle_is_an_involution_and_remove_is_idempotent() {
    let temp = tempdir().expect("tempdir");
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).single().expect("valid now");
    let kv = FileStore::open(temp.path()).expect("open store");
    let mut store = TaskStore::open(kv);

    let keep = store
        .add(&TaskForm::new("Water plants", iso(today())), today(), now)
        .expect("valid");
    let gone = store
        .add(&TaskForm::new("Return books", iso(tomorrow())), today(), now)
        .expect("valid");
    assert_ne!(keep.id, gone.id);

    assert_eq!(store.toggle_completed(keep.id), Some(true));
    assert_eq!(store.toggle_completed(keep.id), Some(false));
    assert_eq!(store.toggle_completed(999), None);

    assert!(store.remove(gone.id));
    let after_first: Vec<u64> = store.tasks().iter().map(|t| t.id).collect();
    assert!(!store.remove(gone.id));
    let after_second: Vec<u64> = store.tasks().iter().map(|t| t.id).collect();
    assert_eq!(after_first, after_second);
    assert_eq!(after_first, vec![keep.id]);
}

#[test]
fn date_sorts_and_completed_filter() {
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).single().expect("valid now");
    let temp = tempdir().expect("tempdir");
    let kv = FileStore::open(temp.path()).expect("open store");
    let mut store = TaskStore::open(kv);

    let later = store
        .add(&TaskForm::new("Renew passport", "2026-12-01"), today(), now)
        .expect("valid");
    let sooner = store
        .add(&TaskForm::new("Pick up parcel", iso(tomorrow())), today(), now)
        .expect("valid");

    let asc = View::build(store.tasks(), &ViewQuery::default());
    let asc_ids: Vec<u64> = asc.tasks.iter().map(|t| t.id).collect();
    assert_eq!(asc_ids, vec![sooner.id, later.id]);

    let desc = View::build(
        store.tasks(),
        &ViewQuery {
            sort: SortMode::DateDesc,
            ..ViewQuery::default()
        },
    );
    let desc_ids: Vec<u64> = desc.tasks.iter().map(|t| t.id).collect();
    assert_eq!(desc_ids, vec![later.id, sooner.id]);

    let completed = View::build(
        store.tasks(),
        &ViewQuery {
            status: StatusFilter::Completed,
            ..ViewQuery::default()
        },
    );
    assert!(completed.is_empty());
    assert_eq!(completed.counts.active, 2);
}

#[test]
fn corrupt_storage_and_theme_defaults() {
    let temp = tempdir().expect("tempdir");
    let mut kv = FileStore::open(temp.path()).expect("open store");
    kv.set(TODOS_KEY, "[{\"id\": \"oops\"}]").expect("seed corrupt data");

    let mut store = TaskStore::open(kv);
    assert!(store.is_empty());
    assert_eq!(store.theme().name(), "purple");

    store.set_theme(&tasklet_core::theme::Theme::new("dark"));
    let reopened = TaskStore::open(FileStore::open(temp.path()).expect("reopen store"));
    assert_eq!(reopened.theme().name(), "dark");
    assert_eq!(
        reopened.kv().get(THEME_KEY).expect("read theme").as_deref(),
        Some("dark")
    );
}
