use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::{Clock, DefaultClock};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tasktracker_core::{
    decode_tasks, encode_tasks, MemoryTaskStorage, ReminderEffect, StoreError, Task, TaskId,
    TaskPatch, TaskStore,
};

fn empty_store() -> TaskStore<MemoryTaskStorage, DefaultClock> {
    TaskStore::open(MemoryTaskStorage::new(), DefaultClock)
}

fn persisted(store: &TaskStore<MemoryTaskStorage, DefaultClock>) -> Vec<Task> {
    let raw = store.storage().raw().expect("store should have persisted");
    decode_tasks(&raw).unwrap()
}

fn titles(store: &TaskStore<MemoryTaskStorage, DefaultClock>) -> Vec<String> {
    store
        .ordered_view()
        .into_iter()
        .map(|task| task.title.clone())
        .collect()
}

#[test]
fn load_from_missing_or_malformed_data_yields_empty_store() {
    assert!(empty_store().is_empty());

    let corrupt = TaskStore::open(MemoryTaskStorage::with_raw("{not json"), DefaultClock);
    assert!(corrupt.is_empty());

    let wrong_shape = TaskStore::open(MemoryTaskStorage::with_raw("{\"tasks\":[]}"), DefaultClock);
    assert!(wrong_shape.is_empty());
}

#[test]
fn load_restores_previously_saved_tasks() {
    let tasks = vec![Task::new("first", None), Task::new("second", None)];
    let storage = MemoryTaskStorage::with_raw(encode_tasks(&tasks).unwrap());

    let store = TaskStore::open(storage, DefaultClock);
    assert_eq!(store.tasks(), tasks.as_slice());
}

#[test]
fn load_drops_duplicate_ids_keeping_first() {
    let original = Task::new("original", None);
    let mut duplicate = original.clone();
    duplicate.title = "duplicate".to_string();
    let raw = encode_tasks(&[original.clone(), duplicate]).unwrap();
    let storage = MemoryTaskStorage::with_raw(raw);

    let store = TaskStore::open(storage, DefaultClock);
    assert_eq!(store.tasks(), &[original]);
}

#[test]
fn add_appends_trimmed_task_and_persists() {
    let mut store = empty_store();

    let created = store.add("  Buy milk  ", None).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(created.value.title, "Buy milk");
    assert!(!created.value.is_completed);
    assert!(created.effects.is_empty());
    assert_eq!(store.get(created.value.id), Some(&created.value));
    assert_eq!(persisted(&store), vec![created.value]);
}

#[test]
fn add_rejects_blank_titles_without_touching_store() {
    let mut store = empty_store();
    store.add("keep", None).unwrap();
    let saves_before = store.storage().save_count();

    for blank in ["", "   ", "\t\n"] {
        let err = store.add(blank, None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    assert_eq!(store.len(), 1);
    assert_eq!(store.storage().save_count(), saves_before);
}

#[test]
fn add_with_future_due_date_requests_reminder() {
    let mut store = empty_store();
    let due = Utc::now() + Duration::hours(1);

    let created = store.add("Call Bob", Some(due)).unwrap();
    assert_eq!(
        created.effects,
        vec![ReminderEffect::Schedule {
            id: created.value.id,
            title: "Call Bob".to_string(),
            fire_at: due,
        }]
    );
}

#[test]
fn add_with_past_due_date_does_not_request_reminder() {
    let mut store = empty_store();
    let created = store
        .add("Pay rent", Some(Utc::now() - Duration::hours(1)))
        .unwrap();
    assert!(created.effects.is_empty());
}

#[test]
fn toggle_twice_restores_original_state() {
    let mut store = empty_store();
    let id = store.add("laundry", None).unwrap().value.id;

    assert_eq!(store.toggle_completion(id).value, Some(true));
    assert!(persisted(&store)[0].is_completed);
    assert_eq!(store.toggle_completion(id).value, Some(false));
    assert!(!store.get(id).unwrap().is_completed);
    assert!(!persisted(&store)[0].is_completed);
}

#[test]
fn toggle_unknown_id_is_noop() {
    let mut store = empty_store();
    store.add("laundry", None).unwrap();
    let saves_before = store.storage().save_count();

    let outcome = store.toggle_completion(TaskId::new());
    assert_eq!(outcome.value, None);
    assert!(outcome.effects.is_empty());
    assert_eq!(store.storage().save_count(), saves_before);
}

#[test]
fn update_unknown_id_is_not_found() {
    let mut store = empty_store();
    let id = TaskId::new();
    let err = store
        .update(id, TaskPatch::new().with_title("anything"))
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound(id));
}

#[test]
fn update_rejects_blank_title_and_keeps_task() {
    let mut store = empty_store();
    let id = store.add("original", None).unwrap().value.id;

    let err = store
        .update(id, TaskPatch::new().with_title("  "))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput(_)));
    assert_eq!(store.get(id).unwrap().title, "original");
}

#[test]
fn update_title_only_keeps_due_date_and_skips_reminder_for_undated_task() {
    let mut store = empty_store();
    let id = store.add("draft", None).unwrap().value.id;

    let updated = store
        .update(id, TaskPatch::new().with_title(" final "))
        .unwrap();
    assert_eq!(updated.value.title, "final");
    assert_eq!(updated.value.due_date, None);
    assert!(updated.effects.is_empty());
    assert_eq!(persisted(&store)[0].title, "final");
}

#[test]
fn update_due_date_reschedules_reminder() {
    let mut store = empty_store();
    let first_due = Utc::now() + Duration::hours(1);
    let id = store.add("dentist", Some(first_due)).unwrap().value.id;

    let new_due = first_due + Duration::days(1);
    let updated = store
        .update(id, TaskPatch::new().with_due_date(new_due))
        .unwrap();
    assert_eq!(updated.value.due_date, Some(new_due));
    assert_eq!(
        updated.effects,
        vec![ReminderEffect::Schedule {
            id,
            title: "dentist".to_string(),
            fire_at: new_due,
        }]
    );
}

#[test]
fn update_clearing_or_backdating_due_date_cancels_reminder() {
    let mut store = empty_store();
    let id = store
        .add("dentist", Some(Utc::now() + Duration::hours(1)))
        .unwrap()
        .value
        .id;

    let cleared = store.update(id, TaskPatch::new().clear_due_date()).unwrap();
    assert_eq!(cleared.value.due_date, None);
    assert_eq!(cleared.effects, vec![ReminderEffect::cancel(id)]);

    let backdated = store
        .update(
            id,
            TaskPatch::new().with_due_date(Utc::now() - Duration::hours(2)),
        )
        .unwrap();
    assert_eq!(backdated.effects, vec![ReminderEffect::cancel(id)]);
}

#[test]
fn update_title_of_pending_reminder_refreshes_it() {
    let mut store = empty_store();
    let due = Utc::now() + Duration::hours(3);
    let id = store.add("old title", Some(due)).unwrap().value.id;

    let updated = store
        .update(id, TaskPatch::new().with_title("new title"))
        .unwrap();
    assert_eq!(
        updated.effects,
        vec![ReminderEffect::Schedule {
            id,
            title: "new title".to_string(),
            fire_at: due,
        }]
    );
}

#[test]
fn update_with_unchanged_fields_emits_nothing() {
    let mut store = empty_store();
    let due = Utc::now() + Duration::hours(3);
    let id = store.add("same", Some(due)).unwrap().value.id;

    let updated = store
        .update(id, TaskPatch::new().with_title("same").with_due_date(due))
        .unwrap();
    assert!(updated.effects.is_empty());
}

#[test]
fn delete_is_idempotent() {
    let mut store = empty_store();
    let id = store.add("temporary", None).unwrap().value.id;
    store.add("stays", None).unwrap();

    let first = store.delete(id);
    assert_eq!(first.value.unwrap().title, "temporary");
    assert_eq!(first.effects, vec![ReminderEffect::cancel(id)]);

    let second = store.delete(id);
    assert!(second.value.is_none());
    assert!(second.effects.is_empty());

    assert_eq!(store.len(), 1);
    assert_eq!(persisted(&store).len(), 1);
}

#[test]
fn delete_at_offsets_uses_display_rows() {
    let mut store = empty_store();
    let soon = Utc::now() + Duration::hours(1);
    store.add("undated", None).unwrap();
    let dated = store.add("dated", Some(soon)).unwrap().value.id;

    // Row 0 is the dated task even though it was inserted second.
    let removed = store.delete_at_offsets(&[0, 0, 7]);
    assert_eq!(removed.value.len(), 1);
    assert_eq!(removed.value[0].id, dated);
    assert_eq!(removed.effects, vec![ReminderEffect::cancel(dated)]);
    assert_eq!(titles(&store), vec!["undated"]);
    assert_eq!(persisted(&store).len(), 1);
}

#[test]
fn delete_at_offsets_out_of_range_is_noop() {
    let mut store = empty_store();
    store.add("only", None).unwrap();
    let saves_before = store.storage().save_count();

    let removed = store.delete_at_offsets(&[3]);
    assert!(removed.value.is_empty());
    assert_eq!(store.storage().save_count(), saves_before);
}

#[test]
fn clear_all_empties_store_and_cancels_dated_reminders() {
    let mut store = empty_store();
    let now = Utc::now();
    let mut dated = Vec::new();
    for (title, due) in [
        ("one", None),
        ("two", Some(now + Duration::hours(1))),
        ("three", None),
        ("four", Some(now + Duration::hours(2))),
        ("five", Some(now - Duration::hours(2))),
    ] {
        let created = store.add(title, due).unwrap();
        if due.is_some() {
            dated.push(created.value.id);
        }
    }

    let cleared = store.clear_all();
    assert_eq!(cleared.value, 5);
    assert!(store.is_empty());
    assert!(persisted(&store).is_empty());
    assert_eq!(cleared.effects.len(), 3);
    assert!(cleared.effects.iter().all(ReminderEffect::is_cancel));
    let cancelled = cleared
        .effects
        .iter()
        .map(ReminderEffect::task_id)
        .collect::<Vec<_>>();
    assert_eq!(cancelled, dated);
}

#[test]
fn ordered_view_puts_dated_tasks_first() {
    let mut store = empty_store();
    store.add("Buy milk", None).unwrap();
    store
        .add("Call Bob", Some(Utc::now() + Duration::hours(1)))
        .unwrap();

    assert_eq!(titles(&store), vec!["Call Bob", "Buy milk"]);
    // Insertion order is untouched.
    assert_eq!(store.tasks()[0].title, "Buy milk");
}

#[test]
fn ordered_view_is_stable_for_equal_keys() {
    let mut store = empty_store();
    let due = Utc::now() + Duration::days(1);
    for title in ["a", "b", "c"] {
        store.add(title, None).unwrap();
    }
    for title in ["x", "y"] {
        store.add(title, Some(due)).unwrap();
    }

    assert_eq!(titles(&store), vec!["x", "y", "a", "b", "c"]);
}

#[test]
fn overdue_follows_due_date_updates() {
    let mut store = empty_store();
    let id = store
        .add("report", Some(Utc::now() - Duration::hours(1)))
        .unwrap()
        .value
        .id;
    assert!(store.is_overdue(store.get(id).unwrap()));

    store
        .update(
            id,
            TaskPatch::new().with_due_date(Utc::now() + Duration::hours(1)),
        )
        .unwrap();
    assert!(!store.is_overdue(store.get(id).unwrap()));

    let undated = store.add("someday", None).unwrap().value;
    assert!(!store.is_overdue(&undated));
}

/// Clock whose time only moves when the test advances it.
#[derive(Clone)]
struct SteppedClock(Arc<AtomicI64>);

impl SteppedClock {
    fn at(instant: DateTime<Utc>) -> Self {
        Self(Arc::new(AtomicI64::new(instant.timestamp_millis())))
    }

    fn advance(&self, by: Duration) {
        self.0.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for SteppedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let millis = self.0.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis).unwrap()
    }
}

#[test]
fn overdue_flips_only_after_clock_passes_due_date() {
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let clock = SteppedClock::at(t0);
    let mut store = TaskStore::open(MemoryTaskStorage::new(), clock.clone());

    let created = store
        .add("standup", Some(t0 + Duration::minutes(1)))
        .unwrap();
    assert_eq!(created.effects.len(), 1);
    let id = created.value.id;
    assert!(!store.is_overdue(store.get(id).unwrap()));

    clock.advance(Duration::minutes(1));
    assert_eq!(store.now(), t0 + Duration::minutes(1));
    assert!(!store.is_overdue(store.get(id).unwrap()));

    clock.advance(Duration::minutes(1));
    assert!(store.is_overdue(store.get(id).unwrap()));
}

#[test]
fn add_after_due_date_on_injected_clock_schedules_nothing() {
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let clock = SteppedClock::at(t0);
    let mut store = TaskStore::open(MemoryTaskStorage::new(), clock.clone());

    clock.advance(Duration::hours(2));
    let created = store
        .add("missed call", Some(t0 + Duration::hours(1)))
        .unwrap();
    assert!(created.effects.is_empty());
    assert!(store.is_overdue(&created.value));
}
