//! Property tests for the visit state machine.

use std::sync::Arc;

use chrono::{Local, TimeZone, Utc};
use clinic_queue_announce::{AnnouncerConfig, RecordingAnnouncer};
use clinic_queue_core::consultation::ConsultationDraft;
use clinic_queue_core::models::{QueueEntry, QueueStatus};
use clinic_queue_core::queue::{FixedClock, QueueController, QueueStore};
use clinic_queue_core::store::MemoryDocumentStore;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    CallNext,
    RepeatCall,
    TimeIn(usize),
    TimeOut(usize),
    Tick(usize),
    Save(usize),
    Reload,
    FailWrites(bool),
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::CallNext),
        Just(Action::RepeatCall),
        (0..4usize).prop_map(Action::TimeIn),
        (0..4usize).prop_map(Action::TimeOut),
        (0..4usize).prop_map(Action::Tick),
        (0..4usize).prop_map(Action::Save),
        Just(Action::Reload),
        any::<bool>().prop_map(Action::FailWrites),
    ]
}

proptest! {
    /// Whatever the user does, each entry's observed statuses run forward
    /// through Waiting, In Consultation, Completed without going back.
    #[test]
    fn prop_status_never_moves_backwards(actions in prop::collection::vec(action(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let now = Local.with_ymd_and_hms(2024, 6, 14, 10, 0, 0).unwrap();
            let store = Arc::new(MemoryDocumentStore::new());
            let ids: Vec<String> = (1..=4)
                .map(|n| {
                    let entry = QueueEntry::new(format!("E{}", n), n.to_string(), now.with_timezone(&Utc));
                    let id = entry.id.clone();
                    store.insert_queue_entry(entry).unwrap();
                    id
                })
                .collect();

            let queue = Arc::new(QueueStore::new(store.clone(), Arc::new(FixedClock::new(now))));
            queue.load_today().await.unwrap();
            let controller = QueueController::new(
                queue.clone(),
                Arc::new(RecordingAnnouncer::new()),
                AnnouncerConfig::default(),
            );

            let mut last: Vec<QueueStatus> = vec![QueueStatus::Waiting; ids.len()];
            for action in actions {
                let _ = match action {
                    Action::CallNext => controller.call_next().await.map(|_| ()),
                    Action::RepeatCall => controller.repeat_call().await.map(|_| ()),
                    Action::TimeIn(i) => controller.time_in(&ids[i]).await.map(|_| ()),
                    Action::TimeOut(i) => controller.time_out(&ids[i]).await.map(|_| ()),
                    Action::Tick(i) => controller.tick(&ids[i]).await.map(|_| ()),
                    Action::Save(i) => controller.save(&ConsultationDraft::new(ids[i].as_str())).await.map(|_| ()),
                    Action::Reload => queue.load_today().await.map(|_| ()),
                    Action::FailWrites(fail) => {
                        store.set_fail_writes(fail);
                        Ok(())
                    }
                };

                for (i, id) in ids.iter().enumerate() {
                    let mirrored = queue.patient(id).await.unwrap().status();
                    let stored = store.queue_entry(id).unwrap().unwrap().status;
                    assert!(mirrored >= last[i], "status of entry {} moved back", i);
                    assert_eq!(mirrored, stored);
                    last[i] = mirrored;
                }

                if let Some(called) = queue.called().await {
                    assert!(!called.status().is_completed());
                }
            }
        });
    }

    /// Saved consultation data is never replaced.
    #[test]
    fn prop_consultation_written_once(notes in prop::collection::vec("[a-z]{1,12}", 1..6)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let now = Local.with_ymd_and_hms(2024, 6, 14, 10, 0, 0).unwrap();
            let store = Arc::new(MemoryDocumentStore::new());
            let entry = QueueEntry::new("E1".into(), "1".into(), now.with_timezone(&Utc));
            let id = entry.id.clone();
            store.insert_queue_entry(entry).unwrap();

            let queue = Arc::new(QueueStore::new(store.clone(), Arc::new(FixedClock::new(now))));
            queue.load_today().await.unwrap();
            let controller = QueueController::new(
                queue,
                Arc::new(RecordingAnnouncer::new()),
                AnnouncerConfig::default(),
            );

            for note in &notes {
                let mut draft = ConsultationDraft::new(id.as_str());
                draft.notes = note.clone();
                let _ = controller.save(&draft).await;
            }

            let stored = store.queue_entry(&id).unwrap().unwrap();
            assert_eq!(stored.consultation.unwrap().notes, notes[0]);
        });
    }
}
