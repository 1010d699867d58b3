use activetask::{
    ActiveTask, ArchiveKey, Clock, ManualClock, MemoryBackend, TaskController, TaskError,
    TaskStore, Transition,
};
use chrono::NaiveDate;
use proptest::prelude::*;

// 2023-11-14T22:13:20Z
const T0: i64 = 1_700_000_000_000;

fn controller() -> (TaskController<MemoryBackend, ManualClock>, ManualClock) {
    let clock = ManualClock::new(T0);
    let controller = TaskController::new(TaskStore::new(MemoryBackend::new()), clock.clone());
    (controller, clock)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()
}

#[test]
fn starting_with_no_current_task_installs_it() {
    let (mut ctl, _clock) = controller();
    assert_eq!(ctl.start_or_switch("write-report").unwrap(), Transition::Started);

    let current = ctl.current_task().unwrap().expect("current task");
    assert_eq!(current.name, "write-report");
    assert_eq!(current.started, T0);
    assert_eq!(current.last_checkin, T0);
    assert!(current.id.is_none());
}

#[test]
fn switching_archives_the_previous_task_with_its_time() {
    let (mut ctl, clock) = controller();
    ctl.start_or_switch("write-report").unwrap();

    clock.advance(60_000);
    assert_eq!(ctl.still_working().unwrap(), Transition::CheckedIn);

    let transition = ctl.start_or_switch("email").unwrap();
    let key = ArchiveKey::new(day(), 1);
    assert_eq!(transition, Transition::Switched { archived: key });

    let archived = ctl.store().read_day(day()).unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].name, "write-report");
    assert_eq!(archived[0].task_length, 60_000);
    assert_eq!(archived[0].time_distracted, 0);
    assert_eq!(archived[0].id.as_deref(), Some("2023-11-14->0001"));

    let current = ctl.current_task().unwrap().expect("current task");
    assert_eq!(current.name, "email");
    assert_eq!(current.started, T0 + 60_000);
}

#[test]
fn starting_the_same_name_checks_in() {
    let (mut ctl, clock) = controller();
    ctl.start_or_switch("write-report").unwrap();
    clock.advance(5_000);

    assert_eq!(ctl.start_or_switch("write-report").unwrap(), Transition::CheckedIn);
    let current = ctl.current_task().unwrap().unwrap();
    assert_eq!(current.task_length, 5_000);
    assert_eq!(current.started, T0);
    assert_eq!(ctl.store().backend().archived_len(), 0);
}

#[test]
fn complete_on_switch_closes_the_open_span() {
    let (mut ctl, clock) = controller();
    ctl.start_or_switch("a").unwrap();
    clock.advance(7_000);
    ctl.start_or_switch("b").unwrap();

    let archived = ctl.store().read_day(day()).unwrap();
    assert_eq!(archived[0].task_length, 7_000);
}

#[test]
fn check_in_after_distraction_counts_the_gap_as_distracted() {
    let (mut ctl, clock) = controller();
    ctl.start_or_switch("a").unwrap();

    clock.advance(1_000);
    assert_eq!(ctl.distracted().unwrap(), Transition::MarkedDistracted);
    clock.advance(9_000);
    ctl.still_working().unwrap();

    let current = ctl.current_task().unwrap().unwrap();
    assert_eq!(current.time_distracted, 10_000);
    assert_eq!(current.task_length, 0);
    assert!(!current.distracted);
}

#[test]
fn actions_without_a_current_task_are_no_ops() {
    let (mut ctl, _clock) = controller();
    assert_eq!(ctl.still_working().unwrap(), Transition::NoCurrentTask);
    assert_eq!(ctl.distracted().unwrap(), Transition::NoCurrentTask);
    assert!(ctl.current_task().unwrap().is_none());
}

#[test]
fn sequence_numbers_increase_within_a_day_and_restart_the_next() {
    let (mut ctl, clock) = controller();
    for name in ["a", "b", "c", "d"] {
        ctl.start_or_switch(name).unwrap();
        clock.advance(1_000);
    }
    let ids: Vec<String> = ctl
        .store()
        .read_day(day())
        .unwrap()
        .into_iter()
        .filter_map(|t| t.id)
        .collect();
    assert_eq!(ids, ["2023-11-14->0001", "2023-11-14->0002", "2023-11-14->0003"]);

    clock.advance(24 * 3_600_000);
    let transition = ctl.start_or_switch("e").unwrap();
    let next_day = day().succ_opt().unwrap();
    assert_eq!(
        transition,
        Transition::Switched {
            archived: ArchiveKey::new(next_day, 1)
        }
    );
}

#[test]
fn today_lists_archive_then_current() {
    let (mut ctl, clock) = controller();
    ctl.start_or_switch("a").unwrap();
    clock.advance(1_000);
    ctl.start_or_switch("b").unwrap();

    let names: Vec<String> = ctl.today().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn archiving_an_archived_task_is_rejected() {
    let (mut ctl, clock) = controller();
    let mut task = ActiveTask::new("a", T0);
    task.id = Some("2023-11-14->0001".to_string());

    let err = ctl.store_mut().archive(&task, clock.today()).unwrap_err();
    assert!(matches!(err, TaskError::UpdateUnsupported(id) if id == "2023-11-14->0001"));
}

#[test]
fn storage_failure_is_surfaced_and_leaves_state_alone() {
    let (mut ctl, clock) = controller();
    ctl.start_or_switch("a").unwrap();
    clock.advance(1_000);

    ctl.store_mut().backend_mut().set_unavailable(true);
    assert!(matches!(ctl.start_or_switch("b"), Err(TaskError::Storage(_))));
    assert!(matches!(ctl.still_working(), Err(TaskError::Storage(_))));

    ctl.store_mut().backend_mut().set_unavailable(false);
    let current = ctl.current_task().unwrap().unwrap();
    assert_eq!(current.name, "a");
    assert_eq!(current.task_length, 0);
    assert_eq!(ctl.store().backend().archived_len(), 0);
}

#[test]
fn failed_switch_is_retried_without_archiving_twice() {
    let (mut ctl, clock) = controller();
    ctl.start_or_switch("a").unwrap();
    clock.advance(1_000);

    ctl.store_mut().backend_mut().fail_next_saves(1);
    assert!(matches!(ctl.start_or_switch("b"), Err(TaskError::Storage(_))));

    // The slot keeps the archived copy, which no longer counts as current.
    let slot = ctl.store().current_task().unwrap().expect("slot");
    assert_eq!(slot.id.as_deref(), Some("2023-11-14->0001"));
    assert!(ctl.current_task().unwrap().is_none());
    assert_eq!(ctl.still_working().unwrap(), Transition::NoCurrentTask);

    clock.advance(1_000);
    assert_eq!(
        ctl.start_or_switch("b").unwrap(),
        Transition::Switched {
            archived: ArchiveKey::new(day(), 1)
        }
    );

    let archived = ctl.store().read_day(day()).unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].task_length, 1_000);
    let current = ctl.current_task().unwrap().expect("current task");
    assert_eq!(current.name, "b");
    assert_eq!(current.started, T0 + 2_000);

    let names: Vec<String> = ctl.today().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn retry_after_failed_switch_may_restart_the_archived_name() {
    let (mut ctl, clock) = controller();
    ctl.start_or_switch("a").unwrap();
    clock.advance(1_000);
    ctl.store_mut().backend_mut().fail_next_saves(1);
    assert!(ctl.start_or_switch("b").is_err());

    assert!(matches!(ctl.start_or_switch("a").unwrap(), Transition::Switched { .. }));
    let current = ctl.current_task().unwrap().expect("current task");
    assert!(current.id.is_none());
    assert_eq!(ctl.store().backend().archived_len(), 1);
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Working(i64),
    Distracted(i64),
}

fn arb_actions() -> impl Strategy<Value = Vec<Action>> {
    proptest::collection::vec(
        prop_oneof![
            (0i64..100_000).prop_map(Action::Working),
            (0i64..100_000).prop_map(Action::Distracted),
        ],
        0..40,
    )
}

proptest! {
    #[test]
    fn every_interval_is_counted_exactly_once(actions in arb_actions()) {
        let mut task = ActiveTask::new("p", T0);
        let mut now = T0;
        for action in actions {
            let before = (task.task_length, task.time_distracted);
            match action {
                Action::Working(dt) => {
                    now += dt;
                    task.still_working(now);
                }
                Action::Distracted(dt) => {
                    now += dt;
                    task.mark_distracted(now);
                }
            }
            prop_assert!(task.task_length >= before.0);
            prop_assert!(task.time_distracted >= before.1);
            prop_assert_eq!(task.last_checkin, now);
        }
        prop_assert_eq!(task.task_length + task.time_distracted, now - T0);
    }
}
