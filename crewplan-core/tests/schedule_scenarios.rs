use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use crewplan_core::{
    calculate_schedule, parse_duration_to_hours, BlockStatus, CompanyConfig, Employee, Priority,
    Task, TaskStatus, TimeBlock, WorkSession,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
}

fn config() -> CompanyConfig {
    CompanyConfig::new(10, 19)
}

fn devs() -> Vec<Employee> {
    vec![Employee::new("d1", "Asha"), Employee::new("d2", "Ravi")]
}

fn span(b: &TimeBlock) -> (f64, f64) {
    (b.start_time, b.end_time)
}

#[test]
fn higher_priority_wins_the_tie_at_day_start() {
    let tasks = vec![
        Task::new("T1", "feature")
            .assigned("d1")
            .with_priority(Priority::P1)
            .with_duration(4.0)
            .with_created_at(at(10, 0)),
        Task::new("T2", "hotfix")
            .assigned("d1")
            .with_priority(Priority::P0)
            .with_duration(2.0)
            .with_created_at(at(10, 0)),
    ];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(9, 0)).unwrap();
    let blocks = &schedule["d1"];
    assert_eq!(blocks.len(), 2);

    assert_eq!(blocks[0].task_id, "T2");
    assert_eq!(span(&blocks[0]), (10.0, 12.0));
    assert_eq!(blocks[1].task_id, "T1");
    assert_eq!(span(&blocks[1]), (12.0, 16.0));
    assert!(blocks.iter().all(|b| b.date == today()));
    assert!(blocks.iter().all(|b| b.status == BlockStatus::Planned && !b.is_session));
}

#[test]
fn done_task_without_sessions_is_backfilled_from_completion() {
    let tasks = vec![Task::new("T3", "report")
        .assigned("d1")
        .with_status(TaskStatus::Done)
        .with_duration(3.0)
        .with_completed_at(at(15, 0))];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(16, 0)).unwrap();
    let blocks = &schedule["d1"];
    assert_eq!(blocks.len(), 1);
    assert_eq!(span(&blocks[0]), (12.0, 15.0));
    assert_eq!(blocks[0].date, today());
    assert_eq!(blocks[0].status, BlockStatus::Completed);
}

#[test]
fn hours_minutes_duration_parses() {
    assert_eq!(parse_duration_to_hours("1:30"), 1.5);
}

#[test]
fn developer_without_tasks_gets_an_empty_list() {
    let schedule = calculate_schedule(&[], &devs(), &config(), today(), at(9, 0)).unwrap();
    assert_eq!(schedule["d2"], Vec::<TimeBlock>::new());
}

#[test]
fn invalid_config_is_the_only_error() {
    let bad = CompanyConfig::new(19, 10);
    assert!(calculate_schedule(&[], &devs(), &bad, today(), at(9, 0)).is_err());
}

#[test]
fn repeated_runs_are_identical() {
    let tasks = vec![
        Task::new("a", "a")
            .assigned("d1")
            .with_status(TaskStatus::InProgress)
            .with_duration(6.0)
            .with_assigned_date(at(9, 0))
            .with_session(WorkSession::new(at(10, 0), Some(at(11, 30))))
            .with_session(WorkSession::open(at(13, 0))),
        Task::new("b", "b")
            .assigned("d1")
            .with_priority(Priority::P0)
            .with_duration(12.5)
            .with_created_at(at(8, 0)),
        Task::new("c", "c")
            .assigned("d2")
            .with_status(TaskStatus::Done)
            .with_completed_at(at(18, 0)),
    ];

    let first = calculate_schedule(&tasks, &devs(), &config(), today(), at(14, 0)).unwrap();
    let second = calculate_schedule(&tasks, &devs(), &config(), today(), at(14, 0)).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn session_blocks_never_overlap_for_clean_history() {
    let tasks = vec![
        Task::new("a", "a")
            .assigned("d1")
            .with_status(TaskStatus::Done)
            .with_session(WorkSession::new(at(10, 0), Some(at(11, 0))))
            .with_session(WorkSession::new(at(14, 0), Some(at(15, 0)))),
        Task::new("b", "b")
            .assigned("d1")
            .with_status(TaskStatus::InProgress)
            .with_duration(4.0)
            .with_assigned_date(at(9, 0))
            .with_session(WorkSession::new(at(11, 0), Some(at(12, 0))))
            .with_session(WorkSession::open(at(15, 0))),
        Task::new("c", "c")
            .assigned("d1")
            .with_status(TaskStatus::Todo)
            .with_duration(2.0)
            .with_session(WorkSession::new(at(12, 30), Some(at(13, 30)))),
    ];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(16, 0)).unwrap();
    let sessions: Vec<&TimeBlock> = schedule["d1"].iter().filter(|b| b.is_session).collect();
    assert!(sessions.len() >= 5);
    for (i, a) in sessions.iter().enumerate() {
        for b in &sessions[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }
}

#[test]
fn every_done_task_shows_completed_time() {
    let tasks = vec![
        Task::new("bare", "no history")
            .assigned("d1")
            .with_status(TaskStatus::Done),
        Task::new("logged", "with history")
            .assigned("d1")
            .with_status(TaskStatus::Done)
            .with_session(WorkSession::new(at(10, 0), Some(at(11, 0)))),
        Task::new("broken", "session ends before it starts")
            .assigned("d1")
            .with_status(TaskStatus::Done)
            .with_completed_at(at(17, 0))
            .with_session(WorkSession::new(at(12, 0), Some(at(11, 0)))),
    ];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(18, 0)).unwrap();
    for id in ["bare", "logged", "broken"] {
        assert!(
            schedule["d1"]
                .iter()
                .any(|b| b.task_id == id && b.status == BlockStatus::Completed),
            "no completed block for {id}"
        );
    }
}

#[test]
fn done_task_is_completed_despite_stale_session_hint() {
    let tasks = vec![Task::new("T4", "shipped")
        .assigned("d1")
        .with_status(TaskStatus::Done)
        .with_session(WorkSession::new(at(10, 0), Some(at(12, 0))).with_status("in-progress"))];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(16, 0)).unwrap();
    let blocks = &schedule["d1"];
    assert_eq!(blocks.len(), 1);
    assert_eq!(span(&blocks[0]), (10.0, 12.0));
    assert_eq!(blocks[0].status, BlockStatus::Completed);
}

#[test]
fn huge_time_spent_on_a_done_task_does_not_panic() {
    let tasks = vec![
        Task::new("big", "imported with a bogus effort")
            .assigned("d1")
            .with_status(TaskStatus::Done)
            .with_time_spent(1e10)
            .with_completed_at(at(16, 0)),
        Task::new("inf", "infinite estimate")
            .assigned("d2")
            .with_status(TaskStatus::Done)
            .with_duration(f64::INFINITY)
            .with_completed_at(at(16, 0)),
    ];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(17, 0)).unwrap();
    assert!(schedule["d1"].iter().any(|b| b.status == BlockStatus::Completed));
    // Non-finite effort falls back to the one-hour default.
    assert_eq!(schedule["d2"].len(), 1);
    assert_eq!(span(&schedule["d2"][0]), (15.0, 16.0));
}

#[test]
fn second_active_task_is_queued_behind_the_first() {
    let tasks = vec![
        Task::new("A", "picked up first")
            .assigned("d1")
            .with_status(TaskStatus::InProgress)
            .with_duration(4.0)
            .with_assigned_date(at(9, 0))
            .with_session(WorkSession::open(at(11, 0))),
        Task::new("B", "picked up second")
            .assigned("d1")
            .with_status(TaskStatus::InProgress)
            .with_duration(2.0)
            .with_assigned_date(at(12, 0))
            .with_session(WorkSession::open(at(13, 0))),
    ];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(14, 0)).unwrap();
    let blocks = &schedule["d1"];

    // B's open session is suppressed.
    assert!(!blocks.iter().any(|b| b.task_id == "B" && b.is_session));

    // A: session 11-14 plus a 1h tail merged into it.
    let a: Vec<&TimeBlock> = blocks.iter().filter(|b| b.task_id == "A").collect();
    assert_eq!(a.len(), 1);
    assert_eq!(span(a[0]), (11.0, 15.0));

    let a_end = a[0].end_time;
    let b: Vec<&TimeBlock> = blocks.iter().filter(|b| b.task_id == "B").collect();
    assert_eq!(b.len(), 1);
    assert!(b[0].start_time >= a_end);
    assert_eq!(span(b[0]), (15.0, 17.0));
    assert_eq!(b[0].status, BlockStatus::Planned);
}

#[test]
fn forward_simulation_waits_for_the_started_chain() {
    let tasks = vec![
        Task::new("started", "started")
            .assigned("d1")
            .with_status(TaskStatus::InProgress)
            .with_duration(3.0)
            .with_assigned_date(at(9, 0))
            .with_session(WorkSession::open(at(10, 0))),
        Task::new("queued", "queued")
            .assigned("d1")
            .with_priority(Priority::P0)
            .with_duration(2.0)
            .with_created_at(at(8, 0)),
    ];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(11, 0)).unwrap();
    let blocks = &schedule["d1"];
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].task_id, "started");
    assert_eq!(span(&blocks[0]), (10.0, 13.0));
    assert_eq!(blocks[1].task_id, "queued");
    assert_eq!(span(&blocks[1]), (13.0, 15.0));
}

#[test]
fn backlog_overflows_across_days() {
    let tasks = vec![Task::new("big", "big")
        .assigned("d1")
        .with_duration(20.0)
        .with_created_at(at(8, 0))];

    let schedule = calculate_schedule(&tasks, &devs(), &config(), today(), at(9, 0)).unwrap();
    let blocks = &schedule["d1"];
    assert_eq!(blocks.len(), 3);
    assert_eq!(span(&blocks[0]), (10.0, 19.0));
    assert_eq!(span(&blocks[1]), (10.0, 19.0));
    assert_eq!(span(&blocks[2]), (10.0, 12.0));
    let dates: Vec<NaiveDate> = blocks.iter().map(|b| b.date).collect();
    assert_eq!(
        dates,
        vec![
            today(),
            NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
        ]
    );
}

#[test]
fn local_calendar_drives_hours_and_dates() {
    // Sessions are UTC; 05:30 UTC is 11:00 in Kolkata.
    let cfg = CompanyConfig::new(10, 19).with_timezone(chrono_tz::Asia::Kolkata);
    let tasks = vec![Task::new("t", "t")
        .assigned("d1")
        .with_status(TaskStatus::Done)
        .with_session(WorkSession::new(at(5, 30), Some(at(7, 0))))];

    let schedule = calculate_schedule(&tasks, &devs(), &cfg, today(), at(9, 0)).unwrap();
    let blocks = &schedule["d1"];
    assert_eq!(blocks.len(), 1);
    assert_eq!(span(&blocks[0]), (11.0, 12.5));
}
