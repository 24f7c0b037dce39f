use rusqlite::Connection;
use serde_json::json;
use trainbook_core::db::open_db_in_memory;
use trainbook_core::model::catalog::TrainingType;
use trainbook_core::model::macro_plan::{CycleKind, CycleUpdate, TimelineRow};
use trainbook_core::model::schedule::{CellRef, EntryDraft, Metric};
use trainbook_core::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use trainbook_core::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use trainbook_core::repo::roster_repo::{RosterRepository, SqliteRosterRepository};
use trainbook_core::repo::schedule_repo::{ScheduleRepository, SqliteScheduleRepository};
use trainbook_core::service::schedule_service::ScheduleService;
use trainbook_core::{Profile, Role, ScheduleError, ServiceError};
use uuid::Uuid;

type Service<'c> = ScheduleService<
    SqliteScheduleRepository<'c>,
    SqliteRosterRepository<'c>,
    SqliteCatalogRepository<'c>,
>;

fn seed_profile(conn: &Connection, role: Role) -> Profile {
    let id = Uuid::new_v4();
    let profile = Profile {
        id,
        email: Some(format!("{id}@example.com")),
        full_name: None,
        role,
        created_at: 1,
        updated_at: 1,
    };
    SqliteProfileRepository::try_new(conn)
        .unwrap()
        .upsert_profile(&profile)
        .unwrap();
    profile
}

fn service(conn: &Connection) -> Service<'_> {
    ScheduleService::new(
        SqliteScheduleRepository::try_new(conn).unwrap(),
        SqliteRosterRepository::try_new(conn).unwrap(),
        SqliteCatalogRepository::try_new(conn).unwrap(),
    )
}

/// Teacher bound to a student, with one type holding one action.
fn setup(conn: &Connection) -> (Profile, Profile, TrainingType) {
    let teacher = seed_profile(conn, Role::Teacher);
    let student = seed_profile(conn, Role::Student);
    SqliteRosterRepository::try_new(conn)
        .unwrap()
        .bind(teacher.id, student.id, 1)
        .unwrap();
    let catalog = SqliteCatalogRepository::try_new(conn).unwrap();
    let kind = catalog.create_type(teacher.id, "Squat", 1).unwrap();
    catalog.add_action(teacher.id, kind.id, "Back squat").unwrap();
    let kind = catalog
        .list_types(teacher.id)
        .unwrap()
        .into_iter()
        .find(|listed| listed.id == kind.id)
        .unwrap();
    (teacher, student, kind)
}

fn draft(kind: &TrainingType) -> EntryDraft {
    EntryDraft {
        entry_id: None,
        type_id: kind.id.to_string(),
        group_label: "A".to_string(),
        action_ids: vec![kind.actions[0].id.to_string()],
    }
}

#[test]
fn opening_a_missing_schedule_persists_the_default() {
    let conn = open_db_in_memory().unwrap();
    let (teacher, student, _) = setup(&conn);

    let schedule = service(&conn).open_schedule(&teacher, student.id).unwrap();
    assert_eq!(schedule.weeks, 4);
    assert_eq!(schedule.days, 5);
    assert_eq!(schedule.day_data[0].title, "DAY1");

    let stored = SqliteScheduleRepository::try_new(&conn)
        .unwrap()
        .load_schedule(teacher.id, student.id)
        .unwrap()
        .expect("default schedule should be saved");
    assert_eq!(stored["weeks"], 4);
    assert_eq!(stored["dayData"].as_array().map(Vec::len), Some(5));
}

#[test]
fn legacy_payloads_are_repaired_and_written_back() {
    let conn = open_db_in_memory().unwrap();
    let (teacher, student, _) = setup(&conn);
    let schedules = SqliteScheduleRepository::try_new(&conn).unwrap();
    schedules
        .save_schedule(
            teacher.id,
            student.id,
            &json!({
                "weeks": 2.5,
                "days": 2,
                "entries": [{ "legacy": true }],
                "dayData": [{ "title": "Old", "entries": ["junk"] }]
            }),
            1,
        )
        .unwrap();

    let schedule = service(&conn).open_schedule(&teacher, student.id).unwrap();
    assert_eq!(schedule.weeks, 2);
    assert_eq!(schedule.days, 2);
    assert_eq!(schedule.day_data.len(), 2);
    assert!(schedule.day_data.iter().all(|day| day.entries.is_empty()));

    let stored = schedules
        .load_schedule(teacher.id, student.id)
        .unwrap()
        .unwrap();
    assert!(stored.get("entries").is_none());
    assert_eq!(stored["weeks"], 2);
}

#[test]
fn unbound_teachers_and_students_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (_, student, _) = setup(&conn);
    let stranger = seed_profile(&conn, Role::Teacher);
    let service = service(&conn);

    let err = service.open_schedule(&stranger, student.id).unwrap_err();
    assert!(matches!(err, ServiceError::NotBound { .. }));
    let err = service.add_week(&student, student.id).unwrap_err();
    assert_eq!(err.code(), "forbidden");
}

#[test]
fn entry_edits_persist_through_the_service() {
    let conn = open_db_in_memory().unwrap();
    let (teacher, student, kind) = setup(&conn);
    let service = service(&conn);

    let (schedule, entry_id) = service
        .upsert_entry(&teacher, student.id, 0, &draft(&kind))
        .unwrap();
    let action_id = schedule.day_data[0].entries[0].actions[0].id.clone();
    let cell = CellRef {
        day_index: 0,
        entry_id: entry_id.clone(),
        action_id,
        week_index: 1,
    };
    service
        .set_metric(&teacher, student.id, &cell, Metric::Sets, "3")
        .unwrap();
    service
        .set_set_done(&teacher, student.id, &cell, 1, true)
        .unwrap();
    let schedule = service
        .set_set_weight(&teacher, student.id, &cell, 1, "100")
        .unwrap();
    let week_value = &schedule.day_data[0].entries[0].actions[0].week_values[1];
    assert_eq!(week_value.sets, "3");
    assert_eq!(week_value.set_log.len(), 3);
    assert!(week_value.set_log[1].done);
    assert_eq!(week_value.set_log[1].weight, "100");

    service.set_weeks(&teacher, student.id, 6).unwrap();
    let reopened = service.open_schedule(&teacher, student.id).unwrap();
    assert_eq!(reopened.day_data[0].entries[0].actions[0].week_values.len(), 6);
    assert_eq!(
        reopened.day_data[0].entries[0].actions[0].week_values[1].set_log.len(),
        3
    );

    let schedule = service
        .remove_entry(&teacher, student.id, 0, &entry_id)
        .unwrap();
    assert!(schedule.day_data[0].entries.is_empty());
}

#[test]
fn failed_edits_leave_storage_untouched() {
    let conn = open_db_in_memory().unwrap();
    let (teacher, student, _) = setup(&conn);
    let service = service(&conn);
    service.open_schedule(&teacher, student.id).unwrap();

    let err = service.set_weeks(&teacher, student.id, 0).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Schedule(ScheduleError::InvalidWeekCount(0))
    ));
    let err = service
        .rename_day(&teacher, student.id, 0, "   ")
        .unwrap_err();
    assert!(matches!(err, ServiceError::Schedule(ScheduleError::BlankDayTitle)));

    let schedule = service.open_schedule(&teacher, student.id).unwrap();
    assert_eq!(schedule.weeks, 4);
    assert_eq!(schedule.day_data[0].title, "DAY1");
}

#[test]
fn catalog_renames_flow_into_open_schedules() {
    let conn = open_db_in_memory().unwrap();
    let (teacher, student, kind) = setup(&conn);
    let service = service(&conn);
    service
        .upsert_entry(&teacher, student.id, 0, &draft(&kind))
        .unwrap();

    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();
    catalog.rename_type(teacher.id, kind.id, "Knee dominant").unwrap();
    catalog
        .rename_action(teacher.id, kind.actions[0].id, "High-bar squat")
        .unwrap();

    let schedule = service.open_schedule(&teacher, student.id).unwrap();
    let entry = &schedule.day_data[0].entries[0];
    assert_eq!(entry.type_name, "Knee dominant");
    assert_eq!(entry.actions[0].action_name, "High-bar squat");
}

#[test]
fn macro_plan_edits_drive_the_timeline() {
    let conn = open_db_in_memory().unwrap();
    let (teacher, student, _) = setup(&conn);
    let service = service(&conn);

    service
        .set_starting_date(&teacher, student.id, "2024-01-01")
        .unwrap();
    service
        .set_macro_cell(&teacher, student.id, TimelineRow::Intensity, 0, "high")
        .unwrap();
    let (schedule, cycle_id) = service
        .add_cycle(&teacher, student.id, CycleKind::Meso)
        .unwrap();
    assert_eq!(schedule.macro_plan.mesocycles.len(), 5);
    let first_meso = schedule.macro_plan.mesocycles[0].id.clone();
    service
        .update_cycle(
            &teacher,
            student.id,
            CycleKind::Meso,
            &first_meso,
            &CycleUpdate {
                name: Some("Accumulation".to_string()),
                weeks: Some(2),
                order: None,
            },
        )
        .unwrap();
    service
        .remove_cycle(&teacher, student.id, CycleKind::Meso, &cycle_id)
        .unwrap();

    let timeline = service.macro_timeline(&teacher, student.id).unwrap();
    assert_eq!(timeline.len(), 53);
    assert_eq!(timeline[0].days[0].to_string(), "2024-01-01");
    assert_eq!(timeline[0].meso_name, "Accumulation");
    assert_eq!(timeline[2].meso_index, 1);

    let err = service
        .set_starting_date(&teacher, student.id, "01/02/2024")
        .unwrap_err();
    assert_eq!(err.code(), "invalid_input");
    let schedule = service.open_schedule(&teacher, student.id).unwrap();
    assert_eq!(schedule.macro_plan.intensity_scale[0], "high");
    assert_eq!(schedule.macro_plan.mesocycles.len(), 4);
}

#[test]
fn unparseable_payloads_are_reported_and_left_in_place() {
    let conn = open_db_in_memory().unwrap();
    let (teacher, student, _) = setup(&conn);
    conn.execute(
        "INSERT INTO schedules (teacher_id, student_id, payload, updated_at)
         VALUES (?1, ?2, 'not json', 1);",
        [teacher.id.to_string(), student.id.to_string()],
    )
    .unwrap();

    let err = service(&conn).open_schedule(&teacher, student.id).unwrap_err();
    assert_eq!(err.code(), "storage_error");
    let err = SqliteScheduleRepository::try_new(&conn)
        .unwrap()
        .load_schedule(teacher.id, student.id)
        .unwrap_err();
    assert!(err.to_string().contains("schedules.payload"));

    let stored: String = conn
        .query_row(
            "SELECT payload FROM schedules WHERE teacher_id = ?1;",
            [teacher.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "not json");
}
