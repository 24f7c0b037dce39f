use rusqlite::Connection;
use trainbook_core::db::open_db_in_memory;
use trainbook_core::repo::plan_repo::{PlanRepository, SqlitePlanRepository};
use trainbook_core::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use trainbook_core::repo::roster_repo::SqliteRosterRepository;
use trainbook_core::repo::schedule_repo::SqliteScheduleRepository;
use trainbook_core::service::plan_service::PlanService;
use trainbook_core::service::roster_service::RosterService;
use trainbook_core::{Profile, Role, ServiceError};
use uuid::Uuid;

fn seed_profile(conn: &Connection, role: Role, email: &str, full_name: Option<&str>) -> Profile {
    let profile = Profile {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
        full_name: full_name.map(str::to_string),
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

fn roster_service(
    conn: &Connection,
) -> RosterService<SqliteRosterRepository<'_>, SqliteProfileRepository<'_>> {
    RosterService::new(
        SqliteRosterRepository::try_new(conn).unwrap(),
        SqliteProfileRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn bind_by_email_lists_students_oldest_first() {
    let conn = open_db_in_memory().unwrap();
    let teacher = seed_profile(&conn, Role::Teacher, "coach@example.com", None);
    seed_profile(&conn, Role::Student, "ann@example.com", Some("Ann"));
    seed_profile(&conn, Role::Student, "bo@example.com", None);
    let roster = roster_service(&conn);

    let bound = roster
        .bind_student_by_email(&teacher, "  ANN@example.com ")
        .unwrap();
    assert_eq!(bound.profile.display_name(), "Ann");
    roster.bind_student_by_email(&teacher, "bo@example.com").unwrap();

    let students = roster.list_students(&teacher).unwrap();
    assert_eq!(
        students
            .iter()
            .map(|student| student.profile.display_name())
            .collect::<Vec<_>>(),
        vec!["Ann", "bo@example.com"]
    );
}

#[test]
fn bind_reports_each_failure_distinctly() {
    let conn = open_db_in_memory().unwrap();
    let teacher = seed_profile(&conn, Role::Teacher, "coach@example.com", None);
    seed_profile(&conn, Role::Teacher, "peer@example.com", None);
    seed_profile(&conn, Role::Student, "ann@example.com", None);
    let roster = roster_service(&conn);

    assert!(matches!(
        roster.bind_student_by_email(&teacher, "not-an-email").unwrap_err(),
        ServiceError::InvalidEmail(_)
    ));
    assert!(matches!(
        roster
            .bind_student_by_email(&teacher, "nobody@example.com")
            .unwrap_err(),
        ServiceError::StudentNotFound(_)
    ));
    assert!(matches!(
        roster
            .bind_student_by_email(&teacher, "peer@example.com")
            .unwrap_err(),
        ServiceError::NotAStudent(_)
    ));

    roster.bind_student_by_email(&teacher, "ann@example.com").unwrap();
    let err = roster
        .bind_student_by_email(&teacher, "ann@example.com")
        .unwrap_err();
    assert_eq!(err.code(), "conflict");
}

#[test]
fn students_cannot_manage_rosters() {
    let conn = open_db_in_memory().unwrap();
    let student = seed_profile(&conn, Role::Student, "ann@example.com", None);
    let roster = roster_service(&conn);
    assert_eq!(roster.list_students(&student).unwrap_err().code(), "forbidden");
}

#[test]
fn removing_a_student_drops_their_assignments() {
    let conn = open_db_in_memory().unwrap();
    let teacher = seed_profile(&conn, Role::Teacher, "coach@example.com", None);
    let student = seed_profile(&conn, Role::Student, "ann@example.com", None);
    let roster = roster_service(&conn);
    roster.bind_student_by_email(&teacher, "ann@example.com").unwrap();

    let plans = PlanService::new(
        SqlitePlanRepository::try_new(&conn).unwrap(),
        SqliteScheduleRepository::try_new(&conn).unwrap(),
        SqliteRosterRepository::try_new(&conn).unwrap(),
    );
    let published = plans.publish_week(&teacher, student.id, 0).unwrap();

    roster.remove_student(&teacher, student.id).unwrap();
    assert!(roster.list_students(&teacher).unwrap().is_empty());

    let plan_repo = SqlitePlanRepository::try_new(&conn).unwrap();
    assert!(plan_repo
        .get_assignment(published.assignment.id)
        .unwrap()
        .is_none());
    assert!(plans.load_latest_plan(&student).unwrap().is_none());

    let err = roster.remove_student(&teacher, student.id).unwrap_err();
    assert_eq!(err.code(), "not_found");
}
