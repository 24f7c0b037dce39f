//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate identifiers and JSON arguments into core types.
//! - Fold every outcome into one response envelope.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures carry a stable `error_code` and a human-readable message.
//! - Payloads are JSON strings produced by core serde shapes.

use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::sync::OnceLock;
use trainbook_core::db::{open_db, DbError};
use trainbook_core::model::macro_plan::{
    CycleKind, CycleUpdate, FocusCategory, TimelineRow, WorkloadField,
};
use trainbook_core::model::profile::parse_role;
use trainbook_core::model::schedule::{CellRef, EntryDraft, Metric};
use trainbook_core::repo::catalog_repo::SqliteCatalogRepository;
use trainbook_core::repo::plan_repo::SqlitePlanRepository;
use trainbook_core::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use trainbook_core::repo::roster_repo::SqliteRosterRepository;
use trainbook_core::repo::schedule_repo::SqliteScheduleRepository;
use trainbook_core::service::account_service::{validate_sign_up, AccountService, SignUpRequest};
use trainbook_core::service::admin_service::AdminService;
use trainbook_core::service::catalog_service::CatalogService;
use trainbook_core::service::plan_service::PlanService;
use trainbook_core::service::roster_service::RosterService;
use trainbook_core::service::schedule_service::ScheduleService;
use trainbook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Access, AuthUser, CoreConfig, DayProgress, Profile, RepoError, Role, ServiceError,
};
use uuid::Uuid;

static CONFIG: OnceLock<CoreConfig> = OnceLock::new();

type SqliteScheduleService<'c> = ScheduleService<
    SqliteScheduleRepository<'c>,
    SqliteRosterRepository<'c>,
    SqliteCatalogRepository<'c>,
>;
type SqlitePlanService<'c> =
    PlanService<SqlitePlanRepository<'c>, SqliteScheduleRepository<'c>, SqliteRosterRepository<'c>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive); an
///   empty value uses `TRAINBOOK_LOG_LEVEL` or the build-mode default.
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = if level.trim().is_empty() {
        config().log_level.to_string()
    } else {
        level
    };
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Response envelope shared by every use-case call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Stable failure code (`forbidden`, `not_found`, `invalid_input`, ...).
    pub error_code: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    /// JSON-encoded result on success.
    pub payload: Option<String>,
}

impl BridgeResponse {
    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            message: message.into(),
            payload: None,
        }
    }
}

#[derive(Debug)]
enum BridgeError {
    InvalidArgument(String),
    UnknownActor(Uuid),
    Service(ServiceError),
}

impl BridgeError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::UnknownActor(_) => "unknown_actor",
            Self::Service(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::InvalidArgument(message) => message.clone(),
            Self::UnknownActor(id) => format!("no profile for session {id}"),
            Self::Service(err) => err.to_string(),
        }
    }
}

impl From<ServiceError> for BridgeError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepoError> for BridgeError {
    fn from(value: RepoError) -> Self {
        Self::Service(value.into())
    }
}

impl From<DbError> for BridgeError {
    fn from(value: DbError) -> Self {
        RepoError::from(value).into()
    }
}

type BridgeResult<T> = Result<T, BridgeError>;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Validates sign-up form input before credentials go to the auth provider.
#[flutter_rust_bridge::frb(sync)]
pub fn account_validate_sign_up(
    email: String,
    password: String,
    confirm_password: String,
    role: String,
) -> BridgeResponse {
    let request = SignUpRequest {
        email,
        password,
        confirm_password,
        role,
    };
    match validate_sign_up(&request) {
        Ok(ticket) => respond(
            "account_validate_sign_up",
            Ok(json!({
                "email": ticket.email,
                "requestedRole": ticket.requested_role,
            })),
        ),
        Err(err) => BridgeResponse::failure("invalid_input", err.to_string()),
    }
}

/// Creates or refreshes the profile of an authenticated identity.
///
/// Payload: `{ profile, mirrorRole, landing }`.
#[flutter_rust_bridge::frb(sync)]
pub fn account_resolve_profile(
    user_id: String,
    email: Option<String>,
    full_name: Option<String>,
    metadata_role: Option<String>,
    requested_role: Option<String>,
) -> BridgeResponse {
    let outcome = (|| -> BridgeResult<serde_json::Value> {
        let user = auth_user(&user_id, email, full_name, metadata_role, requested_role)?;
        let conn = open_db(&config().db_path)?;
        let service = account_service(&conn)?;
        let resolution = service.resolve_profile(&user)?;
        let landing = service.landing_page(&user)?;
        Ok(json!({
            "profile": resolution.profile,
            "mirrorRole": resolution.mirror_role,
            "landing": landing.path(),
        }))
    })();
    respond("account_resolve_profile", outcome)
}

/// Page guard; `user_id = None` means no session.
///
/// The identity fields match `account_resolve_profile`; a session without a
/// stored profile gets one created from them.
///
/// Payload: `{ granted, redirect }` where `redirect` is a page path or null.
#[flutter_rust_bridge::frb(sync)]
pub fn account_require_role(
    user_id: Option<String>,
    email: Option<String>,
    full_name: Option<String>,
    metadata_role: Option<String>,
    requested_role: Option<String>,
    allowed_roles: Vec<String>,
) -> BridgeResponse {
    let outcome = (|| -> BridgeResult<serde_json::Value> {
        let allowed = allowed_roles
            .iter()
            .map(|raw| parse_role_arg(raw))
            .collect::<BridgeResult<Vec<Role>>>()?;
        let user = match user_id.as_deref() {
            Some(raw) => Some(auth_user(raw, email, full_name, metadata_role, requested_role)?),
            None => None,
        };
        let conn = open_db(&config().db_path)?;
        let session = account_service(&conn)?.require_role(user.as_ref(), &allowed)?;
        let redirect = match session.access {
            Access::Granted => None,
            Access::Redirect(page) => Some(page.path()),
        };
        Ok(json!({ "granted": redirect.is_none(), "redirect": redirect }))
    })();
    respond("account_require_role", outcome)
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[flutter_rust_bridge::frb(sync)]
pub fn admin_list_users(actor_id: String, role: String) -> BridgeResponse {
    with_actor("admin_list_users", &actor_id, |conn, actor| {
        let role = parse_role_arg(&role)?;
        Ok(admin_service(conn)?.list_users(actor, role)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn admin_promote_to_teacher(actor_id: String, user_id: String) -> BridgeResponse {
    with_actor("admin_promote_to_teacher", &actor_id, |conn, actor| {
        let user_id = parse_id(&user_id, "user_id")?;
        Ok(admin_service(conn)?.promote_to_teacher(actor, user_id)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn admin_demote_to_student(actor_id: String, user_id: String) -> BridgeResponse {
    with_actor("admin_demote_to_student", &actor_id, |conn, actor| {
        let user_id = parse_id(&user_id, "user_id")?;
        Ok(admin_service(conn)?.demote_to_student(actor, user_id)?)
    })
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[flutter_rust_bridge::frb(sync)]
pub fn catalog_list_types(actor_id: String) -> BridgeResponse {
    with_actor("catalog_list_types", &actor_id, |conn, actor| {
        Ok(catalog_service(conn)?.list_types(actor)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn catalog_create_type(actor_id: String, name: String) -> BridgeResponse {
    with_actor("catalog_create_type", &actor_id, |conn, actor| {
        Ok(catalog_service(conn)?.create_type(actor, &name)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn catalog_rename_type(actor_id: String, type_id: String, name: String) -> BridgeResponse {
    with_actor("catalog_rename_type", &actor_id, |conn, actor| {
        let type_id = parse_id(&type_id, "type_id")?;
        Ok(catalog_service(conn)?.rename_type(actor, type_id, &name)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn catalog_delete_type(actor_id: String, type_id: String) -> BridgeResponse {
    with_actor("catalog_delete_type", &actor_id, |conn, actor| {
        let type_id = parse_id(&type_id, "type_id")?;
        Ok(catalog_service(conn)?.delete_type(actor, type_id)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn catalog_add_action(actor_id: String, type_id: String, name: String) -> BridgeResponse {
    with_actor("catalog_add_action", &actor_id, |conn, actor| {
        let type_id = parse_id(&type_id, "type_id")?;
        Ok(catalog_service(conn)?.add_action(actor, type_id, &name)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn catalog_rename_action(actor_id: String, action_id: String, name: String) -> BridgeResponse {
    with_actor("catalog_rename_action", &actor_id, |conn, actor| {
        let action_id = parse_id(&action_id, "action_id")?;
        Ok(catalog_service(conn)?.rename_action(actor, action_id, &name)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn catalog_delete_action(actor_id: String, action_id: String) -> BridgeResponse {
    with_actor("catalog_delete_action", &actor_id, |conn, actor| {
        let action_id = parse_id(&action_id, "action_id")?;
        Ok(catalog_service(conn)?.delete_action(actor, action_id)?)
    })
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[flutter_rust_bridge::frb(sync)]
pub fn roster_bind_student(actor_id: String, email: String) -> BridgeResponse {
    with_actor("roster_bind_student", &actor_id, |conn, actor| {
        Ok(roster_service(conn)?.bind_student_by_email(actor, &email)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn roster_list_students(actor_id: String) -> BridgeResponse {
    with_actor("roster_list_students", &actor_id, |conn, actor| {
        Ok(roster_service(conn)?.list_students(actor)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn roster_remove_student(actor_id: String, student_id: String) -> BridgeResponse {
    with_actor("roster_remove_student", &actor_id, |conn, actor| {
        let student_id = parse_id(&student_id, "student_id")?;
        Ok(roster_service(conn)?.remove_student(actor, student_id)?)
    })
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Opens (and repairs) one student's schedule. Payload: schedule JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn schedule_open(actor_id: String, student_id: String) -> BridgeResponse {
    with_schedule("schedule_open", &actor_id, &student_id, |service, actor, student| {
        Ok(service.open_schedule(actor, student)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_set_weeks(actor_id: String, student_id: String, weeks: u32) -> BridgeResponse {
    with_schedule("schedule_set_weeks", &actor_id, &student_id, |service, actor, student| {
        Ok(service.set_weeks(actor, student, weeks)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_add_week(actor_id: String, student_id: String) -> BridgeResponse {
    with_schedule("schedule_add_week", &actor_id, &student_id, |service, actor, student| {
        Ok(service.add_week(actor, student)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_set_days(actor_id: String, student_id: String, days: u32) -> BridgeResponse {
    with_schedule("schedule_set_days", &actor_id, &student_id, |service, actor, student| {
        Ok(service.set_days(actor, student, days)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_add_day(actor_id: String, student_id: String) -> BridgeResponse {
    with_schedule("schedule_add_day", &actor_id, &student_id, |service, actor, student| {
        Ok(service.add_day(actor, student)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_rename_day(
    actor_id: String,
    student_id: String,
    day_index: u32,
    title: String,
) -> BridgeResponse {
    with_schedule("schedule_rename_day", &actor_id, &student_id, |service, actor, student| {
        Ok(service.rename_day(actor, student, day_index as usize, &title)?)
    })
}

/// Creates (`entry_id = None`) or edits one entry.
///
/// Payload: `{ schedule, entryId }`.
#[flutter_rust_bridge::frb(sync)]
pub fn schedule_upsert_entry(
    actor_id: String,
    student_id: String,
    day_index: u32,
    entry_id: Option<String>,
    type_id: String,
    group_label: String,
    action_ids: Vec<String>,
) -> BridgeResponse {
    let draft = EntryDraft {
        entry_id,
        type_id,
        group_label,
        action_ids,
    };
    with_schedule("schedule_upsert_entry", &actor_id, &student_id, |service, actor, student| {
        let (schedule, entry_id) =
            service.upsert_entry(actor, student, day_index as usize, &draft)?;
        Ok(json!({ "schedule": schedule, "entryId": entry_id }))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_remove_entry(
    actor_id: String,
    student_id: String,
    day_index: u32,
    entry_id: String,
) -> BridgeResponse {
    with_schedule("schedule_remove_entry", &actor_id, &student_id, |service, actor, student| {
        Ok(service.remove_entry(actor, student, day_index as usize, &entry_id)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_move_entry(
    actor_id: String,
    student_id: String,
    day_index: u32,
    from: u32,
    to: u32,
) -> BridgeResponse {
    with_schedule("schedule_move_entry", &actor_id, &student_id, |service, actor, student| {
        Ok(service.move_entry(actor, student, day_index as usize, from as usize, to as usize)?)
    })
}

/// Writes one metric (`sets|reps|weight|rpe`) of one week cell.
#[flutter_rust_bridge::frb(sync)]
pub fn schedule_set_metric(
    actor_id: String,
    student_id: String,
    day_index: u32,
    entry_id: String,
    action_id: String,
    week_index: u32,
    metric: String,
    value: String,
) -> BridgeResponse {
    let cell = cell_ref(day_index, entry_id, action_id, week_index);
    with_schedule("schedule_set_metric", &actor_id, &student_id, |service, actor, student| {
        let metric = Metric::parse(metric.trim())
            .ok_or_else(|| BridgeError::InvalidArgument(format!("unknown metric `{metric}`")))?;
        Ok(service.set_metric(actor, student, &cell, metric, &value)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_set_set_done(
    actor_id: String,
    student_id: String,
    day_index: u32,
    entry_id: String,
    action_id: String,
    week_index: u32,
    set_index: u32,
    done: bool,
) -> BridgeResponse {
    let cell = cell_ref(day_index, entry_id, action_id, week_index);
    with_schedule("schedule_set_set_done", &actor_id, &student_id, |service, actor, student| {
        Ok(service.set_set_done(actor, student, &cell, set_index as usize, done)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn schedule_set_set_weight(
    actor_id: String,
    student_id: String,
    day_index: u32,
    entry_id: String,
    action_id: String,
    week_index: u32,
    set_index: u32,
    weight: String,
) -> BridgeResponse {
    let cell = cell_ref(day_index, entry_id, action_id, week_index);
    with_schedule("schedule_set_set_weight", &actor_id, &student_id, |service, actor, student| {
        Ok(service.set_set_weight(actor, student, &cell, set_index as usize, &weight)?)
    })
}

// ---------------------------------------------------------------------------
// Macro plan
// ---------------------------------------------------------------------------

#[flutter_rust_bridge::frb(sync)]
pub fn macro_set_summary(
    actor_id: String,
    student_id: String,
    macrocycle_name: String,
    notes: String,
) -> BridgeResponse {
    with_schedule("macro_set_summary", &actor_id, &student_id, |service, actor, student| {
        Ok(service.set_macro_summary(actor, student, &macrocycle_name, &notes)?)
    })
}

/// Sets the plan start date (`YYYY-MM-DD`).
#[flutter_rust_bridge::frb(sync)]
pub fn macro_set_starting_date(
    actor_id: String,
    student_id: String,
    date: String,
) -> BridgeResponse {
    with_schedule("macro_set_starting_date", &actor_id, &student_id, |service, actor, student| {
        Ok(service.set_starting_date(actor, student, &date)?)
    })
}

/// Appends a cycle to `kind` (`macro|meso`). Payload: `{ schedule, cycleId }`.
#[flutter_rust_bridge::frb(sync)]
pub fn macro_add_cycle(actor_id: String, student_id: String, kind: String) -> BridgeResponse {
    with_schedule("macro_add_cycle", &actor_id, &student_id, |service, actor, student| {
        let (schedule, cycle_id) = service.add_cycle(actor, student, parse_cycle_kind(&kind)?)?;
        Ok(json!({ "schedule": schedule, "cycleId": cycle_id }))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn macro_remove_cycle(
    actor_id: String,
    student_id: String,
    kind: String,
    cycle_id: String,
) -> BridgeResponse {
    with_schedule("macro_remove_cycle", &actor_id, &student_id, |service, actor, student| {
        Ok(service.remove_cycle(actor, student, parse_cycle_kind(&kind)?, &cycle_id)?)
    })
}

/// Partial cycle update; `order` is 1-based.
#[flutter_rust_bridge::frb(sync)]
pub fn macro_update_cycle(
    actor_id: String,
    student_id: String,
    kind: String,
    cycle_id: String,
    name: Option<String>,
    weeks: Option<u32>,
    order: Option<u32>,
) -> BridgeResponse {
    let update = CycleUpdate {
        name,
        weeks,
        order: order.map(|value| value as usize),
    };
    with_schedule("macro_update_cycle", &actor_id, &student_id, |service, actor, student| {
        Ok(service.update_cycle(actor, student, parse_cycle_kind(&kind)?, &cycle_id, &update)?)
    })
}

/// Sets one week cell of a timeline row.
///
/// `row` is one of `strengthPrimary|strengthSecondary|movementPrimary|
/// movementSecondary|movementNotes|esdPrimary|esdSecondary|esdNotes|phase|
/// intensity|volume`, or `matrix:<category>` for a strength matrix row.
#[flutter_rust_bridge::frb(sync)]
pub fn macro_set_cell(
    actor_id: String,
    student_id: String,
    row: String,
    week_index: u32,
    value: String,
) -> BridgeResponse {
    with_schedule("macro_set_cell", &actor_id, &student_id, |service, actor, student| {
        let row = parse_timeline_row(&row)?;
        Ok(service.set_macro_cell(actor, student, row, week_index as usize, &value)?)
    })
}

/// Sets one workload percentage (`performance|loadPlus|load|base|deload`).
#[flutter_rust_bridge::frb(sync)]
pub fn macro_set_workload(
    actor_id: String,
    student_id: String,
    field: String,
    value: String,
) -> BridgeResponse {
    with_schedule("macro_set_workload", &actor_id, &student_id, |service, actor, student| {
        let field = parse_workload_field(&field)?;
        Ok(service.set_workload(actor, student, field, &value)?)
    })
}

/// Dated 53-week timeline. Payload: array of week rows with ISO dates.
#[flutter_rust_bridge::frb(sync)]
pub fn macro_timeline(actor_id: String, student_id: String) -> BridgeResponse {
    with_schedule("macro_timeline", &actor_id, &student_id, |service, actor, student| {
        let weeks = service.macro_timeline(actor, student)?;
        Ok(weeks
            .into_iter()
            .map(|week| {
                json!({
                    "index": week.index,
                    "month": week.month,
                    "days": week.days.iter().map(|day| day.to_string()).collect::<Vec<_>>(),
                    "weekOfYear": week.week_of_year,
                    "microcycle": week.microcycle,
                    "macroName": week.macro_name,
                    "macroIndex": week.macro_index,
                    "mesoName": week.meso_name,
                    "mesoIndex": week.meso_index,
                })
            })
            .collect::<Vec<_>>())
    })
}

// ---------------------------------------------------------------------------
// Weekly plans
// ---------------------------------------------------------------------------

/// Publishes week `week_index` (0-based) to one student.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_publish_week(actor_id: String, student_id: String, week_index: u32) -> BridgeResponse {
    with_actor("plan_publish_week", &actor_id, |conn, actor| {
        let student_id = parse_id(&student_id, "student_id")?;
        Ok(plan_service(conn)?.publish_week(actor, student_id, week_index as usize)?)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_list_assignments(actor_id: String) -> BridgeResponse {
    with_actor("plan_list_assignments", &actor_id, |conn, actor| {
        Ok(plan_service(conn)?.list_assignments(actor)?)
    })
}

/// Latest plan of the calling student. Payload is `null` without one.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_load_latest(actor_id: String) -> BridgeResponse {
    with_actor("plan_load_latest", &actor_id, |conn, actor| {
        Ok(plan_service(conn)?.load_latest_plan(actor)?)
    })
}

/// Submits progress; `progress_json` is an array of
/// `{ dayIndex, note, actions: [{ actionId, rpe, sets }] }`.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_submit_progress(
    actor_id: String,
    assignment_id: String,
    progress_json: String,
) -> BridgeResponse {
    with_actor("plan_submit_progress", &actor_id, |conn, actor| {
        let assignment_id = parse_id(&assignment_id, "assignment_id")?;
        let drafts: Vec<DayProgress> = serde_json::from_str(&progress_json)
            .map_err(|err| BridgeError::InvalidArgument(format!("invalid progress JSON: {err}")))?;
        Ok(plan_service(conn)?.submit_progress(actor, assignment_id, drafts)?)
    })
}

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

fn config() -> &'static CoreConfig {
    CONFIG.get_or_init(CoreConfig::from_env)
}

fn account_service(conn: &Connection) -> BridgeResult<AccountService<SqliteProfileRepository<'_>>> {
    Ok(AccountService::new(
        SqliteProfileRepository::try_new(conn)?,
        &config().admin_email,
    ))
}

fn admin_service(conn: &Connection) -> BridgeResult<AdminService<SqliteProfileRepository<'_>>> {
    Ok(AdminService::new(SqliteProfileRepository::try_new(conn)?))
}

fn catalog_service(conn: &Connection) -> BridgeResult<CatalogService<SqliteCatalogRepository<'_>>> {
    Ok(CatalogService::new(SqliteCatalogRepository::try_new(conn)?))
}

fn roster_service(
    conn: &Connection,
) -> BridgeResult<RosterService<SqliteRosterRepository<'_>, SqliteProfileRepository<'_>>> {
    Ok(RosterService::new(
        SqliteRosterRepository::try_new(conn)?,
        SqliteProfileRepository::try_new(conn)?,
    ))
}

fn schedule_service(conn: &Connection) -> BridgeResult<SqliteScheduleService<'_>> {
    Ok(ScheduleService::new(
        SqliteScheduleRepository::try_new(conn)?,
        SqliteRosterRepository::try_new(conn)?,
        SqliteCatalogRepository::try_new(conn)?,
    ))
}

fn plan_service(conn: &Connection) -> BridgeResult<SqlitePlanService<'_>> {
    Ok(PlanService::new(
        SqlitePlanRepository::try_new(conn)?,
        SqliteScheduleRepository::try_new(conn)?,
        SqliteRosterRepository::try_new(conn)?,
    ))
}

/// Opens the DB, loads the acting profile and runs one use case.
fn with_actor<T: Serialize>(
    op: &'static str,
    actor_id: &str,
    run: impl FnOnce(&Connection, &Profile) -> BridgeResult<T>,
) -> BridgeResponse {
    let outcome = (|| -> BridgeResult<T> {
        let actor_id = parse_id(actor_id, "actor_id")?;
        let conn = open_db(&config().db_path)?;
        let actor = SqliteProfileRepository::try_new(&conn)?
            .get_profile(actor_id)?
            .ok_or(BridgeError::UnknownActor(actor_id))?;
        run(&conn, &actor)
    })();
    respond(op, outcome)
}

fn with_schedule<T: Serialize>(
    op: &'static str,
    actor_id: &str,
    student_id: &str,
    run: impl FnOnce(&SqliteScheduleService<'_>, &Profile, Uuid) -> BridgeResult<T>,
) -> BridgeResponse {
    with_actor(op, actor_id, |conn, actor| {
        let student_id = parse_id(student_id, "student_id")?;
        run(&schedule_service(conn)?, actor, student_id)
    })
}

fn respond<T: Serialize>(op: &'static str, outcome: BridgeResult<T>) -> BridgeResponse {
    let value = match outcome {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "event=ffi_call module=ffi status=error op={op} error_code={}",
                err.code()
            );
            return BridgeResponse::failure(err.code(), err.message());
        }
    };
    match serde_json::to_string(&value) {
        Ok(payload) => {
            info!("event=ffi_call module=ffi status=ok op={op}");
            BridgeResponse {
                ok: true,
                error_code: None,
                message: "ok".to_string(),
                payload: Some(payload),
            }
        }
        Err(err) => BridgeResponse::failure("invalid_payload", err.to_string()),
    }
}

fn parse_id(raw: &str, field: &str) -> BridgeResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| BridgeError::InvalidArgument(format!("{field} must be a UUID, got `{raw}`")))
}

fn parse_role_arg(raw: &str) -> BridgeResult<Role> {
    parse_role(raw).ok_or_else(|| BridgeError::InvalidArgument(format!("unknown role `{raw}`")))
}

fn auth_user(
    user_id: &str,
    email: Option<String>,
    full_name: Option<String>,
    metadata_role: Option<String>,
    requested_role: Option<String>,
) -> BridgeResult<AuthUser> {
    Ok(AuthUser {
        id: parse_id(user_id, "user_id")?,
        email,
        full_name,
        metadata_role: metadata_role.as_deref().and_then(parse_role),
        requested_role: requested_role.as_deref().and_then(parse_role),
    })
}

fn parse_cycle_kind(raw: &str) -> BridgeResult<CycleKind> {
    match raw.trim() {
        "macro" => Ok(CycleKind::Macro),
        "meso" => Ok(CycleKind::Meso),
        other => Err(BridgeError::InvalidArgument(format!(
            "cycle kind must be macro|meso, got `{other}`"
        ))),
    }
}

fn parse_timeline_row(raw: &str) -> BridgeResult<TimelineRow> {
    let raw = raw.trim();
    if let Some(key) = raw.strip_prefix("matrix:") {
        return FocusCategory::ALL
            .into_iter()
            .find(|category| category.key() == key)
            .map(TimelineRow::StrengthMatrix)
            .ok_or_else(|| BridgeError::InvalidArgument(format!("unknown focus category `{key}`")));
    }
    let row = match raw {
        "strengthPrimary" => TimelineRow::StrengthPrimary,
        "strengthSecondary" => TimelineRow::StrengthSecondary,
        "movementPrimary" => TimelineRow::MovementPrimary,
        "movementSecondary" => TimelineRow::MovementSecondary,
        "movementNotes" => TimelineRow::MovementNotes,
        "esdPrimary" => TimelineRow::EsdPrimary,
        "esdSecondary" => TimelineRow::EsdSecondary,
        "esdNotes" => TimelineRow::EsdNotes,
        "phase" => TimelineRow::Phase,
        "intensity" => TimelineRow::Intensity,
        "volume" => TimelineRow::Volume,
        other => {
            return Err(BridgeError::InvalidArgument(format!(
                "unknown timeline row `{other}`"
            )))
        }
    };
    Ok(row)
}

fn parse_workload_field(raw: &str) -> BridgeResult<WorkloadField> {
    match raw.trim() {
        "performance" => Ok(WorkloadField::Performance),
        "loadPlus" => Ok(WorkloadField::LoadPlus),
        "load" => Ok(WorkloadField::Load),
        "base" => Ok(WorkloadField::Base),
        "deload" => Ok(WorkloadField::Deload),
        other => Err(BridgeError::InvalidArgument(format!(
            "unknown workload field `{other}`"
        ))),
    }
}

fn cell_ref(day_index: u32, entry_id: String, action_id: String, week_index: u32) -> CellRef {
    CellRef {
        day_index: day_index as usize,
        entry_id,
        action_id,
        week_index: week_index as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        account_require_role, account_resolve_profile, account_validate_sign_up,
        catalog_add_action, catalog_create_type, core_version, init_logging, macro_set_cell,
        macro_set_workload, parse_timeline_row, ping, plan_load_latest, plan_publish_week,
        plan_submit_progress, roster_bind_student, schedule_open, schedule_set_metric,
        schedule_upsert_entry, BridgeResponse,
    };
    use serde_json::{json, Value};
    use trainbook_core::model::macro_plan::{FocusCategory, TimelineRow};
    use uuid::Uuid;

    fn payload(response: &BridgeResponse) -> Value {
        assert!(response.ok, "{}", response.message);
        serde_json::from_str(response.payload.as_deref().expect("payload present"))
            .expect("payload is JSON")
    }

    fn resolve(role: &str) -> (String, String) {
        let id = Uuid::new_v4().to_string();
        let email = format!("{role}-{id}@example.com");
        let response = account_resolve_profile(
            id.clone(),
            Some(email.clone()),
            None,
            None,
            Some(role.to_string()),
        );
        let body = payload(&response);
        assert_eq!(body["profile"]["role"], role);
        (id, email)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_relative_dir_and_bad_level() {
        assert!(!init_logging("info".to_string(), "tmp/logs".to_string()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/trainbook-logs".to_string()).is_empty());
    }

    #[test]
    fn sign_up_validation_reports_mismatch() {
        let response = account_validate_sign_up(
            "a@example.com".to_string(),
            "one".to_string(),
            "two".to_string(),
            "teacher".to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("invalid_input"));
    }

    #[test]
    fn require_role_redirects_students_away_from_teacher_pages() {
        let (student_id, _) = resolve("student");
        let body = payload(&account_require_role(
            Some(student_id),
            None,
            None,
            None,
            None,
            vec!["teacher".to_string()],
        ));
        assert_eq!(body["granted"], false);
        assert_eq!(body["redirect"], "student.html");

        let anonymous = payload(&account_require_role(
            None,
            None,
            None,
            None,
            None,
            vec!["teacher".to_string()],
        ));
        assert_eq!(anonymous["redirect"], "login.html");
    }

    #[test]
    fn first_guard_call_keeps_requested_teacher_role() {
        let id = Uuid::new_v4().to_string();
        let email = format!("coach-{id}@example.com");
        let body = payload(&account_require_role(
            Some(id.clone()),
            Some(email.clone()),
            None,
            None,
            Some("teacher".to_string()),
            vec!["teacher".to_string()],
        ));
        assert_eq!(body["granted"], true);

        let resolved = payload(&account_resolve_profile(id, Some(email.clone()), None, None, None));
        assert_eq!(resolved["profile"]["role"], "teacher");
        assert_eq!(resolved["profile"]["email"], email.as_str());
        assert_eq!(resolved["landing"], "index.html");
    }

    #[test]
    fn unknown_actor_and_bad_ids_are_reported() {
        let missing = schedule_open(Uuid::new_v4().to_string(), Uuid::new_v4().to_string());
        assert_eq!(missing.error_code.as_deref(), Some("unknown_actor"));
        let malformed = schedule_open("nope".to_string(), Uuid::new_v4().to_string());
        assert_eq!(malformed.error_code.as_deref(), Some("invalid_argument"));
    }

    #[test]
    fn teacher_publishes_and_student_submits_through_bridge() {
        let (teacher_id, _) = resolve("teacher");
        let (student_id, student_email) = resolve("student");

        assert!(roster_bind_student(teacher_id.clone(), student_email).ok);
        let kind = payload(&catalog_create_type(teacher_id.clone(), "Squat".to_string()));
        let type_id = kind["id"].as_str().expect("type id").to_string();
        let action = payload(&catalog_add_action(
            teacher_id.clone(),
            type_id.clone(),
            "Back squat".to_string(),
        ));
        let action_id = action["id"].as_str().expect("action id").to_string();

        let upserted = payload(&schedule_upsert_entry(
            teacher_id.clone(),
            student_id.clone(),
            0,
            None,
            type_id,
            "A".to_string(),
            vec![action_id],
        ));
        let entry_id = upserted["entryId"].as_str().expect("entry id").to_string();
        let entry_action_id = upserted["schedule"]["dayData"][0]["entries"][0]["actions"][0]["id"]
            .as_str()
            .expect("entry action id")
            .to_string();
        let schedule = payload(&schedule_set_metric(
            teacher_id.clone(),
            student_id.clone(),
            0,
            entry_id,
            entry_action_id.clone(),
            0,
            "sets".to_string(),
            "2".to_string(),
        ));
        assert_eq!(
            schedule["dayData"][0]["entries"][0]["actions"][0]["weekValues"][0]["setLog"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );

        let published = payload(&plan_publish_week(teacher_id.clone(), student_id.clone(), 0));
        let assignment_id = published["assignment"]["id"]
            .as_str()
            .expect("assignment id")
            .to_string();

        let latest = payload(&plan_load_latest(student_id.clone()));
        assert_eq!(latest["assignment"]["id"], assignment_id.as_str());
        assert_eq!(latest["plan"]["week_number"], 1);

        let progress = json!([{
            "dayIndex": 0,
            "note": " ok ",
            "actions": [{ "actionId": entry_action_id, "rpe": "8", "sets": [true, false] }]
        }])
        .to_string();
        let stored = payload(&plan_submit_progress(
            student_id.clone(),
            assignment_id,
            progress,
        ));
        assert_eq!(stored["content"][0]["note"], "ok");

        let reopened = payload(&schedule_open(teacher_id, student_id));
        assert_eq!(
            reopened["dayData"][0]["entries"][0]["actions"][0]["weekValues"][0]["studentProgress"]
                ["rpe"],
            "8"
        );
    }

    #[test]
    fn students_cannot_publish() {
        let (student_id, _) = resolve("student");
        let response = plan_publish_week(student_id, Uuid::new_v4().to_string(), 0);
        assert_eq!(response.error_code.as_deref(), Some("forbidden"));
    }

    #[test]
    fn timeline_rows_parse_from_wire_names() {
        assert_eq!(
            parse_timeline_row("matrix:strengthPower").expect("matrix row"),
            TimelineRow::StrengthMatrix(FocusCategory::StrengthPower)
        );
        assert_eq!(
            parse_timeline_row(" esdNotes ").expect("notes row"),
            TimelineRow::EsdNotes
        );
        assert!(parse_timeline_row("matrix:endurance").is_err());
        assert!(parse_timeline_row("tempo").is_err());
    }

    #[test]
    fn macro_cells_and_workload_persist() {
        let (teacher_id, _) = resolve("teacher");
        let (student_id, student_email) = resolve("student");
        payload(&roster_bind_student(teacher_id.clone(), student_email));

        let schedule = payload(&macro_set_cell(
            teacher_id.clone(),
            student_id.clone(),
            "intensity".to_string(),
            3,
            "high".to_string(),
        ));
        assert_eq!(schedule["macroPlan"]["intensityScale"][3], "high");

        let schedule = payload(&macro_set_workload(
            teacher_id.clone(),
            student_id.clone(),
            "deload".to_string(),
            "60".to_string(),
        ));
        assert_eq!(schedule["macroPlan"]["workload"]["deload"], "60");

        let rejected = macro_set_cell(
            teacher_id,
            student_id,
            "phase".to_string(),
            0,
            "Sprint".to_string(),
        );
        assert_eq!(rejected.error_code.as_deref(), Some("invalid_input"));
    }
}
