//! Schedule use-case service.
//!
//! # Responsibility
//! - Load a student's schedule, repairing and persisting legacy payloads.
//! - Apply teacher edits (structure, entries, metrics, set logs, macro plan)
//!   and persist each one.
//!
//! # Invariants
//! - Only `Capability::EditSchedule` holders bound to the student reach
//!   storage.
//! - Every persisted payload is a fully normalized schedule.
//! - Catalog renames are reflected in entry/action names on load.

use super::{ServiceError, ServiceResult};
use crate::access::{require_capability, Capability};
use crate::model::catalog::TrainingType;
use crate::model::macro_plan::{
    compute_timeline, CycleKind, CycleUpdate, TimelineRow, TimelineWeek, WorkloadField,
};
use crate::model::now_epoch_ms;
use crate::model::profile::{Profile, UserId};
use crate::model::schedule::{CellRef, EntryDraft, Metric, Schedule};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::roster_repo::RosterRepository;
use crate::repo::schedule_repo::ScheduleRepository;
use log::{info, warn};
use std::time::Instant;

/// Loads a pair's schedule; a missing or repaired payload reports `true`.
pub(crate) fn load_normalized<S: ScheduleRepository>(
    schedules: &S,
    teacher_id: UserId,
    student_id: UserId,
) -> ServiceResult<(Schedule, bool)> {
    match schedules.load_schedule(teacher_id, student_id)? {
        Some(payload) => Ok(Schedule::from_value(payload)?),
        None => Ok((Schedule::default(), true)),
    }
}

/// Writes a schedule payload with the current timestamp.
pub(crate) fn persist<S: ScheduleRepository>(
    schedules: &S,
    teacher_id: UserId,
    student_id: UserId,
    schedule: &Schedule,
) -> ServiceResult<()> {
    let payload = serde_json::to_value(schedule)?;
    schedules.save_schedule(teacher_id, student_id, &payload, now_epoch_ms())?;
    Ok(())
}

/// Schedule service facade.
pub struct ScheduleService<S, R, C>
where
    S: ScheduleRepository,
    R: RosterRepository,
    C: CatalogRepository,
{
    schedules: S,
    roster: R,
    catalog: C,
}

impl<S, R, C> ScheduleService<S, R, C>
where
    S: ScheduleRepository,
    R: RosterRepository,
    C: CatalogRepository,
{
    pub fn new(schedules: S, roster: R, catalog: C) -> Self {
        Self {
            schedules,
            roster,
            catalog,
        }
    }

    fn authorize(&self, actor: &Profile, student_id: UserId) -> ServiceResult<()> {
        require_capability(actor, Capability::EditSchedule)?;
        if !self.roster.is_bound(actor.id, student_id)? {
            return Err(ServiceError::NotBound {
                teacher_id: actor.id,
                student_id,
            });
        }
        Ok(())
    }

    fn load(
        &self,
        actor: &Profile,
        student_id: UserId,
        catalog: &[TrainingType],
    ) -> ServiceResult<(Schedule, bool)> {
        let (mut schedule, repaired) = load_normalized(&self.schedules, actor.id, student_id)?;
        let renamed = schedule.refresh_catalog_names(catalog);
        Ok((schedule, repaired || renamed))
    }

    /// Opens the schedule for editing; repaired payloads are written back.
    pub fn open_schedule(&self, actor: &Profile, student_id: UserId) -> ServiceResult<Schedule> {
        self.authorize(actor, student_id)?;
        let catalog = self.catalog.list_types(actor.id)?;
        let (schedule, changed) = self.load(actor, student_id, &catalog)?;
        if changed {
            persist(&self.schedules, actor.id, student_id, &schedule)?;
            info!("event=schedule_repair module=schedule status=ok");
        }
        Ok(schedule)
    }

    /// Loads, edits and saves in one step; failed edits persist nothing.
    fn edit<T>(
        &self,
        actor: &Profile,
        student_id: UserId,
        op: &'static str,
        apply: impl FnOnce(&mut Schedule, &[TrainingType]) -> ServiceResult<T>,
    ) -> ServiceResult<(Schedule, T)> {
        let started_at = Instant::now();
        self.authorize(actor, student_id)?;
        let catalog = self.catalog.list_types(actor.id)?;
        let (mut schedule, _) = self.load(actor, student_id, &catalog)?;

        let output = match apply(&mut schedule, &catalog) {
            Ok(output) => output,
            Err(err) => {
                warn!(
                    "event=schedule_edit module=schedule status=rejected op={op} error_code={}",
                    err.code()
                );
                return Err(err);
            }
        };
        persist(&self.schedules, actor.id, student_id, &schedule)?;
        info!(
            "event=schedule_edit module=schedule status=ok op={op} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok((schedule, output))
    }

    pub fn set_weeks(
        &self,
        actor: &Profile,
        student_id: UserId,
        weeks: u32,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_weeks", |schedule, _| {
            Ok(schedule.set_weeks(weeks)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn add_week(&self, actor: &Profile, student_id: UserId) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "add_week", |schedule, _| {
            Ok(schedule.add_week()?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn set_days(
        &self,
        actor: &Profile,
        student_id: UserId,
        days: u32,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_days", |schedule, _| {
            Ok(schedule.set_days(days)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn add_day(&self, actor: &Profile, student_id: UserId) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "add_day", |schedule, _| {
            Ok(schedule.add_day()?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn rename_day(
        &self,
        actor: &Profile,
        student_id: UserId,
        day_index: usize,
        title: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "rename_day", |schedule, _| {
            Ok(schedule.rename_day(day_index, title)?)
        })
        .map(|(schedule, ())| schedule)
    }

    /// Creates or edits one entry; returns the schedule and the entry id.
    pub fn upsert_entry(
        &self,
        actor: &Profile,
        student_id: UserId,
        day_index: usize,
        draft: &EntryDraft,
    ) -> ServiceResult<(Schedule, String)> {
        self.edit(actor, student_id, "upsert_entry", |schedule, catalog| {
            Ok(schedule.upsert_entry(day_index, draft, catalog)?)
        })
    }

    pub fn remove_entry(
        &self,
        actor: &Profile,
        student_id: UserId,
        day_index: usize,
        entry_id: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "remove_entry", |schedule, _| {
            Ok(schedule.remove_entry(day_index, entry_id)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn move_entry(
        &self,
        actor: &Profile,
        student_id: UserId,
        day_index: usize,
        from: usize,
        to: usize,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "move_entry", |schedule, _| {
            Ok(schedule.move_entry(day_index, from, to)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn set_metric(
        &self,
        actor: &Profile,
        student_id: UserId,
        cell: &CellRef,
        metric: Metric,
        value: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_metric", |schedule, _| {
            Ok(schedule.set_metric(cell, metric, value)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn set_set_done(
        &self,
        actor: &Profile,
        student_id: UserId,
        cell: &CellRef,
        set_index: usize,
        done: bool,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_set_done", |schedule, _| {
            Ok(schedule.set_set_done(cell, set_index, done)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn set_set_weight(
        &self,
        actor: &Profile,
        student_id: UserId,
        cell: &CellRef,
        set_index: usize,
        weight: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_set_weight", |schedule, _| {
            Ok(schedule.set_set_weight(cell, set_index, weight)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn set_macro_cell(
        &self,
        actor: &Profile,
        student_id: UserId,
        row: TimelineRow,
        week: usize,
        value: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_macro_cell", |schedule, _| {
            Ok(schedule.macro_plan.set_row_cell(row, week, value)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn set_workload(
        &self,
        actor: &Profile,
        student_id: UserId,
        field: WorkloadField,
        value: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_workload", |schedule, _| {
            schedule.macro_plan.set_workload(field, value);
            Ok(())
        })
        .map(|(schedule, ())| schedule)
    }

    /// Updates the macrocycle title and free-form notes.
    pub fn set_macro_summary(
        &self,
        actor: &Profile,
        student_id: UserId,
        macrocycle_name: &str,
        notes: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_macro_summary", |schedule, _| {
            schedule.macro_plan.macrocycle_name = macrocycle_name.trim().to_string();
            schedule.macro_plan.notes = notes.to_string();
            Ok(())
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn set_starting_date(
        &self,
        actor: &Profile,
        student_id: UserId,
        date: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "set_starting_date", |schedule, _| {
            Ok(schedule.macro_plan.set_starting_date(date)?)
        })
        .map(|(schedule, ())| schedule)
    }

    /// Appends one cycle; returns the schedule and the new cycle id.
    pub fn add_cycle(
        &self,
        actor: &Profile,
        student_id: UserId,
        kind: CycleKind,
    ) -> ServiceResult<(Schedule, String)> {
        self.edit(actor, student_id, "add_cycle", |schedule, _| {
            Ok(schedule.macro_plan.add_cycle(kind))
        })
    }

    pub fn remove_cycle(
        &self,
        actor: &Profile,
        student_id: UserId,
        kind: CycleKind,
        cycle_id: &str,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "remove_cycle", |schedule, _| {
            Ok(schedule.macro_plan.remove_cycle(kind, cycle_id)?)
        })
        .map(|(schedule, ())| schedule)
    }

    pub fn update_cycle(
        &self,
        actor: &Profile,
        student_id: UserId,
        kind: CycleKind,
        cycle_id: &str,
        update: &CycleUpdate,
    ) -> ServiceResult<Schedule> {
        self.edit(actor, student_id, "update_cycle", |schedule, _| {
            Ok(schedule.macro_plan.update_cycle(kind, cycle_id, update)?)
        })
        .map(|(schedule, ())| schedule)
    }

    /// Dated macro timeline of the student's schedule.
    pub fn macro_timeline(
        &self,
        actor: &Profile,
        student_id: UserId,
    ) -> ServiceResult<Vec<TimelineWeek>> {
        let schedule = self.open_schedule(actor, student_id)?;
        Ok(compute_timeline(&schedule.macro_plan))
    }
}
