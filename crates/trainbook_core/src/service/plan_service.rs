//! Weekly plan use-case service.
//!
//! # Responsibility
//! - Publish one schedule week to a student as an immutable plan.
//! - Serve the student's latest plan with any stored progress.
//! - Accept progress submissions and feed them back into the schedule.
//!
//! # Invariants
//! - Publishing requires `Capability::PublishPlan` and a roster binding.
//! - Students only read and submit against their own assignments.
//! - One progress record exists per assignment; resubmission replaces it.
//! - A submission stores progress, status and schedule feedback together
//!   or not at all.

use super::schedule_service::{load_normalized, persist};
use super::{ServiceError, ServiceResult};
use crate::access::{require_capability, Capability};
use crate::model::now_epoch_ms;
use crate::model::profile::{Profile, UserId};
use crate::model::schedule::{Schedule, ScheduleError, StudentFeedback};
use crate::model::weekly_plan::{
    snapshot_week, AssignmentStatus, DayProgress, PlanAssignment, WeeklyPlan, WeeklyProgress,
};
use crate::repo::plan_repo::PlanRepository;
use crate::repo::roster_repo::RosterRepository;
use crate::repo::schedule_repo::ScheduleRepository;
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

/// Newly published plan and its assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedPlan {
    pub plan: WeeklyPlan,
    pub assignment: PlanAssignment,
}

/// What a student sees: the latest assignment, its plan and progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentPlanView {
    pub assignment: PlanAssignment,
    /// `None` when the plan row is gone.
    pub plan: Option<WeeklyPlan>,
    pub progress: Option<WeeklyProgress>,
}

/// Weekly plan service facade.
pub struct PlanService<P, S, R>
where
    P: PlanRepository,
    S: ScheduleRepository,
    R: RosterRepository,
{
    plans: P,
    schedules: S,
    roster: R,
}

impl<P, S, R> PlanService<P, S, R>
where
    P: PlanRepository,
    S: ScheduleRepository,
    R: RosterRepository,
{
    pub fn new(plans: P, schedules: S, roster: R) -> Self {
        Self {
            plans,
            schedules,
            roster,
        }
    }

    /// Snapshots week `week_index` (0-based) and assigns it to the student.
    pub fn publish_week(
        &self,
        actor: &Profile,
        student_id: UserId,
        week_index: usize,
    ) -> ServiceResult<PublishedPlan> {
        require_capability(actor, Capability::PublishPlan)?;
        if !self.roster.is_bound(actor.id, student_id)? {
            return Err(ServiceError::NotBound {
                teacher_id: actor.id,
                student_id,
            });
        }

        let (schedule, repaired) = load_normalized(&self.schedules, actor.id, student_id)?;
        if repaired {
            persist(&self.schedules, actor.id, student_id, &schedule)?;
        }
        let snapshot = snapshot_week(&schedule, week_index)
            .ok_or(ScheduleError::WeekOutOfRange(week_index))?;
        let week_number = u32::try_from(week_index + 1)
            .map_err(|_| ScheduleError::WeekOutOfRange(week_index))?;

        let now = now_epoch_ms();
        let plan = WeeklyPlan {
            id: Uuid::new_v4(),
            teacher_id: actor.id,
            student_id,
            week_number,
            published_at: now,
            snapshot,
        };
        self.plans.insert_plan(&plan)?;
        let assignment = PlanAssignment {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            teacher_id: actor.id,
            student_id,
            status: AssignmentStatus::Assigned,
            created_at: now,
        };
        self.plans.insert_assignment(&assignment)?;

        info!(
            "event=plan_publish module=plan status=ok week_number={} days={}",
            week_number,
            plan.snapshot.days.len()
        );
        Ok(PublishedPlan { plan, assignment })
    }

    /// The actor's most recent assignment, if any.
    pub fn load_latest_plan(&self, actor: &Profile) -> ServiceResult<Option<StudentPlanView>> {
        require_capability(actor, Capability::ViewOwnPlan)?;
        let Some(assignment) = self.plans.latest_assignment_for_student(actor.id)? else {
            return Ok(None);
        };
        let plan = self.plans.get_plan(assignment.plan_id)?;
        let progress = self.plans.get_progress(assignment.id)?;
        Ok(Some(StudentPlanView {
            assignment,
            plan,
            progress,
        }))
    }

    /// Assignments published by the actor, newest first.
    pub fn list_assignments(&self, actor: &Profile) -> ServiceResult<Vec<PlanAssignment>> {
        require_capability(actor, Capability::PublishPlan)?;
        Ok(self.plans.list_assignments_for_teacher(actor.id)?)
    }

    /// Stores the actor's progress for one assignment.
    ///
    /// Marks the assignment submitted and copies RPE and set flags into the
    /// teacher's schedule for the published week.
    pub fn submit_progress(
        &self,
        actor: &Profile,
        assignment_id: Uuid,
        drafts: Vec<DayProgress>,
    ) -> ServiceResult<WeeklyProgress> {
        require_capability(actor, Capability::SubmitProgress)?;
        let not_found = || ServiceError::NotFound {
            entity: "assignment",
            id: assignment_id.to_string(),
        };
        let assignment = self
            .plans
            .get_assignment(assignment_id)?
            .filter(|assignment| assignment.student_id == actor.id)
            .ok_or_else(not_found)?;
        let plan = self
            .plans
            .get_plan(assignment.plan_id)?
            .ok_or_else(|| ServiceError::NotFound {
                entity: "weekly plan",
                id: assignment.plan_id.to_string(),
            })?;

        let content = plan.snapshot.normalize_progress(drafts)?;
        let existing = self.plans.get_progress(assignment.id)?;
        let progress = WeeklyProgress {
            id: existing.map_or_else(Uuid::new_v4, |progress| progress.id),
            assignment_id: assignment.id,
            student_id: actor.id,
            content,
            updated_at: now_epoch_ms(),
        };
        let applied = self.plans.atomically(|| -> ServiceResult<usize> {
            self.plans.upsert_progress(&progress)?;
            self.plans
                .set_assignment_status(assignment.id, AssignmentStatus::Submitted)?;
            self.feed_back(&assignment, &plan, &progress)
        })?;
        info!(
            "event=progress_submit module=plan status=ok days={} feedback_applied={}",
            progress.content.len(),
            applied
        );
        Ok(progress)
    }

    fn feed_back(
        &self,
        assignment: &PlanAssignment,
        plan: &WeeklyPlan,
        progress: &WeeklyProgress,
    ) -> ServiceResult<usize> {
        let Some(payload) = self
            .schedules
            .load_schedule(assignment.teacher_id, assignment.student_id)?
        else {
            warn!("event=progress_feedback module=plan status=skipped reason=schedule_missing");
            return Ok(0);
        };
        let (mut schedule, _) = Schedule::from_value(payload)?;
        let week_index = plan.snapshot.week_index;

        let mut applied = 0;
        for day in &progress.content {
            for action in &day.actions {
                let Some(target) = schedule.find_action_mut(&action.action_id) else {
                    continue;
                };
                let Some(week_value) = target.week_values.get_mut(week_index) else {
                    continue;
                };
                week_value.student_progress = Some(StudentFeedback {
                    rpe: action.rpe.clone(),
                    sets: action.sets.clone(),
                    note: day.note.clone(),
                });
                applied += 1;
            }
        }
        if applied > 0 {
            persist(
                &self.schedules,
                assignment.teacher_id,
                assignment.student_id,
                &schedule,
            )?;
        }
        Ok(applied)
    }
}
