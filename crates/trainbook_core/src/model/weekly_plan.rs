//! Published weekly plans and student progress.
//!
//! # Responsibility
//! - Cut an immutable one-week snapshot out of a schedule.
//! - Define assignment lifecycle and the student progress payload.
//!
//! # Invariants
//! - A snapshot never changes after publication.
//! - `week_number == week_index + 1`.
//! - Progress day indices address snapshot days and are unique.

use super::profile::UserId;
use super::schedule::{Schedule, WeekValue, MAX_SETS};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// One action of a snapshot day with that week's planned values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotAction {
    /// Entry-action id inside the source schedule.
    pub action_id: String,
    pub action_name: String,
    pub week_value: WeekValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub entry_id: String,
    pub type_name: String,
    pub group_label: String,
    pub actions: Vec<SnapshotAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDay {
    pub title: String,
    pub entries: Vec<SnapshotEntry>,
}

impl SnapshotDay {
    fn has_action(&self, action_id: &str) -> bool {
        self.entries
            .iter()
            .flat_map(|entry| entry.actions.iter())
            .any(|action| action.action_id == action_id)
    }
}

/// Frozen copy of one schedule week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySnapshot {
    pub week_index: usize,
    pub days: Vec<SnapshotDay>,
}

/// Extracts week `week_index` from every day of the schedule.
///
/// Returns `None` when the week is outside the schedule.
pub fn snapshot_week(schedule: &Schedule, week_index: usize) -> Option<WeeklySnapshot> {
    if week_index >= schedule.weeks as usize {
        return None;
    }
    let days = schedule
        .day_data
        .iter()
        .map(|day| SnapshotDay {
            title: day.title.clone(),
            entries: day
                .entries
                .iter()
                .map(|entry| SnapshotEntry {
                    entry_id: entry.id.clone(),
                    type_name: entry.type_name.clone(),
                    group_label: entry.group_label.clone(),
                    actions: entry
                        .actions
                        .iter()
                        .map(|action| SnapshotAction {
                            action_id: action.id.clone(),
                            action_name: action.action_name.clone(),
                            week_value: action
                                .week_values
                                .get(week_index)
                                .cloned()
                                .unwrap_or_default(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    Some(WeeklySnapshot { week_index, days })
}

/// Published plan row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub id: Uuid,
    pub teacher_id: UserId,
    pub student_id: UserId,
    /// 1-based week number shown to students.
    pub week_number: u32,
    /// Unix epoch milliseconds.
    pub published_at: i64,
    pub snapshot: WeeklySnapshot,
}

/// Delivery state of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    Submitted,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Submitted => "submitted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assigned" => Some(Self::Assigned),
            "submitted" => Some(Self::Submitted),
            _ => None,
        }
    }
}

/// Delivery of one plan to one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAssignment {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub teacher_id: UserId,
    pub student_id: UserId,
    pub status: AssignmentStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Student-reported result for one snapshot action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionProgress {
    pub action_id: String,
    pub rpe: String,
    pub sets: Vec<bool>,
}

/// Student notes and results for one snapshot day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayProgress {
    pub day_index: usize,
    pub note: String,
    pub actions: Vec<ActionProgress>,
}

/// Stored progress for one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: UserId,
    pub content: Vec<DayProgress>,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Validation failure for submitted progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    DayOutOfRange(usize),
    DuplicateDay(usize),
    UnknownAction { day_index: usize, action_id: String },
}

impl Display for ProgressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DayOutOfRange(index) => write!(f, "plan day out of range: {index}"),
            Self::DuplicateDay(index) => write!(f, "plan day submitted twice: {index}"),
            Self::UnknownAction {
                day_index,
                action_id,
            } => write!(f, "action {action_id} is not part of plan day {day_index}"),
        }
    }
}

impl Error for ProgressError {}

impl WeeklySnapshot {
    /// Validates and cleans a progress submission against this snapshot.
    ///
    /// Notes and RPE values are trimmed, set flags are capped and the result
    /// is ordered by day index.
    pub fn normalize_progress(
        &self,
        drafts: Vec<DayProgress>,
    ) -> Result<Vec<DayProgress>, ProgressError> {
        let mut content: Vec<DayProgress> = Vec::with_capacity(drafts.len());
        for mut draft in drafts {
            let day = self
                .days
                .get(draft.day_index)
                .ok_or(ProgressError::DayOutOfRange(draft.day_index))?;
            if content.iter().any(|item| item.day_index == draft.day_index) {
                return Err(ProgressError::DuplicateDay(draft.day_index));
            }
            draft.note = draft.note.trim().to_string();
            for action in &mut draft.actions {
                if !day.has_action(&action.action_id) {
                    return Err(ProgressError::UnknownAction {
                        day_index: draft.day_index,
                        action_id: action.action_id.clone(),
                    });
                }
                action.rpe = action.rpe.trim().to_string();
                action.sets.truncate(MAX_SETS);
            }
            content.push(draft);
        }
        content.sort_by_key(|item| item.day_index);
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::{snapshot_week, ActionProgress, AssignmentStatus, DayProgress, ProgressError};
    use crate::model::catalog::{TrainingAction, TrainingType};
    use crate::model::schedule::{CellRef, EntryDraft, Metric, Schedule, MAX_SETS};
    use uuid::Uuid;

    fn planned_schedule() -> Schedule {
        let type_id = Uuid::new_v4();
        let catalog = vec![TrainingType {
            id: type_id,
            owner_id: Uuid::new_v4(),
            name: "Press".to_string(),
            actions: vec![TrainingAction {
                id: Uuid::new_v4(),
                type_id,
                name: "Bench".to_string(),
                sort_order: 0,
            }],
            created_at: 0,
        }];
        let mut schedule = Schedule::default();
        let draft = EntryDraft {
            entry_id: None,
            type_id: type_id.to_string(),
            group_label: "A".to_string(),
            action_ids: vec![catalog[0].actions[0].id.to_string()],
        };
        let entry_id = schedule.upsert_entry(1, &draft, &catalog).unwrap();
        let action_id = schedule.day_data[1].entries[0].actions[0].id.clone();
        let cell = CellRef {
            day_index: 1,
            entry_id,
            action_id,
            week_index: 2,
        };
        schedule.set_metric(&cell, Metric::Sets, "3").unwrap();
        schedule.set_metric(&cell, Metric::Reps, "8").unwrap();
        schedule
    }

    #[test]
    fn snapshot_copies_one_week() {
        let schedule = planned_schedule();
        let snapshot = snapshot_week(&schedule, 2).unwrap();
        assert_eq!(snapshot.week_index, 2);
        assert_eq!(snapshot.days.len(), 5);
        assert!(snapshot.days[0].entries.is_empty());
        let action = &snapshot.days[1].entries[0].actions[0];
        assert_eq!(action.action_name, "Bench");
        assert_eq!(action.week_value.reps, "8");
        assert_eq!(action.week_value.set_log.len(), 3);

        assert!(snapshot_week(&schedule, 4).is_none());
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = snapshot_week(&planned_schedule(), 0).unwrap();
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["weekIndex"], 0);
        assert!(value["days"][1]["entries"][0]["actions"][0]["weekValue"]["setLog"].is_array());
    }

    #[test]
    fn progress_is_validated_against_snapshot() {
        let snapshot = snapshot_week(&planned_schedule(), 2).unwrap();
        let action_id = snapshot.days[1].entries[0].actions[0].action_id.clone();

        let content = snapshot
            .normalize_progress(vec![
                DayProgress {
                    day_index: 1,
                    note: "  felt heavy ".to_string(),
                    actions: vec![ActionProgress {
                        action_id: action_id.clone(),
                        rpe: " 9 ".to_string(),
                        sets: vec![true, true, false],
                    }],
                },
                DayProgress {
                    day_index: 0,
                    note: String::new(),
                    actions: Vec::new(),
                },
            ])
            .unwrap();
        assert_eq!(content[0].day_index, 0);
        assert_eq!(content[1].note, "felt heavy");
        assert_eq!(content[1].actions[0].rpe, "9");

        let out_of_range = DayProgress {
            day_index: 5,
            ..DayProgress::default()
        };
        assert_eq!(
            snapshot.normalize_progress(vec![out_of_range]),
            Err(ProgressError::DayOutOfRange(5))
        );
        assert_eq!(
            snapshot.normalize_progress(vec![DayProgress::default(), DayProgress::default()]),
            Err(ProgressError::DuplicateDay(0))
        );
        let wrong_day = DayProgress {
            day_index: 0,
            note: String::new(),
            actions: vec![ActionProgress {
                action_id: action_id.clone(),
                ..ActionProgress::default()
            }],
        };
        assert_eq!(
            snapshot.normalize_progress(vec![wrong_day]),
            Err(ProgressError::UnknownAction {
                day_index: 0,
                action_id
            })
        );
    }

    #[test]
    fn assignment_status_strings_are_stable() {
        for status in [AssignmentStatus::Assigned, AssignmentStatus::Submitted] {
            assert_eq!(AssignmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AssignmentStatus::parse("done"), None);
    }

    #[test]
    fn progress_set_flags_are_capped() {
        let snapshot = snapshot_week(&planned_schedule(), 2).unwrap();
        let action_id = snapshot.days[1].entries[0].actions[0].action_id.clone();
        let submit = |flags: usize| {
            snapshot
                .normalize_progress(vec![DayProgress {
                    day_index: 1,
                    note: String::new(),
                    actions: vec![ActionProgress {
                        action_id: action_id.clone(),
                        rpe: String::new(),
                        sets: vec![true; flags],
                    }],
                }])
                .unwrap()
        };

        assert_eq!(submit(MAX_SETS)[0].actions[0].sets.len(), MAX_SETS);
        assert_eq!(submit(MAX_SETS + 1)[0].actions[0].sets.len(), MAX_SETS);
    }
}
