//! Per-student training schedule.
//!
//! # Responsibility
//! - Define the nested schedule shape: days → entries → actions → weeks.
//! - Repair arbitrary persisted JSON into that shape.
//! - Apply teacher edits (counts, entries, metrics, set logs).
//!
//! # Invariants
//! - `day_data.len() == days` and every action holds exactly `weeks` week
//!   values after [`Schedule::normalize`].
//! - A week value's set log length equals its parsed `sets` (0 when `sets`
//!   is not a positive integer).
//! - Metric values are kept as free text; only `sets` is interpreted.

use super::catalog::CatalogLookup;
use super::macro_plan::{repair_macro_plan, MacroPlan};
use super::repair::{
    ensure_array, ensure_id, ensure_string, ensure_text, ensure_title, new_id, parse_leading_int,
    positive_count, retain_objects,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Week count of a fresh schedule.
pub const DEFAULT_WEEKS: u32 = 4;
/// Training-day count of a fresh schedule.
pub const DEFAULT_DAYS: u32 = 5;
/// Upper bound for `weeks`.
pub const MAX_WEEKS: u32 = 104;
/// Upper bound for `days`.
pub const MAX_DAYS: u32 = 31;
/// Upper bound for the per-week set log.
pub const MAX_SETS: usize = 50;

/// Per-set completion record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
    pub done: bool,
    pub weight: String,
}

/// Student-reported values fed back into the teacher's schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentFeedback {
    pub rpe: String,
    /// Per-set completion flags as reported by the student.
    pub sets: Vec<bool>,
    pub note: String,
}

/// Planned metrics of one action for one week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekValue {
    pub sets: String,
    pub reps: String,
    pub weight: String,
    #[serde(default)]
    pub rpe: String,
    #[serde(default)]
    pub set_log: Vec<SetLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_progress: Option<StudentFeedback>,
}

impl WeekValue {
    /// Number of planned sets, when `sets` holds a positive integer.
    pub fn planned_sets(&self) -> Option<usize> {
        parse_leading_int(&self.sets)
            .filter(|sets| *sets > 0)
            .map(|sets| usize::try_from(sets).unwrap_or(MAX_SETS).min(MAX_SETS))
    }

    /// Resizes the set log to the planned set count.
    ///
    /// New sets start undone with the planned weight; sets without a weight
    /// inherit the planned weight.
    pub fn reconcile_set_log(&mut self) -> bool {
        let Some(total) = self.planned_sets() else {
            let changed = !self.set_log.is_empty();
            self.set_log.clear();
            return changed;
        };

        let mut changed = false;
        if self.set_log.len() != total {
            let default_weight = self.weight.clone();
            self.set_log.resize_with(total, || SetLog {
                done: false,
                weight: default_weight.clone(),
            });
            changed = true;
        }
        if !self.weight.is_empty() {
            for set in self.set_log.iter_mut().filter(|set| set.weight.is_empty()) {
                set.weight = self.weight.clone();
                changed = true;
            }
        }
        changed
    }

    /// Number of sets marked done.
    pub fn completed_sets(&self) -> usize {
        self.set_log.iter().filter(|set| set.done).count()
    }
}

/// One selected catalog action inside an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAction {
    pub id: String,
    /// Catalog action id (string form).
    pub action_id: String,
    /// Name copied from the catalog at selection time.
    pub action_name: String,
    pub week_values: Vec<WeekValue>,
}

/// Training type block placed on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub type_id: String,
    pub type_name: String,
    /// Free label such as `A` or `B1`.
    pub group_label: String,
    pub actions: Vec<EntryAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDay {
    pub id: String,
    pub title: String,
    pub entries: Vec<ScheduleEntry>,
}

impl ScheduleDay {
    fn new(index: usize) -> Self {
        Self {
            id: new_id("day"),
            title: default_day_title(index),
            entries: Vec::new(),
        }
    }
}

/// Complete multi-week schedule for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub weeks: u32,
    pub days: u32,
    pub day_data: Vec<ScheduleDay>,
    #[serde(default)]
    pub macro_plan: MacroPlan,
}

impl Default for Schedule {
    fn default() -> Self {
        let mut schedule = Self {
            weeks: DEFAULT_WEEKS,
            days: DEFAULT_DAYS,
            day_data: Vec::new(),
            macro_plan: MacroPlan::default(),
        };
        schedule.normalize();
        schedule
    }
}

/// Addresses one week cell of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    pub day_index: usize,
    pub entry_id: String,
    pub action_id: String,
    pub week_index: usize,
}

/// Editable metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Sets,
    Reps,
    Weight,
    Rpe,
}

impl Metric {
    pub fn key(self) -> &'static str {
        match self {
            Self::Sets => "sets",
            Self::Reps => "reps",
            Self::Weight => "weight",
            Self::Rpe => "rpe",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sets" => Some(Self::Sets),
            "reps" => Some(Self::Reps),
            "weight" => Some(Self::Weight),
            "rpe" => Some(Self::Rpe),
            _ => None,
        }
    }
}

/// Entry form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDraft {
    /// `Some` edits an existing entry, `None` appends a new one.
    pub entry_id: Option<String>,
    pub type_id: String,
    pub group_label: String,
    /// Selected catalog action ids in display order.
    pub action_ids: Vec<String>,
}

/// Errors from schedule edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    InvalidWeekCount(u32),
    InvalidDayCount(u32),
    BlankDayTitle,
    DayNotFound(usize),
    EntryNotFound(String),
    EntryIndexOutOfRange(usize),
    ActionNotFound(String),
    WeekOutOfRange(usize),
    SetOutOfRange(usize),
    MissingType,
    UnknownType(String),
    NoActionsSelected,
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWeekCount(weeks) => {
                write!(f, "week count must be within 1..={MAX_WEEKS}, got {weeks}")
            }
            Self::InvalidDayCount(days) => {
                write!(f, "day count must be within 1..={MAX_DAYS}, got {days}")
            }
            Self::BlankDayTitle => write!(f, "day title must not be blank"),
            Self::DayNotFound(index) => write!(f, "schedule day not found: {index}"),
            Self::EntryNotFound(id) => write!(f, "schedule entry not found: {id}"),
            Self::EntryIndexOutOfRange(index) => {
                write!(f, "schedule entry index out of range: {index}")
            }
            Self::ActionNotFound(id) => write!(f, "entry action not found: {id}"),
            Self::WeekOutOfRange(index) => write!(f, "week index out of range: {index}"),
            Self::SetOutOfRange(index) => write!(f, "set index out of range: {index}"),
            Self::MissingType => write!(f, "entry requires a training type"),
            Self::UnknownType(id) => write!(f, "training type not found: {id}"),
            Self::NoActionsSelected => write!(f, "entry requires at least one action"),
        }
    }
}

impl Error for ScheduleError {}

impl Schedule {
    /// Decodes persisted JSON, repairing it first.
    ///
    /// Returns the schedule plus whether the persisted form must be rewritten.
    pub fn from_value(mut value: Value) -> Result<(Self, bool), serde_json::Error> {
        let mut changed = repair_schedule(&mut value);
        let mut schedule: Schedule = serde_json::from_value(value)?;
        changed |= schedule.normalize();
        Ok((schedule, changed))
    }

    /// Enforces day count, week count and set-log invariants.
    pub fn normalize(&mut self) -> bool {
        let mut changed = self.ensure_day_count();
        changed |= self.sync_week_values();
        changed
    }

    fn ensure_day_count(&mut self) -> bool {
        let target = self.days as usize;
        if self.day_data.len() == target {
            return false;
        }
        self.day_data.truncate(target);
        while self.day_data.len() < target {
            let index = self.day_data.len();
            self.day_data.push(ScheduleDay::new(index));
        }
        true
    }

    /// Pads or truncates every action to `weeks` values and reconciles set logs.
    pub fn sync_week_values(&mut self) -> bool {
        let weeks = self.weeks as usize;
        let mut changed = false;
        for action in self.actions_mut() {
            if action.week_values.len() != weeks {
                action.week_values.resize_with(weeks, WeekValue::default);
                changed = true;
            }
            for week_value in &mut action.week_values {
                changed |= week_value.reconcile_set_log();
            }
        }
        changed
    }

    fn actions_mut(&mut self) -> impl Iterator<Item = &mut EntryAction> {
        self.day_data
            .iter_mut()
            .flat_map(|day| day.entries.iter_mut())
            .flat_map(|entry| entry.actions.iter_mut())
    }

    pub fn set_weeks(&mut self, weeks: u32) -> Result<(), ScheduleError> {
        if !(1..=MAX_WEEKS).contains(&weeks) {
            return Err(ScheduleError::InvalidWeekCount(weeks));
        }
        self.weeks = weeks;
        self.sync_week_values();
        Ok(())
    }

    pub fn add_week(&mut self) -> Result<(), ScheduleError> {
        self.set_weeks(self.weeks.saturating_add(1))
    }

    pub fn set_days(&mut self, days: u32) -> Result<(), ScheduleError> {
        if !(1..=MAX_DAYS).contains(&days) {
            return Err(ScheduleError::InvalidDayCount(days));
        }
        self.days = days;
        self.ensure_day_count();
        Ok(())
    }

    pub fn add_day(&mut self) -> Result<(), ScheduleError> {
        self.set_days(self.days.saturating_add(1))
    }

    pub fn rename_day(&mut self, day_index: usize, title: &str) -> Result<(), ScheduleError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(ScheduleError::BlankDayTitle);
        }
        self.day_mut(day_index)?.title = trimmed.to_string();
        Ok(())
    }

    fn day_mut(&mut self, day_index: usize) -> Result<&mut ScheduleDay, ScheduleError> {
        self.day_data
            .get_mut(day_index)
            .ok_or(ScheduleError::DayNotFound(day_index))
    }

    /// Creates or edits one entry from a form draft.
    ///
    /// Actions kept across an edit keep their week values; names are
    /// refreshed from the catalog. Returns the entry id.
    pub fn upsert_entry<C>(
        &mut self,
        day_index: usize,
        draft: &EntryDraft,
        catalog: &C,
    ) -> Result<String, ScheduleError>
    where
        C: CatalogLookup + ?Sized,
    {
        let type_id = draft.type_id.trim();
        if type_id.is_empty() {
            return Err(ScheduleError::MissingType);
        }
        let mut action_ids: Vec<&str> = Vec::new();
        for id in &draft.action_ids {
            let id = id.trim();
            if !id.is_empty() && !action_ids.contains(&id) {
                action_ids.push(id);
            }
        }
        if action_ids.is_empty() {
            return Err(ScheduleError::NoActionsSelected);
        }
        let kind = catalog
            .find_type(type_id)
            .ok_or_else(|| ScheduleError::UnknownType(type_id.to_string()))?;

        let weeks = self.weeks as usize;
        let day = self.day_mut(day_index)?;
        let existing_index = match &draft.entry_id {
            Some(entry_id) => Some(
                day.entries
                    .iter()
                    .position(|entry| &entry.id == entry_id)
                    .ok_or_else(|| ScheduleError::EntryNotFound(entry_id.clone()))?,
            ),
            None => None,
        };

        let mut previous = existing_index
            .map(|index| std::mem::take(&mut day.entries[index].actions))
            .unwrap_or_default();

        let actions = action_ids
            .into_iter()
            .map(|action_id| {
                let definition = uuid::Uuid::parse_str(action_id)
                    .ok()
                    .and_then(|id| kind.action(id));
                match previous.iter().position(|item| item.action_id == action_id) {
                    Some(position) => {
                        let mut kept = previous.swap_remove(position);
                        if let Some(definition) = definition {
                            kept.action_name = definition.name.clone();
                        }
                        kept
                    }
                    None => EntryAction {
                        id: new_id("entryAction"),
                        action_id: action_id.to_string(),
                        action_name: definition.map(|d| d.name.clone()).unwrap_or_default(),
                        week_values: vec![WeekValue::default(); weeks],
                    },
                }
            })
            .collect::<Vec<_>>();

        let group_label = draft.group_label.trim().to_string();
        let entry_id = match existing_index {
            Some(index) => {
                let entry = &mut day.entries[index];
                entry.type_id = type_id.to_string();
                entry.type_name = kind.name.clone();
                entry.group_label = group_label;
                entry.actions = actions;
                entry.id.clone()
            }
            None => {
                let entry = ScheduleEntry {
                    id: new_id("entry"),
                    type_id: type_id.to_string(),
                    type_name: kind.name.clone(),
                    group_label,
                    actions,
                };
                let id = entry.id.clone();
                day.entries.push(entry);
                id
            }
        };
        self.sync_week_values();
        Ok(entry_id)
    }

    pub fn remove_entry(&mut self, day_index: usize, entry_id: &str) -> Result<(), ScheduleError> {
        let day = self.day_mut(day_index)?;
        let before = day.entries.len();
        day.entries.retain(|entry| entry.id != entry_id);
        if day.entries.len() == before {
            return Err(ScheduleError::EntryNotFound(entry_id.to_string()));
        }
        Ok(())
    }

    /// Moves one entry within its day; the target index is clamped.
    pub fn move_entry(
        &mut self,
        day_index: usize,
        from: usize,
        to: usize,
    ) -> Result<(), ScheduleError> {
        let day = self.day_mut(day_index)?;
        if from >= day.entries.len() {
            return Err(ScheduleError::EntryIndexOutOfRange(from));
        }
        let to = to.min(day.entries.len() - 1);
        if from != to {
            let entry = day.entries.remove(from);
            day.entries.insert(to, entry);
        }
        Ok(())
    }

    /// Resolves one week cell, padding the action's week values if needed.
    pub fn week_value_mut(&mut self, cell: &CellRef) -> Result<&mut WeekValue, ScheduleError> {
        if cell.week_index >= self.weeks as usize {
            return Err(ScheduleError::WeekOutOfRange(cell.week_index));
        }
        let weeks = self.weeks as usize;
        let day = self.day_mut(cell.day_index)?;
        let entry = day
            .entries
            .iter_mut()
            .find(|entry| entry.id == cell.entry_id)
            .ok_or_else(|| ScheduleError::EntryNotFound(cell.entry_id.clone()))?;
        let action = entry
            .actions
            .iter_mut()
            .find(|action| action.id == cell.action_id)
            .ok_or_else(|| ScheduleError::ActionNotFound(cell.action_id.clone()))?;
        if action.week_values.len() < weeks {
            action.week_values.resize_with(weeks, WeekValue::default);
        }
        Ok(&mut action.week_values[cell.week_index])
    }

    /// Writes one metric; `sets` and `weight` edits reconcile the set log.
    pub fn set_metric(
        &mut self,
        cell: &CellRef,
        metric: Metric,
        value: &str,
    ) -> Result<(), ScheduleError> {
        let week_value = self.week_value_mut(cell)?;
        let target = match metric {
            Metric::Sets => &mut week_value.sets,
            Metric::Reps => &mut week_value.reps,
            Metric::Weight => &mut week_value.weight,
            Metric::Rpe => &mut week_value.rpe,
        };
        *target = value.to_string();
        if matches!(metric, Metric::Sets | Metric::Weight) {
            week_value.reconcile_set_log();
        }
        Ok(())
    }

    pub fn set_set_done(
        &mut self,
        cell: &CellRef,
        set_index: usize,
        done: bool,
    ) -> Result<(), ScheduleError> {
        let week_value = self.week_value_mut(cell)?;
        let set = week_value
            .set_log
            .get_mut(set_index)
            .ok_or(ScheduleError::SetOutOfRange(set_index))?;
        set.done = done;
        Ok(())
    }

    pub fn set_set_weight(
        &mut self,
        cell: &CellRef,
        set_index: usize,
        weight: &str,
    ) -> Result<(), ScheduleError> {
        let week_value = self.week_value_mut(cell)?;
        let set = week_value
            .set_log
            .get_mut(set_index)
            .ok_or(ScheduleError::SetOutOfRange(set_index))?;
        set.weight = weight.to_string();
        Ok(())
    }

    /// Copies current catalog names onto entries and actions.
    ///
    /// Entries whose type was deleted keep their stored names.
    pub fn refresh_catalog_names<C>(&mut self, catalog: &C) -> bool
    where
        C: CatalogLookup + ?Sized,
    {
        let mut changed = false;
        for entry in self.day_data.iter_mut().flat_map(|day| day.entries.iter_mut()) {
            let Some(kind) = catalog.find_type(&entry.type_id) else {
                continue;
            };
            if entry.type_name != kind.name {
                entry.type_name = kind.name.clone();
                changed = true;
            }
            for action in &mut entry.actions {
                let definition = uuid::Uuid::parse_str(&action.action_id)
                    .ok()
                    .and_then(|id| kind.action(id));
                if let Some(definition) = definition {
                    if action.action_name != definition.name {
                        action.action_name = definition.name.clone();
                        changed = true;
                    }
                }
            }
        }
        changed
    }

    /// Finds an action by its entry-local id across the whole schedule.
    pub fn find_action_mut(&mut self, action_id: &str) -> Option<&mut EntryAction> {
        self.actions_mut().find(|action| action.id == action_id)
    }
}

fn default_day_title(index: usize) -> String {
    format!("DAY{}", index + 1)
}

/// Repairs persisted schedule JSON in place; returns whether it changed.
///
/// Non-object input is replaced by a complete default schedule. Every
/// non-object entry and action is dropped.
pub fn repair_schedule(value: &mut Value) -> bool {
    let mut changed = false;
    if !value.is_object() {
        *value = Value::Object(Map::new());
        changed = true;
    }
    let Value::Object(root) = value else {
        return changed;
    };

    let weeks = match positive_count(root.get("weeks")) {
        Some(weeks) => weeks.min(u64::from(MAX_WEEKS)),
        None => u64::from(DEFAULT_WEEKS),
    };
    if root.get("weeks").and_then(Value::as_u64) != Some(weeks) {
        root.insert("weeks".to_string(), Value::from(weeks));
        changed = true;
    }

    let days = match positive_count(root.get("days")) {
        Some(days) => days.min(u64::from(MAX_DAYS)),
        None => u64::from(DEFAULT_DAYS),
    };
    if root.get("days").and_then(Value::as_u64) != Some(days) {
        root.insert("days".to_string(), Value::from(days));
        changed = true;
    }

    // Older payloads kept a flat `entries` list that cannot be mapped to days.
    if root.remove("entries").is_some() {
        root.insert("dayData".to_string(), Value::Array(Vec::new()));
        changed = true;
    }

    changed |= ensure_array(root, "dayData");
    if let Some(Value::Array(day_data)) = root.get_mut("dayData") {
        let target = days as usize;
        if day_data.len() > target {
            day_data.truncate(target);
            changed = true;
        }
        while day_data.len() < target {
            day_data.push(Value::Object(Map::new()));
            changed = true;
        }
        for (index, day) in day_data.iter_mut().enumerate() {
            changed |= repair_day(day, index, weeks as usize);
        }
    }

    let macro_plan = root
        .entry("macroPlan")
        .or_insert_with(|| Value::Object(Map::new()));
    changed |= repair_macro_plan(macro_plan);

    changed
}

fn repair_day(value: &mut Value, index: usize, weeks: usize) -> bool {
    let mut changed = false;
    if !value.is_object() {
        *value = Value::Object(Map::new());
        changed = true;
    }
    let Value::Object(day) = value else {
        return changed;
    };

    changed |= ensure_id(day, "id", "day");
    changed |= ensure_title(day, "title", default_day_title(index));
    changed |= ensure_array(day, "entries");
    if let Some(Value::Array(entries)) = day.get_mut("entries") {
        changed |= retain_objects(entries);
        for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
            changed |= repair_entry(entry, weeks);
        }
    }
    changed
}

fn repair_entry(entry: &mut Map<String, Value>, weeks: usize) -> bool {
    let mut changed = ensure_id(entry, "id", "entry");
    changed |= ensure_string(entry, "typeId");
    changed |= ensure_string(entry, "typeName");
    changed |= ensure_string(entry, "groupLabel");
    changed |= ensure_array(entry, "actions");
    if let Some(Value::Array(actions)) = entry.get_mut("actions") {
        changed |= retain_objects(actions);
        for action in actions.iter_mut().filter_map(Value::as_object_mut) {
            changed |= repair_action(action, weeks);
        }
    }
    changed
}

fn repair_action(action: &mut Map<String, Value>, weeks: usize) -> bool {
    let mut changed = ensure_id(action, "id", "entryAction");
    changed |= ensure_string(action, "actionId");
    changed |= ensure_string(action, "actionName");
    if !matches!(action.get("weekValues"), Some(Value::Array(_))) {
        let blank = (0..weeks)
            .map(|_| Value::Object(Map::new()))
            .collect::<Vec<_>>();
        action.insert("weekValues".to_string(), Value::Array(blank));
        changed = true;
    }
    if let Some(Value::Array(week_values)) = action.get_mut("weekValues") {
        for week_value in week_values.iter_mut() {
            changed |= repair_week_value(week_value);
        }
    }
    changed
}

fn repair_week_value(value: &mut Value) -> bool {
    let mut changed = false;
    if !value.is_object() {
        *value = Value::Object(Map::new());
        changed = true;
    }
    let Value::Object(week_value) = value else {
        return changed;
    };

    for key in ["sets", "reps", "weight", "rpe"] {
        changed |= ensure_text(week_value, key);
    }
    changed |= ensure_array(week_value, "setLog");
    if let Some(Value::Array(sets)) = week_value.get_mut("setLog") {
        for set in sets.iter_mut() {
            if !set.is_object() {
                *set = Value::Object(Map::new());
                changed = true;
            }
            if let Value::Object(set) = set {
                let done = match set.get("done") {
                    Some(Value::Bool(_)) => None,
                    Some(Value::String(text)) => Some(!text.is_empty()),
                    Some(Value::Number(number)) => Some(number.as_f64() != Some(0.0)),
                    Some(Value::Null) | None => Some(false),
                    Some(_) => Some(true),
                };
                if let Some(done) = done {
                    set.insert("done".to_string(), Value::Bool(done));
                    changed = true;
                }
                changed |= ensure_text(set, "weight");
            }
        }
    }

    if matches!(week_value.get("studentProgress"), Some(feedback) if !feedback.is_object()) {
        week_value.remove("studentProgress");
        changed = true;
    }
    if let Some(Value::Object(feedback)) = week_value.get_mut("studentProgress") {
        changed |= ensure_text(feedback, "rpe");
        changed |= ensure_text(feedback, "note");
        changed |= ensure_array(feedback, "sets");
        if let Some(Value::Array(flags)) = feedback.get_mut("sets") {
            for flag in flags.iter_mut() {
                let truthy = match flag {
                    Value::Bool(_) => continue,
                    Value::String(text) => !text.is_empty(),
                    Value::Number(number) => number.as_f64() != Some(0.0),
                    Value::Null => false,
                    _ => true,
                };
                *flag = Value::Bool(truthy);
                changed = true;
            }
        }
    }
    changed
}
