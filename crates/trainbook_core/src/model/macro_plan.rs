//! Yearly macro plan: macro/meso cycles and 53-week focus rows.
//!
//! # Responsibility
//! - Define the macro plan attached to every schedule.
//! - Repair persisted macro plans into a complete shape.
//! - Project the plan onto a dated 53-week timeline.
//!
//! # Invariants
//! - Every per-week row has exactly `TOTAL_WEEKS` cells.
//! - A plan always keeps at least one macrocycle and one mesocycle.
//! - Cycle lengths are at least one week.

use super::repair::{
    coerce_text, ensure_array, ensure_id, ensure_object, ensure_string, new_id, parse_leading_int,
};
use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of microcycles (weeks) covered by one macro plan.
pub const TOTAL_WEEKS: usize = 53;
/// Default macrocycle length in weeks.
pub const DEFAULT_MACRO_WEEKS: u32 = 13;
/// Default mesocycle length in weeks.
pub const DEFAULT_MESO_WEEKS: u32 = 4;

const DEFAULT_CYCLE_COUNT: usize = 4;
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Strength focus categories, one matrix row each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusCategory {
    Hypertrophy,
    Strength,
    StrengthPower,
    Power,
    Peaking,
}

impl FocusCategory {
    pub const ALL: [FocusCategory; 5] = [
        Self::Hypertrophy,
        Self::Strength,
        Self::StrengthPower,
        Self::Power,
        Self::Peaking,
    ];

    /// JSON key inside `strengthFocus.matrix`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Hypertrophy => "hypertrophy",
            Self::Strength => "strength",
            Self::StrengthPower => "strengthPower",
            Self::Power => "power",
            Self::Peaking => "peaking",
        }
    }
}

/// Training phase selectable per week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Performance,
    LoadPlus,
    Load,
    Base,
    Deload,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Self::Performance,
        Self::LoadPlus,
        Self::Load,
        Self::Base,
        Self::Deload,
    ];

    pub fn value(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::LoadPlus => "load-plus",
            Self::Load => "load",
            Self::Base => "base",
            Self::Deload => "deload",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.value() == value)
    }
}

/// One macro- or mesocycle block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: String,
    pub name: String,
    pub weeks: u32,
}

impl Cycle {
    fn default_macro(index: usize) -> Self {
        Self {
            id: new_id("macro"),
            name: if index == 0 {
                "Preparation".to_string()
            } else {
                (index + 1).to_string()
            },
            weeks: DEFAULT_MACRO_WEEKS,
        }
    }

    fn default_meso(index: usize) -> Self {
        Self {
            id: new_id("meso"),
            name: (index + 1).to_string(),
            weeks: DEFAULT_MESO_WEEKS,
        }
    }
}

/// Cycle list selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    Macro,
    Meso,
}

impl CycleKind {
    fn key(self) -> &'static str {
        match self {
            Self::Macro => "macrocycles",
            Self::Meso => "mesocycles",
        }
    }

    fn id_prefix(self) -> &'static str {
        match self {
            Self::Macro => "macro",
            Self::Meso => "meso",
        }
    }

    fn default_weeks(self) -> u32 {
        match self {
            Self::Macro => DEFAULT_MACRO_WEEKS,
            Self::Meso => DEFAULT_MESO_WEEKS,
        }
    }

    fn default_cycle(self, index: usize) -> Cycle {
        match self {
            Self::Macro => Cycle::default_macro(index),
            Self::Meso => Cycle::default_meso(index),
        }
    }

    fn fallback_name(self, index: usize) -> String {
        match self {
            Self::Macro => format!("Macro {}", index + 1),
            Self::Meso => (index + 1).to_string(),
        }
    }
}

impl Display for CycleKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Macro => write!(f, "macrocycle"),
            Self::Meso => write!(f, "mesocycle"),
        }
    }
}

/// Partial update for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleUpdate {
    pub name: Option<String>,
    pub weeks: Option<u32>,
    /// 1-based target position; clamped into the list.
    pub order: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusMatrix {
    pub hypertrophy: Vec<String>,
    pub strength: Vec<String>,
    pub strength_power: Vec<String>,
    pub power: Vec<String>,
    pub peaking: Vec<String>,
}

impl Default for FocusMatrix {
    fn default() -> Self {
        Self {
            hypertrophy: blank_row(),
            strength: blank_row(),
            strength_power: blank_row(),
            power: blank_row(),
            peaking: blank_row(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthFocus {
    pub primary_row: Vec<String>,
    pub secondary_row: Vec<String>,
    pub matrix: FocusMatrix,
}

impl Default for StrengthFocus {
    fn default() -> Self {
        Self {
            primary_row: blank_row(),
            secondary_row: blank_row(),
            matrix: FocusMatrix::default(),
        }
    }
}

/// Focus block with free-text notes (movement and energy-system work).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotedFocus {
    pub primary_row: Vec<String>,
    pub secondary_row: Vec<String>,
    pub notes_row: Vec<String>,
}

impl Default for NotedFocus {
    fn default() -> Self {
        Self {
            primary_row: blank_row(),
            secondary_row: blank_row(),
            notes_row: blank_row(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub performance: String,
    pub load_plus: String,
    pub load: String,
    pub base: String,
    pub deload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadField {
    Performance,
    LoadPlus,
    Load,
    Base,
    Deload,
}

/// Editable per-week row of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineRow {
    StrengthPrimary,
    StrengthSecondary,
    StrengthMatrix(FocusCategory),
    MovementPrimary,
    MovementSecondary,
    MovementNotes,
    EsdPrimary,
    EsdSecondary,
    EsdNotes,
    Phase,
    Intensity,
    Volume,
}

/// Yearly plan attached to a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroPlan {
    /// `YYYY-MM-DD` of the first microcycle.
    pub starting_date: String,
    pub macrocycle_name: String,
    pub notes: String,
    pub macrocycles: Vec<Cycle>,
    pub mesocycles: Vec<Cycle>,
    pub strength_focus: StrengthFocus,
    pub movement_focus: NotedFocus,
    pub esd_focus: NotedFocus,
    pub phase_selection: Vec<String>,
    pub intensity_scale: Vec<String>,
    pub volume_scale: Vec<String>,
    pub workload: Workload,
}

impl Default for MacroPlan {
    fn default() -> Self {
        Self {
            starting_date: today_iso(),
            macrocycle_name: String::new(),
            notes: String::new(),
            macrocycles: (0..DEFAULT_CYCLE_COUNT).map(Cycle::default_macro).collect(),
            mesocycles: (0..DEFAULT_CYCLE_COUNT).map(Cycle::default_meso).collect(),
            strength_focus: StrengthFocus::default(),
            movement_focus: NotedFocus::default(),
            esd_focus: NotedFocus::default(),
            phase_selection: blank_row(),
            intensity_scale: blank_row(),
            volume_scale: blank_row(),
            workload: Workload::default(),
        }
    }
}

/// Errors from macro plan edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroPlanError {
    WeekOutOfRange(usize),
    InvalidPhase(String),
    InvalidStartingDate(String),
    InvalidCycleWeeks(u32),
    CycleNotFound { kind: CycleKind, id: String },
    LastCycle(CycleKind),
}

impl Display for MacroPlanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeekOutOfRange(week) => {
                write!(f, "week index {week} is outside 0..{TOTAL_WEEKS}")
            }
            Self::InvalidPhase(value) => write!(f, "unknown training phase `{value}`"),
            Self::InvalidStartingDate(value) => {
                write!(f, "starting date `{value}` is not YYYY-MM-DD")
            }
            Self::InvalidCycleWeeks(weeks) => {
                write!(f, "cycle length must be at least one week, got {weeks}")
            }
            Self::CycleNotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::LastCycle(kind) => write!(f, "cannot remove the last {kind}"),
        }
    }
}

impl Error for MacroPlanError {}

impl MacroPlan {
    fn cycles_mut(&mut self, kind: CycleKind) -> &mut Vec<Cycle> {
        match kind {
            CycleKind::Macro => &mut self.macrocycles,
            CycleKind::Meso => &mut self.mesocycles,
        }
    }

    fn row_mut(&mut self, row: TimelineRow) -> &mut Vec<String> {
        match row {
            TimelineRow::StrengthPrimary => &mut self.strength_focus.primary_row,
            TimelineRow::StrengthSecondary => &mut self.strength_focus.secondary_row,
            TimelineRow::StrengthMatrix(category) => {
                let matrix = &mut self.strength_focus.matrix;
                match category {
                    FocusCategory::Hypertrophy => &mut matrix.hypertrophy,
                    FocusCategory::Strength => &mut matrix.strength,
                    FocusCategory::StrengthPower => &mut matrix.strength_power,
                    FocusCategory::Power => &mut matrix.power,
                    FocusCategory::Peaking => &mut matrix.peaking,
                }
            }
            TimelineRow::MovementPrimary => &mut self.movement_focus.primary_row,
            TimelineRow::MovementSecondary => &mut self.movement_focus.secondary_row,
            TimelineRow::MovementNotes => &mut self.movement_focus.notes_row,
            TimelineRow::EsdPrimary => &mut self.esd_focus.primary_row,
            TimelineRow::EsdSecondary => &mut self.esd_focus.secondary_row,
            TimelineRow::EsdNotes => &mut self.esd_focus.notes_row,
            TimelineRow::Phase => &mut self.phase_selection,
            TimelineRow::Intensity => &mut self.intensity_scale,
            TimelineRow::Volume => &mut self.volume_scale,
        }
    }

    /// Writes one cell of a per-week row.
    ///
    /// Phase cells accept only known phase values or `""`.
    pub fn set_row_cell(
        &mut self,
        row: TimelineRow,
        week: usize,
        value: impl Into<String>,
    ) -> Result<(), MacroPlanError> {
        if week >= TOTAL_WEEKS {
            return Err(MacroPlanError::WeekOutOfRange(week));
        }
        let value = value.into();
        if row == TimelineRow::Phase && !value.is_empty() && Phase::parse(&value).is_none() {
            return Err(MacroPlanError::InvalidPhase(value));
        }
        let cells = self.row_mut(row);
        cells.resize(TOTAL_WEEKS, String::new());
        cells[week] = value;
        Ok(())
    }

    pub fn set_workload(&mut self, field: WorkloadField, value: impl Into<String>) {
        let target = match field {
            WorkloadField::Performance => &mut self.workload.performance,
            WorkloadField::LoadPlus => &mut self.workload.load_plus,
            WorkloadField::Load => &mut self.workload.load,
            WorkloadField::Base => &mut self.workload.base,
            WorkloadField::Deload => &mut self.workload.deload,
        };
        *target = value.into();
    }

    pub fn set_starting_date(&mut self, value: &str) -> Result<(), MacroPlanError> {
        let trimmed = value.trim();
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map_err(|_| MacroPlanError::InvalidStartingDate(trimmed.to_string()))?;
        self.starting_date = date.format("%Y-%m-%d").to_string();
        Ok(())
    }

    /// Appends a default-length cycle and returns its id.
    pub fn add_cycle(&mut self, kind: CycleKind) -> String {
        let cycles = self.cycles_mut(kind);
        let cycle = Cycle {
            id: new_id(kind.id_prefix()),
            name: (cycles.len() + 1).to_string(),
            weeks: kind.default_weeks(),
        };
        let id = cycle.id.clone();
        cycles.push(cycle);
        id
    }

    pub fn remove_cycle(&mut self, kind: CycleKind, id: &str) -> Result<(), MacroPlanError> {
        let cycles = self.cycles_mut(kind);
        let index = find_cycle(cycles, kind, id)?;
        if cycles.len() <= 1 {
            return Err(MacroPlanError::LastCycle(kind));
        }
        cycles.remove(index);
        Ok(())
    }

    pub fn update_cycle(
        &mut self,
        kind: CycleKind,
        id: &str,
        update: &CycleUpdate,
    ) -> Result<(), MacroPlanError> {
        if let Some(weeks) = update.weeks {
            if weeks == 0 {
                return Err(MacroPlanError::InvalidCycleWeeks(weeks));
            }
        }
        let cycles = self.cycles_mut(kind);
        let index = find_cycle(cycles, kind, id)?;
        if let Some(name) = &update.name {
            cycles[index].name = name.trim().to_string();
        }
        if let Some(weeks) = update.weeks {
            cycles[index].weeks = weeks;
        }
        if let Some(order) = update.order {
            let target = order.saturating_sub(1).min(cycles.len() - 1);
            let cycle = cycles.remove(index);
            cycles.insert(target, cycle);
        }
        Ok(())
    }
}

fn find_cycle(cycles: &[Cycle], kind: CycleKind, id: &str) -> Result<usize, MacroPlanError> {
    cycles
        .iter()
        .position(|cycle| cycle.id == id)
        .ok_or_else(|| MacroPlanError::CycleNotFound {
            kind,
            id: id.to_string(),
        })
}

/// One dated week of the macro timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineWeek {
    pub index: usize,
    /// Short month label of the week's first day.
    pub month: &'static str,
    pub days: Vec<NaiveDate>,
    /// ISO-8601 week number of the week's first day.
    pub week_of_year: u32,
    /// 1-based microcycle number.
    pub microcycle: usize,
    pub macro_name: String,
    pub macro_index: usize,
    pub meso_name: String,
    pub meso_index: usize,
}

/// Walks cycle budgets week by week; the last cycle repeats once exhausted.
struct CycleCursor<'a> {
    cycles: &'a [Cycle],
    index: usize,
    remaining: u32,
}

impl<'a> CycleCursor<'a> {
    fn new(cycles: &'a [Cycle]) -> Self {
        let remaining = cycles.first().map_or(TOTAL_WEEKS as u32, |cycle| cycle.weeks);
        Self {
            cycles,
            index: 0,
            remaining,
        }
    }

    fn current_name(&self) -> String {
        self.cycles
            .get(self.index)
            .map(|cycle| cycle.name.clone())
            .unwrap_or_default()
    }

    fn advance(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return;
        }
        if self.index + 1 < self.cycles.len() {
            self.index += 1;
        }
        if let Some(cycle) = self.cycles.get(self.index) {
            self.remaining = cycle.weeks.max(1);
        }
    }
}

/// Projects the plan onto `TOTAL_WEEKS` dated weeks.
pub fn compute_timeline(plan: &MacroPlan) -> Vec<TimelineWeek> {
    let start = parse_iso_date(&plan.starting_date);
    let mut macros = CycleCursor::new(&plan.macrocycles);
    let mut mesos = CycleCursor::new(&plan.mesocycles);

    let mut weeks = Vec::with_capacity(TOTAL_WEEKS);
    for week in 0..TOTAL_WEEKS {
        let week_start = add_days(start, (week * 7) as u64);
        let days = (0..7).map(|offset| add_days(week_start, offset)).collect();

        weeks.push(TimelineWeek {
            index: week,
            month: MONTH_NAMES[week_start.month0() as usize],
            days,
            week_of_year: week_start.iso_week().week(),
            microcycle: week + 1,
            macro_name: macros.current_name(),
            macro_index: macros.index,
            meso_name: mesos.current_name(),
            meso_index: mesos.index,
        });

        macros.advance();
        mesos.advance();
    }
    weeks
}

/// Parses `YYYY-MM-DD` (or an RFC 3339 timestamp); falls back to today.
pub fn parse_iso_date(value: &str) -> NaiveDate {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date;
    }
    if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return timestamp.date_naive();
    }
    Utc::now().date_naive()
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

fn today_iso() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn blank_row() -> Vec<String> {
    vec![String::new(); TOTAL_WEEKS]
}

/// Repairs a persisted macro plan in place; returns whether it changed.
///
/// Non-object input is replaced by a complete default plan.
pub fn repair_macro_plan(value: &mut Value) -> bool {
    let mut changed = false;
    if !value.is_object() {
        *value = Value::Object(Map::new());
        changed = true;
    }
    let Value::Object(plan) = value else {
        return changed;
    };

    if !matches!(plan.get("startingDate"), Some(Value::String(date)) if !date.is_empty()) {
        plan.insert("startingDate".to_string(), Value::String(today_iso()));
        changed = true;
    }
    changed |= ensure_string(plan, "macrocycleName");
    changed |= ensure_string(plan, "notes");
    changed |= repair_cycles(plan, CycleKind::Macro);
    changed |= repair_cycles(plan, CycleKind::Meso);

    changed |= ensure_object(plan, "strengthFocus");
    if let Some(Value::Object(strength)) = plan.get_mut("strengthFocus") {
        changed |= repair_row_with_legacy(strength, "primaryRow", "primary");
        changed |= repair_row_with_legacy(strength, "secondaryRow", "secondary");
        changed |= ensure_object(strength, "matrix");
        if let Some(Value::Object(matrix)) = strength.get_mut("matrix") {
            for category in FocusCategory::ALL {
                changed |= repair_row(matrix, category.key());
            }
        }
    }

    for key in ["movementFocus", "esdFocus"] {
        changed |= ensure_object(plan, key);
        if let Some(Value::Object(focus)) = plan.get_mut(key) {
            changed |= repair_row_with_legacy(focus, "primaryRow", "primary");
            changed |= repair_row_with_legacy(focus, "secondaryRow", "secondary");
            changed |= repair_row_with_legacy(focus, "notesRow", "notes");
        }
    }

    for key in ["phaseSelection", "intensityScale", "volumeScale"] {
        changed |= repair_row(plan, key);
    }

    changed |= ensure_object(plan, "workload");
    if let Some(Value::Object(workload)) = plan.get_mut("workload") {
        for key in ["performance", "loadPlus", "load", "base", "deload"] {
            changed |= ensure_string(workload, key);
        }
    }

    changed
}

fn repair_cycles(plan: &mut Map<String, Value>, kind: CycleKind) -> bool {
    let key = kind.key();
    let needs_defaults = !matches!(plan.get(key), Some(Value::Array(items)) if !items.is_empty());
    if needs_defaults {
        let defaults = (0..DEFAULT_CYCLE_COUNT)
            .map(|index| cycle_to_value(&kind.default_cycle(index)))
            .collect();
        plan.insert(key.to_string(), Value::Array(defaults));
        return true;
    }

    let mut changed = false;
    if let Some(Value::Array(items)) = plan.get_mut(key) {
        for (index, item) in items.iter_mut().enumerate() {
            let cycle = match item {
                Value::Object(cycle) => cycle,
                other => {
                    *other = cycle_to_value(&kind.default_cycle(index));
                    changed = true;
                    continue;
                }
            };
            changed |= ensure_id(cycle, "id", kind.id_prefix());
            if !matches!(cycle.get("name"), Some(Value::String(_))) {
                cycle.insert(
                    "name".to_string(),
                    Value::String(kind.fallback_name(index)),
                );
                changed = true;
            }
            let weeks = match cycle.get("weeks") {
                Some(Value::Number(number)) => number
                    .as_i64()
                    .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
                Some(Value::String(text)) => parse_leading_int(text),
                _ => None,
            };
            let normalized = match weeks {
                Some(weeks) if weeks > 0 => u32::try_from(weeks).unwrap_or(u32::MAX),
                _ => kind.default_weeks(),
            };
            if cycle.get("weeks").and_then(Value::as_u64) != Some(u64::from(normalized)) {
                cycle.insert("weeks".to_string(), Value::from(normalized));
                changed = true;
            }
        }
    }
    changed
}

fn cycle_to_value(cycle: &Cycle) -> Value {
    let mut map = Map::new();
    map.insert("id".to_string(), Value::String(cycle.id.clone()));
    map.insert("name".to_string(), Value::String(cycle.name.clone()));
    map.insert("weeks".to_string(), Value::from(cycle.weeks));
    Value::Object(map)
}

/// Syncs one row to `TOTAL_WEEKS` string cells.
fn repair_row(map: &mut Map<String, Value>, key: &str) -> bool {
    let mut changed = ensure_array(map, key);
    if let Some(Value::Array(cells)) = map.get_mut(key) {
        if cells.len() != TOTAL_WEEKS {
            cells.resize(TOTAL_WEEKS, Value::String(String::new()));
            changed = true;
        }
        for cell in cells.iter_mut() {
            changed |= coerce_text(cell);
        }
    }
    changed
}

/// Syncs a row and folds a legacy scalar field into its first cell.
fn repair_row_with_legacy(map: &mut Map<String, Value>, row_key: &str, legacy_key: &str) -> bool {
    let mut changed = repair_row(map, row_key);
    let legacy = match map.get(legacy_key) {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        _ => None,
    };
    if let Some(legacy) = legacy {
        if let Some(Value::Array(cells)) = map.get_mut(row_key) {
            if cells[0].as_str().map_or(true, str::is_empty) {
                cells[0] = Value::String(legacy);
            }
        }
        map.remove(legacy_key);
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::{
        compute_timeline, parse_iso_date, repair_macro_plan, CycleKind, CycleUpdate,
        FocusCategory, MacroPlan, MacroPlanError, Phase, TimelineRow, TOTAL_WEEKS,
    };
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn plan_with_cycles(macros: &[u32], mesos: &[u32]) -> MacroPlan {
        let mut plan = MacroPlan::default();
        plan.starting_date = "2024-01-01".to_string();
        plan.macrocycles.truncate(1);
        plan.mesocycles.truncate(1);
        plan.macrocycles[0].weeks = macros[0];
        plan.mesocycles[0].weeks = mesos[0];
        for weeks in &macros[1..] {
            let id = plan.add_cycle(CycleKind::Macro);
            plan.update_cycle(
                CycleKind::Macro,
                &id,
                &CycleUpdate {
                    weeks: Some(*weeks),
                    ..CycleUpdate::default()
                },
            )
            .unwrap();
        }
        for weeks in &mesos[1..] {
            let id = plan.add_cycle(CycleKind::Meso);
            plan.update_cycle(
                CycleKind::Meso,
                &id,
                &CycleUpdate {
                    weeks: Some(*weeks),
                    ..CycleUpdate::default()
                },
            )
            .unwrap();
        }
        plan
    }

    #[test]
    fn default_plan_has_full_rows_and_four_cycles() {
        let plan = MacroPlan::default();
        assert_eq!(plan.macrocycles.len(), 4);
        assert_eq!(plan.macrocycles[0].name, "Preparation");
        assert_eq!(plan.macrocycles[1].name, "2");
        assert_eq!(plan.mesocycles[3].name, "4");
        assert_eq!(plan.mesocycles[0].weeks, 4);
        assert_eq!(plan.strength_focus.matrix.peaking.len(), TOTAL_WEEKS);
        assert_eq!(plan.esd_focus.notes_row.len(), TOTAL_WEEKS);
    }

    #[test]
    fn timeline_advances_cycles_and_repeats_last() {
        let plan = plan_with_cycles(&[2, 3], &[1, 1]);
        let weeks = compute_timeline(&plan);
        assert_eq!(weeks.len(), TOTAL_WEEKS);

        let macro_indices: Vec<usize> = weeks.iter().take(6).map(|w| w.macro_index).collect();
        assert_eq!(macro_indices, vec![0, 0, 1, 1, 1, 1]);
        let meso_indices: Vec<usize> = weeks.iter().take(4).map(|w| w.meso_index).collect();
        assert_eq!(meso_indices, vec![0, 1, 1, 1]);
        assert_eq!(weeks[52].macro_index, 1);
    }

    #[test]
    fn timeline_dates_months_and_iso_weeks() {
        let plan = plan_with_cycles(&[13], &[4]);
        let weeks = compute_timeline(&plan);
        assert_eq!(weeks[0].days[0], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(weeks[0].days[6], NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(weeks[0].week_of_year, 1);
        assert_eq!(weeks[0].month, "Jan");
        assert_eq!(weeks[5].month, "Feb");
        assert_eq!(weeks[5].microcycle, 6);
        assert_eq!(weeks[0].macro_name, "Preparation");
    }

    #[test]
    fn parse_iso_date_accepts_rfc3339_and_falls_back() {
        assert_eq!(
            parse_iso_date("2023-12-31T10:00:00Z"),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
        let today = chrono::Utc::now().date_naive();
        assert_eq!(parse_iso_date("not a date"), today);
    }

    #[test]
    fn row_cells_validate_week_and_phase() {
        let mut plan = MacroPlan::default();
        plan.set_row_cell(TimelineRow::Phase, 3, Phase::Deload.value())
            .unwrap();
        assert_eq!(plan.phase_selection[3], "deload");
        plan.set_row_cell(TimelineRow::StrengthMatrix(FocusCategory::Power), 52, "x")
            .unwrap();
        assert_eq!(plan.strength_focus.matrix.power[52], "x");

        assert_eq!(
            plan.set_row_cell(TimelineRow::Volume, TOTAL_WEEKS, "1"),
            Err(MacroPlanError::WeekOutOfRange(TOTAL_WEEKS))
        );
        assert!(matches!(
            plan.set_row_cell(TimelineRow::Phase, 0, "rest"),
            Err(MacroPlanError::InvalidPhase(_))
        ));
    }

    #[test]
    fn cycles_can_be_reordered_but_not_emptied() {
        let mut plan = MacroPlan::default();
        let last_id = plan.mesocycles[3].id.clone();
        plan.update_cycle(
            CycleKind::Meso,
            &last_id,
            &CycleUpdate {
                order: Some(1),
                name: Some("  Intro ".to_string()),
                ..CycleUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(plan.mesocycles[0].id, last_id);
        assert_eq!(plan.mesocycles[0].name, "Intro");

        let ids: Vec<String> = plan.macrocycles.iter().map(|c| c.id.clone()).collect();
        for id in &ids[1..] {
            plan.remove_cycle(CycleKind::Macro, id).unwrap();
        }
        assert_eq!(
            plan.remove_cycle(CycleKind::Macro, &ids[0]),
            Err(MacroPlanError::LastCycle(CycleKind::Macro))
        );
    }

    #[test]
    fn repair_replaces_non_object_with_defaults() {
        let mut value = json!("broken");
        assert!(repair_macro_plan(&mut value));
        let plan: MacroPlan = serde_json::from_value(value).unwrap();
        assert_eq!(plan.macrocycles.len(), 4);
        assert_eq!(plan.volume_scale.len(), TOTAL_WEEKS);
    }

    #[test]
    fn repair_migrates_legacy_scalars_and_fixes_cycles() {
        let mut value = json!({
            "startingDate": "2024-03-04",
            "macrocycleName": "Season",
            "notes": 7,
            "macrocycles": [{ "id": "macro_a", "name": "Base", "weeks": "6" }, null],
            "mesocycles": [{ "name": 3, "weeks": 0 }],
            "strengthFocus": { "primary": "Squat", "primaryRow": ["", "Bench"] },
            "movementFocus": { "notes": "hinge", "notesRow": "oops" },
            "esdFocus": null,
            "phaseSelection": ["base", 5],
            "workload": { "performance": 1 }
        });
        assert!(repair_macro_plan(&mut value));

        let plan: MacroPlan = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(plan.starting_date, "2024-03-04");
        assert_eq!(plan.macrocycle_name, "Season");
        assert_eq!(plan.notes, "");
        assert_eq!(plan.macrocycles[0].weeks, 6);
        assert_eq!(plan.macrocycles[1].weeks, 13);
        assert_eq!(plan.mesocycles[0].name, "1");
        assert_eq!(plan.mesocycles[0].weeks, 4);
        assert!(plan.mesocycles[0].id.starts_with("meso_"));
        assert_eq!(plan.strength_focus.primary_row[0], "Squat");
        assert_eq!(plan.strength_focus.primary_row[1], "Bench");
        assert_eq!(plan.movement_focus.notes_row[0], "hinge");
        assert_eq!(plan.phase_selection[1], "5");
        assert_eq!(plan.workload.performance, "");
        assert!(value["strengthFocus"].get("primary").is_none());

        let mut repaired = value;
        assert!(!repair_macro_plan(&mut repaired));
        assert_ne!(repaired, Value::Null);
    }
}
