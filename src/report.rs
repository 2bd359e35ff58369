//! Dashboard metrics computed over a [`CardTable`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::card::{Card, CardTable, normalize_phase};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_cards: usize,
    pub unique_phases: usize,
    pub latest_created: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseCount {
    pub phase: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleProgress {
    pub module: String,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub percent: f64,
}

pub fn summary(table: &CardTable) -> Summary {
    let phases: HashSet<&str> = table.iter().map(|c| c.phase.as_str()).collect();
    Summary {
        total_cards: table.len(),
        unique_phases: phases.len(),
        latest_created: table.iter().map(|c| c.created_at).max(),
    }
}

/// Cards per phase, most populated first; ties broken by phase name.
pub fn cards_per_phase(table: &CardTable) -> Vec<PhaseCount> {
    count_phases(table.iter().map(|c| c.phase.clone()))
}

/// Cards created per calendar day, in the offset each timestamp was served with.
pub fn created_per_day(table: &CardTable) -> Vec<DayCount> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for card in table {
        *days.entry(card.created_at.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect()
}

/// Distinct module labels, sorted. Labels listed in `excluded` (case-insensitive)
/// are classification tags rather than modules and are skipped.
pub fn modules(table: &CardTable, excluded: &[String]) -> Vec<String> {
    let excluded: HashSet<String> = excluded.iter().map(|l| l.trim().to_lowercase()).collect();
    let modules: BTreeSet<&str> = table
        .iter()
        .flat_map(|c| c.labels.iter())
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !excluded.contains(&l.to_lowercase()))
        .collect();
    modules.into_iter().map(str::to_string).collect()
}

/// Completion of the cards labelled `module`. A card counts as completed when
/// its normalized phase appears in `completed_phases`.
pub fn module_progress(
    table: &CardTable,
    module: &str,
    completed_phases: &[String],
) -> ModuleProgress {
    let done: HashSet<String> = completed_phases.iter().map(|p| normalize_phase(p)).collect();
    let cards: Vec<&Card> = module_cards(table, module).collect();

    let total = cards.len();
    let completed = cards
        .iter()
        .filter(|c| done.contains(&c.normalized_phase()))
        .count();
    let percent = if total > 0 {
        (completed as f64 / total as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    ModuleProgress {
        module: module.to_string(),
        total,
        completed,
        pending: total - completed,
        percent,
    }
}

/// Normalized phase counts for the cards labelled `module`.
pub fn module_phase_distribution(table: &CardTable, module: &str) -> Vec<PhaseCount> {
    count_phases(module_cards(table, module).map(Card::normalized_phase))
}

/// Keep the cards whose phase is one of `phases`. An empty filter keeps everything.
pub fn filter_by_phases(table: &CardTable, phases: &[String]) -> CardTable {
    if phases.is_empty() {
        return table.clone();
    }
    CardTable::new(
        table
            .iter()
            .filter(|c| phases.iter().any(|p| *p == c.phase))
            .cloned()
            .collect(),
    )
}

pub fn newest_first(table: &CardTable) -> Vec<&Card> {
    let mut cards: Vec<&Card> = table.iter().collect();
    cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    cards
}

fn module_cards<'a>(table: &'a CardTable, module: &'a str) -> impl Iterator<Item = &'a Card> {
    let module = module.trim();
    table.iter().filter(move |c| c.has_label(module))
}

fn count_phases(phases: impl Iterator<Item = String>) -> Vec<PhaseCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for phase in phases {
        *counts.entry(phase).or_default() += 1;
    }
    let mut counts: Vec<PhaseCount> = counts
        .into_iter()
        .map(|(phase, count)| PhaseCount { phase, count })
        .collect();
    // BTreeMap order already sorts names; a stable sort keeps it for equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
