use serde::Serialize;

use crate::card::Card;
use crate::error::Result;
use crate::report::{DayCount, ModuleProgress, PhaseCount, Summary};

const CARD_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";
const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A computed report, ready to print.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Cards(Vec<Card>),
    Summary(Summary),
    Phases(Vec<PhaseCount>),
    Timeline(Vec<DayCount>),
    Modules(Vec<String>),
    Progress {
        progress: ModuleProgress,
        phases: Vec<PhaseCount>,
    },
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_text(report: &Report) -> String {
    match report {
        Report::Cards(cards) => text_table(
            &["ID", "TITLE", "CREATED", "PHASE", "LABELS"],
            cards
                .iter()
                .map(|c| {
                    vec![
                        c.id.clone(),
                        c.title.clone(),
                        c.created_at.format(CARD_TIME_FORMAT).to_string(),
                        c.phase.clone(),
                        c.labels.join(", "),
                    ]
                })
                .collect(),
        ),
        Report::Summary(s) => text_table(
            &["METRIC", "VALUE"],
            vec![
                vec!["Total cards".to_string(), s.total_cards.to_string()],
                vec!["Unique phases".to_string(), s.unique_phases.to_string()],
                vec![
                    "Latest created".to_string(),
                    s.latest_created
                        .map(|t| t.format(DATE_FORMAT).to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ],
            ],
        ),
        Report::Phases(counts) => phase_table(counts),
        Report::Timeline(days) => text_table(
            &["DATE", "CARDS"],
            days.iter()
                .map(|d| vec![d.date.format(DATE_FORMAT).to_string(), d.count.to_string()])
                .collect(),
        ),
        Report::Modules(modules) => text_table(
            &["MODULE"],
            modules.iter().map(|m| vec![m.clone()]).collect(),
        ),
        Report::Progress { progress, phases } => {
            let mut out = text_table(
                &["MODULE", "TOTAL", "COMPLETED", "PENDING", "PERCENT"],
                vec![vec![
                    progress.module.clone(),
                    progress.total.to_string(),
                    progress.completed.to_string(),
                    progress.pending.to_string(),
                    format!("{:.1}%", progress.percent),
                ]],
            );
            out.push('\n');
            out.push_str(&phase_table(phases));
            out
        }
    }
}

fn phase_table(counts: &[PhaseCount]) -> String {
    text_table(
        &["PHASE", "CARDS"],
        counts
            .iter()
            .map(|c| vec![c.phase.clone(), c.count.to_string()])
            .collect(),
    )
}

/// Left-aligned columns separated by two spaces, header first.
fn text_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows.iter()) {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let pad = widths[i] - cell.chars().count();
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
