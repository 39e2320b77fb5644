//! Dashboard report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Area, CohortStatistics, SkillMatrix};
use crate::narrative::ExecutiveSummary;
use crate::roster::Roster;
use crate::statistics::{cohort_statistics, growth, skill_matrix, Growth};

/// Everything the presentation layer needs for one area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    /// When the report was created.
    pub generated_at: DateTime<Utc>,
    pub area: Area,
    /// Students in the roster (not only those with results in `area`).
    pub student_count: usize,
    /// Per-exam statistics in canonical order.
    pub cohort: Vec<CohortStatistics>,
    pub skills: SkillMatrix,
    /// `None` when the roster has no exams.
    pub growth: Option<Growth>,
    pub summary: Option<ExecutiveSummary>,
}

impl DashboardReport {
    /// Compute a report for `area` from a loaded roster.
    pub fn build(roster: &Roster, area: Area, summary: Option<ExecutiveSummary>) -> Self {
        let cohort = cohort_statistics(roster, area);
        let growth = growth(&cohort);
        Self {
            generated_at: Utc::now(),
            area,
            student_count: roster.len(),
            skills: skill_matrix(roster, area),
            cohort,
            growth,
            summary,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: DashboardReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "# {}: {} students\n\n",
            self.area, self.student_count
        ));

        md.push_str("| Exam | Date | Mean TRI | Mean raw ");
        md.push_str("| <500 | 500-600 | 600-700 | 700-800 | ≥800 |\n");
        md.push_str("|------|------|----------|----------");
        md.push_str("|------|---------|---------|---------|------|\n");
        for s in &self.cohort {
            let d = &s.distribution;
            md.push_str(&format!(
                "| {} | {} | {:.1} | {:.1} | {} | {} | {} | {} | {} |\n",
                s.exam_name,
                s.date,
                s.average_tri,
                s.average_raw,
                d.below_500,
                d.range_500_to_600,
                d.range_600_to_700,
                d.range_700_to_800,
                d.above_800
            ));
        }
        md.push('\n');

        if let Some(g) = &self.growth {
            md.push_str(&format!(
                "**Growth:** {:+.1} points ({:+.1}%) from {} to {}\n\n",
                g.absolute, g.percent, g.initial_exam, g.final_exam
            ));
        }

        if let Some(summary) = &self.summary {
            md.push_str(&summary.text);
            md.push('\n');
        }

        md
    }
}
