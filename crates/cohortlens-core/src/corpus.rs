//! Corpus manifest and sequential loader.
//!
//! The manifest declares every sheet of the corpus (where it lives, which
//! exam it belongs to, which areas it covers) and the canonical exam order.
//! The loader fetches and parses sheets one at a time and folds them into a
//! [`Roster`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SheetError;
use crate::model::{Area, ExamCalendar};
use crate::parser::{parse_sheet, ParsedSheet};
use crate::roster::Roster;
use crate::traits::SheetSource;

/// Default per-sheet fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Declaration of one sheet (one exam, one day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSpec {
    /// Location passed to the sheet source.
    pub path: String,
    /// Stable exam code shared by both days of an exam.
    pub exam_id: String,
    /// Display name of the exam.
    pub exam_name: String,
    /// Date label.
    pub date: String,
    /// Areas covered by this sheet, in sheet order.
    pub areas: Vec<Area>,
}

/// The full corpus declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusManifest {
    /// Canonical chronological order of exam ids.
    #[serde(default = "default_exam_order")]
    pub exam_order: Vec<String>,
    /// Sheets in load order.
    #[serde(default)]
    pub sheets: Vec<SheetSpec>,
}

fn default_exam_order() -> Vec<String> {
    ExamCalendar::default().exam_ids().to_vec()
}

fn sheet(path: &str, exam_id: &str, exam_name: &str, date: &str, areas: [Area; 2]) -> SheetSpec {
    SheetSpec {
        path: path.to_string(),
        exam_id: exam_id.to_string(),
        exam_name: exam_name.to_string(),
        date: date.to_string(),
        areas: areas.to_vec(),
    }
}

impl Default for CorpusManifest {
    /// The 2025 corpus: five exams, each split over two days.
    fn default() -> Self {
        const DAY_1: [Area; 2] = [Area::Linguagens, Area::Humanas];
        const DAY_2: [Area; 2] = [Area::Natureza, Area::Matematica];

        Self {
            exam_order: default_exam_order(),
            sheets: vec![
                sheet(
                    "RESULTADO  ABRIL DIA 1.csv",
                    "abril",
                    "1. Simulado Abril",
                    "Abril 2025",
                    DAY_1,
                ),
                sheet(
                    "RESULTADO ABRIL DIA 2.csv",
                    "abril",
                    "1. Simulado Abril",
                    "Abril 2025",
                    DAY_2,
                ),
                sheet(
                    "RESULTADO JUNHO DIA 1.csv",
                    "junho",
                    "2. Simulado Junho",
                    "Junho 2025",
                    DAY_1,
                ),
                sheet(
                    "RESULTADO JUNHO DIA 2 .csv",
                    "junho",
                    "2. Simulado Junho",
                    "Junho 2025",
                    DAY_2,
                ),
                sheet(
                    "RESULTADO AGOSTO DIA 1.csv",
                    "agosto",
                    "3. Simulado Agosto",
                    "Agosto 2025",
                    DAY_1,
                ),
                sheet(
                    "RESULTADO AGOSTO DIA 2.csv",
                    "agosto",
                    "3. Simulado Agosto",
                    "Agosto 2025",
                    DAY_2,
                ),
                sheet(
                    "RESULTADO SETEMBRO dia 1.csv",
                    "setembro",
                    "4. Simulado Setembro",
                    "Setembro 2025",
                    DAY_1,
                ),
                sheet(
                    "RESULTADO SETEMBRO dia 2xlsx.csv",
                    "setembro",
                    "4. Simulado Setembro",
                    "Setembro 2025",
                    DAY_2,
                ),
                sheet(
                    "Simulado OUTUBRO DIA 1.csv",
                    "outubro",
                    "5. Simulado Outubro",
                    "Outubro 2025",
                    DAY_1,
                ),
                sheet(
                    "Simulado OUTUBRO DIA 2.csv",
                    "outubro",
                    "5. Simulado Outubro",
                    "Outubro 2025",
                    DAY_2,
                ),
            ],
        }
    }
}

impl CorpusManifest {
    pub fn calendar(&self) -> ExamCalendar {
        ExamCalendar::new(self.exam_order.iter().cloned())
    }
}

/// Parse a manifest TOML file.
pub fn parse_manifest(path: &Path) -> Result<CorpusManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus manifest: {}", path.display()))?;

    parse_manifest_str(&content, path)
}

/// Parse a manifest from a TOML string (useful for testing).
pub fn parse_manifest_str(content: &str, source_path: &Path) -> Result<CorpusManifest> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}

/// A warning from manifest validation.
#[derive(Debug, Clone)]
pub struct ManifestWarning {
    /// The sheet path (if applicable).
    pub path: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a manifest for common issues.
pub fn validate_manifest(manifest: &CorpusManifest) -> Vec<ManifestWarning> {
    let mut warnings = Vec::new();

    for sheet in &manifest.sheets {
        if sheet.areas.is_empty() {
            warnings.push(ManifestWarning {
                path: Some(sheet.path.clone()),
                message: "sheet declares no areas".into(),
            });
        }
        if !manifest.exam_order.contains(&sheet.exam_id) {
            warnings.push(ManifestWarning {
                path: Some(sheet.path.clone()),
                message: format!("exam id '{}' is not in exam_order", sheet.exam_id),
            });
        }
    }

    // Each exam is expected as two sheets with disjoint areas
    let mut by_exam: HashMap<&str, Vec<&SheetSpec>> = HashMap::new();
    for sheet in &manifest.sheets {
        by_exam.entry(sheet.exam_id.as_str()).or_default().push(sheet);
    }
    for exam_id in &manifest.exam_order {
        let sheets = by_exam.get(exam_id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        if sheets.len() != 2 {
            warnings.push(ManifestWarning {
                path: None,
                message: format!("exam '{exam_id}' has {} sheet(s), expected 2", sheets.len()),
            });
        }

        let mut seen: Vec<Area> = Vec::new();
        for sheet in sheets {
            for area in &sheet.areas {
                if seen.contains(area) {
                    warnings.push(ManifestWarning {
                        path: Some(sheet.path.clone()),
                        message: format!("area {area} is declared twice for exam '{exam_id}'"),
                    });
                } else {
                    seen.push(*area);
                }
            }
        }
    }

    warnings
}

/// Outcome of loading one sheet.
#[derive(Debug, Clone)]
pub struct SheetReport {
    pub path: String,
    pub exam_id: String,
    /// Students found in the sheet (0 if it was discarded).
    pub students: usize,
    pub problems: Vec<SheetError>,
}

/// Fetches, parses, and merges every sheet of a manifest.
pub struct CorpusLoader {
    manifest: CorpusManifest,
    source: Arc<dyn SheetSource>,
    fetch_timeout: Duration,
}

impl CorpusLoader {
    pub fn new(manifest: CorpusManifest, source: Arc<dyn SheetSource>) -> Self {
        Self {
            manifest,
            source,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn manifest(&self) -> &CorpusManifest {
        &self.manifest
    }

    /// Load the whole corpus into a roster.
    ///
    /// Never fails: unavailable or malformed sheets are logged and
    /// contribute nothing.
    pub async fn load(&self) -> Roster {
        self.load_with_reports().await.0
    }

    /// Load the corpus and also return a per-sheet report.
    ///
    /// Sheets are processed strictly in manifest order so that each one
    /// merges into the exam entries created by earlier ones.
    pub async fn load_with_reports(&self) -> (Roster, Vec<SheetReport>) {
        let mut roster = Roster::new(self.manifest.calendar());
        let mut reports = Vec::with_capacity(self.manifest.sheets.len());

        for spec in &self.manifest.sheets {
            let (sheet, problems) = match self.load_sheet(spec).await {
                Ok(sheet) => {
                    let problems = sheet.warnings.clone();
                    (sheet, problems)
                }
                Err(e) => (ParsedSheet::default(), vec![e]),
            };

            for problem in &problems {
                if problem.is_fatal() {
                    tracing::warn!("skipping sheet {} ({}): {}", spec.path, spec.exam_id, problem);
                } else {
                    tracing::warn!("{} ({}): {}", spec.path, spec.exam_id, problem);
                }
            }
            tracing::debug!(path = %spec.path, students = sheet.results.len(), "merging sheet");

            reports.push(SheetReport {
                path: spec.path.clone(),
                exam_id: spec.exam_id.clone(),
                students: sheet.results.len(),
                problems,
            });
            roster.merge_sheet(sheet);
        }

        tracing::info!(
            sheets = self.manifest.sheets.len(),
            students = roster.len(),
            "corpus loaded via {}",
            self.source.name()
        );

        (roster, reports)
    }

    async fn load_sheet(&self, spec: &SheetSpec) -> Result<ParsedSheet, SheetError> {
        let text = match tokio::time::timeout(self.fetch_timeout, self.source.fetch(&spec.path))
            .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(SheetError::SourceUnavailable(format!("{e:#}"))),
            Err(_) => {
                return Err(SheetError::SourceUnavailable(format!(
                    "timed out after {}s",
                    self.fetch_timeout.as_secs()
                )))
            }
        };

        parse_sheet(&text, spec)
    }
}
