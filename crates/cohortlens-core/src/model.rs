//! Core data model types for cohortlens.
//!
//! These are the types the parser produces, the roster accumulates, and the
//! aggregator reads: subject areas, skill records, per-exam results, and
//! students.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of skills tracked per subject area.
pub const SKILL_COUNT: usize = 30;

/// Upper bound of a mastery probability.
pub const MAX_PROBABILITY: f64 = 100.0;

/// Skill code for a 1-based skill number (`1` → `"H01"`).
pub fn skill_id(number: usize) -> String {
    format!("H{number:02}")
}

/// The four subject areas of the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Natureza,
    Matematica,
    Linguagens,
    Humanas,
}

impl Area {
    /// All areas in dashboard order.
    pub const ALL: [Area; 4] = [
        Area::Natureza,
        Area::Matematica,
        Area::Linguagens,
        Area::Humanas,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Area::Natureza => "Ciências da Natureza",
            Area::Matematica => "Matemática",
            Area::Linguagens => "Linguagens e Códigos",
            Area::Humanas => "Ciências Humanas",
        }
    }

    /// Lowercase identifier, as used in config files and file names.
    pub fn key(&self) -> &'static str {
        match self {
            Area::Natureza => "natureza",
            Area::Matematica => "matematica",
            Area::Linguagens => "linguagens",
            Area::Humanas => "humanas",
        }
    }

    /// Map the first cell of a sheet row to an area, if it is an area header.
    ///
    /// Matching is case-insensitive against the labels used in the exported
    /// spreadsheets.
    pub fn from_sheet_header(cell: &str) -> Option<Area> {
        match cell.trim().to_uppercase().as_str() {
            "NATUREZA" => Some(Area::Natureza),
            "MATEMÁTICA" => Some(Area::Matematica),
            "LINGUAGENS" => Some(Area::Linguagens),
            "HUMANIDADES" => Some(Area::Humanas),
            _ => None,
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Area {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "natureza" | "cn" | "ciências da natureza" | "ciencias da natureza" => {
                Ok(Area::Natureza)
            }
            "matematica" | "matemática" | "mt" => Ok(Area::Matematica),
            "linguagens" | "lc" | "linguagens e códigos" | "linguagens e codigos" => {
                Ok(Area::Linguagens)
            }
            "humanas" | "ch" | "humanidades" | "ciências humanas" | "ciencias humanas" => {
                Ok(Area::Humanas)
            }
            other => Err(format!("unknown area: {other}")),
        }
    }
}

/// Mastery probability for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Skill code, `H01` to `H30`.
    pub id: String,
    /// Mastery probability in `[0, 100]`.
    pub probability: f64,
}

impl SkillRecord {
    /// Build a record, clamping the probability into `[0, 100]`.
    ///
    /// Non-finite input becomes 0.
    pub fn new(id: impl Into<String>, probability: f64) -> Self {
        let probability = if probability.is_finite() {
            probability.clamp(0.0, MAX_PROBABILITY)
        } else {
            0.0
        };
        Self {
            id: id.into(),
            probability,
        }
    }
}

/// Outcome of one subject area within one exam sitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaResult {
    /// Number of correct items.
    pub raw_score: u32,
    /// Scaled (TRI) score; 0 means not computed.
    pub tri_score: f64,
    /// One record per skill code, in code order.
    pub skills: Vec<SkillRecord>,
}

impl AreaResult {
    /// Whether this result carries a usable scaled score.
    pub fn has_tri_score(&self) -> bool {
        self.tri_score > 0.0
    }

    /// Look up a skill by code.
    pub fn skill(&self, id: &str) -> Option<&SkillRecord> {
        self.skills.iter().find(|s| s.id == id)
    }
}

/// One exam sitting for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    /// Stable short code used to join files (e.g. `"abril"`).
    pub exam_id: String,
    /// Display name (e.g. `"1. Simulado Abril"`).
    pub exam_name: String,
    /// Date label (e.g. `"Abril 2025"`).
    pub date: String,
    /// Results per area; absent areas are missing from the map.
    #[serde(default)]
    pub areas: BTreeMap<Area, AreaResult>,
}

impl ExamResult {
    /// An exam result with no areas yet.
    pub fn empty(exam_id: &str, exam_name: &str, date: &str) -> Self {
        Self {
            exam_id: exam_id.to_string(),
            exam_name: exam_name.to_string(),
            date: date.to_string(),
            areas: BTreeMap::new(),
        }
    }

    pub fn area(&self, area: Area) -> Option<&AreaResult> {
        self.areas.get(&area)
    }
}

/// A student and their exam history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Sequential identifier assigned at load time.
    pub id: String,
    /// Display name; the join key across files.
    pub name: String,
    /// One entry per exam, in the order exams were first seen.
    #[serde(default)]
    pub results: Vec<ExamResult>,
}

impl Student {
    pub fn result_for(&self, exam_id: &str) -> Option<&ExamResult> {
        self.results.iter().find(|r| r.exam_id == exam_id)
    }

    /// Results sorted by the canonical exam sequence.
    pub fn chronological_results(&self, calendar: &ExamCalendar) -> Vec<&ExamResult> {
        let mut results: Vec<&ExamResult> = self.results.iter().collect();
        results.sort_by_key(|r| calendar.rank(&r.exam_id));
        results
    }

    /// The most recent result that has an entry for `area`.
    pub fn latest_area_result(
        &self,
        area: Area,
        calendar: &ExamCalendar,
    ) -> Option<(&ExamResult, &AreaResult)> {
        self.chronological_results(calendar)
            .into_iter()
            .rev()
            .find_map(|r| r.area(area).map(|a| (r, a)))
    }
}

/// The fixed chronological ordering of exam identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCalendar {
    order: Vec<String>,
}

impl ExamCalendar {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }

    /// Position of `exam_id` in the sequence.
    ///
    /// Unknown identifiers sort after every known one.
    pub fn rank(&self, exam_id: &str) -> usize {
        self.order
            .iter()
            .position(|id| id == exam_id)
            .unwrap_or(self.order.len())
    }

    pub fn contains(&self, exam_id: &str) -> bool {
        self.order.iter().any(|id| id == exam_id)
    }

    pub fn exam_ids(&self) -> &[String] {
        &self.order
    }
}

impl Default for ExamCalendar {
    fn default() -> Self {
        Self::new(["abril", "junho", "agosto", "setembro", "outubro"])
    }
}

/// One of the five scaled-score ranges used for distribution reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyBand {
    Below500,
    From500To600,
    From600To700,
    From700To800,
    Above800,
}

impl ProficiencyBand {
    /// Band for a scaled score. Lower bounds are inclusive.
    pub fn classify(score: f64) -> Self {
        if score < 500.0 {
            ProficiencyBand::Below500
        } else if score < 600.0 {
            ProficiencyBand::From500To600
        } else if score < 700.0 {
            ProficiencyBand::From600To700
        } else if score < 800.0 {
            ProficiencyBand::From700To800
        } else {
            ProficiencyBand::Above800
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProficiencyBand::Below500 => "<500",
            ProficiencyBand::From500To600 => "500-600",
            ProficiencyBand::From600To700 => "600-700",
            ProficiencyBand::From700To800 => "700-800",
            ProficiencyBand::Above800 => ">800",
        }
    }
}

/// Student counts per proficiency band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProficiencyDistribution {
    pub below_500: u32,
    pub range_500_to_600: u32,
    pub range_600_to_700: u32,
    pub range_700_to_800: u32,
    pub above_800: u32,
}

impl ProficiencyDistribution {
    pub fn record(&mut self, score: f64) {
        match ProficiencyBand::classify(score) {
            ProficiencyBand::Below500 => self.below_500 += 1,
            ProficiencyBand::From500To600 => self.range_500_to_600 += 1,
            ProficiencyBand::From600To700 => self.range_600_to_700 += 1,
            ProficiencyBand::From700To800 => self.range_700_to_800 += 1,
            ProficiencyBand::Above800 => self.above_800 += 1,
        }
    }

    pub fn count(&self, band: ProficiencyBand) -> u32 {
        match band {
            ProficiencyBand::Below500 => self.below_500,
            ProficiencyBand::From500To600 => self.range_500_to_600,
            ProficiencyBand::From600To700 => self.range_600_to_700,
            ProficiencyBand::From700To800 => self.range_700_to_800,
            ProficiencyBand::Above800 => self.above_800,
        }
    }

    pub fn total(&self) -> u32 {
        self.below_500
            + self.range_500_to_600
            + self.range_600_to_700
            + self.range_700_to_800
            + self.above_800
    }
}

/// Cohort-wide statistics for one exam in one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStatistics {
    pub exam_id: String,
    pub exam_name: String,
    pub date: String,
    /// Mean scaled score, one decimal; 0 if no student qualifies.
    pub average_tri: f64,
    /// Mean raw score, one decimal; 0 if no student qualifies.
    pub average_raw: f64,
    pub distribution: ProficiencyDistribution,
}

/// Cohort-average mastery of one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillScore {
    pub id: String,
    /// Average probability, two decimals.
    pub probability: f64,
}

/// Thirty skill averages in code order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatrix {
    pub area: Area,
    /// Number of students whose latest result contributed.
    pub student_count: u32,
    pub skills: Vec<SkillScore>,
}

impl SkillMatrix {
    pub fn get(&self, id: &str) -> Option<f64> {
        self.skills
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_header_lookup_is_case_insensitive() {
        assert_eq!(Area::from_sheet_header("LINGUAGENS"), Some(Area::Linguagens));
        assert_eq!(Area::from_sheet_header(" humanidades "), Some(Area::Humanas));
        assert_eq!(Area::from_sheet_header("Matemática"), Some(Area::Matematica));
        assert_eq!(Area::from_sheet_header("natureza"), Some(Area::Natureza));
        assert_eq!(Area::from_sheet_header("ACERTOS"), None);
        assert_eq!(Area::from_sheet_header(""), None);
    }

    #[test]
    fn area_display_and_parse() {
        assert_eq!(Area::Linguagens.to_string(), "Linguagens e Códigos");
        assert_eq!("mt".parse::<Area>().unwrap(), Area::Matematica);
        assert_eq!("Humanas".parse::<Area>().unwrap(), Area::Humanas);
        assert_eq!("cn".parse::<Area>().unwrap(), Area::Natureza);
        assert!("quimica".parse::<Area>().is_err());
        for area in Area::ALL {
            assert_eq!(area.key().parse::<Area>().unwrap(), area);
        }
    }

    #[test]
    fn skill_record_clamps_probability() {
        assert_eq!(SkillRecord::new("H01", 120.0).probability, 100.0);
        assert_eq!(SkillRecord::new("H01", -3.5).probability, 0.0);
        assert_eq!(SkillRecord::new("H01", f64::NAN).probability, 0.0);
        assert_eq!(SkillRecord::new("H01", 42.5).probability, 42.5);
    }

    #[test]
    fn skill_ids_are_zero_padded() {
        assert_eq!(skill_id(1), "H01");
        assert_eq!(skill_id(30), "H30");
    }

    #[test]
    fn band_boundaries_belong_to_upper_band() {
        assert_eq!(ProficiencyBand::classify(499.9), ProficiencyBand::Below500);
        assert_eq!(ProficiencyBand::classify(500.0), ProficiencyBand::From500To600);
        assert_eq!(ProficiencyBand::classify(600.0), ProficiencyBand::From600To700);
        assert_eq!(ProficiencyBand::classify(700.0), ProficiencyBand::From700To800);
        assert_eq!(ProficiencyBand::classify(800.0), ProficiencyBand::Above800);
        assert_eq!(ProficiencyBand::classify(0.1), ProficiencyBand::Below500);
    }

    #[test]
    fn every_score_lands_in_exactly_one_band() {
        let mut dist = ProficiencyDistribution::default();
        let mut score = 300.0;
        while score < 1000.0 {
            dist.record(score);
            score += 0.5;
        }
        assert_eq!(dist.total(), 1400);
    }

    #[test]
    fn calendar_ranks_unknown_last() {
        let calendar = ExamCalendar::default();
        assert_eq!(calendar.rank("abril"), 0);
        assert_eq!(calendar.rank("outubro"), 4);
        assert_eq!(calendar.rank("dezembro"), 5);
    }

    #[test]
    fn latest_area_result_uses_calendar_order() {
        let mut outubro = ExamResult::empty("outubro", "5. Simulado Outubro", "Outubro 2025");
        outubro.areas.insert(
            Area::Matematica,
            AreaResult {
                raw_score: 30,
                tri_score: 700.0,
                skills: vec![],
            },
        );
        let mut abril = ExamResult::empty("abril", "1. Simulado Abril", "Abril 2025");
        abril.areas.insert(
            Area::Matematica,
            AreaResult {
                raw_score: 20,
                tri_score: 600.0,
                skills: vec![],
            },
        );
        let student = Student {
            id: "1".into(),
            name: "Ana".into(),
            results: vec![outubro, abril],
        };

        let (exam, result) = student
            .latest_area_result(Area::Matematica, &ExamCalendar::default())
            .unwrap();
        assert_eq!(exam.exam_id, "outubro");
        assert_eq!(result.raw_score, 30);
        assert!(student
            .latest_area_result(Area::Humanas, &ExamCalendar::default())
            .is_none());
    }
}
