//! Cohort statistics and skill matrices.
//!
//! Everything here is a pure function of the roster. Results are recomputed
//! on every call and never cached.

use serde::{Deserialize, Serialize};

use crate::model::{
    skill_id, Area, CohortStatistics, ProficiencyDistribution, SkillMatrix, SkillRecord,
    SkillScore, Student, SKILL_COUNT,
};
use crate::roster::Roster;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Cohort statistics
// ---------------------------------------------------------------------------

/// Per-exam cohort statistics for `area`, in canonical exam order.
///
/// Only students with a scaled score above 0 for that exam and area count
/// towards the means and the distribution.
pub fn cohort_statistics(roster: &Roster, area: Area) -> Vec<CohortStatistics> {
    roster
        .exams()
        .into_iter()
        .map(|exam| {
            let mut total_tri = 0.0;
            let mut total_raw = 0u64;
            let mut count = 0u32;
            let mut distribution = ProficiencyDistribution::default();

            for student in roster.students() {
                let Some(result) = student
                    .result_for(&exam.exam_id)
                    .and_then(|r| r.area(area))
                else {
                    continue;
                };
                if !result.has_tri_score() {
                    continue;
                }

                count += 1;
                total_tri += result.tri_score;
                total_raw += u64::from(result.raw_score);
                distribution.record(result.tri_score);
            }

            let (average_tri, average_raw) = if count > 0 {
                (
                    round_to(total_tri / f64::from(count), 1),
                    round_to(total_raw as f64 / f64::from(count), 1),
                )
            } else {
                (0.0, 0.0)
            };

            CohortStatistics {
                exam_id: exam.exam_id,
                exam_name: exam.exam_name,
                date: exam.date,
                average_tri,
                average_raw,
                distribution,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Skill matrix
// ---------------------------------------------------------------------------

/// Cohort-average mastery per skill for `area`.
///
/// Each student contributes their most recent result that has `area`, even
/// if that result is older than other students' latest. Students without
/// any such result are left out of both the sums and the denominator.
pub fn skill_matrix(roster: &Roster, area: Area) -> SkillMatrix {
    let mut sums = [0.0f64; SKILL_COUNT];
    let mut student_count = 0u32;

    for student in roster.students() {
        let Some((_, result)) = student.latest_area_result(area, roster.calendar()) else {
            continue;
        };
        if result.skills.is_empty() {
            continue;
        }

        student_count += 1;
        for (i, sum) in sums.iter_mut().enumerate() {
            let id = skill_id(i + 1);
            *sum += result.skill(&id).map(|s| s.probability).unwrap_or(0.0);
        }
    }

    let skills = sums
        .iter()
        .enumerate()
        .map(|(i, sum)| SkillScore {
            id: skill_id(i + 1),
            probability: if student_count > 0 {
                round_to(sum / f64::from(student_count), 2)
            } else {
                0.0
            },
        })
        .collect();

    SkillMatrix {
        area,
        student_count,
        skills,
    }
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

/// Change between the first and last exams of a statistics sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    pub initial_exam: String,
    pub final_exam: String,
    pub initial_average: f64,
    pub final_average: f64,
    /// `final_average - initial_average`.
    pub absolute: f64,
    /// Growth relative to the initial mean; 0 when the initial mean is 0.
    pub percent: f64,
    /// Change in the number of students at 800 or above.
    pub top_band_change: i64,
}

/// Growth from the first to the last entry, or `None` for an empty sequence.
pub fn growth(stats: &[CohortStatistics]) -> Option<Growth> {
    let first = stats.first()?;
    let last = stats.last()?;

    let absolute = last.average_tri - first.average_tri;
    let percent = if first.average_tri > 0.0 {
        absolute / first.average_tri * 100.0
    } else {
        0.0
    };

    Some(Growth {
        initial_exam: first.exam_name.clone(),
        final_exam: last.exam_name.clone(),
        initial_average: first.average_tri,
        final_average: last.average_tri,
        absolute,
        percent,
        top_band_change: i64::from(last.distribution.above_800)
            - i64::from(first.distribution.above_800),
    })
}

// ---------------------------------------------------------------------------
// Per-student views
// ---------------------------------------------------------------------------

/// One student's standing on one exam beside the cohort mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    pub exam_id: String,
    pub exam_name: String,
    /// `None` when the student has no result for the area on this exam.
    pub tri_score: Option<f64>,
    pub raw_score: Option<u32>,
    pub cohort_average: f64,
}

/// A student's scaled and raw scores per exam, joined by exam id with the
/// cohort statistics for the same area.
pub fn student_evolution(
    student: &Student,
    area: Area,
    cohort: &[CohortStatistics],
) -> Vec<EvolutionPoint> {
    cohort
        .iter()
        .map(|stats| {
            let result = student
                .result_for(&stats.exam_id)
                .and_then(|r| r.area(area));
            EvolutionPoint {
                exam_id: stats.exam_id.clone(),
                exam_name: stats.exam_name.clone(),
                tri_score: result.map(|r| r.tri_score),
                raw_score: result.map(|r| r.raw_score),
                cohort_average: stats.average_tri,
            }
        })
        .collect()
}

/// Skills from the student's most recent result that has `area`.
pub fn latest_skills(student: &Student, area: Area, roster: &Roster) -> Vec<SkillRecord> {
    student
        .latest_area_result(area, roster.calendar())
        .map(|(_, result)| result.skills.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AreaResult, ExamCalendar, ExamResult};

    fn skills(h01: f64, rest: f64) -> Vec<SkillRecord> {
        (1..=SKILL_COUNT)
            .map(|i| SkillRecord::new(skill_id(i), if i == 1 { h01 } else { rest }))
            .collect()
    }

    fn exam(exam_id: &str, areas: Vec<(Area, u32, f64, f64)>) -> ExamResult {
        let mut result = ExamResult::empty(
            exam_id,
            &format!("Simulado {exam_id}"),
            &format!("{exam_id} 2025"),
        );
        for (area, raw, tri, h01) in areas {
            result.areas.insert(
                area,
                AreaResult {
                    raw_score: raw,
                    tri_score: tri,
                    skills: skills(h01, 50.0),
                },
            );
        }
        result
    }

    fn student(id: &str, results: Vec<ExamResult>) -> Student {
        Student {
            id: id.into(),
            name: format!("Aluno {id}"),
            results,
        }
    }

    fn roster(students: Vec<Student>) -> Roster {
        Roster::from_students(students, ExamCalendar::default())
    }

    #[test]
    fn statistics_are_ordered_by_calendar() {
        let roster = roster(vec![student(
            "1",
            vec![
                exam("outubro", vec![(Area::Matematica, 30, 700.0, 50.0)]),
                exam("abril", vec![(Area::Matematica, 20, 550.0, 50.0)]),
                exam("agosto", vec![(Area::Matematica, 25, 650.0, 50.0)]),
            ],
        )]);

        let stats = cohort_statistics(&roster, Area::Matematica);
        let ids: Vec<&str> = stats.iter().map(|s| s.exam_id.as_str()).collect();
        assert_eq!(ids, vec!["abril", "agosto", "outubro"]);
    }

    #[test]
    fn means_and_distribution_skip_absent_and_zero_scores() {
        let roster = roster(vec![
            student("1", vec![exam("abril", vec![(Area::Natureza, 20, 500.0, 0.0)])]),
            student("2", vec![exam("abril", vec![(Area::Natureza, 31, 823.45, 0.0)])]),
            student("3", vec![exam("abril", vec![(Area::Natureza, 5, 0.0, 0.0)])]),
            student("4", vec![exam("abril", vec![(Area::Humanas, 40, 600.0, 0.0)])]),
        ]);

        let stats = cohort_statistics(&roster, Area::Natureza);
        assert_eq!(stats.len(), 1);
        let abril = &stats[0];
        assert_eq!(abril.average_tri, 661.7);
        assert_eq!(abril.average_raw, 25.5);
        assert_eq!(abril.distribution.range_500_to_600, 1);
        assert_eq!(abril.distribution.above_800, 1);
        assert_eq!(abril.distribution.total(), 2);
    }

    #[test]
    fn exam_without_qualifying_students_reports_zeros() {
        let roster = roster(vec![student(
            "1",
            vec![exam("junho", vec![(Area::Humanas, 40, 600.0, 0.0)])],
        )]);

        let stats = cohort_statistics(&roster, Area::Matematica);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].average_tri, 0.0);
        assert_eq!(stats[0].average_raw, 0.0);
        assert_eq!(stats[0].distribution, ProficiencyDistribution::default());
    }

    #[test]
    fn empty_roster_has_no_statistics() {
        let roster = Roster::default();
        assert!(cohort_statistics(&roster, Area::Matematica).is_empty());
        let matrix = skill_matrix(&roster, Area::Matematica);
        assert_eq!(matrix.skills.len(), SKILL_COUNT);
        assert!(matrix.skills.iter().all(|s| s.probability == 0.0));
    }

    #[test]
    fn skill_matrix_excludes_students_without_area() {
        let roster = roster(vec![
            student("1", vec![exam("abril", vec![(Area::Matematica, 20, 600.0, 80.0)])]),
            student("2", vec![exam("abril", vec![(Area::Humanas, 20, 600.0, 10.0)])]),
        ]);

        let matrix = skill_matrix(&roster, Area::Matematica);
        assert_eq!(matrix.student_count, 1);
        assert_eq!(matrix.get("H01"), Some(80.0));
        assert_eq!(matrix.get("H30"), Some(50.0));
        assert_eq!(matrix.skills[0].id, "H01");
    }

    #[test]
    fn skill_matrix_uses_latest_available_result_per_student() {
        let roster = roster(vec![
            // Absent from the last exam: contributes the abril result.
            student(
                "1",
                vec![
                    exam("abril", vec![(Area::Matematica, 20, 600.0, 40.0)]),
                    exam("outubro", vec![(Area::Humanas, 20, 600.0, 0.0)]),
                ],
            ),
            student(
                "2",
                vec![
                    exam("abril", vec![(Area::Matematica, 20, 600.0, 10.0)]),
                    exam("outubro", vec![(Area::Matematica, 20, 600.0, 90.0)]),
                ],
            ),
        ]);

        let matrix = skill_matrix(&roster, Area::Matematica);
        assert_eq!(matrix.student_count, 2);
        assert_eq!(matrix.get("H01"), Some(65.0));
    }

    #[test]
    fn skill_averages_round_to_two_decimals() {
        let roster = roster(vec![
            student("1", vec![exam("abril", vec![(Area::Natureza, 1, 500.0, 10.0)])]),
            student("2", vec![exam("abril", vec![(Area::Natureza, 1, 500.0, 10.0)])]),
            student("3", vec![exam("abril", vec![(Area::Natureza, 1, 500.0, 11.0)])]),
        ]);
        let matrix = skill_matrix(&roster, Area::Natureza);
        assert_eq!(matrix.get("H01"), Some(10.33));
    }

    #[test]
    fn growth_between_first_and_last() {
        let roster = roster(vec![
            student(
                "1",
                vec![
                    exam("abril", vec![(Area::Matematica, 20, 500.0, 0.0)]),
                    exam("outubro", vec![(Area::Matematica, 30, 810.0, 0.0)]),
                ],
            ),
            student(
                "2",
                vec![
                    exam("abril", vec![(Area::Matematica, 20, 600.0, 0.0)]),
                    exam("outubro", vec![(Area::Matematica, 30, 790.0, 0.0)]),
                ],
            ),
        ]);
        let stats = cohort_statistics(&roster, Area::Matematica);
        let growth = growth(&stats).unwrap();
        assert_eq!(growth.initial_average, 550.0);
        assert_eq!(growth.final_average, 800.0);
        assert!((growth.absolute - 250.0).abs() < 1e-9);
        assert!((growth.percent - 45.4545).abs() < 1e-3);
        assert_eq!(growth.top_band_change, 1);
        assert!(super::growth(&[]).is_none());
    }

    #[test]
    fn growth_from_zero_mean_is_zero_percent() {
        let stats = vec![
            CohortStatistics {
                exam_id: "abril".into(),
                exam_name: "Abril".into(),
                date: String::new(),
                average_tri: 0.0,
                average_raw: 0.0,
                distribution: ProficiencyDistribution::default(),
            },
            CohortStatistics {
                exam_id: "junho".into(),
                exam_name: "Junho".into(),
                date: String::new(),
                average_tri: 600.0,
                average_raw: 20.0,
                distribution: ProficiencyDistribution::default(),
            },
        ];
        assert_eq!(growth(&stats).unwrap().percent, 0.0);
    }

    #[test]
    fn student_evolution_joins_by_exam_id() {
        let ana = student(
            "1",
            vec![
                exam("junho", vec![(Area::Matematica, 25, 650.0, 0.0)]),
                exam("abril", vec![(Area::Humanas, 20, 600.0, 0.0)]),
            ],
        );
        let bruno = student(
            "2",
            vec![exam("abril", vec![(Area::Matematica, 20, 500.0, 0.0)])],
        );
        let roster = roster(vec![ana.clone(), bruno]);
        let cohort = cohort_statistics(&roster, Area::Matematica);

        let points = student_evolution(&ana, Area::Matematica, &cohort);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].exam_id, "abril");
        assert_eq!(points[0].tri_score, None);
        assert_eq!(points[0].cohort_average, 500.0);
        assert_eq!(points[1].tri_score, Some(650.0));
        assert_eq!(points[1].raw_score, Some(25));

        assert_eq!(latest_skills(&ana, Area::Matematica, &roster).len(), SKILL_COUNT);
        assert!(latest_skills(&ana, Area::Natureza, &roster).is_empty());
    }
}
