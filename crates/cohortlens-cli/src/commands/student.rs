//! The `cohortlens student` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use cohortlens_core::model::Area;
use cohortlens_core::statistics::{cohort_statistics, latest_skills, student_evolution};

use super::{load_roster, CorpusArgs};

pub async fn execute(student: String, area: Area, weakest: usize, args: CorpusArgs) -> Result<()> {
    let (_, roster) = load_roster(&args).await?;

    let Some(found) = roster
        .student_by_id(&student)
        .or_else(|| roster.student_by_name(student.trim()))
    else {
        anyhow::bail!("student '{student}' not found");
    };

    println!("{} (id {}) - {area}", found.name, found.id);

    let cohort = cohort_statistics(&roster, area);
    let mut table = Table::new();
    table.set_header(vec!["Exam", "TRI", "Raw", "Cohort mean", "vs cohort"]);
    for point in student_evolution(found, area, &cohort) {
        let (tri, raw, delta) = match (point.tri_score, point.raw_score) {
            (Some(tri), Some(raw)) => (
                format!("{tri:.1}"),
                raw.to_string(),
                format!("{:+.1}", tri - point.cohort_average),
            ),
            _ => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(&point.exam_name),
            Cell::new(tri),
            Cell::new(raw),
            Cell::new(format!("{:.1}", point.cohort_average)),
            Cell::new(delta),
        ]);
    }
    println!("{table}");

    let mut skills = latest_skills(found, area, &roster);
    if skills.is_empty() {
        println!("\nNo skill data for {area}.");
        return Ok(());
    }

    skills.sort_by(|a, b| a.probability.total_cmp(&b.probability));
    println!("\nWeakest skills (latest exam):");
    for skill in skills.iter().take(weakest) {
        println!("  {}  {:.1}%", skill.id, skill.probability);
    }

    Ok(())
}
