//! The `cohortlens skills` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use cohortlens_core::model::Area;
use cohortlens_core::statistics::skill_matrix;

use super::{load_roster, CorpusArgs};

pub async fn execute(area: Area, format: String, args: CorpusArgs) -> Result<()> {
    let (_, roster) = load_roster(&args).await?;
    let matrix = skill_matrix(&roster, area);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&matrix)?);
        }
        "table" => {
            println!(
                "{area}: mastery over {} student(s), latest result each",
                matrix.student_count
            );

            // Three skills per row keeps the 30-skill matrix compact.
            let mut table = Table::new();
            table.set_header(vec!["Skill", "Mastery", "Skill", "Mastery", "Skill", "Mastery"]);
            for chunk in matrix.skills.chunks(3) {
                let mut row = Vec::with_capacity(6);
                for skill in chunk {
                    row.push(Cell::new(&skill.id));
                    row.push(Cell::new(format!("{:.2}%", skill.probability)));
                }
                table.add_row(row);
            }
            println!("{table}");
        }
        other => anyhow::bail!("unknown format: '{other}' (expected table or json)"),
    }

    Ok(())
}
