//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use cohortlens_core::report::DashboardReport;

const SKILLS: usize = 30;

fn cohortlens(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cohortlens").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("COHORTLENS_GEMINI_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// One area block: header, raw row, scaled row and 30 skill rows.
fn block(header: &str, raws: &[&str], scaled: &[&str], mastery: &str) -> Vec<String> {
    let mut rows = vec![
        format!("{header};"),
        format!("ACERTOS;{}", raws.join(";")),
        format!("NOTA;{}", scaled.join(";")),
    ];
    for i in 1..=SKILLS {
        rows.push(format!("H{i:02};{}", vec![mastery; raws.len()].join(";")));
    }
    rows.push(";;".to_string());
    rows
}

fn sheet(names: &[&str], blocks: Vec<Vec<String>>) -> String {
    let mut rows = vec![
        format!("\u{feff}NOME;{}", names.join(";")),
        format!("COLOCAÇÃO;{}", vec!["1"; names.len()].join(";")),
        format!("MÉDIA GERAL;{}", vec!["600,0"; names.len()].join(";")),
    ];
    for b in blocks {
        rows.extend(b);
    }
    rows.join("\n")
}

const CORPUS: &str = r#"
exam_order = ["abril", "outubro"]

[[sheets]]
path = "abril-2.csv"
exam_id = "abril"
exam_name = "1. Simulado Abril"
date = "Abril 2025"
areas = ["natureza", "matematica"]

[[sheets]]
path = "outubro-2.csv"
exam_id = "outubro"
exam_name = "5. Simulado Outubro"
date = "Outubro 2025"
areas = ["natureza", "matematica"]
"#;

/// A two-exam corpus with three students; Carla misses the April exam.
fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();

    std::fs::write(
        data.join("abril-2.csv"),
        sheet(
            &["Ana Souza", "Bruno Lima", "Carla Dias"],
            vec![
                block("NATUREZA", &["20", "18", ""], &["500,0", "540,0", ""], "40,0"),
                block("MATEMÁTICA", &["25", "22", ""], &["600,0", "580,0", ""], "50,0"),
            ],
        ),
    )
    .unwrap();
    std::fs::write(
        data.join("outubro-2.csv"),
        sheet(
            &["Ana Souza", "Bruno Lima", "Carla Dias"],
            vec![
                block("NATUREZA", &["30", "26", "24"], &["620,0", "600,0", "580,0"], "70,0"),
                block("MATEMÁTICA", &["38", "30", "29"], &["820,0", "700,0", "640,0"], "80,0"),
            ],
        ),
    )
    .unwrap();
    std::fs::write(dir.path().join("corpus.toml"), CORPUS).unwrap();
    std::fs::write(
        dir.path().join("cohortlens.toml"),
        "corpus = \"corpus.toml\"\ndata_dir = \"data\"\n",
    )
    .unwrap();

    dir
}

#[test]
fn stats_table() {
    let dir = fixture();

    cohortlens(dir.path())
        .args(["stats", "--area", "matematica"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 students"))
        .stdout(predicate::str::contains("1. Simulado Abril"))
        .stdout(predicate::str::contains("590.0"))
        .stdout(predicate::str::contains("720.0"))
        .stdout(predicate::str::contains("+130.0 points"));
}

#[test]
fn stats_json_counts_only_present_students() {
    let dir = fixture();

    let output = cohortlens(dir.path())
        .args(["stats", "--area", "natureza", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let stats = stats.as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["exam_id"], "abril");
    assert_eq!(stats[0]["average_tri"], 520.0);
    assert_eq!(stats[0]["distribution"]["range_500_to_600"], 2);
    assert_eq!(stats[1]["average_tri"], 600.0);
}

#[test]
fn stats_unknown_area() {
    let dir = fixture();

    cohortlens(dir.path())
        .args(["stats", "--area", "quimica"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown area"));
}

#[test]
fn skills_use_latest_result() {
    let dir = fixture();

    cohortlens(dir.path())
        .args(["skills", "--area", "matematica"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 student(s)"))
        .stdout(predicate::str::contains("H01"))
        .stdout(predicate::str::contains("H30"))
        .stdout(predicate::str::contains("80.00%"));
}

#[test]
fn student_by_name_and_id() {
    let dir = fixture();

    cohortlens(dir.path())
        .args(["student", "Carla Dias", "--area", "matematica"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Carla Dias (id 3)"))
        .stdout(predicate::str::contains("640.0"))
        .stdout(predicate::str::contains("-80.0"));

    cohortlens(dir.path())
        .args(["student", "1", "--area", "natureza", "--weakest", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana Souza"))
        .stdout(predicate::str::contains("Weakest skills"));
}

#[test]
fn student_not_found() {
    let dir = fixture();

    cohortlens(dir.path())
        .args(["student", "Nobody", "--area", "natureza"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn summary_falls_back_without_backend() {
    let dir = fixture();

    cohortlens(dir.path())
        .args(["summary", "--area", "matematica"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Análise Executiva - Matemática"))
        .stdout(predicate::str::contains("**22.0%**"));
}

#[test]
fn summary_falls_back_when_backend_unreachable() {
    let dir = fixture();
    std::fs::write(
        dir.path().join("cohortlens.toml"),
        r#"corpus = "corpus.toml"
data_dir = "data"
default_provider = "local"

[providers.local]
type = "ollama"
base_url = "http://127.0.0.1:9"
"#,
    )
    .unwrap();

    cohortlens(dir.path())
        .args(["summary", "--area", "natureza"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Análise Executiva"));
}

#[test]
fn report_writes_json() {
    let dir = fixture();
    let out = dir.path().join("out");

    cohortlens(dir.path())
        .args(["report", "--area", "matematica", "--summary", "--offline"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let files: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
    assert_eq!(files.len(), 1);
    let path = files[0].as_ref().unwrap().path();
    assert!(path.to_string_lossy().contains("report-matematica-"));

    let report = DashboardReport::load_json(&path).unwrap();
    assert_eq!(report.student_count, 3);
    assert_eq!(report.cohort.len(), 2);
    assert!(report.summary.is_some());
}

#[test]
fn report_all_areas_markdown() {
    let dir = fixture();
    let out = dir.path().join("out");

    cohortlens(dir.path())
        .args(["report", "--format", "all"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 8);
}

#[test]
fn validate_manifest_and_sheets() {
    let dir = fixture();

    cohortlens(dir.path())
        .args(["validate", "--sheets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Corpus: 2 sheets, 2 exams"))
        .stdout(predicate::str::contains("has 1 sheet(s), expected 2"))
        .stdout(predicate::str::contains("3 students across 2 exams"));
}

#[test]
fn validate_reports_missing_sheet() {
    let dir = fixture();
    std::fs::remove_file(dir.path().join("data").join("abril-2.csv")).unwrap();

    cohortlens(dir.path())
        .args(["validate", "--sheets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("source unavailable"));
}

#[test]
fn missing_data_still_succeeds() {
    let dir = fixture();
    let empty = dir.path().join("empty");
    std::fs::create_dir_all(&empty).unwrap();

    cohortlens(dir.path())
        .args(["stats", "--area", "humanas", "--data-dir"])
        .arg(&empty)
        .assert()
        .success()
        .stderr(predicate::str::contains("no students loaded"));
}

#[test]
fn bad_manifest_fails() {
    let dir = fixture();
    std::fs::write(dir.path().join("broken.toml"), "sheets = 3").unwrap();

    cohortlens(dir.path())
        .args(["validate", "--corpus", "broken.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    cohortlens(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created cohortlens.toml"))
        .stdout(predicate::str::contains("Created corpus.toml"));

    assert!(dir.path().join("data").is_dir());

    // The generated manifest is the default ten-sheet corpus.
    cohortlens(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Corpus: 10 sheets, 5 exams"))
        .stdout(predicate::str::contains("Corpus valid."));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    cohortlens(dir.path()).arg("init").assert().success();

    cohortlens(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();

    cohortlens(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cohort analytics"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();

    cohortlens(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cohortlens"));
}
