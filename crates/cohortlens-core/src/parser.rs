//! Exam sheet parser.
//!
//! Reads one `;`-delimited sheet export (one exam, one day) and rebuilds a
//! partial [`ExamResult`] per student for the areas the sheet declares.
//!
//! Sheet layout, counted over non-blank rows:
//!
//! ```text
//! row 0      NOME;<student>;<student>;...
//! row 1      rank row (ignored)
//! row 2      overall average row (ignored)
//! row 3..    area blocks:
//!              <AREA HEADER>;...
//!              raw scores;<n>;<n>;...
//!              scaled scores;<x,y>;...
//!              H01..H30 mastery rows;<x,y>;...
//!              separator row
//! ```

use std::collections::HashMap;

use crate::corpus::SheetSpec;
use crate::error::{BlockRow, SheetError};
use crate::model::{skill_id, Area, AreaResult, ExamResult, SkillRecord, SKILL_COUNT};

/// Sheets with fewer non-blank rows than this are rejected outright.
pub const MIN_ROWS: usize = 10;

/// Index of the first row that may hold an area header.
const FIRST_BLOCK_ROW: usize = 3;

/// The outcome of parsing one sheet.
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    /// Partial results keyed by student name, in header column order.
    pub results: Vec<(String, ExamResult)>,
    /// Non-fatal problems (missing or truncated area blocks).
    pub warnings: Vec<SheetError>,
}

impl ParsedSheet {
    pub fn get(&self, name: &str) -> Option<&ExamResult> {
        self.results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }
}

/// Parse a decimal cell that may use `,` as the decimal separator.
///
/// Blank or unparseable cells read as 0.
pub fn parse_decimal(cell: &str) -> f64 {
    let cell = cell.trim();
    if cell.is_empty() {
        return 0.0;
    }
    cell.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a correct-answer count. Fractions are truncated; negatives and
/// garbage read as 0.
pub fn parse_count(cell: &str) -> u32 {
    let value = parse_decimal(cell);
    if value > 0.0 {
        value.trunc() as u32
    } else {
        0
    }
}

/// Split raw sheet text into trimmed rows, dropping a leading BOM and blank
/// lines.
///
/// Quotes are literal: every line is exactly one row.
pub fn read_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => Some(record.iter().map(str::to_string).collect::<Vec<_>>()),
            Err(e) => {
                tracing::debug!("skipping unreadable row: {e}");
                None
            }
        })
        .filter(|row| row.len() > 1 || row.first().is_some_and(|c| !c.is_empty()))
        .collect()
}

/// Parse one sheet according to `spec`.
///
/// Only [`SheetError::InsufficientRows`] is returned as an error; missing or
/// truncated area blocks are reported in [`ParsedSheet::warnings`].
pub fn parse_sheet(text: &str, spec: &SheetSpec) -> Result<ParsedSheet, SheetError> {
    let rows = read_rows(text);
    if rows.len() < MIN_ROWS {
        return Err(SheetError::InsufficientRows {
            found: rows.len(),
            required: MIN_ROWS,
        });
    }

    let mut sheet = ParsedSheet::default();
    let mut index: HashMap<String, usize> = HashMap::new();
    // (column, entry) pairs; column 0 is the row label.
    let mut columns: Vec<(usize, usize)> = Vec::new();

    for (column, name) in rows[0].iter().enumerate().skip(1) {
        if name.is_empty() {
            continue;
        }
        let entry = *index.entry(name.clone()).or_insert_with(|| {
            sheet.results.push((
                name.clone(),
                ExamResult::empty(&spec.exam_id, &spec.exam_name, &spec.date),
            ));
            sheet.results.len() - 1
        });
        columns.push((column, entry));
    }

    let mut reader = BlockReader::new(&spec.areas);
    let mut row_index = FIRST_BLOCK_ROW;
    while row_index < rows.len() && !reader.is_done() {
        if reader.feed(&rows[row_index]) == Feed::Consumed {
            row_index += 1;
        }
        for block in reader.take_completed() {
            block.assign(&columns, &mut sheet.results);
        }
    }

    let (partial, warnings) = reader.finish();
    if let Some(block) = partial {
        block.assign(&columns, &mut sheet.results);
    }
    sheet.warnings = warnings;

    tracing::debug!(
        exam = %spec.exam_id,
        students = sheet.results.len(),
        warnings = sheet.warnings.len(),
        "parsed sheet"
    );

    Ok(sheet)
}

/// Where the block reader is within the current area block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    ExpectAreaHeader,
    ExpectRawRow,
    ExpectScaledRow,
    /// Waiting for skill row `n` (0-based).
    ExpectSkillRow(usize),
    ExpectSeparator,
}

#[derive(Debug, PartialEq, Eq)]
enum Feed {
    Consumed,
    /// The row must be fed again in the new state.
    Reprocess,
}

/// Rows collected for one area block.
#[derive(Debug)]
struct AreaBlock<'a> {
    area: Area,
    raw: &'a [String],
    scaled: &'a [String],
    skills: Vec<&'a [String]>,
}

impl AreaBlock<'_> {
    /// Write this block's per-student results into `results`.
    ///
    /// Students with a blank raw or scaled cell are absent and get nothing.
    fn assign(&self, columns: &[(usize, usize)], results: &mut [(String, ExamResult)]) {
        for &(column, entry) in columns {
            let raw = cell(self.raw, column);
            let scaled = cell(self.scaled, column);
            if raw.is_empty() || scaled.is_empty() {
                continue;
            }

            let skills = (0..SKILL_COUNT)
                .map(|i| {
                    let probability = self
                        .skills
                        .get(i)
                        .map(|row| parse_decimal(cell(row, column)))
                        .unwrap_or(0.0);
                    SkillRecord::new(skill_id(i + 1), probability)
                })
                .collect();

            results[entry].1.areas.insert(
                self.area,
                AreaResult {
                    raw_score: parse_count(raw),
                    tri_score: parse_decimal(scaled),
                    skills,
                },
            );
        }
    }
}

fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(String::as_str).unwrap_or("")
}

fn row_area(row: &[String]) -> Option<Area> {
    row.first().and_then(|c| Area::from_sheet_header(c))
}

/// State machine that walks rows and cuts them into area blocks, in the
/// order the sheet declares its areas.
struct BlockReader<'a> {
    expected: &'a [Area],
    next: usize,
    state: BlockState,
    current: Option<AreaBlock<'a>>,
    completed: Vec<AreaBlock<'a>>,
}

impl<'a> BlockReader<'a> {
    fn new(expected: &'a [Area]) -> Self {
        Self {
            expected,
            next: 0,
            state: BlockState::ExpectAreaHeader,
            current: None,
            completed: Vec::new(),
        }
    }

    fn is_done(&self) -> bool {
        self.state == BlockState::ExpectAreaHeader && self.next >= self.expected.len()
    }

    fn take_completed(&mut self) -> Vec<AreaBlock<'a>> {
        std::mem::take(&mut self.completed)
    }

    fn feed(&mut self, row: &'a [String]) -> Feed {
        match self.state {
            BlockState::ExpectAreaHeader => {
                let Some(&wanted) = self.expected.get(self.next) else {
                    return Feed::Consumed;
                };
                // Unexpected or unknown rows are skipped while scanning.
                if row_area(row) == Some(wanted) {
                    self.current = Some(AreaBlock {
                        area: wanted,
                        raw: &[],
                        scaled: &[],
                        skills: Vec::with_capacity(SKILL_COUNT),
                    });
                    self.state = BlockState::ExpectRawRow;
                }
                Feed::Consumed
            }
            BlockState::ExpectRawRow => {
                if let Some(block) = self.current.as_mut() {
                    block.raw = row;
                }
                self.state = BlockState::ExpectScaledRow;
                Feed::Consumed
            }
            BlockState::ExpectScaledRow => {
                if let Some(block) = self.current.as_mut() {
                    block.scaled = row;
                }
                self.state = BlockState::ExpectSkillRow(0);
                Feed::Consumed
            }
            BlockState::ExpectSkillRow(n) => {
                if let Some(block) = self.current.as_mut() {
                    block.skills.push(row);
                }
                if n + 1 == SKILL_COUNT {
                    if let Some(block) = self.current.take() {
                        self.completed.push(block);
                    }
                    self.next += 1;
                    self.state = BlockState::ExpectSeparator;
                } else {
                    self.state = BlockState::ExpectSkillRow(n + 1);
                }
                Feed::Consumed
            }
            BlockState::ExpectSeparator => {
                self.state = BlockState::ExpectAreaHeader;
                if row_area(row).is_some() {
                    Feed::Reprocess
                } else {
                    Feed::Consumed
                }
            }
        }
    }

    /// Close the reader at end of input.
    ///
    /// Returns a block cut short inside its skill rows (missing skills read
    /// as 0) together with every warning.
    fn finish(mut self) -> (Option<AreaBlock<'a>>, Vec<SheetError>) {
        let mut warnings = Vec::new();
        let mut partial = None;

        match self.state {
            BlockState::ExpectRawRow | BlockState::ExpectScaledRow => {
                if let Some(block) = self.current.take() {
                    let expected = if self.state == BlockState::ExpectRawRow {
                        BlockRow::Raw
                    } else {
                        BlockRow::Scaled
                    };
                    warnings.push(SheetError::TruncatedBlock {
                        area: block.area,
                        expected,
                    });
                }
                self.next += 1;
            }
            BlockState::ExpectSkillRow(n) => {
                if let Some(block) = self.current.take() {
                    warnings.push(SheetError::TruncatedBlock {
                        area: block.area,
                        expected: BlockRow::Skill(n),
                    });
                    partial = Some(block);
                }
                self.next += 1;
            }
            BlockState::ExpectAreaHeader | BlockState::ExpectSeparator => {}
        }

        for &area in self.expected.iter().skip(self.next) {
            warnings.push(SheetError::AreaNotFound(area));
        }

        (partial, warnings)
    }
}
