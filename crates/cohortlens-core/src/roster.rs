//! Student roster: folds parsed sheets into per-student exam histories.

use std::collections::HashMap;

use crate::model::{ExamCalendar, ExamResult, Student};
use crate::parser::ParsedSheet;

/// Identity of one exam as first seen in the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamInfo {
    pub exam_id: String,
    pub exam_name: String,
    pub date: String,
}

/// Every student seen across the corpus, in first-seen order.
///
/// Students are joined across sheets by exact (trimmed) display name. Two
/// spellings of the same person produce two students.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<Student>,
    calendar: ExamCalendar,
    by_name: HashMap<String, usize>,
}

impl Roster {
    pub fn new(calendar: ExamCalendar) -> Self {
        Self {
            students: Vec::new(),
            calendar,
            by_name: HashMap::new(),
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn calendar(&self) -> &ExamCalendar {
        &self.calendar
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn student_by_id(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn student_by_name(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    /// Fold one sheet's partial results into the roster.
    pub fn merge_sheet(&mut self, sheet: ParsedSheet) {
        for (name, result) in sheet.results {
            self.merge_result(&name, result);
        }
    }

    /// Merge one partial exam result for the student called `name`.
    ///
    /// A new name creates a student with the next sequential id. An existing
    /// result for the same exam receives the new areas; otherwise the result
    /// is appended.
    pub fn merge_result(&mut self, name: &str, result: ExamResult) {
        let index = match self.by_name.get(name) {
            Some(&index) => index,
            None => {
                let index = self.students.len();
                self.students.push(Student {
                    id: (index + 1).to_string(),
                    name: name.to_string(),
                    results: Vec::new(),
                });
                self.by_name.insert(name.to_string(), index);
                index
            }
        };

        let student = &mut self.students[index];
        match student
            .results
            .iter_mut()
            .find(|r| r.exam_id == result.exam_id)
        {
            Some(existing) => existing.areas.extend(result.areas),
            None => student.results.push(result),
        }
    }

    /// Distinct exam ids in canonical order.
    ///
    /// Ids missing from the calendar follow the known ones in first-seen
    /// order. Each id is paired with the display name and date of its first
    /// occurrence.
    pub fn exams(&self) -> Vec<ExamInfo> {
        let mut seen: Vec<ExamInfo> = Vec::new();
        for result in self.students.iter().flat_map(|s| s.results.iter()) {
            if !seen.iter().any(|e| e.exam_id == result.exam_id) {
                seen.push(ExamInfo {
                    exam_id: result.exam_id.clone(),
                    exam_name: result.exam_name.clone(),
                    date: result.date.clone(),
                });
            }
        }
        // Stable sort keeps first-seen order among unknown ids.
        seen.sort_by_key(|e| self.calendar.rank(&e.exam_id));
        seen
    }

    /// Build a roster from already-assembled students.
    pub fn from_students(students: Vec<Student>, calendar: ExamCalendar) -> Self {
        let by_name = students
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();
        Self {
            students,
            calendar,
            by_name,
        }
    }
}
