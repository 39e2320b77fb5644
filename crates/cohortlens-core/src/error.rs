//! Sheet loading error types.
//!
//! None of these abort a corpus load. A fatal error for one sheet drops
//! that sheet's contribution; the rest are collected as warnings alongside
//! whatever the parser could recover.

use thiserror::Error;

use crate::model::Area;

/// Which row of an area block the parser was waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRow {
    Raw,
    Scaled,
    Skill(usize),
}

impl std::fmt::Display for BlockRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockRow::Raw => write!(f, "raw-score row"),
            BlockRow::Scaled => write!(f, "scaled-score row"),
            BlockRow::Skill(n) => write!(f, "skill row H{:02}", n + 1),
        }
    }
}

/// Problems found while fetching or parsing one exam sheet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    /// The sheet could not be fetched or read.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The sheet is too short to hold any area block.
    #[error("sheet has {found} non-blank rows, at least {required} required")]
    InsufficientRows { found: usize, required: usize },

    /// A declared area never appeared in the sheet.
    #[error("area {0} not found")]
    AreaNotFound(Area),

    /// The sheet ended in the middle of an area block.
    #[error("area {area} block ends before its {expected}")]
    TruncatedBlock { area: Area, expected: BlockRow },
}

impl SheetError {
    /// Returns `true` if the whole sheet was discarded.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SheetError::SourceUnavailable(_) | SheetError::InsufficientRows { .. }
        )
    }
}
