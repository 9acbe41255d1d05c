use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::jobs::section::Section;
use crate::models::job::JobRecord;

/// How far a record has progressed through section-by-section entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Draft,
    InProgress,
    Complete,
}

impl CompletionStatus {
    pub fn from_saved(saved: &[Section]) -> Self {
        if saved.is_empty() {
            CompletionStatus::Draft
        } else if Section::REQUIRED.iter().all(|s| saved.contains(s)) {
            CompletionStatus::Complete
        } else {
            CompletionStatus::InProgress
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Draft => "draft",
            CompletionStatus::InProgress => "in_progress",
            CompletionStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CompletionStatus::Draft),
            "in_progress" => Ok(CompletionStatus::InProgress),
            "complete" => Ok(CompletionStatus::Complete),
            other => Err(format!("unknown completion status '{other}'")),
        }
    }
}

impl JobRecord {
    /// Records sections as written and re-derives `status`.
    pub fn mark_saved(&mut self, sections: &[Section]) {
        for section in sections {
            if !self.saved_sections.contains(section) {
                self.saved_sections.push(*section);
            }
        }
        self.status = CompletionStatus::from_saved(&self.saved_sections);
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub status: CompletionStatus,
    pub saved_sections: Vec<Section>,
    pub missing_sections: Vec<Section>,
}

pub fn completion_report(record: &JobRecord) -> CompletionReport {
    CompletionReport {
        status: record.status,
        saved_sections: record.saved_sections.clone(),
        missing_sections: Section::REQUIRED
            .into_iter()
            .filter(|s| !record.saved_sections.contains(s))
            .collect(),
    }
}
