use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A named, independently addressable part of a job record.
///
/// `BasicDetails` is not a subtree of its own: saving it writes the
/// top-level scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    BasicDetails,
    MetaDetails,
    Dates,
    Fees,
    Vacancies,
    Eligibility,
    Salary,
    Selection,
    Links,
    HowToApply,
    Files,
    Logo,
}

impl Section {
    pub const ALL: [Section; 12] = [
        Section::BasicDetails,
        Section::MetaDetails,
        Section::Dates,
        Section::Fees,
        Section::Vacancies,
        Section::Eligibility,
        Section::Salary,
        Section::Selection,
        Section::Links,
        Section::HowToApply,
        Section::Files,
        Section::Logo,
    ];

    /// Sections that must each be saved once before a record is complete.
    pub const REQUIRED: [Section; 10] = [
        Section::BasicDetails,
        Section::Dates,
        Section::Fees,
        Section::Vacancies,
        Section::Eligibility,
        Section::Salary,
        Section::Selection,
        Section::Links,
        Section::HowToApply,
        Section::MetaDetails,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::BasicDetails => "basicDetails",
            Section::MetaDetails => "metaDetails",
            Section::Dates => "dates",
            Section::Fees => "fees",
            Section::Vacancies => "vacancies",
            Section::Eligibility => "eligibility",
            Section::Salary => "salary",
            Section::Selection => "selection",
            Section::Links => "links",
            Section::HowToApply => "howToApply",
            Section::Files => "files",
            Section::Logo => "logo",
        }
    }

    /// Whether the section holds an ordered sequence of items.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Section::Dates
                | Section::Fees
                | Section::Vacancies
                | Section::Selection
                | Section::Links
                | Section::Files
        )
    }

    pub fn is_required(&self) -> bool {
        Section::REQUIRED.contains(self)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownSection(pub String);

impl fmt::Display for UnknownSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section '{}'", self.0)
    }
}

impl From<UnknownSection> for AppError {
    fn from(e: UnknownSection) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_name() {
        for section in Section::ALL {
            assert_eq!(section.as_str().parse::<Section>(), Ok(section));
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Dates".parse::<Section>().is_err());
        assert!("".parse::<Section>().is_err());
        assert!("__proto__".parse::<Section>().is_err());
    }

    #[test]
    fn test_array_sections() {
        let arrays: Vec<_> = Section::ALL.into_iter().filter(Section::is_array).collect();
        assert_eq!(
            arrays,
            vec![
                Section::Dates,
                Section::Fees,
                Section::Vacancies,
                Section::Selection,
                Section::Links,
                Section::Files
            ]
        );
    }

    #[test]
    fn test_attachments_are_optional() {
        assert!(!Section::Files.is_required());
        assert!(!Section::Logo.is_required());
        assert!(Section::BasicDetails.is_required());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&Section::HowToApply).unwrap(),
            "\"howToApply\""
        );
    }
}
