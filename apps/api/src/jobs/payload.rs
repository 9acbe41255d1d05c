use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::jobs::section::Section;
use crate::jobs::validation::{
    require_text, validate_attachment_path, validate_attachment_paths, validate_eligibility,
    validate_fees, validate_links, validate_salary, validate_vacancies,
};
use crate::models::job::{
    Eligibility, Fee, ImportantDate, JobLink, MetaDetails, Salary, Vacancy,
};
use crate::models::serde_helpers::{double_option, double_option_date};

/// Seed for `POST /jobs/draft`. Missing keys fall back to the draft defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftSeed {
    pub post_name: Option<String>,
    pub organization: Option<String>,
    pub advt_number: Option<String>,
}

impl DraftSeed {
    /// An empty body or `null` is a seedless draft; anything else must decode.
    pub fn parse(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(DraftSeed::default());
        }
        serde_json::from_slice::<Option<DraftSeed>>(body)
            .map(Option::unwrap_or_default)
            .map_err(|e| AppError::Validation(format!("invalid draft body: {e}")))
    }
}

pub const UNTITLED_POST: &str = "Untitled Job";

/// The top-level scalar fields written by the `basicDetails` section.
/// `None` = key absent (field untouched), `Some(None)` = explicit null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicDetailsPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub post_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub organization: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub advt_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub job_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sector: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub job_category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub job_location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub experience: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub mode_of_exam: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub short_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option_date")]
    pub expiry_date: Option<Option<NaiveDate>>,
}

impl BasicDetailsPatch {
    /// True when none of the recognized keys were supplied.
    pub fn is_empty(&self) -> bool {
        *self == BasicDetailsPatch::default()
    }
}

/// Body of a full create or update (`jobData`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    #[serde(flatten)]
    pub basic: BasicDetailsPatch,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sub_category: Option<Option<String>>,
    pub meta_details: Option<Value>,
    pub dates: Option<Vec<Value>>,
    pub fees: Option<Vec<Value>>,
    pub vacancies: Option<Vec<Value>>,
    pub eligibility: Option<Value>,
    pub salary: Option<Value>,
    pub selection: Option<Vec<String>>,
    pub links: Option<Vec<Value>>,
    pub how_to_apply: Option<String>,
    pub files: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo: Option<Option<String>>,
}

impl JobPayload {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = if raw.trim().is_empty() { "{}" } else { raw };
        serde_json::from_str(raw)
            .map_err(|e| AppError::Validation(format!("jobData is not a valid job payload: {e}")))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.section_writes().iter().try_for_each(SectionWrite::validate)
    }

    /// The non-basic sections carried by this payload, in canonical order.
    pub fn section_writes(&self) -> Vec<SectionWrite> {
        [
            self.meta_details.clone().map(SectionWrite::MetaDetails),
            self.dates.clone().map(SectionWrite::Dates),
            self.fees.clone().map(SectionWrite::Fees),
            self.vacancies.clone().map(SectionWrite::Vacancies),
            self.eligibility.clone().map(SectionWrite::Eligibility),
            self.salary.clone().map(SectionWrite::Salary),
            self.selection.clone().map(SectionWrite::Selection),
            self.links.clone().map(SectionWrite::Links),
            self.how_to_apply.clone().map(SectionWrite::HowToApply),
            self.files.clone().map(SectionWrite::Files),
            self.logo.clone().map(SectionWrite::Logo),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Full create additionally needs the identifying fields.
    pub fn validate_for_create(&self) -> Result<(), AppError> {
        require_text("postName", self.basic.post_name.as_ref().and_then(|v| v.as_deref()))?;
        require_text(
            "organization",
            self.basic.organization.as_ref().and_then(|v| v.as_deref()),
        )?;
        self.validate()
    }

    /// Sections carried by this payload, in canonical order.
    pub fn present_sections(&self) -> Vec<Section> {
        let present = [
            (Section::BasicDetails, !self.basic.is_empty()),
            (Section::MetaDetails, self.meta_details.is_some()),
            (Section::Dates, self.dates.is_some()),
            (Section::Fees, self.fees.is_some()),
            (Section::Vacancies, self.vacancies.is_some()),
            (Section::Eligibility, self.eligibility.is_some()),
            (Section::Salary, self.salary.is_some()),
            (Section::Selection, self.selection.is_some()),
            (Section::Links, self.links.is_some()),
            (Section::HowToApply, self.how_to_apply.is_some()),
            (Section::Files, self.files.is_some()),
            (Section::Logo, self.logo.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(section, here)| here.then_some(section))
            .collect()
    }
}

/// A decoded, validated write to a single section. Structured sections keep
/// the value as sent so it reads back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionWrite {
    BasicDetails(BasicDetailsPatch),
    MetaDetails(Value),
    Dates(Vec<Value>),
    Fees(Vec<Value>),
    Vacancies(Vec<Value>),
    Eligibility(Value),
    Salary(Value),
    Selection(Vec<String>),
    Links(Vec<Value>),
    HowToApply(String),
    Files(Vec<String>),
    Logo(Option<String>),
}

impl SectionWrite {
    /// Decodes `data` as the bare value of `section`.
    ///
    /// A wrapped payload (`{"<section>": ...}`) is rejected rather than
    /// unwrapped.
    pub fn parse(section: Section, data: Value) -> Result<Self, AppError> {
        if let Value::Object(map) = &data {
            if map.len() == 1 && map.contains_key(section.as_str()) {
                return Err(AppError::Validation(format!(
                    "data for '{section}' must be the bare section value, not wrapped in a '{section}' key"
                )));
            }
        }

        let write = match section {
            Section::BasicDetails => {
                if !data.is_object() {
                    return Err(AppError::Validation(
                        "basicDetails data must be an object".to_string(),
                    ));
                }
                SectionWrite::BasicDetails(decode(section, data)?)
            }
            Section::MetaDetails => SectionWrite::MetaDetails(decode(section, data)?),
            Section::Dates => SectionWrite::Dates(decode(section, data)?),
            Section::Fees => SectionWrite::Fees(decode(section, data)?),
            Section::Vacancies => SectionWrite::Vacancies(decode(section, data)?),
            Section::Eligibility => SectionWrite::Eligibility(decode(section, data)?),
            Section::Salary => SectionWrite::Salary(decode(section, data)?),
            Section::Selection => SectionWrite::Selection(decode(section, data)?),
            Section::Links => SectionWrite::Links(decode(section, data)?),
            Section::HowToApply => SectionWrite::HowToApply(decode(section, data)?),
            Section::Files => SectionWrite::Files(decode(section, data)?),
            Section::Logo => SectionWrite::Logo(decode(section, data)?),
        };
        write.validate()?;
        Ok(write)
    }

    pub fn section(&self) -> Section {
        match self {
            SectionWrite::BasicDetails(_) => Section::BasicDetails,
            SectionWrite::MetaDetails(_) => Section::MetaDetails,
            SectionWrite::Dates(_) => Section::Dates,
            SectionWrite::Fees(_) => Section::Fees,
            SectionWrite::Vacancies(_) => Section::Vacancies,
            SectionWrite::Eligibility(_) => Section::Eligibility,
            SectionWrite::Salary(_) => Section::Salary,
            SectionWrite::Selection(_) => Section::Selection,
            SectionWrite::Links(_) => Section::Links,
            SectionWrite::HowToApply(_) => Section::HowToApply,
            SectionWrite::Files(_) => Section::Files,
            SectionWrite::Logo(_) => Section::Logo,
        }
    }

    /// Checks the value against its section shape and content rules.
    pub fn validate(&self) -> Result<(), AppError> {
        let section = self.section();
        match self {
            SectionWrite::MetaDetails(v) => check_object::<MetaDetails>(section, v).map(|_| ()),
            SectionWrite::Dates(items) => check_items::<ImportantDate>(section, items).map(|_| ()),
            SectionWrite::Fees(items) => validate_fees(&check_items::<Fee>(section, items)?),
            SectionWrite::Vacancies(items) => {
                validate_vacancies(&check_items::<Vacancy>(section, items)?)
            }
            SectionWrite::Eligibility(v) => {
                validate_eligibility(&check_object::<Eligibility>(section, v)?)
            }
            SectionWrite::Salary(v) => validate_salary(&check_object::<Salary>(section, v)?),
            SectionWrite::Links(items) => validate_links(&check_items::<JobLink>(section, items)?),
            SectionWrite::Files(files) => validate_attachment_paths(files),
            SectionWrite::Logo(Some(logo)) => validate_attachment_path(logo),
            _ => Ok(()),
        }
    }
}

fn decode<T: DeserializeOwned>(section: Section, data: Value) -> Result<T, AppError> {
    serde_json::from_value(data)
        .map_err(|e| AppError::Validation(format!("invalid data for section '{section}': {e}")))
}

fn check_object<T: DeserializeOwned>(section: Section, data: &Value) -> Result<T, AppError> {
    if !data.is_object() {
        return Err(AppError::Validation(format!("{section} data must be an object")));
    }
    decode(section, data.clone())
}

fn check_items<T: DeserializeOwned>(section: Section, items: &[Value]) -> Result<Vec<T>, AppError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(AppError::Validation(format!("{section}[{i}] must be an object")));
            }
            serde_json::from_value(item.clone()).map_err(|e| {
                AppError::Validation(format!("invalid data for {section}[{i}]: {e}"))
            })
        })
        .collect()
}
