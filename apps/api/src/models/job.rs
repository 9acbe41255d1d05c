use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::jobs::completion::CompletionStatus;
use crate::jobs::section::Section;
use crate::models::serde_helpers::{lenient_date, lenient_flag, lenient_number};

// ────────────────────────────────────────────────────────────────────────────
// Section shapes
//
// Structured sections are stored exactly as saved. These views only check
// that a saved value has the right shape; they accept what form inputs send
// (`""` for unset numbers and dates, `"Yes"`/`"No"` flags) and ignore keys
// they do not know.
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaDetails {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub schemas: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportantDate {
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fee {
    pub category: Option<String>,
    /// The dashboard sends this as `fee`.
    #[serde(alias = "fee", deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vacancy {
    pub post_name: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub total: Option<f64>,
    #[serde(rename = "UR", deserialize_with = "lenient_number")]
    pub ur: Option<f64>,
    #[serde(rename = "EWS", deserialize_with = "lenient_number")]
    pub ews: Option<f64>,
    #[serde(rename = "OBC", deserialize_with = "lenient_number")]
    pub obc: Option<f64>,
    #[serde(rename = "SC", deserialize_with = "lenient_number")]
    pub sc: Option<f64>,
    #[serde(rename = "ST", deserialize_with = "lenient_number")]
    pub st: Option<f64>,
    #[serde(rename = "PwBD", deserialize_with = "lenient_number")]
    pub pwbd: Option<f64>,
    pub extra_requirements: Option<String>,
}

impl Vacancy {
    pub fn counts(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("total", self.total),
            ("UR", self.ur),
            ("EWS", self.ews),
            ("OBC", self.obc),
            ("SC", self.sc),
            ("ST", self.st),
            ("PwBD", self.pwbd),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Eligibility {
    pub qualification: Option<String>,
    #[serde(deserialize_with = "lenient_flag")]
    pub final_year_eligible: Option<bool>,
    #[serde(deserialize_with = "lenient_number")]
    pub age_min: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub age_max: Option<f64>,
    pub age_relaxation: Option<String>,
    #[serde(deserialize_with = "lenient_flag")]
    pub gate_required: Option<bool>,
    pub gate_codes: Option<String>,
    pub extra_requirements: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Salary {
    pub pay_scale: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub in_hand: Option<f64>,
    pub allowances: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobLink {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub label: Option<String>,
    pub url: Option<String>,
}

pub fn empty_meta_details() -> Value {
    json!({"title": "", "description": "", "keywords": "", "schemas": ""})
}

pub fn empty_eligibility() -> Value {
    json!({
        "qualification": "",
        "finalYearEligible": false,
        "ageMin": null,
        "ageMax": null,
        "ageRelaxation": "",
        "gateRequired": false,
        "gateCodes": "",
        "extraRequirements": ""
    })
}

pub fn empty_salary() -> Value {
    json!({"payScale": "", "inHand": null, "allowances": ""})
}

// ────────────────────────────────────────────────────────────────────────────
// Job record (wire shape)
// ────────────────────────────────────────────────────────────────────────────

/// One job posting. Every section is always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: Uuid,

    pub post_name: Option<String>,
    pub organization: Option<String>,
    pub advt_number: Option<String>,
    pub job_type: Option<String>,
    pub sector: Option<String>,
    pub job_category: Option<String>,
    pub job_location: Option<String>,
    pub experience: Option<String>,
    pub mode_of_exam: Option<String>,
    pub short_description: Option<String>,
    pub expiry_date: Option<NaiveDate>,

    pub category: Option<String>,
    pub sub_category: Option<String>,

    pub meta_details: Value,
    pub dates: Vec<Value>,
    pub fees: Vec<Value>,
    pub vacancies: Vec<Value>,
    pub eligibility: Value,
    pub salary: Value,
    pub selection: Vec<String>,
    pub links: Vec<Value>,
    pub how_to_apply: String,
    pub files: Vec<String>,
    pub logo: Option<String>,

    pub saved_sections: Vec<Section>,
    pub status: CompletionStatus,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// A record with every section in its canonical empty shape.
    pub fn empty(id: Uuid, now: DateTime<Utc>) -> Self {
        JobRecord {
            id,
            post_name: None,
            organization: None,
            advt_number: None,
            job_type: None,
            sector: None,
            job_category: None,
            job_location: None,
            experience: None,
            mode_of_exam: None,
            short_description: None,
            expiry_date: None,
            category: None,
            sub_category: None,
            meta_details: empty_meta_details(),
            dates: Vec::new(),
            fees: Vec::new(),
            vacancies: Vec::new(),
            eligibility: empty_eligibility(),
            salary: empty_salary(),
            selection: Vec::new(),
            links: Vec::new(),
            how_to_apply: String::new(),
            files: Vec::new(),
            logo: None,
            saved_sections: Vec::new(),
            status: CompletionStatus::Draft,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Every attachment path referenced by this record.
    pub fn attachment_paths(&self) -> Vec<String> {
        self.files.iter().cloned().chain(self.logo.clone()).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Database row
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub post_name: Option<String>,
    pub organization: Option<String>,
    pub advt_number: Option<String>,
    pub job_type: Option<String>,
    pub sector: Option<String>,
    pub job_category: Option<String>,
    pub job_location: Option<String>,
    pub experience: Option<String>,
    pub mode_of_exam: Option<String>,
    pub short_description: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub meta_details: Json<Value>,
    pub dates: Json<Vec<Value>>,
    pub fees: Json<Vec<Value>>,
    pub vacancies: Json<Vec<Value>>,
    pub eligibility: Json<Value>,
    pub salary: Json<Value>,
    pub selection: Json<Vec<String>>,
    pub links: Json<Vec<Value>>,
    pub how_to_apply: String,
    pub files: Json<Vec<String>>,
    pub logo: Option<String>,
    pub saved_sections: Vec<String>,
    pub status: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        let saved_sections: Vec<Section> = row
            .saved_sections
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        let status = row
            .status
            .parse()
            .unwrap_or_else(|_| CompletionStatus::from_saved(&saved_sections));

        JobRecord {
            id: row.id,
            post_name: row.post_name,
            organization: row.organization,
            advt_number: row.advt_number,
            job_type: row.job_type,
            sector: row.sector,
            job_category: row.job_category,
            job_location: row.job_location,
            experience: row.experience,
            mode_of_exam: row.mode_of_exam,
            short_description: row.short_description,
            expiry_date: row.expiry_date,
            category: row.category,
            sub_category: row.sub_category,
            meta_details: row.meta_details.0,
            dates: row.dates.0,
            fees: row.fees.0,
            vacancies: row.vacancies.0,
            eligibility: row.eligibility.0,
            salary: row.salary.0,
            selection: row.selection.0,
            links: row.links.0,
            how_to_apply: row.how_to_apply,
            files: row.files.0,
            logo: row.logo,
            saved_sections,
            status,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
