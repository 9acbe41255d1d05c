//! Content checks for section payloads. Shape is enforced by serde; these
//! cover the rules serde cannot express.

use crate::errors::AppError;
use crate::models::job::{Eligibility, Fee, JobLink, Salary, Vacancy};

fn non_negative(what: &str, value: Option<f64>) -> Result<(), AppError> {
    match value {
        Some(v) if v < 0.0 => Err(AppError::Validation(format!(
            "{what} must be a non-negative number"
        ))),
        _ => Ok(()),
    }
}

pub fn validate_fees(fees: &[Fee]) -> Result<(), AppError> {
    for (i, fee) in fees.iter().enumerate() {
        non_negative(&format!("fees[{i}]: amount"), fee.amount)?;
    }
    Ok(())
}

pub fn validate_vacancies(vacancies: &[Vacancy]) -> Result<(), AppError> {
    for (i, v) in vacancies.iter().enumerate() {
        for (code, count) in v.counts() {
            non_negative(&format!("vacancies[{i}]: {code}"), count)?;
        }
    }
    Ok(())
}

pub fn validate_eligibility(e: &Eligibility) -> Result<(), AppError> {
    non_negative("eligibility: ageMin", e.age_min)?;
    non_negative("eligibility: ageMax", e.age_max)?;
    if let (Some(min), Some(max)) = (e.age_min, e.age_max) {
        // 0 is what an untouched age input holds
        if max > 0.0 && min > max {
            return Err(AppError::Validation(format!(
                "eligibility: ageMin ({min}) is greater than ageMax ({max})"
            )));
        }
    }
    Ok(())
}

pub fn validate_salary(s: &Salary) -> Result<(), AppError> {
    non_negative("salary: inHand", s.in_hand)
}

pub fn validate_links(links: &[JobLink]) -> Result<(), AppError> {
    for (i, link) in links.iter().enumerate() {
        let url = link.url.as_deref().unwrap_or_default().trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Validation(format!(
                "links[{i}]: url must start with http:// or https://"
            )));
        }
    }
    Ok(())
}

/// Attachment paths written directly by clients must point into the upload tree.
pub fn validate_attachment_path(path: &str) -> Result<(), AppError> {
    let trimmed = path.trim_start_matches('/');
    let inside_uploads = trimmed.starts_with("uploads/") && trimmed.len() > "uploads/".len();
    if !inside_uploads || trimmed.split('/').any(|seg| seg == "..") || path.contains('\\') {
        return Err(AppError::Validation(format!(
            "'{path}' is not an attachment path under uploads/"
        )));
    }
    Ok(())
}

pub fn validate_attachment_paths(paths: &[String]) -> Result<(), AppError> {
    paths.iter().try_for_each(|p| validate_attachment_path(p))
}

/// Rejects blank values for fields that must carry text.
pub fn require_text(field: &str, value: Option<&str>) -> Result<(), AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_fee_fails() {
        let fees = vec![Fee {
            category: Some("UR".into()),
            amount: Some(-1.0),
        }];
        assert!(validate_fees(&fees).is_err());
    }

    #[test]
    fn test_zero_and_unset_fees_pass() {
        let fees = vec![
            Fee {
                category: Some("SC".into()),
                amount: Some(0.0),
            },
            Fee {
                category: Some(String::new()),
                amount: None,
            },
        ];
        assert!(validate_fees(&fees).is_ok());
    }

    #[test]
    fn test_negative_vacancy_count_fails() {
        let v = Vacancy {
            total: Some(10.0),
            obc: Some(-2.0),
            ..Default::default()
        };
        let err = validate_vacancies(&[v]).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("OBC")));
    }

    #[test]
    fn test_age_bounds() {
        let mut e = Eligibility {
            age_min: Some(30.0),
            age_max: Some(18.0),
            ..Default::default()
        };
        assert!(validate_eligibility(&e).is_err());
        e.age_max = Some(30.0);
        assert!(validate_eligibility(&e).is_ok());
        e.age_max = None;
        assert!(validate_eligibility(&e).is_ok());
        e.age_max = Some(0.0);
        assert!(validate_eligibility(&e).is_ok());
        e.age_min = Some(-1.0);
        assert!(validate_eligibility(&e).is_err());
    }

    #[test]
    fn test_salary_in_hand() {
        let mut s = Salary {
            in_hand: Some(-5.0),
            ..Default::default()
        };
        assert!(validate_salary(&s).is_err());
        s.in_hand = Some(42_000.0);
        assert!(validate_salary(&s).is_ok());
        s.in_hand = None;
        assert!(validate_salary(&s).is_ok());
    }

    #[test]
    fn test_link_urls() {
        let mut link = JobLink {
            kind: Some("Apply Online".into()),
            label: Some("Apply".into()),
            url: Some(String::new()),
        };
        assert!(validate_links(std::slice::from_ref(&link)).is_ok());
        link.url = Some("ftp://example.org".into());
        assert!(validate_links(std::slice::from_ref(&link)).is_err());
        link.url = Some("https://example.org/apply".into());
        assert!(validate_links(std::slice::from_ref(&link)).is_ok());
        link.url = None;
        assert!(validate_links(&[link]).is_ok());
    }

    #[test]
    fn test_attachment_paths() {
        assert!(validate_attachment_path("uploads/jobs/a.pdf").is_ok());
        assert!(validate_attachment_path("/uploads/logo.png").is_ok());
        assert!(validate_attachment_path("uploads/").is_err());
        assert!(validate_attachment_path("uploads/../etc/passwd").is_err());
        assert!(validate_attachment_path("/etc/passwd").is_err());
        assert!(validate_attachment_path("uploads\\jobs\\a.pdf").is_err());
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("postName", Some("Clerk")).is_ok());
        assert!(require_text("postName", Some("   ")).is_err());
        assert!(require_text("postName", None).is_err());
    }
}
