use std::path::Path;

use crate::api::errors::ApiError;
use crate::db::types::QuizType;

pub(crate) const INVALID_QUIZ_TYPE: &str = "Invalid quiz type! Must be \"Tech\" or \"Software\".";
const MAX_LOTNAME_CHARS: usize = 100;

pub(crate) fn lotname(raw: &str) -> Result<String, ApiError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest("Lot Name is required!".to_string()));
    }
    if value.chars().count() > MAX_LOTNAME_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Lot Name must be at most {MAX_LOTNAME_CHARS} characters!"
        )));
    }
    Ok(value.to_string())
}

pub(crate) fn quiz_type(raw: &str) -> Result<QuizType, ApiError> {
    raw.trim().parse().map_err(|_| ApiError::BadRequest(INVALID_QUIZ_TYPE.to_string()))
}

/// `all`, empty or absent means no filter.
pub(crate) fn quiz_type_filter(raw: Option<&str>) -> Result<Option<QuizType>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => quiz_type(value).map(Some),
    }
}

pub(crate) fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

pub(crate) fn xlsx_filename(filename: Option<&str>) -> Result<(), ApiError> {
    let filename = filename.map(str::trim).unwrap_or_default();
    if filename.is_empty() {
        return Err(ApiError::BadRequest("No file selected!".to_string()));
    }

    let is_xlsx = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Please upload a valid .xlsx file!".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(message) => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lotname_is_trimmed_and_bounded() {
        assert_eq!(lotname("  LOT7 ").unwrap(), "LOT7");
        assert_eq!(detail(lotname("   ").unwrap_err()), "Lot Name is required!");
        assert!(lotname(&"x".repeat(101)).is_err());
        assert!(lotname(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn quiz_type_filter_accepts_all() {
        assert_eq!(quiz_type_filter(None).unwrap(), None);
        assert_eq!(quiz_type_filter(Some("all")).unwrap(), None);
        assert_eq!(quiz_type_filter(Some("Tech")).unwrap(), Some(QuizType::Tech));
        assert_eq!(detail(quiz_type_filter(Some("tech")).unwrap_err()), INVALID_QUIZ_TYPE);
    }

    #[test]
    fn xlsx_filename_checks() {
        assert!(xlsx_filename(Some("bank.xlsx")).is_ok());
        assert!(xlsx_filename(Some("BANK.XLSX")).is_ok());
        assert_eq!(detail(xlsx_filename(Some("")).unwrap_err()), "No file selected!");
        assert_eq!(detail(xlsx_filename(None).unwrap_err()), "No file selected!");
        assert_eq!(
            detail(xlsx_filename(Some("bank.xls")).unwrap_err()),
            "Please upload a valid .xlsx file!"
        );
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(search_term(Some("  ")), None);
        assert_eq!(search_term(Some(" lot ")), Some("lot"));
    }
}
