//! Business code prefixes and request date handling
//!
//! Dates reach the service either as `YYYY-MM-DD` or as the compact `YYMMDD`
//! form. Code prefixes always embed the compact form.

use chrono::NaiveDate;

use crate::error::WarrantyError;

/// Parses a request date given as `YYYY-MM-DD`, `YYMMDD` or an RFC 3339 timestamp
pub fn parse_request_date(input: &str) -> Result<NaiveDate, WarrantyError> {
    let input = input.trim();
    let invalid = || {
        WarrantyError::validation(format!(
            "invalid date '{}': expected YYYY-MM-DD or YYMMDD",
            input
        ))
    };

    if input.len() == 6 && input.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(input, "%y%m%d").map_err(|_| invalid());
    }

    // Browsers sometimes send the full timestamp of a date picker
    let date_part = match input.split_once('T') {
        Some((date, _)) => date,
        None => input,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())
}

/// Renders a date in the compact form used inside codes
pub fn yymmdd(date: NaiveDate) -> String {
    date.format("%y%m%d").to_string()
}

/// Prefix for branch codes within a state, e.g. `JH`
pub fn branch_code_prefix(state_code: &str) -> Result<String, WarrantyError> {
    let code = state_code.trim().to_ascii_uppercase();
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(WarrantyError::validation(format!(
            "invalid state code '{}'",
            state_code
        )));
    }
    Ok(code)
}

/// Prefix for warranty numbers, e.g. `PJ01-241125`
pub fn warranty_no_prefix(branch_code: &str, installation_date: NaiveDate) -> String {
    format!(
        "{}-{}",
        branch_code.trim().to_ascii_uppercase(),
        yymmdd(installation_date)
    )
}

/// Prefix for claim numbers, e.g. `C241201-PJ01-24112501-`
pub fn claim_no_prefix(claim_date: NaiveDate, warranty_no: &str) -> String {
    format!("C{}-{}-", yymmdd(claim_date), warranty_no.trim())
}

/// Splits a `BRANCH-DATE` path key into the branch code and installation date
///
/// Branch codes never contain a dash, so the key splits at the first one.
pub fn split_branch_and_date(key: &str) -> Result<(String, NaiveDate), WarrantyError> {
    let (branch, date) = key.split_once('-').ok_or_else(|| {
        WarrantyError::validation(format!(
            "expected '<branch code>-<installation date>', got '{}'",
            key
        ))
    })?;
    if branch.trim().is_empty() {
        return Err(WarrantyError::validation("branch code is required"));
    }
    Ok((branch.trim().to_ascii_uppercase(), parse_request_date(date)?))
}
