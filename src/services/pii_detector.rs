//! PII classification for submitted form fields.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3}[-\s]?\d{3}[-\s]?\d{4}").expect("valid phone pattern"));
static SSN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3}-?\d{2}-?\d{4}").expect("valid ssn pattern"));

/// Kind of personal data recognised in a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiKind {
    Email,
    Phone,
    Address,
    Name,
    Ssn,
    Birthdate,
}

impl PiiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiKind::Email => "email",
            PiiKind::Phone => "phone",
            PiiKind::Address => "address",
            PiiKind::Name => "name",
            PiiKind::Ssn => "ssn",
            PiiKind::Birthdate => "birthdate",
        }
    }
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A form as it is being submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    pub action: Option<String>,
    pub method: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new(fields: &[(&str, &str)]) -> Self {
        Self {
            action: None,
            method: None,
            fields: fields
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Classify one field. The first matching rule wins.
pub fn classify_field(name: &str, value: &str) -> Option<PiiKind> {
    let name = name.to_lowercase();
    let lowered = value.to_lowercase();

    if name.contains("email") && value.contains('@') {
        Some(PiiKind::Email)
    } else if name.contains("phone") || PHONE_PATTERN.is_match(&lowered) {
        Some(PiiKind::Phone)
    } else if name.contains("address") || name.contains("street") {
        Some(PiiKind::Address)
    } else if name.contains("name") && lowered.chars().count() > 1 {
        Some(PiiKind::Name)
    } else if name.contains("ssn") || SSN_PATTERN.is_match(&lowered) {
        Some(PiiKind::Ssn)
    } else if name.contains("birth") || name.contains("dob") {
        Some(PiiKind::Birthdate)
    } else {
        None
    }
}

/// Distinct PII kinds in a submission, in field order.
pub fn classify_form(form: &FormSubmission) -> Vec<PiiKind> {
    let mut found = Vec::new();
    for (name, value) in &form.fields {
        if let Some(kind) = classify_field(name, value) {
            if !found.contains(&kind) {
                found.push(kind);
            }
        }
    }
    found
}
