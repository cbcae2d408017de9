//! Scrubbing of personal data from log lines.
//!
//! Log lines built as `field=value;field=value;` can be passed through [`filter_datum`] (or a
//! precompiled [`Redactor`]) so that the values of sensitive fields never reach the logs.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

/// Fields treated as personal data.
pub const PII_FIELDS: [&str; 5] = ["name", "email", "phone", "ssn", "password"];

pub const REDACTION: &str = "***";
pub const SEPARATOR: &str = ";";

fn field_pattern(field: &str, separator: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("{}=(.*?){}", regex::escape(field), regex::escape(separator)))
}

/// Replace the value of every `field=<value><separator>` occurrence by `redaction`.
///
/// Values are matched lazily up to the first separator.
pub fn filter_datum(fields: &[&str], redaction: &str, message: &str, separator: &str) -> String {
    fields.iter().fold(message.to_string(), |message, field| match field_pattern(field, separator) {
        Ok(pattern) => pattern
            .replace_all(&message, NoExpand(&format!("{field}={redaction}{separator}")))
            .into_owned(),
        Err(e) => {
            tracing::warn!("Skipping redaction of {field}: {e}");
            message
        }
    })
}

/// Precompiled [`filter_datum`] for a fixed field list.
#[derive(Debug, Clone)]
pub struct Redactor {
    rules: Vec<(Regex, String)>,
}

impl Redactor {
    pub fn new(fields: &[&str], redaction: &str, separator: &str) -> Result<Self, regex::Error> {
        let rules = fields
            .iter()
            .map(|field| Ok((field_pattern(field, separator)?, format!("{field}={redaction}{separator}"))))
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn redact(&self, message: &str) -> String {
        self.rules.iter().fold(message.to_string(), |message, (pattern, replacement)| {
            pattern.replace_all(&message, NoExpand(replacement)).into_owned()
        })
    }
}

static PII_REDACTOR: LazyLock<Option<Redactor>> = LazyLock::new(|| Redactor::new(&PII_FIELDS, REDACTION, SEPARATOR).ok());

/// [`PII_FIELDS`] scrubbed with the default redaction and separator.
pub fn redact_pii(message: &str) -> String {
    match PII_REDACTOR.as_ref() {
        Some(redactor) => redactor.redact(message),
        None => filter_datum(&PII_FIELDS, REDACTION, message, SEPARATOR),
    }
}
