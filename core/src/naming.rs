//! Default snapshot names generated from a pattern

use crate::cache::SourceIdentity;
use chrono::Local;
use std::collections::HashMap;

pub struct SnapshotNamer {
    pattern: String,
}

impl SnapshotNamer {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Expand the pattern for `identity`.
    ///
    /// Variables: `{document}`, `{sheet}`, `{seq}`, `{timestamp}`, `{date}`,
    /// `{time}`.
    pub fn generate_name(&self, identity: &SourceIdentity, existing_names: &[String]) -> String {
        let mut result = self.pattern.clone();
        for (key, value) in self.build_variables(identity, existing_names) {
            result = result.replace(&format!("{{{key}}}"), &value);
        }
        result
    }

    fn build_variables(
        &self,
        identity: &SourceIdentity,
        existing_names: &[String],
    ) -> HashMap<&'static str, String> {
        let mut variables = HashMap::new();

        variables.insert("document", sanitize(&identity.document_id));
        variables.insert(
            "sheet",
            identity
                .sheet
                .as_deref()
                .map(sanitize)
                .unwrap_or_else(|| "default".to_string()),
        );

        let now = Local::now();
        variables.insert("timestamp", now.format("%Y%m%d_%H%M%S").to_string());
        variables.insert("date", now.format("%Y%m%d").to_string());
        variables.insert("time", now.format("%H%M%S").to_string());

        variables.insert("seq", next_sequence(existing_names).to_string());

        variables
    }
}

/// One more than the largest trailing number among existing names
fn next_sequence(existing_names: &[String]) -> u32 {
    existing_names
        .iter()
        .filter_map(|name| {
            let digits: String = name
                .chars()
                .rev()
                .take_while(|c| c.is_ascii_digit())
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            digits.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0)
        .saturating_add(1)
}

/// Keep ASCII alphanumerics and dashes; everything else becomes `_`
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}
