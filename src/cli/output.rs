//! Output formatting for command results.

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::aws::RemoteStack;
use crate::params::ResolvedParameters;
use crate::state::StackRecord;

use super::commands::OutputFormat;

/// Formats command results for the terminal.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    /// Selected output format.
    format: OutputFormat,
}

/// One key/value row in a rendered table.
#[derive(Tabled)]
struct KeyValueRow {
    /// Row key.
    #[tabled(rename = "Key")]
    key: String,
    /// Row value.
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a formatter for the given format.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a remote stack snapshot.
    #[must_use]
    pub fn format_stack(&self, stack: &RemoteStack) -> String {
        match self.format {
            OutputFormat::Json => to_json(stack),
            OutputFormat::Text => {
                let mut out = String::new();
                out.push_str(&format!("Stack:  {}\n", stack.name.bold()));
                out.push_str(&format!("Id:     {}\n", stack.stack_id));
                out.push_str(&format!("Status: {}\n", colorize_status(&stack.status)));
                if let Some(description) = &stack.description {
                    out.push_str(&format!("About:  {description}\n"));
                }
                if !stack.outputs.is_empty() {
                    out.push_str("\nOutputs:\n");
                    out.push_str(&key_value_table(
                        stack.outputs.iter().map(|(k, v)| (k.clone(), v.clone())),
                    ));
                    out.push('\n');
                }
                out
            }
        }
    }

    /// Formats a persisted stack record.
    #[must_use]
    pub fn format_record(&self, record: &StackRecord) -> String {
        match self.format {
            OutputFormat::Json => to_json(record),
            OutputFormat::Text => {
                let mut out = String::new();
                out.push_str(&format!("Stack:  {}\n", record.stack_name.bold()));
                if let Some(stack_id) = &record.stack_id {
                    out.push_str(&format!("Id:     {stack_id}\n"));
                }
                if let Some(status) = &record.stack_status {
                    out.push_str(&format!("Status: {}\n", colorize_status(status)));
                }
                if !record.outputs.is_empty() {
                    out.push_str("\nOutputs:\n");
                    out.push_str(&key_value_table(
                        record.outputs.iter().map(|(k, v)| (k.clone(), v.clone())),
                    ));
                    out.push('\n');
                }
                out
            }
        }
    }

    /// Formats a resolved parameter set for the dry-run dump.
    #[must_use]
    pub fn format_resolved(&self, resolved: &ResolvedParameters) -> String {
        match self.format {
            OutputFormat::Json => to_json(resolved),
            OutputFormat::Text => {
                let parameters = serde_json::to_string_pretty(&resolved.parameters)
                    .unwrap_or_else(|e| format!("<unserializable parameters: {e}>"));
                format!(
                    "Stack:  {} ({})\nFolder: {}\n\nParameters:\n{parameters}\n",
                    resolved.stack_name.bold(),
                    resolved.stack_type,
                    resolved.stack_folder
                )
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

fn key_value_table(rows: impl Iterator<Item = (String, String)>) -> String {
    let rows: Vec<KeyValueRow> = rows
        .map(|(key, value)| KeyValueRow { key, value })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

fn colorize_status(status: &str) -> String {
    if status.ends_with("_FAILED") || status.contains("ROLLBACK") {
        status.red().to_string()
    } else if status.ends_with("_IN_PROGRESS") {
        status.yellow().to_string()
    } else {
        status.green().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_stack() -> RemoteStack {
        let mut outputs = BTreeMap::new();
        outputs.insert("ApiUrl".to_string(), "https://example.test".to_string());
        RemoteStack {
            stack_id: "arn:aws:cloudformation:stack/Acme-api/1".to_string(),
            name: "Acme-api".to_string(),
            status: "CREATE_COMPLETE".to_string(),
            description: Some("API stack".to_string()),
            outputs,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_text_format_includes_outputs() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let out = formatter.format_stack(&sample_stack());

        assert!(out.contains("Acme-api"));
        assert!(out.contains("ApiUrl"));
        assert!(out.contains("https://example.test"));
    }

    #[test]
    fn test_json_format_is_parseable() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let out = formatter.format_stack(&sample_stack());

        let value: serde_json::Value = serde_json::from_str(&out).expect("valid JSON");
        assert_eq!(value["name"], "Acme-api");
        assert_eq!(value["outputs"]["ApiUrl"], "https://example.test");
    }
}
