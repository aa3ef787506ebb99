//! `parse` and `format` commands.
//!
//! Exposes the French number reader from the terminal, mostly to check what
//! a speech transcript would be graded as.

use serde::Serialize;

use crate::french;

/// Options for the number commands.
#[derive(Debug, Clone, Default)]
pub struct NumbersOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the number commands.
#[derive(Debug, Clone, Serialize)]
pub struct NumberOutput {
    pub success: bool,
    /// The text that was parsed, or the preferred spelling that was formatted.
    pub text: String,
    pub value: Option<u32>,
    /// Every accepted spelling of `value`.
    pub variants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NumberOutput {
    /// Create a successful output.
    pub fn success(text: impl Into<String>, value: u32) -> Self {
        Self {
            success: true,
            text: text.into(),
            value: Some(value),
            variants: french::variants(value)
                .into_iter()
                .map(str::to_string)
                .collect(),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
            value: None,
            variants: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The `parse` / `format` command implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumbersCommand;

impl NumbersCommand {
    pub fn new() -> Self {
        Self
    }

    /// Read a number out of French words or digits.
    pub fn parse(&self, text: &str) -> NumberOutput {
        match french::parse(text) {
            Some(value) => NumberOutput::success(text.trim(), value),
            None => NumberOutput::failure(text.trim(), "no number between 0 and 100 recognized"),
        }
    }

    /// Spell a number in French.
    pub fn format(&self, n: u32) -> NumberOutput {
        match french::format(n) {
            Some(word) => NumberOutput::success(word, n),
            None => NumberOutput::failure(n.to_string(), "only 0 to 100 can be spelled"),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &NumberOutput, options: &NumbersOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &NumberOutput) -> String {
        let Some(value) = output.value.filter(|_| output.success) else {
            return format!(
                "\"{}\": {}\n",
                output.text,
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let mut lines = vec![format!("{} = {}", output.text, value)];
        let others: Vec<&str> = output
            .variants
            .iter()
            .map(String::as_str)
            .filter(|v| *v != output.text)
            .collect();
        if !others.is_empty() {
            lines.push(format!("   aussi : {}", others.join(", ")));
        }
        lines.join("\n")
    }
}
