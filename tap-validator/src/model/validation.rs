//! Aggregated outcome of one validation run.

use std::fmt::{self, Write as _};

use super::{Endpoint, Query, Status};

/// What was validated. Drives the report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationKind {
    #[default]
    Generic,
    /// Sample-row queries over every discovered table
    Table,
    /// Shape check of a VOSI metadata endpoint
    Vosi(Endpoint),
    /// The same queries run against two services
    Comparison,
}

impl ValidationKind {
    /// Label used in reports and structured output.
    pub fn label(&self) -> &'static str {
        match self {
            ValidationKind::Generic => "",
            ValidationKind::Table => "Table",
            ValidationKind::Vosi(_) => "VOSI",
            ValidationKind::Comparison => "Comparison",
        }
    }
}

/// The aggregate status of a validation run plus the queries that failed.
///
/// The status only ever moves towards the more severe value (see
/// [`Status::severity`]), so the order in which outcomes are recorded does not
/// affect the verdict. A run that records no failure is
/// [`Status::Success`] once [`ValidationResult::finish`] is called.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    kind: ValidationKind,
    status: Status,
    failures: Vec<Query>,
    messages: Vec<String>,
}

impl ValidationResult {
    pub fn new(kind: ValidationKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> ValidationKind {
        self.kind
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn failures(&self) -> &[Query] {
        &self.failures
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Records a classified query. Queries in a failure state are appended to
    /// the failures and raise the aggregate status; anything else is ignored.
    pub fn record(&mut self, query: Query) {
        let status = query.status();
        if status.is_failure() {
            self.escalate(status);
            self.failures.push(query);
        }
    }

    /// Raises the aggregate status to `status` and logs `message` against it.
    pub fn mark(&mut self, status: Status, message: impl Into<String>) {
        self.escalate(status);
        self.messages.push(message.into());
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    fn escalate(&mut self, status: Status) {
        self.status = self.status.most_severe(status);
    }

    /// Closes the run: a run that observed no failure becomes a success.
    pub fn finish(mut self) -> Self {
        if self.status == Status::Pending {
            self.status = Status::Success;
        }
        self
    }

    /// Renders the human-readable report for this run.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = match self.kind {
            ValidationKind::Generic => self.render_generic(&mut out),
            ValidationKind::Table | ValidationKind::Comparison => self.render_queries(&mut out),
            ValidationKind::Vosi(_) => self.render_vosi(&mut out),
        };
        out
    }

    fn render_generic(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "{}Validation result: [{}]", prefix(self.kind), self.status)?;
        if !self.messages.is_empty() {
            writeln!(out, "Relevant logs:")?;
            for message in &self.messages {
                writeln!(out, "{message}")?;
            }
        }
        Ok(())
    }

    fn render_queries(&self, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            "{}Validation result status: [{}]",
            prefix(self.kind),
            self.status
        )?;
        if !self.status.is_success() {
            writeln!(out, "The following queries failed:")?;
            for query in &self.failures {
                writeln!(out, "[{}]", query.query_text())?;
                writeln!(out, "Relevant logs:")?;
                for message in query.messages() {
                    writeln!(out, "{message}")?;
                }
            }
            for message in &self.messages {
                writeln!(out, "{message}")?;
            }
        }
        Ok(())
    }

    fn render_vosi(&self, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            "{}Validation result status: [{}] ",
            prefix(self.kind),
            self.status
        )?;
        if !self.status.is_success() {
            writeln!(out, "Relevant logs: ")?;
            for message in &self.messages {
                writeln!(out, "[{message}] ")?;
            }
        }
        Ok(())
    }
}

fn prefix(kind: ValidationKind) -> String {
    match kind.label() {
        "" => String::new(),
        label => format!("{label} "),
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Two results are equal when they reached the same status through the same
/// failing queries.
impl PartialEq for ValidationResult {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
            && self.failures.len() == other.failures.len()
            && self
                .failures
                .iter()
                .zip(&other.failures)
                .all(|(a, b)| a.id() == b.id())
    }
}
