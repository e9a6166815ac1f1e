use tracing::{debug, error};

use super::parser::{query_status_text, Field, VoTable};
use crate::logging::{truncate_field, MAX_LOGGED_PAYLOAD};
use crate::model::Status;

/// The result of running a query: the raw payload, its classification and,
/// when the payload parsed, the first table it contained.
///
/// Two views are equal when their raw payloads are equal, whatever their
/// parsed content or status.
#[derive(Debug, Clone)]
pub struct TableView {
    data: String,
    status: Status,
    messages: Vec<String>,
    table: Option<VoTable>,
}

impl TableView {
    /// Parses a raw service response.
    ///
    /// - An empty payload yields a table-less view that is still
    ///   [`Status::Pending`]; the caller decides what an empty answer means.
    /// - A payload that fails to parse yields [`Status::Fail`] with the parser
    ///   error as the first message, followed by the service's own
    ///   `QUERY_STATUS` text or, if there is none, the raw payload.
    /// - A parsed document whose `QUERY_STATUS` is `ERROR` is a failure and one
    ///   flagged `OVERFLOW` is [`Status::Truncated`]. Anything else is
    ///   [`Status::Success`].
    pub fn parse(raw: impl Into<String>) -> Self {
        let data = raw.into();
        if data.is_empty() {
            return Self {
                data,
                status: Status::Pending,
                messages: Vec::new(),
                table: None,
            };
        }

        match VoTable::parse(&data) {
            Ok(table) => {
                let mut messages = Vec::new();
                let status = match table.query_status() {
                    Some(info) if info.value.eq_ignore_ascii_case("ERROR") => {
                        messages.push(if info.text.is_empty() {
                            "Service reported QUERY_STATUS ERROR".to_string()
                        } else {
                            info.text.clone()
                        });
                        Status::Fail
                    }
                    Some(info) if info.value.eq_ignore_ascii_case("OVERFLOW") => {
                        messages.push(format!(
                            "Result truncated by the service (OVERFLOW) after {} rows",
                            table.row_count()
                        ));
                        Status::Truncated
                    }
                    _ => Status::Success,
                };
                debug!(
                    status = %status,
                    fields = table.fields().len(),
                    rows = table.row_count(),
                    "Parsed VOTable"
                );
                Self {
                    data,
                    status,
                    messages,
                    table: Some(table),
                }
            }
            Err(err) => {
                error!(
                    error = %err,
                    response = %truncate_field(&data, MAX_LOGGED_PAYLOAD),
                    "Unable to parse Table from VOTable"
                );
                let service_error = query_status_text(&data).unwrap_or_else(|| data.clone());
                Self {
                    status: Status::Fail,
                    messages: vec![err.to_string(), service_error],
                    table: None,
                    data,
                }
            }
        }
    }

    /// A table-less failed result carrying one message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: String::new(),
            status: Status::Fail,
            messages: vec![message.into()],
            table: None,
        }
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn table(&self) -> Option<&VoTable> {
        self.table.as_ref()
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn fields(&self) -> &[Field] {
        self.table.as_ref().map(VoTable::fields).unwrap_or(&[])
    }

    /// Field identifiers in column order.
    pub fn field_identifiers(&self) -> Vec<&str> {
        self.fields().iter().map(Field::identifier).collect()
    }

    /// Field datatypes in column order.
    pub fn field_datatypes(&self) -> Vec<&str> {
        self.fields().iter().map(|f| f.datatype.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        self.table.as_ref().map(VoTable::rows).unwrap_or(&[])
    }
}

impl PartialEq for TableView {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for TableView {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{error_votable, votable_xml};

    #[test]
    fn test_parse_success() {
        let view = TableView::parse(votable_xml(&[("schema_name", "char")], &[&["ivoa"]]));
        assert_eq!(view.status(), Status::Success);
        assert!(view.messages().is_empty());
        assert_eq!(view.field_identifiers(), vec!["schema_name"]);
        assert_eq!(view.field_datatypes(), vec!["char"]);
        assert_eq!(view.rows(), &[vec!["ivoa".to_string()]]);
    }

    #[test]
    fn test_empty_payload_stays_pending() {
        let view = TableView::parse("");
        assert_eq!(view.status(), Status::Pending);
        assert!(!view.has_table());
        assert!(view.messages().is_empty());
    }

    #[test]
    fn test_unparseable_payload_records_raw_data() {
        let view = TableView::parse("502 Bad Gateway");
        assert_eq!(view.status(), Status::Fail);
        assert!(!view.has_table());
        assert_eq!(view.messages().len(), 2);
        assert_eq!(view.messages()[1], "502 Bad Gateway");
    }

    #[test]
    fn test_error_document_records_service_message() {
        let view = TableView::parse(error_votable("Unknown table BestDR1.Nope"));
        assert_eq!(view.status(), Status::Fail);
        assert_eq!(view.messages().last().unwrap(), "Unknown table BestDR1.Nope");
    }

    #[test]
    fn test_query_status_classification() {
        let overflow = r#"<VOTABLE><RESOURCE><INFO name="QUERY_STATUS" value="OVERFLOW"/>
            <TABLE><FIELD name="a" datatype="int"/><DATA><TABLEDATA><TR><TD>1</TD></TR></TABLEDATA></DATA></TABLE>
            </RESOURCE></VOTABLE>"#;
        let view = TableView::parse(overflow);
        assert_eq!(view.status(), Status::Truncated);
        assert!(view.has_table());

        let error = r#"<VOTABLE><RESOURCE><INFO name="QUERY_STATUS" value="ERROR">bad query</INFO>
            <TABLE><FIELD name="a" datatype="int"/></TABLE></RESOURCE></VOTABLE>"#;
        let view = TableView::parse(error);
        assert_eq!(view.status(), Status::Fail);
        assert_eq!(view.messages(), ["bad query".to_string()]);

        let ok = r#"<VOTABLE><RESOURCE><INFO name="QUERY_STATUS" value="OK"/>
            <TABLE><FIELD name="a" datatype="int"/></TABLE></RESOURCE></VOTABLE>"#;
        assert_eq!(TableView::parse(ok).status(), Status::Success);
    }

    #[test]
    fn test_overflow_after_table_is_truncated() {
        let xml = r#"<VOTABLE version="1.3" xmlns="http://www.ivoa.net/xml/VOTable/v1.3">
            <RESOURCE type="results">
            <INFO name="QUERY_STATUS" value="OK"/>
            <TABLE><FIELD name="a" datatype="int"/>
            <DATA><TABLEDATA><TR><TD>1</TD></TR><TR><TD>2</TD></TR></TABLEDATA></DATA></TABLE>
            <INFO name="QUERY_STATUS" value="OVERFLOW"/>
            </RESOURCE></VOTABLE>"#;
        let view = TableView::parse(xml);
        assert_eq!(view.status(), Status::Truncated);
        assert_eq!(view.rows().len(), 2);
        assert!(view.messages()[0].contains("after 2 rows"));
    }

    #[test]
    fn test_equality_is_raw_data_equality() {
        let a = TableView::parse("garbage");
        let mut b = TableView::parse("garbage");
        b.set_status(Status::Success);
        assert_eq!(a, b);
        assert_ne!(a, TableView::parse("other garbage"));
    }

    #[test]
    fn test_failed() {
        let view = TableView::failed("Timeout waiting for query result");
        assert_eq!(view.status(), Status::Fail);
        assert_eq!(view.data(), "");
        assert_eq!(view.messages(), ["Timeout waiting for query result".to_string()]);
    }
}
