use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::Validator;
use crate::dispatch::TapTransport;
use crate::error::{Result, TapError};
use crate::model::{Endpoint, Status, TapService, ValidationKind, ValidationResult};
use crate::votable::parser::{clean_text, element_exists};

/// Namespace of the `available` element in a VOSI availability document.
pub const VOSI_AVAILABILITY_NAMESPACE: &str = "http://www.ivoa.net/xml/VOSIAvailability/v1.0";

/// Checks that a metadata endpoint serves well-formed XML containing a set of
/// expected elements.
pub struct EndpointValidator {
    service: Arc<TapService>,
    transport: Arc<dyn TapTransport>,
    endpoint: Endpoint,
    expected_elements: Vec<String>,
    namespace: Option<String>,
}

impl EndpointValidator {
    pub fn new(
        service: Arc<TapService>,
        transport: Arc<dyn TapTransport>,
        endpoint: Endpoint,
        expected_elements: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            service,
            transport,
            endpoint,
            expected_elements: expected_elements.into_iter().map(Into::into).collect(),
            namespace: None,
        }
    }

    /// Requires the expected elements to be bound to `namespace`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// The VOSI tables document must list at least one schema.
    pub fn tables(service: Arc<TapService>, transport: Arc<dyn TapTransport>) -> Self {
        Self::new(service, transport, Endpoint::Tables, ["schema"])
    }

    pub fn availability(service: Arc<TapService>, transport: Arc<dyn TapTransport>) -> Self {
        Self::new(service, transport, Endpoint::Availability, ["available"])
            .with_namespace(VOSI_AVAILABILITY_NAMESPACE)
    }

    pub fn capabilities(service: Arc<TapService>, transport: Arc<dyn TapTransport>) -> Self {
        Self::new(service, transport, Endpoint::Capabilities, ["capability"])
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    async fn check(&self) -> Result<()> {
        let url = self.service.endpoints().get(self.endpoint);
        let body = self.transport.get(url, &[]).await?;
        let xml = clean_text(&body);

        for element in &self.expected_elements {
            if !element_exists(xml, element, self.namespace.as_deref())? {
                return Err(TapError::Parse(format!(
                    "{element} element does not exist in XML file"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Validator for EndpointValidator {
    fn name(&self) -> &str {
        self.endpoint.name()
    }

    #[instrument(skip(self), fields(service = %self.service, endpoint = %self.endpoint))]
    async fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new(ValidationKind::Vosi(self.endpoint));

        if let Err(e) = self.check().await {
            error!(error = %e, "Endpoint validation failed");
            result.mark(
                Status::Fail,
                format!("Unable to parse /{} endpoint. Error was: {e}", self.endpoint),
            );
        } else {
            info!("Endpoint validation passed");
        }
        result.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedTransport, TEST_SERVICE_URL};

    const TABLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vosi:tableset xmlns:vosi="http://www.ivoa.net/xml/VOSITables/v1.0">
  <schema><name>tap_schema</name></schema>
</vosi:tableset>"#;

    const AVAILABILITY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vosi:availability xmlns:vosi="http://www.ivoa.net/xml/VOSIAvailability/v1.0">
  <vosi:available>true</vosi:available>
</vosi:availability>"#;

    fn service() -> Arc<TapService> {
        Arc::new(TapService::new(TEST_SERVICE_URL))
    }

    fn transport(path: &str, body: &str) -> Arc<dyn TapTransport> {
        Arc::new(ScriptedTransport::new().respond_url(&format!("{TEST_SERVICE_URL}{path}"), body))
    }

    #[tokio::test]
    async fn test_tables_endpoint_passes() {
        let validator = EndpointValidator::tables(service(), transport("/tables", TABLES));
        let result = validator.validate().await;
        assert_eq!(result.status(), Status::Success);
        assert_eq!(result.kind(), ValidationKind::Vosi(Endpoint::Tables));
        assert!(result.messages().is_empty());
    }

    #[tokio::test]
    async fn test_leading_bom_is_ignored() {
        let body = format!("\u{feff}\n  {AVAILABILITY}");
        let validator =
            EndpointValidator::availability(service(), transport("/availability", &body));
        assert_eq!(validator.validate().await.status(), Status::Success);
    }

    #[tokio::test]
    async fn test_availability_requires_namespace() {
        let body = "<availability><available>true</available></availability>";
        let validator = EndpointValidator::availability(service(), transport("/availability", body));
        let result = validator.validate().await;
        assert_eq!(result.status(), Status::Fail);
        assert_eq!(
            result.messages(),
            [
                "Unable to parse /availability endpoint. Error was: Parse error: available element does not exist in XML file"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_capability_element() {
        let body = "<capabilities></capabilities>";
        let validator = EndpointValidator::capabilities(service(), transport("/capabilities", body));
        let result = validator.validate().await;
        assert_eq!(result.status(), Status::Fail);
        assert!(result.messages()[0].contains("capability element does not exist"));
    }

    #[tokio::test]
    async fn test_malformed_xml_fails_without_panicking() {
        let validator =
            EndpointValidator::tables(service(), transport("/tables", "<tableset><schema>"));
        let result = validator.validate().await;
        assert_eq!(result.status(), Status::Fail);
        assert!(result.messages()[0].starts_with("Unable to parse /tables endpoint."));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let validator = EndpointValidator::tables(service(), Arc::new(ScriptedTransport::new()));
        let result = validator.validate().await;
        assert_eq!(result.status(), Status::Fail);
        assert!(result.render().starts_with("VOSI Validation result status: [FAIL] \n"));
    }
}
