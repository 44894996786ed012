//! Functional tests for services built from persisted config.
//!
//! Loads a service from YAML, dispatches through each configured style and
//! checks that the persisted projection survives a round trip.

use mockops_dispatch::{
    ConfigError, ConfigFormat, DispatchConfig, DispatchStyle, MockOperationConfig, MockRequest,
    MockService, MockServiceConfig, ResponseDefinition, ServiceError, ServiceNotification,
    ServiceParts,
};
use mockops_script::{ScriptEngineRegistry, ScriptError, ScriptExecutor, ScriptValue};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const SERVICE: &str = r#"
name: billing
settings:
  generate_response_content: true
interfaces:
  - name: BillingPort
    operations:
      - name: GetInvoice
        response_template:
          skeleton: "<invoice/>"
      - name: PostPayment
        direction: one_way
operations:
  - name: Invoices
    interface: BillingPort
    operation: GetInvoice
    default_response: Found
    dispatch:
      style: query_match
      rules:
        - pattern: "<id>0</id>"
          response: NotFound
    responses:
      - name: Found
        content: "<invoice id='1'/>"
      - name: NotFound
        content: "<fault/>"
        http_status: 404
  - name: Payments
    interface: BillingPort
    operation: PostPayment
    default_response: Accepted
    dispatch:
      style: script
      script: Rejected
    responses:
      - name: Accepted
      - name: Rejected
        http_status: 409
"#;

/// Engine whose script body is the literal response name it returns
#[derive(Default)]
struct LiteralEngine {
    script: String,
}

impl ScriptExecutor for LiteralEngine {
    fn set_script(&mut self, body: &str) {
        self.script = body.trim().to_string();
    }

    fn set_variable(&mut self, _name: &str, _value: ScriptValue) {}

    fn run(&mut self) -> Result<serde_json::Value, ScriptError> {
        Ok(serde_json::Value::String(self.script.clone()))
    }

    fn clear_variables(&mut self) {}
}

fn parts() -> ServiceParts {
    let mut engines = ScriptEngineRegistry::new();
    engines.register_fn("literal", || Box::new(LiteralEngine::default()));
    ServiceParts::with_engines(engines)
}

fn service() -> Arc<MockService> {
    let config = MockServiceConfig::parse(SERVICE, ConfigFormat::Yaml).unwrap();
    let project = Arc::new(config.build_project());
    MockService::from_config(&config, project, parts()).unwrap()
}

/// Tenet: requests route by mock operation name or bound operation name.
#[test]
fn dispatch_routes_by_either_name() {
    let service = service();

    let by_mock = service
        .dispatch("Invoices", &mut MockRequest::new("<id>0</id>"))
        .unwrap();
    assert_eq!(by_mock.response_name(), Some("NotFound"));
    assert_eq!(by_mock.output().map(|o| o.status), Some(404));

    let by_operation = service
        .dispatch("GetInvoice", &mut MockRequest::new("<id>9</id>"))
        .unwrap();
    assert_eq!(by_operation.response_name(), Some("Found"));
    assert_eq!(
        by_operation.operation().and_then(|b| b.operation_name.as_deref()),
        Some("GetInvoice")
    );

    let err = service
        .dispatch("Refunds", &mut MockRequest::new(""))
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnknownOperation(ref n) if n == "Refunds"));
}

/// Tenet: script dispatch picks the named response over the default.
#[test]
fn script_dispatch_overrides_default() {
    let service = service();
    let payments = service.mock_operation_by_name("Payments").unwrap();
    assert_eq!(payments.dispatch_style(), DispatchStyle::Script);
    assert!(payments.is_one_way());

    let result = service
        .dispatch("Payments", &mut MockRequest::new(""))
        .unwrap();
    assert_eq!(result.response_name(), Some("Rejected"));

    payments
        .set_dispatch_config(DispatchConfig::script("Missing", None))
        .unwrap();
    let result = service
        .dispatch("Payments", &mut MockRequest::new(""))
        .unwrap();
    assert_eq!(result.response_name(), Some("Accepted"));
}

/// Tenet: script dispatch without any engine is a config error.
#[test]
fn script_style_needs_an_engine() {
    let config = MockServiceConfig::parse(SERVICE, ConfigFormat::Yaml).unwrap();
    let project = Arc::new(config.build_project());

    let err = MockService::from_config(&config, project, ServiceParts::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Script(_)));
}

/// Tenet: new responses are generated from the bound operation's template
/// and announced by the service.
#[test]
fn new_response_uses_template_and_notifies() {
    let service = service();
    let events = service.subscribe();
    let invoices = service.mock_operation_by_name("Invoices").unwrap();

    invoices.new_response("Generated", true).unwrap();
    assert_eq!(
        invoices.response_by_name("Generated").map(|r| r.content.clone()),
        Some("<invoice/>".to_string())
    );

    // one-way operations get no generated content
    let payments = service.mock_operation_by_name("Payments").unwrap();
    payments.new_response("Blank", true).unwrap();
    assert_eq!(
        payments.response_by_name("Blank").map(|r| r.content.clone()),
        Some(String::new())
    );

    assert_eq!(
        events.try_iter().collect::<Vec<_>>(),
        vec![
            ServiceNotification::ResponseAdded {
                operation: "Invoices".into(),
                response: "Generated".into(),
            },
            ServiceNotification::ResponseAdded {
                operation: "Payments".into(),
                response: "Blank".into(),
            },
        ]
    );
}

/// Tenet: the persisted projection reflects live edits and reloads to the
/// same service.
#[test]
fn projection_round_trips_through_every_format() {
    let service = service();
    service
        .add_mock_operation(
            &MockOperationConfig::new("Extra", "BillingPort", "GetInvoice")
                .with_response(ResponseDefinition::new("Only", "<ok/>"))
                .with_dispatch(DispatchConfig::style(DispatchStyle::Random)),
        )
        .unwrap();
    let invoices = service.mock_operation_by_name("Invoices").unwrap();
    invoices.rename_response("Found", "Invoice").unwrap();

    let projected = service.to_config();
    assert_eq!(projected.operations.len(), 3);
    assert_eq!(
        projected.operations[0].default_response.as_deref(),
        Some("Invoice")
    );

    for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
        let text = projected.render(format).unwrap();
        let reloaded = MockServiceConfig::parse(&text, format).unwrap();
        assert_eq!(reloaded, projected, "{} round trip", format.name());
    }
}
