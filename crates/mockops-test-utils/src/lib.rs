//! Testing utilities for mockops workspace
//!
//! Shared fixtures: a sample model, recording owners, scripted strategies,
//! recording script engines and checks.

#![allow(missing_docs)]

use mockops_check::{Check, CheckContext, CheckError, TestStep};
use mockops_dispatch::{
    DispatchStyle, MockOperation, MockOperationId, MockRequest, OperationContext, OperationOwner,
    ResponseDefinition, ResponseStore, SelectionStrategy,
};
use mockops_model::{OperationDirection, OperationRef, Project, ResponseTemplate};
use mockops_script::{ScriptError, ScriptExecutor, ScriptValue};
use parking_lot::Mutex;
use std::sync::Arc;

pub const INTERFACE: &str = "BillingPort";
pub const OPERATION: &str = "GetInvoice";
pub const ONE_WAY: &str = "PostPayment";

/// Project with one interface holding a request/response and a one-way operation
pub struct SampleProject {
    pub project: Arc<Project>,
    pub get_invoice: OperationRef,
    pub post_payment: OperationRef,
}

pub fn sample_project() -> SampleProject {
    let project = Arc::new(Project::new("billing"));
    let interface = project.add_interface(INTERFACE);
    let get = project
        .add_operation(interface, OPERATION, OperationDirection::RequestResponse)
        .unwrap();
    let post = project
        .add_operation(interface, ONE_WAY, OperationDirection::OneWay)
        .unwrap();
    let get_invoice = OperationRef::new(interface, get);
    project
        .set_response_template(get_invoice, ResponseTemplate::new("<invoice/>"))
        .unwrap();

    SampleProject {
        project,
        get_invoice,
        post_payment: OperationRef::new(interface, post),
    }
}

/// Owner that records removal requests
#[derive(Debug, Default)]
pub struct RecordingOwner {
    removals: Mutex<Vec<MockOperationId>>,
    added: Mutex<Vec<(String, String)>>,
}

impl RecordingOwner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn removals(&self) -> Vec<MockOperationId> {
        self.removals.lock().clone()
    }

    pub fn added(&self) -> Vec<(String, String)> {
        self.added.lock().clone()
    }
}

impl OperationOwner for RecordingOwner {
    fn remove_mock_operation(&self, id: MockOperationId) -> bool {
        self.removals.lock().push(id);
        true
    }

    fn response_added(&self, operation: &str, response: &str) {
        self.added
            .lock()
            .push((operation.to_string(), response.to_string()));
    }
}

/// Mock operation bound to `GetInvoice` and owned by `owner`
pub fn owned_operation(sample: &SampleProject, owner: &Arc<RecordingOwner>) -> MockOperation {
    let owner: Arc<dyn OperationOwner> = owner.clone();
    let context = OperationContext::new()
        .with_model(sample.project.clone())
        .with_owner(Arc::downgrade(&owner));
    MockOperation::for_operation("GetInvoice Mock", sample.get_invoice, context).unwrap()
}

/// Strategy whose pick is set by the test
#[derive(Debug, Default)]
pub struct FixedStrategy {
    pick: Mutex<Option<String>>,
    calls: Mutex<usize>,
}

impl FixedStrategy {
    pub fn declining() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn picking(name: &str) -> Arc<Self> {
        let strategy = Self::default();
        *strategy.pick.lock() = Some(name.to_string());
        Arc::new(strategy)
    }

    pub fn set_pick(&self, name: Option<&str>) {
        *self.pick.lock() = name.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl SelectionStrategy for FixedStrategy {
    fn select(
        &self,
        _request: &MockRequest,
        store: &ResponseStore,
    ) -> Option<Arc<ResponseDefinition>> {
        *self.calls.lock() += 1;
        self.pick.lock().as_deref().and_then(|name| store.by_name(name))
    }

    fn style(&self) -> DispatchStyle {
        DispatchStyle::DefaultOnly
    }
}

/// Shared journal of engine and check calls
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

/// Script engine that journals each run by its script body
///
/// A body starting with `fail` returns a runtime error, one starting with
/// `panic` panics.
#[derive(Debug)]
pub struct RecordingEngine {
    journal: Journal,
    script: String,
    variables: Vec<String>,
}

impl RecordingEngine {
    pub fn boxed(journal: &Journal) -> Box<dyn ScriptExecutor> {
        Box::new(Self {
            journal: journal.clone(),
            script: String::new(),
            variables: Vec::new(),
        })
    }
}

impl ScriptExecutor for RecordingEngine {
    fn set_script(&mut self, body: &str) {
        self.script = body.to_string();
    }

    fn set_variable(&mut self, name: &str, _value: ScriptValue) {
        self.variables.push(name.to_string());
    }

    fn run(&mut self) -> Result<serde_json::Value, ScriptError> {
        self.journal.lock().push(format!("script:{}", self.script));
        if self.script.starts_with("panic") {
            panic!("engine crashed on {}", self.script);
        }
        if self.script.starts_with("fail") {
            return Err(ScriptError::runtime(self.script.clone()));
        }
        Ok(serde_json::Value::Null)
    }

    fn clear_variables(&mut self) {
        self.variables.clear();
        self.journal.lock().push("clear".to_string());
    }
}

/// Check that journals its invocation and optionally fails
#[derive(Debug)]
pub struct RecordingCheck {
    journal: Journal,
    failure: Option<String>,
}

impl RecordingCheck {
    pub fn passing(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            failure: None,
        }
    }

    pub fn failing(journal: &Journal, message: &str) -> Self {
        Self {
            journal: journal.clone(),
            failure: Some(message.to_string()),
        }
    }
}

impl Check for RecordingCheck {
    fn execute(&mut self, step: &TestStep, _context: &mut CheckContext) -> Result<(), CheckError> {
        self.journal.lock().push(format!("execute:{}", step.name));
        match &self.failure {
            Some(message) => Err(CheckError::Failed(message.clone())),
            None => Ok(()),
        }
    }
}
