//! Check runner
//!
//! [`CheckRunner::run`] drives setup → check → teardown. Each script phase
//! binds `testStep` and `log`, runs, and clears the engine's variables on
//! every exit path (including a panic inside the engine). Failures are
//! reported to the sink and never stop the sequence.

use crate::context::{CheckContext, TestStep};
use crate::error::{CheckError, PhaseError, PhaseFailure};
use crate::phase::CheckPhase;
use crate::sink::{ErrorSink, TracingSink};
use mockops_script::{ScriptEngineRegistry, ScriptError, ScriptExecutor, ScriptLog, ScriptValue};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Check body run between setup and teardown
#[cfg_attr(test, mockall::automock)]
pub trait Check: Send {
    /// Run the check against `step`
    ///
    /// # Errors
    /// Any [`CheckError`]; it is reported, not propagated
    fn execute(&mut self, step: &TestStep, context: &mut CheckContext) -> Result<(), CheckError>;
}

/// Check configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Check name
    pub name: String,
    /// Setup script body (blank skips the phase)
    pub setup_script: String,
    /// Teardown script body (blank skips the phase)
    pub teardown_script: String,
    /// Script language (registry default when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CheckConfig {
    /// Create config without scripts
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set setup script
    #[inline]
    #[must_use]
    pub fn with_setup(mut self, script: impl Into<String>) -> Self {
        self.setup_script = script.into();
        self
    }

    /// Set teardown script
    #[inline]
    #[must_use]
    pub fn with_teardown(mut self, script: impl Into<String>) -> Self {
        self.teardown_script = script.into();
        self
    }

    /// Set script language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Clears the engine's variables when dropped
struct BoundEnvironment<'a> {
    engine: &'a mut dyn ScriptExecutor,
}

impl Drop for BoundEnvironment<'_> {
    fn drop(&mut self) {
        self.engine.clear_variables();
    }
}

/// Runs a [`Check`] with setup and teardown scripts
pub struct CheckRunner<C> {
    config: CheckConfig,
    check: C,
    engine: Box<dyn ScriptExecutor>,
    sink: Arc<dyn ErrorSink>,
    phase: CheckPhase,
    last_context: Option<CheckContext>,
}

impl<C: Check> CheckRunner<C> {
    /// Create runner reporting to [`TracingSink`]
    #[must_use]
    pub fn new(config: CheckConfig, check: C, engine: Box<dyn ScriptExecutor>) -> Self {
        Self {
            config,
            check,
            engine,
            sink: Arc::new(TracingSink),
            phase: CheckPhase::Idle,
            last_context: None,
        }
    }

    /// Create runner with an engine from `engines`
    ///
    /// # Errors
    /// `ScriptError::UnsupportedLanguage` if no engine matches
    pub fn from_registry(
        config: CheckConfig,
        check: C,
        engines: &ScriptEngineRegistry,
    ) -> Result<Self, ScriptError> {
        let engine = match &config.language {
            Some(language) => engines.create(language)?,
            None => engines.create_default()?,
        };
        Ok(Self::new(config, check, engine))
    }

    /// Report to `sink`
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Config
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Check body
    #[inline]
    #[must_use]
    pub fn check(&self) -> &C {
        &self.check
    }

    /// Current phase (`Done` after a run)
    #[inline]
    #[must_use]
    pub fn phase(&self) -> CheckPhase {
        self.phase
    }

    /// Context of the most recent run
    #[inline]
    #[must_use]
    pub fn last_context(&self) -> Option<&CheckContext> {
        self.last_context.as_ref()
    }

    /// Run setup → check → teardown against `step`
    ///
    /// Never fails; every phase failure goes to the sink.
    pub fn run(&mut self, step: &TestStep) {
        tracing::info!("running check [{}] on step [{}]", self.config.name, step.name);

        self.enter(CheckPhase::RunningSetup);
        self.run_script(step);

        self.enter(CheckPhase::RunningCheck);
        self.run_check(step);

        self.enter(CheckPhase::RunningTeardown);
        self.run_script(step);

        self.enter(CheckPhase::Done);
    }

    fn enter(&mut self, next: CheckPhase) {
        debug_assert!(
            self.phase.can_transition(next),
            "illegal check phase transition {} -> {}",
            self.phase,
            next
        );
        tracing::debug!("check [{}] {} -> {}", self.config.name, self.phase, next);
        self.phase = next;
    }

    fn run_script(&mut self, step: &TestStep) {
        let phase = self.phase;
        let script = match phase {
            CheckPhase::RunningSetup => self.config.setup_script.as_str(),
            _ => self.config.teardown_script.as_str(),
        };
        if script.trim().is_empty() {
            tracing::debug!("check [{}] has no {} script", self.config.name, phase);
            return;
        }

        let log = ScriptLog::new(self.config.name.clone());
        let engine = &mut *self.engine;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut env = BoundEnvironment { engine };
            env.engine.set_script(script);
            env.engine.set_variable("testStep", ScriptValue::json(step));
            env.engine.set_variable("log", log.into());
            env.engine.run()
        }));

        match outcome {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => self.report(step, e.into()),
            Err(payload) => self.report(step, PhaseError::from_panic(payload.as_ref())),
        }
    }

    fn run_check(&mut self, step: &TestStep) {
        let mut context = CheckContext::new(self.config.name.clone());
        let check = &mut self.check;
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| check.execute(step, &mut context)));
        self.last_context = Some(context);

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.report(step, e.into()),
            Err(payload) => self.report(step, PhaseError::from_panic(payload.as_ref())),
        }
    }

    fn report(&self, step: &TestStep, error: PhaseError) {
        self.sink.report(PhaseFailure {
            check: self.config.name.clone(),
            step: step.name.clone(),
            phase: self.phase,
            error,
        });
    }
}

impl<C> std::fmt::Debug for CheckRunner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRunner")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CollectingSink;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    mockall::mock! {
        Engine {}
        impl ScriptExecutor for Engine {
            fn set_script(&mut self, body: &str);
            fn set_variable(&mut self, name: &str, value: ScriptValue);
            fn run(&mut self) -> Result<serde_json::Value, ScriptError>;
            fn clear_variables(&mut self);
            fn release(&mut self);
        }
    }

    fn config() -> CheckConfig {
        CheckConfig::new("xss")
            .with_setup("setup()")
            .with_teardown("teardown()")
    }

    fn expect_phase(
        engine: &mut MockEngine,
        seq: &mut Sequence,
        script: &'static str,
        outcome: Result<serde_json::Value, ScriptError>,
    ) {
        engine
            .expect_set_script()
            .with(eq(script))
            .times(1)
            .in_sequence(seq)
            .return_const(());
        engine
            .expect_set_variable()
            .times(2)
            .in_sequence(seq)
            .return_const(());
        engine
            .expect_run()
            .times(1)
            .in_sequence(seq)
            .return_once(move || outcome);
        engine
            .expect_clear_variables()
            .times(1)
            .in_sequence(seq)
            .return_const(());
    }

    #[test]
    fn failing_setup_still_runs_check_and_teardown() {
        let mut seq = Sequence::new();
        let mut engine = MockEngine::new();
        expect_phase(&mut engine, &mut seq, "setup()", Err(ScriptError::runtime("boom")));
        expect_phase(&mut engine, &mut seq, "teardown()", Ok(serde_json::Value::Null));

        let mut check = MockCheck::new();
        check.expect_execute().times(1).returning(|_, _| Ok(()));

        let sink = Arc::new(CollectingSink::new());
        let mut runner =
            CheckRunner::new(config(), check, Box::new(engine)).with_sink(sink.clone());
        runner.run(&TestStep::new("Get"));

        assert_eq!(runner.phase(), CheckPhase::Done);
        assert_eq!(sink.phases(), vec![CheckPhase::RunningSetup]);
        assert_eq!(
            sink.failures()[0].error,
            PhaseError::Script(ScriptError::runtime("boom"))
        );
    }

    struct Exploding;

    impl Check for Exploding {
        fn execute(&mut self, _step: &TestStep, _ctx: &mut CheckContext) -> Result<(), CheckError> {
            panic!("check exploded")
        }
    }

    /// Engine whose `run` panics, counting `clear_variables` calls
    #[derive(Default)]
    struct Crashing {
        cleared: Arc<parking_lot::Mutex<usize>>,
    }

    impl ScriptExecutor for Crashing {
        fn set_script(&mut self, _body: &str) {}
        fn set_variable(&mut self, _name: &str, _value: ScriptValue) {}
        fn run(&mut self) -> Result<serde_json::Value, ScriptError> {
            panic!("engine crashed")
        }
        fn clear_variables(&mut self) {
            *self.cleared.lock() += 1;
        }
    }

    #[test]
    fn panicking_check_is_isolated() {
        let mut seq = Sequence::new();
        let mut engine = MockEngine::new();
        expect_phase(&mut engine, &mut seq, "setup()", Ok(serde_json::Value::Null));
        expect_phase(&mut engine, &mut seq, "teardown()", Ok(serde_json::Value::Null));

        let sink = Arc::new(CollectingSink::new());
        let mut runner =
            CheckRunner::new(config(), Exploding, Box::new(engine)).with_sink(sink.clone());
        runner.run(&TestStep::new("Get"));

        let failures = sink.take();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].phase, CheckPhase::RunningCheck);
        assert_eq!(
            failures[0].error,
            PhaseError::Panicked("check exploded".into())
        );
    }

    #[test]
    fn engine_panic_still_clears_variables() {
        let engine = Crashing::default();
        let cleared = Arc::clone(&engine.cleared);

        let mut check = MockCheck::new();
        check.expect_execute().times(1).returning(|_, _| Ok(()));

        let sink = Arc::new(CollectingSink::new());
        let mut runner =
            CheckRunner::new(config(), check, Box::new(engine)).with_sink(sink.clone());
        runner.run(&TestStep::new("Get"));

        assert_eq!(*cleared.lock(), 2);
        assert_eq!(
            sink.phases(),
            vec![CheckPhase::RunningSetup, CheckPhase::RunningTeardown]
        );
    }

    #[test]
    fn blank_scripts_are_skipped() {
        let engine = MockEngine::new();
        let mut check = MockCheck::new();
        check
            .expect_execute()
            .times(1)
            .returning(|_, ctx| ctx.set("seen", serde_json::json!(true)));

        let mut runner = CheckRunner::new(CheckConfig::new("noop"), check, Box::new(engine));
        runner.run(&TestStep::new("Get"));
        runner.run(&TestStep::new("Get again"));

        assert_eq!(runner.phase(), CheckPhase::Done);
        let ctx = runner.last_context().unwrap();
        assert_eq!(ctx.get("seen"), Some(serde_json::json!(true)));
    }

    #[test]
    fn check_error_reported_with_step() {
        let mut check = MockCheck::new();
        check
            .expect_execute()
            .returning(|step, _| Err(CheckError::Failed(format!("{} leaked", step.name))));

        let sink = Arc::new(CollectingSink::new());
        let mut runner =
            CheckRunner::new(CheckConfig::new("leak"), check, Box::new(MockEngine::new()))
                .with_sink(sink.clone());
        runner.run(&TestStep::new("Get"));

        let failure = &sink.failures()[0];
        assert_eq!(failure.step, "Get");
        assert_eq!(
            failure.error,
            PhaseError::Check(CheckError::Failed("Get leaked".into()))
        );
    }

    #[test]
    fn unknown_language_rejected() {
        let result = CheckRunner::from_registry(
            CheckConfig::new("x").with_language("lua"),
            MockCheck::new(),
            &ScriptEngineRegistry::new(),
        );
        assert!(matches!(result, Err(ScriptError::UnsupportedLanguage(_))));
    }
}
