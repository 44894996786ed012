//! Subcommand implementations
//!
//! Each command returns its stdout text so it can be tested without a
//! process boundary.

use anyhow::{bail, Context, Result};
use mockops_dispatch::{
    ConfigFormat, DispatchStyle, MockRequest, MockService, MockServiceConfig, ServiceParts,
};
use mockops_model::OperationDirection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs of `mockops dispatch`
#[derive(Debug, Clone)]
pub(crate) struct DispatchArgs {
    pub(crate) config: PathBuf,
    pub(crate) operation: String,
    pub(crate) body: String,
    pub(crate) path: Option<String>,
    pub(crate) method: Option<String>,
    pub(crate) headers: Vec<String>,
}

fn load_service(path: &Path) -> Result<Arc<MockService>> {
    let config = MockServiceConfig::load(path)
        .with_context(|| format!("failed to load service config {}", path.display()))?;
    let project = Arc::new(config.build_project());
    MockService::from_config(&config, project, ServiceParts::default())
        .with_context(|| format!("failed to build mock service [{}]", config.name))
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once('=').or_else(|| raw.split_once(':')) else {
        bail!("header [{raw}] must be NAME=VALUE");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header [{raw}] has an empty name");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Map a `--format` value
pub(crate) fn parse_format(name: &str) -> Result<ConfigFormat> {
    match name {
        "yaml" | "yml" => Ok(ConfigFormat::Yaml),
        "json" => Ok(ConfigFormat::Json),
        "toml" => Ok(ConfigFormat::Toml),
        other => bail!("unknown format [{other}]"),
    }
}

/// Dispatch one request and render the result summary as JSON
pub(crate) fn dispatch(args: &DispatchArgs) -> Result<String> {
    let service = load_service(&args.config)?;

    let mut request = MockRequest::new(args.body.clone());
    if let Some(path) = &args.path {
        request = request.with_path(path.clone());
    }
    if let Some(method) = &args.method {
        request = request.with_method(method.clone());
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }

    let outcome = service.dispatch(&args.operation, &mut request);
    service.release();
    let result = outcome.with_context(|| format!("dispatch to [{}] failed", args.operation))?;

    serde_json::to_string_pretty(&result.summary()).context("failed to render result")
}

#[derive(Debug, Serialize)]
struct OperationRow {
    name: String,
    interface: Option<String>,
    operation: Option<String>,
    resolved: bool,
    direction: Option<OperationDirection>,
    dispatch: DispatchStyle,
    default_response: String,
    responses: Vec<String>,
}

/// List mock operations with their bindings and defaults
pub(crate) fn inspect(config: &Path, json: bool) -> Result<String> {
    let service = load_service(config)?;
    let rows: Vec<OperationRow> = service
        .operations()
        .iter()
        .map(|op| {
            let binding = op.binding();
            OperationRow {
                name: op.name(),
                resolved: binding.is_resolved(),
                interface: binding.interface_name,
                operation: binding.operation_name,
                direction: op.direction(),
                dispatch: op.dispatch_style(),
                default_response: op.default_response_name(),
                responses: op.response_names(),
            }
        })
        .collect();
    service.release();

    if json {
        return serde_json::to_string_pretty(&rows).context("failed to render operations");
    }

    let mut out = format!("service [{}]: {} operation(s)\n", service.name(), rows.len());
    for row in &rows {
        let target = format!(
            "{}/{}",
            row.interface.as_deref().unwrap_or("-"),
            row.operation.as_deref().unwrap_or("-")
        );
        out.push_str(&format!(
            "  {}  {}{}  {}  default={}  responses=[{}]\n",
            row.name,
            target,
            if row.resolved { "" } else { " (unresolved)" },
            row.dispatch,
            if row.default_response.is_empty() {
                "-"
            } else {
                &row.default_response
            },
            row.responses.join(", ")
        ));
    }
    Ok(out)
}

/// Re-emit a config in another format
///
/// With `output`, the format follows its extension and the file is written;
/// otherwise the text is returned in `format` (YAML when absent).
pub(crate) fn convert(
    input: &Path,
    output: Option<&Path>,
    format: Option<ConfigFormat>,
) -> Result<Option<String>> {
    let config = MockServiceConfig::load(input)
        .with_context(|| format!("failed to load service config {}", input.display()))?;

    let Some(output) = output else {
        let text = config.render(format.unwrap_or(ConfigFormat::Yaml))?;
        return Ok(Some(text));
    };

    let target = match format {
        Some(format) => format,
        None => ConfigFormat::from_path(output)?,
    };
    let text = config.render(target)?;
    std::fs::write(output, text)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!("wrote {} as {}", output.display(), target.name());
    Ok(None)
}
