//! The full run: validate, resolve, template, hand off.

use tracing::{error, info};

use crate::config::{ensure_valid, RunConfig, VAULT_TOKEN_ENV};
use crate::error::Result;
use crate::exec::exec_command;
use crate::secrets::{resolve_secrets, Environment, SourceRegistry};
use crate::template::{ApplyReport, TemplateEngine};

/// Resolve secrets and template every configured file.
///
/// An unknown source name is reported first. Configuration problems, a bad
/// placeholder pattern and an unusable source also abort before any file is
/// touched. Per-file problems are
/// collected in the returned report.
pub async fn run(
    config: &RunConfig,
    registry: &SourceRegistry,
    env: &dyn Environment,
) -> Result<ApplyReport> {
    registry.ensure_known(&config.source)?;
    ensure_valid(config)?;
    let engine = TemplateEngine::new(&config.prefix, &config.suffix, config.order)?;
    let source = registry.create(&config.source, &config.source_options)?;

    info!(
        source = source.name(),
        order = %config.order,
        files = config.files.len(),
        "Resolving secrets"
    );
    let secrets = resolve_secrets(source.as_ref(), config.root_path(), config.order, env).await;

    Ok(engine.apply(&config.files, &secrets, env))
}

/// Settle the templating outcome, scrub the store credential from the
/// environment and exec the configured command, if any.
///
/// In strict mode any template failure is returned before the handoff;
/// otherwise failures are logged and the command still runs.
pub fn finish(config: &RunConfig, report: ApplyReport, env: &dyn Environment) -> Result<()> {
    match report.into_result() {
        Ok(_) => {}
        Err(e) if config.strict => return Err(e),
        Err(e) => error!(error = %e, "Continuing despite templating failures"),
    }

    env.remove(VAULT_TOKEN_ENV);
    exec_command(&config.command)
}
