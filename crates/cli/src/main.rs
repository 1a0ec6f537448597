use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use claimgate_auth::{
    Authorizer, Decision, PolicyMap, RequestRecord, TrustMode, ValidationOptions,
};

/// Evaluate an `Authorization` header against the configured policy.
///
/// Verification material and the base policy come from the `JWT_*`
/// environment variables. Prints the decision as JSON; exits 1 on a denial
/// and 2 on a misconfiguration.
#[derive(Parser, Debug)]
#[command(version, about = "Bearer token authorization check", long_about = None)]
struct Args {
    /// Header value, e.g. "Bearer eyJ...". Defaults to $AUTHORIZATION.
    header: Option<String>,

    /// Verify the signature instead of only decoding.
    #[arg(long)]
    verify: bool,

    /// JSON file mapping route ids to route policies.
    #[arg(long, requires = "route")]
    policies: Option<PathBuf>,

    /// Route id to evaluate from --policies.
    #[arg(long, requires = "policies")]
    route: Option<String>,

    /// JSON file holding the request parameters (path/query/body/headers).
    #[arg(long)]
    request: Option<PathBuf>,

    /// Tax id requested, sent as the `x-tax-id` header.
    #[arg(long)]
    tax_id: Option<String>,
}

fn main() -> ExitCode {
    claimgate_observability::init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "claimgate failed");
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let header = args
        .header
        .clone()
        .or_else(|| std::env::var("AUTHORIZATION").ok());
    let mode = if args.verify { TrustMode::Verify } else { TrustMode::Decode };
    let authorizer = Authorizer::new(ValidationOptions::from_env());

    let decision = match (&args.policies, &args.route) {
        (Some(path), Some(route)) => {
            let policies: PolicyMap = read_json(path)?;
            let request = request_record(&args)?;
            authorizer.authorize_route(header.as_deref(), mode, policies.policy_for(route), &request)
        }
        _ => authorizer.authorize(header.as_deref(), mode),
    };

    report(&decision)
}

fn request_record(args: &Args) -> anyhow::Result<RequestRecord> {
    let record = match &args.request {
        Some(path) => read_json(path)?,
        None => RequestRecord::new(),
    };

    Ok(match &args.tax_id {
        Some(tax_id) => record.with_header(claimgate_auth::request::TAX_ID_HEADER, tax_id.clone()),
        None => record,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn report(decision: &Decision) -> anyhow::Result<ExitCode> {
    let (output, code) = match decision {
        Ok(claims) => (json!({ "allowed": true, "claims": claims }), ExitCode::SUCCESS),
        Err(failure) => {
            let code = if failure.is_fault() { 2 } else { 1 };
            (
                json!({ "allowed": false, "error": failure.to_body() }),
                ExitCode::from(code),
            )
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(code)
}
