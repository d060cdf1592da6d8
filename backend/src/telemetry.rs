//! Authentication metrics and the Prometheus recorder
//!
//! Counters are labelled with `outcome`: `success` or the snake_case
//! [`AuthError::kind`]. Without an installed recorder every call is a no-op,
//! which is what unit tests rely on.

use bac_tutor_shared::AuthError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const REGISTRATIONS_TOTAL: &str = "auth_registrations_total";
pub const LOGINS_TOTAL: &str = "auth_logins_total";
pub const TOKEN_VERIFICATIONS_TOTAL: &str = "auth_token_verifications_total";

/// Install the global Prometheus recorder
///
/// Call once at startup. The returned handle renders the scrape body.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;

    metrics::describe_counter!(REGISTRATIONS_TOTAL, "User registration attempts by outcome");
    metrics::describe_counter!(LOGINS_TOTAL, "Credential checks by outcome");
    metrics::describe_counter!(
        TOKEN_VERIFICATIONS_TOTAL,
        "Bearer token verifications by outcome"
    );

    Ok(handle)
}

fn outcome<T>(result: &Result<T, AuthError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    }
}

pub fn record_registration<T>(result: &Result<T, AuthError>) {
    metrics::counter!(REGISTRATIONS_TOTAL, "outcome" => outcome(result)).increment(1);
}

pub fn record_login<T>(result: &Result<T, AuthError>) {
    metrics::counter!(LOGINS_TOTAL, "outcome" => outcome(result)).increment(1);
}

pub fn record_verification<T>(result: &Result<T, AuthError>) {
    metrics::counter!(TOKEN_VERIFICATIONS_TOTAL, "outcome" => outcome(result)).increment(1);
}
