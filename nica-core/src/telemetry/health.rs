use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;
use hyper::StatusCode;
use serde_json::json;

use crate::error::{NicaError, Result};

type RespBody = BoxBody<Bytes, hyper::Error>;

/// Liveness/readiness state sampled from a running [`crate::Nica`]
/// (`SPEC_FULL.md` §3 "Health"): pipeline `enable` register state per
/// direction and the number of ikernels wired in. Cheap to snapshot
/// every tick and share with the observability server without handing
/// it the dataplane itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeStatus {
    pub host_to_net_enabled: bool,
    pub net_to_host_enabled: bool,
    pub ikernel_count: usize,
}

/// Health check response - always returns 200 if the process is running.
pub fn health_check_response() -> Result<Response<RespBody>> {
    respond(StatusCode::OK, &json!({"status": "healthy"}))
}

/// Readiness check - ready iff at least one pipeline direction has its
/// `enable` register set (`spec.md` §6 offset `0x10`); a config with
/// both directions disabled can never forward traffic.
pub fn ready_check_response(status: &RuntimeStatus) -> Result<Response<RespBody>> {
    if status.host_to_net_enabled || status.net_to_host_enabled {
        respond(StatusCode::OK, &json!({"status": "ready", "ikernels": status.ikernel_count}))
    } else {
        respond(StatusCode::SERVICE_UNAVAILABLE, &json!({"status": "not_ready", "reason": "both_pipelines_disabled"}))
    }
}

/// Liveness check - always returns 200 if the process is running.
pub fn live_check_response() -> Result<Response<RespBody>> {
    respond(StatusCode::OK, &json!({"status": "alive"}))
}

fn respond(status: StatusCode, body: &serde_json::Value) -> Result<Response<RespBody>> {
    let body_bytes =
        serde_json::to_vec(body).map_err(|e| NicaError::Telemetry(format!("failed to serialize response: {e}")))?;
    let body = Full::new(Bytes::from(body_bytes)).map_err(|never| match never {}).boxed();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(body)
        .map_err(|e| NicaError::Telemetry(format!("failed to build response: {e}")))
}
