use std::net::SocketAddr;

use crate::reconcile::CheckoutError;

// ── Reconciliation ──────────────────────────────────────────────

/// Counter: overlap checks evaluated. Labels: result (free, conflict).
pub const OVERLAP_CHECKS_TOTAL: &str = "staycation_overlap_checks_total";

/// Histogram: overlap check latency in seconds.
pub const OVERLAP_CHECK_DURATION_SECONDS: &str = "staycation_overlap_check_duration_seconds";

/// Counter: guest-count mutations rejected by the occupancy cap.
pub const GUEST_CAP_REJECTIONS_TOTAL: &str = "staycation_guest_cap_rejections_total";

/// Counter: check-out dates overwritten by the stay-type resolver.
pub const CHECKOUT_DATE_ADJUSTMENTS_TOTAL: &str = "staycation_checkout_date_adjustments_total";

// ── Checkout flow ───────────────────────────────────────────────

/// Counter: wizard step advances. Labels: to.
pub const STEP_ADVANCES_TOTAL: &str = "staycation_step_advances_total";

/// Counter: submissions. Labels: status (accepted, rejected).
pub const SUBMISSIONS_TOTAL: &str = "staycation_submissions_total";

/// Counter: draft logs rewritten down to one snapshot.
pub const DRAFT_COMPACTIONS_TOTAL: &str = "staycation_draft_compactions_total";

/// Counter: CLI checks. Labels: outcome (ok, or the error code).
pub const CHECKS_TOTAL: &str = "staycation_checks_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a check outcome to a short label for metrics.
pub fn outcome_label(error: Option<&CheckoutError>) -> &'static str {
    error.map_or("ok", CheckoutError::code)
}
