//! Unhandled panic responder.
//!
//! A panic in a handler or an inner middleware becomes a 500
//! `INTERNAL_ERROR` body instead of a dropped connection. The panic is
//! logged on `gk.errors` with the correlation ID and counted in
//! `gk_critical_errors_total`. The panic message only reaches the caller
//! when `errorHandling.includeDetails` is set.

use crate::errors::GatekeeperError;
use crate::middleware::correlation::current_correlation_id;
use crate::observability::metrics::record_critical_error;
use axum::{
    body::Body,
    response::{IntoResponse, Response},
};
use std::any::Any;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

/// Builds the 500 response for a caught panic.
#[derive(Debug, Clone, Copy)]
pub struct PanicResponder {
    include_details: bool,
}

fn panic_message(err: &(dyn Any + Send)) -> &str {
    if let Some(message) = err.downcast_ref::<String>() {
        message
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response {
        let message = panic_message(err.as_ref());
        let correlation_id = current_correlation_id()
            .map(|id| id.to_string())
            .unwrap_or_default();

        tracing::error!(
            target: "gk.errors",
            correlation_id = %correlation_id,
            panic = %message,
            "Unhandled panic while serving request"
        );
        record_critical_error();

        GatekeeperError::Internal {
            details: self.include_details.then(|| message.to_string()),
        }
        .into_response()
    }
}

/// Layer catching panics from everything it wraps.
#[must_use]
pub fn catch_panic_layer(include_details: bool) -> CatchPanicLayer<PanicResponder> {
    CatchPanicLayer::custom(PanicResponder { include_details })
}
