//! # Method Controller Runtime
//!
//! The dispatcher for single-resource API handlers.
//!
//! This crate turns the conditions declared with `method-controller-core` into
//! a running [`Controller`]: it looks up the condition for the request's
//! method, authenticates the caller, validates the request bundles, runs the
//! optional custom validation and finally invokes the handler.
//!
//! ## Core Components
//!
//! - **Controller**: the per-resource dispatcher and its builder
//! - **Config**: authenticator and canonical responses, shared between controllers
//! - **Metrics**: dispatch counters and latency histogram, Prometheus exporter
//!
//! ## Example
//!
//! ```
//! use method_controller_core::{ApiRequest, Condition, Handler, HttpMethod, Response};
//! use method_controller_runtime::{Controller, ControllerConfig};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let controller = Controller::builder("test", Arc::new(ControllerConfig::<()>::new()))
//!     .on(
//!         HttpMethod::Get,
//!         Condition::new(Handler::new("get", |_event| async { Ok(Response::ok("ok")) })),
//!     )
//!     .build();
//!
//! assert_eq!(controller.handle(&ApiRequest::new("GET")).await, Response::ok("ok"));
//! assert_eq!(controller.handle(&ApiRequest::new("DELETE")).await.status_code, 400);
//! # });
//! ```

/// Controller configuration shared between controllers
pub mod config;

/// Request dispatcher
pub mod controller;

/// Prometheus metrics for observability
pub mod metrics;

pub use config::ControllerConfig;
pub use controller::{Controller, ControllerBuilder};
