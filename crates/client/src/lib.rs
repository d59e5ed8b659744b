//! Analysis service client — shared by the session layer and the CLI.
//!
//! This crate is the single place that speaks HTTP to the analysis service:
//! upload, query, export URL. It classifies failures into transport vs.
//! service errors so callers can tell "server down" from "server said no".
//!
//! No session state. No retries. No progress reporting.

mod client;

pub use client::{
    AnalysisClient, AnalysisService, ClientError, ClientOptions,
    DEFAULT_BASE_URL,
};
