//! HTTP access to the signal engine for sigdash.
//!
//! Wraps every endpoint the dashboard polls or drives, maps rejected
//! requests to distinct error variants, normalizes quote payloads, and keeps
//! the online/offline indicator current.

pub mod api;
pub mod client;
pub mod connectivity;
pub mod error;
pub mod quote;

pub use api::{DashboardApi, REPORT_PAGE_SIZE};
pub use client::{extract_detail, interpret_response, ApiClient, DEFAULT_TIMEOUT, NO_ALERT};
pub use connectivity::{Connectivity, ConnectivitySnapshot};
pub use error::{ClientError, ClientResult};
pub use quote::{normalize_key, normalize_quote_fields, parse_quote};
