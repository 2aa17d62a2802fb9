//! Integration tests for sigdash-app.
//!
//! These run the real HTTP client against an in-process engine:
//! - endpoint paths and status mapping
//! - quote normalization over the wire
//! - application start, view mount and shutdown

pub mod common;
