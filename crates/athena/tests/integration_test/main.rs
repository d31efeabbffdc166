//! Integration tests for scrapetok-athena.
//!
//! These drive the public executor API against an in-memory backend; no AWS
//! credentials are needed.

mod fake;

mod executor;
mod records;
