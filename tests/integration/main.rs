//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the real
//! HTTP client through full crawl cycles.

mod common;
mod crawl_tests;
mod resume_tests;
