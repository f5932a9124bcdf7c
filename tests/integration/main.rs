//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the REST API and drive whole
//! dataset runs end-to-end against a temporary data directory.

mod support;

mod harvest_tests;
