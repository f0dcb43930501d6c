//! REST API Tests

mod auth_tests;
mod ws_tests;
