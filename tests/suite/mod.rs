//! Integration test suite modules

mod dashboard;
mod history;
mod scan_lifecycle;
