//! Integration test modules

mod config_tests;
mod scrape_tests;
