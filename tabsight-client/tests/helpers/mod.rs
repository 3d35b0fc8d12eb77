//! Test Helper Utilities
//!
//! Shared utilities for testing tabsight-client against a local mock of the
//! analysis service.

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_service;
pub mod raw_server;

pub use fixtures::{overview_response, ranking_response, upload_response};
pub use mock_service::{unused_base_url, MockReply, MockService, ReceivedPart};
pub use raw_server::truncated_reply_url;

use tabsight_client::{FileHandle, FileSelection};

/// One in-memory CSV named `name`
pub fn csv_selection(name: &str) -> FileSelection {
    FileSelection::new(vec![FileHandle::from_bytes(name, "age,bmi,target\n42,23.1,1\n")])
}

/// Route client logs through the test harness writer
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tabsight_client=debug")
        .with_test_writer()
        .try_init();
}
