//! End-to-end test suite
//!
//! Drives full runs through the public `threadgraph` API against offline
//! fixture sources.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test end_to_end
//! ```

// Test modules
mod test_utils;

// Graph construction
mod two_community_scenario;
mod canned_dataset;

// Failure handling
mod failure_isolation;

// Out-group linking
mod out_group_exclusion;

// Export
mod export_files;
