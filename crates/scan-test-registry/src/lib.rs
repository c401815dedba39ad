//! Access to a scanner registry checkout.
//!
//! - `detector`: which scanners changed between two git refs
//! - `loader`: reading and validating each scanner's `tests.yaml`

pub mod detector;
pub mod loader;

pub use detector::{
    extract_scanner_ids, get_changed_files, get_scanners_to_test, has_workflow_changes,
    resolve_ref,
};
pub use loader::{
    has_test_definition, load_test_definition, load_test_definitions, test_file_path,
};
