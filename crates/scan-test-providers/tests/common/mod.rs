//! Fixtures shared by the provider integration tests.

use scan_test_core::TestDefinition;

/// A definition with one test scanning `src` and one scanning the whole repo.
pub fn sample_definition() -> TestDefinition {
    serde_json::from_value(serde_json::json!({
        "version": "1.0",
        "tests": [
            {
                "name": "smoke",
                "type": "source-code",
                "source": {"url": "https://github.com/org/app.git", "ref": "v1.2.0"},
                "scan_paths": ["src"],
            },
            {
                "name": "image",
                "type": "container-image",
                "source": {"url": "https://github.com/org/image.git", "ref": "main"},
                "timeout": "10m",
            }
        ]
    }))
    .unwrap()
}
