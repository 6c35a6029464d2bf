//! Client configuration pointed at a mock backend

use secrecy::SecretString;
use wxbridge_config::{WatsonxConfig, Workspace};

/// API key the mock IAM endpoint accepts
pub const TEST_API_KEY: &str = "test-key";

/// Model id sent with every request
pub const TEST_MODEL: &str = "ibm/granite-3-8b-instruct";

/// Configuration billing a project, with both endpoints on the mock
pub fn mock_config(base_url: &str) -> WatsonxConfig {
    mock_config_with_key(base_url, TEST_API_KEY)
}

/// Same as [`mock_config`] with a caller-chosen API key
pub fn mock_config_with_key(base_url: &str, api_key: &str) -> WatsonxConfig {
    let mut config = WatsonxConfig::new(
        SecretString::from(api_key),
        TEST_MODEL,
        Workspace::Project("test-project".to_owned()),
    );
    config.url = base_url.parse().expect("valid URL");
    config.iam_url = base_url.parse().expect("valid URL");
    config
}
