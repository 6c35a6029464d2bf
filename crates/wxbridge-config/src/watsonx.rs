use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default regional watsonx.ai endpoint
pub const DEFAULT_URL: &str = "https://us-south.ml.cloud.ibm.com";

/// Default IBM Cloud IAM endpoint used to exchange API keys for bearer tokens
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

/// Default `version` query parameter sent with every chat request
pub const DEFAULT_API_VERSION: &str = "2024-10-08";

/// Connection, credential and model settings for a watsonx.ai chat client
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatsonxConfig {
    /// watsonx.ai endpoint
    #[serde(default = "default_url")]
    pub url: Url,
    /// IAM token endpoint base
    #[serde(default = "default_iam_url")]
    pub iam_url: Url,
    /// API version date
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// IBM Cloud API key
    pub api_key: SecretString,
    /// Deployment space to bill requests against
    #[serde(default)]
    pub space_id: Option<String>,
    /// Project to bill requests against
    #[serde(default)]
    pub project_id: Option<String>,
    /// Foundation model identifier (e.g. `meta-llama/llama-3-3-70b-instruct`)
    pub model_id: String,
    /// Generation parameters forwarded with every request
    #[serde(default)]
    pub params: GenerationParams,
}

/// Sampling parameters passed through to the vendor unchanged
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationParams {
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Frequency penalty
    #[serde(default)]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    #[serde(default)]
    pub presence_penalty: Option<f64>,
}

/// The scope a request is billed against
///
/// watsonx.ai accepts exactly one of a deployment space or a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workspace {
    /// Deployment space id
    Space(String),
    /// Project id
    Project(String),
}

impl WatsonxConfig {
    /// Create a configuration with default endpoints and no generation parameters
    pub fn new(api_key: SecretString, model_id: impl Into<String>, workspace: Workspace) -> Self {
        let (space_id, project_id) = match workspace {
            Workspace::Space(id) => (Some(id), None),
            Workspace::Project(id) => (None, Some(id)),
        };

        Self {
            url: default_url(),
            iam_url: default_iam_url(),
            api_version: default_api_version(),
            api_key,
            space_id,
            project_id,
            model_id: model_id.into(),
            params: GenerationParams::default(),
        }
    }

    /// Resolve the workspace identifier
    ///
    /// # Errors
    ///
    /// Returns an error if neither or both of `space_id` and `project_id` are set
    pub fn workspace(&self) -> anyhow::Result<Workspace> {
        match (&self.space_id, &self.project_id) {
            (Some(space), None) => Ok(Workspace::Space(space.clone())),
            (None, Some(project)) => Ok(Workspace::Project(project.clone())),
            (None, None) => anyhow::bail!("one of space_id or project_id must be provided for the watsonx client"),
            (Some(_), Some(_)) => anyhow::bail!("space_id and project_id are mutually exclusive, provide only one"),
        }
    }

    /// Build a configuration from `WATSONX_*` environment variables
    ///
    /// Reads `WATSONX_API_KEY` and `WATSONX_MODEL_ID` (required), plus
    /// `WATSONX_URL`, `WATSONX_SPACE_ID` and `WATSONX_PROJECT_ID`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, the URL is
    /// invalid, or validation fails
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = required_env("WATSONX_API_KEY")?;
        let model_id = required_env("WATSONX_MODEL_ID")?;

        let url = match optional_env("WATSONX_URL") {
            Some(raw) => Url::parse(&raw).map_err(|e| anyhow::anyhow!("invalid WATSONX_URL: {e}"))?,
            None => default_url(),
        };

        let config = Self {
            url,
            iam_url: default_iam_url(),
            api_version: default_api_version(),
            api_key: SecretString::from(api_key),
            space_id: optional_env("WATSONX_SPACE_ID"),
            project_id: optional_env("WATSONX_PROJECT_ID"),
            model_id,
            params: GenerationParams::default(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace rule is violated, the model id is
    /// empty, or an endpoint is not http(s)
    pub fn validate(&self) -> anyhow::Result<()> {
        self.workspace()?;

        if self.model_id.trim().is_empty() {
            anyhow::bail!("model_id must not be empty");
        }

        if self.api_version.trim().is_empty() {
            anyhow::bail!("api_version must not be empty");
        }

        for (field, url) in [("url", &self.url), ("iam_url", &self.iam_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("{field} must use http or https, got '{}'", url.scheme());
            }
        }

        Ok(())
    }
}

/// Read a required variable, treating empty values as missing
fn required_env(name: &str) -> anyhow::Result<String> {
    optional_env(name).ok_or_else(|| anyhow::anyhow!("environment variable not set: `{name}`"))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn default_url() -> Url {
    Url::parse(DEFAULT_URL).expect("valid default URL")
}

fn default_iam_url() -> Url {
    Url::parse(DEFAULT_IAM_URL).expect("valid default IAM URL")
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_owned()
}
