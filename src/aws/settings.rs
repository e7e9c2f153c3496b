//! Explicit AWS client configuration.

use aws_config::SdkConfig;

/// Client configuration threaded into each remote-call component.
///
/// Replaces implicit process-global provider configuration: every client
/// is constructed from one of these, so a test or an embedding caller can
/// control exactly which region a component talks to.
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    /// Region override; falls back to the environment/profile chain.
    pub region: Option<String>,
}

impl AwsSettings {
    /// Creates settings with an optional region override.
    #[must_use]
    pub const fn new(region: Option<String>) -> Self {
        Self { region }
    }

    /// Loads the shared SDK configuration these settings describe.
    pub async fn load(&self) -> SdkConfig {
        match &self.region {
            Some(region) => {
                aws_config::from_env()
                    .region(aws_config::Region::new(region.clone()))
                    .load()
                    .await
            }
            None => aws_config::load_from_env().await,
        }
    }

    /// The effective region name, when resolvable from the loaded config.
    #[must_use]
    pub fn region_name(config: &SdkConfig) -> Option<String> {
        config.region().map(|region| region.as_ref().to_string())
    }
}
