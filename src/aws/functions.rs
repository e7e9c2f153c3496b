//! Lambda function code updates.

use aws_sdk_lambda::Client;
use tracing::{error, info};

use crate::error::{CloudError, Result};

/// Lambda function API wrapper.
#[derive(Debug, Clone)]
pub struct FunctionApi {
    /// Lambda client.
    client: Client,
}

impl FunctionApi {
    /// Creates a function API from the shared SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Points a function at a freshly uploaded code artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the update request is rejected.
    pub async fn update_code(&self, function_name: &str, bucket: &str, key: &str) -> Result<()> {
        info!("Updating code of function {function_name} from s3://{bucket}/{key}");

        self.client
            .update_function_code()
            .function_name(function_name)
            .s3_bucket(bucket)
            .s3_key(key)
            .send()
            .await
            .map_err(|e| {
                error!("Code update of {function_name} failed: {e}");
                CloudError::function(format!(
                    "Failed to update code of {function_name}: {e}"
                ))
            })?;

        info!("Function {function_name} code updated");
        Ok(())
    }
}
