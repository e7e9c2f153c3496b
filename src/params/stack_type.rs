//! Stack-type-specific parameter derivation.
//!
//! Each deployable stack type derives its own computed fields from the
//! base parameter set. The set of types is closed: adding behavior for a
//! new kind of stack means adding a variant here, never branching on type
//! strings inside another variant's logic.

use serde_json::Value;
use tracing::debug;

use super::set::ParameterSet;
use super::{
    KEY_FUNCTION_CODE_BUCKET_KEY, KEY_FUNCTION_CODE_PATH, KEY_FUNCTION_NAME, KEY_LAMBDA_CONFIG,
    KEY_STACK_FOLDER, KEY_STACK_NAME, KEY_STACK_TYPE, KEY_USER_POOL_BUCKET,
};

/// Derived substitution key for the post-confirmation trigger fragment.
const KEY_POST_CONFIRMATION_TRIGGER: &str = "lambdaConfigPostConfirmation";

/// Derived substitution key for the pre-token-generation trigger fragment.
const KEY_PRE_TOKEN_TRIGGER: &str = "lambdaConfigPreTokenGeneration";

/// Configured ARN for the post-confirmation trigger, under `lambdaConfig`.
const ARN_POST_CONFIRMATION: &str = "postConfirmationLambdaArn";

/// Configured ARN for the pre-token-generation trigger, under `lambdaConfig`.
const ARN_PRE_TOKEN: &str = "preTokenGenerationLambdaArn";

/// The closed set of deployable stack types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackType {
    /// A plain infrastructure stack with no computed fields.
    Generic,
    /// A stack carrying function code that is packaged and uploaded.
    FunctionCompute,
    /// A user identity pool stack with optional lambda triggers.
    IdentityPool,
}

impl StackType {
    /// Reads the stack type from the merged parameter set.
    ///
    /// Unknown or absent `stackType` values fall back to [`Self::Generic`].
    #[must_use]
    pub fn from_parameters(parameters: &ParameterSet) -> Self {
        match parameters.get(KEY_STACK_TYPE).and_then(Value::as_str) {
            Some("AWS_LAMBDA") => Self::FunctionCompute,
            Some("AWS_COGNITO") => Self::IdentityPool,
            _ => Self::Generic,
        }
    }

    /// Extends the parameter set with type-specific computed fields.
    ///
    /// Expects the synthetic identity fields (`stackName`, `stackFolder`)
    /// to already be present.
    pub fn derive(self, parameters: &mut ParameterSet) {
        match self {
            Self::Generic => {}
            Self::FunctionCompute => derive_function_compute(parameters),
            Self::IdentityPool => derive_identity_pool(parameters),
        }
    }
}

impl std::fmt::Display for StackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Generic => "generic",
            Self::FunctionCompute => "function-compute",
            Self::IdentityPool => "identity-pool",
        };
        write!(f, "{name}")
    }
}

fn str_param<'a>(parameters: &'a ParameterSet, key: &str) -> Option<&'a str> {
    parameters.get(key).and_then(Value::as_str)
}

/// Derives the code artifact key and local archive path, defaulting the
/// function name to the stack name.
fn derive_function_compute(parameters: &mut ParameterSet) {
    let stack_name = str_param(parameters, KEY_STACK_NAME).unwrap_or_default().to_string();
    let stack_folder = str_param(parameters, KEY_STACK_FOLDER).unwrap_or_default().to_string();

    if str_param(parameters, KEY_FUNCTION_NAME).is_none() {
        parameters.insert(
            KEY_FUNCTION_NAME.to_string(),
            Value::String(stack_name.clone()),
        );
    }
    parameters.insert(
        KEY_FUNCTION_CODE_BUCKET_KEY.to_string(),
        Value::String(format!("{stack_folder}/{stack_name}.zip")),
    );
    parameters.insert(
        KEY_FUNCTION_CODE_PATH.to_string(),
        Value::String(format!("build/{stack_name}.zip")),
    );

    debug!("Derived function-compute parameters for {stack_name}");
}

/// Derives the user-pool bucket name and the optional trigger fragments.
///
/// A configured trigger ARN renders as a ready-to-embed YAML fragment; an
/// absent one renders as the empty string so the emitted template never
/// carries a dangling reference.
fn derive_identity_pool(parameters: &mut ParameterSet) {
    let stack_name = str_param(parameters, KEY_STACK_NAME).unwrap_or_default().to_string();

    parameters.insert(
        KEY_USER_POOL_BUCKET.to_string(),
        Value::String(format!("{}-userpool", stack_name.to_lowercase())),
    );

    let trigger = |parameters: &ParameterSet, arn_key: &str, fragment: &str| -> String {
        parameters
            .get(KEY_LAMBDA_CONFIG)
            .and_then(Value::as_object)
            .and_then(|config| config.get(arn_key))
            .and_then(Value::as_str)
            .map(|arn| format!("{fragment}: \"{arn}\""))
            .unwrap_or_default()
    };

    let post_confirmation = trigger(parameters, ARN_POST_CONFIRMATION, "PostConfirmation");
    let pre_token = trigger(parameters, ARN_PRE_TOKEN, "PreTokenGeneration");

    parameters.insert(
        KEY_POST_CONFIRMATION_TRIGGER.to_string(),
        Value::String(post_confirmation),
    );
    parameters.insert(KEY_PRE_TOKEN_TRIGGER.to_string(), Value::String(pre_token));

    debug!("Derived identity-pool parameters for {stack_name}");
}
