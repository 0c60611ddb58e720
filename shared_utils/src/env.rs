use secrecy::SecretString;
use thiserror::Error;

/// An environment variable required by the application is not set.
///
/// A variable that is present but blank counts as missing.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Surrounding whitespace is trimmed; a value that is empty after trimming is
/// reported as missing so a stray `FOO=` line in a `.env` file fails loudly.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

/// Reads a credential from the environment and wraps it so it never shows up
/// in `Debug` output or logs.
pub fn get_secret_env_var(name: &str) -> Result<SecretString, MissingEnvVarError> {
    get_env_var(name).map(|value| SecretString::new(value.into()))
}
