//! Client id and secret references.
//!
//! Broker credentials can be given inline or as a reference:
//! `pass::path/in/store` (first line of `pass show`) or `env::VAR_NAME`.

use std::fmt;
use std::process::Command;

use crate::error::{ServerError, ServerResult};

/// Where a credential value comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretRef {
    Pass(String),
    Env(String),
    Inline(String),
}

impl SecretRef {
    pub fn parse(value: &str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path.to_string())
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var.to_string())
        } else {
            Self::Inline(value.to_string())
        }
    }

    /// Looks the value up. `field` names the setting in errors.
    pub fn resolve(&self, field: &str) -> ServerResult<String> {
        match self {
            Self::Inline(value) => Ok(value.clone()),
            Self::Env(var) => std::env::var(var)
                .map(|v| v.trim().to_string())
                .map_err(|_| {
                    ServerError::secret(field, format!("environment variable `{}` is not set", var))
                }),
            Self::Pass(path) => {
                read_pass(path).map_err(|message| ServerError::secret(field, message))
            }
        }
    }
}

// Inline values are the secret itself.
impl fmt::Debug for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass(path) => write!(f, "pass::{}", path),
            Self::Env(var) => write!(f, "env::{}", var),
            Self::Inline(_) => f.write_str("<inline>"),
        }
    }
}

/// Resolves a configured credential value for `field`.
pub fn resolve(field: &str, value: &str) -> ServerResult<String> {
    SecretRef::parse(value).resolve(field)
}

fn read_pass(path: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|e| format!("cannot run pass: {}", e))?;
    if !output.status.success() {
        return Err(format!(
            "pass exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout.lines().next().map(str::trim) {
        Some(first) if !first.is_empty() => Ok(first.to_string()),
        _ => Err(format!("pass entry `{}` is empty", path)),
    }
}
