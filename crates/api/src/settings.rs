//! Credential and endpoint resolution.
//!
//! Every setting has one primary (`VOLC_*`) name and zero or more legacy
//! aliases. The first non-empty value wins. Settings are resolved once at
//! process start and then passed around by value; the process environment is
//! never rewritten. Subprocesses that expect the unified names receive them
//! through [`CloudSettings::exported_env`].

use std::env;

use url::Url;

use crate::ApiError;

pub const ACCESS_KEY_VAR: &str = "VOLC_ACCESSKEY";
pub const SECRET_KEY_VAR: &str = "VOLC_SECRETKEY";
pub const REGION_VAR: &str = "VOLC_REGION";
pub const SERVICE_VAR: &str = "VOLC_AGENTKIT_SERVICE";
pub const HOST_VAR: &str = "VOLC_AGENTKIT_HOST";

const DEFAULT_REGION: &str = "cn-beijing";
const DEFAULT_SERVICE: &str = "agentkit";
const DEFAULT_HOST: &str = "open.volcengineapi.com";

/// Hostnames allowed to use plain HTTP.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Primary variable name followed by the legacy names accepted as fallback.
pub const SETTING_ALIASES: &[(&str, &[&str])] = &[
    (ACCESS_KEY_VAR, &["AGENTKIT_ACCESS_KEY", "VOLCENGINE_ACCESS_KEY"]),
    (SECRET_KEY_VAR, &["AGENTKIT_SECRET_KEY", "VOLCENGINE_SECRET_KEY"]),
    (REGION_VAR, &["AGENTKIT_REGION"]),
    (SERVICE_VAR, &["AGENTKIT_SERVICE"]),
    (HOST_VAR, &["AGENTKIT_BASE_URL"]),
];

/// Resolved cloud credentials and endpoint settings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CloudSettings {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: String,
    pub service: String,
    pub host: String,
}

impl std::fmt::Debug for CloudSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSettings")
            .field("access_key", &self.access_key.as_ref().map(|_| agentkit_util::REDACTED))
            .field("secret_key", &self.secret_key.as_ref().map(|_| agentkit_util::REDACTED))
            .field("region", &self.region)
            .field("service", &self.service)
            .field("host", &self.host)
            .finish()
    }
}

impl CloudSettings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let resolve = |primary: &str| -> Option<String> {
            let fallbacks = SETTING_ALIASES
                .iter()
                .find(|(name, _)| *name == primary)
                .map(|(_, fallbacks)| *fallbacks)
                .unwrap_or_default();
            std::iter::once(primary)
                .chain(fallbacks.iter().copied())
                .filter_map(|name| lookup(name))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        Self {
            access_key: resolve(ACCESS_KEY_VAR),
            secret_key: resolve(SECRET_KEY_VAR),
            region: resolve(REGION_VAR).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            service: resolve(SERVICE_VAR).unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
            host: resolve(HOST_VAR).unwrap_or_else(|| DEFAULT_HOST.to_string()),
        }
    }

    /// Access/secret key pair, or [`ApiError::MissingCredentials`].
    pub fn credentials(&self) -> Result<(&str, &str), ApiError> {
        match (self.access_key.as_deref(), self.secret_key.as_deref()) {
            (Some(access_key), Some(secret_key)) => Ok((access_key, secret_key)),
            _ => Err(ApiError::MissingCredentials),
        }
    }

    /// Settings under their primary names, for handing to child processes.
    pub fn exported_env(&self) -> Vec<(&'static str, String)> {
        let mut exported = Vec::with_capacity(SETTING_ALIASES.len());
        if let Some(access_key) = &self.access_key {
            exported.push((ACCESS_KEY_VAR, access_key.clone()));
        }
        if let Some(secret_key) = &self.secret_key {
            exported.push((SECRET_KEY_VAR, secret_key.clone()));
        }
        exported.push((REGION_VAR, self.region.clone()));
        exported.push((SERVICE_VAR, self.service.clone()));
        exported.push((HOST_VAR, self.host.clone()));
        exported
    }

    /// Base URL of the OpenAPI gateway.
    ///
    /// A bare host becomes `https://<host>/`. A full URL is used as given,
    /// but only localhost may use a scheme other than HTTPS.
    pub fn endpoint(&self) -> Result<Url, ApiError> {
        let raw = if self.host.contains("://") {
            self.host.clone()
        } else {
            format!("https://{}", self.host)
        };
        let invalid = |reason: String| ApiError::InvalidEndpoint {
            endpoint: self.host.clone(),
            reason,
        };

        let parsed = Url::parse(&raw).map_err(|error| invalid(error.to_string()))?;
        let host_name = parsed.host_str().ok_or_else(|| invalid("missing host".to_string()))?;

        let is_local = LOCALHOST_DOMAINS
            .iter()
            .any(|&allowed| host_name.eq_ignore_ascii_case(allowed));
        if !is_local && parsed.scheme() != "https" {
            return Err(invalid(format!(
                "must use https for non-localhost hosts; got '{}://'",
                parsed.scheme()
            )));
        }
        Ok(parsed)
    }
}
