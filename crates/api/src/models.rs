//! Runtime request models.
//!
//! Inbound JSON may use PascalCase (`KeyAuth`, `ApiKey`) or snake_case
//! (`key_auth`, `api_key`) keys. Each dual-cased shape deserializes through a
//! private `Raw*` struct that sees both spellings and keeps the snake_case one
//! when both are present. Everything serializes back out as PascalCase, the
//! casing the OpenAPI expects, with absent fields omitted.

use std::str::FromStr;

use agentkit_util::{ArgumentError, KeyCase, normalize_keys, parse_json_argument, parse_optional_json_argument};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ApiError;

/// Kind of deployable artifact a Runtime points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// Container image in a registry.
    Image,
    /// Code package in object storage.
    Tos,
}

impl FromStr for ArtifactType {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(ArtifactType::Image),
            "tos" => Ok(ArtifactType::Tos),
            _ => Err(ApiError::InvalidValue {
                field: "artifact_type",
                value: value.to_string(),
                expected: "'image', 'tos'",
            }),
        }
    }
}

/// Static API key authorizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "RawKeyAuth")]
pub struct KeyAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// `HEADER` or `QUERY`; the service validates the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_name: Option<String>,
}

#[derive(Deserialize)]
struct RawKeyAuth {
    api_key: Option<String>,
    #[serde(rename = "ApiKey")]
    api_key_pascal: Option<String>,
    api_key_location: Option<String>,
    #[serde(rename = "ApiKeyLocation")]
    api_key_location_pascal: Option<String>,
    api_key_name: Option<String>,
    #[serde(rename = "ApiKeyName")]
    api_key_name_pascal: Option<String>,
}

impl From<RawKeyAuth> for KeyAuth {
    fn from(raw: RawKeyAuth) -> Self {
        Self {
            api_key: raw.api_key.or(raw.api_key_pascal),
            api_key_location: raw.api_key_location.or(raw.api_key_location_pascal),
            api_key_name: raw.api_key_name.or(raw.api_key_name_pascal),
        }
    }
}

/// JWT authorizer backed by an OIDC discovery document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "RawCustomJwtAuthorizer")]
pub struct CustomJwtAuthorizer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_clients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_url: Option<String>,
}

#[derive(Deserialize)]
struct RawCustomJwtAuthorizer {
    allowed_clients: Option<Vec<String>>,
    #[serde(rename = "AllowedClients")]
    allowed_clients_pascal: Option<Vec<String>>,
    discovery_url: Option<String>,
    #[serde(rename = "DiscoveryUrl")]
    discovery_url_pascal: Option<String>,
}

impl From<RawCustomJwtAuthorizer> for CustomJwtAuthorizer {
    fn from(raw: RawCustomJwtAuthorizer) -> Self {
        Self {
            allowed_clients: raw.allowed_clients.or(raw.allowed_clients_pascal),
            discovery_url: raw.discovery_url.or(raw.discovery_url_pascal),
        }
    }
}

/// Inbound authentication for a Runtime.
///
/// Both shapes may be present; the service decides whether that is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "RawAuthorizerConfiguration")]
pub struct AuthorizerConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_auth: Option<KeyAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_jwt_authorizer: Option<CustomJwtAuthorizer>,
}

#[derive(Deserialize)]
struct RawAuthorizerConfiguration {
    key_auth: Option<KeyAuth>,
    #[serde(rename = "KeyAuth")]
    key_auth_pascal: Option<KeyAuth>,
    custom_jwt_authorizer: Option<CustomJwtAuthorizer>,
    #[serde(rename = "CustomJwtAuthorizer")]
    custom_jwt_authorizer_pascal: Option<CustomJwtAuthorizer>,
}

impl From<RawAuthorizerConfiguration> for AuthorizerConfiguration {
    fn from(raw: RawAuthorizerConfiguration) -> Self {
        Self {
            key_auth: raw.key_auth.or(raw.key_auth_pascal),
            custom_jwt_authorizer: raw.custom_jwt_authorizer.or(raw.custom_jwt_authorizer_pascal),
        }
    }
}

impl AuthorizerConfiguration {
    /// Decode the JSON text of the `authorizer_configuration` tool argument.
    pub fn from_json_argument(text: &str) -> Result<Self, ArgumentError> {
        let value = parse_json_argument("authorizer_configuration", text)?;
        decode("authorizer_configuration", value)
    }
}

/// `{Key, Value}` pair used for Runtime environment variables and tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "RawKeyValue")]
pub struct KeyValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Deserialize)]
struct RawKeyValue {
    key: Option<String>,
    #[serde(rename = "Key")]
    key_pascal: Option<String>,
    value: Option<String>,
    #[serde(rename = "Value")]
    value_pascal: Option<String>,
}

impl From<RawKeyValue> for KeyValue {
    fn from(raw: RawKeyValue) -> Self {
        Self {
            key: raw.key.or(raw.key_pascal),
            value: raw.value.or(raw.value_pascal),
        }
    }
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    /// Decode an optional JSON list of pairs from tool argument `argument`.
    ///
    /// A blank argument or an empty list yields `None` so nothing is sent.
    pub fn list_from_json_argument(argument: &str, text: Option<&str>) -> Result<Option<Vec<Self>>, ArgumentError> {
        let Some(value) = parse_optional_json_argument(argument, text)? else {
            return Ok(None);
        };
        let pairs: Vec<Self> = decode(argument, value)?;
        Ok(if pairs.is_empty() { None } else { Some(pairs) })
    }
}

/// Decode the JSON list of list filters, rewriting keys to PascalCase.
///
/// Filters are forwarded as opaque objects such as
/// `{"Type": "Name", "Operator": "Contain", "Values": ["agent"]}`.
pub fn parse_filters(text: Option<&str>) -> Result<Option<Vec<Value>>, ArgumentError> {
    let Some(value) = parse_optional_json_argument("filters", text)? else {
        return Ok(None);
    };
    let filters: Vec<Value> = decode("filters", normalize_keys(value, KeyCase::Pascal))?;
    Ok(if filters.is_empty() { None } else { Some(filters) })
}

fn decode<T: serde::de::DeserializeOwned>(argument: &str, value: Value) -> Result<T, ArgumentError> {
    serde_json::from_value(value).map_err(|source| ArgumentError {
        argument: argument.to_string(),
        source,
    })
}

/// Request for `CreateAgentKitRuntime`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRuntimeRequest {
    pub name: String,
    pub artifact_type: ArtifactType,
    pub artifact_url: String,
    pub role_name: String,
    pub authorizer_configuration: AuthorizerConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envs: Option<Vec<KeyValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<KeyValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apmplus_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
}

/// Request addressing a Runtime by id (`Get`/`Delete`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuntimeIdRequest {
    pub runtime_id: String,
}

/// Request for `UpdateAgentKitRuntime`. Only supplied fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateRuntimeRequest {
    pub runtime_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_configuration: Option<AuthorizerConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envs: Option<Vec<KeyValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<KeyValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
}

/// Request for `ListAgentKitRuntimes`.
///
/// Time bounds are RFC 3339 strings passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRuntimesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

/// Request naming one version of a Runtime (`Release`/`GetVersion`).
///
/// For release, a version number rolls back to that version and `None`
/// releases the latest draft. For inspection, `None` means the current
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuntimeVersionRequest {
    pub runtime_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_number: Option<u32>,
}

/// Request for `ListAgentKitRuntimeVersions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRuntimeVersionsRequest {
    pub runtime_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}
