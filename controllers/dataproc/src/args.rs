//! Module argument parsing
//!
//! Arguments arrive as a JSON object, either bare or wrapped in
//! `ANSIBLE_MODULE_ARGS`. Keys starting with `_` belong to the calling tool
//! and are dropped; any other unknown key is rejected.
//!
//! Templated values often arrive as strings, so booleans, integers and lists
//! also accept the string forms the calling tool converts for its own modules.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::cluster::{
    ClusterSpec, DEFAULT_API_REGION, DEFAULT_REGION, DEFAULT_ZONE, DesiredState,
};
use crate::error::ControllerError;
use crate::poller::PollSettings;

const WRAPPER_KEY: &str = "ANSIBLE_MODULE_ARGS";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 1800;

/// A list argument, given either as a list or as a comma-separated string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListArg<T> {
    List(Vec<T>),
    Csv(String),
}

impl<T: From<String>> ListArg<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListArg::List(items) => items,
            ListArg::Csv(csv) => csv
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| T::from(s.to_string()))
                .collect(),
        }
    }
}

/// Booleans as `true`/`false`, `1`/`0`, or strings such as `yes`, `no`, `on`, `off`
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    let Some(raw) = Option::<Raw>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let value = match raw {
        Raw::Bool(b) => b,
        Raw::Int(1) => true,
        Raw::Int(0) => false,
        Raw::Float(f) if f == 1.0 => true,
        Raw::Float(f) if f == 0.0 => false,
        Raw::Text(text) => match text.trim().to_lowercase().as_str() {
            "y" | "yes" | "on" | "1" | "true" | "t" => true,
            "n" | "no" | "off" | "0" | "false" | "f" => false,
            _ => return Err(D::Error::custom(format!("{:?} is not a valid boolean", text))),
        },
        Raw::Int(n) => return Err(D::Error::custom(format!("{} is not a valid boolean", n))),
        Raw::Float(f) => return Err(D::Error::custom(format!("{} is not a valid boolean", f))),
    };
    Ok(Some(value))
}

/// Non-negative integers, also given as a decimal string
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("{:?} is not a valid non-negative integer", text))),
    }
}

/// Raw module arguments
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleArgs {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub subnetwork: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub api_region: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub sync: Option<bool>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub poll_interval: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub poll_timeout: Option<u64>,
    #[serde(default)]
    pub image_version: Option<String>,
    #[serde(default)]
    pub tags: Option<ListArg<String>>,
    #[serde(default)]
    pub service_account_scopes: Option<ListArg<String>>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub init_actions: Option<ListArg<Value>>,
    #[serde(default)]
    pub master_config: Option<Value>,
    #[serde(default)]
    pub worker_config: Option<Value>,
    #[serde(default)]
    pub second_worker_config: Option<Value>,
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Everything one reconcile run needs, validated
#[derive(Debug, Clone)]
pub struct ModuleRequest {
    pub spec: ClusterSpec,
    pub state: DesiredState,
    pub sync: bool,
    pub poll: PollSettings,
}

impl ModuleArgs {
    /// Parse the module arguments document
    pub fn from_json(raw: &str) -> Result<Self, ControllerError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            ControllerError::InvalidArgs(format!("module arguments are not valid JSON: {}", e))
        })?;

        let mut args = match value {
            Value::Object(mut map) => match map.remove(WRAPPER_KEY) {
                Some(Value::Object(inner)) => inner,
                Some(_) => {
                    return Err(ControllerError::InvalidArgs(format!(
                        "{} must be an object",
                        WRAPPER_KEY
                    )));
                }
                None => map,
            },
            _ => {
                return Err(ControllerError::InvalidArgs(
                    "module arguments must be a JSON object".to_string(),
                ));
            }
        };
        args.retain(|key, _| !key.starts_with('_'));

        serde_json::from_value(Value::Object(args))
            .map_err(|e| ControllerError::InvalidArgs(e.to_string()))
    }

    /// Apply defaults and validate against the target project
    pub fn into_request(self, project: &str) -> Result<ModuleRequest, ControllerError> {
        let name = self
            .name
            .ok_or_else(|| ControllerError::InvalidArgs("missing required arguments: name".to_string()))?;
        let state = self
            .state
            .as_deref()
            .map_or(Ok(DesiredState::Present), |s| s.parse::<DesiredState>())?;

        let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let poll_timeout = self.poll_timeout.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);
        if poll_timeout == 0 {
            return Err(ControllerError::InvalidArgs(
                "poll_timeout must be greater than zero".to_string(),
            ));
        }

        let spec = ClusterSpec {
            name,
            project: project.to_string(),
            region: self.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            zone: self.zone.unwrap_or_else(|| DEFAULT_ZONE.to_string()),
            api_region: self.api_region.unwrap_or_else(|| DEFAULT_API_REGION.to_string()),
            network: self.network,
            subnetwork: self.subnetwork,
            tags: self.tags.map(ListArg::into_vec).unwrap_or_default(),
            image_version: self.image_version,
            bucket: self.bucket,
            service_account_scopes: self
                .service_account_scopes
                .map(ListArg::into_vec)
                .unwrap_or_default(),
            metadata: self.metadata.unwrap_or_default(),
            init_actions: self.init_actions.map(ListArg::into_vec).unwrap_or_default(),
            master_config: self.master_config,
            worker_config: self.worker_config,
            second_worker_config: self.second_worker_config,
        }
        .validate()?;

        Ok(ModuleRequest {
            spec,
            state,
            sync: self.sync.unwrap_or(true),
            poll: PollSettings {
                interval: Duration::from_secs(poll_interval),
                timeout: Duration::from_secs(poll_timeout),
            },
        })
    }
}
