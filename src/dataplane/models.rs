//! Wire models for the HAProxy Data Plane API (v2).
//!
//! Only the fields this sidecar writes are modelled. Optional fields are
//! omitted from the JSON when unset so that replaces do not clobber values
//! the API fills in itself.

use serde::{Deserialize, Serialize};

/// Proxy mode shared by frontends and backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Http,
    Tcp,
}

/// Generic `enabled`/`disabled` switch used by several API fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Enabled,
    #[default]
    Disabled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Frontend {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timeout: Option<i64>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub httplog: bool,
    #[serde(rename = "http-use-htx", default, skip_serializing_if = "Option::is_none")]
    pub http_use_htx: Option<Toggle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_options: Option<StatsOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatsOptions {
    #[serde(default)]
    pub stats_enable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_uri_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_refresh_delay: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Bind {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Compression,
    Trace,
    Cache,
    Spoe,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Filter {
    pub index: i64,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFacility {
    Local0,
    Local1,
    Daemon,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Rfc3164,
    Rfc5424,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogTarget {
    pub index: i64,
    pub address: String,
    pub facility: LogFacility,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HttpRuleType {
    SetHeader,
    AddHeader,
    DelHeader,
    Deny,
    Allow,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpRule {
    pub index: i64,
    #[serde(rename = "type")]
    pub rule_type: HttpRuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdr_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdr_format: Option<String>,
}

/// HTTP request rules and response rules share one shape on the wire.
pub type HttpRequestRule = HttpRule;
pub type HttpResponseRule = HttpRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceAlgorithm {
    Leastconn,
    Roundrobin,
    Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Balance {
    pub algorithm: BalanceAlgorithm,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Backend {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Balance>,
    #[serde(default)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verify {
    None,
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Server {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(default)]
    pub ssl: Toggle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_cafile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<Verify>,
    #[serde(default)]
    pub maintenance: Toggle,
}
