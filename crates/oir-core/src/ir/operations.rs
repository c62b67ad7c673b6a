use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::models::ModelId;
use super::types::NormalizedName;
use crate::config::TargetLanguage;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    /// Document order in which a path item's operations are visited.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

/// A fully resolved API operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub path: String,
    pub method: HttpMethod,
    /// Declared operationId, or the route-derived name.
    pub operation_id: String,
    /// Rendering identity.
    pub name: NormalizedName,
    pub unique_name: String,
    pub tag_identities: Vec<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub responses: Vec<Response>,
    pub result: Option<ResponseCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub vendor_extensions: IndexMap<String, serde_json::Value>,
    pub identifiers: BTreeMap<TargetLanguage, String>,
}

impl Operation {
    /// The response selected as the happy path.
    pub fn result_response(&self) -> Option<&Response> {
        let code = self.result?;
        self.responses.iter().find(|r| r.code == code)
    }

    pub fn body(&self) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Body)
    }
}

/// Where a parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

/// Serialization of array query/header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    Csv,
    Ssv,
    Pipes,
    Multi,
}

/// A resolved operation parameter or request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub model: ModelId,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Wire name.
    pub name: String,
    /// camelCase lookup name.
    pub prop: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<CollectionFormat>,
    pub is_required: bool,
    pub inlined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub vendor_extensions: IndexMap<String, serde_json::Value>,
}

/// A resolved response. `model` is `None` for responses without a body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub model: Option<ModelId>,
    pub code: ResponseCode,
    pub media_types: Vec<String>,
    pub description: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub vendor_extensions: IndexMap<String, serde_json::Value>,
}

/// A response key: `200`, `2XX` or `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Status(u16),
    /// Leading digit of an `NXX` range.
    Range(u8),
    Default,
}

impl ResponseCode {
    fn sort_key(&self) -> (u16, u16) {
        match self {
            ResponseCode::Status(code) => (*code, 0),
            ResponseCode::Range(digit) => (u16::from(*digit) * 100 + 99, 1),
            ResponseCode::Default => (u16::MAX, 0),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            ResponseCode::Status(code) => (200..300).contains(code),
            ResponseCode::Range(digit) => *digit == 2,
            ResponseCode::Default => false,
        }
    }
}

impl Ord for ResponseCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ResponseCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for ResponseCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(ResponseCode::Default);
        }
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
            return Err(());
        }
        if bytes[1..].eq_ignore_ascii_case(b"XX") {
            return Ok(ResponseCode::Range(bytes[0] - b'0'));
        }
        s.parse::<u16>().map(ResponseCode::Status).map_err(|_| ())
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::Status(code) => write!(f, "{code}"),
            ResponseCode::Range(digit) => write!(f, "{digit}XX"),
            ResponseCode::Default => f.write_str("default"),
        }
    }
}

impl Serialize for ResponseCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> ResponseCode {
        s.parse().unwrap()
    }

    #[test]
    fn parses_response_codes() {
        assert_eq!(code("200"), ResponseCode::Status(200));
        assert_eq!(code("2XX"), ResponseCode::Range(2));
        assert_eq!(code("4xx"), ResponseCode::Range(4));
        assert_eq!(code("default"), ResponseCode::Default);
        assert!("20".parse::<ResponseCode>().is_err());
        assert!("ok".parse::<ResponseCode>().is_err());
        assert!("600".parse::<ResponseCode>().is_err());
        assert!("2X0".parse::<ResponseCode>().is_err());
    }

    #[test]
    fn orders_numeric_then_range_then_default() {
        let mut codes = vec![
            code("default"),
            code("400"),
            code("2XX"),
            code("201"),
            code("299"),
            code("200"),
        ];
        codes.sort();
        let rendered: Vec<String> = codes.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["200", "201", "299", "2XX", "400", "default"]);
    }

    #[test]
    fn success_codes() {
        assert!(code("204").is_success());
        assert!(code("2XX").is_success());
        assert!(!code("default").is_success());
        assert!(!code("302").is_success());
    }
}
