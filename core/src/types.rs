//! DTOs for the `life` service.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! the integration tests catch drift between the two crates. Field names
//! are PascalCase on the wire.

use serde::{Deserialize, Serialize};

/// Request shared by the three `life` endpoints. Each field is optional;
/// absent fields are left out of the query, headers and body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Req {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_string: Option<String>,
}

/// Echo returned by the `life` endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_string: Option<String>,
    /// The request body as the server decoded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}
