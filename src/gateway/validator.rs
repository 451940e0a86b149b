//! Request validation for routes that opt into it.

use thiserror::Error;

use crate::gateway::request::GatewayRequest;
use crate::routing::Captures;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl ParameterLocation {
    /// Accepts the document spellings `path`, `query`/`querystring` and `header`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(ParameterLocation::Path),
            "query" | "querystring" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredParameter {
    pub name: String,
    pub location: ParameterLocation,
}

/// A named validator bound to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestValidator {
    pub name: String,
    pub validate_body: bool,
    pub validate_parameters: bool,
    /// Parameters the operation declares as required.
    pub required: Vec<RequiredParameter>,
    /// The operation declares a required request body.
    pub body_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("Missing required request parameters: [{}]", .names.join(", "))]
    MissingParameters { names: Vec<String> },

    #[error("Invalid request body")]
    MissingBody,
}

impl RequestValidator {
    pub fn validate(&self, captures: &Captures, request: &GatewayRequest) -> Result<(), ValidationFailure> {
        if self.validate_parameters {
            let names: Vec<String> = self
                .required
                .iter()
                .filter(|param| !Self::is_present(param, captures, request))
                .map(|param| param.name.clone())
                .collect();
            if !names.is_empty() {
                return Err(ValidationFailure::MissingParameters { names });
            }
        }

        if self.validate_body && self.body_required && request.body.is_empty() {
            return Err(ValidationFailure::MissingBody);
        }

        Ok(())
    }

    fn is_present(param: &RequiredParameter, captures: &Captures, request: &GatewayRequest) -> bool {
        match param.location {
            ParameterLocation::Path => captures.get(&param.name).is_some_and(|v| !v.is_empty()),
            ParameterLocation::Query => request.query_param(&param.name).is_some(),
            ParameterLocation::Header => request.header(&param.name).is_some(),
        }
    }
}
