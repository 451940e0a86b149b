//! API document → typed routes.
//!
//! # Responsibilities
//! - Resolve `${variables}` in URIs and literals from the gateway configuration
//! - Parse templates, expressions, patterns and header expressions once
//! - Check every cross-reference (captures, schemes, validators, statuses)
//! - Collect all problems instead of stopping at the first
//!
//! # Design Decisions
//! - Output is immutable; nothing here is consulted per request
//! - Errors carry a `paths./x.get...` style location so operators can find them

use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use url::Url;

use crate::document::model::{
    ApiDocument, IntegrationDef, MockResponseDef, Operation, ResponseDef, SchemaDef,
};
use crate::gateway::validator::{ParameterLocation, RequestValidator, RequiredParameter};
use crate::integration::mapper::{ParamBinding, ParamMap, ParamSource, ParamTarget};
use crate::integration::{Integration, MockResponse, UriTemplate};
use crate::response::{HeaderExpr, Predicate, ResponseRules, ResponseSpec};
use crate::routing::{MethodMatch, PathTemplate, Route};
use crate::security::SecurityScheme;

const RESPONSE_HEADER_PREFIX: &str = "method.response.header.";
const SIGNED_AUTH_TYPE: &str = "signed";

/// One semantic problem in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub location: String,
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Every problem found in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileErrors(pub Vec<CompileError>);

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} error(s) in API document:", self.0.len())?;
        for err in &self.0 {
            writeln!(f, "  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {}

/// The compiled document.
#[derive(Debug, Clone)]
pub struct CompiledApi {
    pub title: String,
    pub version: Option<String>,
    pub routes: Vec<Route>,
}

struct Compiler<'a> {
    doc: &'a ApiDocument,
    variables: &'a BTreeMap<String, String>,
    errors: Vec<CompileError>,
}

pub fn compile(
    doc: &ApiDocument,
    variables: &BTreeMap<String, String>,
) -> Result<CompiledApi, CompileErrors> {
    let mut compiler = Compiler {
        doc,
        variables,
        errors: Vec::new(),
    };
    let routes = compiler.compile_routes();

    if compiler.errors.is_empty() {
        Ok(CompiledApi {
            title: doc.info.title.clone(),
            version: doc.info.version.clone(),
            routes,
        })
    } else {
        Err(CompileErrors(compiler.errors))
    }
}

/// Replace `${name}` placeholders; returns the first unknown name on failure.
pub fn interpolate(text: &str, variables: &BTreeMap<String, String>) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(after.to_string());
        };
        let name = &after[..end];
        let value = variables.get(name).ok_or_else(|| name.to_string())?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

impl<'a> Compiler<'a> {
    fn error(&mut self, location: &str, message: impl Into<String>) {
        self.errors.push(CompileError {
            location: location.to_string(),
            message: message.into(),
        });
    }

    fn compile_routes(&mut self) -> Vec<Route> {
        let doc = self.doc;
        let mut routes: Vec<Route> = Vec::new();
        let mut seen: Vec<(PathTemplate, MethodMatch)> = Vec::new();

        if let Some(name) = &doc.request_validator {
            if doc.request_validators.get(name).is_none() {
                self.error(
                    "x-gateway-request-validator",
                    format!("unknown request validator `{}`", name),
                );
            }
        }

        for (path, item) in doc.paths.iter() {
            let path_location = format!("paths.{}", path);
            let template = match PathTemplate::parse(path) {
                Ok(template) => template,
                Err(e) => {
                    self.error(&path_location, e.to_string());
                    continue;
                }
            };

            for (method_key, operation) in item.iter() {
                let location = format!("{}.{}", path_location, method_key);
                let Some(method) = MethodMatch::parse(method_key) else {
                    self.error(&location, format!("unsupported method `{}`", method_key));
                    continue;
                };

                let duplicate = seen
                    .iter()
                    .any(|(t, m)| *m == method && t.same_shape(&template));
                if duplicate {
                    self.error(
                        &location,
                        format!("another route already serves {} on this path shape", method),
                    );
                    continue;
                }
                seen.push((template.clone(), method.clone()));

                if let Some(route) = self.compile_route(&location, &template, method, operation) {
                    routes.push(route);
                }
            }
        }

        routes
    }

    fn compile_route(
        &mut self,
        location: &str,
        template: &PathTemplate,
        method: MethodMatch,
        operation: &'a Operation,
    ) -> Option<Route> {
        let errors_before = self.errors.len();
        let id = format!("{} {}", method, template);

        let security = self.compile_security(location, operation);
        let validator = self.compile_validator(location, operation);
        let (integration, responses) = match &operation.integration {
            Some(def) => self.compile_integration(&format!("{}.x-gateway-integration", location), template, operation, def),
            None => {
                let mock = self.mock_response(location, operation, None);
                let mut rules = ResponseRules::new();
                rules.push("default", Predicate::Default, self.response_spec(operation, mock.status));
                (Some(Integration::Mock(mock)), rules)
            }
        };

        self.check_declared_statuses(location, operation, &responses);

        if self.errors.len() > errors_before {
            return None;
        }
        let integration = integration?;

        tracing::debug!(route = %id, integration = integration.kind(), "Compiled route");
        Some(Route {
            id,
            template: template.clone(),
            method,
            summary: operation.summary.clone(),
            tags: operation.tags.iter().cloned().collect::<BTreeSet<_>>(),
            validator,
            security,
            integration,
            responses,
        })
    }

    fn compile_security(&mut self, location: &str, operation: &'a Operation) -> Option<SecurityScheme> {
        let doc = self.doc;
        let requirement = operation.security.first()?;
        let (name, _scopes) = requirement.iter().next()?;
        let location = format!("{}.security", location);

        let Some(def) = doc.components.security_schemes.get(name) else {
            self.error(&location, format!("undeclared security scheme `{}`", name));
            return None;
        };

        if def.auth_type.as_deref() == Some(SIGNED_AUTH_TYPE) {
            return Some(SecurityScheme::SignedRequest {
                name: name.to_string(),
            });
        }

        let header_scheme = def.kind == "apiKey" && def.location.as_deref().unwrap_or("header") == "header";
        if !header_scheme {
            self.error(
                &location,
                format!("security scheme `{}` must be an apiKey in a header", name),
            );
            return None;
        }
        let header_name = def.name.as_deref().unwrap_or("x-api-key");
        match HeaderName::from_bytes(header_name.as_bytes()) {
            Ok(header) => Some(SecurityScheme::ApiKey {
                name: name.to_string(),
                header,
            }),
            Err(_) => {
                self.error(&location, format!("invalid header name `{}`", header_name));
                None
            }
        }
    }

    fn compile_validator(&mut self, location: &str, operation: &'a Operation) -> Option<RequestValidator> {
        let doc = self.doc;
        let name = operation
            .request_validator
            .as_ref()
            .or(doc.request_validator.as_ref())?;
        let Some(def) = doc.request_validators.get(name) else {
            // the document-level default is reported once, in compile_routes
            if operation.request_validator.is_some() {
                self.error(location, format!("unknown request validator `{}`", name));
            }
            return None;
        };

        let mut required = Vec::new();
        for param in operation.parameters.iter().filter(|p| p.required) {
            match ParameterLocation::parse(&param.location) {
                Some(param_location) => required.push(RequiredParameter {
                    name: param.name.clone(),
                    location: param_location,
                }),
                None => self.error(
                    &format!("{}.parameters.{}", location, param.name),
                    format!("unsupported parameter location `{}`", param.location),
                ),
            }
        }

        Some(RequestValidator {
            name: name.clone(),
            validate_body: def.validate_request_body,
            validate_parameters: def.validate_request_parameters,
            required,
            body_required: operation.request_body.as_ref().is_some_and(|b| b.required),
        })
    }

    fn compile_integration(
        &mut self,
        location: &str,
        template: &PathTemplate,
        operation: &'a Operation,
        def: &'a IntegrationDef,
    ) -> (Option<Integration>, ResponseRules) {
        let params = self.compile_params(location, template, def);
        let mut responses = self.compile_responses(location, operation, def);

        let integration = match def.kind.as_str() {
            "mock" => {
                let mock = self.mock_response(location, operation, def.mock_response.as_ref());
                if responses.is_empty() {
                    responses.push("default", Predicate::Default, self.response_spec(operation, mock.status));
                }
                Some(Integration::Mock(mock))
            }
            "http" => {
                if responses.is_empty() {
                    self.error(location, "http integrations must declare at least one response");
                }
                let method = self.http_method(location, def);
                self.http_integration(location, def, method, params)
            }
            "http_proxy" => {
                if responses.is_empty() {
                    responses.push("default", Predicate::Default, self.response_spec(operation, StatusCode::OK));
                }
                self.proxy_integration(location, template, def, params)
            }
            other => {
                self.error(location, format!("unsupported integration type `{}`", other));
                None
            }
        };

        (integration, responses)
    }

    fn compile_params(&mut self, location: &str, template: &PathTemplate, def: &IntegrationDef) -> ParamMap {
        let mut bindings = Vec::new();
        for (target_expr, source_expr) in def.request_parameters.iter() {
            let param_location = format!("{}.requestParameters.{}", location, target_expr);
            let target = match ParamTarget::parse(target_expr) {
                Ok(target) => target,
                Err(e) => {
                    self.error(&param_location, e.to_string());
                    continue;
                }
            };
            let source_text = match interpolate(source_expr, self.variables) {
                Ok(text) => text,
                Err(name) => {
                    self.error(&param_location, format!("unknown variable `${{{}}}`", name));
                    continue;
                }
            };
            let source = match ParamSource::parse(&source_text) {
                Ok(source) => source,
                Err(e) => {
                    self.error(&param_location, e.to_string());
                    continue;
                }
            };

            if let ParamSource::PathCapture(name) = &source {
                if !template.param_names().any(|p| p == name) {
                    self.error(
                        &param_location,
                        format!("path capture `{}` is not produced by `{}`", name, template),
                    );
                    continue;
                }
            }
            if let ParamTarget::Header(name) = &target {
                if HeaderName::from_bytes(name.as_bytes()).is_err() {
                    self.error(&param_location, format!("invalid header name `{}`", name));
                    continue;
                }
            }
            bindings.push(ParamBinding { target, source });
        }
        ParamMap::new(bindings)
    }

    fn http_method(&mut self, location: &str, def: &IntegrationDef) -> Option<Method> {
        let raw = def.http_method.as_deref()?;
        if raw.eq_ignore_ascii_case("any") {
            return None;
        }
        match MethodMatch::parse(raw) {
            Some(MethodMatch::Exact(method)) => Some(method),
            _ => {
                self.error(location, format!("unsupported httpMethod `{}`", raw));
                None
            }
        }
    }

    fn upstream_uri(&mut self, location: &str, def: &IntegrationDef) -> Option<UriTemplate> {
        let Some(raw) = def.uri.as_deref() else {
            self.error(location, "missing `uri`");
            return None;
        };
        let expanded = match interpolate(raw, self.variables) {
            Ok(expanded) => expanded,
            Err(name) => {
                self.error(location, format!("unknown variable `${{{}}}` in uri", name));
                return None;
            }
        };
        match UriTemplate::parse(&expanded) {
            Ok(uri) => Some(uri),
            Err(e) => {
                self.error(location, e.to_string());
                None
            }
        }
    }

    fn http_integration(
        &mut self,
        location: &str,
        def: &IntegrationDef,
        method: Option<Method>,
        params: ParamMap,
    ) -> Option<Integration> {
        let uri = self.upstream_uri(location, def)?;

        if uri.is_fixed() {
            return match Url::parse(uri.as_str()) {
                Ok(url) => Some(Integration::FixedHttp {
                    method,
                    uri: url,
                    params,
                }),
                Err(e) => {
                    self.error(location, format!("invalid uri `{}`: {}", uri, e));
                    None
                }
            };
        }

        let uncovered: Vec<String> = uri
            .tokens()
            .filter(|token| !params.binds_path(token))
            .map(str::to_string)
            .collect();
        for token in &uncovered {
            self.error(location, format!("uri token `{{{}}}` has no requestParameters mapping", token));
        }
        if !uncovered.is_empty() {
            return None;
        }

        Some(Integration::TemplatedHttp { method, uri, params })
    }

    fn proxy_integration(
        &mut self,
        location: &str,
        template: &PathTemplate,
        def: &IntegrationDef,
        params: ParamMap,
    ) -> Option<Integration> {
        let uri = self.upstream_uri(location, def)?;
        let Some(greedy) = template.greedy_param() else {
            self.error(location, format!("http_proxy requires a greedy segment in `{}`", template));
            return None;
        };
        let Some(suffix) = uri.trailing_token().map(str::to_string) else {
            self.error(location, format!("http_proxy uri `{}` must end with a `{{token}}`", uri));
            return None;
        };
        if suffix != greedy && !params.binds_path(&suffix) {
            self.error(
                location,
                format!("uri token `{{{}}}` is neither the greedy capture nor mapped", suffix),
            );
            return None;
        }

        let prefix = uri.without_trailing_token();
        let uncovered: Vec<String> = prefix
            .tokens()
            .filter(|token| !params.binds_path(token))
            .map(str::to_string)
            .collect();
        for token in &uncovered {
            self.error(location, format!("uri token `{{{}}}` has no requestParameters mapping", token));
        }
        if !uncovered.is_empty() {
            return None;
        }

        Some(Integration::ProxyHttp { prefix, suffix, params })
    }

    fn compile_responses(&mut self, location: &str, operation: &'a Operation, def: &'a IntegrationDef) -> ResponseRules {
        let mut rules = ResponseRules::new();
        for (pattern, response) in def.responses.iter() {
            let rule_location = format!("{}.responses.{}", location, pattern);
            let predicate = match Predicate::parse(pattern) {
                Ok(predicate) => predicate,
                Err(e) => {
                    self.error(&rule_location, e.to_string());
                    continue;
                }
            };
            let Some(status) = response
                .status_code
                .as_u16()
                .and_then(|code| StatusCode::from_u16(code).ok())
            else {
                self.error(&rule_location, format!("invalid statusCode `{}`", response.status_code));
                continue;
            };

            let mut spec = self.response_spec(operation, status);
            for (target, expr) in response.response_parameters.iter() {
                let header = target
                    .strip_prefix(RESPONSE_HEADER_PREFIX)
                    .and_then(|name| HeaderName::from_bytes(name.as_bytes()).ok());
                let Some(header) = header else {
                    self.error(&rule_location, format!("unsupported response parameter `{}`", target));
                    continue;
                };
                match HeaderExpr::parse(expr) {
                    Ok(expr) => spec.headers.push((header, expr)),
                    Err(e) => self.error(&rule_location, e.to_string()),
                }
            }
            rules.push(pattern, predicate, spec);
        }
        rules
    }

    /// Declared response details for `status`, following `$ref`s.
    fn response_spec(&self, operation: &'a Operation, status: StatusCode) -> ResponseSpec {
        let mut spec = ResponseSpec::new(status);
        let Some(response) = self.operation_response(operation, status) else {
            return spec;
        };
        spec.description = response.description.clone();
        if let Some((content_type, media)) = response.content.iter().next() {
            spec.content_type = Some(content_type.to_string());
            spec.schema_ref = media.schema.as_ref().and_then(|s| s.reference.clone());
        }
        spec
    }

    fn operation_response(&self, operation: &'a Operation, status: StatusCode) -> Option<&'a ResponseDef> {
        let response = operation.responses.get(status.as_str())?;
        self.resolve_response(response)
    }

    fn resolve_response(&self, response: &'a ResponseDef) -> Option<&'a ResponseDef> {
        let doc = self.doc;
        match &response.reference {
            Some(reference) => {
                let name = reference.strip_prefix("#/components/responses/")?;
                doc.components.responses.get(name)
            }
            None => Some(response),
        }
    }

    fn check_declared_statuses(&mut self, location: &str, operation: &'a Operation, rules: &ResponseRules) {
        let produced: BTreeSet<StatusCode> = rules.statuses().collect();
        for (key, response) in operation.responses.iter() {
            if self.resolve_response(response).is_none() {
                self.error(
                    &format!("{}.responses.{}", location, key),
                    format!("unresolved $ref `{}`", response.reference.as_deref().unwrap_or_default()),
                );
            }
            if key == "default" {
                continue;
            }
            match key.parse::<u16>().ok().and_then(|c| StatusCode::from_u16(c).ok()) {
                Some(status) if produced.contains(&status) => {}
                Some(status) => self.error(
                    &format!("{}.responses.{}", location, key),
                    format!("status {} is not produced by any integration response", status.as_u16()),
                ),
                None => self.error(
                    &format!("{}.responses.{}", location, key),
                    "response keys must be status codes",
                ),
            }
        }
    }

    fn mock_response(
        &mut self,
        location: &str,
        operation: &'a Operation,
        def: Option<&'a MockResponseDef>,
    ) -> MockResponse {
        let status = match def.and_then(|d| d.status_code.as_ref()) {
            Some(code) => match code.as_u16().and_then(|c| StatusCode::from_u16(c).ok()) {
                Some(status) => status,
                None => {
                    self.error(location, format!("invalid mockResponse statusCode `{}`", code));
                    StatusCode::OK
                }
            },
            None => StatusCode::OK,
        };

        let body = def
            .and_then(|d| d.body.clone())
            .or_else(|| self.example_for(operation, StatusCode::OK));

        match body {
            Some(serde_json::Value::String(text)) => {
                MockResponse::new(status).with_body(text, "text/plain; charset=utf-8")
            }
            Some(value) => MockResponse::new(status).with_body(value.to_string(), "application/json"),
            None => MockResponse::new(status),
        }
    }

    /// Example of the schema declared for `status`, if any.
    fn example_for(&self, operation: &'a Operation, status: StatusCode) -> Option<serde_json::Value> {
        let response = self.operation_response(operation, status)?;
        let (_, media) = response.content.iter().next()?;
        let schema = media.schema.as_ref()?;
        self.resolve_schema(schema)?.example.clone()
    }

    fn resolve_schema(&self, schema: &'a SchemaDef) -> Option<&'a SchemaDef> {
        let doc = self.doc;
        match &schema.reference {
            Some(reference) => {
                let name = reference.strip_prefix("#/components/schemas/")?;
                doc.components.schemas.get(name)
            }
            None => Some(schema),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn variables() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("ledger_url".to_string(), "https://ledger.example.com/".to_string()),
            ("token".to_string(), "T0K3N".to_string()),
        ])
    }

    fn compile_yaml(yaml: &str) -> Result<CompiledApi, CompileErrors> {
        let doc = parse_document(yaml).unwrap();
        compile(&doc, &variables())
    }

    const LEDGER: &str = r##"
info:
  title: Ledger
x-gateway-request-validators:
  params-only:
    validateRequestBody: false
    validateRequestParameters: true
x-gateway-request-validator: params-only
paths:
  /ledger/transaction/{id}:
    get:
      tags: [ledger]
      parameters:
        - { in: path, name: id, required: true }
      security:
        - apiKeyAuth: []
      x-gateway-integration:
        type: http
        httpMethod: GET
        uri: "${ledger_url}transactions/{id}"
        requestParameters:
          integration.request.path.id: method.request.path.id
          integration.request.header.Authorization: "'Bearer ${token}'"
        responses:
          default:
            statusCode: "200"
            responseParameters:
              method.response.header.Access-Control-Allow-Origin: "'*'"
          ".*403.*":
            statusCode: "403"
      responses:
        "200":
          $ref: "#/components/responses/Success"
        "403":
          description: Forbidden
components:
  securitySchemes:
    apiKeyAuth: { type: apiKey, name: x-api-key, in: header }
  responses:
    Success:
      description: ok
      content:
        application/json:
          schema:
            $ref: "#/components/schemas/Success"
  schemas:
    Success:
      type: object
      example: { message: Success }
"##;

    #[test]
    fn test_compiles_templated_route() {
        let api = compile_yaml(LEDGER).unwrap();
        assert_eq!(api.title, "Ledger");
        assert_eq!(api.routes.len(), 1);

        let route = &api.routes[0];
        assert_eq!(route.id, "GET /ledger/transaction/{id}");
        assert!(route.tags.contains("ledger"));
        assert!(route.requires_validation());
        assert!(matches!(route.security, Some(SecurityScheme::ApiKey { .. })));

        match &route.integration {
            Integration::TemplatedHttp { method, uri, params } => {
                assert_eq!(method.as_ref(), Some(&Method::GET));
                assert_eq!(uri.as_str(), "https://ledger.example.com/transactions/{id}");
                let literal = params
                    .iter()
                    .find_map(|b| match &b.source {
                        ParamSource::Literal(value) => Some(value.clone()),
                        _ => None,
                    })
                    .unwrap();
                assert_eq!(literal, "Bearer T0K3N");
            }
            other => panic!("unexpected integration {:?}", other),
        }

        let default = route.responses.default_spec().unwrap();
        assert_eq!(default.content_type.as_deref(), Some("application/json"));
        assert_eq!(default.schema_ref.as_deref(), Some("#/components/schemas/Success"));
        assert_eq!(default.headers.len(), 1);
        assert_eq!(route.responses.rules()[0].spec.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_operation_without_integration_is_a_mock() {
        let api = compile_yaml(
            r#"
info: { title: T }
paths:
  /test:
    get:
      responses:
        "200":
          content:
            application/json:
              schema: { example: { message: Success } }
"#,
        )
        .unwrap();

        let Integration::Mock(mock) = &api.routes[0].integration else {
            panic!("expected a mock integration");
        };
        assert_eq!(mock.status, StatusCode::OK);
        assert_eq!(&mock.body[..], br#"{"message":"Success"}"#);
        assert_eq!(mock.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_proxy_route_splits_prefix_and_suffix() {
        let api = compile_yaml(
            r#"
info: { title: T }
paths:
  /inventory/{proxy+}:
    x-gateway-any-method:
      x-gateway-integration:
        type: http_proxy
        uri: "https://inventory.example.com/api/v1/{proxy}"
        requestParameters:
          integration.request.path.proxy: method.request.path.proxy
          integration.request.querystring.authtoken: "'${token}'"
"#,
        )
        .unwrap();

        let route = &api.routes[0];
        assert_eq!(route.method, MethodMatch::Any);
        let Integration::ProxyHttp { prefix, suffix, .. } = &route.integration else {
            panic!("expected a proxy integration");
        };
        assert_eq!(prefix.as_str(), "https://inventory.example.com/api/v1/");
        assert_eq!(suffix, "proxy");
        assert!(route.responses.default_spec().is_some());
    }

    #[test]
    fn test_reports_every_problem_at_once() {
        let errors = compile_yaml(
            r#"
info: { title: T }
x-gateway-request-validator: missing-validator
paths:
  /a/{id}:
    get:
      security:
        - nowhere: []
      x-gateway-integration:
        type: http
        uri: "${unknown_var}/a"
        requestParameters:
          integration.request.path.id: method.request.path.other
        responses:
          ".*403.*": { statusCode: "403" }
      responses:
        "500": { description: boom }
  /b/{name}:
    get:
      x-gateway-integration:
        type: http
        uri: "https://b.example.com/{name}"
        responses:
          "(4|5)\\d\\d": { statusCode: "400" }
  /b/{other}:
    get: {}
  /c:
    post:
      x-gateway-integration:
        type: http_proxy
        uri: "https://c.example.com/{rest}"
"#,
        )
        .unwrap_err();

        let text = errors.to_string();
        for needle in [
            "unknown request validator `missing-validator`",
            "undeclared security scheme `nowhere`",
            "unknown variable `${unknown_var}`",
            "path capture `other` is not produced",
            "status 500 is not produced",
            "uri token `{name}` has no requestParameters mapping",
            "unsupported response pattern",
            "another route already serves GET",
            "http_proxy requires a greedy segment",
        ] {
            assert!(text.contains(needle), "missing `{}` in:\n{}", needle, text);
        }
    }

    #[test]
    fn test_interpolates_variables() {
        let vars = variables();
        assert_eq!(interpolate("${ledger_url}x", &vars).unwrap(), "https://ledger.example.com/x");
        assert_eq!(interpolate("{id}", &vars).unwrap(), "{id}");
        assert_eq!(interpolate("${nope}", &vars).unwrap_err(), "nope");
    }
}
