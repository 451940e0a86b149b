//! Raw shape of the API document, as deserialized.
//!
//! Nothing here is validated beyond structure; `compile.rs` turns these types
//! into routes and reports every semantic problem at once.

use serde::de::{Error as _, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;

/// A mapping that keeps declaration order and rejects duplicate keys.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(key) = access.next_key::<String>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(A::Error::custom(format!("duplicate key `{}`", key)));
                    }
                    let value = access.next_value()?;
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// A status code written either as `"200"` or `200`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatusCodeDef {
    Number(u16),
    Text(String),
}

impl StatusCodeDef {
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            StatusCodeDef::Number(code) => Some(*code),
            StatusCodeDef::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl fmt::Display for StatusCodeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCodeDef::Number(code) => write!(f, "{}", code),
            StatusCodeDef::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
    #[serde(default)]
    pub openapi: Option<String>,
    pub info: Info,
    #[serde(default)]
    pub tags: Vec<TagDef>,
    #[serde(default, rename = "x-gateway-request-validators")]
    pub request_validators: OrderedMap<ValidatorDef>,
    /// Validator applied to operations that do not name one.
    #[serde(default, rename = "x-gateway-request-validator")]
    pub request_validator: Option<String>,
    #[serde(default)]
    pub paths: OrderedMap<OrderedMap<Operation>>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Info {
    pub title: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorDef {
    #[serde(default)]
    pub validate_request_body: bool,
    #[serde(default)]
    pub validate_request_parameters: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    /// Alternatives of `scheme name → scopes`; only the first is enforced.
    #[serde(default)]
    pub security: Vec<OrderedMap<Vec<String>>>,
    #[serde(default)]
    pub request_body: Option<RequestBodyDef>,
    #[serde(default, rename = "x-gateway-request-validator")]
    pub request_validator: Option<String>,
    #[serde(default, rename = "x-gateway-integration")]
    pub integration: Option<IntegrationDef>,
    #[serde(default)]
    pub responses: OrderedMap<ResponseDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBodyDef {
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationDef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    /// `integration.request.* → source expression`
    #[serde(default)]
    pub request_parameters: OrderedMap<String>,
    /// `pattern → response`
    #[serde(default)]
    pub responses: OrderedMap<IntegrationResponseDef>,
    #[serde(default)]
    pub mock_response: Option<MockResponseDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponseDef {
    pub status_code: StatusCodeDef,
    /// `method.response.header.<Name> → header expression`
    #[serde(default)]
    pub response_parameters: OrderedMap<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockResponseDef {
    #[serde(default)]
    pub status_code: Option<StatusCodeDef>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

/// An operation or component response; either a `$ref` or inline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseDef {
    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: OrderedMap<MediaTypeDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaTypeDef {
    #[serde(default)]
    pub schema: Option<SchemaDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDef {
    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub example: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub security_schemes: OrderedMap<SecuritySchemeDef>,
    #[serde(default)]
    pub responses: OrderedMap<ResponseDef>,
    #[serde(default)]
    pub schemas: OrderedMap<SchemaDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecuritySchemeDef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "in")]
    pub location: Option<String>,
    /// `signed` selects the signed-request scheme.
    #[serde(default, rename = "x-gateway-auth-type")]
    pub auth_type: Option<String>,
}
