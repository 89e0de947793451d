//! Form input validation.
//!
//! Values reach the daemon as separate argv entries (never through a
//! shell), but names and destinations are still restricted to keep them
//! from being read as flags or smuggling control characters.

use crate::i18n;
use crate::serve::{AdvertiseServiceParams, EndpointParams, UpdateEndpointParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const FORBIDDEN_CHARS: &[char] = &[';', ' ', '\n', '\r', '`', '\0'];

/// Protocols accepted by `tailscale serve --<protocol>=<port>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Https,
    Http,
    TcpTls,
    Tcp,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [Protocol::Https, Protocol::Http, Protocol::TcpTls, Protocol::Tcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Http => "http",
            Protocol::TcpTls => "tcp+tls",
            Protocol::Tcp => "tcp",
        }
    }

    /// Port the form suggests when this protocol is picked.
    pub fn default_port(&self) -> Option<&'static str> {
        match self {
            Protocol::Https => Some("443"),
            Protocol::Http => Some("80"),
            Protocol::TcpTls | Protocol::Tcp => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedProtocol(s.to_string()))
    }
}

/// Form fields, used to label validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ServiceName,
    Protocol,
    ExposePort,
    Destination,
    OldDestination,
    NewDestination,
    Lang,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ServiceName => "service_name",
            Field::Protocol => "protocol",
            Field::ExposePort => "expose_port",
            Field::Destination => "destination",
            Field::OldDestination => "old_destination",
            Field::NewDestination => "new_destination",
            Field::Lang => "lang",
        }
    }

    /// Catalog key of the field label.
    pub fn label_key(&self) -> &'static str {
        match self {
            Field::ServiceName => "form.service_name",
            Field::Protocol => "form.protocol",
            Field::ExposePort => "form.expose_port",
            Field::Destination => "form.destination",
            Field::OldDestination => "form.old_destination",
            Field::NewDestination => "form.new_destination",
            Field::Lang => "settings.language",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{} is required", .0.as_str())]
    Required(Field),

    #[error("{} contains an invalid character", .0.as_str())]
    InvalidCharacter(Field),

    #[error("{} must not start with '-'", .0.as_str())]
    LeadingDash(Field),

    #[error("{} must be numeric", .0.as_str())]
    NotNumeric(Field),

    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Required(field)
            | ValidationError::InvalidCharacter(field)
            | ValidationError::LeadingDash(field)
            | ValidationError::NotNumeric(field) => *field,
            ValidationError::UnsupportedProtocol(_) => Field::Protocol,
            ValidationError::UnsupportedLanguage(_) => Field::Lang,
        }
    }

    /// Catalog key of the message, without the field label.
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::Required(_) => "validation.required",
            ValidationError::InvalidCharacter(_) => "validation.invalid_character",
            ValidationError::LeadingDash(_) => "validation.leading_dash",
            ValidationError::NotNumeric(_) => "validation.not_numeric",
            ValidationError::UnsupportedProtocol(_) => "validation.unsupported_protocol",
            ValidationError::UnsupportedLanguage(_) => "validation.unsupported_language",
        }
    }
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

fn required(field: Field, value: &str) -> ValidationResult<()> {
    if value.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

fn safe_text(field: Field, value: &str) -> ValidationResult<()> {
    required(field, value)?;
    if value.contains(FORBIDDEN_CHARS) {
        return Err(ValidationError::InvalidCharacter(field));
    }
    Ok(())
}

/// Name used as `svc:<name>`; also applied to the `:name` path segment.
pub fn validate_service_name(name: &str) -> ValidationResult<()> {
    required(Field::ServiceName, name)?;
    if name.starts_with('-') {
        return Err(ValidationError::LeadingDash(Field::ServiceName));
    }
    safe_text(Field::ServiceName, name)
}

fn validate_port(port: &str) -> ValidationResult<()> {
    required(Field::ExposePort, port)?;
    if !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NotNumeric(Field::ExposePort));
    }
    Ok(())
}

fn validate_protocol(protocol: &str) -> ValidationResult<Protocol> {
    required(Field::Protocol, protocol)?;
    protocol.parse()
}

fn validate_destination(field: Field, destination: &str) -> ValidationResult<()> {
    if destination.starts_with('-') {
        return Err(ValidationError::LeadingDash(field));
    }
    safe_text(field, destination)
}

/// `POST /services/new`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StoreServiceForm {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub expose_port: String,
    #[serde(default)]
    pub destination: String,
}

impl StoreServiceForm {
    pub fn with_defaults() -> Self {
        Self {
            protocol: Protocol::Https.as_str().to_string(),
            expose_port: "443".to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ValidationResult<AdvertiseServiceParams> {
        validate_service_name(&self.service_name)?;
        let protocol = validate_protocol(&self.protocol)?;
        validate_port(&self.expose_port)?;
        validate_destination(Field::Destination, &self.destination)?;

        Ok(AdvertiseServiceParams {
            service_name: self.service_name.clone(),
            protocol: protocol.as_str().to_string(),
            expose_port: self.expose_port.clone(),
            destination: self.destination.clone(),
        })
    }
}

/// `POST /services/:name/endpoints/new` and `.../delete`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EndpointForm {
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub expose_port: String,
    #[serde(default)]
    pub destination: String,
}

impl EndpointForm {
    pub fn with_defaults() -> Self {
        Self {
            protocol: Protocol::Https.as_str().to_string(),
            expose_port: "443".to_string(),
            destination: String::new(),
        }
    }

    pub fn validate(&self, service_name: &str) -> ValidationResult<EndpointParams> {
        let protocol = validate_protocol(&self.protocol)?;
        validate_port(&self.expose_port)?;
        validate_destination(Field::Destination, &self.destination)?;

        Ok(EndpointParams {
            service_name: service_name.to_string(),
            protocol: protocol.as_str().to_string(),
            expose_port: self.expose_port.clone(),
            destination: self.destination.clone(),
        })
    }
}

/// `POST /services/:name/endpoints/edit`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpdateEndpointForm {
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub expose_port: String,
    #[serde(default)]
    pub old_destination: String,
    #[serde(default)]
    pub new_destination: String,
}

impl UpdateEndpointForm {
    pub fn validate(&self, service_name: &str) -> ValidationResult<UpdateEndpointParams> {
        let protocol = validate_protocol(&self.protocol)?;
        validate_port(&self.expose_port)?;
        validate_destination(Field::OldDestination, &self.old_destination)?;
        validate_destination(Field::NewDestination, &self.new_destination)?;

        Ok(UpdateEndpointParams {
            service_name: service_name.to_string(),
            protocol: protocol.as_str().to_string(),
            expose_port: self.expose_port.clone(),
            old_destination: self.old_destination.clone(),
            new_destination: self.new_destination.clone(),
        })
    }
}

/// `POST /settings`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsForm {
    #[serde(default)]
    pub lang: String,
}

impl UpdateSettingsForm {
    pub fn validate(&self) -> ValidationResult<&str> {
        required(Field::Lang, &self.lang)?;
        if !i18n::is_supported(&self.lang) {
            return Err(ValidationError::UnsupportedLanguage(self.lang.clone()));
        }
        Ok(&self.lang)
    }
}
