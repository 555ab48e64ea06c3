//! Service-manager property queries.
//!
//! The collector observes unit lifecycle through a [`PropertySource`]: a
//! `(target, property)` lookup returning a typed scalar or string. The
//! production source shells out to `systemctl show`.

mod systemctl;

pub use systemctl::SystemctlPropertySource;

use std::fmt;

use async_trait::async_trait;

use crate::errors::{GhostError, GhostResult};

/// What a property is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyTarget<'a> {
    /// Generic unit interface of the named unit
    Unit(&'a str),
    /// Service-specific interface of the named unit
    Service(&'a str),
    /// The service manager itself
    Manager,
}

impl fmt::Display for PropertyTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyTarget::Unit(name) => write!(f, "unit {}", name),
            PropertyTarget::Service(name) => write!(f, "service {}", name),
            PropertyTarget::Manager => write!(f, "manager"),
        }
    }
}

/// Expected type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Str,
    I32,
    U32,
    I64,
    U64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Str(_) => PropertyKind::Str,
            PropertyValue::I32(_) => PropertyKind::I32,
            PropertyValue::U32(_) => PropertyKind::U32,
            PropertyValue::I64(_) => PropertyKind::I64,
            PropertyValue::U64(_) => PropertyKind::U64,
        }
    }

    /// Decode the textual form of a property as `kind`.
    pub fn parse(kind: PropertyKind, raw: &str) -> Result<Self, String> {
        let text = raw.trim();
        let value = match kind {
            PropertyKind::Str => PropertyValue::Str(text.to_string()),
            PropertyKind::I32 => PropertyValue::I32(text.parse().map_err(|e| format!("{e}"))?),
            PropertyKind::U32 => PropertyValue::U32(text.parse().map_err(|e| format!("{e}"))?),
            PropertyKind::I64 => PropertyValue::I64(text.parse().map_err(|e| format!("{e}"))?),
            PropertyKind::U64 => PropertyValue::U64(text.parse().map_err(|e| format!("{e}"))?),
        };
        Ok(value)
    }
}

fn mismatch(target: PropertyTarget<'_>, property: &str, value: &PropertyValue) -> GhostError {
    GhostError::Property(format!(
        "{} of {} has type {:?}",
        property,
        target,
        value.kind()
    ))
}

/// Typed property lookup against the service manager.
#[async_trait]
pub trait PropertySource: Send + Sync {
    async fn get(
        &self,
        target: PropertyTarget<'_>,
        property: &str,
        kind: PropertyKind,
    ) -> GhostResult<PropertyValue>;

    async fn get_string(&self, target: PropertyTarget<'_>, property: &str) -> GhostResult<String> {
        match self.get(target, property, PropertyKind::Str).await? {
            PropertyValue::Str(value) => Ok(value),
            other => Err(mismatch(target, property, &other)),
        }
    }

    async fn get_u32(&self, target: PropertyTarget<'_>, property: &str) -> GhostResult<u32> {
        match self.get(target, property, PropertyKind::U32).await? {
            PropertyValue::U32(value) => Ok(value),
            other => Err(mismatch(target, property, &other)),
        }
    }

    async fn get_u64(&self, target: PropertyTarget<'_>, property: &str) -> GhostResult<u64> {
        match self.get(target, property, PropertyKind::U64).await? {
            PropertyValue::U64(value) => Ok(value),
            other => Err(mismatch(target, property, &other)),
        }
    }

    async fn get_i32(&self, target: PropertyTarget<'_>, property: &str) -> GhostResult<i32> {
        match self.get(target, property, PropertyKind::I32).await? {
            PropertyValue::I32(value) => Ok(value),
            other => Err(mismatch(target, property, &other)),
        }
    }

    async fn get_i64(&self, target: PropertyTarget<'_>, property: &str) -> GhostResult<i64> {
        match self.get(target, property, PropertyKind::I64).await? {
            PropertyValue::I64(value) => Ok(value),
            other => Err(mismatch(target, property, &other)),
        }
    }
}
