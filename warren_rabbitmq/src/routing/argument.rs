use lapin::types::{AMQPValue, FieldTable, ShortString};
use serde::de::{Error, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt::Formatter;

/// Optional broker arguments (the `x-*` extension map) attached to a
/// declaration, a binding, or a consumer registration.
pub type Arguments = BTreeMap<String, Argument>;

/// Represents a single value in an [`Arguments`] map.
///
/// Integers are carried as 64-bit values, which RabbitMQ accepts for all
/// numeric `x-*` arguments (e.g., `x-message-ttl`, `x-max-length`).
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Argument {
    /// Represents the boolean argument value.
    Boolean(bool),
    /// Represents the signed integer argument value.
    Int(i64),
    /// Represents the unsigned integer argument value.
    UInt(u32),
    /// Represents the floating-point argument value.
    Float(f64),
    /// Represents the string argument value.
    String(String),
}

impl From<Argument> for AMQPValue {
    fn from(value: Argument) -> Self {
        match value {
            Argument::Boolean(b) => AMQPValue::Boolean(b),
            Argument::Int(i) => AMQPValue::LongLongInt(i),
            Argument::UInt(u) => AMQPValue::LongUInt(u),
            Argument::Float(f) => AMQPValue::Double(f),
            Argument::String(s) => AMQPValue::LongString(s.into_bytes().into()),
        }
    }
}

/// Converts an [`Arguments`] map into the AMQP [`FieldTable`] expected by
/// `lapin`.
pub(crate) fn field_table(arguments: &Arguments) -> FieldTable {
    let mut table = FieldTable::default();

    for (key, value) in arguments {
        table.insert(ShortString::from(key.as_str()), AMQPValue::from(value.clone()));
    }

    table
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Argument {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Argument {
    fn from(value: u32) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for Argument {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<'de> Deserialize<'de> for Argument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ArgumentVisitor)
    }
}

struct ArgumentVisitor;

impl<'de> Visitor<'de> for ArgumentVisitor {
    type Value = Argument;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a RabbitMQ argument value: a boolean, a number, or a string")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(Argument::Boolean(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(Argument::Int(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(Argument::Int(value.try_into().map_err(E::custom)?))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(Argument::Float(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(Argument::String(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(Argument::String(value))
    }
}
