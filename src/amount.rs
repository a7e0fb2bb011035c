use std::fmt;
use std::str::FromStr;

use fixed::types::I64F64;

/// A signed amount of money
///
/// Transaction amounts are magnitudes, but balances can go below zero, so
/// money is always signed.
pub type Money = I64F64;

/// The amount of a transaction, as it was received
///
/// Exports and the backend are not strict about this field: it may arrive as
/// a number, as a decimal string (`"85.50"`), empty, or as arbitrary text.
/// Instead of silently treating anything unparseable as zero, the raw text is
/// kept so the caller can decide what to do with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Amount {
    /// The field parsed as a finite decimal number
    Valid(Money),
    /// The raw text of a field that could not be parsed
    Invalid(String),
}

impl Amount {
    /// Parses a decimal string, surrounding whitespace is ignored
    pub fn parse(raw: &str) -> Self {
        match Money::from_str(raw.trim()) {
            Ok(money) => Self::Valid(money),
            Err(_) => Self::Invalid(raw.to_owned()),
        }
    }

    /// The parsed value, if there is one
    pub fn valid(&self) -> Option<Money> {
        match self {
            Self::Valid(money) => Some(*money),
            Self::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

impl Default for Amount {
    /// A missing amount is an invalid one
    fn default() -> Self {
        Self::Invalid(String::new())
    }
}

impl From<Money> for Amount {
    fn from(money: Money) -> Self {
        Self::Valid(money)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(money) => money.fmt(f),
            Self::Invalid(raw) => f.write_str(raw),
        }
    }
}

impl serde::Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: serde::Serializer
    {
        match self {
            Self::Valid(money) => serializer.collect_str(money),
            Self::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: serde::Deserializer<'de>
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> serde::de::Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Money::checked_from_num(v)
            .map(Amount::Valid)
            .unwrap_or_else(|| Amount::Invalid(v.to_string())))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Money::checked_from_num(v)
            .map(Amount::Valid)
            .unwrap_or_else(|| Amount::Invalid(v.to_string())))
    }

    // floats go through their shortest decimal text, so `85.1` is read as
    // the decimal 85.1 rather than its binary approximation
    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Amount, E> {
        Ok(Amount::parse(&v.to_string()))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Amount, E> {
        Ok(Amount::parse(v))
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Amount, E> {
        Ok(Amount::Invalid(v.to_string()))
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::default())
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::default())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Amount, D::Error>
        where D: serde::Deserializer<'de>
    {
        deserializer.deserialize_any(self)
    }
}
