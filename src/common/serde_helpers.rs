//! Adaptadores para o JSON "solto" que vem do formulário do back office.
//!
//! Ids e valores chegam como número, string numérica, string vazia ou null.
//! String vazia e null significam "não informado".

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("id inválido: {}", n))),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("id inválido: {}", s)))
        }
        Some(other) => Err(D::Error::custom(format!("id inválido: {}", other))),
    }
}

pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => parse_decimal(&n.to_string()).map(Some).map_err(D::Error::custom),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            parse_decimal(&s.replace(',', ".")).map(Some).map_err(D::Error::custom)
        }
        Some(other) => Err(D::Error::custom(format!("valor inválido: {}", other))),
    }
}

pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => u32::try_from(v).map(Some).map_err(D::Error::custom),
            None => Err(D::Error::custom(format!("quantidade inválida: {}", n))),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<u32>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("quantidade inválida: {}", s)))
        }
        Some(other) => Err(D::Error::custom(format!("quantidade inválida: {}", other))),
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| format!("valor inválido: {}", raw))
}
