pub mod flight;
pub mod reservation;

use serde::{Deserialize, Deserializer};

/// Prices arrive either as JSON numbers or as decimal strings (`"300.00"`).
/// A null price reads as zero.
pub(crate) fn de_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    match Option::<RawPrice>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(RawPrice::Number(value)) => Ok(value),
        Some(RawPrice::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid price {text:?}: {e}"))),
    }
}

pub(crate) fn de_opt_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "de_price")] f64);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(value)| value))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn parse<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            RawId::Number(value) => Ok(value),
            RawId::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|e| E::custom(format!("invalid id {text:?}: {e}"))),
        }
    }
}

/// Identifiers arrive as JSON numbers or as numeric strings (`"77"`).
pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer)?.parse()
}

pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer)?
        .map(RawId::parse)
        .transpose()
}
