//! Serde helpers for fitness values.
//!
//! JSON has no representation for infinities, and `serde_json`
//! silently writes them as `null`. Fitness may legitimately be
//! `+inf` (it terminates evolution) and bookkeeping values start
//! at `-inf`, so non-finite values are written as strings instead.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serializer};

pub(crate) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => match s.as_str() {
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "nan" => Ok(f64::NAN),
            other => Err(de::Error::custom(format!("invalid float value {:?}", other))),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper(#[serde(with = "super")] f64);

    #[test]
    fn infinities_survive_json() {
        for value in [f64::INFINITY, f64::NEG_INFINITY, 1.5, -0.25] {
            let json = serde_json::to_string(&Wrapper(value)).unwrap();
            let back: Wrapper = serde_json::from_str(&json).unwrap();
            assert_eq!(back.0, value);
        }
    }

    #[test]
    fn rejects_unknown_text() {
        assert!(serde_json::from_str::<Wrapper>("\"lots\"").is_err());
    }
}
