//! The six agents behind the analysis pipeline. Each module holds its
//! system prompt, response shape, wire struct, and a thin `run` helper.

pub mod classifier;
pub mod finalizer;
pub mod labeler;
pub mod namer;
pub mod summarizer;
pub mod translator;

use serde::{Deserialize, Deserializer};

use crate::error::ResponseError;

pub(crate) fn parse_wire<'a, T: Deserialize<'a>>(raw: &'a str) -> Result<T, ResponseError> {
    serde_json::from_str(raw).map_err(|e| ResponseError::Deserialize(e.to_string()))
}

// Models occasionally emit booleans and ranks as quoted strings even under a
// schema ("b_rank": "25"). The wire structs accept both forms.

pub(crate) fn de_flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Text(String),
    }
    match Repr::deserialize(deserializer)? {
        Repr::Bool(b) => Ok(b),
        Repr::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!("not a boolean: {other:?}"))),
        },
    }
}

pub(crate) fn de_flexible_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u32),
        Text(String),
    }
    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("not an integer: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "de_flexible_bool")]
        flag: bool,
        #[serde(deserialize_with = "de_flexible_u32")]
        rank: u32,
    }

    #[test]
    fn quoted_and_bare_forms_both_parse() {
        let bare: Probe = serde_json::from_str("{\"flag\": true, \"rank\": 25}").unwrap();
        assert!(bare.flag);
        assert_eq!(bare.rank, 25);

        let quoted: Probe = serde_json::from_str("{\"flag\": \"false\", \"rank\": \"99\"}").unwrap();
        assert!(!quoted.flag);
        assert_eq!(quoted.rank, 99);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Probe>("{\"flag\": \"maybe\", \"rank\": 1}").is_err());
        assert!(serde_json::from_str::<Probe>("{\"flag\": true, \"rank\": \"many\"}").is_err());
    }
}
