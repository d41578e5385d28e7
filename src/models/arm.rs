//! Cross-reference entry of the arm-supplementary database.

use serde::{Deserialize, Deserializer, Serialize};

/// One work across the four identifier spaces. Zero means absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArmEntry {
    #[serde(default, deserialize_with = "zero_if_null")]
    pub mal_id: u64,

    #[serde(default, deserialize_with = "zero_if_null")]
    pub anilist_id: u64,

    #[serde(default, deserialize_with = "zero_if_null")]
    pub annict_id: u64,

    #[serde(default, deserialize_with = "zero_if_null")]
    pub syobocal_tid: u64,
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
