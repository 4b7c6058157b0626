//! Provider payload for one TFT match, as returned by `/tft/match/v1/matches/{id}`.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchPayload {
    pub metadata: Metadata,
    pub info: Info,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub data_version: String,
    pub match_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Info {
    /// Epoch milliseconds.
    pub game_datetime: i64,
    /// Seconds.
    pub game_length: f64,
    pub game_version: String,
    #[serde(default)]
    pub queue_id: i32,
    #[serde(default)]
    pub tft_game_type: Option<String>,
    #[serde(default)]
    pub tft_set_core_name: Option<String>,
    #[serde(default)]
    pub tft_set_number: i32,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Participant {
    pub puuid: String,
    pub placement: i32,
    pub level: i32,
    pub last_round: i32,
    #[serde(default)]
    pub gold_left: i32,
    #[serde(default)]
    pub players_eliminated: i32,
    #[serde(default)]
    pub time_eliminated: f64,
    #[serde(default)]
    pub total_damage_to_players: i32,
    #[serde(default)]
    pub augments: Vec<String>,
    #[serde(default)]
    pub companion: Option<Companion>,
    #[serde(default)]
    pub traits: Vec<Trait>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Companion {
    #[serde(rename = "content_ID")]
    pub content_id: String,
    #[serde(rename = "skin_ID", default)]
    pub skin_id: i32,
    #[serde(default)]
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trait {
    pub name: String,
    #[serde(default)]
    pub num_units: i32,
    #[serde(default)]
    pub style: i32,
    #[serde(default)]
    pub tier_current: i32,
    #[serde(default)]
    pub tier_total: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Unit {
    pub character_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub chosen: Option<String>,
    #[serde(default)]
    pub rarity: i32,
    #[serde(default)]
    pub tier: i32,
    /// Item names, present in newer payloads.
    #[serde(rename = "itemNames", default)]
    pub item_names: Vec<String>,
    /// Numeric item ids, present in older payloads.
    #[serde(default)]
    pub items: Vec<i64>,
}

impl Unit {
    /// Item keys in slot order. Names win over numeric ids when both are present.
    pub fn item_keys(&self) -> Vec<String> {
        if !self.item_names.is_empty() {
            return self.item_names.clone();
        }
        self.items.iter().map(|id| id.to_string()).collect()
    }
}
