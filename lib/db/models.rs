use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};

use super::schema::{
    tft_companions, tft_current_traits, tft_current_units, tft_matches,
    tft_participant_augments, tft_participants, tft_players, tft_unit_items,
};

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = tft_matches)]
pub struct NewMatch {
    pub match_id: String,
    pub data_version: String,
    pub game_datetime: i64,
    pub game_length: f64,
    pub game_version: String,
    pub queue_id: i32,
    pub tft_set_number: i32,
    pub tft_game_type: Option<String>,
    pub tft_set_core_name: Option<String>,
    pub event_id: Option<i32>,
    pub tournament_id: Option<i32>,
    pub stage_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Insertable)]
#[diesel(table_name = tft_players)]
pub struct NewPlayer {
    pub puuid: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = tft_companions)]
pub struct Companion {
    pub content_id: String,
    pub skin_id: i32,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = tft_participants)]
pub struct NewParticipant {
    pub match_id: String,
    pub player_id: i32,
    pub companion_id: Option<String>,
    pub gold_left: i32,
    pub last_round: i32,
    pub level: i32,
    pub placement: i32,
    pub players_eliminated: i32,
    pub time_eliminated: f64,
    pub total_damage_to_players: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = tft_participant_augments)]
pub struct NewParticipantAugment {
    pub participant_id: i32,
    pub slot: i32,
    pub augment_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = tft_current_traits)]
pub struct NewCurrentTrait {
    pub participant_id: i32,
    pub trait_name: String,
    pub num_units: i32,
    pub style: i32,
    pub tier_current: i32,
    pub tier_total: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = tft_current_units)]
pub struct NewCurrentUnit {
    pub participant_id: i32,
    pub character_id: String,
    pub name: String,
    pub chosen: Option<String>,
    pub rarity: i32,
    pub tier: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = tft_unit_items)]
pub struct NewUnitItem {
    pub current_unit_id: i32,
    pub slot: i32,
    pub item_id: i32,
}

/// Row shape shared by the raw tag queries.
#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct TagRow {
    #[diesel(sql_type = Integer)]
    pub id: i32,
    #[diesel(sql_type = Text)]
    pub name: String,
}

#[derive(Debug, QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}
