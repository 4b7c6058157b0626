use serde_json::Value;
use thiserror::Error;

use super::payload::{self, MatchPayload};
use crate::db::models::{Companion, NewMatch, NewPlayer};
use crate::riot_client::region::Region;
use crate::tags::{MatchTags, ResolvedTags};

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("malformed match payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("payload is for match {found}, expected {expected}")]
    MismatchedMatchId { expected: String, found: String },
    #[error("match {0} has no participants")]
    NoParticipants(String),
}

impl PayloadError {
    /// The provider handed back something unusable, so the item fails as a bad gateway.
    pub const STATUS: u16 = 502;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantStats {
    pub gold_left: i32,
    pub last_round: i32,
    pub level: i32,
    pub placement: i32,
    pub players_eliminated: i32,
    pub time_eliminated: f64,
    pub total_damage_to_players: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitGraph {
    pub name: String,
    pub num_units: i32,
    pub style: i32,
    pub tier_current: i32,
    pub tier_total: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitGraph {
    pub character_id: String,
    pub name: String,
    pub chosen: Option<String>,
    pub rarity: i32,
    pub tier: i32,
    /// Item keys in slot order.
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantGraph {
    pub player: NewPlayer,
    pub companion: Option<Companion>,
    pub stats: ParticipantStats,
    pub augments: Vec<String>,
    pub traits: Vec<TraitGraph>,
    pub units: Vec<UnitGraph>,
}

/// Everything one match ingestion writes, validated and keyed before the transaction opens.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchGraph {
    pub game: NewMatch,
    pub tags: MatchTags,
    pub participants: Vec<ParticipantGraph>,
}

impl MatchGraph {
    pub fn from_payload(
        payload: Value,
        expected_id: &str,
        fallback_region: &str,
        tags: &ResolvedTags,
    ) -> Result<Self, PayloadError> {
        let payload: MatchPayload = serde_json::from_value(payload)?;
        if payload.metadata.match_id != expected_id {
            return Err(PayloadError::MismatchedMatchId {
                expected: expected_id.to_string(),
                found: payload.metadata.match_id,
            });
        }
        if payload.info.participants.is_empty() {
            return Err(PayloadError::NoParticipants(expected_id.to_string()));
        }

        let region = Region::from_match_id(expected_id)
            .map(|region| region.as_str().to_string())
            .unwrap_or_else(|| fallback_region.to_string());
        let ids = tags.ids();

        let MatchPayload { metadata, info } = payload;
        let participants = info
            .participants
            .into_iter()
            .map(|participant| participant_graph(participant, &region))
            .collect();

        Ok(Self {
            game: NewMatch {
                match_id: metadata.match_id,
                data_version: metadata.data_version,
                game_datetime: info.game_datetime,
                game_length: info.game_length,
                game_version: info.game_version,
                queue_id: info.queue_id,
                tft_set_number: info.tft_set_number,
                tft_game_type: info.tft_game_type,
                tft_set_core_name: info.tft_set_core_name,
                event_id: ids.event,
                tournament_id: ids.tournament,
                stage_id: ids.stage,
            },
            tags: tags.names(),
            participants,
        })
    }

    pub fn match_id(&self) -> &str {
        &self.game.match_id
    }

    pub fn puuids(&self) -> impl Iterator<Item = &str> {
        self.participants
            .iter()
            .map(|participant| participant.player.puuid.as_str())
    }
}

fn participant_graph(participant: payload::Participant, region: &str) -> ParticipantGraph {
    ParticipantGraph {
        player: NewPlayer {
            puuid: participant.puuid,
            region: region.to_string(),
        },
        companion: participant.companion.map(|companion| Companion {
            content_id: companion.content_id,
            skin_id: companion.skin_id,
            species: companion.species,
        }),
        stats: ParticipantStats {
            gold_left: participant.gold_left,
            last_round: participant.last_round,
            level: participant.level,
            placement: participant.placement,
            players_eliminated: participant.players_eliminated,
            time_eliminated: participant.time_eliminated,
            total_damage_to_players: participant.total_damage_to_players,
        },
        augments: participant.augments,
        traits: participant
            .traits
            .into_iter()
            .map(|item| TraitGraph {
                name: item.name,
                num_units: item.num_units,
                style: item.style,
                tier_current: item.tier_current,
                tier_total: item.tier_total,
            })
            .collect(),
        units: participant
            .units
            .into_iter()
            .map(|unit| UnitGraph {
                items: unit.item_keys(),
                character_id: unit.character_id,
                name: unit.name,
                chosen: unit.chosen,
                rarity: unit.rarity,
                tier: unit.tier,
            })
            .collect(),
    }
}
