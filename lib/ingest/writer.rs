use std::collections::{BTreeMap, BTreeSet, HashMap};

use futures::future::BoxFuture;

use super::graph::MatchGraph;
use crate::db::models::{
    Companion, NewCurrentTrait, NewCurrentUnit, NewMatch, NewParticipant, NewParticipantAugment,
    NewPlayer, NewUnitItem,
};
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The match row already existed. Nothing below it was written.
    Duplicate,
}

/// Unit of work for one match ingestion.
///
/// Every call goes through the same open transaction. Implementations must not commit on
/// their own; the owner commits once after [`write_match_graph`] returns `Ok`, and drops the
/// whole unit on any error.
pub trait MatchWriter: Send {
    /// Inserts the match row. `false` when it already existed.
    fn insert_match<'a>(&'a mut self, game: &'a NewMatch) -> BoxFuture<'a, Result<bool, StoreError>>;

    fn upsert_player<'a>(&'a mut self, player: &'a NewPlayer)
        -> BoxFuture<'a, Result<i32, StoreError>>;

    fn upsert_companion<'a>(
        &'a mut self,
        companion: &'a Companion,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    fn insert_participant<'a>(
        &'a mut self,
        participant: &'a NewParticipant,
    ) -> BoxFuture<'a, Result<i32, StoreError>>;

    fn upsert_augment<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;

    fn insert_participant_augment<'a>(
        &'a mut self,
        row: &'a NewParticipantAugment,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    fn upsert_trait<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;

    fn insert_current_trait<'a>(
        &'a mut self,
        row: &'a NewCurrentTrait,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    fn upsert_unit<'a>(&'a mut self, character_id: &'a str)
        -> BoxFuture<'a, Result<(), StoreError>>;

    fn insert_current_unit<'a>(
        &'a mut self,
        row: &'a NewCurrentUnit,
    ) -> BoxFuture<'a, Result<i32, StoreError>>;

    fn upsert_item<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<i32, StoreError>>;

    fn insert_unit_item<'a>(&'a mut self, row: &'a NewUnitItem)
        -> BoxFuture<'a, Result<(), StoreError>>;
}

/// Catalog keys of one graph, deduplicated and sorted.
///
/// Every ingestion upserts these in the same order (players, companions, augments, traits,
/// units, items) before any join row, so two transactions over overlapping lobbies take
/// their catalog row locks in the same sequence.
struct CatalogKeys<'g> {
    players: BTreeMap<(&'g str, &'g str), &'g NewPlayer>,
    companions: BTreeMap<&'g str, &'g Companion>,
    augments: BTreeSet<&'g str>,
    traits: BTreeSet<&'g str>,
    units: BTreeSet<&'g str>,
    items: BTreeSet<&'g str>,
}

impl<'g> CatalogKeys<'g> {
    fn collect(graph: &'g MatchGraph) -> Self {
        let mut keys = Self {
            players: BTreeMap::new(),
            companions: BTreeMap::new(),
            augments: BTreeSet::new(),
            traits: BTreeSet::new(),
            units: BTreeSet::new(),
            items: BTreeSet::new(),
        };
        for participant in &graph.participants {
            let player = &participant.player;
            keys.players
                .insert((player.puuid.as_str(), player.region.as_str()), player);
            if let Some(companion) = &participant.companion {
                keys.companions.insert(companion.content_id.as_str(), companion);
            }
            keys.augments
                .extend(participant.augments.iter().map(String::as_str));
            keys.traits
                .extend(participant.traits.iter().map(|current| current.name.as_str()));
            for unit in &participant.units {
                keys.units.insert(unit.character_id.as_str());
                keys.items.extend(unit.items.iter().map(String::as_str));
            }
        }
        keys
    }
}

/// Ids handed back by the catalog upserts.
struct CatalogIds<'g> {
    players: HashMap<(&'g str, &'g str), i32>,
    items: HashMap<&'g str, i32>,
}

impl CatalogIds<'_> {
    fn player(&self, player: &NewPlayer) -> Result<i32, StoreError> {
        self.players
            .get(&(player.puuid.as_str(), player.region.as_str()))
            .copied()
            .ok_or_else(|| StoreError::Rejected(format!("player {} was not upserted", player.puuid)))
    }

    fn item(&self, name: &str) -> Result<i32, StoreError> {
        self.items
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::Rejected(format!("item {name} was not upserted")))
    }
}

async fn upsert_catalog<'g, W>(
    writer: &mut W,
    keys: CatalogKeys<'g>,
) -> Result<CatalogIds<'g>, StoreError>
where
    W: MatchWriter + ?Sized,
{
    let mut ids = CatalogIds {
        players: HashMap::with_capacity(keys.players.len()),
        items: HashMap::with_capacity(keys.items.len()),
    };

    for (key, player) in keys.players {
        ids.players.insert(key, writer.upsert_player(player).await?);
    }
    for companion in keys.companions.into_values() {
        writer.upsert_companion(companion).await?;
    }
    for augment in keys.augments {
        writer.upsert_augment(augment).await?;
    }
    for name in keys.traits {
        writer.upsert_trait(name).await?;
    }
    for character_id in keys.units {
        writer.upsert_unit(character_id).await?;
    }
    for item in keys.items {
        ids.items.insert(item, writer.upsert_item(item).await?);
    }

    Ok(ids)
}

/// Writes the match row, then every catalog row in sorted key order, then per participant
/// the participant row, augments, traits, units and their items.
///
/// Stops at the first error. A duplicate match row stops before anything else is written.
pub async fn write_match_graph<W>(writer: &mut W, graph: &MatchGraph) -> Result<WriteOutcome, StoreError>
where
    W: MatchWriter + ?Sized,
{
    if !writer.insert_match(&graph.game).await? {
        return Ok(WriteOutcome::Duplicate);
    }

    let ids = upsert_catalog(writer, CatalogKeys::collect(graph)).await?;

    for participant in &graph.participants {
        let player_id = ids.player(&participant.player)?;

        let stats = &participant.stats;
        let participant_id = writer
            .insert_participant(&NewParticipant {
                match_id: graph.game.match_id.clone(),
                player_id,
                companion_id: participant
                    .companion
                    .as_ref()
                    .map(|companion| companion.content_id.clone()),
                gold_left: stats.gold_left,
                last_round: stats.last_round,
                level: stats.level,
                placement: stats.placement,
                players_eliminated: stats.players_eliminated,
                time_eliminated: stats.time_eliminated,
                total_damage_to_players: stats.total_damage_to_players,
            })
            .await?;

        for (slot, augment) in participant.augments.iter().enumerate() {
            writer
                .insert_participant_augment(&NewParticipantAugment {
                    participant_id,
                    slot: slot as i32,
                    augment_name: augment.clone(),
                })
                .await?;
        }

        for current in &participant.traits {
            writer
                .insert_current_trait(&NewCurrentTrait {
                    participant_id,
                    trait_name: current.name.clone(),
                    num_units: current.num_units,
                    style: current.style,
                    tier_current: current.tier_current,
                    tier_total: current.tier_total,
                })
                .await?;
        }

        for unit in &participant.units {
            let current_unit_id = writer
                .insert_current_unit(&NewCurrentUnit {
                    participant_id,
                    character_id: unit.character_id.clone(),
                    name: unit.name.clone(),
                    chosen: unit.chosen.clone(),
                    rarity: unit.rarity,
                    tier: unit.tier,
                })
                .await?;

            for (slot, item) in unit.items.iter().enumerate() {
                writer
                    .insert_unit_item(&NewUnitItem {
                        current_unit_id,
                        slot: slot as i32,
                        item_id: ids.item(item)?,
                    })
                    .await?;
            }
        }
    }

    Ok(WriteOutcome::Written)
}
