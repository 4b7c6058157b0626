//! In-process store with the same contract as [`super::PgStore`], compiled for tests only.
//!
//! A commit runs against a copy of the tables and swaps it in only when the unit of work
//! finished, so a failed ingestion leaves nothing behind, exactly like a rolled back
//! transaction.

use std::collections::{HashMap, HashSet};

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use super::{
    DamageRank, LengthAggregate, MatchStore, ParticipantStat, PlayerDamage, SampleFilter,
    StatAggregate, StoreError, StoreOutcome,
};
use crate::db::models::{
    Companion, NewCurrentTrait, NewCurrentUnit, NewMatch, NewParticipant, NewParticipantAugment,
    NewPlayer, NewUnitItem,
};
use crate::ingest::graph::MatchGraph;
use crate::ingest::writer::{write_match_graph, MatchWriter, WriteOutcome};
use crate::tags::{MatchTags, ResolvedTags, TagIds, TagKind, TagNode, TagRef, TagTree};

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i32,
    tags: HashMap<TagKind, Vec<TagRef>>,
    /// (parent kind, parent id, child id)
    links: HashSet<(TagKind, i32, i32)>,
    matches: Vec<NewMatch>,
    players: Vec<(i32, NewPlayer)>,
    companions: HashMap<String, Companion>,
    participants: Vec<(i32, NewParticipant)>,
    augments: HashSet<String>,
    participant_augments: Vec<NewParticipantAugment>,
    traits: HashSet<String>,
    current_traits: Vec<NewCurrentTrait>,
    units: HashSet<String>,
    current_units: Vec<(i32, NewCurrentUnit)>,
    items: Vec<(i32, String)>,
    unit_items: Vec<NewUnitItem>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn find_tag(&self, kind: TagKind, name: &str) -> Option<TagRef> {
        self.tags
            .get(&kind)
            .and_then(|tags| tags.iter().find(|tag| tag.name == name))
            .cloned()
    }

    fn tag_name(&self, kind: TagKind, id: Option<i32>) -> Option<String> {
        let id = id?;
        self.tags
            .get(&kind)
            .and_then(|tags| tags.iter().find(|tag| tag.id == id))
            .map(|tag| tag.name.clone())
    }

    fn get_or_create_tag(&mut self, kind: TagKind, name: &str) -> TagRef {
        if let Some(tag) = self.find_tag(kind, name) {
            return tag;
        }
        let tag = TagRef {
            id: self.next_id(),
            name: name.to_string(),
        };
        self.tags.entry(kind).or_default().push(tag.clone());
        tag
    }

    fn match_tags(&self, game: &NewMatch) -> MatchTags {
        MatchTags {
            event: self.tag_name(TagKind::Event, game.event_id),
            tournament: self.tag_name(TagKind::Tournament, game.tournament_id),
            stage: self.tag_name(TagKind::Stage, game.stage_id),
        }
    }

    fn attach_children(&mut self, kind: TagKind, parent_id: i32, children: &[TagTree]) {
        let Some(child_kind) = kind.child() else {
            return;
        };
        for child in children {
            let tag = self.get_or_create_tag(child_kind, &child.name);
            self.links.insert((kind, parent_id, tag.id));
            self.attach_children(child_kind, tag.id, &child.children);
        }
    }

    fn load_node(&self, kind: TagKind, tag: &TagRef) -> TagNode {
        let mut children = Vec::new();
        if let Some(child_kind) = kind.child() {
            let mut linked = self
                .tags
                .get(&child_kind)
                .into_iter()
                .flatten()
                .filter(|child| self.links.contains(&(kind, tag.id, child.id)))
                .collect::<Vec<_>>();
            linked.sort_by(|a, b| a.name.cmp(&b.name));
            children = linked
                .into_iter()
                .map(|child| self.load_node(child_kind, child))
                .collect();
        }
        TagNode {
            id: tag.id,
            name: tag.name.clone(),
            children,
        }
    }

    fn delete_match(&mut self, match_id: &str) -> Option<NewMatch> {
        let position = self
            .matches
            .iter()
            .position(|game| game.match_id == match_id)?;
        let game = self.matches.remove(position);

        let participant_ids = self
            .participants
            .iter()
            .filter(|(_, participant)| participant.match_id == match_id)
            .map(|(id, _)| *id)
            .collect::<HashSet<_>>();
        let unit_ids = self
            .current_units
            .iter()
            .filter(|(_, unit)| participant_ids.contains(&unit.participant_id))
            .map(|(id, _)| *id)
            .collect::<HashSet<_>>();

        self.participants
            .retain(|(id, _)| !participant_ids.contains(id));
        self.participant_augments
            .retain(|row| !participant_ids.contains(&row.participant_id));
        self.current_traits
            .retain(|row| !participant_ids.contains(&row.participant_id));
        self.current_units.retain(|(id, _)| !unit_ids.contains(id));
        self.unit_items
            .retain(|row| !unit_ids.contains(&row.current_unit_id));
        Some(game)
    }

    fn delete_tag(&mut self, kind: TagKind, name: &str) -> bool {
        let Some(tag) = self.find_tag(kind, name) else {
            return false;
        };
        if let Some(tags) = self.tags.get_mut(&kind) {
            tags.retain(|existing| existing.id != tag.id);
        }

        let parent_kind = TagKind::ALL
            .into_iter()
            .find(|candidate| candidate.child() == Some(kind));
        self.links.retain(|(link_kind, parent_id, child_id)| {
            let as_parent = *link_kind == kind && *parent_id == tag.id;
            let as_child = Some(*link_kind) == parent_kind && *child_id == tag.id;
            !(as_parent || as_child)
        });

        for game in &mut self.matches {
            let slot = match kind {
                TagKind::Event => &mut game.event_id,
                TagKind::Tournament => &mut game.tournament_id,
                TagKind::Stage => &mut game.stage_id,
            };
            if *slot == Some(tag.id) {
                *slot = None;
            }
        }
        true
    }
}

/// One participant row joined with its player, the row set the stat methods read.
struct Sample {
    match_id: String,
    puuid: String,
    placement: i32,
    players_eliminated: i32,
    last_round: i32,
    damage: i32,
}

impl Sample {
    fn value(&self, stat: ParticipantStat) -> i32 {
        match stat {
            ParticipantStat::Placement => self.placement,
            ParticipantStat::PlayersEliminated => self.players_eliminated,
            ParticipantStat::LastRound => self.last_round,
            ParticipantStat::DamageToPlayers => self.damage,
        }
    }
}

impl Tables {
    /// Filtered participants in (match id, placement) order.
    fn samples(&self, filter: &SampleFilter) -> Vec<Sample> {
        let players = self
            .players
            .iter()
            .map(|(id, player)| (*id, player))
            .collect::<HashMap<_, _>>();
        let games = self
            .matches
            .iter()
            .map(|game| (game.match_id.as_str(), game))
            .collect::<HashMap<_, _>>();

        let mut samples = self
            .participants
            .iter()
            .filter_map(|(_, participant)| {
                let player = players.get(&participant.player_id)?;
                let game = games.get(participant.match_id.as_str())?;
                let keep = filter.puuid.as_ref().map_or(true, |puuid| &player.puuid == puuid)
                    && filter
                        .region
                        .map_or(true, |region| player.region == region.as_str())
                    && tags_match(game, &filter.tags);
                keep.then(|| Sample {
                    match_id: participant.match_id.clone(),
                    puuid: player.puuid.clone(),
                    placement: participant.placement,
                    players_eliminated: participant.players_eliminated,
                    last_round: participant.last_round,
                    damage: participant.total_damage_to_players,
                })
            })
            .collect::<Vec<_>>();
        samples.sort_by(|a, b| {
            a.match_id
                .cmp(&b.match_id)
                .then(a.placement.cmp(&b.placement))
        });
        samples
    }
}

fn tags_match(game: &NewMatch, tags: &TagIds) -> bool {
    tags.event.map_or(true, |id| game.event_id == Some(id))
        && tags.tournament.map_or(true, |id| game.tournament_id == Some(id))
        && tags.stage.map_or(true, |id| game.stage_id == Some(id))
}

struct MemoryWriter<'t> {
    tables: &'t mut Tables,
    fail_on_unit: Option<&'t str>,
}

impl MatchWriter for MemoryWriter<'_> {
    fn insert_match<'a>(&'a mut self, game: &'a NewMatch) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            if self
                .tables
                .matches
                .iter()
                .any(|existing| existing.match_id == game.match_id)
            {
                return Ok(false);
            }
            self.tables.matches.push(game.clone());
            Ok(true)
        })
    }

    fn upsert_player<'a>(
        &'a mut self,
        player: &'a NewPlayer,
    ) -> BoxFuture<'a, Result<i32, StoreError>> {
        Box::pin(async move {
            if let Some((id, _)) = self
                .tables
                .players
                .iter()
                .find(|(_, existing)| existing == player)
            {
                return Ok(*id);
            }
            let id = self.tables.next_id();
            self.tables.players.push((id, player.clone()));
            Ok(id)
        })
    }

    fn upsert_companion<'a>(
        &'a mut self,
        companion: &'a Companion,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.tables
                .companions
                .entry(companion.content_id.clone())
                .or_insert_with(|| companion.clone());
            Ok(())
        })
    }

    fn insert_participant<'a>(
        &'a mut self,
        participant: &'a NewParticipant,
    ) -> BoxFuture<'a, Result<i32, StoreError>> {
        Box::pin(async move {
            if !(1..=8).contains(&participant.placement) {
                return Err(StoreError::Rejected(format!(
                    "placement {} out of range",
                    participant.placement
                )));
            }
            let id = self.tables.next_id();
            self.tables.participants.push((id, participant.clone()));
            Ok(id)
        })
    }

    fn upsert_augment<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.tables.augments.insert(name.to_string());
            Ok(())
        })
    }

    fn insert_participant_augment<'a>(
        &'a mut self,
        row: &'a NewParticipantAugment,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.tables.participant_augments.push(row.clone());
            Ok(())
        })
    }

    fn upsert_trait<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.tables.traits.insert(name.to_string());
            Ok(())
        })
    }

    fn insert_current_trait<'a>(
        &'a mut self,
        row: &'a NewCurrentTrait,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.tables.current_traits.push(row.clone());
            Ok(())
        })
    }

    fn upsert_unit<'a>(
        &'a mut self,
        character_id: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            if self.fail_on_unit == Some(character_id) {
                return Err(StoreError::Rejected(format!(
                    "unit {character_id} rejected"
                )));
            }
            self.tables.units.insert(character_id.to_string());
            Ok(())
        })
    }

    fn insert_current_unit<'a>(
        &'a mut self,
        row: &'a NewCurrentUnit,
    ) -> BoxFuture<'a, Result<i32, StoreError>> {
        Box::pin(async move {
            let id = self.tables.next_id();
            self.tables.current_units.push((id, row.clone()));
            Ok(id)
        })
    }

    fn upsert_item<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<i32, StoreError>> {
        Box::pin(async move {
            if let Some((id, _)) = self
                .tables
                .items
                .iter()
                .find(|(_, existing)| existing == name)
            {
                return Ok(*id);
            }
            let id = self.tables.next_id();
            self.tables.items.push((id, name.to_string()));
            Ok(id)
        })
    }

    fn insert_unit_item<'a>(
        &'a mut self,
        row: &'a NewUnitItem,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.tables.unit_items.push(row.clone());
            Ok(())
        })
    }
}

/// Row counts, for assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub matches: usize,
    pub players: usize,
    pub participants: usize,
    pub current_traits: usize,
    pub units: usize,
    pub current_units: usize,
    pub items: usize,
    pub unit_items: usize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_on_unit: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose commits fail when a unit with this character id is written.
    pub fn failing_on_unit(character_id: impl Into<String>) -> Self {
        Self {
            tables: Mutex::default(),
            fail_on_unit: Some(character_id.into()),
        }
    }

    pub async fn counts(&self) -> TableCounts {
        let tables = self.tables.lock().await;
        TableCounts {
            matches: tables.matches.len(),
            players: tables.players.len(),
            participants: tables.participants.len(),
            current_traits: tables.current_traits.len(),
            units: tables.units.len(),
            current_units: tables.current_units.len(),
            items: tables.items.len(),
            unit_items: tables.unit_items.len(),
        }
    }
}

impl MatchStore for MemoryStore {
    fn match_exists<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            Ok(tables.matches.iter().any(|game| game.match_id == match_id))
        })
    }

    fn find_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<TagRef>, StoreError>> {
        Box::pin(async move { Ok(self.tables.lock().await.find_tag(kind, name)) })
    }

    fn get_or_create_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<TagRef, StoreError>> {
        Box::pin(async move { Ok(self.tables.lock().await.get_or_create_tag(kind, name)) })
    }

    fn link_tags<'a>(
        &'a self,
        parent: TagKind,
        parent_id: i32,
        child_id: i32,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            if parent.child().is_some() {
                self.tables
                    .lock()
                    .await
                    .links
                    .insert((parent, parent_id, child_id));
            }
            Ok(())
        })
    }

    fn commit_match<'a>(
        &'a self,
        graph: &'a MatchGraph,
    ) -> BoxFuture<'a, Result<WriteOutcome, StoreError>> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            let mut working = tables.clone();
            let outcome = {
                let mut writer = MemoryWriter {
                    tables: &mut working,
                    fail_on_unit: self.fail_on_unit.as_deref(),
                };
                write_match_graph(&mut writer, graph).await?
            };
            if outcome == WriteOutcome::Written {
                *tables = working;
            }
            Ok(outcome)
        })
    }

    fn replace_match_tags<'a>(
        &'a self,
        match_id: &'a str,
        tags: &'a ResolvedTags,
    ) -> BoxFuture<'a, Result<StoreOutcome<MatchTags>, StoreError>> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            let Some(position) = tables
                .matches
                .iter()
                .position(|game| game.match_id == match_id)
            else {
                return Ok(StoreOutcome::NotFound);
            };
            let previous = tables.match_tags(&tables.matches[position]);
            let ids = tags.ids();
            let game = &mut tables.matches[position];
            game.event_id = ids.event;
            game.tournament_id = ids.tournament;
            game.stage_id = ids.stage;
            Ok(StoreOutcome::Ok(previous))
        })
    }

    fn delete_match<'a>(
        &'a self,
        match_id: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<MatchTags>, StoreError>> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            Ok(match tables.delete_match(match_id) {
                Some(game) => StoreOutcome::Ok(tables.match_tags(&game)),
                None => StoreOutcome::NotFound,
            })
        })
    }

    fn registered_games<'a>(&'a self) -> BoxFuture<'a, Result<Vec<(MatchTags, i64)>, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            let mut counts: HashMap<MatchTags, i64> = HashMap::new();
            for game in &tables.matches {
                *counts.entry(tables.match_tags(game)).or_default() += 1;
            }
            Ok(counts.into_iter().collect())
        })
    }

    fn create_tag_tree<'a>(
        &'a self,
        kind: TagKind,
        tree: &'a TagTree,
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            if tables.find_tag(kind, &tree.name).is_some() {
                return Ok(StoreOutcome::Conflict);
            }
            let root = tables.get_or_create_tag(kind, &tree.name);
            tables.attach_children(kind, root.id, &tree.children);
            Ok(StoreOutcome::Ok(tables.load_node(kind, &root)))
        })
    }

    fn get_tag_tree<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            Ok(match tables.find_tag(kind, name) {
                Some(tag) => StoreOutcome::Ok(tables.load_node(kind, &tag)),
                None => StoreOutcome::NotFound,
            })
        })
    }

    fn list_tag_trees<'a>(
        &'a self,
        kind: TagKind,
    ) -> BoxFuture<'a, Result<Vec<TagNode>, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            let mut roots = tables.tags.get(&kind).cloned().unwrap_or_default();
            roots.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(roots
                .iter()
                .map(|tag| tables.load_node(kind, tag))
                .collect())
        })
    }

    fn replace_tag_children<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
        children: &'a [TagTree],
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            let Some(tag) = tables.find_tag(kind, name) else {
                return Ok(StoreOutcome::NotFound);
            };
            tables
                .links
                .retain(|(link_kind, parent_id, _)| !(*link_kind == kind && *parent_id == tag.id));
            tables.attach_children(kind, tag.id, children);
            Ok(StoreOutcome::Ok(tables.load_node(kind, &tag)))
        })
    }

    fn delete_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<()>, StoreError>> {
        Box::pin(async move {
            let mut tables = self.tables.lock().await;
            Ok(if tables.delete_tag(kind, name) {
                StoreOutcome::Ok(())
            } else {
                StoreOutcome::NotFound
            })
        })
    }

    fn count_tags<'a>(&'a self, kind: TagKind) -> BoxFuture<'a, Result<i64, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            Ok(tables.tags.get(&kind).map_or(0, |tags| tags.len() as i64))
        })
    }

    fn aggregate_participants<'a>(
        &'a self,
        filter: &'a SampleFilter,
        stat: ParticipantStat,
    ) -> BoxFuture<'a, Result<Option<StatAggregate>, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            let values = tables
                .samples(filter)
                .iter()
                .map(|sample| sample.value(stat))
                .collect::<Vec<_>>();
            Ok(StatAggregate::from_parts(
                values.len() as i64,
                values.iter().copied().min(),
                values.iter().copied().max(),
                Some(values.iter().map(|value| i64::from(*value)).sum()),
            ))
        })
    }

    fn damage_extreme<'a>(
        &'a self,
        filter: &'a SampleFilter,
        rank: DamageRank,
    ) -> BoxFuture<'a, Result<Option<PlayerDamage>, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            let samples = tables.samples(filter);
            // Samples are in (match id, placement) order and min_by_key keeps the first tie.
            let pick = match rank {
                DamageRank::Lowest => samples.iter().min_by_key(|sample| sample.damage),
                DamageRank::Highest => samples
                    .iter()
                    .min_by_key(|sample| std::cmp::Reverse(sample.damage)),
            };
            Ok(pick.map(|sample| PlayerDamage {
                puuid: sample.puuid.clone(),
                damage: sample.damage,
            }))
        })
    }

    fn game_damage<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<Vec<PlayerDamage>, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            let mut samples = tables
                .samples(&SampleFilter::default())
                .into_iter()
                .filter(|sample| sample.match_id == match_id)
                .collect::<Vec<_>>();
            samples.sort_by(|a, b| b.damage.cmp(&a.damage).then(a.placement.cmp(&b.placement)));
            Ok(samples
                .into_iter()
                .map(|sample| PlayerDamage {
                    puuid: sample.puuid,
                    damage: sample.damage,
                })
                .collect())
        })
    }

    fn aggregate_match_lengths<'a>(
        &'a self,
        tags: &'a TagIds,
    ) -> BoxFuture<'a, Result<Option<LengthAggregate>, StoreError>> {
        Box::pin(async move {
            let tables = self.tables.lock().await;
            let lengths = tables
                .matches
                .iter()
                .filter(|game| tags_match(game, tags))
                .map(|game| game.game_length)
                .collect::<Vec<_>>();
            Ok(LengthAggregate::from_parts(
                lengths.len() as i64,
                lengths.iter().copied().reduce(f64::min),
                lengths.iter().copied().reduce(f64::max),
                Some(lengths.iter().sum()),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::test_support::{match_payload, participant};

    fn graph(match_id: &str, units: &[&str]) -> MatchGraph {
        let payload = match_payload(
            match_id,
            vec![participant("p-1", 1, units), participant("p-2", 2, units)],
        );
        MatchGraph::from_payload(payload, match_id, "europe", &ResolvedTags::default())
            .expect("valid payload")
    }

    #[tokio::test]
    async fn commit_writes_graph_and_dedups_catalogs() {
        let store = MemoryStore::new();
        let outcome = store
            .commit_match(&graph("EUW1_1", &["TFT9_Ahri", "TFT9_Ahri"]))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written);

        let counts = store.counts().await;
        assert_eq!(counts.matches, 1);
        assert_eq!(counts.players, 2);
        assert_eq!(counts.participants, 2);
        assert_eq!(counts.units, 1);
        assert_eq!(counts.current_units, 4);
        assert_eq!(counts.items, 1);
        assert_eq!(counts.unit_items, 4);

        let again = store.commit_match(&graph("EUW1_1", &[])).await.unwrap();
        assert_eq!(again, WriteOutcome::Duplicate);
        assert_eq!(store.counts().await, counts);
    }

    #[tokio::test]
    async fn failed_commit_leaves_no_rows() {
        let store = MemoryStore::failing_on_unit("TFT9_Jinx");
        let err = store
            .commit_match(&graph("EUW1_1", &["TFT9_Ahri", "TFT9_Jinx"]))
            .await
            .expect_err("unit write fails");
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.counts().await, TableCounts::default());
    }

    #[tokio::test]
    async fn delete_cascades_and_returns_tags() {
        let store = MemoryStore::new();
        let stage = store.get_or_create_tag(TagKind::Stage, "Finals").await.unwrap();
        let mut game = graph("EUW1_1", &["TFT9_Ahri"]);
        game.game.stage_id = Some(stage.id);
        store.commit_match(&game).await.unwrap();

        let deleted = store.delete_match("EUW1_1").await.unwrap();
        assert_eq!(
            deleted,
            StoreOutcome::Ok(MatchTags {
                stage: Some("Finals".to_string()),
                ..MatchTags::default()
            })
        );
        let counts = store.counts().await;
        assert_eq!(counts.matches, 0);
        assert_eq!(counts.participants, 0);
        assert_eq!(counts.current_units, 0);
        assert_eq!(counts.unit_items, 0);
        assert_eq!(counts.players, 2);
        assert_eq!(store.delete_match("EUW1_1").await.unwrap(), StoreOutcome::NotFound);
    }

    #[tokio::test]
    async fn deleting_a_tag_detaches_matches_and_links() {
        let store = MemoryStore::new();
        let tree = TagTree {
            name: "Main".to_string(),
            children: vec![TagTree::leaf("Finals")],
        };
        store.create_tag_tree(TagKind::Tournament, &tree).await.unwrap();
        let stage = store.find_tag(TagKind::Stage, "Finals").await.unwrap().unwrap();

        let mut game = graph("EUW1_1", &[]);
        game.game.stage_id = Some(stage.id);
        store.commit_match(&game).await.unwrap();

        assert_eq!(
            store.delete_tag(TagKind::Stage, "Finals").await.unwrap(),
            StoreOutcome::Ok(())
        );
        let StoreOutcome::Ok(node) = store.get_tag_tree(TagKind::Tournament, "Main").await.unwrap() else {
            panic!("tournament still exists");
        };
        assert!(node.children.is_empty());
        assert_eq!(
            store.registered_games().await.unwrap(),
            vec![(MatchTags::default(), 1)]
        );
    }

    #[tokio::test]
    async fn creating_an_existing_root_conflicts() {
        let store = MemoryStore::new();
        let tree = TagTree::leaf("Worlds");
        assert!(matches!(
            store.create_tag_tree(TagKind::Event, &tree).await.unwrap(),
            StoreOutcome::Ok(_)
        ));
        assert_eq!(
            store.create_tag_tree(TagKind::Event, &tree).await.unwrap(),
            StoreOutcome::Conflict
        );
    }
}
