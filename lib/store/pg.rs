use diesel::dsl::{count_star, max, min, sum};
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel::{insert_into, sql_query, update};
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use futures::future::BoxFuture;

use super::{
    DamageRank, LengthAggregate, MatchStore, ParticipantStat, PlayerDamage, SampleFilter,
    StatAggregate, StoreError, StoreOutcome,
};
use crate::db::models::{
    Companion, CountRow, NewCurrentTrait, NewCurrentUnit, NewMatch, NewParticipant,
    NewParticipantAugment, NewPlayer, NewUnitItem, TagRow,
};
use crate::db::schema::{
    tft_augments, tft_companions, tft_current_traits, tft_current_units, tft_items, tft_matches,
    tft_participant_augments, tft_participants, tft_players, tft_traits, tft_unit_items, tft_units,
};
use crate::ingest::graph::MatchGraph;
use crate::ingest::writer::{write_match_graph, MatchWriter, WriteOutcome};
use crate::tags::{LinkTable, MatchTags, ResolvedTags, TagIds, TagKind, TagNode, TagRef, TagTree};

/// Postgres-backed store used by the running service.
pub struct PgStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgStore {
    pub fn new(pool: Pool<AsyncPgConnection>) -> Self {
        Self { pool }
    }
}

/// Ingestion unit of work over one open transaction.
pub struct PgMatchWriter<'c> {
    conn: &'c mut AsyncPgConnection,
}

impl MatchWriter for PgMatchWriter<'_> {
    fn insert_match<'a>(&'a mut self, game: &'a NewMatch) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            let inserted = insert_into(tft_matches::table)
                .values(game)
                .on_conflict(tft_matches::match_id)
                .do_nothing()
                .execute(&mut *self.conn)
                .await?;
            Ok(inserted == 1)
        })
    }

    fn upsert_player<'a>(
        &'a mut self,
        player: &'a NewPlayer,
    ) -> BoxFuture<'a, Result<i32, StoreError>> {
        Box::pin(async move {
            let id = insert_into(tft_players::table)
                .values(player)
                .on_conflict((tft_players::puuid, tft_players::region))
                .do_update()
                .set(tft_players::puuid.eq(excluded(tft_players::puuid)))
                .returning(tft_players::id)
                .get_result::<i32>(&mut *self.conn)
                .await?;
            Ok(id)
        })
    }

    fn upsert_companion<'a>(
        &'a mut self,
        companion: &'a Companion,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            insert_into(tft_companions::table)
                .values(companion)
                .on_conflict(tft_companions::content_id)
                .do_nothing()
                .execute(&mut *self.conn)
                .await?;
            Ok(())
        })
    }

    fn insert_participant<'a>(
        &'a mut self,
        participant: &'a NewParticipant,
    ) -> BoxFuture<'a, Result<i32, StoreError>> {
        Box::pin(async move {
            let id = insert_into(tft_participants::table)
                .values(participant)
                .returning(tft_participants::id)
                .get_result::<i32>(&mut *self.conn)
                .await?;
            Ok(id)
        })
    }

    fn upsert_augment<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            insert_into(tft_augments::table)
                .values(tft_augments::name.eq(name))
                .on_conflict(tft_augments::name)
                .do_nothing()
                .execute(&mut *self.conn)
                .await?;
            Ok(())
        })
    }

    fn insert_participant_augment<'a>(
        &'a mut self,
        row: &'a NewParticipantAugment,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            insert_into(tft_participant_augments::table)
                .values(row)
                .execute(&mut *self.conn)
                .await?;
            Ok(())
        })
    }

    fn upsert_trait<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            insert_into(tft_traits::table)
                .values(tft_traits::name.eq(name))
                .on_conflict(tft_traits::name)
                .do_nothing()
                .execute(&mut *self.conn)
                .await?;
            Ok(())
        })
    }

    fn insert_current_trait<'a>(
        &'a mut self,
        row: &'a NewCurrentTrait,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            insert_into(tft_current_traits::table)
                .values(row)
                .execute(&mut *self.conn)
                .await?;
            Ok(())
        })
    }

    fn upsert_unit<'a>(
        &'a mut self,
        character_id: &'a str,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            insert_into(tft_units::table)
                .values(tft_units::character_id.eq(character_id))
                .on_conflict(tft_units::character_id)
                .do_nothing()
                .execute(&mut *self.conn)
                .await?;
            Ok(())
        })
    }

    fn insert_current_unit<'a>(
        &'a mut self,
        row: &'a NewCurrentUnit,
    ) -> BoxFuture<'a, Result<i32, StoreError>> {
        Box::pin(async move {
            let id = insert_into(tft_current_units::table)
                .values(row)
                .returning(tft_current_units::id)
                .get_result::<i32>(&mut *self.conn)
                .await?;
            Ok(id)
        })
    }

    fn upsert_item<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<i32, StoreError>> {
        Box::pin(async move {
            let id = insert_into(tft_items::table)
                .values(tft_items::name.eq(name))
                .on_conflict(tft_items::name)
                .do_update()
                .set(tft_items::name.eq(excluded(tft_items::name)))
                .returning(tft_items::id)
                .get_result::<i32>(&mut *self.conn)
                .await?;
            Ok(id)
        })
    }

    fn insert_unit_item<'a>(
        &'a mut self,
        row: &'a NewUnitItem,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            insert_into(tft_unit_items::table)
                .values(row)
                .execute(&mut *self.conn)
                .await?;
            Ok(())
        })
    }
}

#[derive(QueryableByName)]
struct MatchTagNamesRow {
    #[diesel(sql_type = Nullable<Text>)]
    event: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    tournament: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    stage: Option<String>,
}

impl From<MatchTagNamesRow> for MatchTags {
    fn from(row: MatchTagNamesRow) -> Self {
        Self {
            event: row.event,
            tournament: row.tournament,
            stage: row.stage,
        }
    }
}

#[derive(QueryableByName)]
struct RegisteredGamesRow {
    #[diesel(sql_type = Nullable<Text>)]
    event: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    tournament: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    stage: Option<String>,
    #[diesel(sql_type = BigInt)]
    count: i64,
}

const TAG_NAME_JOINS: &str = "
    LEFT JOIN events e ON e.id = m.event_id
    LEFT JOIN tournaments t ON t.id = m.tournament_id
    LEFT JOIN stages s ON s.id = m.stage_id";

impl From<TagRow> for TagRef {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

async fn find_tag_row(
    conn: &mut AsyncPgConnection,
    kind: TagKind,
    name: &str,
) -> Result<Option<TagRow>, StoreError> {
    let row = sql_query(format!("SELECT id, name FROM {} WHERE name = $1", kind.table()))
        .bind::<Text, _>(name)
        .get_result::<TagRow>(conn)
        .await
        .optional()?;
    Ok(row)
}

async fn get_or_create_tag_row(
    conn: &mut AsyncPgConnection,
    kind: TagKind,
    name: &str,
) -> Result<TagRow, StoreError> {
    let row = sql_query(format!(
        "INSERT INTO {} (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id, name",
        kind.table()
    ))
    .bind::<Text, _>(name)
    .get_result::<TagRow>(conn)
    .await?;
    Ok(row)
}

async fn link_rows(
    conn: &mut AsyncPgConnection,
    link: LinkTable,
    parent_id: i32,
    child_id: i32,
) -> Result<(), StoreError> {
    sql_query(format!(
        "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        link.table, link.parent_column, link.child_column
    ))
    .bind::<Integer, _>(parent_id)
    .bind::<Integer, _>(child_id)
    .execute(conn)
    .await?;
    Ok(())
}

fn attach_children<'a>(
    conn: &'a mut AsyncPgConnection,
    kind: TagKind,
    parent_id: i32,
    children: &'a [TagTree],
) -> BoxFuture<'a, Result<(), StoreError>> {
    Box::pin(async move {
        let (Some(child_kind), Some(link)) = (kind.child(), kind.child_link()) else {
            return Ok(());
        };
        for child in children {
            let row = get_or_create_tag_row(&mut *conn, child_kind, &child.name).await?;
            link_rows(&mut *conn, link, parent_id, row.id).await?;
            attach_children(&mut *conn, child_kind, row.id, &child.children).await?;
        }
        Ok(())
    })
}

fn load_node<'a>(
    conn: &'a mut AsyncPgConnection,
    kind: TagKind,
    row: TagRow,
) -> BoxFuture<'a, Result<TagNode, StoreError>> {
    Box::pin(async move {
        let mut children = Vec::new();
        if let (Some(child_kind), Some(link)) = (kind.child(), kind.child_link()) {
            let rows = sql_query(format!(
                "SELECT c.id, c.name FROM {child} c
                 JOIN {link} l ON l.{child_col} = c.id
                 WHERE l.{parent_col} = $1
                 ORDER BY c.name",
                child = child_kind.table(),
                link = link.table,
                child_col = link.child_column,
                parent_col = link.parent_column,
            ))
            .bind::<Integer, _>(row.id)
            .load::<TagRow>(&mut *conn)
            .await?;
            for child in rows {
                children.push(load_node(&mut *conn, child_kind, child).await?);
            }
        }
        Ok(TagNode {
            id: row.id,
            name: row.name,
            children,
        })
    })
}

/// Participants joined with their player and match, which every stat filter reads.
macro_rules! participant_join {
    () => {
        tft_participants::table
            .inner_join(tft_players::table)
            .inner_join(tft_matches::table)
    };
}

/// Boxed `COUNT(*), MIN, MAX, SUM` of one participant column.
macro_rules! aggregate_column {
    ($column:expr) => {
        participant_join!()
            .select((count_star(), min($column), max($column), sum($column)))
            .into_boxed()
    };
}

/// Narrows a boxed participant join query to a [`SampleFilter`].
macro_rules! filter_samples {
    ($query:expr, $filter:expr) => {{
        let filter: &SampleFilter = $filter;
        let mut query = $query;
        if let Some(puuid) = &filter.puuid {
            query = query.filter(tft_players::puuid.eq(puuid.clone()));
        }
        if let Some(region) = filter.region {
            query = query.filter(tft_players::region.eq(region.as_str()));
        }
        if let Some(event_id) = filter.tags.event {
            query = query.filter(tft_matches::event_id.eq(event_id));
        }
        if let Some(tournament_id) = filter.tags.tournament {
            query = query.filter(tft_matches::tournament_id.eq(tournament_id));
        }
        if let Some(stage_id) = filter.tags.stage {
            query = query.filter(tft_matches::stage_id.eq(stage_id));
        }
        query
    }};
}

impl MatchStore for PgStore {
    fn match_exists<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let exists = diesel::select(diesel::dsl::exists(
                tft_matches::table.filter(tft_matches::match_id.eq(match_id)),
            ))
            .get_result::<bool>(&mut conn)
            .await?;
            Ok(exists)
        })
    }

    fn find_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<TagRef>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            Ok(find_tag_row(&mut conn, kind, name).await?.map(TagRef::from))
        })
    }

    fn get_or_create_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<TagRef, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            Ok(get_or_create_tag_row(&mut conn, kind, name).await?.into())
        })
    }

    fn link_tags<'a>(
        &'a self,
        parent: TagKind,
        parent_id: i32,
        child_id: i32,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let Some(link) = parent.child_link() else {
                return Ok(());
            };
            let mut conn = self.pool.get().await?;
            link_rows(&mut conn, link, parent_id, child_id).await
        })
    }

    fn commit_match<'a>(
        &'a self,
        graph: &'a MatchGraph,
    ) -> BoxFuture<'a, Result<WriteOutcome, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            conn.transaction::<_, StoreError, _>(|conn| {
                async move {
                    let mut writer = PgMatchWriter { conn };
                    write_match_graph(&mut writer, graph).await
                }
                .scope_boxed()
            })
            .await
        })
    }

    fn replace_match_tags<'a>(
        &'a self,
        match_id: &'a str,
        tags: &'a ResolvedTags,
    ) -> BoxFuture<'a, Result<StoreOutcome<MatchTags>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            conn.transaction::<_, StoreError, _>(|conn| {
                async move {
                    let previous = sql_query(format!(
                        "SELECT e.name AS event, t.name AS tournament, s.name AS stage
                         FROM tft_matches m {TAG_NAME_JOINS}
                         WHERE m.match_id = $1
                         FOR UPDATE OF m"
                    ))
                    .bind::<Text, _>(match_id)
                    .get_result::<MatchTagNamesRow>(&mut *conn)
                    .await
                    .optional()?;

                    let Some(previous) = previous else {
                        return Ok(StoreOutcome::NotFound);
                    };

                    let ids = tags.ids();
                    update(tft_matches::table.find(match_id))
                        .set((
                            tft_matches::event_id.eq(ids.event),
                            tft_matches::tournament_id.eq(ids.tournament),
                            tft_matches::stage_id.eq(ids.stage),
                        ))
                        .execute(&mut *conn)
                        .await?;

                    Ok(StoreOutcome::Ok(previous.into()))
                }
                .scope_boxed()
            })
            .await
        })
    }

    fn delete_match<'a>(
        &'a self,
        match_id: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<MatchTags>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let deleted = sql_query(format!(
                "WITH m AS (
                     DELETE FROM tft_matches WHERE match_id = $1
                     RETURNING event_id, tournament_id, stage_id
                 )
                 SELECT e.name AS event, t.name AS tournament, s.name AS stage
                 FROM m {TAG_NAME_JOINS}"
            ))
            .bind::<Text, _>(match_id)
            .get_result::<MatchTagNamesRow>(&mut conn)
            .await
            .optional()?;

            Ok(match deleted {
                Some(row) => StoreOutcome::Ok(row.into()),
                None => StoreOutcome::NotFound,
            })
        })
    }

    fn registered_games<'a>(&'a self) -> BoxFuture<'a, Result<Vec<(MatchTags, i64)>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let rows = sql_query(format!(
                "SELECT e.name AS event, t.name AS tournament, s.name AS stage, COUNT(*) AS count
                 FROM tft_matches m {TAG_NAME_JOINS}
                 GROUP BY e.name, t.name, s.name"
            ))
            .load::<RegisteredGamesRow>(&mut conn)
            .await?;

            Ok(rows
                .into_iter()
                .map(|row| {
                    (
                        MatchTags {
                            event: row.event,
                            tournament: row.tournament,
                            stage: row.stage,
                        },
                        row.count,
                    )
                })
                .collect())
        })
    }

    fn create_tag_tree<'a>(
        &'a self,
        kind: TagKind,
        tree: &'a TagTree,
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            conn.transaction::<_, StoreError, _>(|conn| {
                async move {
                    let root = sql_query(format!(
                        "INSERT INTO {} (name) VALUES ($1)
                         ON CONFLICT (name) DO NOTHING
                         RETURNING id, name",
                        kind.table()
                    ))
                    .bind::<Text, _>(&tree.name)
                    .get_result::<TagRow>(&mut *conn)
                    .await
                    .optional()?;

                    let Some(root) = root else {
                        return Ok(StoreOutcome::Conflict);
                    };
                    attach_children(&mut *conn, kind, root.id, &tree.children).await?;
                    Ok(StoreOutcome::Ok(load_node(&mut *conn, kind, root).await?))
                }
                .scope_boxed()
            })
            .await
        })
    }

    fn get_tag_tree<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            match find_tag_row(&mut conn, kind, name).await? {
                Some(row) => Ok(StoreOutcome::Ok(load_node(&mut conn, kind, row).await?)),
                None => Ok(StoreOutcome::NotFound),
            }
        })
    }

    fn list_tag_trees<'a>(
        &'a self,
        kind: TagKind,
    ) -> BoxFuture<'a, Result<Vec<TagNode>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let rows = sql_query(format!("SELECT id, name FROM {} ORDER BY name", kind.table()))
                .load::<TagRow>(&mut conn)
                .await?;
            let mut nodes = Vec::with_capacity(rows.len());
            for row in rows {
                nodes.push(load_node(&mut conn, kind, row).await?);
            }
            Ok(nodes)
        })
    }

    fn replace_tag_children<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
        children: &'a [TagTree],
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            conn.transaction::<_, StoreError, _>(|conn| {
                async move {
                    let Some(row) = find_tag_row(&mut *conn, kind, name).await? else {
                        return Ok(StoreOutcome::NotFound);
                    };
                    if let Some(link) = kind.child_link() {
                        sql_query(format!(
                            "DELETE FROM {} WHERE {} = $1",
                            link.table, link.parent_column
                        ))
                        .bind::<Integer, _>(row.id)
                        .execute(&mut *conn)
                        .await?;
                    }
                    attach_children(&mut *conn, kind, row.id, children).await?;
                    Ok(StoreOutcome::Ok(load_node(&mut *conn, kind, row).await?))
                }
                .scope_boxed()
            })
            .await
        })
    }

    fn delete_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<()>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let deleted = sql_query(format!("DELETE FROM {} WHERE name = $1", kind.table()))
                .bind::<Text, _>(name)
                .execute(&mut conn)
                .await?;
            Ok(if deleted == 0 {
                StoreOutcome::NotFound
            } else {
                StoreOutcome::Ok(())
            })
        })
    }

    fn count_tags<'a>(&'a self, kind: TagKind) -> BoxFuture<'a, Result<i64, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let row = sql_query(format!("SELECT COUNT(*) AS count FROM {}", kind.table()))
                .get_result::<CountRow>(&mut conn)
                .await?;
            Ok(row.count)
        })
    }

    fn aggregate_participants<'a>(
        &'a self,
        filter: &'a SampleFilter,
        stat: ParticipantStat,
    ) -> BoxFuture<'a, Result<Option<StatAggregate>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let query = match stat {
                ParticipantStat::Placement => aggregate_column!(tft_participants::placement),
                ParticipantStat::PlayersEliminated => {
                    aggregate_column!(tft_participants::players_eliminated)
                }
                ParticipantStat::LastRound => aggregate_column!(tft_participants::last_round),
                ParticipantStat::DamageToPlayers => {
                    aggregate_column!(tft_participants::total_damage_to_players)
                }
            };
            let (count, min, max, sum) = filter_samples!(query, filter)
                .get_result::<(i64, Option<i32>, Option<i32>, Option<i64>)>(&mut conn)
                .await?;
            Ok(StatAggregate::from_parts(count, min, max, sum))
        })
    }

    fn damage_extreme<'a>(
        &'a self,
        filter: &'a SampleFilter,
        rank: DamageRank,
    ) -> BoxFuture<'a, Result<Option<PlayerDamage>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let query = filter_samples!(
                participant_join!()
                    .select((tft_players::puuid, tft_participants::total_damage_to_players))
                    .into_boxed(),
                filter
            );
            let query = match rank {
                DamageRank::Lowest => query.order(tft_participants::total_damage_to_players.asc()),
                DamageRank::Highest => query.order(tft_participants::total_damage_to_players.desc()),
            };
            let row = query
                .then_order_by(tft_participants::match_id.asc())
                .then_order_by(tft_participants::placement.asc())
                .limit(1)
                .get_result::<(String, i32)>(&mut conn)
                .await
                .optional()?;
            Ok(row.map(|(puuid, damage)| PlayerDamage { puuid, damage }))
        })
    }

    fn game_damage<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<Vec<PlayerDamage>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let rows = tft_participants::table
                .inner_join(tft_players::table)
                .filter(tft_participants::match_id.eq(match_id))
                .select((tft_players::puuid, tft_participants::total_damage_to_players))
                .order((
                    tft_participants::total_damage_to_players.desc(),
                    tft_participants::placement.asc(),
                ))
                .load::<(String, i32)>(&mut conn)
                .await?;
            Ok(rows
                .into_iter()
                .map(|(puuid, damage)| PlayerDamage { puuid, damage })
                .collect())
        })
    }

    fn aggregate_match_lengths<'a>(
        &'a self,
        tags: &'a TagIds,
    ) -> BoxFuture<'a, Result<Option<LengthAggregate>, StoreError>> {
        Box::pin(async move {
            let mut conn = self.pool.get().await?;
            let mut query = tft_matches::table
                .select((
                    count_star(),
                    min(tft_matches::game_length),
                    max(tft_matches::game_length),
                    sum(tft_matches::game_length),
                ))
                .into_boxed();
            if let Some(event_id) = tags.event {
                query = query.filter(tft_matches::event_id.eq(event_id));
            }
            if let Some(tournament_id) = tags.tournament {
                query = query.filter(tft_matches::tournament_id.eq(tournament_id));
            }
            if let Some(stage_id) = tags.stage {
                query = query.filter(tft_matches::stage_id.eq(stage_id));
            }
            let (count, min, max, sum) = query
                .get_result::<(i64, Option<f64>, Option<f64>, Option<f64>)>(&mut conn)
                .await?;
            Ok(LengthAggregate::from_parts(count, min, max, sum))
        })
    }
}
