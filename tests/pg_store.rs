#![cfg(feature = "pg-tests")]

use std::fs;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::BigInt;
use les_stats_lib::db::{build_db_pool, run_migrations};
use les_stats_lib::ingest::graph::MatchGraph;
use les_stats_lib::ingest::writer::WriteOutcome;
use les_stats_lib::store::{
    DamageRank, MatchStore, ParticipantStat, PgStore, PlayerDamage, SampleFilter, StoreError,
    StoreOutcome,
};
use les_stats_lib::tags::{MatchTags, ResolvedTags, TagKind};
use serde_json::{json, Value};

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

struct TempPostgres {
    data_dir: PathBuf,
    port: u16,
    db_name: String,
}

impl TempPostgres {
    fn start() -> Self {
        for binary in ["initdb", "pg_ctl", "createdb", "dropdb"] {
            assert!(
                binary_exists(binary),
                "required binary `{binary}` is missing; install PostgreSQL CLI tools"
            );
        }

        let unique = unique_suffix();
        let data_dir = std::env::temp_dir().join(format!("les_stats_pg_{unique}"));
        fs::create_dir_all(&data_dir).expect("failed to create temporary postgres data dir");

        run_checked(
            Command::new("initdb")
                .arg("-D")
                .arg(&data_dir)
                .arg("-A")
                .arg("trust")
                .arg("-U")
                .arg("postgres")
                .arg("--encoding=UTF8")
                .arg("--no-instructions"),
            "initdb",
        );

        let port = free_tcp_port();
        run_checked(
            Command::new("pg_ctl")
                .arg("-D")
                .arg(&data_dir)
                .arg("-o")
                .arg(format!("-F -p {port} -h 127.0.0.1 -k {}", data_dir.display()))
                .arg("-w")
                .arg("start"),
            "pg_ctl start",
        );

        let db_name = format!("les_stats_{unique}");
        run_checked(
            Command::new("createdb")
                .arg("-h")
                .arg("127.0.0.1")
                .arg("-p")
                .arg(port.to_string())
                .arg("-U")
                .arg("postgres")
                .arg(&db_name),
            "createdb",
        );

        Self {
            data_dir,
            port,
            db_name,
        }
    }

    fn database_url(&self) -> String {
        format!("postgresql://postgres@127.0.0.1:{}/{}", self.port, self.db_name)
    }

    fn count(&self, table: &str) -> i64 {
        let mut conn = PgConnection::establish(&self.database_url())
            .expect("failed to connect to temporary postgres for assertions");
        sql_query(format!("SELECT COUNT(*) AS count FROM {table}"))
            .get_result::<CountRow>(&mut conn)
            .expect("failed to count rows")
            .count
    }
}

impl Drop for TempPostgres {
    fn drop(&mut self) {
        let _ = Command::new("dropdb")
            .arg("-h")
            .arg("127.0.0.1")
            .arg("-p")
            .arg(self.port.to_string())
            .arg("-U")
            .arg("postgres")
            .arg(&self.db_name)
            .status();

        let _ = Command::new("pg_ctl")
            .arg("-D")
            .arg(&self.data_dir)
            .arg("-m")
            .arg("immediate")
            .arg("-w")
            .arg("stop")
            .status();

        let _ = fs::remove_dir_all(&self.data_dir);
    }
}

async fn migrated_store() -> (TempPostgres, PgStore) {
    let pg = TempPostgres::start();
    run_migrations(&pg.database_url())
        .await
        .expect("failed to run postgres migrations");
    let pool = build_db_pool(&pg.database_url(), 4).expect("failed to build pool");
    (pg, PgStore::new(pool))
}

fn participant(puuid: &str, placement: i32, units: &[&str]) -> Value {
    let units = units
        .iter()
        .map(|character_id| {
            json!({
                "character_id": character_id,
                "name": "",
                "rarity": 4,
                "tier": 2,
                "itemNames": ["TFT_Item_InfinityEdge", format!("{character_id}_Item")]
            })
        })
        .collect::<Vec<_>>();

    json!({
        "puuid": puuid,
        "placement": placement,
        "level": 8,
        "last_round": 40 - placement,
        "gold_left": 3,
        "players_eliminated": 8 - placement,
        "time_eliminated": 2000.0 - f64::from(placement) * 100.0,
        "total_damage_to_players": 200 - placement * 20,
        "augments": ["TFT9_Augment_CyberneticImplants1", format!("{puuid}_Augment")],
        "companion": {"content_ID": format!("{puuid}-pet"), "skin_ID": 1, "species": "PetPenguin"},
        "traits": [
            {"name": "Set9_Ionia", "num_units": 3, "style": 1, "tier_current": 1, "tier_total": 3}
        ],
        "units": units
    })
}

fn graph(match_id: &str, participants: Vec<Value>, tags: &ResolvedTags) -> MatchGraph {
    let puuids = participants
        .iter()
        .filter_map(|participant| participant["puuid"].as_str().map(str::to_string))
        .collect::<Vec<_>>();
    let payload = json!({
        "metadata": {"data_version": "5", "match_id": match_id, "participants": puuids},
        "info": {
            "game_datetime": 1_700_000_000_000i64,
            "game_length": 2100.5,
            "game_version": "Version 13.24.1",
            "queue_id": 1100,
            "tft_game_type": "standard",
            "tft_set_core_name": "TFTSet9_2",
            "tft_set_number": 9,
            "participants": participants
        }
    });
    MatchGraph::from_payload(payload, match_id, "europe", tags).expect("valid payload")
}

/// A full lobby sharing every player, companion, augment, trait, unit and item.
fn lobby(match_id: &str, reversed: bool) -> MatchGraph {
    let mut players = (1..=8)
        .map(|placement| {
            participant(
                &format!("p-{placement}"),
                placement,
                &["TFT9_Ahri", "TFT9_Zed", "TFT9_Jinx"],
            )
        })
        .collect::<Vec<_>>();
    if reversed {
        players.reverse();
        for player in &mut players {
            if let Some(units) = player["units"].as_array_mut() {
                units.reverse();
            }
        }
    }
    graph(match_id, players, &ResolvedTags::default())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_of_one_lobby_in_opposite_orders_both_succeed() {
    let (pg, store) = migrated_store().await;

    for round in 0..10 {
        let forward = lobby(&format!("EUW1_{round}0"), false);
        let reversed = lobby(&format!("EUW1_{round}1"), true);
        let (first, second) = tokio::join!(store.commit_match(&forward), store.commit_match(&reversed));
        assert_eq!(first.expect("forward commit"), WriteOutcome::Written);
        assert_eq!(second.expect("reversed commit"), WriteOutcome::Written);
    }

    assert_eq!(pg.count("tft_matches"), 20);
    assert_eq!(pg.count("tft_players"), 8);
    assert_eq!(pg.count("tft_participants"), 160);
    assert_eq!(pg.count("tft_units"), 3);
}

#[tokio::test]
async fn failed_commit_rolls_back_every_row() {
    let (pg, store) = migrated_store().await;

    // Placement 9 trips the check constraint after the match and catalog rows were written.
    let game = graph(
        "EUW1_1",
        vec![
            participant("p-1", 1, &["TFT9_Ahri"]),
            participant("p-2", 9, &["TFT9_Zed"]),
        ],
        &ResolvedTags::default(),
    );
    let err = store.commit_match(&game).await.expect_err("check violation");
    assert!(matches!(err, StoreError::Database(_)), "{err}");

    for table in [
        "tft_matches",
        "tft_players",
        "tft_companions",
        "tft_participants",
        "tft_units",
        "tft_items",
        "tft_unit_items",
    ] {
        assert_eq!(pg.count(table), 0, "{table} kept rows");
    }
    assert!(!store.match_exists("EUW1_1").await.unwrap());
}

#[tokio::test]
async fn duplicate_commit_writes_nothing() {
    let (pg, store) = migrated_store().await;
    let game = lobby("EUW1_1", false);

    assert_eq!(store.commit_match(&game).await.unwrap(), WriteOutcome::Written);
    let participants = pg.count("tft_participants");
    let unit_items = pg.count("tft_unit_items");

    assert_eq!(store.commit_match(&game).await.unwrap(), WriteOutcome::Duplicate);
    assert_eq!(pg.count("tft_matches"), 1);
    assert_eq!(pg.count("tft_participants"), participants);
    assert_eq!(pg.count("tft_unit_items"), unit_items);
}

#[tokio::test]
async fn delete_match_cascades_and_returns_tag_names() {
    let (pg, store) = migrated_store().await;
    let stage = store.get_or_create_tag(TagKind::Stage, "Finals").await.unwrap();
    let tags = ResolvedTags {
        stage: Some(stage),
        ..ResolvedTags::default()
    };
    let game = graph(
        "EUW1_1",
        vec![participant("p-1", 1, &["TFT9_Ahri"]), participant("p-2", 2, &["TFT9_Zed"])],
        &tags,
    );
    store.commit_match(&game).await.unwrap();

    assert_eq!(
        store.delete_match("EUW1_1").await.unwrap(),
        StoreOutcome::Ok(MatchTags {
            stage: Some("Finals".to_string()),
            ..MatchTags::default()
        })
    );
    for table in ["tft_participants", "tft_current_units", "tft_unit_items", "tft_current_traits"] {
        assert_eq!(pg.count(table), 0, "{table} kept rows");
    }
    assert_eq!(pg.count("tft_players"), 2);
    assert_eq!(pg.count("stages"), 1);
    assert_eq!(store.delete_match("EUW1_1").await.unwrap(), StoreOutcome::NotFound);
}

#[tokio::test]
async fn stat_aggregates_are_computed_by_postgres() {
    let (_pg, store) = migrated_store().await;
    let finals = store.get_or_create_tag(TagKind::Stage, "Finals").await.unwrap();
    let staged = ResolvedTags {
        stage: Some(finals.clone()),
        ..ResolvedTags::default()
    };
    store
        .commit_match(&graph(
            "EUW1_1",
            vec![participant("p-1", 2, &[]), participant("p-2", 5, &[])],
            &staged,
        ))
        .await
        .unwrap();
    store
        .commit_match(&graph(
            "EUW1_2",
            vec![participant("p-1", 1, &[]), participant("p-3", 5, &[])],
            &ResolvedTags::default(),
        ))
        .await
        .unwrap();

    let player = SampleFilter {
        puuid: Some("p-1".to_string()),
        ..SampleFilter::default()
    };
    let placement = store
        .aggregate_participants(&player, ParticipantStat::Placement)
        .await
        .unwrap()
        .expect("p-1 has games");
    assert_eq!((placement.count, placement.min, placement.max, placement.sum), (2, 1, 2, 3));
    assert!((placement.avg - 1.5).abs() < f64::EPSILON);

    let in_finals = SampleFilter {
        tags: staged.ids(),
        ..SampleFilter::default()
    };
    let kills = store
        .aggregate_participants(&in_finals, ParticipantStat::PlayersEliminated)
        .await
        .unwrap()
        .expect("finals have participants");
    assert_eq!((kills.min, kills.max, kills.sum), (3, 6, 9));

    let nobody = SampleFilter {
        puuid: Some("p-404".to_string()),
        ..SampleFilter::default()
    };
    assert_eq!(
        store
            .aggregate_participants(&nobody, ParticipantStat::LastRound)
            .await
            .unwrap(),
        None
    );

    // p-2 and p-3 both dealt 100; the earlier match wins the tie.
    assert_eq!(
        store
            .damage_extreme(&SampleFilter::default(), DamageRank::Lowest)
            .await
            .unwrap(),
        Some(PlayerDamage {
            puuid: "p-2".to_string(),
            damage: 100,
        })
    );
    assert_eq!(
        store
            .damage_extreme(&SampleFilter::default(), DamageRank::Highest)
            .await
            .unwrap(),
        Some(PlayerDamage {
            puuid: "p-1".to_string(),
            damage: 180,
        })
    );

    let ranking = store.game_damage("EUW1_2").await.unwrap();
    assert_eq!(
        ranking.iter().map(|row| row.puuid.as_str()).collect::<Vec<_>>(),
        vec!["p-1", "p-3"]
    );

    let lengths = store
        .aggregate_match_lengths(&staged.ids())
        .await
        .unwrap()
        .expect("one staged match");
    assert_eq!(lengths.count, 1);
    assert!((lengths.sum - 2100.5).abs() < f64::EPSILON);
}

fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn run_checked(cmd: &mut Command, description: &str) {
    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("failed to spawn subprocess");
    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "{description} failed (status {}):\nstdout:\n{stdout}\nstderr:\n{stderr}",
            output.status
        );
    }
}

fn free_tcp_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind temporary local port");
    listener
        .local_addr()
        .expect("failed to read local bind address")
        .port()
}

fn unique_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time went backwards")
        .as_nanos();
    format!("{}_{}", std::process::id(), now)
}
