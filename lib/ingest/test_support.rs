use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use serde_json::{json, Value};

use super::MatchFetcher;
use crate::envelope::Envelope;

pub(crate) fn participant(puuid: &str, placement: i32, units: &[&str]) -> Value {
    let units = units
        .iter()
        .map(|character_id| {
            json!({
                "character_id": character_id,
                "name": "",
                "rarity": 4,
                "tier": 2,
                "itemNames": ["TFT_Item_InfinityEdge"]
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
        "augments": ["TFT9_Augment_CyberneticImplants1"],
        "companion": {"content_ID": "pengu-1", "skin_ID": 1, "species": "PetPenguin"},
        "traits": [
            {"name": "Set9_Ionia", "num_units": 3, "style": 1, "tier_current": 1, "tier_total": 3}
        ],
        "units": units
    })
}

pub(crate) fn match_payload(match_id: &str, participants: Vec<Value>) -> Value {
    let puuids = participants
        .iter()
        .filter_map(|participant| participant["puuid"].as_str().map(str::to_string))
        .collect::<Vec<_>>();

    json!({
        "metadata": {
            "data_version": "5",
            "match_id": match_id,
            "participants": puuids
        },
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
    })
}

/// Serves scripted envelopes by match id. Unknown ids answer like the provider's 404.
#[derive(Default)]
pub(crate) struct MockFetcher {
    responses: Mutex<HashMap<String, Envelope<Value>>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MockFetcher {
    pub(crate) fn with_responses(responses: Vec<(&str, Envelope<Value>)>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(id, envelope)| (id.to_string(), envelope))
                    .collect(),
            ),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Serves each payload under its own `metadata.match_id`.
    pub(crate) fn serving(payloads: Vec<Value>) -> Self {
        let responses = payloads
            .into_iter()
            .map(|payload| {
                let id = payload["metadata"]["match_id"]
                    .as_str()
                    .expect("payload has a match id")
                    .to_string();
                (id, Envelope::data(payload))
            })
            .collect();
        Self {
            responses: Mutex::new(responses),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().expect("batches mutex poisoned").clone()
    }
}

impl MatchFetcher for MockFetcher {
    fn fetch_matches<'a>(&'a self, match_ids: &'a [String]) -> BoxFuture<'a, Vec<Envelope<Value>>> {
        Box::pin(async move {
            self.batches
                .lock()
                .expect("batches mutex poisoned")
                .push(match_ids.to_vec());

            let responses = self.responses.lock().expect("responses mutex poisoned");
            match_ids
                .iter()
                .map(|id| {
                    responses.get(id).cloned().unwrap_or_else(|| {
                        Envelope::error(
                            404,
                            json!({"status": {"message": "Data not found", "status_code": 404}}),
                        )
                    })
                })
                .collect()
        })
    }

    fn fallback_region(&self) -> String {
        "europe".to_string()
    }
}
