use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    auth::{Access, CapabilityCheck, Scope, StaticKeys},
    cli::ImportArgs,
    config::Config,
    db::{build_db_pool, run_migrations},
    envelope::Envelope,
    ingest::{IngestService, ParticipantFilter, SaveItem},
    logging::format_error_report,
    riot_client::{MatchListQuery, RiotClient, RiotClientError, Title},
    server::{monitoring::Metrics, setup_server_with_addr},
    state::AppState,
    store::{MatchStore, PgStore, StoreError},
    tags::{TagInput, TagKind, TagRequest},
};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid API Key")]
    InvalidApiKey,
    #[error("tft provider is not configured")]
    ProviderMissing,
    #[error("{} {name} does not exist", .kind.label())]
    TagMissing { kind: TagKind, name: String },
    #[error("puuids-http-json {status}: {body}")]
    AllowList { status: u16, body: String },
    #[error("puuids-http-json request failed: {0}")]
    AllowListRequest(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    MatchList { status: u16, message: String },
    #[error(transparent)]
    Client(#[from] RiotClientError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Usage problems exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidApiKey | Self::ProviderMissing => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AllowListDocument {
    players: Vec<AllowListPlayer>,
}

#[derive(Debug, Deserialize)]
struct AllowListPlayer {
    puuid: String,
}

/// Loads `{"players": [{"puuid": ...}]}` from the given URL.
pub async fn fetch_allow_list(url: &str) -> Result<Vec<String>, ImportError> {
    let response = reqwest::Client::new()
        .get(url)
        .header("accept", "application/json")
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ImportError::AllowList {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    let document: AllowListDocument = response.json().await?;
    Ok(document.players.into_iter().map(|player| player.puuid).collect())
}

fn import_tags(args: &ImportArgs) -> TagRequest {
    let name = |value: &Option<String>| value.clone().map(TagInput::Name);
    TagRequest {
        event: name(&args.event),
        tournament: name(&args.tournament),
        stage: name(&args.stage),
    }
}

fn provider_message(message: &Value) -> String {
    message
        .pointer("/status/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| match message {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
}

/// One printable line per envelope: the data, or `status: message`.
pub fn render_envelope(envelope: &Envelope<String>) -> String {
    match (&envelope.data, &envelope.error) {
        (_, Some(error)) => format!("{}: {}", error.status_code, provider_message(&error.message)),
        (Some(data), None) => data.clone(),
        (None, None) => String::new(),
    }
}

/// Imports the recent matches of `args.puuid` into `store`.
///
/// Named tags must already exist. The player's match list is fetched once, and the ids go
/// through the regular save batch with the participant filter. `min_players` is the resolved
/// threshold, see [`ImportArgs::min_players`].
pub async fn import_matches(
    store: Arc<dyn MatchStore>,
    client: RiotClient,
    args: &ImportArgs,
    min_players: u8,
    allow_list: Vec<String>,
    metrics: &Metrics,
) -> Result<Vec<String>, ImportError> {
    let tags = import_tags(args);
    for (kind, name) in [
        (TagKind::Event, &args.event),
        (TagKind::Tournament, &args.tournament),
        (TagKind::Stage, &args.stage),
    ] {
        let Some(name) = name else { continue };
        if store.find_tag(kind, name).await?.is_none() {
            return Err(ImportError::TagMissing {
                kind,
                name: name.clone(),
            });
        }
    }

    let query = MatchListQuery {
        start: 0,
        count: args.count_game,
        start_time: Some(args.start_time),
        end_time: args.end_time,
    };
    let lists = client
        .get_match_lists(std::slice::from_ref(&args.puuid), &query)
        .await;
    let Some(list) = lists.items.into_iter().next() else {
        return Ok(vec!["No match found".to_string()]);
    };
    if let Some(error) = list.error {
        return Err(ImportError::MatchList {
            status: error.status_code,
            message: provider_message(&error.message),
        });
    }

    let match_ids: Vec<String> = list
        .data
        .as_ref()
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    if match_ids.is_empty() {
        return Ok(vec!["No match found".to_string()]);
    }
    info!(
        event = "import_matches_listed",
        puuid = %args.puuid,
        matches = match_ids.len(),
        "fetched match list"
    );

    let items: Vec<SaveItem> = match_ids
        .into_iter()
        .map(|id| SaveItem {
            id,
            tags: tags.clone(),
        })
        .collect();
    let filter = ParticipantFilter::new(min_players, allow_list);
    let service = IngestService::new(store, client, metrics.ingest.clone());
    let batch = service.save_batch(&items, &filter).await;

    Ok(batch.items.iter().map(render_envelope).collect())
}

async fn wait_for_shutdown_signal(token: CancellationToken) {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(err), _) | (_, Err(err)) => {
                error!(event = "signal_handler_failed", error = %err, "could not register signal handlers");
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => info!(event = "shutdown_signal", signal = "SIGTERM", "shutting down"),
        _ = sigint.recv() => info!(event = "shutdown_signal", signal = "SIGINT", "shutting down"),
    }

    token.cancel();
}

fn report_failure(event: &'static str, context: &str, err: &(dyn std::error::Error + 'static)) {
    let error_report = format_error_report(err);
    error!(
        event,
        error = %err,
        error_report = %error_report,
        "{context}"
    );
    eprintln!("{context}: {err}");
}

pub async fn run_migrate(config: &Config) -> i32 {
    match run_migrations(&config.db_url).await {
        Ok(applied) => {
            info!(event = "migrations_applied", applied, "database is up to date");
            0
        }
        Err(err) => {
            report_failure("migrations_failed", "failed to run migrations", &*err);
            1
        }
    }
}

/// Serves the API until SIGINT or SIGTERM.
pub async fn run_serve(config: &Config) -> i32 {
    let code = run_migrate(config).await;
    if code != 0 {
        return code;
    }

    let pool = match build_db_pool(&config.db_url, config.db_pool_size).await {
        Ok(pool) => pool,
        Err(err) => {
            report_failure("db_pool_build_failed", "failed to build db pool", &err);
            return 1;
        }
    };
    let store: Arc<dyn MatchStore> = Arc::new(PgStore::new(pool));
    let shutdown_token = CancellationToken::new();

    let state = match AppState::from_config(config, store, shutdown_token.clone()) {
        Ok(state) => state,
        Err(err) => {
            report_failure("provider_setup_failed", "failed to build provider clients", &err);
            return 2;
        }
    };
    match &state.ingest {
        Some(ingest) => {
            if let Err(err) = ingest.seed_metrics().await {
                warn!(event = "metrics_seed_failed", error = %err, "could not seed ingestion gauges");
            }
        }
        None => warn!(
            event = "ingest_disabled",
            "tft provider is not configured, match saving is disabled"
        ),
    }

    let signals = tokio::spawn(wait_for_shutdown_signal(shutdown_token));
    let server = match setup_server_with_addr(Arc::new(state), config.bind_addr).await {
        Ok(handle) => handle,
        Err(err) => {
            report_failure("server_start_failed", "failed to start http server", &err);
            signals.abort();
            return 1;
        }
    };

    let code = match server.await {
        Ok(()) => 0,
        Err(err) => {
            report_failure("server_task_failed", "http server task failed", &err);
            1
        }
    };
    signals.abort();
    info!(event = "server_stopped", "http server stopped");
    code
}

pub async fn run_import(config: &Config, args: ImportArgs) -> i32 {
    let keys = StaticKeys::new(config.api_keys.clone());
    if keys.check(&args.api_key, Scope::Write) == Access::Deny {
        eprintln!("{}", ImportError::InvalidApiKey);
        return ImportError::InvalidApiKey.exit_code();
    }
    let Some(title) = config.title(Title::Tft) else {
        eprintln!("{}", ImportError::ProviderMissing);
        return ImportError::ProviderMissing.exit_code();
    };

    let pool = match build_db_pool(&config.db_url, config.db_pool_size).await {
        Ok(pool) => pool,
        Err(err) => {
            report_failure("db_pool_build_failed", "failed to build db pool", &err);
            return 1;
        }
    };
    let metrics = Metrics::detached();

    let result = async {
        let client = RiotClient::new(
            title,
            &config.riot_base_url,
            config.request_timeout,
            metrics.provider.clone(),
        )?;
        let allow_list = match &args.puuids_http_json {
            Some(url) => fetch_allow_list(url).await?,
            None => Vec::new(),
        };
        import_matches(
            Arc::new(PgStore::new(pool)),
            client,
            &args,
            args.min_players(config.min_players),
            allow_list,
            &metrics,
        )
        .await
    }
    .await;

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            0
        }
        Err(err) => {
            report_failure("import_failed", "import failed", &err);
            err.exit_code()
        }
    }
}
