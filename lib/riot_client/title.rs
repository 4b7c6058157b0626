use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::region::Region;

/// Game titles served by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Title {
    Tft,
    Lol,
    Valorant,
}

impl Title {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tft => "tft",
            Self::Lol => "lol",
            Self::Valorant => "valorant",
        }
    }

    pub(crate) fn env_prefix(self) -> &'static str {
        match self {
            Self::Tft => "TFT",
            Self::Lol => "LOL",
            Self::Valorant => "VALORANT",
        }
    }
}

impl FromStr for Title {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "tft" => Ok(Self::Tft),
            "lol" => Ok(Self::Lol),
            "valorant" => Ok(Self::Valorant),
            other => Err(format!("unknown title `{other}`")),
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TitleCredentials {
    pub api_key: String,
    /// Default regional routing (`europe`, `americas`, ...).
    pub routing: String,
}

impl fmt::Debug for TitleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitleCredentials")
            .field("api_key", &"<redacted>")
            .field("routing", &self.routing)
            .finish()
    }
}

/// A title bound to its credentials. The variant decides every provider path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleConfig {
    Tft(TitleCredentials),
    Lol(TitleCredentials),
    Valorant(TitleCredentials),
}

impl TitleConfig {
    pub fn new(title: Title, credentials: TitleCredentials) -> Self {
        match title {
            Title::Tft => Self::Tft(credentials),
            Title::Lol => Self::Lol(credentials),
            Title::Valorant => Self::Valorant(credentials),
        }
    }

    pub fn title(&self) -> Title {
        match self {
            Self::Tft(_) => Title::Tft,
            Self::Lol(_) => Title::Lol,
            Self::Valorant(_) => Title::Valorant,
        }
    }

    pub fn credentials(&self) -> &TitleCredentials {
        match self {
            Self::Tft(credentials) | Self::Lol(credentials) | Self::Valorant(credentials) => {
                credentials
            }
        }
    }

    pub fn match_path(&self, match_id: &str) -> Vec<String> {
        match self {
            Self::Tft(_) => endpoint(&["tft", "match", "v1", "matches"], match_id, &[]),
            Self::Lol(_) => endpoint(&["lol", "match", "v5", "matches"], match_id, &[]),
            Self::Valorant(_) => endpoint(&["val", "match", "v1", "matches"], match_id, &[]),
        }
    }

    pub fn match_list_path(&self, puuid: &str) -> Vec<String> {
        match self {
            Self::Tft(_) => endpoint(&["tft", "match", "v1", "matches", "by-puuid"], puuid, &["ids"]),
            Self::Lol(_) => endpoint(&["lol", "match", "v5", "matches", "by-puuid"], puuid, &["ids"]),
            Self::Valorant(_) => endpoint(&["val", "match", "v1", "matchlists", "by-puuid"], puuid, &[]),
        }
    }

    /// Whether match list requests accept paging and time window parameters.
    pub fn match_list_is_paged(&self) -> bool {
        !matches!(self, Self::Valorant(_))
    }

    pub fn summoner_by_puuid_path(&self, puuid: &str) -> Vec<String> {
        match self {
            Self::Tft(_) => endpoint(&["tft", "summoner", "v1", "summoners", "by-puuid"], puuid, &[]),
            Self::Lol(_) => endpoint(&["lol", "summoner", "v4", "summoners", "by-puuid"], puuid, &[]),
            Self::Valorant(_) => endpoint(&["riot", "account", "v1", "accounts", "by-puuid"], puuid, &[]),
        }
    }

    pub fn summoner_by_name_path(&self, name: &str) -> Option<Vec<String>> {
        match self {
            Self::Tft(_) => Some(endpoint(&["tft", "summoner", "v1", "summoners", "by-name"], name, &[])),
            Self::Lol(_) => Some(endpoint(&["lol", "summoner", "v4", "summoners", "by-name"], name, &[])),
            Self::Valorant(_) => None,
        }
    }

    /// Routing for a match fetch. TFT and LoL ids carry their platform; anything unmapped
    /// falls back to the title routing.
    pub fn match_routing(&self, match_id: &str) -> String {
        match self {
            Self::Tft(_) | Self::Lol(_) => Region::from_match_id(match_id)
                .map(|region| region.as_str().to_string())
                .unwrap_or_else(|| self.credentials().routing.clone()),
            Self::Valorant(credentials) => credentials.routing.clone(),
        }
    }
}

/// Fixed segments around the one segment a caller supplies.
fn endpoint(prefix: &[&str], id: &str, suffix: &[&str]) -> Vec<String> {
    prefix
        .iter()
        .copied()
        .chain(std::iter::once(id))
        .chain(suffix.iter().copied())
        .map(str::to_string)
        .collect()
}
