use serde::{Deserialize, Serialize};

/// Regional routing value used for match lookups and as the player's region key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Americas,
    Asia,
    Europe,
    Sea,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Americas => "americas",
            Self::Asia => "asia",
            Self::Europe => "europe",
            Self::Sea => "sea",
        }
    }

    /// Maps a platform id (`EUW1`, `na1`, ...) to its regional cluster.
    pub fn from_platform(platform: &str) -> Option<Self> {
        let region = match platform.to_ascii_uppercase().as_str() {
            "NA1" | "BR1" | "LA1" | "LA2" => Self::Americas,
            "EUW1" | "EUN1" | "TR1" | "RU" => Self::Europe,
            "KR" | "JP1" => Self::Asia,
            "OC1" | "PH2" | "SG2" | "TH2" | "TW2" | "VN2" => Self::Sea,
            _ => return None,
        };
        Some(region)
    }

    /// Region encoded in a match id such as `EUW1_6543210987`.
    pub fn from_match_id(match_id: &str) -> Option<Self> {
        let (platform, rest) = match_id.split_once('_')?;
        if rest.is_empty() {
            return None;
        }
        Self::from_platform(platform)
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "americas" => Ok(Self::Americas),
            "asia" => Ok(Self::Asia),
            "europe" => Ok(Self::Europe),
            "sea" => Ok(Self::Sea),
            other => Err(format!("unknown region `{other}`")),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
