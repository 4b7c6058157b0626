use std::collections::HashSet;

use super::graph::MatchGraph;

/// Keeps only matches in which enough allow-listed players took part.
///
/// The filter is active only when both a positive threshold and a non-empty allow-list are
/// given. Otherwise every match passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantFilter {
    pub min_players: u8,
    pub allow_list: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRejection {
    pub matched: usize,
    pub needed: u8,
}

impl FilterRejection {
    /// Policy rejections are not failures.
    pub const STATUS: u16 = 200;

    pub fn message(&self) -> String {
        format!("{} players matched, needed {}", self.matched, self.needed)
    }
}

impl ParticipantFilter {
    pub fn new(min_players: u8, allow_list: impl IntoIterator<Item = String>) -> Self {
        Self {
            min_players,
            allow_list: allow_list.into_iter().collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.min_players > 0 && !self.allow_list.is_empty()
    }

    pub fn check(&self, graph: &MatchGraph) -> Result<(), FilterRejection> {
        if !self.is_active() {
            return Ok(());
        }

        let matched = graph
            .puuids()
            .filter(|puuid| self.allow_list.contains(*puuid))
            .collect::<HashSet<_>>()
            .len();

        if matched >= usize::from(self.min_players) {
            Ok(())
        } else {
            Err(FilterRejection {
                matched,
                needed: self.min_players,
            })
        }
    }
}
