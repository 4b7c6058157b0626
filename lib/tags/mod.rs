//! Organizational tags (event, tournament, stage) and their resolution for ingestion.

pub mod tree;

use std::fmt;
use std::str::FromStr;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::store::{MatchStore, StoreError};

pub use tree::{TagNode, TagTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Event,
    Tournament,
    Stage,
}

/// Join table between a tag kind and its child kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    pub table: &'static str,
    pub parent_column: &'static str,
    pub child_column: &'static str,
}

impl TagKind {
    pub const ALL: [TagKind; 3] = [TagKind::Event, TagKind::Tournament, TagKind::Stage];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Tournament => "tournament",
            Self::Stage => "stage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::Tournament => "Tournament",
            Self::Stage => "Stage",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::Event => "events",
            Self::Tournament => "tournaments",
            Self::Stage => "stages",
        }
    }

    /// JSON key holding this kind's entries when nested under a parent.
    pub fn plural(self) -> &'static str {
        self.table()
    }

    pub fn child(self) -> Option<TagKind> {
        match self {
            Self::Event => Some(Self::Tournament),
            Self::Tournament => Some(Self::Stage),
            Self::Stage => None,
        }
    }

    pub fn child_link(self) -> Option<LinkTable> {
        match self {
            Self::Event => Some(LinkTable {
                table: "event_tournaments",
                parent_column: "event_id",
                child_column: "tournament_id",
            }),
            Self::Tournament => Some(LinkTable {
                table: "tournament_stages",
                parent_column: "tournament_id",
                child_column: "stage_id",
            }),
            Self::Stage => None,
        }
    }
}

impl FromStr for TagKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "event" => Ok(Self::Event),
            "tournament" => Ok(Self::Tournament),
            "stage" => Ok(Self::Stage),
            other => Err(format!("unknown tag kind `{other}`")),
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag reference as supplied by a caller.
///
/// A bare string names a tag that must already exist. An object `{"name": ...}` is a
/// definition and is created when missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    Name(String),
    Define { name: String },
}

impl TagInput {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Define { name } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    #[serde(default)]
    pub event: Option<TagInput>,
    #[serde(default)]
    pub tournament: Option<TagInput>,
    #[serde(default)]
    pub stage: Option<TagInput>,
}

impl TagRequest {
    fn inputs(&self) -> [(TagKind, Option<&TagInput>); 3] {
        [
            (TagKind::Event, self.event.as_ref()),
            (TagKind::Tournament, self.tournament.as_ref()),
            (TagKind::Stage, self.stage.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTags {
    pub event: Option<TagRef>,
    pub tournament: Option<TagRef>,
    pub stage: Option<TagRef>,
}

impl ResolvedTags {
    fn slot(&mut self, kind: TagKind) -> &mut Option<TagRef> {
        match kind {
            TagKind::Event => &mut self.event,
            TagKind::Tournament => &mut self.tournament,
            TagKind::Stage => &mut self.stage,
        }
    }

    pub fn ids(&self) -> TagIds {
        TagIds {
            event: self.event.as_ref().map(|tag| tag.id),
            tournament: self.tournament.as_ref().map(|tag| tag.id),
            stage: self.stage.as_ref().map(|tag| tag.id),
        }
    }

    pub fn names(&self) -> MatchTags {
        MatchTags {
            event: self.event.as_ref().map(|tag| tag.name.clone()),
            tournament: self.tournament.as_ref().map(|tag| tag.name.clone()),
            stage: self.stage.as_ref().map(|tag| tag.name.clone()),
        }
    }
}

/// Tag foreign keys of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagIds {
    pub event: Option<i32>,
    pub tournament: Option<i32>,
    pub stage: Option<i32>,
}

/// Tag names held by a stored match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchTags {
    pub event: Option<String>,
    pub tournament: Option<String>,
    pub stage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMiss {
    pub kind: TagKind,
    pub name: String,
}

impl TagMiss {
    pub const STATUS: u16 = 404;

    pub fn message(&self) -> String {
        format!("{} {} not found", self.kind.label(), self.name)
    }

    pub fn envelope<T>(&self) -> Envelope<T> {
        Envelope::error(Self::STATUS, self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagResolution {
    Resolved(ResolvedTags),
    NotFound(TagMiss),
}

/// Resolves the optional tags of one item.
///
/// Every bare-name lookup runs first, concurrently. The first miss in event, tournament,
/// stage order rejects the item before anything is created. Definitions are then
/// get-or-created, and a defined child is linked under the parent given next to it.
pub async fn resolve_tags<S>(store: &S, request: &TagRequest) -> Result<TagResolution, StoreError>
where
    S: MatchStore + ?Sized,
{
    let lookups = request
        .inputs()
        .into_iter()
        .filter_map(|(kind, input)| match input {
            Some(TagInput::Name(name)) => Some((kind, name.as_str())),
            _ => None,
        })
        .collect::<Vec<_>>();

    let found = try_join_all(
        lookups
            .iter()
            .map(|(kind, name)| store.find_tag(*kind, name)),
    )
    .await?;

    let mut resolved = ResolvedTags::default();
    for ((kind, name), tag) in lookups.iter().zip(found) {
        match tag {
            Some(tag) => *resolved.slot(*kind) = Some(tag),
            None => {
                return Ok(TagResolution::NotFound(TagMiss {
                    kind: *kind,
                    name: name.to_string(),
                }))
            }
        }
    }

    let mut parent: Option<(TagKind, i32)> = None;
    for (kind, input) in request.inputs() {
        match input {
            Some(TagInput::Define { name }) => {
                let tag = store.get_or_create_tag(kind, name).await?;
                if let Some((parent_kind, parent_id)) = parent {
                    if parent_kind.child() == Some(kind) {
                        store.link_tags(parent_kind, parent_id, tag.id).await?;
                    }
                }
                parent = Some((kind, tag.id));
                *resolved.slot(kind) = Some(tag);
            }
            Some(TagInput::Name(_)) => {
                parent = resolved.slot(kind).as_ref().map(|tag| (kind, tag.id));
            }
            None => parent = None,
        }
    }

    Ok(TagResolution::Resolved(resolved))
}

/// Looks up names only, never creating anything. Used by stat filters and the import CLI.
pub async fn lookup_tags<S>(
    store: &S,
    event: Option<&str>,
    tournament: Option<&str>,
    stage: Option<&str>,
) -> Result<TagResolution, StoreError>
where
    S: MatchStore + ?Sized,
{
    let request = TagRequest {
        event: event.map(|name| TagInput::Name(name.to_string())),
        tournament: tournament.map(|name| TagInput::Name(name.to_string())),
        stage: stage.map(|name| TagInput::Name(name.to_string())),
    };
    resolve_tags(store, &request).await
}
