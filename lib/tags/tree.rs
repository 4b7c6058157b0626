use serde_json::{Map, Value};

use super::TagKind;

/// A tag with nested children, as submitted to the admin endpoints.
///
/// On the wire children sit under the child kind's plural key:
/// `{"name": "Worlds", "tournaments": [{"name": "Main", "stages": [{"name": "Finals"}]}]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTree {
    pub name: String,
    pub children: Vec<TagTree>,
}

/// A stored tag with its linked children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    pub id: i32,
    pub name: String,
    pub children: Vec<TagNode>,
}

impl TagTree {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn from_json(kind: TagKind, value: &Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("{} must be an object", kind.as_str()))?;
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| format!("{} requires a non-empty name", kind.as_str()))?;

        let children = Self::children_from_object(kind, object)?.unwrap_or_default();
        Ok(Self {
            name: name.to_string(),
            children,
        })
    }

    /// Reads only the children of a body such as `{"stages": [...]}`. `None` when the key is
    /// absent or null.
    pub fn children_from_json(kind: TagKind, value: &Value) -> Result<Option<Vec<Self>>, String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("{} must be an object", kind.as_str()))?;
        Self::children_from_object(kind, object)
    }

    fn children_from_object(
        kind: TagKind,
        object: &Map<String, Value>,
    ) -> Result<Option<Vec<Self>>, String> {
        for key in object.keys() {
            let known = key == "name" || kind.child().map(TagKind::plural) == Some(key.as_str());
            if !known {
                return Err(format!("unexpected field `{key}` on {}", kind.as_str()));
            }
        }

        let Some(child_kind) = kind.child() else {
            return Ok(None);
        };
        match object.get(child_kind.plural()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| Self::from_json(child_kind, entry))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(format!("`{}` must be a list", child_kind.plural())),
        }
    }
}

impl TagNode {
    pub fn to_json(&self, kind: TagKind) -> Value {
        let mut object = Map::new();
        object.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(child_kind) = kind.child() {
            object.insert(
                child_kind.plural().to_string(),
                Value::Array(
                    self.children
                        .iter()
                        .map(|child| child.to_json(child_kind))
                        .collect(),
                ),
            );
        }
        Value::Object(object)
    }
}
