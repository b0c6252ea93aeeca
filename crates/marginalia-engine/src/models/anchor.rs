use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Wire value of [`ParentIndex::Root`]
pub const ROOT_SENTINEL: i64 = -2;

/// Which element a [`NodeAddress`] is relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum ParentIndex {
    /// The root container itself
    Root,
    /// The n-th element with the address' tag name below the root
    Nth(usize),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid parent index {0}")]
pub struct InvalidParentIndex(pub i64);

impl From<ParentIndex> for i64 {
    fn from(index: ParentIndex) -> Self {
        match index {
            ParentIndex::Root => ROOT_SENTINEL,
            ParentIndex::Nth(n) => n as i64,
        }
    }
}

impl TryFrom<i64> for ParentIndex {
    type Error = InvalidParentIndex;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            ROOT_SENTINEL => Ok(ParentIndex::Root),
            n if n >= 0 => Ok(ParentIndex::Nth(n as usize)),
            n => Err(InvalidParentIndex(n)),
        }
    }
}

/// Positional locator of a character: "the n-th `<tag>` under the root, then the
/// k-th character of its text".
///
/// Only valid while no element with the same tag is inserted or removed before
/// the addressed one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAddress {
    pub parent_tag_name: String,
    pub parent_index: ParentIndex,
    pub text_offset: usize,
}

/// Persisted, tree-independent description of a highlighted span.
///
/// This is the exact shape exchanged with storage. `text` is a snapshot used for
/// diagnostics only, re-resolution relies on the two addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    id: Uuid,
    #[serde(rename = "startMeta")]
    start: NodeAddress,
    #[serde(rename = "endMeta")]
    end: NodeAddress,
    text: String,
    #[serde(deserialize_with = "class_names_from_wire")]
    class_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extra: Option<serde_json::Value>,
}

impl Anchor {
    pub fn new(
        start: NodeAddress,
        end: NodeAddress,
        text: impl Into<String>,
        id: Uuid,
        class_names: &[String],
        extra: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id,
            start,
            end,
            text: text.into(),
            class_names: unique(class_names.iter().cloned()),
            extra,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start(&self) -> &NodeAddress {
        &self.start
    }

    pub fn end(&self) -> &NodeAddress {
        &self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn extra(&self) -> Option<&serde_json::Value> {
        self.extra.as_ref()
    }
}

fn unique(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Accepts either a single class name or a list of them
fn class_names_from_wire<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => unique([name]),
        OneOrMany::Many(names) => unique(names),
    })
}
