use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::errors::StoreError;

/// Attribute names the document store reserves for its own metadata.
pub const ID_ATTRIBUTE: &str = "$id";
pub const COLLECTION_ATTRIBUTE: &str = "$collectionId";
pub const CREATED_AT_ATTRIBUTE: &str = "$createdAt";
pub const UPDATED_AT_ATTRIBUTE: &str = "$updatedAt";

/// A raw document as returned by the backend document store.
///
/// Store metadata lives in the `$`-prefixed fields; everything else is kept
/// untyped in `data` until a caller decodes it into an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$collectionId", default)]
    pub collection_id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(collection_id: impl Into<String>, id: impl Into<String>, data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            collection_id: collection_id.into(),
            created_at: now,
            updated_at: now,
            data: strip_reserved(data),
        }
    }

    /// Looks up an attribute, including the reserved metadata attributes.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            ID_ATTRIBUTE => Some(Value::String(self.id.clone())),
            COLLECTION_ATTRIBUTE => Some(Value::String(self.collection_id.clone())),
            CREATED_AT_ATTRIBUTE => Some(Value::String(self.created_at.to_rfc3339())),
            UPDATED_AT_ATTRIBUTE => Some(Value::String(self.updated_at.to_rfc3339())),
            other => self.data.get(other).cloned(),
        }
    }

    /// Shallow-merges `patch` into the document data.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in strip_reserved(patch) {
            self.data.insert(key, value);
        }
    }

    /// Decodes the document into a typed entity.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Removes store metadata keys from a client-supplied payload.
fn strip_reserved(mut data: Map<String, Value>) -> Map<String, Value> {
    data.retain(|key, _| !key.starts_with('$'));
    data
}

/// Result of a list call: the matching page plus the total match count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentList<T = Document> {
    pub total: u64,
    pub documents: Vec<T>,
}

impl<T> DocumentList<T> {
    pub fn empty() -> Self {
        Self {
            total: 0,
            documents: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentList<Document> {
    /// Decodes every document into `T`, failing on the first bad document.
    pub fn decode<T: DeserializeOwned>(self) -> Result<DocumentList<T>, StoreError> {
        let total = self.total;
        let documents = self
            .documents
            .into_iter()
            .map(Document::decode)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(DocumentList { total, documents })
    }
}

impl<T: Entity> DocumentList<T> {
    /// Cursor for the next page, or `None` when this page was not full.
    pub fn next_cursor(&self, page_size: u64) -> Option<&str> {
        if (self.documents.len() as u64) < page_size {
            return None;
        }
        self.documents.last().map(Entity::id)
    }
}

/// A typed record that can appear embedded inside another document.
pub trait Entity: Serialize + DeserializeOwned {
    /// Attribute that, next to `$id`, marks an embedded object as fully materialized.
    const DISPLAY_FIELD: &'static str;

    fn id(&self) -> &str;
}

/// Extracts an identifier from any of the raw reference shapes.
///
/// Accepts a bare id string, a list whose first element is a reference, or an
/// object carrying `$id`.
pub fn reference_id(value: &Value) -> Option<&str> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.as_str()),
        Value::Array(items) => items.first().and_then(reference_id),
        Value::Object(map) => map.get(ID_ATTRIBUTE).and_then(Value::as_str).filter(|id| !id.is_empty()),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Reference<T> - a reference field that may or may not have been resolved
// ═══════════════════════════════════════════════════════════════════════════════

/// A field pointing at another entity.
///
/// Raw store data carries references in three shapes (id string, one-element
/// list, embedded object). They are collapsed into this enum exactly once,
/// when the document is decoded; from then on the variant is the source of
/// truth for whether the reference has been resolved.
///
/// # JSON Serialization
///
/// - `Unresolved(id)` → `"id"`
/// - `Resolved(entity)` → `{ "$id": ..., ... }`
/// - `Malformed(raw)` → the raw value, untouched
#[derive(Debug, Clone, PartialEq)]
pub enum Reference<T> {
    /// Only the identifier of the target is known.
    Unresolved(String),
    /// The target entity has been materialized.
    Resolved(T),
    /// The raw value has no usable identifier.
    Malformed(Value),
}

impl<T> Default for Reference<T> {
    fn default() -> Self {
        Reference::Malformed(Value::Null)
    }
}

impl<T> Reference<T> {
    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }

    #[inline]
    pub fn as_resolved(&self) -> Option<&T> {
        match self {
            Reference::Resolved(entity) => Some(entity),
            _ => None,
        }
    }

}

impl<T: Entity> Reference<T> {
    /// Decodes a raw reference value.
    ///
    /// An embedded object counts as resolved only when it carries `$id`, a
    /// non-empty `T::DISPLAY_FIELD` string and decodes as `T`; otherwise only
    /// its id is kept.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let id = match map.get(ID_ATTRIBUTE).and_then(Value::as_str).filter(|id| !id.is_empty()) {
                    Some(id) => id.to_string(),
                    None => return Reference::Malformed(Value::Object(map)),
                };
                let materialized = map
                    .get(T::DISPLAY_FIELD)
                    .and_then(Value::as_str)
                    .is_some_and(|field| !field.is_empty());
                if materialized && let Ok(entity) = serde_json::from_value::<T>(Value::Object(map)) {
                    return Reference::Resolved(entity);
                }
                Reference::Unresolved(id)
            }
            Value::Array(mut items) if !items.is_empty() => Self::from_value(items.swap_remove(0)),
            other => match reference_id(&other) {
                Some(id) => Reference::Unresolved(id.to_string()),
                None => Reference::Malformed(other),
            },
        }
    }

    /// Identifier of the target, if one is known.
    pub fn id(&self) -> Option<&str> {
        match self {
            Reference::Unresolved(id) => Some(id),
            Reference::Resolved(entity) => Some(entity.id()),
            Reference::Malformed(_) => None,
        }
    }

    /// Identifier of the target, or a `MalformedReference` error naming `field`.
    pub fn target(&self, field: &str) -> Result<&str, StoreError> {
        match self {
            Reference::Unresolved(id) => Ok(id),
            Reference::Resolved(entity) => Ok(entity.id()),
            Reference::Malformed(raw) => Err(StoreError::malformed(field, raw.clone())),
        }
    }
}

impl<T: Serialize> Serialize for Reference<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Reference::Unresolved(id) => serializer.serialize_str(id),
            Reference::Resolved(entity) => entity.serialize(serializer),
            Reference::Malformed(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de, T: Entity> Deserialize<'de> for Reference<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Reference::from_value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IdList - canonical in-memory form of followers/following
// ═══════════════════════════════════════════════════════════════════════════════

/// An insertion-ordered set of identifiers.
///
/// Stored data may hold the list natively or as JSON-encoded text; both decode
/// here, once. It always serializes back as a native list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdList(Vec<String>);

impl IdList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a raw stored value. Unparseable text decodes as an empty list.
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Array(items) => items.iter().filter_map(reference_id).map(str::to_string).collect(),
            Value::String(text) if text.trim().is_empty() => Self::new(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(inner @ Value::Array(_)) => Self::decode(&inner),
                _ => Self::new(),
            },
            _ => Self::new(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    /// Appends `id` unless present. Returns `true` when it was added.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Removes `id`. Returns `true` when it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != before
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::String).collect())
    }
}

impl FromIterator<String> for IdList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut list = IdList::new();
        for id in iter {
            list.insert(id);
        }
        list
    }
}

impl Serialize for IdList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IdList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(|value| IdList::decode(&value))
    }
}

/// Deserializes a list of references into their ids, skipping unusable entries.
pub(crate) fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(reference_id).map(str::to_string).collect(),
        _ => Vec::new(),
    })
}
