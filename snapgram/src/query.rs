//! # Document Query Predicates
//!
//! Filter, sort and pagination predicates understood by every
//! [`DocumentStore`](crate::store::DocumentStore). Stores hand the matching
//! collection to [`QueryPlan::execute`], so all backends agree on semantics.
//!
//! | Predicate                  | Meaning                                                   |
//! |----------------------------|-----------------------------------------------------------|
//! | `equal(attr, value)`       | attribute equals value, contains it, or references it     |
//! | `search(attr, term)`       | every term token prefixes some word of the attribute      |
//! | `order_asc/desc(attr)`     | stable sort, applied in the order given                   |
//! | `limit(n)` / `offset(n)`   | page window (limit defaults to 25, clamped to 100)        |
//! | `cursor_after(id)`         | start right after the document with that id               |

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::StoreError,
    types::{CREATED_AT_ATTRIBUTE, Document, DocumentList, ID_ATTRIBUTE, UPDATED_AT_ATTRIBUTE, reference_id},
};

pub const DEFAULT_LIMIT: u64 = 25;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A single predicate passed to `list_documents`.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal { attribute: String, values: Vec<Value> },
    Search { attribute: String, term: String },
    Order { attribute: String, order: SortOrder },
    Limit(u64),
    Offset(u64),
    CursorAfter(String),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn search(attribute: impl Into<String>, term: impl Into<String>) -> Self {
        Query::Search {
            attribute: attribute.into(),
            term: term.into(),
        }
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Query::Order {
            attribute: attribute.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Query::Order {
            attribute: attribute.into(),
            order: SortOrder::Desc,
        }
    }

    pub fn limit(limit: u64) -> Self {
        Query::Limit(limit)
    }

    pub fn offset(offset: u64) -> Self {
        Query::Offset(offset)
    }

    pub fn cursor_after(document_id: impl Into<String>) -> Self {
        Query::CursorAfter(document_id.into())
    }
}

#[derive(Debug, Clone)]
enum Filter {
    Equal { attribute: String, values: Vec<Value> },
    Search { attribute: String, tokens: Vec<String> },
}

/// Compiled form of a list of [`Query`] predicates.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    filters: Vec<Filter>,
    sort: Vec<(String, SortOrder)>,
    limit: u64,
    offset: u64,
    cursor: Option<String>,
}

impl Default for QueryPlan {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
            cursor: None,
        }
    }
}

impl QueryPlan {
    pub fn from_queries(queries: &[Query]) -> Result<Self, StoreError> {
        let mut plan = QueryPlan::default();
        for query in queries {
            match query {
                Query::Equal { attribute, values } => {
                    if values.is_empty() {
                        return Err(invalid(format!("Equal query on {attribute} requires a value")));
                    }
                    plan.filters.push(Filter::Equal {
                        attribute: attribute.clone(),
                        values: values.clone(),
                    });
                }
                Query::Search { attribute, term } => {
                    let tokens = tokenize(term);
                    // An empty term matches everything.
                    if !tokens.is_empty() {
                        plan.filters.push(Filter::Search {
                            attribute: attribute.clone(),
                            tokens,
                        });
                    }
                }
                Query::Order { attribute, order } => plan.sort.push((attribute.clone(), *order)),
                Query::Limit(limit) => plan.limit = (*limit).clamp(1, MAX_LIMIT),
                Query::Offset(offset) => plan.offset = *offset,
                Query::CursorAfter(id) => {
                    if plan.cursor.is_some() {
                        return Err(invalid("Only one cursor query is allowed".to_string()));
                    }
                    plan.cursor = Some(id.clone());
                }
            }
        }
        Ok(plan)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns `true` if the document satisfies every filter.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Equal { attribute, values } => document
                .attribute(attribute)
                .is_some_and(|actual| values.iter().any(|wanted| value_matches(&actual, wanted))),
            Filter::Search { attribute, tokens } => document
                .attribute(attribute)
                .is_some_and(|actual| text_matches(&actual, tokens)),
        })
    }

    /// Filters, sorts and pages `documents`.
    pub fn execute(&self, documents: Vec<Document>) -> Result<DocumentList, StoreError> {
        let mut matching: Vec<Document> = documents.into_iter().filter(|doc| self.matches(doc)).collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let total = matching.len() as u64;
        let start = match &self.cursor {
            Some(cursor) => {
                let position = matching
                    .iter()
                    .position(|doc| &doc.id == cursor)
                    .ok_or_else(|| invalid(format!("Cursor document '{cursor}' is not part of the result set")))?;
                position + 1
            }
            None => 0,
        };

        let documents = matching
            .into_iter()
            .skip(start)
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect();
        Ok(DocumentList { total, documents })
    }

    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let default_sort = [(CREATED_AT_ATTRIBUTE.to_string(), SortOrder::Asc)];
        let sort = if self.sort.is_empty() { &default_sort[..] } else { &self.sort[..] };
        for (attribute, order) in sort {
            let ordering = compare_attribute(a, b, attribute);
            let ordering = match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.id.cmp(&b.id)
    }
}

fn invalid(message: String) -> StoreError {
    StoreError::InvalidRequest { message }
}

fn compare_attribute(a: &Document, b: &Document, attribute: &str) -> Ordering {
    match attribute {
        CREATED_AT_ATTRIBUTE => a.created_at.cmp(&b.created_at),
        UPDATED_AT_ATTRIBUTE => a.updated_at.cmp(&b.updated_at),
        ID_ATTRIBUTE => a.id.cmp(&b.id),
        other => compare_values(a.data.get(other), b.data.get(other)),
    }
}

/// Orders missing values first, then numbers, then strings, then everything else.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn value_matches(actual: &Value, wanted: &Value) -> bool {
    if actual == wanted {
        return true;
    }
    match actual {
        Value::Array(items) => items.iter().any(|item| value_matches(item, wanted)),
        Value::Object(_) => match (reference_id(actual), wanted.as_str()) {
            (Some(id), Some(wanted)) => id == wanted,
            _ => false,
        },
        _ => false,
    }
}

fn text_matches(actual: &Value, tokens: &[String]) -> bool {
    let words: Vec<String> = match actual {
        Value::String(text) => tokenize(text),
        Value::Array(items) => items.iter().filter_map(Value::as_str).flat_map(tokenize).collect(),
        _ => return false,
    };
    tokens.iter().all(|token| words.iter().any(|word| word.starts_with(token.as_str())))
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn doc(id: &str, minute: u32, data: Value) -> Document {
        let Value::Object(map) = data else { panic!("object expected") };
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap();
        Document {
            id: id.to_string(),
            collection_id: "posts".to_string(),
            created_at: at,
            updated_at: at,
            data: map,
        }
    }

    fn ids(list: &DocumentList) -> Vec<&str> {
        list.documents.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn equal_matches_scalars_lists_and_references() {
        let docs = vec![
            doc("a", 1, json!({"creator": "u1"})),
            doc("b", 2, json!({"creator": ["u1"]})),
            doc("c", 3, json!({"creator": {"$id": "u1", "name": "Ada"}})),
            doc("d", 4, json!({"creator": "u2"})),
            doc("e", 5, json!({})),
        ];
        let plan = QueryPlan::from_queries(&[Query::equal("creator", "u1")]).unwrap();
        let result = plan.execute(docs).unwrap();
        assert_eq!(ids(&result), vec!["a", "b", "c"]);
        assert_eq!(result.total, 3);
    }

    #[test]
    fn search_requires_every_token_as_word_prefix() {
        let docs = vec![
            doc("a", 1, json!({"caption": "Sunset over the Lake"})),
            doc("b", 2, json!({"caption": "lakeside breakfast"})),
            doc("c", 3, json!({"caption": "city lights"})),
        ];
        let plan = QueryPlan::from_queries(&[Query::search("caption", "lake")]).unwrap();
        assert_eq!(ids(&plan.execute(docs.clone()).unwrap()), vec!["a", "b"]);

        let plan = QueryPlan::from_queries(&[Query::search("caption", "sun lake")]).unwrap();
        assert_eq!(ids(&plan.execute(docs.clone()).unwrap()), vec!["a"]);

        let plan = QueryPlan::from_queries(&[Query::search("caption", "   ")]).unwrap();
        assert_eq!(plan.execute(docs).unwrap().total, 3);
    }

    #[test]
    fn orders_by_timestamp_descending() {
        let docs = vec![doc("a", 1, json!({})), doc("b", 3, json!({})), doc("c", 2, json!({}))];
        let plan = QueryPlan::from_queries(&[Query::order_desc("$createdAt")]).unwrap();
        assert_eq!(ids(&plan.execute(docs).unwrap()), vec!["b", "c", "a"]);
    }

    #[test]
    fn orders_by_data_attribute_with_missing_first() {
        let docs = vec![
            doc("a", 1, json!({"rank": 2})),
            doc("b", 2, json!({})),
            doc("c", 3, json!({"rank": 1})),
        ];
        let plan = QueryPlan::from_queries(&[Query::order_asc("rank")]).unwrap();
        assert_eq!(ids(&plan.execute(docs).unwrap()), vec!["b", "c", "a"]);
    }

    #[test]
    fn cursor_pages_through_results() {
        let docs: Vec<Document> = (0..5).map(|i| doc(&format!("d{i}"), i, json!({}))).collect();
        let first = QueryPlan::from_queries(&[Query::limit(2)]).unwrap().execute(docs.clone()).unwrap();
        assert_eq!(ids(&first), vec!["d0", "d1"]);
        assert_eq!(first.total, 5);

        let second = QueryPlan::from_queries(&[Query::limit(2), Query::cursor_after("d1")])
            .unwrap()
            .execute(docs.clone())
            .unwrap();
        assert_eq!(ids(&second), vec!["d2", "d3"]);

        let missing = QueryPlan::from_queries(&[Query::cursor_after("nope")]).unwrap().execute(docs);
        assert!(matches!(missing, Err(StoreError::InvalidRequest { .. })));
    }

    #[test]
    fn limit_is_clamped() {
        let plan = QueryPlan::from_queries(&[Query::limit(10_000)]).unwrap();
        assert_eq!(plan.limit(), MAX_LIMIT);
        let plan = QueryPlan::from_queries(&[Query::limit(0)]).unwrap();
        assert_eq!(plan.limit(), 1);
        assert_eq!(QueryPlan::from_queries(&[]).unwrap().limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn rejects_empty_equal_and_double_cursor() {
        let empty = Query::Equal {
            attribute: "user".to_string(),
            values: Vec::new(),
        };
        assert!(QueryPlan::from_queries(&[empty]).is_err());
        assert!(QueryPlan::from_queries(&[Query::cursor_after("a"), Query::cursor_after("b")]).is_err());
    }
}
