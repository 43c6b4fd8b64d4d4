/// Key-construction helpers for the Redis-backed document store.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
    pub database: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str, database: &'a str) -> Self {
        Self { prefix, database }
    }

    /// Hash holding every document of a collection, keyed by document id.
    pub fn collection(&self, collection: &str) -> String {
        format!("{}:{}:{}", self.prefix, self.database, collection)
    }

    /// Pattern matching every key owned by this prefix (all databases).
    pub fn prefix_pattern(&self) -> String {
        format!("{}:*", self.prefix)
    }
}
