/// Common key-construction helpers for the Redis backend.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
    pub database: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str, database: &'a str) -> Self {
        Self { prefix, database }
    }

    pub fn document(&self, collection: &str, document_id: &str) -> String {
        format!("{}:{}:{}:{}", self.prefix, self.database, collection, document_id)
    }

    /// Key prefix shared by every document of `collection`, as given to `FT.CREATE ... PREFIX`.
    pub fn document_prefix(&self, collection: &str) -> String {
        format!("{}:{}:{}:", self.prefix, self.database, collection)
    }

    /// Hash holding one descriptor per index declared on `collection`.
    pub fn index_catalog(&self, collection: &str) -> String {
        format!("{}:{}:{}:_indexes", self.prefix, self.database, collection)
    }

    /// Name of the search index backing `index_name` on `collection`.
    pub fn search_index(&self, collection: &str, index_name: &str) -> String {
        format!("{}:{}:idx:{}:{}", self.prefix, self.database, collection, index_name)
    }
}
