//! Resource reporting query: filters, orders, limit and offset

use crate::storage::ResourceFilter;

/// A filterable/sortable column of the resource table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceField {
    Id,
    Uri,
    Class,
    Value,
    Content,
}

impl ResourceField {
    /// The column name.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceField::Id => "id",
            ResourceField::Uri => "uri",
            ResourceField::Class => "class",
            ResourceField::Value => "value",
            ResourceField::Content => "content",
        }
    }
}

impl std::fmt::Display for ResourceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction of an ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// The SQL keyword.
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// One ORDER BY key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: ResourceField,
    pub order: SortOrder,
}

/// Query over the resource table: conjunctive equality filters, ordering
/// keys and pagination.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    /// Exact-match filters; an unset filter matches every resource
    pub filter: ResourceFilter,
    /// ORDER BY keys, applied in sequence
    pub orders: Vec<SortKey>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
}

impl ResourceQuery {
    /// Create a query matching every resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to resources matching the filter.
    pub fn with_filter(mut self, filter: ResourceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Add an ORDER BY key.
    pub fn order_by(mut self, field: ResourceField, order: SortOrder) -> Self {
        self.orders.push(SortKey { field, order });
        self
    }

    /// Limit results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip results (for pagination).
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_accumulate() {
        let query = ResourceQuery::new()
            .with_filter(ResourceFilter::new().with_value("x"))
            .order_by(ResourceField::Value, SortOrder::Ascending)
            .order_by(ResourceField::Id, SortOrder::Descending)
            .limit(10)
            .offset(5);

        assert_eq!(query.filter.value.as_deref(), Some("x"));
        assert_eq!(query.orders.len(), 2);
        assert_eq!(query.orders[1].field, ResourceField::Id);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(5));
    }

    #[test]
    fn default_query_matches_everything() {
        let query = ResourceQuery::new();
        assert!(query.filter.is_unset());
        assert!(query.orders.is_empty());
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, None);
    }
}
