use crate::ast::QueryToken;

/// Sort direction of an `$orderby` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl OrderDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            OrderDirection::Ascending => "asc",
            OrderDirection::Descending => "desc",
        }
    }
}

/// One `$orderby` item.
///
/// # Example
/// ```text
/// Name desc
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByToken {
    pub expression: QueryToken,
    pub direction: OrderDirection,
}

/// `$select` clause: property paths or `*`, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectToken {
    pub properties: Vec<QueryToken>,
}

/// `$expand` clause: navigation paths, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandToken {
    pub properties: Vec<QueryToken>,
}

/// A query option that is not a `$`-prefixed system option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomQueryOption {
    pub name: String,
    pub value: String,
}
