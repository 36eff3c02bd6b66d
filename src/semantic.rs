//! # Semantic Binding
//!
//! Turns the syntactic [`QueryToken`](crate::ast::QueryToken) tree into a typed
//! [`QueryNode`] tree. Names are resolved against an [`EdmModel`](crate::edm::EdmModel),
//! canonical functions against a [`FunctionCatalog`](crate::functions::FunctionCatalog),
//! and every operator is type-checked.
//!
//! Scoping:
//! - `$it` is the entity the query is applied to, bound once per [`Binder`]
//! - `any` / `all` introduce a lambda parameter ranging over the source
//!   collection's element type; inner parameters shadow outer ones
//! - an unqualified name is a lambda parameter if one is in scope, otherwise a
//!   property of `$it`

mod binder;
mod nodes;

pub use binder::Binder;
pub use nodes::{FilterClause, OrderByClause, QueryNode, RangeVariable, SelectExpandClause};
