//! List the canonical function catalog

use crate::FunctionCatalog;

/// One line per overload: `name (args) -> return  [Kind id]`, sorted by name.
pub fn describe_functions(catalog: &FunctionCatalog) -> Vec<String> {
    catalog
        .names()
        .into_iter()
        .flat_map(|name| {
            catalog.overloads(name).iter().map(move |signature| {
                format!(
                    "{} {}  [{:?} {}]",
                    name, signature, signature.operation.kind, signature.operation.id
                )
            })
        })
        .collect()
}
