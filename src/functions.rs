//! # Built-in Function Signature Catalog
//!
//! Canonical functions (`startswith`, `year`, `round`, `geo.distance`, ...) map
//! to one or more overloads. Each overload fixes its argument types, its return
//! type and a declarative [`Operation`] tag that the execution layer maps to a
//! real implementation; nothing here invokes anything.
//!
//! The built-in catalog is built once on first use and is read-only afterwards,
//! so it can be shared freely between threads.
//!
//! ```
//! use odata_query::edm::TypeReference;
//! use odata_query::functions::FunctionCatalog;
//!
//! let catalog = FunctionCatalog::builtin();
//! let signature = catalog
//!     .resolve("length", &[Some(TypeReference::string(true))])
//!     .unwrap();
//! assert_eq!(signature.return_type, TypeReference::int32(false));
//! ```

use std::{collections::HashMap, fmt, sync::LazyLock};

use tracing::trace;

use crate::{
    edm::{PrimitiveKind, TypeReference},
    error::{QueryError, Result},
};

static BUILTIN: LazyLock<FunctionCatalog> = LazyLock::new(build_builtin_catalog);

/// How the execution layer invokes an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Method on the first argument, e.g. `Name.StartsWith(x)`
    InstanceMethod,
    /// Free function taking every argument, e.g. `Math.Round(x)`
    StaticMethod,
    /// Property of the single argument, e.g. `Name.Length`
    PropertyAccess,
}

/// Declarative operation tag: a kind plus an opaque identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    pub kind: OperationKind,
    pub id: String,
}

/// One overload of a canonical function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub argument_types: Vec<TypeReference>,
    pub return_type: TypeReference,
    pub operation: Operation,
}

impl FunctionSignature {
    pub fn new(
        argument_types: Vec<TypeReference>,
        return_type: TypeReference,
        kind: OperationKind,
        id: impl Into<String>,
    ) -> Self {
        FunctionSignature {
            argument_types,
            return_type,
            operation: Operation {
                kind,
                id: id.into(),
            },
        }
    }

    fn same_arguments(&self, other: &FunctionSignature) -> bool {
        self.argument_types.len() == other.argument_types.len()
            && self
                .argument_types
                .iter()
                .zip(&other.argument_types)
                .all(|(a, b)| a.is_equivalent(b))
    }

    /// Unresolved arguments match any declared type.
    fn accepts(&self, argument_types: &[Option<TypeReference>]) -> bool {
        self.argument_types.len() == argument_types.len()
            && self
                .argument_types
                .iter()
                .zip(argument_types)
                .all(|(declared, actual)| {
                    actual
                        .as_ref()
                        .is_none_or(|actual| actual.is_equivalent(declared))
                })
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.argument_types.iter().map(|t| t.full_name()).collect();
        write!(f, "({}) -> {}", args.join(", "), self.return_type)
    }
}

/// Registry of function overloads keyed by function name.
#[derive(Debug, Clone, Default)]
pub struct FunctionCatalog {
    functions: HashMap<String, Vec<FunctionSignature>>,
}

impl FunctionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide catalog of canonical functions.
    pub fn builtin() -> &'static FunctionCatalog {
        &BUILTIN
    }

    /// Declares an overload, rejecting signatures that could never resolve uniquely.
    pub fn declare(&mut self, name: &str, signature: FunctionSignature) -> Result<()> {
        check_signature(name, &signature)?;
        if self
            .overloads(name)
            .iter()
            .any(|existing| existing.same_arguments(&signature))
        {
            return Err(QueryError::resolution(
                format!(
                    "Function '{}' already declares the signature {}",
                    name, signature
                ),
                name,
            ));
        }
        self.insert(name, signature);
        Ok(())
    }

    fn insert(&mut self, name: &str, signature: FunctionSignature) {
        self.functions
            .entry(name.to_string())
            .or_default()
            .push(signature);
    }

    /// Re-checks every declared overload; the built-in catalog must always pass.
    pub fn validate(&self) -> Result<()> {
        for (name, overloads) in &self.functions {
            for (index, signature) in overloads.iter().enumerate() {
                check_signature(name, signature)?;
                if overloads[..index]
                    .iter()
                    .any(|earlier| earlier.same_arguments(signature))
                {
                    return Err(QueryError::resolution(
                        format!(
                            "Function '{}' declares the signature {} twice",
                            name, signature
                        ),
                        name,
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn overloads(&self, name: &str) -> &[FunctionSignature] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Function names in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Picks the single overload of `name` matching the argument types by arity
    /// and per-position equivalence.
    pub fn resolve(
        &self,
        name: &str,
        argument_types: &[Option<TypeReference>],
    ) -> Result<&FunctionSignature> {
        let Some(overloads) = self.functions.get(name) else {
            return Err(QueryError::resolution(
                format!("Unknown function '{}'", name),
                name,
            ));
        };

        let mut matches = overloads.iter().filter(|s| s.accepts(argument_types));
        let first = matches.next();
        let ambiguous = matches.next().is_some();

        match (first, ambiguous) {
            (Some(signature), false) => {
                trace!(function = name, signature = %signature, "resolved function overload");
                Ok(signature)
            }
            (Some(_), true) => Err(QueryError::resolution(
                format!(
                    "Ambiguous call to function '{}' with argument types ({})",
                    name,
                    describe_arguments(argument_types)
                ),
                name,
            )),
            (None, _) => Err(QueryError::resolution(
                format!(
                    "No overload of function '{}' matches argument types ({})",
                    name,
                    describe_arguments(argument_types)
                ),
                name,
            )),
        }
    }
}

fn describe_arguments(argument_types: &[Option<TypeReference>]) -> String {
    argument_types
        .iter()
        .map(|t| match t {
            Some(t) => t.full_name(),
            None => "<unresolved>".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_signature(name: &str, signature: &FunctionSignature) -> Result<()> {
    let arity = signature.argument_types.len();
    let valid = match signature.operation.kind {
        OperationKind::PropertyAccess => arity == 1,
        OperationKind::InstanceMethod => arity >= 1,
        OperationKind::StaticMethod => true,
    };
    if !valid {
        return Err(QueryError::resolution(
            format!(
                "Function '{}' cannot be a {:?} with {} argument(s)",
                name, signature.operation.kind, arity
            ),
            name,
        ));
    }
    if signature.argument_types.iter().any(|t| t.nullable) {
        return Err(QueryError::resolution(
            format!(
                "Function '{}' must declare non-nullable argument types",
                name
            ),
            name,
        ));
    }
    Ok(())
}

fn signature(
    args: &[PrimitiveKind],
    returns: PrimitiveKind,
    kind: OperationKind,
    id: &str,
) -> FunctionSignature {
    FunctionSignature::new(
        args.iter()
            .map(|&arg| TypeReference::primitive(arg, false))
            .collect(),
        TypeReference::primitive(returns, false),
        kind,
        id,
    )
}

fn build_builtin_catalog() -> FunctionCatalog {
    use OperationKind::*;
    use PrimitiveKind::*;

    let mut catalog = FunctionCatalog::new();

    // String functions
    let strings: [(&str, &[PrimitiveKind], PrimitiveKind, OperationKind, &str); 12] = [
        ("substringof", &[String, String], Boolean, StaticMethod, "SubstringOf"),
        ("endswith", &[String, String], Boolean, InstanceMethod, "EndsWith"),
        ("startswith", &[String, String], Boolean, InstanceMethod, "StartsWith"),
        ("length", &[String], Int32, PropertyAccess, "Length"),
        ("indexof", &[String, String], Int32, InstanceMethod, "IndexOf"),
        ("replace", &[String, String, String], String, InstanceMethod, "Replace"),
        ("substring", &[String, Int32], String, InstanceMethod, "Substring"),
        ("substring", &[String, Int32, Int32], String, InstanceMethod, "Substring"),
        ("tolower", &[String], String, InstanceMethod, "ToLower"),
        ("toupper", &[String], String, InstanceMethod, "ToUpper"),
        ("trim", &[String], String, InstanceMethod, "Trim"),
        ("concat", &[String, String], String, StaticMethod, "Concat"),
    ];
    for (name, args, returns, kind, id) in strings {
        catalog.insert(name, signature(args, returns, kind, &format!("String.{id}")));
    }

    // Date and time functions
    for (name, id) in [
        ("year", "Year"),
        ("month", "Month"),
        ("day", "Day"),
        ("hour", "Hour"),
        ("minute", "Minute"),
        ("second", "Second"),
    ] {
        for (kind, type_name) in [(DateTime, "DateTime"), (DateTimeOffset, "DateTimeOffset")] {
            let id = format!("{type_name}.{id}");
            catalog.insert(name, signature(&[kind], Int32, PropertyAccess, &id));
        }
    }
    for (name, id) in [("hour", "Hours"), ("minute", "Minutes"), ("second", "Seconds")] {
        let id = format!("Time.{id}");
        catalog.insert(name, signature(&[Time], Int32, PropertyAccess, &id));
    }

    // Math functions
    for (name, id) in [("round", "Round"), ("floor", "Floor"), ("ceiling", "Ceiling")] {
        let id = format!("Math.{id}");
        catalog.insert(name, signature(&[Double], Double, StaticMethod, &id));
        catalog.insert(name, signature(&[Decimal], Decimal, StaticMethod, &id));
    }

    // Spatial functions
    for kind in [Geography, Geometry] {
        let distance = signature(&[kind, kind], Double, StaticMethod, "Geo.Distance");
        let length = signature(&[kind], Double, StaticMethod, "Geo.Length");
        let intersects = signature(&[kind, kind], Boolean, StaticMethod, "Geo.Intersects");
        catalog.insert("geo.distance", distance);
        catalog.insert("geo.length", length);
        catalog.insert("geo.intersects", intersects);
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_well_formed() {
        FunctionCatalog::builtin().validate().unwrap();
    }

    #[test]
    fn test_declare_rejects_duplicates() {
        let mut catalog = FunctionCatalog::new();
        let sig = signature(
            &[PrimitiveKind::String],
            PrimitiveKind::Int32,
            OperationKind::PropertyAccess,
            "Len",
        );
        catalog.declare("len", sig.clone()).unwrap();
        assert!(matches!(
            catalog.declare("len", sig),
            Err(QueryError::Resolution { .. })
        ));
    }

    #[test]
    fn test_declare_rejects_property_access_arity() {
        let mut catalog = FunctionCatalog::new();
        let sig = signature(
            &[PrimitiveKind::String, PrimitiveKind::String],
            PrimitiveKind::Int32,
            OperationKind::PropertyAccess,
            "Len",
        );
        assert!(catalog.declare("len", sig).is_err());
    }
}
