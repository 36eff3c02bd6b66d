//! # Entity Data Model
//!
//! The type system that query expressions are bound against: primitive kinds,
//! nullable type references, and structured (entity or complex) types with
//! their properties.
//!
//! The binder only sees the model through the [`EdmModel`] trait, so any schema
//! source can back it. [`Model`] is the in-memory implementation used by the CLI
//! and the tests.
//!
//! ```
//! use odata_query::edm::{Model, StructuredType, TypeReference};
//!
//! let mut model = Model::new();
//! model.add_type(
//!     StructuredType::entity("Shop", "Customer")
//!         .with_property("Name", TypeReference::string(true))
//!         .with_property("Age", TypeReference::int32(false)),
//! );
//! ```

use std::{collections::HashMap, fmt};

/// Upper bound on base-type hops, guarding against cyclic inheritance in a model.
const MAX_INHERITANCE_DEPTH: usize = 64;

/// Primitive (scalar) kinds of the `Edm` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Binary,
    Guid,
    DateTime,
    DateTimeOffset,
    Time,
    Geography,
    Geometry,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 14] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Single,
        PrimitiveKind::Double,
        PrimitiveKind::Decimal,
        PrimitiveKind::String,
        PrimitiveKind::Binary,
        PrimitiveKind::Guid,
        PrimitiveKind::DateTime,
        PrimitiveKind::DateTimeOffset,
        PrimitiveKind::Time,
        PrimitiveKind::Geography,
        PrimitiveKind::Geometry,
    ];

    /// Qualified name, e.g. `Edm.Int32`
    pub fn full_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Edm.Boolean",
            PrimitiveKind::Int32 => "Edm.Int32",
            PrimitiveKind::Int64 => "Edm.Int64",
            PrimitiveKind::Single => "Edm.Single",
            PrimitiveKind::Double => "Edm.Double",
            PrimitiveKind::Decimal => "Edm.Decimal",
            PrimitiveKind::String => "Edm.String",
            PrimitiveKind::Binary => "Edm.Binary",
            PrimitiveKind::Guid => "Edm.Guid",
            PrimitiveKind::DateTime => "Edm.DateTime",
            PrimitiveKind::DateTimeOffset => "Edm.DateTimeOffset",
            PrimitiveKind::Time => "Edm.Time",
            PrimitiveKind::Geography => "Edm.Geography",
            PrimitiveKind::Geometry => "Edm.Geometry",
        }
    }

    pub fn from_full_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.full_name() == name)
    }

    /// Kinds accepted by arithmetic operators and unary negation
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::Single
                | PrimitiveKind::Double
                | PrimitiveKind::Decimal
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

/// What a type reference points at.
///
/// Structured types are referenced by full name and looked up through the model,
/// which keeps recursive schemas (`Customer.Orders` / `Order.Customer`) acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDefinition {
    Primitive(PrimitiveKind),
    Structured(String),
    Collection(Box<TypeReference>),
}

/// A possibly-nullable reference to a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeReference {
    pub definition: TypeDefinition,
    pub nullable: bool,
}

impl TypeReference {
    pub fn primitive(kind: PrimitiveKind, nullable: bool) -> Self {
        TypeReference {
            definition: TypeDefinition::Primitive(kind),
            nullable,
        }
    }

    pub fn boolean(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Boolean, nullable)
    }

    pub fn int32(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Int32, nullable)
    }

    pub fn int64(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Int64, nullable)
    }

    pub fn single(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Single, nullable)
    }

    pub fn double(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Double, nullable)
    }

    pub fn decimal(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Decimal, nullable)
    }

    pub fn string(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::String, nullable)
    }

    pub fn binary(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Binary, nullable)
    }

    pub fn guid(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Guid, nullable)
    }

    pub fn date_time(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::DateTime, nullable)
    }

    pub fn date_time_offset(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::DateTimeOffset, nullable)
    }

    pub fn time(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Time, nullable)
    }

    pub fn geography(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Geography, nullable)
    }

    pub fn geometry(nullable: bool) -> Self {
        Self::primitive(PrimitiveKind::Geometry, nullable)
    }

    pub fn structured(full_name: impl Into<String>, nullable: bool) -> Self {
        TypeReference {
            definition: TypeDefinition::Structured(full_name.into()),
            nullable,
        }
    }

    pub fn collection(element: TypeReference) -> Self {
        TypeReference {
            definition: TypeDefinition::Collection(Box::new(element)),
            nullable: false,
        }
    }

    /// Parses a type name as written in schemas and `cast`/`isof` arguments:
    /// `Edm.Int32`, `Shop.Customer` or `Collection(Edm.String)`.
    ///
    /// Names outside the `Edm` namespace are taken to be structured types; the
    /// caller checks that the model knows them.
    pub fn parse(name: &str, nullable: bool) -> Option<Self> {
        let name = name.trim();
        if let Some(inner) = name
            .strip_prefix("Collection(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::parse(inner, true).map(Self::collection);
        }
        if name.starts_with("Edm.") {
            return PrimitiveKind::from_full_name(name).map(|kind| Self::primitive(kind, nullable));
        }
        if name.is_empty() || name.contains(['(', ')', ' ']) {
            return None;
        }
        Some(Self::structured(name, nullable))
    }

    pub fn full_name(&self) -> String {
        match &self.definition {
            TypeDefinition::Primitive(kind) => kind.full_name().to_string(),
            TypeDefinition::Structured(name) => name.clone(),
            TypeDefinition::Collection(element) => format!("Collection({})", element.full_name()),
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self.definition {
            TypeDefinition::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&str> {
        match &self.definition {
            TypeDefinition::Structured(name) => Some(name),
            _ => None,
        }
    }

    /// Element type when this is a collection
    pub fn element_type(&self) -> Option<&TypeReference> {
        match &self.definition {
            TypeDefinition::Collection(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.as_primitive().is_some()
    }

    pub fn is_boolean(&self) -> bool {
        self.as_primitive() == Some(PrimitiveKind::Boolean)
    }

    /// Structural equivalence: same definition, nullability ignored.
    pub fn is_equivalent(&self, other: &TypeReference) -> bool {
        self.definition == other.definition
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredKind {
    Entity,
    Complex,
}

/// A declared property of a structured type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub type_ref: TypeReference,
    /// Navigation properties point at other entities; only these can be expanded.
    pub navigation: bool,
}

/// An entity or complex type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredType {
    pub namespace: String,
    pub name: String,
    pub kind: StructuredKind,
    /// Full name of the base type, if any
    pub base_type: Option<String>,
    /// Open types accept properties that are not declared
    pub open: bool,
    pub properties: Vec<Property>,
}

impl StructuredType {
    pub fn entity(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, StructuredKind::Entity)
    }

    pub fn complex(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, StructuredKind::Complex)
    }

    fn new(namespace: impl Into<String>, name: impl Into<String>, kind: StructuredKind) -> Self {
        StructuredType {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            base_type: None,
            open: false,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, type_ref: TypeReference) -> Self {
        self.properties.push(Property {
            name: name.into(),
            type_ref,
            navigation: false,
        });
        self
    }

    pub fn with_navigation(mut self, name: impl Into<String>, type_ref: TypeReference) -> Self {
        self.properties.push(Property {
            name: name.into(),
            type_ref,
            navigation: true,
        });
        self
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Looks up a property declared on this type only, ignoring base types
    pub fn find_declared_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// The type system a binder resolves names against.
///
/// Implementations must be immutable once handed to a binder; the provided
/// methods walk base types through [`EdmModel::find_structured_type`].
pub trait EdmModel {
    fn find_structured_type(&self, full_name: &str) -> Option<&StructuredType>;

    /// Finds a property on `ty` or any of its base types.
    fn find_property<'a>(&'a self, ty: &'a StructuredType, name: &str) -> Option<&'a Property> {
        let mut current = ty;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Some(property) = current.find_declared_property(name) {
                return Some(property);
            }
            current = self.find_structured_type(current.base_type.as_deref()?)?;
        }
        None
    }

    /// A type is open when it or any base type is declared open.
    fn is_open(&self, ty: &StructuredType) -> bool {
        let mut current = ty;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if current.open {
                return true;
            }
            match current.base_type.as_deref().and_then(|b| self.find_structured_type(b)) {
                Some(base) => current = base,
                None => return false,
            }
        }
        false
    }

    /// True when `derived` is `base` or inherits from it.
    fn derives_from(&self, derived: &str, base: &str) -> bool {
        let mut current = derived.to_string();
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if current == base {
                return true;
            }
            match self
                .find_structured_type(&current)
                .and_then(|ty| ty.base_type.clone())
            {
                Some(next) => current = next,
                None => return false,
            }
        }
        false
    }
}

/// In-memory model keyed by full type name.
#[derive(Debug, Clone, Default)]
pub struct Model {
    types: HashMap<String, StructuredType>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a structured type under its full name.
    pub fn add_type(&mut self, ty: StructuredType) -> &mut Self {
        self.types.insert(ty.full_name(), ty);
        self
    }

    pub fn types(&self) -> impl Iterator<Item = &StructuredType> {
        self.types.values()
    }
}

impl EdmModel for Model {
    fn find_structured_type(&self, full_name: &str) -> Option<&StructuredType> {
        self.types.get(full_name)
    }
}
