//! The type descriptor model: the data representing "what a type is".
//!
//! [`TypeDescriptor`] is a closed tagged union. The matcher is an exhaustive
//! `match` over it, so adding a variant is a compile-time-checked change in
//! every consumer. Descriptors are created once - by a builder call or by
//! [`crate::annotation::parse_annotation`] - and are read-only for the
//! lifetime of a check.
//!
//! `Display` renders the annotation syntax the parser reads, so descriptors
//! round-trip through text (type variables and extensions excepted: a bound
//! type variable renders as its bare `$name`, and extensions have no textual
//! form).

use std::fmt;
use std::sync::Arc;

use crate::value::{Class, Value};

/// A concrete, non-parametric runtime type, matched by instance-of test.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafType {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    /// Bare sequence kind, items unchecked.
    List,
    /// Bare unordered-collection kind, items unchecked.
    Set,
    /// Bare tuple kind, arity and items unchecked.
    Tuple,
    /// Bare mapping kind, keys and values unchecked.
    Map,
    /// A user class; instances of the class or any subclass match.
    Class(Class),
}

impl LeafType {
    /// Instance-of test against a concrete value.
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            LeafType::Bool => matches!(value, Value::Bool(_)),
            LeafType::Int => matches!(value, Value::Int(_)),
            LeafType::Float => matches!(value, Value::Float(_)),
            LeafType::Str => matches!(value, Value::Str(_)),
            LeafType::Bytes => matches!(value, Value::Bytes(_)),
            LeafType::List => matches!(value, Value::List(_)),
            LeafType::Set => matches!(value, Value::Set(_)),
            LeafType::Tuple => matches!(value, Value::Tuple(_)),
            LeafType::Map => matches!(value, Value::Map(_)),
            LeafType::Class(class) => {
                matches!(value, Value::Instance(k) if k.is_subclass_of(class))
            }
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafType::Bool => f.write_str("bool"),
            LeafType::Int => f.write_str("int"),
            LeafType::Float => f.write_str("float"),
            LeafType::Str => f.write_str("str"),
            LeafType::Bytes => f.write_str("bytes"),
            LeafType::List => f.write_str("list"),
            LeafType::Set => f.write_str("set"),
            LeafType::Tuple => f.write_str("tuple"),
            LeafType::Map => f.write_str("map"),
            LeafType::Class(class) => f.write_str(class.name()),
        }
    }
}

/// A named field of a [`RecordType`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub required: bool,
}

/// A structural record: named fields, each required or optional.
///
/// Field order is declaration order and is preserved for deterministic
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordType {
    name: Option<String>,
    fields: Vec<RecordField>,
}

impl RecordType {
    /// An anonymous record with no fields yet.
    pub fn new() -> Self {
        RecordType::default()
    }

    /// A named record with no fields yet.
    pub fn named(name: impl Into<String>) -> Self {
        RecordType {
            name: Some(name.into()),
            fields: Vec::new(),
        }
    }

    /// Append a required field.
    pub fn field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            descriptor,
            required: true,
        });
        self
    }

    /// Append an optional field.
    pub fn optional(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            descriptor,
            required: false,
        });
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }
}

impl From<RecordType> for TypeDescriptor {
    fn from(record: RecordType) -> Self {
        TypeDescriptor::Record(record)
    }
}

/// A registrable extension check: a named, pluggable predicate over values.
///
/// The closed descriptor set stays closed; external value kinds (element-typed
/// arrays and the like) hook in here instead of growing new variants. Two
/// extensions compare equal when their names match - the predicate itself is
/// opaque.
#[derive(Clone)]
pub struct ExtensionType {
    name: String,
    check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl ExtensionType {
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        ExtensionType {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn admits(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl PartialEq for ExtensionType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtensionType({})", self.name)
    }
}

/// Declarative description of a type, checked against values by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// Matches every value.
    Any,
    /// Matches exactly the null sentinel.
    None,
    /// Concrete runtime type, instance-of test.
    Leaf(LeafType),
    /// Homogeneous iterable container. `ordered` controls which value kinds
    /// are accepted and whether failure indices are stable across runs.
    Collection {
        item: Box<TypeDescriptor>,
        ordered: bool,
    },
    /// Associative container, parametric on key and value.
    Mapping {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    /// Fixed-arity heterogeneous tuple.
    FixedTuple(Vec<TypeDescriptor>),
    /// Arbitrary-length homogeneous tuple.
    VariadicTuple(Box<TypeDescriptor>),
    /// At least one member must accept the value. Members are tried in
    /// declared order; the empty union vacuously succeeds.
    Union(Vec<TypeDescriptor>),
    /// The value must equal one of the listed constants.
    Literal(Vec<Value>),
    /// Structural record with required/optional named fields.
    Record(RecordType),
    /// Named indirection, resolved through the alias context at check time.
    /// This is what makes self-referential descriptors expressible.
    Alias(String),
    /// Placeholder matching anything, or anything satisfying its bound.
    TypeVar {
        name: String,
        bound: Option<Box<TypeDescriptor>>,
    },
    /// The value itself must be a class object related to the bound.
    /// The bound must flatten to class-like leaves (or `Any`).
    SubtypeOf(Box<TypeDescriptor>),
    /// Pluggable external check, see [`ExtensionType`].
    Extension(ExtensionType),
    /// A descriptor shape the engine does not interpret, carrying the
    /// original spelling. Distinct from "value fails to match".
    Unsupported(String),
}

impl TypeDescriptor {
    /// Ordered collection of homogeneous items (`list[T]`).
    pub fn list(item: TypeDescriptor) -> Self {
        TypeDescriptor::Collection {
            item: Box::new(item),
            ordered: true,
        }
    }

    /// Unordered collection of homogeneous items (`set[T]`).
    pub fn set(item: TypeDescriptor) -> Self {
        TypeDescriptor::Collection {
            item: Box::new(item),
            ordered: false,
        }
    }

    /// Associative container (`map[K, V]`).
    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn fixed_tuple(items: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        TypeDescriptor::FixedTuple(items.into_iter().collect())
    }

    pub fn variadic_tuple(item: TypeDescriptor) -> Self {
        TypeDescriptor::VariadicTuple(Box::new(item))
    }

    pub fn union(members: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        TypeDescriptor::Union(members.into_iter().collect())
    }

    pub fn literal(values: impl IntoIterator<Item = Value>) -> Self {
        TypeDescriptor::Literal(values.into_iter().collect())
    }

    pub fn alias(name: impl Into<String>) -> Self {
        TypeDescriptor::Alias(name.into())
    }

    /// Unbound type variable; matches anything.
    pub fn type_var(name: impl Into<String>) -> Self {
        TypeDescriptor::TypeVar {
            name: name.into(),
            bound: None,
        }
    }

    /// Bounded type variable; matches anything satisfying `bound`.
    pub fn bounded_var(name: impl Into<String>, bound: TypeDescriptor) -> Self {
        TypeDescriptor::TypeVar {
            name: name.into(),
            bound: Some(Box::new(bound)),
        }
    }

    pub fn subtype_of(bound: TypeDescriptor) -> Self {
        TypeDescriptor::SubtypeOf(Box::new(bound))
    }

    /// Instances of `class` (or any subclass).
    pub fn instance_of(class: Class) -> Self {
        TypeDescriptor::Leaf(LeafType::Class(class))
    }

    /// Whether this descriptor is an alias indirection.
    pub fn is_alias(&self) -> bool {
        matches!(self, TypeDescriptor::Alias(_))
    }
}

/// Outcome of flattening a subtype bound down to concrete classes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SubtypeBound {
    /// An `Any` appeared somewhere in the bound; every class satisfies it.
    Vacuous,
    /// The concrete classes the checked class must derive from.
    Classes(Vec<Class>),
}

/// Flatten a subtype bound through nested unions into its class-like leaves.
///
/// Returns `None` when the bound contains anything that is not a class-like
/// leaf, a union, or `Any` - such a bound cannot be evaluated, which is an
/// unsupported-descriptor condition rather than a mismatch.
pub(crate) fn flatten_subtype_bound(bound: &TypeDescriptor) -> Option<SubtypeBound> {
    let mut queue = vec![bound];
    let mut classes = Vec::new();
    let mut saw_any = false;
    let mut saw_non_class = false;
    while let Some(t) = queue.pop() {
        match t {
            TypeDescriptor::Any => saw_any = true,
            TypeDescriptor::Union(members) => queue.extend(members.iter()),
            TypeDescriptor::Leaf(LeafType::Class(class)) => classes.push(class.clone()),
            _ => saw_non_class = true,
        }
    }
    // An embedded `Any` makes the bound vacuous no matter what else it holds.
    if saw_any {
        return Some(SubtypeBound::Vacuous);
    }
    if saw_non_class {
        return Option::None;
    }
    Some(SubtypeBound::Classes(classes))
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Any => f.write_str("any"),
            TypeDescriptor::None => f.write_str("none"),
            TypeDescriptor::Leaf(leaf) => write!(f, "{leaf}"),
            TypeDescriptor::Collection { item, ordered } => {
                let head = if *ordered { "list" } else { "set" };
                write!(f, "{head}[{item}]")
            }
            TypeDescriptor::Mapping { key, value } => write!(f, "map[{key}, {value}]"),
            TypeDescriptor::FixedTuple(items) => {
                f.write_str("tuple[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            TypeDescriptor::VariadicTuple(item) => write!(f, "tuple[{item}, ...]"),
            TypeDescriptor::Union(members) => {
                if members.is_empty() {
                    return f.write_str("union[]");
                }
                for (idx, member) in members.iter().enumerate() {
                    if idx != 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TypeDescriptor::Literal(values) => {
                f.write_str("literal[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            TypeDescriptor::Record(record) => {
                // Named records render as their name alone; the inspector's
                // structure view is the place the full shape is spelled out.
                if let Some(name) = record.name() {
                    return f.write_str(name);
                }
                f.write_str("{")?;
                for (idx, field) in record.fields().iter().enumerate() {
                    if idx != 0 {
                        f.write_str(", ")?;
                    }
                    let marker = if field.required { "" } else { "?" };
                    write!(f, "{}{marker}: {}", field.name, field.descriptor)?;
                }
                f.write_str("}")
            }
            TypeDescriptor::Alias(name) => f.write_str(name),
            TypeDescriptor::TypeVar { name, .. } => write!(f, "${name}"),
            TypeDescriptor::SubtypeOf(bound) => write!(f, "type[{bound}]"),
            TypeDescriptor::Extension(ext) => write!(f, "@{}", ext.name()),
            TypeDescriptor::Unsupported(raw) => f.write_str(raw),
        }
    }
}
