//! Dynamic values checked by the validation engine.
//!
//! The [`Value`] enum is the runtime representation of the data being
//! validated. Scalars are stored inline; containers own their elements.
//! There is no sharing and no interior mutability: a value handed to the
//! engine is read-only for the duration of the check.
//!
//! | Variant | Contents | Notes |
//! |---------|----------|-------|
//! | `Value::List(Vec<Value>)` | ordered sequence | stable iteration order |
//! | `Value::Set(Vec<Value>)` | unordered collection | iteration order not meaningful |
//! | `Value::Tuple(Vec<Value>)` | fixed-length heterogeneous sequence | |
//! | `Value::Map(Vec<(Value, Value)>)` | associative container | insertion-ordered |
//! | `Value::Class(Class)` | a runtime class object | subject of subtype assertions |
//! | `Value::Instance(Class)` | opaque instance of a user class | instance-of respects bases |

use std::fmt;
use std::sync::Arc;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLASSES
// ============================================================================

/// A runtime class object with single- or multiple-inheritance bases.
///
/// `Class` is a cheap handle: cloning shares the underlying definition, and
/// two handles are equal only if they point at the same definition. Subclass
/// checks walk the base edges reflexively and transitively.
#[derive(Clone)]
pub struct Class {
    def: Arc<ClassDef>,
}

struct ClassDef {
    name: String,
    bases: Vec<Class>,
}

impl Class {
    /// Create a class with no bases.
    pub fn new(name: impl Into<String>) -> Self {
        Class {
            def: Arc::new(ClassDef {
                name: name.into(),
                bases: Vec::new(),
            }),
        }
    }

    /// Create a class deriving from the given bases.
    pub fn derived(name: impl Into<String>, bases: impl IntoIterator<Item = Class>) -> Self {
        Class {
            def: Arc::new(ClassDef {
                name: name.into(),
                bases: bases.into_iter().collect(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn bases(&self) -> &[Class] {
        &self.def.bases
    }

    /// Reflexive-transitive subclass test over the base edges.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        if self == other {
            return true;
        }
        self.def.bases.iter().any(|base| base.is_subclass_of(other))
    }

    /// An opaque instance of this class.
    pub fn instance(&self) -> Value {
        Value::Instance(self.clone())
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.def.name)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.def.name)
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// A dynamic value submitted for validation.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null/absence sentinel.
    Null,
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit IEEE-754 float.
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// An ordered sequence.
    List(Vec<Value>),
    /// An unordered collection. The element order is whatever the producer
    /// yielded; diagnostics derived from it are not reproducible.
    Set(Vec<Value>),
    /// A fixed-length heterogeneous sequence.
    Tuple(Vec<Value>),
    /// An associative container, insertion-ordered.
    Map(Vec<(Value, Value)>),
    /// A runtime class object.
    Class(Class),
    /// An opaque instance of a user class.
    Instance(Class),
}

/// Names the variant of a [`Value`], for leaf instance-of tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Set,
    Tuple,
    Map,
    Class,
    Instance,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Map(_) => ValueKind::Map,
            Value::Class(_) => ValueKind::Class,
            Value::Instance(_) => ValueKind::Instance,
        }
    }

    /// Look up a string key in a `Map` value.
    ///
    /// Returns `None` for non-map values and for absent keys. Maps are
    /// insertion-ordered vectors of pairs, so this is a linear scan; record
    /// validation works on small field sets where that is the right trade.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(pairs) => pairs.iter().find_map(|(k, v)| match k {
                Value::Str(s) if s == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(items.into_iter().collect())
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(pairs.into_iter().collect())
    }

    /// A map with string keys, the shape record descriptors check against.
    pub fn record(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (Value::Str(k.to_string()), v))
                .collect(),
        )
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            // Numeric values compare across representations: 1 == 1.0.
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => {
                // Print whole floats with a decimal point so they stay
                // distinguishable from integers in diagnostics.
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{n:.1}")
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(bytes) => {
                f.write_str("b\"")?;
                for byte in bytes {
                    if byte.is_ascii_graphic() || *byte == b' ' {
                        write!(f, "{}", *byte as char)?;
                    } else {
                        write!(f, "\\x{byte:02x}")?;
                    }
                }
                f.write_str("\"")
            }
            Value::List(items) => {
                f.write_str("[")?;
                fmt_joined(f, items)?;
                f.write_str("]")
            }
            Value::Set(items) => {
                if items.is_empty() {
                    // `{}` is the empty map; the empty set needs its own spelling.
                    return f.write_str("set()");
                }
                f.write_str("{")?;
                fmt_joined(f, items)?;
                f.write_str("}")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                fmt_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Map(pairs) => {
                f.write_str("{")?;
                for (idx, (k, v)) in pairs.iter().enumerate() {
                    if idx != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Class(c) => write!(f, "<class {}>", c.name()),
            Value::Instance(c) => write!(f, "<{} instance>", c.name()),
        }
    }
}

fn fmt_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx != 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::Bytes => "bytes",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Tuple => "tuple",
            ValueKind::Map => "map",
            ValueKind::Class => "class",
            ValueKind::Instance => "instance",
        };
        f.write_str(name)
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<serde_json::Value> for Value {
    /// Lift a parsed JSON document into the value model.
    ///
    /// Arrays become lists, objects become string-keyed maps (preserving
    /// object member order as parsed), integral numbers become `Int` and
    /// everything else numeric becomes `Float`.
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(members) => Value::Map(
                members
                    .into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// SERDE
// ============================================================================

// The class variants have no data-model representation, so serde support is
// hand-written rather than derived. Classes and instances serialize as their
// diagnostic rendering; sets and tuples serialize as sequences; maps with
// non-string keys serialize as sequences of pairs.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(items) | Value::Set(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) => {
                if pairs.iter().all(|(k, _)| matches!(k, Value::Str(_))) {
                    let mut map = serializer.serialize_map(Some(pairs.len()))?;
                    for (k, v) in pairs {
                        map.serialize_entry(k, v)?;
                    }
                    map.end()
                } else {
                    let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
                    for pair in pairs {
                        seq.serialize_element(pair)?;
                    }
                    seq.end()
                }
            }
            Value::Class(_) | Value::Instance(_) => {
                serializer.serialize_str(&self.to_string())
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("any self-describing value")
            }

            fn visit_bool<E>(self, b: bool) -> Result<Value, E> {
                Ok(Value::Bool(b))
            }

            fn visit_i64<E>(self, n: i64) -> Result<Value, E> {
                Ok(Value::Int(n))
            }

            fn visit_u64<E>(self, n: u64) -> Result<Value, E> {
                Ok(i64::try_from(n).map_or(Value::Float(n as f64), Value::Int))
            }

            fn visit_f64<E>(self, n: f64) -> Result<Value, E> {
                Ok(Value::Float(n))
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
                Ok(Value::Str(s.to_string()))
            }

            fn visit_string<E>(self, s: String) -> Result<Value, E> {
                Ok(Value::Str(s))
            }

            fn visit_bytes<E>(self, b: &[u8]) -> Result<Value, E> {
                Ok(Value::Bytes(b.to_vec()))
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
                Deserialize::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some((k, v)) = access.next_entry::<String, Value>()? {
                    pairs.push((Value::Str(k), v));
                }
                Ok(Value::Map(pairs))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
