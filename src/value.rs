//! Host values and the classification that drives composition.
//!
//! Values are owned by the host: records are shared handles that host
//! callables may mutate, callables are opaque functions with a declared
//! arity. The engine only ever reads values, builds new ones out of
//! arithmetic and concatenation, and invokes callables.

use std::cell::RefCell;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;

/// Failure reported by a host callable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// The callable threw.
    #[error("thrown: {0}")]
    Thrown(String),
    /// The callable was invoked with the wrong number of arguments.
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: usize, got: usize },
    /// The callable needs a receiver of another shape.
    #[error("bad receiver: {0}")]
    Receiver(String),
}

impl InvokeError {
    pub fn thrown(message: impl Into<String>) -> Self {
        InvokeError::Thrown(message.into())
    }
}

/// The invocation boundary between the engine and the host.
pub trait HostFn {
    /// Number of arguments the function declares.
    fn arity(&self) -> usize;

    /// Invoke the function. `receiver` is the record the function was
    /// extracted from, if any.
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvokeError>;
}

struct NativeFn<F> {
    arity: usize,
    f: F,
}

impl<F> HostFn for NativeFn<F>
where
    F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError>,
{
    fn arity(&self) -> usize {
        self.arity
    }

    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvokeError> {
        (self.f)(receiver, args)
    }
}

/// A host function, optionally bound to a receiver.
#[derive(Clone)]
pub struct Callable {
    func: Rc<dyn HostFn>,
    receiver: Option<Box<Value>>,
}

impl Callable {
    /// Wrap a closure as a callable of the given arity.
    ///
    /// ```
    /// use codehint_rs::value::{Callable, Value};
    ///
    /// let inc = Callable::new(1, |_, args| Ok(Value::from(args[0].as_number().unwrap_or(0.0) + 1.0)));
    /// let res = inc.invoke(&[Value::from(2.0)]).unwrap();
    /// assert_eq!(res.as_number(), Some(3.0));
    /// ```
    pub fn new<F>(arity: usize, f: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + 'static,
    {
        Self::from_host(Rc::new(NativeFn { arity, f }))
    }

    pub fn from_host(func: Rc<dyn HostFn>) -> Self {
        Self { func, receiver: None }
    }

    pub fn arity(&self) -> usize {
        self.func.arity()
    }

    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_deref()
    }

    /// Return a copy of this callable with `receiver` as its implicit receiver.
    pub fn bind(&self, receiver: Value) -> Self {
        Self {
            func: Rc::clone(&self.func),
            receiver: Some(Box::new(receiver)),
        }
    }

    /// Invoke with the bound receiver (if any).
    pub fn invoke(&self, args: &[Value]) -> Result<Value, InvokeError> {
        let expected = self.arity();
        if args.len() != expected {
            return Err(InvokeError::Arity {
                expected,
                got: args.len(),
            });
        }
        self.func.invoke(self.receiver(), args)
    }

    /// Identity of the underlying host function.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.func) as *const () as usize
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("arity", &self.arity())
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}

/// A shared, mutable record with insertion-ordered fields.
#[derive(Clone, Default)]
pub struct Record(Rc<RefCell<IndexMap<String, Value>>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.borrow().get(field).cloned()
    }

    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().insert(field.into(), value.into());
    }

    /// Snapshot of the enumerable fields.
    ///
    /// The snapshot is detached from the record, so host callables invoked
    /// later may mutate the record freely.
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Identity of the record (shared handles compare equal).
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

// Records may be cyclic: list the field names only.
impl Debug for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.fields().into_iter().map(|(k, _)| k).collect();
        f.debug_struct("Record")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("fields", &names)
            .finish()
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        let record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

/// The runtime kind of a value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Kind {
    Number,
    String,
    Array,
    Callable,
    Record,
    /// Null-like; terminal in the search.
    Opaque,
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Callable => "callable",
            Kind::Record => "record",
            Kind::Opaque => "opaque",
        };
        write!(f, "{}", name)
    }
}

/// A host value.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(Rc<str>),
    Array(Rc<[Value]>),
    Record(Record),
    Callable(Callable),
    Null,
    Undefined,
}

/// Classify a value.
pub fn classify(value: &Value) -> Kind {
    match value {
        Value::Number(_) => Kind::Number,
        Value::String(_) => Kind::String,
        Value::Array(_) => Kind::Array,
        Value::Record(_) => Kind::Record,
        Value::Callable(_) => Kind::Callable,
        Value::Null | Value::Undefined => Kind::Opaque,
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        classify(self)
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Check for the Number-domain not-a-number sentinel.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// Textual identity used to group expressions into equivalence classes.
    ///
    /// Numbers, strings and arrays are keyed structurally; records and
    /// callables by identity, since hosts may mutate records between
    /// observations.
    pub fn signature(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::String(s) => format!("{:?}", s),
            Value::Array(items) => {
                let inner: Vec<String> = items.iter().map(Value::signature).collect();
                format!("[{}]", inner.join(","))
            }
            Value::Record(r) => format!("<record {:#x}>", r.id()),
            Value::Callable(c) => match c.receiver() {
                Some(receiver) => format!("<fn {:#x} on {}>", c.id(), receiver.signature()),
                None => format!("<fn {:#x}>", c.id()),
            },
            Value::Null => "null".to_string(),
            Value::Undefined => "undefined".to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_value(f, self, false)
    }
}

// Only the outermost record is spelled out; records below it print by
// identity, so cyclic values stay finite.
fn write_value(f: &mut Formatter<'_>, value: &Value, nested: bool) -> std::fmt::Result {
    match value {
        Value::Number(n) => write!(f, "{}", format_number(*n)),
        Value::String(s) => write!(f, "{:?}", s),
        Value::Array(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_value(f, item, nested)?;
            }
            write!(f, "]")
        }
        Value::Record(r) if nested => write!(f, "<record {:#x}>", r.id()),
        Value::Record(r) => {
            write!(f, "{{")?;
            for (i, (k, v)) in r.fields().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: ", k)?;
                write_value(f, v, true)?;
            }
            write!(f, "}}")
        }
        Value::Callable(c) => write!(f, "<fn/{}>", c.arity()),
        Value::Null => write!(f, "null"),
        Value::Undefined => write!(f, "undefined"),
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::from(items))
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Value::Callable(c)
    }
}

/// Format a number the way a scripting host prints it.
///
/// ```
/// use codehint_rs::value::format_number;
///
/// assert_eq!(format_number(2.0), "2");
/// assert_eq!(format_number(-0.0), "0");
/// assert_eq!(format_number(0.5), "0.5");
/// assert_eq!(format_number(f64::INFINITY), "Infinity");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Resolve `index` to a present slot of an array of length `len`.
pub fn array_slot(len: usize, index: f64) -> Option<usize> {
    if index.fract() != 0.0 || index < 0.0 || index >= len as f64 {
        return None;
    }
    Some(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_classify() {
        assert_eq!(classify(&Value::from(2)), Kind::Number);
        assert_eq!(classify(&Value::from("x")), Kind::String);
        assert_eq!(classify(&Value::array([Value::from(1)])), Kind::Array);
        assert_eq!(classify(&Value::from(Record::new())), Kind::Record);
        let f = Callable::new(0, |_, _| Ok(Value::Null));
        assert_eq!(classify(&Value::from(f)), Kind::Callable);
        assert_eq!(classify(&Value::Null), Kind::Opaque);
        assert_eq!(classify(&Value::Undefined), Kind::Opaque);
    }

    #[test]
    fn test_signature_distinguishes_kinds() {
        assert_eq!(Value::from(3).signature(), "3");
        assert_eq!(Value::from("3").signature(), "\"3\"");
        assert_eq!(Value::array([Value::from(1), Value::from("a")]).signature(), "[1,\"a\"]");
        assert_ne!(Value::Null.signature(), Value::Undefined.signature());
    }

    #[test]
    fn test_signature_of_records_is_identity() {
        let r1 = Record::new().with("x", 1);
        let r2 = Record::new().with("x", 1);
        assert_ne!(Value::from(r1.clone()).signature(), Value::from(r2).signature());

        let before = Value::from(r1.clone()).signature();
        r1.set("x", 2);
        assert_eq!(Value::from(r1).signature(), before);
    }

    #[test]
    fn test_bound_callable_sees_receiver() {
        let person = Record::new().with("age", 42);
        let grow = Callable::new(1, |receiver, args| {
            let record = receiver
                .and_then(Value::as_record)
                .ok_or_else(|| InvokeError::Receiver("expected a record".to_string()))?;
            let x = args[0].as_number().ok_or_else(|| InvokeError::thrown("Must give a number."))?;
            let age = record.get("age").and_then(|v| v.as_number()).unwrap_or(0.0) + x;
            record.set("age", age);
            Ok(Value::from(age))
        });

        assert!(matches!(grow.invoke(&[Value::from(1)]), Err(InvokeError::Receiver(_))));

        let bound = grow.bind(Value::from(person.clone()));
        assert_eq!(bound.id(), grow.id());
        assert_eq!(bound.invoke(&[Value::from(2)]).unwrap().as_number(), Some(44.0));
        assert_eq!(person.get("age").unwrap().as_number(), Some(44.0));
        assert_eq!(
            bound.invoke(&[Value::from("x")]).unwrap_err(),
            InvokeError::thrown("Must give a number.")
        );
    }

    #[test]
    fn test_invoke_checks_arity() {
        let f = Callable::new(2, |_, _| Ok(Value::Null));
        assert_eq!(
            f.invoke(&[Value::Null]).unwrap_err(),
            InvokeError::Arity { expected: 2, got: 1 }
        );
    }

    #[test]
    fn test_array_slot() {
        assert_eq!(array_slot(3, 0.0), Some(0));
        assert_eq!(array_slot(3, 2.0), Some(2));
        assert_eq!(array_slot(3, 3.0), None);
        assert_eq!(array_slot(3, -1.0), None);
        assert_eq!(array_slot(3, 1.5), None);
        assert_eq!(array_slot(3, f64::NAN), None);
    }

    #[test]
    fn test_record_fields_keep_order() {
        let r: Record = [("b", 1), ("a", 2)].into_iter().collect();
        let names: Vec<String> = r.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(r.get("a").is_some());
        assert!(r.get("c").is_none());
    }

    #[test]
    fn test_cyclic_record_formats() {
        let r = Record::new().with("name", "loop");
        r.set("xs", Value::array([Value::from(r.clone()), Value::from(1)]));
        r.set("me", r.clone());

        let id = format!("<record {:#x}>", r.id());
        let text = Value::from(r.clone()).to_string();
        assert_eq!(text, format!("{{name: \"loop\", xs: [{}, 1], me: {}}}", id, id));

        let text = format!("{:?}", Value::from(r.clone()));
        assert!(text.contains("\"name\""));
        assert!(text.contains("\"xs\""));

        let arr = Value::array([Value::from(r.clone())]);
        assert!(arr.to_string().starts_with("[{name: "));
    }
}
