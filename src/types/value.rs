use std::cmp::Ordering;

/// The scalar kinds the executors know how to compare, combine, and
/// serialize. Grounded in the teacher's `dbtype::value::Value` variant
/// shape, extended with `Varchar` and a first-class `Null` so aggregation's
/// NULL-aware accumulation rules (section 4.7) can be expressed directly
/// instead of threading an `Option<Value>` everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    Varchar(String),
}

/// The declared type of a column, independent of any particular value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    Varchar,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::TinyInt(_) => Some(DataType::TinyInt),
            Value::SmallInt(_) => Some(DataType::SmallInt),
            Value::Integer(_) => Some(DataType::Integer),
            Value::Varchar(_) => Some(DataType::Varchar),
        }
    }

    /// Orders two values of the same underlying type. Comparing values of
    /// differing types is a programmer error and panics, matching the
    /// teacher's `compare`; callers that need NULL-aware ordering check
    /// `is_null()` themselves first (as the aggregation and TopN
    /// executors do).
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::TinyInt(a), Value::TinyInt(b)) => a.cmp(b),
            (Value::SmallInt(a), Value::SmallInt(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Varchar(a), Value::Varchar(b)) => a.cmp(b),
            _ => panic!("cannot compare values of different types: {self:?} vs {other:?}"),
        }
    }

    /// `SUM`/arithmetic addition over same-typed integer values. Panics on
    /// non-numeric types; callers are expected to have type-checked
    /// beforehand (the in-scope expression set is untyped at this layer).
    pub fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Value::TinyInt(a), Value::TinyInt(b)) => Value::TinyInt(a + b),
            (Value::SmallInt(a), Value::SmallInt(b)) => Value::SmallInt(a + b),
            (Value::Integer(a), Value::Integer(b)) => Value::Integer(a + b),
            _ => panic!("cannot add values: {self:?} + {other:?}"),
        }
    }

    /// Arithmetic subtraction, the `Expression::Arithmetic` counterpart to
    /// [`Value::add`].
    pub fn sub(&self, other: &Self) -> Self {
        match (self, other) {
            (Value::TinyInt(a), Value::TinyInt(b)) => Value::TinyInt(a - b),
            (Value::SmallInt(a), Value::SmallInt(b)) => Value::SmallInt(a - b),
            (Value::Integer(a), Value::Integer(b)) => Value::Integer(a - b),
            _ => panic!("cannot subtract values: {self:?} - {other:?}"),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::TinyInt(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Varchar(v) => write!(f, "{v}"),
        }
    }
}
