use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes an uploaded sheet
/// produces. Kept `Ord` so distinct values can live in `BTreeSet`s.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl CellValue {
    /// Whether this cell is the missing-value marker.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, `None` for anything that is not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) | CellValue::Float(_) => 2,
            CellValue::Text(_) => 3,
            CellValue::Date(_) => 4,
            CellValue::DateTime(_) => 5,
        }
    }
}

// -- Manual Eq/Ord: integers and floats compare numerically --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        let (ra, rb) = (self.rank(), other.rank());
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Integer(a), Float(b)) => int_float_cmp(*a, *b),
            (Float(a), Integer(b)) => int_float_cmp(*b, *a).reverse(),
            (Text(a), Text(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Exact comparison of an integer against a float. Rounding `i` to `f64` is
/// monotonic, so only a tie needs the exact check.
fn int_float_cmp(i: i64, f: f64) -> Ordering {
    match (i as f64).total_cmp(&f) {
        // A tie means `f` is integral and within i64's rounded range.
        Ordering::Equal => i128::from(i).cmp(&(f as i128)),
        unequal => unequal,
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => (*i as f64).to_bits().hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => write!(f, "<NA>"),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            CellValue::Float(_) | CellValue::Null => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Date(_) | CellValue::DateTime(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ValueKind – runtime kind of a whole column
// ---------------------------------------------------------------------------

/// The runtime kind of a column, decided from its non-missing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Numeric,
    /// Already typed dates or timestamps.
    Temporal,
    Boolean,
    /// Generic text, or a mix of kinds. Candidate for date parsing.
    Text,
}

// ---------------------------------------------------------------------------
// Column / Table
// ---------------------------------------------------------------------------

/// A named column of cells, aligned by row index with its siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sorted set of distinct non-missing values.
    pub fn distinct_values(&self) -> BTreeSet<CellValue> {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// Number of missing cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Runtime kind of the column. Mixed columns fall back to `Text`.
    pub fn kind(&self) -> ValueKind {
        let mut kind = None;
        for value in self.values.iter().filter(|v| !v.is_null()) {
            let this = match value {
                CellValue::Integer(_) | CellValue::Float(_) => ValueKind::Numeric,
                CellValue::Date(_) | CellValue::DateTime(_) => ValueKind::Temporal,
                CellValue::Bool(_) => ValueKind::Boolean,
                CellValue::Text(_) | CellValue::Null => return ValueKind::Text,
            };
            match kind {
                None => kind = Some(this),
                Some(k) if k != this => return ValueKind::Text,
                Some(_) => {}
            }
        }
        kind.unwrap_or(ValueKind::Text)
    }
}

/// An ordered set of equally long, uniquely named columns.
///
/// The engine never mutates a table; filtering produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, crate::error::ExplorerError> {
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(crate::error::ExplorerError::Schema(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(crate::error::ExplorerError::Schema(format!(
                    "column '{}' has {} rows but '{}' has {}",
                    bad.name,
                    bad.len(),
                    first.name,
                    first.len()
                )));
            }
        }
        Ok(Table { columns })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Row subsequence at `indices`, keeping column order.
    pub fn take(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| Column {
                name: col.name.clone(),
                values: indices
                    .iter()
                    .filter_map(|&i| col.values.get(i).cloned())
                    .collect(),
            })
            .collect();
        Table { columns }
    }

    /// Stack tables vertically, aligning columns by name.
    ///
    /// Columns missing from a part are padded with `Null`; the column order
    /// is the order of first appearance.
    pub fn concat(parts: Vec<Table>) -> Table {
        let mut names: Vec<String> = Vec::new();
        for part in &parts {
            for col in &part.columns {
                if !names.contains(&col.name) {
                    names.push(col.name.clone());
                }
            }
        }
        let mut columns: Vec<Column> = names
            .iter()
            .map(|n| Column::new(n.clone(), Vec::new()))
            .collect();
        for part in &parts {
            let rows = part.len();
            for out in &mut columns {
                match part.column(&out.name) {
                    Some(col) => out.values.extend(col.values.iter().cloned()),
                    None => out.values.extend(std::iter::repeat(CellValue::Null).take(rows)),
                }
            }
        }
        Table { columns }
    }
}
