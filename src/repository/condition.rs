//! Caller filter intent and its translation into builder clauses

use crate::builder::{dates, RequestBuilder, SortOrder};
use crate::error::{BuilderError, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// Width of a date window when only one end is given
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// A date window on one field.
///
/// A one-sided window is widened to [`DEFAULT_WINDOW_DAYS`] days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateWindow {
    /// Both ends given as a pair; either may be open
    Explicit { start: Option<String>, end: Option<String> },
    /// `start` through `start + 30 days`
    From(String),
    /// `end - 30 days` through `end`
    Until(String),
}

impl DateWindow {
    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        DateWindow::Explicit {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Concrete `(start, end)` bounds
    pub fn resolve(&self) -> Result<(Option<String>, Option<String>)> {
        match self {
            DateWindow::Explicit { start, end } => Ok((start.clone(), end.clone())),
            DateWindow::From(start) => {
                let end = dates::shift_days(start, DEFAULT_WINDOW_DAYS)?;
                Ok((Some(start.clone()), Some(end)))
            }
            DateWindow::Until(end) => {
                let start = dates::shift_days(end, -DEFAULT_WINDOW_DAYS)?;
                Ok((Some(start), Some(end.clone())))
            }
        }
    }

    /// Read `{range: [start, end]}`, `{start, end}`, `{start}` or `{end}`.
    ///
    /// `Ok(None)` when the object carries none of those keys in a usable form.
    fn from_json(field: &str, object: &Map<String, Value>) -> Result<Option<Self>> {
        if let Some(range) = object.get("range") {
            let pair = match range.as_array() {
                Some(pair) if pair.len() == 2 => pair,
                _ => {
                    debug!("Skipping date condition on '{}': range is not a pair", field);
                    return Ok(None);
                }
            };
            return Ok(Some(DateWindow::Explicit {
                start: date_text(field, &pair[0])?,
                end: date_text(field, &pair[1])?,
            }));
        }

        let start = object.get("start").map(|v| date_text(field, v)).transpose()?.flatten();
        let end = object.get("end").map(|v| date_text(field, v)).transpose()?.flatten();

        Ok(match (start, end) {
            (Some(start), Some(end)) => Some(DateWindow::between(start, end)),
            (Some(start), None) => Some(DateWindow::From(start)),
            (None, Some(end)) => Some(DateWindow::Until(end)),
            (None, None) => None,
        })
    }
}

fn date_text(field: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.is_empty() => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        other => Err(BuilderError::InvalidCondition {
            field: field.to_string(),
            reason: format!("date bound must be a string, got {}", other),
        }
        .into()),
    }
}

/// One filter descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact match
    Term { field: String, value: Value },
    /// Membership in a set
    Terms { field: String, values: Vec<Value> },
    /// Inclusive numeric or lexical range
    Range {
        field: String,
        gte: Option<Value>,
        lte: Option<Value>,
    },
    /// Date window, applied with `lte` on a Zulu end
    DateWindow { field: String, window: DateWindow },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Term { field, .. }
            | Condition::Terms { field, .. }
            | Condition::Range { field, .. }
            | Condition::DateWindow { field, .. } => field,
        }
    }

    fn apply(&self, builder: &mut RequestBuilder) -> Result<()> {
        match self {
            Condition::Term { field, value } => {
                builder.term(field.as_str(), value.clone());
            }
            Condition::Terms { field, values } => {
                builder.terms(field.as_str(), values.iter().cloned());
            }
            Condition::Range { field, gte, lte } => {
                builder.range(gte.clone(), lte.clone(), field);
            }
            Condition::DateWindow { field, window } => {
                let (start, end) = window.resolve()?;
                builder.date_range2(start.as_deref(), end.as_deref(), field)?;
            }
        }
        Ok(())
    }
}

/// An ordered set of filter descriptors, each becoming one `filter` clause
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(Condition::Term {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn terms<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with(Condition::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn range(self, field: impl Into<String>, gte: Option<Value>, lte: Option<Value>) -> Self {
        self.with(Condition::Range {
            field: field.into(),
            gte,
            lte,
        })
    }

    pub fn date_window(self, field: impl Into<String>, window: DateWindow) -> Self {
        self.with(Condition::DateWindow {
            field: field.into(),
            window,
        })
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.0.push(condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    /// Translate a loose JSON object, one entry per field:
    ///
    /// - array: membership
    /// - object with `range`, `start` or `end`: date window
    /// - object with `gte` or `lte`: range
    /// - null: skipped
    /// - anything else: exact match
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = match value {
            Value::Null => return Ok(Self::new()),
            Value::Object(object) => object,
            other => {
                return Err(BuilderError::InvalidCondition {
                    field: String::new(),
                    reason: format!("conditions must be an object, got {}", other),
                }
                .into())
            }
        };

        let mut conditions = Self::new();
        for (field, entry) in object {
            let condition = match entry {
                Value::Null => {
                    debug!("Skipping null condition on '{}'", field);
                    continue;
                }
                Value::Array(values) => Condition::Terms {
                    field: field.clone(),
                    values: values.clone(),
                },
                Value::Object(spec) if is_date_spec(spec) => match DateWindow::from_json(field, spec)? {
                    Some(window) => Condition::DateWindow {
                        field: field.clone(),
                        window,
                    },
                    None => {
                        debug!("Skipping date condition on '{}': no usable bounds", field);
                        continue;
                    }
                },
                Value::Object(spec) if spec.contains_key("gte") || spec.contains_key("lte") => Condition::Range {
                    field: field.clone(),
                    gte: spec.get("gte").filter(|v| !v.is_null()).cloned(),
                    lte: spec.get("lte").filter(|v| !v.is_null()).cloned(),
                },
                Value::Object(_) => {
                    debug!("Skipping condition on '{}': no recognised keys", field);
                    continue;
                }
                scalar => Condition::Term {
                    field: field.clone(),
                    value: scalar.clone(),
                },
            };
            conditions.0.push(condition);
        }

        Ok(conditions)
    }

    /// Append one filter clause per condition, in order
    pub fn apply(&self, builder: &mut RequestBuilder) -> Result<()> {
        for condition in &self.0 {
            condition.apply(builder)?;
        }
        Ok(())
    }
}

fn is_date_spec(spec: &Map<String, Value>) -> bool {
    spec.contains_key("range") || spec.contains_key("start") || spec.contains_key("end")
}

impl FromIterator<Condition> for Conditions {
    fn from_iter<T: IntoIterator<Item = Condition>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ordered sort keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec(Vec<(String, SortOrder)>);

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.0.push((field.into(), order));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Accepts `{field: order}` (first entry only) or
    /// `[{field: order}, ...]` (every element, in order)
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(single) => {
                let mut spec = Self::new();
                if let Some(key) = first_key(single)? {
                    spec.0.push(key);
                }
                Ok(spec)
            }
            Value::Array(list) => {
                let mut spec = Self::new();
                for item in list {
                    let object = item
                        .as_object()
                        .ok_or_else(|| BuilderError::InvalidSort(format!("expected an object, got {}", item)))?;
                    if let Some(key) = first_key(object)? {
                        spec.0.push(key);
                    }
                }
                Ok(spec)
            }
            other => Err(BuilderError::InvalidSort(format!("unsupported sort shape: {}", other)).into()),
        }
    }

    pub fn apply(&self, builder: &mut RequestBuilder) {
        for (field, order) in &self.0 {
            builder.sort(field.as_str(), *order);
        }
    }
}

fn first_key(object: &Map<String, Value>) -> Result<Option<(String, SortOrder)>> {
    let Some((field, order)) = object.iter().next() else {
        return Ok(None);
    };
    let order = order
        .as_str()
        .ok_or_else(|| BuilderError::InvalidSort(format!("order for '{}' must be a string", field)))?
        .parse::<SortOrder>()?;
    Ok(Some((field.clone(), order)))
}
