//! Declarative form fields and the add/edit `Draft` built from them.
//!
//! Field paths are dotted (`user.first_name`); the payload nests them into
//! JSON objects and edit seeding reads the same paths back out of a row.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed free text.
    Text,
    /// Trimmed free text; blank is sent as `null`.
    OptionalText,
    /// ISO `YYYY-MM-DD` date.
    Date,
    Integer,
    Flag,
    /// Sent trimmed on create, `null` on edit.
    Secret,
    /// Id picked from an option list. `required` is the notification shown
    /// when the selection is missing at submit time.
    Select { required: Option<&'static str> },
}

impl FieldKind {
    fn is_textual(self) -> bool {
        matches!(
            self,
            FieldKind::Text | FieldKind::OptionalText | FieldKind::Date | FieldKind::Secret
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldDefault {
    Empty,
    Today,
    Integer(i64),
    Flag(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub path: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
    /// Where to read the value from when seeding an edit draft, if the row
    /// nests it differently from the payload.
    pub seed_from: Option<&'static str>,
}

impl FieldSpec {
    const fn new(path: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            path,
            label,
            kind,
            default: FieldDefault::Empty,
            seed_from: None,
        }
    }

    #[must_use]
    pub const fn text(path: &'static str, label: &'static str) -> Self {
        Self::new(path, label, FieldKind::Text)
    }

    #[must_use]
    pub const fn optional_text(path: &'static str, label: &'static str) -> Self {
        Self::new(path, label, FieldKind::OptionalText)
    }

    #[must_use]
    pub const fn date(path: &'static str, label: &'static str) -> Self {
        Self::new(path, label, FieldKind::Date)
    }

    #[must_use]
    pub const fn integer(path: &'static str, label: &'static str) -> Self {
        Self::new(path, label, FieldKind::Integer)
    }

    #[must_use]
    pub const fn flag(path: &'static str, label: &'static str) -> Self {
        Self::new(path, label, FieldKind::Flag)
    }

    #[must_use]
    pub const fn secret(path: &'static str, label: &'static str) -> Self {
        Self::new(path, label, FieldKind::Secret)
    }

    #[must_use]
    pub const fn select(path: &'static str, label: &'static str) -> Self {
        Self::new(path, label, FieldKind::Select { required: None })
    }

    #[must_use]
    pub const fn required_select(
        path: &'static str,
        label: &'static str,
        message: &'static str,
    ) -> Self {
        Self::new(
            path,
            label,
            FieldKind::Select {
                required: Some(message),
            },
        )
    }

    #[must_use]
    pub const fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    #[must_use]
    pub const fn seeded_from(mut self, path: &'static str) -> Self {
        self.seed_from = Some(path);
        self
    }

    fn blank_value(&self, today: NaiveDate) -> FieldValue {
        match (self.kind, self.default) {
            (FieldKind::Select { .. }, _) => FieldValue::Selection(None),
            (_, FieldDefault::Integer(n)) => FieldValue::Integer(n),
            (_, FieldDefault::Flag(b)) => FieldValue::Flag(b),
            (FieldKind::Integer, _) => FieldValue::Integer(0),
            (FieldKind::Flag, _) => FieldValue::Flag(false),
            (_, FieldDefault::Today) => FieldValue::Text(today.format("%Y-%m-%d").to_string()),
            (_, FieldDefault::Empty) => FieldValue::Text(String::new()),
        }
    }

    fn seed_value(&self, row: &Value) -> FieldValue {
        let source = lookup(row, self.seed_from.unwrap_or(self.path));
        match self.kind {
            FieldKind::Secret => FieldValue::Text(String::new()),
            FieldKind::Select { .. } => {
                FieldValue::Selection(source.and_then(Value::as_u64).filter(|id| *id != 0))
            }
            FieldKind::Integer => FieldValue::Integer(source.and_then(Value::as_i64).unwrap_or(0)),
            FieldKind::Flag => FieldValue::Flag(source.and_then(Value::as_bool).unwrap_or(false)),
            FieldKind::Text | FieldKind::OptionalText | FieldKind::Date => FieldValue::Text(
                match source {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                },
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Flag(bool),
    /// `None` is the unselected sentinel.
    Selection(Option<u64>),
}

impl FieldValue {
    /// Parse a raw textual value for the given kind. `0` or blank selects
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::InvalidValue` when `raw` does not fit `kind`.
    pub fn parse(path: &str, kind: FieldKind, raw: &str) -> Result<Self, DraftError> {
        let trimmed = raw.trim();
        let invalid = |reason: &str| DraftError::InvalidValue {
            field: path.to_string(),
            reason: reason.to_string(),
        };
        match kind {
            FieldKind::Text | FieldKind::OptionalText | FieldKind::Secret => {
                Ok(FieldValue::Text(raw.to_string()))
            }
            FieldKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|_| FieldValue::Text(trimmed.to_string()))
                .map_err(|_| invalid("expected a date as YYYY-MM-DD")),
            FieldKind::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid("expected an integer")),
            FieldKind::Flag => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(FieldValue::Flag(true)),
                "false" | "0" | "no" | "" => Ok(FieldValue::Flag(false)),
                _ => Err(invalid("expected true or false")),
            },
            FieldKind::Select { .. } if trimmed.is_empty() => Ok(FieldValue::Selection(None)),
            FieldKind::Select { .. } => trimmed
                .parse::<u64>()
                .map(|id| FieldValue::Selection((id != 0).then_some(id)))
                .map_err(|_| invalid("expected an id")),
        }
    }

    fn fits(&self, kind: FieldKind) -> bool {
        match self {
            FieldValue::Text(_) => kind.is_textual(),
            FieldValue::Integer(_) => kind == FieldKind::Integer,
            FieldValue::Flag(_) => kind == FieldKind::Flag,
            FieldValue::Selection(_) => matches!(kind, FieldKind::Select { .. }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { id: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DraftError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("value does not fit field `{0}`")]
    KindMismatch(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// In-progress add/edit object. Always an owned copy; never aliases a row
/// of the visible page.
#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    mode: FormMode,
    fields: &'static [FieldSpec],
    values: BTreeMap<&'static str, FieldValue>,
    dirty: bool,
}

impl Draft {
    #[must_use]
    pub fn blank(fields: &'static [FieldSpec], today: NaiveDate) -> Self {
        Self {
            mode: FormMode::Add,
            fields,
            values: fields
                .iter()
                .map(|spec| (spec.path, spec.blank_value(today)))
                .collect(),
            dirty: false,
        }
    }

    /// Seed an edit draft from a list row, reading nested sub-records through
    /// the dotted field paths.
    #[must_use]
    pub fn from_row(fields: &'static [FieldSpec], row: &Value, id: u64) -> Self {
        Self {
            mode: FormMode::Edit { id },
            fields,
            values: fields
                .iter()
                .map(|spec| (spec.path, spec.seed_value(row)))
                .collect(),
            dirty: false,
        }
    }

    #[must_use]
    pub fn mode(&self) -> FormMode {
        self.mode
    }

    #[must_use]
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn spec(&self, path: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.path == path)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.values.get(path)
    }

    /// Current selection of a select field; `None` when unselected or when
    /// `path` is not a select.
    #[must_use]
    pub fn selection(&self, path: &str) -> Option<u64> {
        match self.values.get(path) {
            Some(FieldValue::Selection(value)) => *value,
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns `DraftError` if `path` is not a field of this draft or the
    /// value's shape does not match the field kind.
    pub fn set(&mut self, path: &str, value: FieldValue) -> Result<(), DraftError> {
        let spec = self
            .spec(path)
            .ok_or_else(|| DraftError::UnknownField(path.to_string()))?;
        if !value.fits(spec.kind) {
            return Err(DraftError::KindMismatch(path.to_string()));
        }
        let value = match value {
            FieldValue::Selection(Some(0)) => FieldValue::Selection(None),
            other => other,
        };
        self.values.insert(spec.path, value);
        self.dirty = true;
        Ok(())
    }

    /// Parse `raw` according to the field kind and set it.
    ///
    /// # Errors
    ///
    /// Same as [`Draft::set`] and [`FieldValue::parse`].
    pub fn set_raw(&mut self, path: &str, raw: &str) -> Result<(), DraftError> {
        let spec = self
            .spec(path)
            .ok_or_else(|| DraftError::UnknownField(path.to_string()))?;
        let value = FieldValue::parse(spec.path, spec.kind, raw)?;
        self.set(path, value)
    }

    /// Reset a select to unselected. Returns `true` if it held a value.
    pub fn clear_selection(&mut self, path: &str) -> bool {
        match self.values.get_mut(path) {
            Some(FieldValue::Selection(value @ Some(_))) => {
                *value = None;
                true
            }
            _ => false,
        }
    }

    /// Message of the first required selection that is still unselected,
    /// in field order. Later gaps surface on the next submit.
    #[must_use]
    pub fn missing_selection(&self) -> Option<&'static str> {
        self.fields.iter().find_map(|spec| match spec.kind {
            FieldKind::Select {
                required: Some(message),
            } if self.selection(spec.path).is_none() => Some(message),
            _ => None,
        })
    }

    /// Normalized request body: strings trimmed, blank optional text and
    /// unselected selects as `null`, secrets dropped to `null` on edit.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut root = Map::new();
        for spec in self.fields {
            let value = self
                .values
                .get(spec.path)
                .map_or(Value::Null, |value| self.normalize(spec.kind, value));
            insert_path(&mut root, spec.path, value);
        }
        Value::Object(root)
    }

    fn normalize(&self, kind: FieldKind, value: &FieldValue) -> Value {
        match (kind, value) {
            (FieldKind::Secret, _) if matches!(self.mode, FormMode::Edit { .. }) => Value::Null,
            (FieldKind::OptionalText, FieldValue::Text(text)) if text.trim().is_empty() => {
                Value::Null
            }
            (_, FieldValue::Text(text)) => Value::String(text.trim().to_string()),
            (_, FieldValue::Integer(n)) => Value::Number(Number::from(*n)),
            (_, FieldValue::Flag(b)) => Value::Bool(*b),
            (_, FieldValue::Selection(Some(id))) => Value::Number(Number::from(*id)),
            (_, FieldValue::Selection(None)) => Value::Null,
        }
    }
}

fn lookup<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(row, |node, segment| node.get(segment))
}

fn insert_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut node = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return;
        }
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        node = match child {
            Value::Object(map) => map,
            _ => return,
        };
    }
}
