use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::ApiError;

use super::schema::FieldSpec;

/// Semantic kind of one field, as declared by the schema.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Text,
    Int,
    Float,
    /// Integer epoch seconds on the wire, an absolute UTC instant here.
    Time,
}

/// A coerced field value. The wire delivers everything as strings; the
/// variant is fixed by the field's declared [`Kind`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Text(String),
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
}

impl PropValue {
    /// JSON rendering for display output. Timestamps become RFC 3339.
    pub fn to_display_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Int(n) => Value::from(*n),
            Self::Float(f) => Value::from(*f),
            Self::Time(t) => Value::String(t.to_rfc3339()),
        }
    }

    /// JSON rendering for request parameters. Timestamps go back to epoch
    /// seconds, which is what the server stores.
    pub fn to_param_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Int(n) => Value::from(*n),
            Self::Float(f) => Value::from(*f),
            Self::Time(t) => Value::from(t.timestamp()),
        }
    }
}

/// One typed, validated, change-tracked field of an entity.
#[derive(Clone, Debug)]
pub struct Property {
    name: &'static str,
    doc: &'static str,
    kind: Kind,
    readonly: bool,
    vals: Option<&'static [(i64, &'static str)]>,
    value: Option<PropValue>,
    dirty: bool,
}

impl Property {
    /// Build a property from its schema entry and the raw wire value. The
    /// initial value goes through the same assignment path as any later
    /// write, then the dirty flag is reset.
    pub(crate) fn from_raw(spec: &'static FieldSpec, raw: &Value) -> Result<Self, ApiError> {
        let mut prop = Self {
            name: spec.name,
            doc: spec.doc,
            kind: spec.kind,
            readonly: spec.readonly,
            vals: spec.vals,
            value: None,
            dirty: false,
        };
        prop.assign(raw)?;
        prop.dirty = false;
        Ok(prop)
    }

    /// Assign a new value.
    ///
    /// The incoming value is coerced through the declared kind before
    /// storage. A value equal (after coercion) to the current one is a
    /// no-op and leaves the dirty flag untouched.
    ///
    /// # Errors
    ///
    /// `InvalidValue` when the property is read-only and already holds a
    /// value, when coercion fails, or when an enumerated field is assigned
    /// a value outside its enumeration. The stored value is unchanged on
    /// every failure.
    pub fn assign(&mut self, raw: &Value) -> Result<(), ApiError> {
        if self.readonly && self.value.is_some() {
            return Err(ApiError::InvalidValue {
                field: self.name,
                message: "read-only property already holds a value".to_string(),
            });
        }
        let value = coerce(self.kind, raw).map_err(|message| ApiError::InvalidValue {
            field: self.name,
            message,
        })?;
        if let (Some(vals), PropValue::Int(n)) = (self.vals, &value) {
            if !vals.iter().any(|(legal, _)| legal == n) {
                return Err(ApiError::InvalidValue {
                    field: self.name,
                    message: format!("{n} is not among the accepted values"),
                });
            }
        }
        if self.value.as_ref() == Some(&value) {
            return Ok(());
        }
        self.value = Some(value);
        self.dirty = true;
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub const fn kind(&self) -> Kind {
        self.kind
    }

    pub const fn readonly(&self) -> bool {
        self.readonly
    }

    pub const fn dirty(&self) -> bool {
        self.dirty
    }

    pub const fn value(&self) -> Option<&PropValue> {
        self.value.as_ref()
    }

    /// Current value as text, the way it appears on the wire.
    pub fn as_text(&self) -> Option<String> {
        self.value.as_ref().map(|value| match value {
            PropValue::Text(s) => s.clone(),
            PropValue::Int(n) => n.to_string(),
            PropValue::Float(f) => f.to_string(),
            PropValue::Time(t) => t.timestamp().to_string(),
        })
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            Some(PropValue::Int(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self.value {
            Some(PropValue::Time(t)) => Some(t),
            _ => None,
        }
    }

    /// Human label for the current value of an enumerated field.
    pub fn label(&self) -> Option<&'static str> {
        let vals = self.vals?;
        let current = self.as_int()?;
        vals.iter()
            .find(|(legal, _)| *legal == current)
            .map(|(_, label)| *label)
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

fn coerce(kind: Kind, raw: &Value) -> Result<PropValue, String> {
    match kind {
        Kind::Text => match raw {
            Value::String(s) => Ok(PropValue::Text(s.clone())),
            Value::Number(n) => Ok(PropValue::Text(n.to_string())),
            other => Err(format!("cannot read {other} as text")),
        },
        Kind::Int => int_of(raw).map(PropValue::Int),
        Kind::Float => match raw {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(PropValue::Float)
                .map_err(|err| err.to_string()),
            Value::Number(n) => n
                .as_f64()
                .map(PropValue::Float)
                .ok_or_else(|| format!("{n} is not a real number")),
            other => Err(format!("cannot read {other} as a real number")),
        },
        Kind::Time => {
            let secs = int_of(raw)?;
            Utc.timestamp_opt(secs, 0)
                .single()
                .map(PropValue::Time)
                .ok_or_else(|| format!("{secs} is not a valid epoch timestamp"))
        }
    }
}

fn int_of(raw: &Value) -> Result<i64, String> {
    match raw {
        Value::String(s) => s.trim().parse::<i64>().map_err(|err| err.to_string()),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("{n} is not a whole number")),
        other => Err(format!("cannot read {other} as a whole number")),
    }
}
