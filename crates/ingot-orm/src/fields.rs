//! Field descriptors: per-field validation rules plus column shape.
//!
//! A `FieldDescriptor` composes two plain data values: a `FieldKind`
//! carrying the kind-specific constraints, and the common flags
//! (primary key, nullability, uniqueness, index). The schema compiler
//! turns descriptors into columns; the validation engine reads the
//! same descriptors when checking values.

use std::sync::Arc;

use ingot_sql::ColumnShape;
use regex::Regex;

use crate::schema::ModelSchema;

/// The semantic kind of a field, with its kind-specific constraints.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Bounded string. `max_length` must be positive.
    String {
        /// Maximum length in characters. Required and positive.
        max_length: usize,
        /// Optional minimum length.
        min_length: Option<usize>,
        /// Trim surrounding whitespace before validation.
        strip_whitespace: bool,
        /// Optional pattern the whole value must match.
        pattern: Option<Regex>,
    },
    /// Unbounded string.
    Text {
        /// Trim surrounding whitespace before validation.
        strip_whitespace: bool,
    },
    /// 64-bit integer with optional inclusive bounds.
    Integer {
        /// Inclusive lower bound.
        minimum: Option<i64>,
        /// Inclusive upper bound.
        maximum: Option<i64>,
        /// The value must be a multiple of this.
        multiple_of: Option<i64>,
    },
    /// Double-precision float with optional inclusive bounds.
    Float {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
        /// The value must be a multiple of this.
        multiple_of: Option<f64>,
    },
    /// Boolean.
    Boolean,
    /// Date and time (no zone).
    DateTime,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// JSON document. String inputs are decoded; decoding failure is
    /// a validation error distinct from a wrong value type.
    Json,
    /// Enumeration over a fixed set of string variants.
    Enum {
        /// Allowed values.
        variants: Vec<String>,
    },
    /// Reference to another model's primary key.
    ForeignKey {
        /// The referenced model.
        to: Arc<ModelSchema>,
    },
    /// Array of strings.
    StringArray,
}

impl FieldKind {
    /// Returns the column shape this kind stores as.
    ///
    /// Foreign keys inherit the referenced model's primary-key shape.
    #[must_use]
    pub fn column_shape(&self) -> ColumnShape {
        match self {
            Self::String { max_length, .. } => ColumnShape::Varchar(*max_length),
            Self::Text { .. } => ColumnShape::Text,
            Self::Integer { .. } => ColumnShape::Integer,
            Self::Float { .. } => ColumnShape::Float,
            Self::Boolean => ColumnShape::Boolean,
            Self::DateTime => ColumnShape::DateTime,
            Self::Date => ColumnShape::Date,
            Self::Time => ColumnShape::Time,
            Self::Json => ColumnShape::Json,
            Self::Enum { variants } => ColumnShape::Enum(variants.clone()),
            Self::ForeignKey { to } => to
                .field(&to.pk_name)
                .map_or(ColumnShape::Integer, |pk| pk.kind.column_shape()),
            Self::StringArray => ColumnShape::StringArray,
        }
    }

    /// Returns the referenced model for foreign-key kinds.
    #[must_use]
    pub const fn fk_target(&self) -> Option<&Arc<ModelSchema>> {
        match self {
            Self::ForeignKey { to } => Some(to),
            _ => None,
        }
    }
}

/// Metadata for one declared model attribute.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The field's kind and kind-specific constraints.
    pub kind: FieldKind,
    /// Whether this field is the model's primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub allow_null: bool,
    /// Whether a UNIQUE constraint applies.
    pub unique: bool,
    /// Whether the column is indexed.
    pub index: bool,
}

impl FieldDescriptor {
    /// Creates a descriptor over an explicit kind.
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            primary_key: false,
            allow_null: false,
            unique: false,
            index: false,
        }
    }

    /// Bounded string field. `max_length` must be positive; the
    /// schema compiler rejects the model otherwise.
    #[must_use]
    pub const fn string(max_length: usize) -> Self {
        Self::new(FieldKind::String {
            max_length,
            min_length: None,
            strip_whitespace: false,
            pattern: None,
        })
    }

    /// Unbounded text field.
    #[must_use]
    pub const fn text() -> Self {
        Self::new(FieldKind::Text {
            strip_whitespace: false,
        })
    }

    /// Integer field with no bounds.
    #[must_use]
    pub const fn integer() -> Self {
        Self::new(FieldKind::Integer {
            minimum: None,
            maximum: None,
            multiple_of: None,
        })
    }

    /// Float field with no bounds.
    #[must_use]
    pub const fn float() -> Self {
        Self::new(FieldKind::Float {
            minimum: None,
            maximum: None,
            multiple_of: None,
        })
    }

    /// Boolean field.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// Date-and-time field.
    #[must_use]
    pub const fn datetime() -> Self {
        Self::new(FieldKind::DateTime)
    }

    /// Date field.
    #[must_use]
    pub const fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    /// Time field.
    #[must_use]
    pub const fn time() -> Self {
        Self::new(FieldKind::Time)
    }

    /// JSON field.
    #[must_use]
    pub const fn json() -> Self {
        Self::new(FieldKind::Json)
    }

    /// Enumeration field over the given string variants.
    #[must_use]
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FieldKind::Enum {
            variants: variants.into_iter().map(Into::into).collect(),
        })
    }

    /// Foreign key referencing the given model's primary key.
    #[must_use]
    pub fn foreign_key(to: &Arc<ModelSchema>) -> Self {
        Self::new(FieldKind::ForeignKey {
            to: Arc::clone(to),
        })
    }

    /// String-array field.
    #[must_use]
    pub const fn string_array() -> Self {
        Self::new(FieldKind::StringArray)
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn allow_null(mut self) -> Self {
        self.allow_null = true;
        self
    }

    /// Adds a UNIQUE constraint.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Indexes the column.
    #[must_use]
    pub const fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Sets the minimum length. Applies to string kinds only.
    #[must_use]
    pub fn min_length(mut self, n: usize) -> Self {
        if let FieldKind::String { min_length, .. } = &mut self.kind {
            *min_length = Some(n);
        }
        self
    }

    /// Sets the inclusive lower bound. Applies to numeric kinds only.
    #[must_use]
    pub fn minimum(mut self, bound: i64) -> Self {
        match &mut self.kind {
            FieldKind::Integer { minimum, .. } => *minimum = Some(bound),
            FieldKind::Float { minimum, .. } => *minimum = Some(bound as f64),
            _ => {}
        }
        self
    }

    /// Sets the inclusive upper bound. Applies to numeric kinds only.
    #[must_use]
    pub fn maximum(mut self, bound: i64) -> Self {
        match &mut self.kind {
            FieldKind::Integer { maximum, .. } => *maximum = Some(bound),
            FieldKind::Float { maximum, .. } => *maximum = Some(bound as f64),
            _ => {}
        }
        self
    }

    /// Requires values to be a multiple of the given step. Applies to
    /// numeric kinds only.
    #[must_use]
    pub fn multiple_of(mut self, step: i64) -> Self {
        match &mut self.kind {
            FieldKind::Integer { multiple_of, .. } => *multiple_of = Some(step),
            FieldKind::Float { multiple_of, .. } => *multiple_of = Some(step as f64),
            _ => {}
        }
        self
    }

    /// Trims surrounding whitespace before validation. Applies to
    /// string and text kinds only.
    #[must_use]
    pub fn strip_whitespace(mut self) -> Self {
        match &mut self.kind {
            FieldKind::String {
                strip_whitespace, ..
            }
            | FieldKind::Text { strip_whitespace } => *strip_whitespace = true,
            _ => {}
        }
        self
    }

    /// Requires string values to match the given pattern, compiled
    /// once at declaration. Applies to the bounded string kind only.
    pub fn pattern(mut self, pattern: &str) -> crate::Result<Self> {
        let compiled = Regex::new(pattern)
            .map_err(|e| crate::OrmError::Config(format!("invalid pattern: {e}")))?;
        if let FieldKind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(compiled);
        }
        Ok(self)
    }

    /// Returns whether this field references another model.
    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        matches!(self.kind, FieldKind::ForeignKey { .. })
    }
}
