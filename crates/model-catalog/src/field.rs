use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The storage type of a model field.
///
/// This is a closed set: everything the mappers know how to reflect has a variant here,
/// anything else goes through [`FieldType::Custom`] and is rejected by the mappers with
/// a descriptive error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum_macros::IntoStaticStr)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FieldType {
    #[strum(serialize = "CharField")]
    Char,
    #[strum(serialize = "TextField")]
    Text,
    #[strum(serialize = "EmailField")]
    Email,
    #[strum(serialize = "SlugField")]
    Slug,
    #[strum(serialize = "URLField")]
    Url,
    #[strum(serialize = "UUIDField")]
    Uuid,
    #[strum(serialize = "GenericIPAddressField")]
    IpAddress,
    #[strum(serialize = "FileField")]
    File,
    #[strum(serialize = "ImageField")]
    Image,
    #[strum(serialize = "FilePathField")]
    FilePath,
    #[strum(serialize = "AutoField")]
    Auto,
    #[strum(serialize = "BigAutoField")]
    BigAuto,
    #[strum(serialize = "IntegerField")]
    Integer,
    #[strum(serialize = "SmallIntegerField")]
    SmallInteger,
    #[strum(serialize = "BigIntegerField")]
    BigInteger,
    #[strum(serialize = "PositiveIntegerField")]
    PositiveInteger,
    #[strum(serialize = "PositiveSmallIntegerField")]
    PositiveSmallInteger,
    #[strum(serialize = "DecimalField")]
    Decimal { max_digits: u32, decimal_places: u32 },
    #[strum(serialize = "DurationField")]
    Duration,
    #[strum(serialize = "FloatField")]
    Float,
    #[strum(serialize = "BooleanField")]
    Boolean,
    #[strum(serialize = "NullBooleanField")]
    NullBoolean,
    #[strum(serialize = "DateField")]
    Date,
    #[strum(serialize = "DateTimeField")]
    DateTime,
    #[strum(serialize = "TimeField")]
    Time,
    #[strum(serialize = "ForeignKey")]
    ForeignKey { to: String },
    #[strum(serialize = "OneToOneField")]
    OneToOne { to: String },
    #[strum(serialize = "ManyToManyField")]
    ManyToMany { to: String },
    /// Reverse side of a foreign key. Derived by the catalog, never declared.
    #[strum(serialize = "ManyToOneRel")]
    ManyToOneRel { from: String, field: String },
    /// Reverse side of a many-to-many field. Derived by the catalog, never declared.
    #[strum(serialize = "ManyToManyRel")]
    ManyToManyRel { from: String, field: String },
    /// Reverse side of a one-to-one field. Derived by the catalog, never declared.
    #[strum(serialize = "OneToOneRel")]
    OneToOneRel { from: String, field: String },
    #[strum(serialize = "ArrayField")]
    Array { base: Box<FieldType> },
    #[strum(serialize = "RangeField")]
    Range { base: Box<FieldType> },
    #[strum(serialize = "JSONField")]
    Json,
    #[strum(serialize = "HStoreField")]
    HStore,
    /// A field type the host ORM knows about but this layer does not.
    #[strum(serialize = "Field")]
    Custom { name: String },
}

impl FieldType {
    /// The host ORM class name of this type, used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Custom { name } => name,
            other => {
                let name: &'static str = other.into();
                name
            }
        }
    }

    /// The model on the other side of a relation, forward or reverse.
    pub fn related_model(&self) -> Option<&str> {
        match self {
            FieldType::ForeignKey { to } | FieldType::OneToOne { to } | FieldType::ManyToMany { to } => Some(to),
            FieldType::ManyToOneRel { from, .. }
            | FieldType::ManyToManyRel { from, .. }
            | FieldType::OneToOneRel { from, .. } => Some(from),
            _ => None,
        }
    }

    /// Foreign keys and one-to-one fields: the entity stores a single related pk.
    pub fn is_single_relation(&self) -> bool {
        matches!(self, FieldType::ForeignKey { .. } | FieldType::OneToOne { .. })
    }

    pub fn is_many_to_many(&self) -> bool {
        matches!(self, FieldType::ManyToMany { .. })
    }

    /// Relations declared on the other model and reflected on this one.
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            FieldType::ManyToOneRel { .. } | FieldType::ManyToManyRel { .. } | FieldType::OneToOneRel { .. }
        )
    }

    /// Relations whose value is a set of related entities.
    pub fn is_multiple_relation(&self) -> bool {
        matches!(
            self,
            FieldType::ManyToMany { .. } | FieldType::ManyToOneRel { .. } | FieldType::ManyToManyRel { .. }
        )
    }

    /// Fields that live in the entity's own row.
    pub fn is_concrete(&self) -> bool {
        !self.is_reverse() && !self.is_many_to_many()
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FieldType::File | FieldType::Image)
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, FieldType::Auto | FieldType::BigAuto)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, FieldType::Boolean | FieldType::NullBoolean)
    }
}

/// What happens to dependents when the entity a foreign key points to is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    #[default]
    Cascade,
    SetNull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub value: Value,
    pub label: String,
}

/// A declared model field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub null: bool,
    pub blank: bool,
    /// `None` means no default was provided, `Some(Value::Null)` is an explicit null default.
    pub default: Option<Value>,
    pub choices: Vec<Choice>,
    pub help_text: String,
    pub verbose_name: String,
    pub editable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub related_name: Option<String>,
    pub on_delete: OnDelete,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let verbose_name = name.replace('_', " ");

        Self {
            name,
            field_type,
            null: false,
            blank: false,
            default: None,
            choices: Vec::new(),
            help_text: String::new(),
            verbose_name,
            editable: true,
            unique: false,
            primary_key: false,
            max_length: None,
            min_length: None,
            min_value: None,
            max_value: None,
            related_name: None,
            on_delete: OnDelete::default(),
        }
    }

    pub fn auto_primary_key() -> Self {
        let mut field = Self::new("id", FieldType::Auto);
        field.primary_key = true;
        field.blank = true;
        field.unique = true;
        field.verbose_name = String::from("ID");
        field
    }

    pub fn char(name: impl Into<String>, max_length: u64) -> Self {
        Self::new(name, FieldType::Char).max_length(max_length)
    }

    pub fn foreign_key(name: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(name, FieldType::ForeignKey { to: to.into() })
    }

    pub fn many_to_many(name: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(name, FieldType::ManyToMany { to: to.into() })
    }

    #[must_use]
    pub fn null(mut self) -> Self {
        self.null = true;
        self
    }

    #[must_use]
    pub fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Shorthand for an optional field: nullable, blank and defaulting to null.
    #[must_use]
    pub fn optional(self) -> Self {
        self.null().blank().default(Value::Null)
    }

    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn choices<V, L>(mut self, choices: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<Value>,
        L: Into<String>,
    {
        self.choices = choices
            .into_iter()
            .map(|(value, label)| Choice {
                value: value.into(),
                label: label.into(),
            })
            .collect();
        self
    }

    #[must_use]
    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = help_text.into();
        self
    }

    #[must_use]
    pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = verbose_name.into();
        self
    }

    #[must_use]
    pub fn not_editable(mut self) -> Self {
        self.editable = false;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn max_length(mut self, max_length: u64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    #[must_use]
    pub fn min_length(mut self, min_length: u64) -> Self {
        self.min_length = Some(min_length);
        self
    }

    #[must_use]
    pub fn min_value(mut self, min_value: i64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    #[must_use]
    pub fn max_value(mut self, max_value: i64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    #[must_use]
    pub fn related_name(mut self, related_name: impl Into<String>) -> Self {
        self.related_name = Some(related_name.into());
        self
    }

    #[must_use]
    pub fn on_delete(mut self, on_delete: OnDelete) -> Self {
        self.on_delete = on_delete;
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// The value written when a non-nullable field receives an explicit null.
    pub fn get_default(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None if self.field_type.is_boolean() => Value::Null,
            None if self.null => Value::Null,
            // Strings default to the empty string in the host ORM.
            None if self.is_string_based() => Value::String(String::new()),
            None => Value::Null,
        }
    }

    pub fn is_string_based(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::Char
                | FieldType::Text
                | FieldType::Email
                | FieldType::Slug
                | FieldType::Url
                | FieldType::FilePath
                | FieldType::File
                | FieldType::Image
        )
    }

    /// Reverse relations declared with a `+` suffix are not reflected anywhere.
    pub fn is_hidden(&self) -> bool {
        self.name.ends_with('+')
    }
}
