use serde::{Deserialize, Serialize};

/// The kind of value a form control should offer for a field.
///
/// Serialized with the GraphQL enum item name, [`FieldKind::value`] is the lowercase
/// wire value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
    strum_macros::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    Id,
    Json,
    String,
    Text,
    Boolean,
    Integer,
    Decimal,
    Float,
    Date,
    Datetime,
    Time,
    Percent,
    Email,
    Slug,
    Phone,
    Uuid,
    Ip,
    Url,
    File,
    Password,
    Currency,
    PostalCode,
    CompanyDocument,
    IndividualDocument,
}

impl FieldKind {
    /// The GraphQL enum item name.
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn value(self) -> String {
        self.name().to_lowercase().replace('_', "-")
    }
}
