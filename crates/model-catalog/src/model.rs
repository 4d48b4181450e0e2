use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use crate::FieldDefinition;

/// How object permissions of a model are decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Guard {
    /// The model carries its own per-object permission set.
    Own,
    /// Permissions declared on the model behind `attribute` are checked on that entity.
    /// The attribute must be a foreign key or one-to-one field to a guarded model.
    Related { attribute: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub codename: String,
    pub name: String,
}

/// A declared model, before the catalog adds its primary key and reverse relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub app_label: String,
    pub name: String,
    pub verbose_name: String,
    pub verbose_name_plural: String,
    pub fields: Vec<FieldDefinition>,
    pub permissions: Vec<PermissionDefinition>,
    pub guard: Option<Guard>,
}

impl ModelDefinition {
    pub fn new(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let verbose_name = name.to_snake_case().replace('_', " ");
        let verbose_name_plural = format!("{verbose_name}s");

        Self {
            app_label: app_label.into(),
            name,
            verbose_name,
            verbose_name_plural,
            fields: Vec::new(),
            permissions: Vec::new(),
            guard: None,
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn permission(mut self, codename: impl Into<String>, name: impl Into<String>) -> Self {
        self.permissions.push(PermissionDefinition {
            codename: codename.into(),
            name: name.into(),
        });
        self
    }

    #[must_use]
    pub fn verbose_name_plural(mut self, verbose_name_plural: impl Into<String>) -> Self {
        self.verbose_name_plural = verbose_name_plural.into();
        self
    }

    /// Marks the model as carrying its own object permissions.
    #[must_use]
    pub fn guarded(mut self) -> Self {
        self.guard = Some(Guard::Own);
        self
    }

    /// Marks the model as delegating part of its permissions to the entity behind `attribute`.
    #[must_use]
    pub fn guarded_by(mut self, attribute: impl Into<String>) -> Self {
        self.guard = Some(Guard::Related {
            attribute: attribute.into(),
        });
        self
    }

    /// The lowercase name used in default permission codenames and reverse accessors.
    pub fn model_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Default permissions every model gets, followed by the declared ones.
    pub(crate) fn all_permissions(&self) -> Vec<PermissionDefinition> {
        let model_name = self.model_name();

        ["add", "change", "delete", "view"]
            .into_iter()
            .map(|action| PermissionDefinition {
                codename: format!("{action}_{model_name}"),
                name: format!("Can {action} {}", self.verbose_name),
            })
            .chain(self.permissions.iter().cloned())
            .collect()
    }
}
