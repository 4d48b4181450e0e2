//! Model metadata as reported by the host ORM.
//!
//! The catalog is the seam between the persistence layer and the schema reflection
//! built on top of it. Models are declared with [`ModelDefinition`] and
//! [`FieldDefinition`]; building the [`Catalog`] adds the implicit primary key, derives
//! the reverse side of every relation and validates permission delegation, after which
//! everything is immutable and navigated with walkers.

mod error;
mod field;
mod ids;
mod model;
mod walkers;

use std::collections::HashMap;

pub use error::CatalogError;
pub use field::{Choice, FieldDefinition, FieldType, OnDelete};
pub use ids::{FieldId, ModelId};
pub use model::{Guard, ModelDefinition, PermissionDefinition};
pub use walkers::{FieldWalker, ModelWalker, Walker};

#[derive(Debug, Clone)]
pub struct Catalog {
    models: Vec<CatalogModel>,
    names: HashMap<String, ModelId>,
}

#[derive(Debug, Clone)]
struct CatalogModel {
    definition: ModelDefinition,
    permissions: Vec<PermissionDefinition>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn walk<Id>(&self, id: Id) -> Walker<'_, Id> {
        Walker { id, catalog: self }
    }

    pub fn models(&self) -> impl ExactSizeIterator<Item = ModelWalker<'_>> + '_ {
        (0..self.models.len()).map(move |id| self.walk(ModelId(id as u32)))
    }

    pub fn find_model(&self, name: &str) -> Option<ModelWalker<'_>> {
        self.names.get(name).map(|id| self.walk(*id))
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    models: Vec<ModelDefinition>,
}

impl CatalogBuilder {
    #[must_use]
    pub fn model(mut self, model: ModelDefinition) -> Self {
        self.models.push(model);
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut names = HashMap::with_capacity(self.models.len());
        let mut models = Vec::with_capacity(self.models.len());

        for (id, mut definition) in self.models.into_iter().enumerate() {
            if names.insert(definition.name.clone(), ModelId(id as u32)).is_some() {
                return Err(CatalogError::DuplicateModel(definition.name));
            }

            if !definition.fields.iter().any(|field| field.primary_key || field.name == "id") {
                definition.fields.insert(0, FieldDefinition::auto_primary_key());
            }

            let mut seen = std::collections::HashSet::new();
            for field in &definition.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(CatalogError::DuplicateField {
                        model: definition.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }

            models.push(definition);
        }

        let reverse_fields = derive_reverse_fields(&models, &names)?;

        for ReverseField { target, from, forward, field } in reverse_fields {
            let model = &mut models[usize::from(target)];

            if !field.is_hidden() && model.fields.iter().any(|existing| existing.name == field.name) {
                return Err(CatalogError::ReverseAccessorClash {
                    model: from,
                    field: forward,
                    target: model.name.clone(),
                    name: field.name,
                });
            }

            model.fields.push(field);
        }

        let models: Vec<_> = models
            .into_iter()
            .map(|definition| CatalogModel {
                permissions: definition.all_permissions(),
                definition,
            })
            .collect();

        let catalog = Catalog { models, names };
        validate_guards(&catalog)?;

        Ok(catalog)
    }
}

struct ReverseField {
    target: ModelId,
    from: String,
    forward: String,
    field: FieldDefinition,
}

fn derive_reverse_fields(
    models: &[ModelDefinition],
    names: &HashMap<String, ModelId>,
) -> Result<Vec<ReverseField>, CatalogError> {
    let mut reverse_fields = Vec::new();

    for model in models {
        for field in &model.fields {
            let Some(target) = field.field_type.related_model() else {
                continue;
            };

            let Some(target_id) = names.get(target).copied() else {
                return Err(CatalogError::UnknownRelatedModel {
                    model: model.name.clone(),
                    field: field.name.clone(),
                    target: target.to_string(),
                });
            };

            let from = model.name.clone();
            let forward = field.name.clone();

            let (default_name, field_type) = match &field.field_type {
                FieldType::ForeignKey { .. } => (
                    format!("{}_set", model.model_name()),
                    FieldType::ManyToOneRel {
                        from: from.clone(),
                        field: forward.clone(),
                    },
                ),
                FieldType::ManyToMany { .. } => (
                    format!("{}_set", model.model_name()),
                    FieldType::ManyToManyRel {
                        from: from.clone(),
                        field: forward.clone(),
                    },
                ),
                FieldType::OneToOne { .. } => (
                    model.model_name(),
                    FieldType::OneToOneRel {
                        from: from.clone(),
                        field: forward.clone(),
                    },
                ),
                _ => continue,
            };

            let name = field.related_name.clone().unwrap_or(default_name);

            let reverse = FieldDefinition::new(name, field_type)
                .null()
                .blank()
                .not_editable()
                .verbose_name(model.verbose_name_plural.clone());

            reverse_fields.push(ReverseField {
                target: target_id,
                from,
                forward,
                field: reverse,
            });
        }
    }

    Ok(reverse_fields)
}

fn validate_guards(catalog: &Catalog) -> Result<(), CatalogError> {
    for model in catalog.models() {
        let Some(Guard::Related { attribute }) = model.guard() else {
            continue;
        };

        let field = model
            .field(attribute)
            .filter(|field| field.field_type().is_single_relation());

        let Some(field) = field else {
            return Err(CatalogError::InvalidGuardAttribute {
                model: model.name().to_string(),
                attribute: attribute.clone(),
            });
        };

        let target = field.related_model().filter(|target| target.is_guarded());

        if target.is_none() {
            return Err(CatalogError::UnguardedGuardTarget {
                model: model.name().to_string(),
                target: field.field_type().related_model().unwrap_or_default().to_string(),
            });
        }
    }

    Ok(())
}
