use crate::{Catalog, FieldDefinition, FieldId, FieldType, Guard, ModelDefinition, ModelId, PermissionDefinition};

/// A reference to an item of the catalog, carrying the catalog along for navigation.
#[derive(Clone, Copy)]
pub struct Walker<'a, Id> {
    pub(crate) id: Id,
    pub(crate) catalog: &'a Catalog,
}

impl<'a, Id> Walker<'a, Id>
where
    Id: Copy,
{
    pub fn id(self) -> Id {
        self.id
    }

    pub fn catalog(self) -> &'a Catalog {
        self.catalog
    }

    pub fn walk<OtherId>(self, id: OtherId) -> Walker<'a, OtherId> {
        self.catalog.walk(id)
    }
}

impl<Id: PartialEq> PartialEq for Walker<'_, Id> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.catalog, other.catalog)
    }
}

impl<Id: std::fmt::Debug> std::fmt::Debug for Walker<'_, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker").field("id", &self.id).finish_non_exhaustive()
    }
}

/// A model of the catalog.
pub type ModelWalker<'a> = Walker<'a, ModelId>;

impl<'a> ModelWalker<'a> {
    pub fn name(self) -> &'a str {
        &self.get().name
    }

    pub fn app_label(self) -> &'a str {
        &self.get().app_label
    }

    pub fn verbose_name(self) -> &'a str {
        &self.get().verbose_name
    }

    pub fn verbose_name_plural(self) -> &'a str {
        &self.get().verbose_name_plural
    }

    pub fn guard(self) -> Option<&'a Guard> {
        self.get().guard.as_ref()
    }

    pub fn is_guarded(self) -> bool {
        self.guard().is_some()
    }

    /// Every permission declared on the model, the default ones included.
    pub fn permissions(self) -> &'a [PermissionDefinition] {
        &self.catalog.models[usize::from(self.id)].permissions
    }

    pub fn declares_permission(self, codename: &str) -> bool {
        let codename = self.unqualify_permission(codename);
        self.permissions().iter().any(|perm| perm.codename == codename)
    }

    /// `can_read` becomes `<app_label>.can_read`, qualified names are kept as they are.
    pub fn qualify_permission(self, permission: &str) -> String {
        if permission.contains('.') {
            permission.to_string()
        } else {
            format!("{}.{permission}", self.app_label())
        }
    }

    /// The codename of a permission of this model, without its app label.
    pub fn unqualify_permission<'b>(self, permission: &'b str) -> &'b str {
        match permission.split_once('.') {
            Some((app_label, codename)) if app_label == self.app_label() => codename,
            _ => permission,
        }
    }

    /// All fields, in declaration order: the primary key first and reverse relations last.
    pub fn fields(self) -> impl ExactSizeIterator<Item = FieldWalker<'a>> + 'a {
        let model = self.id;
        let catalog = self.catalog;

        (0..self.get().fields.len()).map(move |index| {
            catalog.walk(FieldId {
                model,
                index: index as u32,
            })
        })
    }

    pub fn field(self, name: &str) -> Option<FieldWalker<'a>> {
        self.fields().find(|field| field.name() == name)
    }

    pub fn primary_key(self) -> FieldWalker<'a> {
        self.fields()
            .find(|field| field.definition().primary_key)
            .unwrap_or_else(|| self.walk(FieldId { model: self.id, index: 0 }))
    }

    /// Fields stored in the entity's own row.
    pub fn concrete_fields(self) -> impl Iterator<Item = FieldWalker<'a>> + 'a {
        self.fields().filter(|field| field.field_type().is_concrete())
    }

    pub fn many_to_many_fields(self) -> impl Iterator<Item = FieldWalker<'a>> + 'a {
        self.fields().filter(|field| field.field_type().is_many_to_many())
    }

    /// Relations declared on other models pointing at this one.
    pub fn related_objects(self) -> impl Iterator<Item = FieldWalker<'a>> + 'a {
        self.fields().filter(|field| field.field_type().is_reverse())
    }

    /// The field and model permissions are delegated to, for related-guarded models.
    pub fn delegation(self) -> Option<(FieldWalker<'a>, ModelWalker<'a>)> {
        let Some(Guard::Related { attribute }) = self.guard() else {
            return None;
        };

        let field = self.field(attribute)?;
        let target = field.related_model()?;

        Some((field, target))
    }

    pub fn definition(self) -> &'a ModelDefinition {
        self.get()
    }

    fn get(self) -> &'a ModelDefinition {
        &self.catalog.models[usize::from(self.id)].definition
    }
}

/// A field of a model of the catalog.
pub type FieldWalker<'a> = Walker<'a, FieldId>;

impl<'a> FieldWalker<'a> {
    pub fn name(self) -> &'a str {
        &self.definition().name
    }

    pub fn field_type(self) -> &'a FieldType {
        &self.definition().field_type
    }

    pub fn model(self) -> ModelWalker<'a> {
        self.walk(self.id.model)
    }

    pub fn related_model(self) -> Option<ModelWalker<'a>> {
        self.field_type()
            .related_model()
            .and_then(|name| self.catalog.find_model(name))
    }

    /// For reverse relations, the forward field declared on the related model.
    pub fn remote_field(self) -> Option<FieldWalker<'a>> {
        match self.field_type() {
            FieldType::ManyToOneRel { from, field }
            | FieldType::ManyToManyRel { from, field }
            | FieldType::OneToOneRel { from, field } => self.catalog.find_model(from)?.field(field),
            _ => None,
        }
    }

    pub fn is_primary_key(self) -> bool {
        self.definition().primary_key
    }

    pub fn definition(self) -> &'a FieldDefinition {
        &self.catalog.models[usize::from(self.id.model)].definition.fields[self.id.index as usize]
    }
}
