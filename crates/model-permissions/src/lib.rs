//! Who may do what, globally and per object.
//!
//! The primitives in this crate check global permissions of a [`User`]. Object-level
//! checks go through a [`PermissionBackend`], composed by the [`PermissionService`] for
//! models that carry their own object permissions or delegate part of them to a related
//! entity.

mod backend;
mod checks;
mod error;
mod guarded;
mod user;

pub use backend::{MemoryPermissionBackend, ObjectFilter, PermissionBackend};
pub use checks::{
    assert_authenticated, assert_perms, assert_superuser, check_authenticated, check_perms, check_superuser,
};
pub use error::{PermissionDenied, PermissionError, DEFAULT_DENIED_MESSAGE};
pub use guarded::PermissionService;
pub use user::User;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use model_catalog::{Catalog, FieldDefinition, ModelDefinition, OnDelete};
    use model_store::{Datastore, Entity, EntityId, MemoryStore};
    use serde_json::Value;

    use super::*;

    struct Fixture {
        store: MemoryStore,
        backend: Arc<MemoryPermissionBackend>,
        service: PermissionService,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = Catalog::builder()
                .model(ModelDefinition::new("tests", "Milestone").field(FieldDefinition::char("name", 255)))
                .model(
                    ModelDefinition::new("tests", "Issue")
                        .guarded()
                        .permission("can_read", "Can read the issue's information.")
                        .permission("can_write", "Can update the issue's information.")
                        .field(FieldDefinition::char("name", 255))
                        .field(
                            FieldDefinition::foreign_key("milestone", "Milestone")
                                .related_name("issues")
                                .optional()
                                .on_delete(OnDelete::SetNull),
                        ),
                )
                .model(
                    ModelDefinition::new("tests", "IssueComment")
                        .guarded_by("issue")
                        .permission("can_moderate", "Can moderate the comment.")
                        .field(FieldDefinition::foreign_key("issue", "Issue"))
                        .field(FieldDefinition::char("comment", 255)),
                )
                .build()
                .unwrap();

            let store = MemoryStore::new(Arc::new(catalog));
            let backend = Arc::new(MemoryPermissionBackend::new());
            let service = PermissionService::new(backend.clone());

            let fixture = Self { store, backend, service };

            for name in ["issue 1", "issue 2", "issue 3"] {
                fixture.create("Issue", &[("name", name.into())]);
            }

            for issue in 1..=3 {
                fixture.create("IssueComment", &[("issue", issue.into()), ("comment", "hello".into())]);
            }

            fixture
        }

        fn create(&self, model: &str, values: &[(&str, Value)]) -> Entity {
            let mut entity = Entity::new(self.store.catalog().find_model(model).unwrap());
            for (field, value) in values {
                entity.set(*field, value.clone());
            }
            self.store.save(&mut entity).unwrap();
            entity
        }

        fn grant(&self, user: &User, perm: &str, model: &str, pk: u64) {
            let model = self.store.catalog().find_model(model).unwrap();
            self.backend.assign_perm(perm, user, model, EntityId(pk)).unwrap();
        }

        fn has_perm(&self, user: &User, model: &str, pk: u64, perms: &[&str], any_perm: bool) -> bool {
            let walker = self.store.catalog().find_model(model).unwrap();
            let entity = self.store.get(model, EntityId(pk)).unwrap().unwrap();

            self.service
                .has_perm(&self.store, user, walker, &entity, perms, any_perm)
                .unwrap()
        }

        fn for_user(&self, user: &User, model: &str, perms: &[&str], any_perm: bool, with_superuser: bool) -> Vec<u64> {
            let walker = self.store.catalog().find_model(model).unwrap();

            self.service
                .for_user(&self.store, user, walker, perms, any_perm, with_superuser)
                .unwrap()
                .pks()
                .map(|pk| pk.0)
                .collect()
        }
    }

    #[test]
    fn object_and_global_permissions_combine() {
        let fixture = Fixture::new();
        let user = User::new(1, "user").with_permission("tests.can_write");
        fixture.grant(&user, "can_read", "Issue", 1);

        assert!(fixture.has_perm(&user, "Issue", 1, &["can_read", "can_write"], false));
        assert!(!fixture.has_perm(&user, "Issue", 2, &["can_read", "can_write"], false));
        assert!(fixture.has_perm(&user, "Issue", 2, &["can_read", "can_write"], true));
        assert!(!fixture.has_perm(&User::new(2, "other"), "Issue", 1, &["can_read"], true));
    }

    #[test]
    fn related_models_delegate_undeclared_permissions() {
        let fixture = Fixture::new();
        let user = User::new(1, "user");
        fixture.grant(&user, "can_read", "Issue", 1);
        fixture.grant(&user, "can_moderate", "IssueComment", 2);

        assert!(fixture.has_perm(&user, "IssueComment", 1, &["can_read"], false));
        assert!(!fixture.has_perm(&user, "IssueComment", 2, &["can_read"], false));
        assert!(fixture.has_perm(&user, "IssueComment", 2, &["can_read", "can_moderate"], true));
        assert!(!fixture.has_perm(&user, "IssueComment", 2, &["can_read", "can_moderate"], false));
        assert!(!fixture.has_perm(&user, "IssueComment", 3, &["can_read", "can_moderate"], true));
    }

    #[test]
    fn for_user_filters_through_the_backend() {
        let fixture = Fixture::new();
        let user = User::new(1, "user");
        fixture.grant(&user, "can_read", "Issue", 1);
        fixture.grant(&user, "can_read", "Issue", 3);
        fixture.grant(&user, "can_write", "Issue", 3);

        assert_eq!(fixture.for_user(&user, "Issue", &["can_read"], false, true), [1, 3]);
        assert_eq!(fixture.for_user(&user, "Issue", &["can_read", "can_write"], false, true), [3]);
        assert_eq!(fixture.for_user(&user, "Issue", &["can_read", "can_write"], true, true), [1, 3]);
    }

    #[test]
    fn for_user_on_related_models_combines_both_sides() {
        let fixture = Fixture::new();
        let user = User::new(1, "user");
        fixture.grant(&user, "can_read", "Issue", 1);
        fixture.grant(&user, "can_read", "Issue", 2);
        fixture.grant(&user, "can_moderate", "IssueComment", 2);
        fixture.grant(&user, "can_moderate", "IssueComment", 3);

        let perms = ["can_read", "can_moderate"];
        assert_eq!(fixture.for_user(&user, "IssueComment", &perms, true, true), [1, 2, 3]);
        assert_eq!(fixture.for_user(&user, "IssueComment", &perms, false, true), [2]);
        assert_eq!(fixture.for_user(&user, "IssueComment", &["can_read"], false, true), [1, 2]);
    }

    #[test]
    fn superusers_bypass_filters_only_when_asked() {
        let fixture = Fixture::new();
        let admin = User::new(1, "admin").superuser();

        assert_eq!(fixture.for_user(&admin, "Issue", &["can_read"], false, true), [1, 2, 3]);
        assert!(fixture.for_user(&admin, "Issue", &["can_read"], false, false).is_empty());

        fixture.grant(&admin, "can_read", "Issue", 2);
        assert_eq!(fixture.for_user(&admin, "Issue", &["can_read"], false, false), [2]);
    }

    #[test]
    fn global_permissions_grant_every_object() {
        let fixture = Fixture::new();
        let user = User::new(1, "user").with_permission("tests.can_read");

        assert_eq!(fixture.for_user(&user, "Issue", &["can_read"], false, true), [1, 2, 3]);
        assert_eq!(fixture.for_user(&user, "IssueComment", &["can_read"], false, true), [1, 2, 3]);
    }

    #[test]
    fn anonymous_users_see_nothing_unless_mapped() {
        let fixture = Fixture::new();
        assert!(fixture.for_user(&User::anonymous(), "Issue", &["can_read"], true, true).is_empty());
        assert!(!fixture.has_perm(&User::anonymous(), "Issue", 1, &["can_read"], true));

        let catalog = fixture.store.catalog();
        let anonymous = User::new(99, "AnonymousUser");
        let backend = MemoryPermissionBackend::new().with_anonymous_user(anonymous.clone());
        backend
            .assign_perm("can_read", &anonymous, catalog.find_model("Issue").unwrap(), EntityId(2))
            .unwrap();

        let service = PermissionService::new(Arc::new(backend));
        let queryset = service
            .for_user(
                &fixture.store,
                &User::anonymous(),
                catalog.find_model("Issue").unwrap(),
                &["can_read"],
                true,
                true,
            )
            .unwrap();

        assert_eq!(queryset.pks().collect::<Vec<_>>(), [EntityId(2)]);
    }

    #[test]
    fn without_a_backend_everything_is_allowed() {
        let fixture = Fixture::new();
        let service = PermissionService::unchecked();
        let model = fixture.store.catalog().find_model("Issue").unwrap();
        let issue = fixture.store.get("Issue", EntityId(1)).unwrap().unwrap();

        assert!(service
            .has_perm(&fixture.store, &User::anonymous(), model, &issue, &["can_read"], false)
            .unwrap());
        assert_eq!(
            service
                .for_user(&fixture.store, &User::anonymous(), model, &["can_read"], false, true)
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn unknown_permissions_cannot_be_granted() {
        let fixture = Fixture::new();
        let model = fixture.store.catalog().find_model("Issue").unwrap();

        let error = fixture
            .backend
            .assign_perm("can_fly", &User::new(1, "user"), model, EntityId(1))
            .unwrap_err();

        insta::assert_snapshot!(error, @"model Issue declares no permission can_fly");
    }
}
