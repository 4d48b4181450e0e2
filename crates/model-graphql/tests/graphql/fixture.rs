use std::sync::Arc;

use async_graphql::{Request, Variables};
use model_catalog::{Catalog, FieldDefinition, FieldType, ModelDefinition, OnDelete};
use model_graphql::ModelSchema;
use model_mutations::{MutationDefinition, Settings, Uploads};
use model_permissions::{MemoryPermissionBackend, PermissionService, User};
use model_schema::{to_global_id, ModelTypeDefinition, TypeRegistry};
use model_store::{Datastore, Entity, EntityId, MemoryStore};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

pub struct Fixture {
    pub schema: ModelSchema,
    pub store: Arc<MemoryStore>,
    pub user: User,
    catalog: Arc<Catalog>,
}

pub fn global_id(type_name: &str, pk: u64) -> String {
    to_global_id(type_name, EntityId(pk))
}

fn catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::builder()
            .model(
                ModelDefinition::new("tests", "Project")
                    .field(FieldDefinition::char("name", 255))
                    .field(FieldDefinition::new("due_date", FieldType::Date).optional())
                    .field(FieldDefinition::new("cover", FieldType::File).blank().default("")),
            )
            .model(
                ModelDefinition::new("tests", "Milestone")
                    .field(FieldDefinition::char("name", 255))
                    .field(FieldDefinition::new("due_date", FieldType::Date).optional())
                    .field(FieldDefinition::foreign_key("project", "Project").related_name("milestones")),
            )
            .model(
                ModelDefinition::new("tests", "Issue")
                    .guarded()
                    .permission("can_read", "Can read the issue's information.")
                    .permission("can_write", "Can update the issue's information.")
                    .field(FieldDefinition::char("name", 255))
                    .field(
                        FieldDefinition::char("kind", 1)
                            .choices([("b", "Bug"), ("f", "Feature")])
                            .default("b")
                            .help_text("the kind of the issue"),
                    )
                    .field(FieldDefinition::new("priority", FieldType::Integer).default(0))
                    .field(
                        FieldDefinition::foreign_key("milestone", "Milestone")
                            .related_name("issues")
                            .optional()
                            .on_delete(OnDelete::SetNull),
                    ),
            )
            .model(
                ModelDefinition::new("tests", "MilestoneComment")
                    .field(FieldDefinition::char("text", 255))
                    .field(FieldDefinition::foreign_key("milestone", "Milestone").related_name("comments")),
            )
            .model(
                ModelDefinition::new("tests", "IssueComment")
                    .guarded_by("issue")
                    .field(FieldDefinition::char("comment", 255))
                    .field(FieldDefinition::foreign_key("issue", "Issue").related_name("comments")),
            )
            .build()
            .unwrap(),
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        init_tracing();

        let catalog = catalog();

        let types = TypeRegistry::builder(catalog.clone())
            .register(ModelTypeDefinition::new("Project"))
            .register(ModelTypeDefinition::new("Milestone"))
            .register(ModelTypeDefinition::new("Issue").object_permissions(["can_read"]))
            .register(ModelTypeDefinition::new("MilestoneComment"))
            .register(ModelTypeDefinition::new("IssueComment").object_permissions(["can_read"]))
            .build()
            .unwrap();

        let store = Arc::new(MemoryStore::new(catalog.clone()));
        let backend = Arc::new(MemoryPermissionBackend::new());

        let schema = ModelSchema::builder(types, store.clone())
            .permissions(PermissionService::new(backend.clone()))
            .settings(settings)
            .mutations([
                MutationDefinition::create("Project"),
                MutationDefinition::update("Project"),
                MutationDefinition::delete("Project"),
                MutationDefinition::create("Milestone"),
                MutationDefinition::update("Milestone"),
                MutationDefinition::delete("Milestone"),
                MutationDefinition::create("Issue"),
                MutationDefinition::update("Issue").object_permissions(["can_write"]),
                MutationDefinition::delete("Issue").object_permissions(["can_write"]),
            ])
            .finish()
            .unwrap();

        let fixture = Self {
            schema,
            store,
            user: User::new(1, "foobar"),
            catalog,
        };

        fixture.insert("Project", json!({ "name": "Test Project", "due_date": "2050-01-01" }));
        fixture.insert("Milestone", json!({ "name": "Milestone 1", "due_date": "2050-01-01", "project": 1 }));
        fixture.insert("Milestone", json!({ "name": "Milestone 2", "project": 1 }));

        for (name, priority, milestone) in [
            ("Issue 1", 1, json!(1)),
            ("Issue 2", 1, json!(1)),
            ("Issue 3", 0, json!(2)),
            ("Issue 4", 3, Value::Null),
        ] {
            fixture.insert("Issue", json!({ "name": name, "priority": priority, "milestone": milestone }));
        }

        fixture.insert("MilestoneComment", json!({ "text": "Looking good", "milestone": 1 }));
        fixture.insert("IssueComment", json!({ "comment": "Comment 1", "issue": 1 }));
        fixture.insert("IssueComment", json!({ "comment": "Comment 2", "issue": 3 }));

        let issue = fixture.catalog.find_model("Issue").unwrap();

        for pk in [1, 2] {
            for perm in ["can_read", "can_write"] {
                backend.assign_perm(perm, &fixture.user, issue, EntityId(pk)).unwrap();
            }
        }

        fixture
    }

    fn insert(&self, model: &str, values: Value) {
        let mut entity = Entity::new(self.catalog.find_model(model).unwrap());

        for (field, value) in values.as_object().unwrap() {
            entity.set(field.as_str(), value.clone());
        }

        self.store.save(&mut entity).unwrap();
    }

    pub fn get(&self, model: &str, pk: u64) -> Option<Entity> {
        self.store.get(model, EntityId(pk)).unwrap()
    }

    /// Runs `query` as `user`, anonymously without one.
    pub async fn execute(&self, user: Option<&User>, query: &str, variables: Value) -> Value {
        self.execute_request(user, Request::new(query).variables(Variables::from_json(variables)))
            .await
    }

    pub async fn execute_with_uploads(&self, user: Option<&User>, request: Request, uploads: Uploads) -> Value {
        self.execute_request(user, request.data(uploads)).await
    }

    async fn execute_request(&self, user: Option<&User>, mut request: Request) -> Value {
        if let Some(user) = user {
            request = request.data(user.clone());
        }

        serde_json::to_value(self.schema.execute(request).await).unwrap()
    }
}
