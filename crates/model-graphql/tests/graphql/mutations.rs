use model_mutations::Settings;
use serde_json::json;

use crate::fixture::{global_id, Fixture};

const PROJECT_CREATE: &str = r"
    mutation ($input: ProjectCreateMutationInput!) {
      projectCreate(input: $input) {
        project {
          id
          name
          dueDate
        }
        errors {
          field
          message
        }
        clientMutationId
      }
    }
";

#[tokio::test]
async fn create() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(
            Some(&fixture.user),
            PROJECT_CREATE,
            json!({ "input": { "name": "FooBar", "dueDate": "2050-02-01", "clientMutationId": "42" } }),
        )
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "projectCreate": {
          "project": {
            "id": "UHJvamVjdFR5cGU6Mg==",
            "name": "FooBar",
            "dueDate": "2050-02-01"
          },
          "errors": [],
          "clientMutationId": "42"
        }
      }
    }
    "###);

    let project = fixture.get("Project", 2).unwrap();
    assert_eq!(project.get("name"), Some(&json!("FooBar")));
}

#[tokio::test]
async fn create_with_related_ids() {
    let fixture = Fixture::new();

    let query = r"
        mutation ($input: MilestoneCreateMutationInput!) {
          milestoneCreate(input: $input) {
            milestone {
              name
              project {
                name
              }
              issues {
                totalCount
                edges {
                  node {
                    name
                  }
                }
              }
            }
            errors {
              field
              message
            }
          }
        }
    ";

    let variables = json!({
        "input": {
            "name": "Milestone 3",
            "project": global_id("ProjectType", 1),
            "issues": [global_id("IssueType", 1), global_id("IssueType", 2)],
        }
    });

    let response = fixture.execute(Some(&fixture.user), query, variables).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "milestoneCreate": {
          "milestone": {
            "name": "Milestone 3",
            "project": {
              "name": "Test Project"
            },
            "issues": {
              "totalCount": 2,
              "edges": [
                {
                  "node": {
                    "name": "Issue 1"
                  }
                },
                {
                  "node": {
                    "name": "Issue 2"
                  }
                }
              ]
            }
          },
          "errors": []
        }
      }
    }
    "###);

    let issue = fixture.get("Issue", 1).unwrap();
    assert_eq!(issue.get("milestone"), Some(&json!(3)));
}

#[tokio::test]
async fn create_with_choices() {
    let fixture = Fixture::new();

    let query = r"
        mutation ($input: IssueCreateMutationInput!) {
          issueCreate(input: $input) {
            issue {
              name
              kind
              priority
              milestone {
                name
              }
            }
            errors {
              field
              message
            }
          }
        }
    ";

    let variables = json!({
        "input": { "name": "Issue 5", "kind": "F", "milestone": global_id("MilestoneType", 2) }
    });

    let response = fixture.execute(Some(&fixture.user), query, variables).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issueCreate": {
          "issue": {
            "name": "Issue 5",
            "kind": "F",
            "priority": 0,
            "milestone": {
              "name": "Milestone 2"
            }
          },
          "errors": []
        }
      }
    }
    "###);

    let issue = fixture.get("Issue", 5).unwrap();
    assert_eq!(issue.get("kind"), Some(&json!("f")));
}

#[tokio::test]
async fn validation_errors_are_reported_in_the_payload() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(Some(&fixture.user), PROJECT_CREATE, json!({ "input": { "name": "" } }))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "projectCreate": {
          "project": null,
          "errors": [
            {
              "field": "name",
              "message": "This field cannot be blank."
            }
          ],
          "clientMutationId": null
        }
      }
    }
    "###);

    assert!(fixture.get("Project", 2).is_none());
}

#[tokio::test]
async fn anonymous_users_are_denied() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(None, PROJECT_CREATE, json!({ "input": { "name": "FooBar" } }))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "projectCreate": {
          "project": null,
          "errors": [
            {
              "field": null,
              "message": "Permission denied..."
            }
          ],
          "clientMutationId": null
        }
      }
    }
    "###);

    let fixture = Fixture::with_settings(Settings {
        swallow_permission_denied: false,
        ..Settings::default()
    });

    let response = fixture
        .execute(None, PROJECT_CREATE, json!({ "input": { "name": "FooBar" } }))
        .await;

    assert_eq!(response["data"], json!({ "projectCreate": null }));
    assert_eq!(response["errors"][0]["message"], json!("Permission denied..."));
    assert!(fixture.get("Project", 2).is_none());
}

#[tokio::test]
async fn update() {
    let fixture = Fixture::new();

    let query = r"
        mutation ($input: ProjectUpdateMutationInput!) {
          projectUpdate(input: $input) {
            project {
              name
              dueDate
            }
            errors {
              field
              message
            }
          }
        }
    ";

    let variables = json!({ "input": { "id": global_id("ProjectType", 1), "name": "New Name" } });
    let response = fixture.execute(Some(&fixture.user), query, variables).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "projectUpdate": {
          "project": {
            "name": "New Name",
            "dueDate": "2050-01-01"
          },
          "errors": []
        }
      }
    }
    "###);
}

#[tokio::test]
async fn update_requires_object_permissions() {
    let fixture = Fixture::new();

    let query = r"
        mutation ($input: IssueUpdateMutationInput!) {
          issueUpdate(input: $input) {
            issue {
              name
            }
            errors {
              field
              message
            }
          }
        }
    ";

    let allowed = json!({ "input": { "id": global_id("IssueType", 1), "name": "YYY" } });
    let response = fixture.execute(Some(&fixture.user), query, allowed).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issueUpdate": {
          "issue": {
            "name": "YYY"
          },
          "errors": []
        }
      }
    }
    "###);

    let hidden = json!({ "input": { "id": global_id("IssueType", 3), "name": "YYY" } });
    let response = fixture.execute(Some(&fixture.user), query, hidden).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issueUpdate": {
          "issue": null,
          "errors": [
            {
              "field": "id",
              "message": "Couldn't resolve to a node: SXNzdWVUeXBlOjM="
            }
          ]
        }
      }
    }
    "###);

    let issue = fixture.get("Issue", 3).unwrap();
    assert_eq!(issue.get("name"), Some(&json!("Issue 3")));
}

#[tokio::test]
async fn update_with_an_empty_id_list_detaches_the_relation() {
    let fixture = Fixture::new();

    let query = r"
        mutation ($input: MilestoneUpdateMutationInput!) {
          milestoneUpdate(input: $input) {
            milestone {
              issues {
                totalCount
              }
            }
            errors {
              message
            }
          }
        }
    ";

    let variables = json!({ "input": { "id": global_id("MilestoneType", 1), "issues": [] } });
    let response = fixture.execute(Some(&fixture.user), query, variables).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "milestoneUpdate": {
          "milestone": {
            "issues": {
              "totalCount": 0
            }
          },
          "errors": []
        }
      }
    }
    "###);

    for pk in [1, 2] {
        let issue = fixture.get("Issue", pk).unwrap();
        assert_eq!(issue.related_pk("milestone"), None);
    }
}

#[tokio::test]
async fn delete_cascades() {
    let fixture = Fixture::new();

    let query = r"
        mutation ($input: ProjectDeleteMutationInput!) {
          projectDelete(input: $input) {
            project {
              id
              name
            }
            errors {
              message
            }
          }
        }
    ";

    let response = fixture
        .execute(Some(&fixture.user), query, json!({ "input": { "id": global_id("ProjectType", 1) } }))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "projectDelete": {
          "project": {
            "id": "UHJvamVjdFR5cGU6MQ==",
            "name": "Test Project"
          },
          "errors": []
        }
      }
    }
    "###);

    assert!(fixture.get("Project", 1).is_none());
    assert!(fixture.get("Milestone", 1).is_none());
    assert!(fixture.get("MilestoneComment", 1).is_none());
    assert_eq!(fixture.get("Issue", 1).unwrap().related_pk("milestone"), None);
}

#[tokio::test]
async fn delete_requires_object_permissions() {
    let fixture = Fixture::new();

    let query = r"
        mutation ($input: IssueDeleteMutationInput!) {
          issueDelete(input: $input) {
            issue {
              name
            }
            errors {
              field
              message
            }
          }
        }
    ";

    let response = fixture
        .execute(Some(&fixture.user), query, json!({ "input": { "id": global_id("IssueType", 2) } }))
        .await;

    assert_eq!(
        response,
        json!({ "data": { "issueDelete": { "issue": { "name": "Issue 2" }, "errors": [] } } })
    );
    assert!(fixture.get("Issue", 2).is_none());

    let response = fixture
        .execute(Some(&fixture.user), query, json!({ "input": { "id": global_id("IssueType", 4) } }))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issueDelete": {
          "issue": null,
          "errors": [
            {
              "field": "id",
              "message": "Couldn't resolve to a node: SXNzdWVUeXBlOjQ="
            }
          ]
        }
      }
    }
    "###);
    assert!(fixture.get("Issue", 4).is_some());
}
