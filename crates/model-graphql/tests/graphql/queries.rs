use model_permissions::User;
use serde_json::json;

use crate::fixture::{global_id, Fixture};

#[tokio::test]
async fn anonymous_users_see_nothing() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(None, "{ projects { totalCount edges { node { name } } } }", json!({}))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "projects": {
          "totalCount": 0,
          "edges": []
        }
      }
    }
    "###);
}

#[tokio::test]
async fn guarded_lists_are_filtered_by_object_permissions() {
    let fixture = Fixture::new();

    let query = r"
        {
          issues {
            totalCount
            edges {
              node {
                id
                name
                kind
                priority
                milestone {
                  name
                }
              }
            }
          }
        }
    ";

    let response = fixture.execute(Some(&fixture.user), query, json!({})).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issues": {
          "totalCount": 2,
          "edges": [
            {
              "node": {
                "id": "SXNzdWVUeXBlOjE=",
                "name": "Issue 1",
                "kind": "B",
                "priority": 1,
                "milestone": {
                  "name": "Milestone 1"
                }
              }
            },
            {
              "node": {
                "id": "SXNzdWVUeXBlOjI=",
                "name": "Issue 2",
                "kind": "B",
                "priority": 1,
                "milestone": {
                  "name": "Milestone 1"
                }
              }
            }
          ]
        }
      }
    }
    "###);
}

#[tokio::test]
async fn superusers_see_everything() {
    let fixture = Fixture::new();
    let admin = User::new(2, "admin").superuser();

    let response = fixture
        .execute(
            Some(&admin),
            "{ issues(orderby: [\"-priority\", \"name\"]) { totalCount edges { node { name priority } } } }",
            json!({}),
        )
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issues": {
          "totalCount": 4,
          "edges": [
            {
              "node": {
                "name": "Issue 4",
                "priority": 3
              }
            },
            {
              "node": {
                "name": "Issue 1",
                "priority": 1
              }
            },
            {
              "node": {
                "name": "Issue 2",
                "priority": 1
              }
            },
            {
              "node": {
                "name": "Issue 3",
                "priority": 0
              }
            }
          ]
        }
      }
    }
    "###);
}

#[tokio::test]
async fn connections_are_ordered_and_numbered() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(
            Some(&fixture.user),
            "{ issues(orderby: [\"-name\"]) { edges { cursor node { name } } } }",
            json!({}),
        )
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issues": {
          "edges": [
            {
              "cursor": "YXJyYXljb25uZWN0aW9uOjA=",
              "node": {
                "name": "Issue 2"
              }
            },
            {
              "cursor": "YXJyYXljb25uZWN0aW9uOjE=",
              "node": {
                "name": "Issue 1"
              }
            }
          ]
        }
      }
    }
    "###);

    let response = fixture
        .execute(Some(&fixture.user), "{ issues(orderby: [\"estimate\"]) { totalCount } }", json!({}))
        .await;

    assert_eq!(
        response["errors"][0]["message"],
        json!("Cannot resolve keyword 'estimate' into field.")
    );
}

#[tokio::test]
async fn relation_connections_are_filtered() {
    let fixture = Fixture::new();

    let query = r"
        {
          milestones {
            edges {
              node {
                name
                dueDate
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
                comments {
                  totalCount
                }
              }
            }
          }
        }
    ";

    let response = fixture.execute(Some(&fixture.user), query, json!({})).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "milestones": {
          "edges": [
            {
              "node": {
                "name": "Milestone 1",
                "dueDate": "2050-01-01",
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
                },
                "comments": {
                  "totalCount": 1
                }
              }
            },
            {
              "node": {
                "name": "Milestone 2",
                "dueDate": null,
                "project": {
                  "name": "Test Project"
                },
                "issues": {
                  "totalCount": 0,
                  "edges": []
                },
                "comments": {
                  "totalCount": 0
                }
              }
            }
          ]
        }
      }
    }
    "###);
}

#[tokio::test]
async fn related_guarded_entities_follow_their_parent() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(
            Some(&fixture.user),
            "{ issueComments { totalCount edges { node { comment issue { name } } } } }",
            json!({}),
        )
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issueComments": {
          "totalCount": 1,
          "edges": [
            {
              "node": {
                "comment": "Comment 1",
                "issue": {
                  "name": "Issue 1"
                }
              }
            }
          ]
        }
      }
    }
    "###);

    let response = fixture
        .execute(
            Some(&fixture.user),
            "query ($id: ID!) { issueComment(id: $id) { comment } }",
            json!({ "id": global_id("IssueCommentType", 2) }),
        )
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "issueComment": null
      }
    }
    "###);
}

#[tokio::test]
async fn nodes_resolve_through_their_type() {
    let fixture = Fixture::new();

    let query = "query ($id: ID!) { node(id: $id) { __typename id ... on IssueType { name } } }";

    let response = fixture
        .execute(Some(&fixture.user), query, json!({ "id": global_id("IssueType", 1) }))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "node": {
          "__typename": "IssueType",
          "id": "SXNzdWVUeXBlOjE=",
          "name": "Issue 1"
        }
      }
    }
    "###);

    let hidden = fixture
        .execute(Some(&fixture.user), query, json!({ "id": global_id("IssueType", 3) }))
        .await;
    let missing = fixture
        .execute(Some(&fixture.user), query, json!({ "id": global_id("IssueType", 99) }))
        .await;

    assert_eq!(hidden, json!({ "data": { "node": null } }));
    assert_eq!(missing, json!({ "data": { "node": null } }));
}

#[tokio::test]
async fn node_fields_check_the_id_type() {
    let fixture = Fixture::new();

    let query = "query ($id: ID!) { issue(id: $id) { name } }";

    let response = fixture
        .execute(Some(&fixture.user), query, json!({ "id": global_id("IssueType", 2) }))
        .await;
    assert_eq!(response, json!({ "data": { "issue": { "name": "Issue 2" } } }));

    let response = fixture
        .execute(Some(&fixture.user), query, json!({ "id": global_id("ProjectType", 1) }))
        .await;
    assert_eq!(response["data"], json!({ "issue": null }));
    assert_eq!(response["errors"][0]["message"], json!("Must receive a IssueType id."));

    let response = fixture
        .execute(Some(&fixture.user), query, json!({ "id": "not base64!" }))
        .await;
    assert_eq!(
        response["errors"][0]["message"],
        json!(r#"Unable to parse global ID "not base64!". Make sure it is a base64 encoded string in the format: "TypeName:id"."#)
    );

    let response = fixture
        .execute(
            Some(&fixture.user),
            "query ($id: ID!) { node(id: $id) { id } }",
            json!({ "id": global_id("TeamType", 1) }),
        )
        .await;
    assert_eq!(
        response["errors"][0]["message"],
        json!(r#"Relay Node "TeamType" not found in schema"#)
    );
}
