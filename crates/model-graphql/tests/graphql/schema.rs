use serde_json::json;

use crate::fixture::Fixture;

#[tokio::test]
async fn input_schema() {
    let fixture = Fixture::new();

    let query = r#"
        {
          gqlInputSchema(inputObject: "IssueCreateMutationInput") {
            inputObject
            fields {
              field
              kind
              multiple
              required
              maxLength
              helpText
              ofType
              defaultValue
              choices {
                label
                name
                value
              }
            }
          }
        }
    "#;

    let response = fixture.execute(Some(&fixture.user), query, json!({})).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "gqlInputSchema": {
          "inputObject": "IssueCreateMutationInput",
          "fields": [
            {
              "field": "name",
              "kind": "STRING",
              "multiple": false,
              "required": true,
              "maxLength": 255,
              "helpText": "",
              "ofType": null,
              "defaultValue": null,
              "choices": null
            },
            {
              "field": "kind",
              "kind": "STRING",
              "multiple": false,
              "required": false,
              "maxLength": 1,
              "helpText": "the kind of the issue",
              "ofType": null,
              "defaultValue": "\"b\"",
              "choices": [
                {
                  "label": "Bug",
                  "name": "B",
                  "value": "\"b\""
                },
                {
                  "label": "Feature",
                  "name": "F",
                  "value": "\"f\""
                }
              ]
            },
            {
              "field": "priority",
              "kind": "INTEGER",
              "multiple": false,
              "required": false,
              "maxLength": null,
              "helpText": "",
              "ofType": null,
              "defaultValue": "0",
              "choices": null
            },
            {
              "field": "milestone",
              "kind": "ID",
              "multiple": false,
              "required": false,
              "maxLength": null,
              "helpText": "",
              "ofType": "MilestoneType",
              "defaultValue": null,
              "choices": null
            },
            {
              "field": "comments",
              "kind": "ID",
              "multiple": true,
              "required": false,
              "maxLength": null,
              "helpText": null,
              "ofType": "IssueCommentType",
              "defaultValue": null,
              "choices": null
            }
          ]
        }
      }
    }
    "###);
}

#[tokio::test]
async fn unknown_input_schemas_are_null() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(
            None,
            r#"{ gqlInputSchema(inputObject: "NonExistingMutationInput") { inputObject } }"#,
            json!({}),
        )
        .await;

    assert_eq!(response, json!({ "data": { "gqlInputSchema": null } }));
}

#[tokio::test]
async fn all_schemas_are_listed_by_name() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(
            None,
            "{ gqlInputSchemaAll { inputObject } gqlObjectSchemaAll { objectType } }",
            json!({}),
        )
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "gqlInputSchemaAll": [
          {
            "inputObject": "IssueCreateMutationInput"
          },
          {
            "inputObject": "IssueDeleteMutationInput"
          },
          {
            "inputObject": "IssueUpdateMutationInput"
          },
          {
            "inputObject": "MilestoneCreateMutationInput"
          },
          {
            "inputObject": "MilestoneDeleteMutationInput"
          },
          {
            "inputObject": "MilestoneUpdateMutationInput"
          },
          {
            "inputObject": "ProjectCreateMutationInput"
          },
          {
            "inputObject": "ProjectDeleteMutationInput"
          },
          {
            "inputObject": "ProjectUpdateMutationInput"
          }
        ],
        "gqlObjectSchemaAll": [
          {
            "objectType": "IssueCommentType"
          },
          {
            "objectType": "IssueType"
          },
          {
            "objectType": "MilestoneCommentType"
          },
          {
            "objectType": "MilestoneType"
          },
          {
            "objectType": "ProjectType"
          }
        ]
      }
    }
    "###);
}

#[tokio::test]
async fn object_schema() {
    let fixture = Fixture::new();

    let response = fixture
        .execute(
            None,
            r#"{ gqlObjectSchema(objectType: "MilestoneType") { objectType fields { field kind multiple ofType } } }"#,
            json!({}),
        )
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "gqlObjectSchema": {
          "objectType": "MilestoneType",
          "fields": [
            {
              "field": "id",
              "kind": "INTEGER",
              "multiple": false,
              "ofType": null
            },
            {
              "field": "name",
              "kind": "STRING",
              "multiple": false,
              "ofType": null
            },
            {
              "field": "due_date",
              "kind": "DATE",
              "multiple": false,
              "ofType": null
            },
            {
              "field": "project",
              "kind": "ID",
              "multiple": false,
              "ofType": "ProjectType"
            },
            {
              "field": "issues",
              "kind": "ID",
              "multiple": true,
              "ofType": "IssueType"
            },
            {
              "field": "comments",
              "kind": "ID",
              "multiple": true,
              "ofType": "MilestoneCommentType"
            }
          ]
        }
      }
    }
    "###);
}

#[test]
fn sdl_describes_models_and_mutations() {
    let fixture = Fixture::new();
    let sdl = fixture.schema.sdl();

    for expected in [
        "interface Node",
        "type IssueType implements Node",
        "type IssueTypeConnection",
        "type IssueTypeEdge",
        "enum FieldKind",
        "scalar JSONString",
        "scalar Upload",
        "input IssueCreateMutationInput",
        "type IssueCreateMutationPayload",
        "type MutationErrorType",
        "issueCreate(input: IssueCreateMutationInput!): IssueCreateMutationPayload",
        "node(id: ID!): Node",
    ] {
        assert!(sdl.contains(expected), "missing {expected:?} in:\n{sdl}");
    }
}
