use model_graphql::multipart_request;
use model_mutations::Uploads;
use model_store::{EntityId, UploadedFile};

use crate::fixture::Fixture;

const OPERATIONS: &str = r#"{
    "query": "mutation ($input: ProjectUpdateMutationInput!) { projectUpdate(input: $input) { project { name cover } errors { field message } } }",
    "variables": { "input": { "id": "UHJvamVjdFR5cGU6MQ==", "cover": null } }
}"#;

#[tokio::test]
async fn files_are_stored_by_token() {
    let fixture = Fixture::new();

    let request = multipart_request(OPERATIONS, r#"{ "0": ["variables.input.cover"] }"#).unwrap();
    let uploads = Uploads::new().with("0", UploadedFile::new("cover.png", "png"));

    let response = fixture
        .execute_with_uploads(Some(&fixture.user), request, uploads)
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "projectUpdate": {
          "project": {
            "name": "Test Project",
            "cover": "cover.png"
          },
          "errors": []
        }
      }
    }
    "###);

    let file = fixture.store.file("Project", EntityId(1), "cover").unwrap().unwrap();
    assert_eq!(file.filename, "cover.png");
    assert_eq!(file.content.as_ref(), b"png");
}

#[tokio::test]
async fn unknown_tokens_clear_the_file() {
    let fixture = Fixture::new();

    let request = multipart_request(OPERATIONS, r#"{ "0": ["variables.input.cover"] }"#).unwrap();

    let response = fixture
        .execute_with_uploads(Some(&fixture.user), request, Uploads::new())
        .await;

    assert_eq!(response["data"]["projectUpdate"]["project"]["cover"], serde_json::json!(""));
    assert!(fixture.store.file("Project", EntityId(1), "cover").unwrap().is_none());
}
