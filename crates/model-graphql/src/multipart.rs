use async_graphql::Request;
use model_mutations::{parse_multipart, UploadError};

/// Builds a request from the `operations` and `map` parts of a multipart request.
///
/// Every mapped variable is set to the token of its file part. The caller adds the files
/// themselves as `Uploads` request data, keyed by the same tokens.
pub fn multipart_request(operations: &str, map: &str) -> Result<Request, UploadError> {
    let operations = parse_multipart(operations, map)?;

    Ok(serde_json::from_value(operations)?)
}
