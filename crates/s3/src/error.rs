//! Mapping of SDK failures onto the sss error taxonomy
//!
//! Store errors are passed through: the SDK's message is kept and only the
//! variant is chosen from the S3 error code or HTTP status.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_smithy_types::error::display::DisplayErrorContext;
use sss_core::Error;

/// Convert an SDK error for the resource `target` into an [`Error`]
pub(crate) fn map_sdk_error<E>(err: SdkError<E, HttpResponse>, target: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_owned);
    let detail = DisplayErrorContext(&err).to_string();

    classify(status, code.as_deref(), target, detail)
}

fn classify(status: Option<u16>, code: Option<&str>, target: &str, detail: String) -> Error {
    match (code, status) {
        (Some("NoSuchKey" | "NoSuchBucket" | "NotFound" | "NoSuchUpload"), _) | (_, Some(404)) => {
            Error::NotFound(target.to_string())
        }
        (
            Some(
                "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken",
            ),
            _,
        )
        | (_, Some(401 | 403)) => Error::Auth(format!("{target}: {detail}")),
        (Some("BucketAlreadyExists" | "BucketAlreadyOwnedByYou" | "BucketNotEmpty"), _)
        | (_, Some(409)) => Error::Conflict(format!("{target}: {detail}")),
        (Some("InvalidRange"), _) | (_, Some(416)) => {
            Error::InvalidInput(format!("{target}: requested range is not satisfiable"))
        }
        _ => Error::Network(detail),
    }
}
