use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shelf_axum::{FormSubmission, JwtIdentity, MaybeUser, ShelfApp, ShelfAxumError, UploadLimits};
use shelf_core::errors::ShelfError;
use shelf_core::{CurrentUser, ShelfConfig};
use tower::ServiceExt;

const BOUNDARY: &str = "----shelfboundary";

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn describe(form: FormSubmission) -> Json<Value> {
    let files: serde_json::Map<String, Value> = form
        .files
        .iter()
        .map(|(name, f)| {
            (
                name.clone(),
                json!({
                    "size": f.size,
                    "valid": f.is_valid(),
                    "mime": f.mime_type(),
                    "exists": f.path().exists(),
                }),
            )
        })
        .collect();
    Json(json!({ "fields": form.fields, "files": files }))
}

fn app(limits: UploadLimits) -> ShelfApp {
    let router = Router::new()
        .route("/form", post(describe))
        .route(
            "/boom",
            get(|| async { Err::<(), ShelfAxumError>(anyhow::anyhow!("boom").into()) }),
        )
        .route(
            "/missing",
            get(|| async {
                Err::<(), ShelfAxumError>(ShelfError::not_found("No such book").into_anyhow().into())
            }),
        )
        .route(
            "/whoami",
            get(|MaybeUser(user): MaybeUser| async move {
                Json(json!({ "user": user.map(|u| u.name) }))
            }),
        )
        .with_state(limits);

    ShelfApp::new(ShelfConfig::new()).merge(router)
}

#[tokio::test]
async fn non_shelf_errors_map_to_general_error() {
    let ax = app(UploadLimits::default()).with_request_tracing();

    let res = ax
        .router
        .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert_eq!(body["className"], "general-error");
    assert!(body["message"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn shelf_errors_keep_their_status() {
    let ax = app(UploadLimits::default());

    let res = ax
        .router
        .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 404);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotFound");
    assert_eq!(body["message"], "No such book");
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let ax = app(UploadLimits::default()).with_request_tracing();
    let provided = HeaderValue::from_static("req-test-123");

    let res = ax
        .router
        .oneshot(
            Request::builder()
                .uri("/boom")
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn urlencoded_forms_have_no_files() {
    let ax = app(UploadLimits::default());

    let res = ax
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("title=Dune&author=Frank+Herbert"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["fields"]["author"], "Frank Herbert");
    assert_eq!(body["files"], json!({}));
}

#[tokio::test]
async fn multipart_files_are_spooled_and_validated() {
    let ax = app(UploadLimits::default());
    let body = multipart(&[
        ("title", None, &b"Dune"[..]),
        ("image", Some("cover.png"), &b"\x89PNG data"[..]),
        ("empty", Some("blank.png"), &b""[..]),
    ]);

    let res = ax
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["fields"]["title"], "Dune");
    assert_eq!(body["files"]["image"]["size"], 9);
    assert_eq!(body["files"]["image"]["valid"], true);
    assert_eq!(body["files"]["image"]["mime"], "image/png");
    assert_eq!(body["files"]["image"]["exists"], true);
    assert_eq!(body["files"]["empty"]["valid"], false);
}

#[tokio::test]
async fn file_type_comes_from_content_not_the_declared_header() {
    let ax = app(UploadLimits::default());
    // declared image/png by the helper, but JPEG magic bytes
    let jpeg = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00 rest of the image";
    let body = multipart(&[
        ("image", Some("cover.png"), &jpeg[..]),
        ("notes", Some("notes.png"), &b"plain text"[..]),
    ]);

    let res = ax
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["files"]["image"]["mime"], "image/jpeg");
    // nothing recognizable, so the declared type stands
    assert_eq!(body["files"]["notes"]["mime"], "image/png");
}

#[tokio::test]
async fn oversized_file_is_kept_but_invalid() {
    let limits = UploadLimits {
        max_file_bytes: 4,
        max_body_bytes: 4096,
    };
    let ax = app(limits);
    let body = multipart(&[("image", Some("cover.png"), &b"way too large"[..])]);

    let res = ax
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["files"]["image"]["valid"], false);
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let limits = UploadLimits {
        max_file_bytes: 4,
        max_body_bytes: 64,
    };
    let ax = app(limits);
    let big = vec![b'x'; 1024];
    let body = multipart(&[("image", Some("cover.png"), &big[..])]);

    let res = ax
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 413);
    let body = json_body(res).await;
    assert_eq!(body["name"], "PayloadTooLarge");
}

#[tokio::test]
async fn identity_middleware_exposes_current_user() {
    let jwt = JwtIdentity::new("secret");
    let token = jwt.issue(&CurrentUser::new("1", "Ada"), 60).unwrap();
    let ax = app(UploadLimits::default()).with_identity(Arc::new(jwt));

    let res = ax
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(res).await["user"], "Ada");

    let res = ax
        .router
        .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(res).await["user"], Value::Null);
}
