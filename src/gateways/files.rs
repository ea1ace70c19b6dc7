//! Static file serving.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::http::response;
use crate::routing::matcher;
use crate::routing::{handler, Gateway, MountContext, RouteDescriptor, RouteMatch, Router, RouterError};

/// Serves files below a root directory for every path under its prefix.
pub struct FileGateway {
    label: String,
    description: String,
    root: PathBuf,
}

impl FileGateway {
    pub fn new(label: impl Into<String>, description: Option<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            description: description.unwrap_or_else(|| "Serves static files".to_string()),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl Gateway for FileGateway {
    fn label(&self) -> &str {
        &self.label
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn register_handlers(&self, ctx: &MountContext, router: &Router) -> Result<(), RouterError> {
        let root = self.root.clone();
        router.add_handler(
            ctx,
            RouteDescriptor::default()
                .methods([Method::GET, Method::HEAD])
                .describe("Serve files"),
            handler(move |req: Request<Body>, m: RouteMatch| {
                let root = root.clone();
                async move { serve_file(root, req, m).await }
            }),
        )?;
        Ok(())
    }
}

/// Characters escaped when a decoded remainder has to be turned back into a URI path.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Hand the request to `ServeDir` with its path rewritten to the remainder under the prefix.
async fn serve_file(root: PathBuf, req: Request<Body>, m: RouteMatch) -> Response {
    let (mut parts, body) = req.into_parts();
    let raw_path = parts.uri.path();

    // ServeDir decodes on its own, so hand it the still-encoded remainder
    let mut target = raw_remainder(raw_path, &m.prefix)
        .unwrap_or_else(|| utf8_percent_encode(&m.path, PATH_ESCAPE).to_string());
    // a directory is only served its index when the path ends in a separator
    if raw_path.ends_with('/') && !target.ends_with('/') {
        target.push('/');
    }
    if let Some(query) = parts.uri.query() {
        target.push('?');
        target.push_str(query);
    }

    match target.parse::<Uri>() {
        Ok(uri) => parts.uri = uri,
        Err(e) => {
            tracing::warn!(error = %e, "Could not rewrite file request URI");
            return response::error_response(StatusCode::BAD_REQUEST);
        }
    }

    let mut res = match ServeDir::new(root).oneshot(Request::from_parts(parts, body)).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    };
    if res.status().is_redirection() {
        remount_location(&mut res, &m.prefix);
    }
    res
}

/// Remainder of the undecoded request path below `prefix`, normalized.
///
/// `None` if the raw path spells the prefix differently, e.g. with escapes.
fn raw_remainder(raw_path: &str, prefix: &str) -> Option<String> {
    let path = matcher::normalize_path(raw_path, false);
    if prefix == "/" {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    Some(matcher::normalize_path(rest, false))
}

/// Put the mount prefix back on an absolute `Location` built from the rewritten path.
fn remount_location(res: &mut Response, prefix: &str) {
    if prefix == "/" {
        return;
    }
    let location = match res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()) {
        Some(location) if location.starts_with('/') => format!("{}{}", prefix, location),
        _ => return,
    };
    match HeaderValue::from_str(&location) {
        Ok(value) => {
            res.headers_mut().insert(header::LOCATION, value);
        }
        Err(e) => tracing::warn!(error = %e, "Could not rewrite redirect location"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_with_file() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("a.txt"), "nested").unwrap();
        std::fs::write(dir.path().join("sub").join("index.html"), "sub index").unwrap();
        std::fs::write(dir.path().join("my file.txt"), "spaced").unwrap();
        dir
    }

    async fn get_response(router: &Router, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router.dispatch(req).await
    }

    async fn get(router: &Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let res = router.dispatch(req).await;
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_serves_files_under_prefix() {
        let dir = dir_with_file();
        let router = Router::new("test");
        router
            .mount_gateway("/static", &FileGateway::new("files", None, dir.path()))
            .unwrap();

        let (status, body) = get(&router, Method::GET, "/static/hello.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"hello world");

        let (status, body) = get(&router, Method::GET, "/static/sub/a.txt?v=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"nested");

        let (status, _) = get(&router, Method::GET, "/static/missing.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(&router, Method::POST, "/static/hello.txt").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_prefix_boundary() {
        let dir = dir_with_file();
        let router = Router::new("test");
        router
            .mount_gateway("/static", &FileGateway::new("files", None, dir.path()))
            .unwrap();

        let (status, _) = get(&router, Method::GET, "/statichello.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_nested_directory_index() {
        let dir = dir_with_file();
        let router = Router::new("test");
        router
            .mount_gateway("/static", &FileGateway::new("files", None, dir.path()))
            .unwrap();

        let (status, body) = get(&router, Method::GET, "/static/sub/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"sub index");

        let res = get_response(&router, "/static/sub").await;
        assert!(res.status().is_redirection());
        assert_eq!(res.headers()[header::LOCATION], "/static/sub/");

        let res = get_response(&router, "/static/sub?v=2").await;
        assert_eq!(res.headers()[header::LOCATION], "/static/sub/?v=2");
    }

    #[tokio::test]
    async fn test_root_mount_redirect_untouched() {
        let dir = dir_with_file();
        let router = Router::new("test");
        router
            .mount_gateway("/", &FileGateway::new("files", None, dir.path()))
            .unwrap();

        let res = get_response(&router, "/sub").await;
        assert!(res.status().is_redirection());
        assert_eq!(res.headers()[header::LOCATION], "/sub/");

        let (status, body) = get(&router, Method::GET, "/sub/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"sub index");
    }

    #[tokio::test]
    async fn test_encoded_paths() {
        let dir = dir_with_file();
        let router = Router::new("test");
        router
            .mount_gateway("/static", &FileGateway::new("files", None, dir.path()))
            .unwrap();

        let (status, body) = get(&router, Method::GET, "/static/my%20file.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"spaced");

        // prefix spelled with escapes still lands on the right file
        let (status, body) = get(&router, Method::GET, "/st%61tic/my%20file.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"spaced");
    }

    #[test]
    fn test_raw_remainder() {
        assert_eq!(raw_remainder("/static/a%20b", "/static").as_deref(), Some("/a%20b"));
        assert_eq!(raw_remainder("/static", "/static").as_deref(), Some("/"));
        assert_eq!(raw_remainder("//static//sub/", "/static").as_deref(), Some("/sub"));
        assert_eq!(raw_remainder("/x/y", "/").as_deref(), Some("/x/y"));
        assert_eq!(raw_remainder("/st%61tic/a", "/static"), None);
    }
}
