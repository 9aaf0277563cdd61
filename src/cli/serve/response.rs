//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::listing::render_listing;
use crate::utils::mime::{HTML, PLAIN};

/// Respond with a static file.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        let len = fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        return send_head(request, 200, content_type, len);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// Respond with a generated directory listing.
pub fn respond_listing(request: Request, dir: &Path, display_path: &str) -> Result<()> {
    let body = render_listing(dir, display_path)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    if is_head_request(&request) {
        return send_head(request, 200, HTML, body.len() as u64);
    }
    send_body(request, 200, HTML, body.into_bytes())
}

/// Respond with 301 to `location` (directory without trailing slash).
pub fn respond_redirect(request: Request, location: &str) -> Result<()> {
    let response = Response::empty(StatusCode(301))
        .with_header(make_header("Location", location)?)
        .with_header(make_header("Content-Length", "0")?);
    request.respond(response)?;
    Ok(())
}

/// Respond with 404 Not Found.
pub fn respond_not_found(request: Request) -> Result<()> {
    respond_status(request, 404, "404 Not Found")
}

/// Respond with 405 for anything but GET/HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN)?)
        .with_header(make_header("Allow", "GET, HEAD")?);
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    respond_status(request, 503, "503 Service Unavailable")
}

fn respond_status(request: Request, status: u16, text: &'static str) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, status, PLAIN, text.len() as u64);
    }
    send_body(request, status, PLAIN, text.as_bytes().to_vec())
}

pub fn is_allowed_method(method: &Method) -> bool {
    matches!(method, Method::Get | Method::Head)
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str, len: u64) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Content-Length", &len.to_string())?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn make_header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("invalid header {name}: {value}"))
}
