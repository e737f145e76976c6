//! Content-negotiated error pages.
//!
//! The representation follows the client's most preferred `Accept` media
//! range: `text/html` gets an HTML page, any other `text/*` gets plain text,
//! everything else (including no `Accept`) gets the JSON array
//! `[status, message]`.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    Html,
    Text,
    Json,
}

/// Pick the error representation for an `Accept` header.
pub fn negotiate(headers: &HeaderMap) -> ErrorFormat {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return ErrorFormat::Json;
    };

    let mut best: Option<(&str, f32)> = None;
    for range in accept.split(',') {
        let mut params = range.split(';');
        let media = params.next().unwrap_or_default().trim();
        if media.is_empty() {
            continue;
        }
        let q = params
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);
        if q > 0.0 && best.map_or(true, |(_, best_q)| q > best_q) {
            best = Some((media, q));
        }
    }

    match best.map(|(media, _)| media.to_ascii_lowercase()) {
        Some(media) if media == "text/html" => ErrorFormat::Html,
        Some(media) if media.starts_with("text/") => ErrorFormat::Text,
        _ => ErrorFormat::Json,
    }
}

/// Render an error page for `status` and `message`.
pub fn render(status: StatusCode, message: &str, headers: &HeaderMap) -> Response {
    let code = status.as_u16();
    let (content_type, body) = match negotiate(headers) {
        ErrorFormat::Html => {
            let title = format!("{code} - {}", escape_html(message));
            (
                "text/html; charset=utf-8",
                format!(
                    "<html>\n<head><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n</body>\n</html>\n"
                ),
            )
        }
        ErrorFormat::Text => ("text/plain; charset=utf-8", format!("{code} - {message}\n")),
        ErrorFormat::Json => (
            "application/json",
            serde_json::json!([code, message]).to_string(),
        ),
    };

    let mut response = (status, Body::from(body)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Render a [`ClientError`] with its mapped status.
pub fn client_error(err: &ClientError, headers: &HeaderMap) -> Response {
    render(err.status(), &err.to_string(), headers)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_negotiate() {
        assert_eq!(negotiate(&HeaderMap::new()), ErrorFormat::Json);
        assert_eq!(negotiate(&accept("text/html")), ErrorFormat::Html);
        assert_eq!(negotiate(&accept("text/plain")), ErrorFormat::Text);
        assert_eq!(negotiate(&accept("application/json")), ErrorFormat::Json);
        assert_eq!(negotiate(&accept("*/*")), ErrorFormat::Json);
        assert_eq!(
            negotiate(&accept("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")),
            ErrorFormat::Html
        );
        assert_eq!(
            negotiate(&accept("text/html;q=0.5, application/json")),
            ErrorFormat::Json
        );
    }

    #[tokio::test]
    async fn test_render_bodies() {
        let res = render(StatusCode::NOT_FOUND, "a <b>", &accept("text/html"));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(std::str::from_utf8(&body).unwrap().contains("404 - a &lt;b&gt;"));

        let res = render(StatusCode::BAD_REQUEST, "oops", &HeaderMap::new());
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"[400,"oops"]"#);

        let res = render(StatusCode::BAD_REQUEST, "oops", &accept("text/plain"));
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"400 - oops\n");
    }
}
