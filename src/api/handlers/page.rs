use axum::response::Html;

const INDEX_HTML: &str = include_str!("../index.html");

/// Serve the upload form.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
