use axum::response::Html;

/// The fixed confirmation page sent back to the browser.
///
/// If the tab was opened programmatically from another page, the opener is
/// told that a token check should happen; either way the page tries to close
/// itself shortly after so the user lands back in the application.
pub(crate) const REDIRECT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Authorization complete</title>
</head>
<body>
    <h1>Authorization complete</h1>
    <p>You can return to the application. This window will close itself.</p>
    <script>
        if (window.opener) {
            window.opener.postMessage("oauth-loopback:check-token", "*");
        }
        setTimeout(function () { window.close(); }, 1500);
    </script>
</body>
</html>
"#;

/// Render the confirmation page as an HTTP response body with
/// `content-type: text/html; charset=utf-8`.
pub(crate) fn render() -> Html<&'static str> {
    Html(REDIRECT_PAGE)
}
