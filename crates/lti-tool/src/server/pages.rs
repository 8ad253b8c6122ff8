//! HTML pages for the info, launch and error views.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::config::Config;
use crate::lti::{DeepLinkResponse, MessageLaunch};
use crate::models::LaunchSummary;

const STYLE: &str = r#"<style>
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #f5f5f5; margin: 0; padding: 32px 16px; color: #333; }
.card { background: #fff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); padding: 32px; max-width: 720px; margin: 0 auto; }
h1 { font-size: 22px; margin: 0 0 8px; }
h2 { font-size: 16px; margin: 24px 0 8px; }
.subtitle { color: #666; font-size: 14px; margin: 0 0 16px; }
table { border-collapse: collapse; width: 100%; font-size: 14px; }
td { border-bottom: 1px solid #eee; padding: 6px 8px; vertical-align: top; }
td:first-child { color: #666; width: 35%; }
code { background: #f0f0f0; padding: 1px 4px; border-radius: 3px; }
.error { background: #fee; border: 1px solid #c00; color: #c00; padding: 10px; border-radius: 4px; }
button { padding: 10px 16px; background: #4a90d9; color: #fff; border: none; border-radius: 4px; font-size: 14px; cursor: pointer; }
</style>"#;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
{STYLE}
</head>
<body>
<div class="card">
{body}
</div>
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn rows(pairs: &[(&str, &str)]) -> String {
    let rows: String = pairs
        .iter()
        .map(|(k, v)| format!("<tr><td>{}</td><td>{}</td></tr>\n", html_escape(k), html_escape(v)))
        .collect();
    format!("<table>\n{rows}</table>")
}

/// Info page served at `/`.
#[must_use]
pub fn render_index(config: &Config, registrations: usize) -> String {
    let endpoints = rows(&[
        ("OIDC login", config.url_for("/login").as_str()),
        ("Launch", config.url_for("/launch").as_str()),
        ("JWKS", config.url_for("/jwks").as_str()),
        ("Configuration", config.url_for("/configure").as_str()),
        ("Platform", config.platform_base_url.as_str()),
        ("Registered platforms", registrations.to_string().as_str()),
    ]);

    page(
        &config.tool_name,
        &format!(
            "<h1>{name}</h1>\n<p class=\"subtitle\">{description}</p>\n<h2>Endpoints</h2>\n{endpoints}",
            name = html_escape(&config.tool_name),
            description = html_escape(&config.tool_description),
        ),
    )
}

/// Result page after a successful launch.
#[must_use]
pub fn render_launch(
    config: &Config,
    launch: &MessageLaunch,
    summary: &LaunchSummary,
    deep_link: Option<&DeepLinkResponse>,
) -> String {
    let user = &summary.user;
    let course = &summary.course;
    let roles = user.roles.join(", ");

    let mut body = format!(
        "<h1>Welcome, {name}</h1>\n<p class=\"subtitle\">{tool}</p>\n",
        name = html_escape(&user.name),
        tool = html_escape(&config.tool_name),
    );

    body.push_str("<h2>User</h2>\n");
    body.push_str(&rows(&[
        ("User ID", user.user_id.as_str()),
        ("Email", user.email.as_str()),
        ("Roles", roles.as_str()),
        ("Primary role", user.primary_role.as_str()),
    ]));

    body.push_str("\n<h2>Course</h2>\n");
    body.push_str(&rows(&[
        ("Course ID", course.course_id.as_str()),
        ("Title", course.course_title.as_str()),
        ("Label", course.course_label.as_str()),
        ("Resource", summary.resource.resource_id.as_str()),
    ]));

    let launch_kind = if launch.is_deep_link_launch() { "Deep linking" } else { "Resource link" };
    body.push_str("\n<h2>Launch</h2>\n");
    body.push_str(&rows(&[
        ("Launch ID", launch.launch_id.as_str()),
        ("Type", launch_kind),
        ("Platform", summary.platform.name.as_str()),
        ("Grade passback", if launch.has_ags() { "available" } else { "not available" }),
        ("Roster access", if launch.has_nrps() { "available" } else { "not available" }),
    ]));

    if !summary.custom_params.is_empty() {
        let custom: Vec<(String, String)> = summary
            .custom_params
            .iter()
            .map(|(k, v)| (k.clone(), v.as_str().map_or_else(|| v.to_string(), str::to_string)))
            .collect();
        let custom: Vec<(&str, &str)> = custom.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        body.push_str("\n<h2>Custom parameters</h2>\n");
        body.push_str(&rows(&custom));
    }

    if let Some(response) = deep_link {
        body.push_str(&format!(
            r#"
<h2>Add to course</h2>
<form method="POST" action="{action}">
<input type="hidden" name="JWT" value="{jwt}">
<button type="submit">Add {tool}</button>
</form>"#,
            action = html_escape(&response.return_url),
            jwt = html_escape(&response.jwt),
            tool = html_escape(&config.tool_name),
        ));
    }

    page(&config.tool_name, &body)
}

/// Error page body.
#[must_use]
pub fn render_error(message: &str, details: Option<&str>) -> String {
    let details = details
        .map(|d| format!("\n<p class=\"subtitle\">{}</p>", html_escape(d)))
        .unwrap_or_default();
    page(
        "Error",
        &format!("<h1>Error</h1>\n<div class=\"error\">{}</div>{details}", html_escape(message)),
    )
}

/// An HTML error response.
#[derive(Debug)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ErrorPage {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }

    /// Attach `details` when `expose` is set.
    #[must_use]
    pub fn with_details(mut self, expose: bool, details: impl ToString) -> Self {
        if expose {
            self.details = Some(details.to_string());
        }
        self
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Page Not Found")
            .with_details(true, "The requested page could not be found.")
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        (self.status, Html(render_error(&self.message, self.details.as_deref()))).into_response()
    }
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
