//! Server-rendered pages and the dashboard's client script.

pub const REGISTER_PAGE: &str = include_str!("../templates/register.html");
pub const LOGIN_PAGE: &str = include_str!("../templates/login.html");
pub const CLIENT_SCRIPT: &str = include_str!("../static/browser.js");

const DASHBOARD_TEMPLATE: &str = include_str!("../templates/dashboard.html");

pub fn render_dashboard(username: &str) -> String {
    DASHBOARD_TEMPLATE.replace("{{ username }}", &escape_html(username))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}
