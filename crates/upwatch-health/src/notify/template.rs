//! Subject and body templates, compiled into the binary.

use askama::Template;

use upwatch_state::Service;

use super::{Notification, NotifyError};

#[derive(Template)]
#[template(path = "notify_subject.txt")]
struct SubjectTemplate<'a> {
    prefix: &'a str,
    down: &'a [Service],
    up: &'a [Service],
}

#[derive(Template)]
#[template(path = "notify_body.txt")]
struct BodyTemplate<'a> {
    down: &'a [Service],
    up: &'a [Service],
}

/// Render `(subject, body)` for a notification.
pub fn render(prefix: &str, notification: &Notification) -> Result<(String, String), NotifyError> {
    let subject = SubjectTemplate {
        prefix,
        down: &notification.down,
        up: &notification.up,
    }
    .render()?;
    let body = BodyTemplate {
        down: &notification.down,
        up: &notification.up,
    }
    .render()?;
    Ok((subject.trim().to_string(), body.trim().to_string()))
}
