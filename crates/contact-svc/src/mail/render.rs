//! HTML body of the contact notification.

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the notice sent to the site owner for one submission
pub fn render_notice(name: &str, email: &str, message: &str) -> String {
    format!(
        concat!(
            "<div>",
            "<p>There has been a <strong>New Contact</strong> from the contact form:</p>",
            "<p><table>",
            "<tr><td>Name:</td><td>{}</td></tr>",
            "<tr><td>Email:</td><td>{}</td></tr>",
            "<tr><td>Message:</td><td>{}</td></tr>",
            "</table></p>",
            "<p>Sent by the Contact service.</p>",
            "</div>"
        ),
        escape_html(name),
        escape_html(email),
        escape_html(message),
    )
}
