#![cfg(feature = "web")]

use handlebars::{Handlebars, TemplateError};
use serde::Serialize;

/// Page templates, compiled into the binary
const PAGES: [(&str, &str); 7] = [
    ("index", include_str!("../templates/index.hbs")),
    ("news", include_str!("../templates/news.hbs")),
    ("cases", include_str!("../templates/cases.hbs")),
    ("resources", include_str!("../templates/resources.hbs")),
    ("about", include_str!("../templates/about.hbs")),
    ("statistics", include_str!("../templates/statistics.hbs")),
    ("reviews", include_str!("../templates/reviews.hbs")),
];

const PARTIALS: [(&str, &str); 2] = [
    ("header", include_str!("../templates/header.hbs")),
    ("footer", include_str!("../templates/footer.hbs")),
];

/// Build the template registry used by every page handler
pub fn registry() -> Result<Handlebars<'static>, TemplateError> {
    let mut handlebars = Handlebars::new();

    for (name, source) in PARTIALS {
        handlebars.register_partial(name, source)?;
    }
    for (name, source) in PAGES {
        handlebars.register_template_string(name, source)?;
    }

    Ok(handlebars)
}

/// Serialize `value` for embedding inside a `<script>` element
///
/// `</` is escaped so that text from a data file cannot close the element.
pub fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}
