//! HTML rendering for popups, list rows and panel states
//!
//! All markup is assembled through [`Markup`], which escapes text and
//! attribute values as they are pushed. Tag names, attribute names and the
//! fixed template fragments are `'static` and come from this crate only.

use std::fmt;

use crate::models::Venue;

/// Escape the five HTML-significant characters `& < > " '`
#[must_use]
pub fn escape_html(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for ch in unsafe_text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// An HTML fragment that only grows through escaping operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn raw(fragment: &'static str) -> Self {
        Self(fragment.to_string())
    }

    /// Append text content, escaped
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.0.push_str(&escape_html(text));
        self
    }

    /// Open `tag` with the given attributes; values are escaped
    pub fn open(&mut self, tag: &'static str, attrs: &[(&'static str, &str)]) -> &mut Self {
        self.0.push('<');
        self.0.push_str(tag);
        for (name, value) in attrs {
            self.0.push(' ');
            self.0.push_str(name);
            self.0.push_str("=\"");
            self.0.push_str(&escape_html(value));
            self.0.push('"');
        }
        self.0.push('>');
        self
    }

    pub fn close(&mut self, tag: &'static str) -> &mut Self {
        self.0.push_str("</");
        self.0.push_str(tag);
        self.0.push('>');
        self
    }

    /// `<tag attrs>text</tag>`
    pub fn element(
        &mut self,
        tag: &'static str,
        attrs: &[(&'static str, &str)],
        text: &str,
    ) -> &mut Self {
        self.open(tag, attrs).text(text).close(tag)
    }

    /// Append another already-built fragment
    pub fn push(&mut self, other: &Markup) -> &mut Self {
        self.0.push_str(&other.0);
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const ICON_SPINNER: &str = r#"<div class="loading-spinner"></div>"#;
const ICON_EMPTY: &str = r#"<i class="fas fa-tennis-ball text-4xl mb-2"></i>"#;
const ICON_ERROR: &str = r#"<i class="fas fa-exclamation-circle text-4xl mb-2"></i>"#;
const ICON_LOCATE: &str = r#"<i class="fas fa-location-arrow mr-2"></i>"#;
const ICON_LOCATING: &str = r#"<i class="fas fa-spinner fa-spin mr-2"></i>"#;

pub const LOADING_TEXT: &str = "Loading courts...";
pub const EMPTY_TEXT: &str = "No courts found in this area.";

/// Marker popup for one venue
#[must_use]
pub fn venue_popup(venue: &Venue, booking_prefix: &str) -> Markup {
    let href = venue.booking_path(booking_prefix);
    let price = venue.price_label();
    let mut markup = Markup::new();
    markup
        .open("div", &[("class", "text-center")])
        .element("h3", &[("class", "font-medium")], &venue.name)
        .element("p", &[("class", "text-sm text-gray-600")], &venue.address)
        .element(
            "p",
            &[("class", "text-sm font-medium mt-2")],
            &price,
        )
        .element(
            "a",
            &[
                ("href", href.as_str()),
                ("class", "inline-block mt-2 px-4 py-2 bg-indigo-600 text-white text-sm font-medium rounded"),
            ],
            "Book Court",
        )
        .close("div");
    markup
}

/// List panel row for one venue
#[must_use]
pub fn venue_row(venue: &Venue, booking_prefix: &str) -> Markup {
    let href = venue.booking_path(booking_prefix);
    let price = venue.price_label();
    let mut markup = Markup::new();
    markup
        .open("div", &[("class", "court-item border-b border-gray-200 pb-4")])
        .open("div", &[("class", "flex justify-between items-start")])
        .open("div", &[])
        .element("h3", &[("class", "text-lg font-medium text-gray-900")], &venue.name)
        .element("p", &[("class", "text-sm text-gray-600")], &venue.address)
        .element(
            "p",
            &[("class", "text-sm font-medium text-gray-900 mt-1")],
            &price,
        )
        .close("div")
        .element(
            "a",
            &[
                ("href", href.as_str()),
                ("class", "inline-flex items-center px-3 py-1.5 text-sm font-medium rounded-md text-white bg-indigo-600"),
            ],
            "Book",
        )
        .close("div")
        .close("div");
    markup
}

fn notice(class: &'static str, icon: &'static str, message: &str) -> Markup {
    let mut markup = Markup::new();
    markup
        .open("div", &[("class", class)])
        .push(&Markup::raw(icon))
        .element("p", &[], message)
        .close("div");
    markup
}

#[must_use]
pub fn loading_panel() -> Markup {
    let mut markup = Markup::new();
    markup
        .open("div", &[("class", "text-center text-gray-500 py-4")])
        .push(&Markup::raw(ICON_SPINNER))
        .element("p", &[("class", "mt-2")], LOADING_TEXT)
        .close("div");
    markup
}

#[must_use]
pub fn empty_panel() -> Markup {
    notice("text-center text-gray-500 py-4", ICON_EMPTY, EMPTY_TEXT)
}

#[must_use]
pub fn error_panel(message: &str) -> Markup {
    notice("text-center text-red-500 py-4", ICON_ERROR, message)
}

/// The location control, `busy` swaps in the spinner icon
#[must_use]
pub fn location_button(label: &str, enabled: bool, busy: bool) -> Markup {
    let mut attrs: Vec<(&'static str, &str)> =
        vec![("type", "button"), ("class", "location-button")];
    if !enabled {
        attrs.push(("disabled", "disabled"));
    }
    let mut markup = Markup::new();
    markup
        .open("button", &attrs)
        .push(&Markup::raw(if busy { ICON_LOCATING } else { ICON_LOCATE }))
        .text(label)
        .close("button");
    markup
}

/// Wrap `body` into a complete HTML document
#[must_use]
pub fn document(title: &str, body: &Markup) -> Markup {
    let mut markup = Markup::raw("<!DOCTYPE html>");
    markup
        .open("html", &[("lang", "en")])
        .open("head", &[])
        .push(&Markup::raw(r#"<meta charset="utf-8">"#))
        .element("title", &[], title)
        .close("head")
        .open("body", &[])
        .push(body)
        .close("body")
        .close("html");
    markup
}
