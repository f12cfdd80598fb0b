//! Static HTML pages, rendered from Handlebars templates compiled into the binary.

use handlebars::Handlebars;
use serde_json::json;

const HEADER: &str = include_str!("../templates/header.hbs");
const FOOTER: &str = include_str!("../templates/footer.hbs");

/// A page served by the tutor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Index,
    Assignment,
    Feedback,
    Contact,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Index, Page::Assignment, Page::Feedback, Page::Contact];

    pub fn name(self) -> &'static str {
        match self {
            Page::Index => "index",
            Page::Assignment => "assignment",
            Page::Feedback => "feedback",
            Page::Contact => "contact",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Page::Index => "KT Session",
            Page::Assignment => "Assignment",
            Page::Feedback => "Feedback",
            Page::Contact => "Contact",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Page::Index => include_str!("../templates/index.hbs"),
            Page::Assignment => include_str!("../templates/assignment.hbs"),
            Page::Feedback => include_str!("../templates/feedback.hbs"),
            Page::Contact => include_str!("../templates/contact.hbs"),
        }
    }
}

/// Template registry for every [`Page`].
#[derive(Debug)]
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_partial("header", HEADER)?;
        registry.register_partial("footer", FOOTER)?;
        for page in Page::ALL {
            registry.register_template_string(page.name(), page.template())?;
        }
        Ok(Self { registry })
    }

    pub fn render(&self, page: Page) -> Result<String, handlebars::RenderError> {
        let data = json!({
            "page": page.name(),
            "title": page.title(),
            "version": env!("CARGO_PKG_VERSION"),
        });
        self.registry.render(page.name(), &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_page_renders() {
        let pages = Pages::new().unwrap();
        for page in Page::ALL {
            let html = pages.render(page).unwrap();
            assert!(html.starts_with("<!DOCTYPE html>"), "{}", page.name());
            assert!(html.contains(&format!("<title>{} | KT Tutor</title>", page.title())));
            assert!(html.contains(env!("CARGO_PKG_VERSION")));
            assert!(html.trim_end().ends_with("</html>"));
        }
    }

    #[test]
    fn nav_marks_current_page() {
        let pages = Pages::new().unwrap();
        let html = pages.render(Page::Feedback).unwrap();
        assert!(html.contains(r#"<a href="/feedback" class="active">"#));
        assert!(!html.contains(r#"<a href="/" class="active">"#));
    }

    #[test]
    fn index_drives_the_api() {
        let html = Pages::new().unwrap().render(Page::Index).unwrap();
        assert!(html.contains(r#"fetch("/projects")"#));
        assert!(html.contains(r#"post("/start""#));
        assert!(html.contains(r#"post("/reply""#));
    }
}
