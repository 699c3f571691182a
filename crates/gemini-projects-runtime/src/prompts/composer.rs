//! Inserting prompt text into the host composer.

use gemini_projects_dom::{AnchorResolver, Document, TextSelection};
use regex::Regex;
use tracing::{debug, warn};

/// Char offsets of the first `{{placeholder}}` in `content`.
fn placeholder_span(content: &str) -> Result<Option<(usize, usize)>, regex::Error> {
    let re = Regex::new(r"\{\{(.*?)\}\}")?;
    Ok(re
        .find(content)
        .map(|m| (content[..m.start()].chars().count(), content[..m.end()].chars().count())))
}

/// Append `text` to the composer and select the first `{{placeholder}}`, or
/// put the caret at the end. Returns false when no usable composer exists.
pub fn insert_prompt(doc: &mut Document, resolver: &AnchorResolver, text: &str) -> bool {
    let Some(composer) = resolver.find_composer(doc) else {
        warn!("no composer found");
        return false;
    };
    doc.focus(composer);

    let content = format!("{}{}", doc.node(composer).own_text(), text);
    doc.set_text(composer, &content);

    let span = match placeholder_span(&content) {
        Ok(span) => span,
        Err(e) => {
            warn!(error = %e, "placeholder pattern rejected");
            None
        }
    };
    let (start, end) = span.unwrap_or_else(|| {
        let len = content.chars().count();
        (len, len)
    });
    doc.set_selection(Some(TextSelection {
        node: composer,
        start,
        end,
    }));
    debug!(%composer, chars = text.chars().count(), "prompt inserted");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_projects_config::Config;
    use gemini_projects_dom::fixtures::FixtureBuilder;
    use gemini_projects_dom::Matcher;

    fn resolver() -> AnchorResolver {
        AnchorResolver::new(&Config::default(), Matcher::default())
    }

    #[test]
    fn test_selects_first_placeholder() {
        let fx = FixtureBuilder::new().with_composer().build();
        let editor = fx.composer.unwrap().editor;
        let mut doc = fx.doc;

        assert!(insert_prompt(&mut doc, &resolver(), "Translate {{text}} into {{language}}"));
        assert_eq!(doc.node(editor).own_text(), "Translate {{text}} into {{language}}");
        assert_eq!(doc.active_element(), Some(editor));
        assert_eq!(
            doc.selection(),
            Some(TextSelection {
                node: editor,
                start: 10,
                end: 18,
            })
        );
    }

    #[test]
    fn test_appends_and_places_caret_at_end() {
        let fx = FixtureBuilder::new().with_composer().build();
        let editor = fx.composer.unwrap().editor;
        let mut doc = fx.doc;
        doc.set_text(editor, "héllo ");

        assert!(insert_prompt(&mut doc, &resolver(), "wörld"));
        assert_eq!(doc.node(editor).own_text(), "héllo wörld");
        assert_eq!(
            doc.selection(),
            Some(TextSelection {
                node: editor,
                start: 11,
                end: 11,
            })
        );
    }

    #[test]
    fn test_placeholder_span() {
        assert_eq!(placeholder_span("a {{b}} {{c}}").unwrap(), Some((2, 7)));
        assert_eq!(placeholder_span("ü {{x}}").unwrap(), Some((2, 7)));
        assert_eq!(placeholder_span("{{ unclosed").unwrap(), None);
        assert_eq!(placeholder_span("{{}}").unwrap(), Some((0, 4)));
    }

    #[test]
    fn test_no_composer() {
        let mut doc = FixtureBuilder::new().build().doc;
        assert!(!insert_prompt(&mut doc, &resolver(), "hello"));
        assert_eq!(doc.selection(), None);
    }
}
