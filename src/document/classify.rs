//! Classifier contract: host element description to box kind

use super::{BoxKind, BoxSpec};
use smallvec::SmallVec;

/// Host-side description of an element, as seen before measurement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementInfo {
    /// Lowercase tag name
    pub tag: String,
    /// Class names
    pub classes: SmallVec<[String; 4]>,
    /// Resolved `break-inside: avoid`
    pub avoid_break_inside: bool,
    /// Resolved `break-before: page`
    pub break_before_page: bool,
}

impl ElementInfo {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Outcome of classifying one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: BoxKind,
    pub keep_together: bool,
    pub force_break_before: bool,
    pub heading_level: Option<u8>,
}

impl Classification {
    /// Start a box spec carrying this classification; the measurer fills
    /// in the lengths.
    pub fn to_spec(&self, height: f32) -> BoxSpec {
        BoxSpec {
            keep_together: self.keep_together,
            force_break_before: self.force_break_before,
            heading_level: self.heading_level,
            ..BoxSpec::new(self.kind, height)
        }
    }
}

/// Maps host elements to box kinds.
///
/// The pagination core never inspects tags itself; it only consumes the
/// kind and flags a classifier produced.
pub trait Classifier {
    fn classify(&self, element: &ElementInfo) -> Classification;
}

/// Reference classifier for HTML-like content
#[derive(Debug, Clone)]
pub struct TagClassifier {
    /// Start every level-1 heading on a fresh page
    pub break_before_h1: bool,
    /// Class that marks a keep-together block
    pub keep_together_class: String,
    /// Class that requests a page break before the element
    pub page_break_class: String,
}

impl Default for TagClassifier {
    fn default() -> Self {
        Self {
            break_before_h1: true,
            keep_together_class: "keep-together".to_string(),
            page_break_class: "page-break-before".to_string(),
        }
    }
}

impl TagClassifier {
    fn kind_for_tag(tag: &str) -> BoxKind {
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => BoxKind::HeadingGroup,
            "p" | "blockquote" | "li" | "dd" | "address" => BoxKind::Prose,
            "pre" | "code" => BoxKind::LineBased,
            "ul" | "ol" | "menu" => BoxKind::SemanticSequence,
            "table" => BoxKind::Table,
            "dl" | "figure" => BoxKind::SemanticPair,
            "div" | "section" | "article" | "main" | "aside" | "header" | "footer" | "nav"
            | "tbody" | "details" => BoxKind::Container,
            _ => BoxKind::Atomic,
        }
    }
}

impl Classifier for TagClassifier {
    fn classify(&self, element: &ElementInfo) -> Classification {
        let kind = Self::kind_for_tag(&element.tag);
        let heading_level = match kind {
            BoxKind::HeadingGroup => element.tag[1..].parse::<u8>().ok(),
            _ => None,
        };

        Classification {
            kind,
            keep_together: element.avoid_break_inside
                || element.has_class(&self.keep_together_class),
            force_break_before: element.break_before_page
                || element.has_class(&self.page_break_class)
                || (self.break_before_h1 && heading_level == Some(1)),
            heading_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_kinds() {
        let classifier = TagClassifier::default();
        let kind = |tag: &str| classifier.classify(&ElementInfo::new(tag)).kind;

        assert_eq!(kind("P"), BoxKind::Prose);
        assert_eq!(kind("pre"), BoxKind::LineBased);
        assert_eq!(kind("ol"), BoxKind::SemanticSequence);
        assert_eq!(kind("table"), BoxKind::Table);
        assert_eq!(kind("figure"), BoxKind::SemanticPair);
        assert_eq!(kind("section"), BoxKind::Container);
        assert_eq!(kind("img"), BoxKind::Atomic);
    }

    #[test]
    fn test_heading_flags() {
        let classifier = TagClassifier::default();

        let h1 = classifier.classify(&ElementInfo::new("h1"));
        assert_eq!(h1.kind, BoxKind::HeadingGroup);
        assert_eq!(h1.heading_level, Some(1));
        assert!(h1.force_break_before);

        let h3 = classifier.classify(&ElementInfo::new("h3"));
        assert_eq!(h3.heading_level, Some(3));
        assert!(!h3.force_break_before);

        let spec = h1.to_spec(48.0);
        assert_eq!(spec.kind, BoxKind::HeadingGroup);
        assert_eq!(spec.heading_level, Some(1));
        assert!(spec.force_break_before);
        assert_eq!(spec.height, 48.0);
    }

    #[test]
    fn test_keep_together_signals() {
        let classifier = TagClassifier::default();

        let by_class = classifier.classify(&ElementInfo::new("div").with_class("keep-together"));
        assert!(by_class.keep_together);

        let by_style = classifier.classify(&ElementInfo {
            avoid_break_inside: true,
            ..ElementInfo::new("p")
        });
        assert!(by_style.keep_together);
        assert!(!classifier.classify(&ElementInfo::new("p")).keep_together);
    }
}
