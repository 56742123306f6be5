use select::node::Node;
use select::predicate::Predicate;

/// A small structural selector evaluated against `select` document nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssSelector {
    /// Matches an HTML tag name (e.g., "title", "a")
    Tag(String),

    /// Matches an attribute existence or specific value
    Attribute { key: String, value: Option<String> },

    /// AND Logic: Matches if ALL sub-selectors match
    And(Vec<CssSelector>),

    /// OR Logic: Matches if ANY sub-selector matches
    Or(Vec<CssSelector>),
}

impl CssSelector {
    pub fn tag(name: &str) -> Self {
        CssSelector::Tag(name.to_string())
    }

    pub fn has_attr(key: &str) -> Self {
        CssSelector::Attribute {
            key: key.to_string(),
            value: None,
        }
    }

    /// `a[href]`
    pub fn links() -> Self {
        CssSelector::And(vec![Self::tag("a"), Self::has_attr("href")])
    }

    /// `h1, h2, h3, h4, h5, h6, p`
    pub fn text_blocks() -> Self {
        CssSelector::Or(
            ["h1", "h2", "h3", "h4", "h5", "h6", "p"]
                .into_iter()
                .map(Self::tag)
                .collect(),
        )
    }

    /// Renders the selector in CSS syntax, for logging.
    pub fn to_css_string(&self) -> String {
        match self {
            CssSelector::Tag(tag) => tag.clone(),
            CssSelector::Attribute { key, value } => match value {
                Some(v) => format!("[{}='{}']", key, v),
                None => format!("[{}]", key),
            },
            CssSelector::And(selectors) => selectors
                .iter()
                .map(|s| s.to_css_string())
                .collect::<Vec<_>>()
                .join(""),
            CssSelector::Or(selectors) => selectors
                .iter()
                .map(|s| s.to_css_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl Predicate for CssSelector {
    fn matches(&self, node: &Node) -> bool {
        match self {
            CssSelector::Tag(tag) => node
                .name()
                .map(|name| name.eq_ignore_ascii_case(tag))
                .unwrap_or(false),
            CssSelector::Attribute { key, value } => match value {
                Some(v) => node.attr(key.as_str()) == Some(v.as_str()),
                None => node.attr(key.as_str()).is_some(),
            },
            CssSelector::And(selectors) => selectors.iter().all(|s| s.matches(node)),
            CssSelector::Or(selectors) => selectors.iter().any(|s| s.matches(node)),
        }
    }
}
