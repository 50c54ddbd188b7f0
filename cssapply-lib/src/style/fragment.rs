/// Selector a resolver emits for a utility with no selector of its own: the
/// escaped `-` alias class.
pub const EMPTY_SELECTOR: &str = ".\\-";

/// One resolved piece of a utility class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityFragment {
    /// Cascade order among fragments of different classes; lower sorts first.
    pub priority: u32,
    /// Selector carrying the pseudo-classes to add, e.g. `.\-:hover`.
    pub selector: Option<String>,
    /// Declarations, e.g. `color:red;`.
    pub body: String,
    /// Wrapping at-rule prelude, e.g. `@media (min-width: 640px)`.
    pub parent: Option<String>,
}

impl UtilityFragment {
    /// Empty selector or parent strings are stored as `None`.
    pub fn new(priority: u32, selector: Option<&str>, body: &str, parent: Option<&str>) -> Self {
        UtilityFragment {
            priority,
            selector: selector.filter(|s| !s.is_empty()).map(str::to_string),
            body: body.to_string(),
            parent: parent.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }
}

/// Fragments sharing one selector and parent, bodies concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedFragment {
    pub selector: Option<String>,
    pub body: String,
    pub parent: Option<String>,
}

/// How a merged fragment is written back into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentShape<'a> {
    /// Declarations placed where the directive was.
    Plain,
    /// A sibling rule whose selectors gain the pseudo-classes of this selector.
    SelectorQualified(&'a str),
    /// A sibling at-rule with this prelude wrapping a copy of the rule.
    ParentWrapped(&'a str),
}

impl MergedFragment {
    pub fn shape(&self) -> FragmentShape<'_> {
        if let Some(parent) = present(&self.parent) {
            return FragmentShape::ParentWrapped(parent);
        }
        match present(&self.selector) {
            Some(selector) if selector != EMPTY_SELECTOR => {
                FragmentShape::SelectorQualified(selector)
            }
            _ => FragmentShape::Plain,
        }
    }

    /// Whether `fragment` belongs in this group. Empty strings count as absent.
    pub fn same_target(&self, fragment: &UtilityFragment) -> bool {
        present(&self.selector) == present(&fragment.selector)
            && present(&self.parent) == present(&fragment.parent)
    }

    /// Append another body, keeping declarations `;`-separated.
    pub fn append_body(&mut self, body: &str) {
        let current = self.body.trim_end();
        if !current.is_empty() && !current.ends_with(';') {
            self.body.push(';');
        }
        self.body.push_str(body);
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl From<&UtilityFragment> for MergedFragment {
    fn from(fragment: &UtilityFragment) -> Self {
        MergedFragment {
            selector: present(&fragment.selector).map(str::to_string),
            body: fragment.body.clone(),
            parent: present(&fragment.parent).map(str::to_string),
        }
    }
}
