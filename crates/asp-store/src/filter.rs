use serde_json::Value;

/// Conjunction of field-equality conditions over a JSON document.
///
/// Field paths are dotted (`"author.username"`) and address nested objects.
/// An empty filter matches every document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter that matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter with a single `path == value` condition.
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(path, value)
    }

    /// Add another `path == value` condition.
    pub fn and_eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((path.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns `true` if `doc` satisfies every condition.
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(path, expected)| lookup(doc, path) == Some(expected))
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, segment| node.get(segment))
}
