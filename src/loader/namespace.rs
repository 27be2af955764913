use serde_json::Value;
use std::sync::Arc;

/// Root global the SDK attaches itself to
pub const NAMESPACE_ROOT: &str = "google";

/// Path of the SDK namespace object under `window`
pub const MAPS_NAMESPACE: [&str; 2] = ["google", "maps"];

/// Read-only snapshot of the SDK namespace, taken when a load completes
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceRef {
    root: Arc<Value>,
}

impl NamespaceRef {
    pub fn new(root: Value) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    /// The `google` object
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Property chain below `google`, e.g. `["maps", "places"]`
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self.root.as_ref(), |value, segment| value.get(*segment))
    }

    pub fn maps(&self) -> Option<&Value> {
        self.get(&["maps"])
    }

    pub fn has_library(&self, name: &str) -> bool {
        self.get(&["maps", name]).is_some()
    }

    /// Language the SDK reported for itself
    pub fn language(&self) -> Option<&str> {
        self.get(&["maps", "language"]).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let ns = NamespaceRef::new(json!({
            "maps": { "language": "fr", "places": { "loaded": true } }
        }));

        assert_eq!(ns.language(), Some("fr"));
        assert!(ns.has_library("places"));
        assert!(!ns.has_library("marker"));
        assert!(ns.get(&["maps", "places", "loaded"]).is_some());
        assert!(ns.get(&["nothing", "here"]).is_none());
    }
}
