//! Load options
//!
//! `ApiOptions` is what the host hands over once. Every load cycle merges it
//! with the locale that is current at that moment into an immutable
//! `LoadOptions`.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Library requested when the host asks for none
pub const DEFAULT_LIBRARY: &str = "core";

/// Non-empty, insertion-ordered set of sub-library names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Libraries(IndexSet<String>);

impl Libraries {
    /// Builds the set, dropping blank names and duplicates.
    ///
    /// Falls back to the `core` sentinel when nothing usable is left.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: IndexSet<String> = names
            .into_iter()
            .map(Into::into)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        if set.is_empty() {
            Self::default()
        } else {
            Self(set)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Always at least one
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Comma-joined form used on the wire
    pub fn joined(&self) -> String {
        self.iter().collect::<Vec<_>>().join(",")
    }
}

impl Default for Libraries {
    fn default() -> Self {
        let mut set = IndexSet::new();
        set.insert(DEFAULT_LIBRARY.to_string());
        Self(set)
    }
}

/// Options supplied by the host application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    #[serde(rename = "key")]
    pub api_key: String,
    #[serde(default, rename = "v", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_referrer_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub map_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_channel: Option<String>,
    /// Passthrough parameters, camelCase keys
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, String>,
}

impl ApiOptions {
    pub fn new<T: Into<String>>(api_key: T) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries = libraries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version<T: Into<String>>(mut self, version: T) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_region<T: Into<String>>(mut self, region: T) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Merges these options with `language`, which always wins over
    /// `self.language`.
    pub fn with_language(&self, language: &str) -> LoadOptions {
        LoadOptions {
            api: self.clone(),
            libraries: Libraries::new(self.libraries.iter().cloned()),
            language: language.to_string(),
        }
    }
}

/// Immutable configuration for one load cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    api: ApiOptions,
    libraries: Libraries,
    language: String,
}

impl LoadOptions {
    pub fn libraries(&self) -> &Libraries {
        &self.libraries
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn base(&self) -> &ApiOptions {
        &self.api
    }

    /// Option fields under their camelCase names, in wire order.
    ///
    /// Libraries are not part of this list; they travel under their own key.
    pub fn fields(&self) -> Vec<(String, String)> {
        let api = &self.api;
        let mut fields = vec![("key".to_string(), api.api_key.clone())];

        let optional = [
            ("v", api.version.as_ref()),
            ("language", Some(&self.language)),
            ("region", api.region.as_ref()),
            ("authReferrerPolicy", api.auth_referrer_policy.as_ref()),
            ("channel", api.channel.as_ref()),
            ("solutionChannel", api.solution_channel.as_ref()),
        ];
        fields.extend(
            optional
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.clone()))),
        );

        if !api.map_ids.is_empty() {
            fields.push(("mapIds".to_string(), api.map_ids.join(",")));
        }

        fields.extend(api.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_libraries_default_to_core() {
        let libs = Libraries::new(Vec::<String>::new());
        assert_eq!(libs.joined(), "core");
        assert_eq!(libs.len(), 1);

        let blank = Libraries::new(["  ", ""]);
        assert_eq!(blank, Libraries::default());
    }

    #[test]
    fn test_libraries_keep_order_and_drop_duplicates() {
        let libs = Libraries::new(["places", "marker", "places", "geometry"]);
        assert_eq!(libs.joined(), "places,marker,geometry");
        assert!(libs.contains("marker"));
        assert!(!libs.contains("core"));
    }

    #[test]
    fn test_locale_overrides_base_language() {
        let mut api = ApiOptions::new("secret");
        api.language = Some("pt".to_string());

        let options = api.with_language("fr");
        assert_eq!(options.language(), "fr");
        assert!(
            options
                .fields()
                .contains(&("language".to_string(), "fr".to_string()))
        );
        assert!(
            !options
                .fields()
                .iter()
                .any(|(_, v)| v == "pt")
        );
    }

    #[test]
    fn test_fields_order() {
        let options = ApiOptions::new("k")
            .with_version("weekly")
            .with_region("PT")
            .with_param("mapType", "roadmap")
            .with_language("en");

        let names: Vec<String> = options.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["key", "v", "language", "region", "mapType"]);
    }

    #[test]
    fn test_api_options_deserialize_camel_case() {
        let json = r#"{"key":"abc","v":"beta","authReferrerPolicy":"origin","mapIds":["m1","m2"]}"#;
        let api: ApiOptions = serde_json::from_str(json).unwrap();

        assert_eq!(api.api_key, "abc");
        assert_eq!(api.version.as_deref(), Some("beta"));
        assert_eq!(api.auth_referrer_policy.as_deref(), Some("origin"));
        assert_eq!(api.map_ids, vec!["m1", "m2"]);
        assert!(api.libraries.is_empty());
    }
}
