//! Script URL construction

use url::form_urlencoded;

use super::options::LoadOptions;

pub const DEFAULT_SDK_HOST: &str = "maps.googleapis.com";

/// Global slot the SDK calls once its loader script has run
pub const CALLBACK_SLOT: &str = "google.maps.__ib__";

const SCRIPT_PATH: &str = "/maps/api/js";

/// `authReferrerPolicy` -> `auth_referrer_policy`
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Query string for one bootstrap.
///
/// `libraries` comes first, every option field follows under its snake_cased
/// name, and the callback parameter is always last. A field that maps to an
/// existing key replaces its value in place.
pub fn build_query(options: &LoadOptions, callback: &str) -> String {
    let mut params: Vec<(String, String)> =
        vec![("libraries".to_string(), options.libraries().joined())];

    for (key, value) in options.fields() {
        let key = to_snake_case(&key);
        match params.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => params.push((key, value)),
        }
    }
    params.retain(|(k, _)| k != "callback");
    params.push(("callback".to_string(), callback.to_string()));

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Full source URL of the loader script
pub fn build_script_url(host: &str, options: &LoadOptions, callback: &str) -> String {
    format!("https://{}{}?{}", host, SCRIPT_PATH, build_query(options, callback))
}
