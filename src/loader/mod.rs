//! Loading and unloading the SDK
//!
//! - `Injector`: injects the loader script and waits for the SDK callback
//! - `LibraryLoader`: imports the requested sub-libraries
//! - `Cleanup`: removes everything the SDK put into the page
//! - `LoadHandle`: one bootstrap + import cycle, shared by all its consumers

mod cleanup;
mod handle;
mod injector;
mod libraries;
mod namespace;
mod options;
pub mod query;

pub use cleanup::{Cleanup, CleanupRules, DEFAULT_FONT_HOST, STYLE_MARKERS, UnloadReport};
pub use handle::LoadHandle;
pub use injector::Injector;
pub use libraries::LibraryLoader;
pub use namespace::{MAPS_NAMESPACE, NAMESPACE_ROOT, NamespaceRef};
pub use options::{ApiOptions, DEFAULT_LIBRARY, Libraries, LoadOptions};
pub use query::{CALLBACK_SLOT, DEFAULT_SDK_HOST};
