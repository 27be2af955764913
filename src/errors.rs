use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    ScriptLoad(String),
    LibraryImport(String),
    Configuration(String),
    Validation(String),
    ConfigFile(String),
    Logging(String),
}

impl LoaderError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            LoaderError::ScriptLoad(_) => "E001",
            LoaderError::LibraryImport(_) => "E002",
            LoaderError::Configuration(_) => "E003",
            LoaderError::Validation(_) => "E004",
            LoaderError::ConfigFile(_) => "E005",
            LoaderError::Logging(_) => "E006",
        }
    }

    /// Human readable error category
    pub fn error_type(&self) -> &'static str {
        match self {
            LoaderError::ScriptLoad(_) => "Script Load Error",
            LoaderError::LibraryImport(_) => "Library Import Error",
            LoaderError::Configuration(_) => "Configuration Error",
            LoaderError::Validation(_) => "Validation Error",
            LoaderError::ConfigFile(_) => "Config File Error",
            LoaderError::Logging(_) => "Logging Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LoaderError::ScriptLoad(msg) => msg,
            LoaderError::LibraryImport(msg) => msg,
            LoaderError::Configuration(msg) => msg,
            LoaderError::Validation(msg) => msg,
            LoaderError::ConfigFile(msg) => msg,
            LoaderError::Logging(msg) => msg,
        }
    }

    /// Whether the error came out of a load cycle (script or library stage)
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            LoaderError::ScriptLoad(_) | LoaderError::LibraryImport(_)
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LoaderError {}

impl LoaderError {
    pub fn script_load<T: Into<String>>(msg: T) -> Self {
        LoaderError::ScriptLoad(msg.into())
    }

    pub fn library_import<T: Into<String>>(msg: T) -> Self {
        LoaderError::LibraryImport(msg.into())
    }

    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        LoaderError::Configuration(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LoaderError::Validation(msg.into())
    }

    pub fn config_file<T: Into<String>>(msg: T) -> Self {
        LoaderError::ConfigFile(msg.into())
    }

    pub fn logging<T: Into<String>>(msg: T) -> Self {
        LoaderError::Logging(msg.into())
    }
}

impl From<config::ConfigError> for LoaderError {
    fn from(err: config::ConfigError) -> Self {
        LoaderError::ConfigFile(err.to_string())
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::ConfigFile(err.to_string())
    }
}

impl From<toml::ser::Error> for LoaderError {
    fn from(err: toml::ser::Error) -> Self {
        LoaderError::ConfigFile(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
