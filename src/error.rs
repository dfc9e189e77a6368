#[derive(Debug)]
pub enum Error {
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    ParseConfig(toml::de::Error),
    SerializeConfig(toml::ser::Error),
    InvalidFilter(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;
        match self {
            Io { source, .. } => Some(source),
            ParseConfig(e) => Some(e),
            SerializeConfig(e) => Some(e),
            InvalidFilter(_) => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Error::*;
        match self {
            Io { path, source } => write!(f, "Io: {}: {source}", path.display()),
            ParseConfig(e) => write!(f, "ParseConfig: {e}"),
            SerializeConfig(e) => write!(f, "SerializeConfig: {e}"),
            InvalidFilter(s) => write!(f, "InvalidFilter: expected 'keyword:color', got '{s}'"),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ParseConfig(e)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::SerializeConfig(e)
    }
}
