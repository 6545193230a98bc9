use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "I/O error for {path_desc}: {source}",
        path_desc = PathDisplay(path)
    )]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to parse {format} {path_desc}: {details} (line {line_number})",
        path_desc = PathDisplay(path)
    )]
    Parse {
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: String,
    },

    #[error(
        "inconsistent data in {format} {path_desc}: {details}",
        path_desc = PathDisplay(path)
    )]
    InconsistentData {
        format: &'static str,
        path: Option<PathBuf>,
        details: String,
    },
}

impl Error {
    pub fn from_io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { path, source }
    }

    pub fn parse(
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Parse {
            format,
            path,
            line_number,
            details: details.into(),
        }
    }

    pub fn inconsistent_data(
        format: &'static str,
        path: Option<PathBuf>,
        details: impl Into<String>,
    ) -> Self {
        Self::InconsistentData {
            format,
            path,
            details: details.into(),
        }
    }
}

impl Error {
    /// Attaches the source path to an error raised while reading an anonymous stream.
    pub fn with_path(mut self, source_path: impl Into<PathBuf>) -> Self {
        match &mut self {
            Self::Io { path, .. } | Self::Parse { path, .. } | Self::InconsistentData { path, .. } => {
                *path = Some(source_path.into());
            }
        }
        self
    }
}

struct PathDisplay<'a>(&'a Option<PathBuf>);

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "file '{}'", p.display()),
            None => write!(f, "stream source"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_format_source_and_line() {
        let err = Error::parse("XYZ", Some(PathBuf::from("water.xyz")), 4, "bad coordinate");
        assert_eq!(
            err.to_string(),
            "failed to parse XYZ file 'water.xyz': bad coordinate (line 4)"
        );
    }

    #[test]
    fn inconsistent_data_without_path_mentions_stream() {
        let err = Error::inconsistent_data("Z-matrix", None, "duplicate atom 3");
        assert_eq!(
            err.to_string(),
            "inconsistent data in Z-matrix stream source: duplicate atom 3"
        );
    }

    #[test]
    fn with_path_fills_missing_path() {
        let err = Error::parse("XYZ", None, 1, "empty input").with_path("in.xyz");
        assert!(err.to_string().contains("file 'in.xyz'"));
    }

    #[test]
    fn io_error_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::from_io(source, None);
        assert!(std::error::Error::source(&err).is_some());
    }
}
