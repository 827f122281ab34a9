use std::env;
use std::path::PathBuf;

/// Environment variable holding extra library paths, `:`-separated
pub const LIBRARY_ENV: &str = "SCTPX_LIBRARY";

#[cfg(any(target_os = "linux", target_os = "android"))]
const DEFAULT_LIBRARIES: &[&str] = &["libsctp.so.1", "libsctp.so"];
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const DEFAULT_LIBRARIES: &[&str] = &["libsctp.so"];

/// Where the loader looks for the socket extension functions
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderConfig {
    libraries: Vec<PathBuf>,
    search_process: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            libraries: DEFAULT_LIBRARIES.iter().map(PathBuf::from).collect(),
            // FreeBSD ships the extension functions in libc
            search_process: cfg!(target_os = "freebsd"),
        }
    }
}

impl LoaderConfig {
    /// A config with no candidates at all
    pub fn empty() -> Self {
        Self {
            libraries: Vec::new(),
            search_process: false,
        }
    }

    /// Default candidates, preceded by whatever `SCTPX_LIBRARY` names
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(paths) = env::var(LIBRARY_ENV) {
            config.prepend_paths(&paths);
        }
        config
    }

    /// Adds a candidate library, tried after the existing ones
    pub fn library(mut self, path: impl Into<PathBuf>) -> Self {
        self.libraries.push(path.into());
        self
    }

    /// Also look for the functions in the running executable's own image
    pub fn search_process(mut self, search: bool) -> Self {
        self.search_process = search;
        self
    }

    pub fn libraries(&self) -> &[PathBuf] {
        &self.libraries
    }

    pub fn searches_process(&self) -> bool {
        self.search_process
    }

    fn prepend_paths(&mut self, paths: &str) {
        let extra: Vec<PathBuf> = paths
            .split(':')
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        self.libraries.splice(0..0, extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepend_paths_keeps_defaults_last() {
        let mut config = LoaderConfig::default();
        config.prepend_paths("/opt/sctp/libsctp.so::/tmp/libsctp.so.1");

        let libs = config.libraries();
        assert_eq!(libs.len(), DEFAULT_LIBRARIES.len() + 2);
        assert_eq!(libs[0], PathBuf::from("/opt/sctp/libsctp.so"));
        assert_eq!(libs[1], PathBuf::from("/tmp/libsctp.so.1"));
        assert_eq!(libs[2], PathBuf::from(DEFAULT_LIBRARIES[0]));
    }

    #[test]
    fn test_builder() {
        let config = LoaderConfig::empty()
            .library("a.so")
            .library("b.so")
            .search_process(true);
        assert_eq!(config.libraries(), &[PathBuf::from("a.so"), PathBuf::from("b.so")]);
        assert!(config.searches_process());
    }
}
