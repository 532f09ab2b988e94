use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use error_stack::{IntoReport, ResultExt};

pub const RESOURCE_PATH_VAR: &str = "MP_RESOURCE_PATH";

#[derive(Debug)]
pub struct ResourceError;
impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resource error")
    }
}
impl std::error::Error for ResourceError {}

pub type ResourceResult<T> = error_stack::Result<T, ResourceError>;

/// Locates resources by a logical, `/`-separated path.
///
/// `Ok(None)` means the resource does not exist; `Err` means it exists but
/// could not be opened. The returned reader is owned by the caller and the
/// underlying handle is released when it is dropped.
pub trait ResourceLoader {
    fn open(&self, path: &str) -> ResourceResult<Option<Box<dyn Read + '_>>>;
}

// Leading `/` is ignored; anything that could escape a root is rejected.
fn relative_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

// Normalized `/`-joined form of a resource path, used as the in-memory key.
fn resource_key(path: &str) -> Option<String> {
    let relative = relative_path(path)?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Resolves resources against an ordered list of directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRoots {
    roots: Vec<PathBuf>,
}

impl ResourceRoots {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Entries of `MP_RESOURCE_PATH`, then `./resources`, then `.`, then the
    /// user config directory.
    pub fn from_env() -> Self {
        let mut roots = Vec::new();
        if let Some(value) = std::env::var_os(RESOURCE_PATH_VAR) {
            roots.extend(std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
        roots.push(PathBuf::from("resources"));
        roots.push(PathBuf::from("."));
        if let Some(config_dir) = dirs::config_dir() {
            roots.push(config_dir.join("mercadopago"));
        }
        Self { roots }
    }

    pub fn push_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = relative_path(path)?;
        self.roots
            .iter()
            .map(|root| root.join(&relative))
            .find(|candidate| candidate.is_file())
    }
}

impl ResourceLoader for ResourceRoots {
    fn open(&self, path: &str) -> ResourceResult<Option<Box<dyn Read + '_>>> {
        let Some(resolved) = self.resolve(path) else {
            log::debug!("Resource {} not found in {:?}", path, self.roots);
            return Ok(None);
        };
        log::debug!("Resource {} resolved to {}", path, resolved.display());
        let file = File::open(&resolved)
            .into_report()
            .attach_printable_lazy(|| format!("Failed to open {}", resolved.display()))
            .change_context(ResourceError)?;
        Ok(Some(Box::new(file)))
    }
}

/// Resources held in memory, typically bundled with `include_str!`.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Paths that could escape the resource root are not stored.
    pub fn insert(&mut self, path: &str, content: impl Into<Cow<'static, [u8]>>) {
        match resource_key(path) {
            Some(key) => {
                self.entries.insert(key, content.into());
            }
            None => log::warn!("Ignoring embedded resource with invalid path {}", path),
        }
    }

    pub fn with_text(mut self, path: &str, text: &'static str) -> Self {
        self.insert(path, text.as_bytes());
        self
    }
}

impl ResourceLoader for EmbeddedResources {
    fn open(&self, path: &str) -> ResourceResult<Option<Box<dyn Read + '_>>> {
        let Some(key) = resource_key(path) else {
            return Ok(None);
        };
        Ok(self
            .entries
            .get(&key)
            .map(|content| Box::new(&content[..]) as Box<dyn Read + '_>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(mut reader: Box<dyn Read + '_>) -> String {
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_relative_path_rejects_escapes() {
        assert_eq!(relative_path("/conf/a.properties"), Some(PathBuf::from("conf/a.properties")));
        assert_eq!(relative_path("./a.properties"), Some(PathBuf::from("a.properties")));
        assert_eq!(relative_path("../a.properties"), None);
        assert_eq!(relative_path("conf/../../a"), None);
        assert_eq!(relative_path(""), None);
        assert_eq!(relative_path("/"), None);
    }

    #[test]
    fn test_roots_search_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("mp.properties"), "from=second").unwrap();
        let roots = ResourceRoots::new(vec![first.path().into(), second.path().into()]);
        let reader = roots.open("mp.properties").unwrap().unwrap();
        assert_eq!(read_all(reader), "from=second");

        std::fs::write(first.path().join("mp.properties"), "from=first").unwrap();
        let reader = roots.open("/mp.properties").unwrap().unwrap();
        assert_eq!(read_all(reader), "from=first");
    }

    #[test]
    fn test_roots_missing_resource() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let roots = ResourceRoots::new(vec![dir.path().into()]);
        assert!(roots.open("absent.properties").unwrap().is_none());
        // directories are not resources
        assert!(roots.open("nested").unwrap().is_none());
    }

    #[test]
    fn test_embedded_resources() {
        let resources = EmbeddedResources::new().with_text("conf/mp.properties", "appId=1");
        let reader = resources.open("/conf/mp.properties").unwrap().unwrap();
        assert_eq!(read_all(reader), "appId=1");
        assert!(resources.open("conf/other.properties").unwrap().is_none());
        assert!(resources.open("../conf/mp.properties").unwrap().is_none());
    }

    #[test]
    fn test_embedded_paths_are_normalized() {
        let resources = EmbeddedResources::new()
            .with_text("./mp.properties", "clientId=1")
            .with_text("/conf//nested/./mp.properties", "clientId=2");
        let reader = resources.open("mp.properties").unwrap().unwrap();
        assert_eq!(read_all(reader), "clientId=1");
        let reader = resources.open("./mp.properties").unwrap().unwrap();
        assert_eq!(read_all(reader), "clientId=1");
        let reader = resources.open("conf/nested/mp.properties").unwrap().unwrap();
        assert_eq!(read_all(reader), "clientId=2");

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mp.properties"), "clientId=3").unwrap();
        let roots = ResourceRoots::new(vec![dir.path().into()]);
        let reader = roots.open("./mp.properties").unwrap().unwrap();
        assert_eq!(read_all(reader), "clientId=3");
    }

    #[test]
    fn test_from_env_ends_with_defaults() {
        let roots = ResourceRoots::from_env();
        assert!(roots.roots().contains(&PathBuf::from("resources")));
        assert!(roots.roots().contains(&PathBuf::from(".")));
    }
}
