use std::path::{Path, PathBuf};
use log::debug;
use thiserror::Error;
use crate::classpath::entry::Entry;

pub mod entry;

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("class file {0} not found")]
    NotFound(String),
    #[error("could not read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("could not read archive {path}: {source}")]
    Zip { path: PathBuf, source: zip::result::ZipError },
}

/// Source of class file bytes for the class loader.
pub trait ClassSource {
    /// `file_name` is the internal class name with a `.class` suffix. Returns the bytes together
    /// with a description of where they were found.
    fn read_class(&self, file_name: &str) -> Result<(Vec<u8>, String), ClasspathError>;
}

/// Boot (`jre/lib/*`), extension (`jre/lib/ext/*`) and user class path, searched in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct Classpath {
    pub boot: Option<Entry>,
    pub ext: Option<Entry>,
    pub user: Entry,
}

impl Classpath {
    pub fn parse(jre_option: Option<&str>, cp_option: Option<&str>) -> Classpath {
        let jre = find_jre_dir(jre_option);
        match &jre {
            Some(dir) => debug!("Using JRE at {}", dir.display()),
            None => debug!("No JRE found, only the user class path is searched"),
        }

        Classpath {
            boot: jre.as_ref().map(|dir| Entry::wildcard(&dir.join("lib"))),
            ext: jre.as_ref().map(|dir| Entry::wildcard(&dir.join("lib").join("ext"))),
            user: Entry::new(cp_option.unwrap_or(".")),
        }
    }
}

/// `-Xjre` if it exists, else `./jre`, else `$JAVA_HOME/jre`.
fn find_jre_dir(jre_option: Option<&str>) -> Option<PathBuf> {
    if let Some(dir) = jre_option {
        if Path::new(dir).is_dir() {
            return Some(PathBuf::from(dir));
        }
    }

    let local = PathBuf::from("./jre");
    if local.is_dir() {
        return Some(local);
    }

    std::env::var_os("JAVA_HOME")
        .map(|home| PathBuf::from(home).join("jre"))
        .filter(|dir| dir.is_dir())
}

impl ClassSource for Classpath {
    fn read_class(&self, file_name: &str) -> Result<(Vec<u8>, String), ClasspathError> {
        for entry in [&self.boot, &self.ext].into_iter().flatten() {
            match entry.read_class_from(file_name) {
                Err(ClasspathError::NotFound(_)) => continue,
                res => return res
            }
        }
        self.user.read_class_from(file_name)
    }
}
