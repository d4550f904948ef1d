use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;
use crate::classpath::ClasspathError;

#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

/// One element of a class path.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Dir(PathBuf),
    Zip(PathBuf),
    Composite(Vec<Entry>),
}

fn is_archive(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".jar") || lower.ends_with(".zip")
}

impl Entry {
    pub fn new(path: &str) -> Entry {
        if path.contains(PATH_LIST_SEPARATOR) {
            Entry::Composite(path.split(PATH_LIST_SEPARATOR)
                .filter(|p| !p.is_empty())
                .map(Entry::new)
                .collect())
        } else if let Some(base) = path.strip_suffix('*') {
            Entry::wildcard(Path::new(if base.is_empty() { "." } else { base }))
        } else if is_archive(path) {
            Entry::Zip(PathBuf::from(path))
        } else {
            Entry::Dir(PathBuf::from(path))
        }
    }

    /// All jars directly inside `dir`, sub directories are not searched.
    pub fn wildcard(dir: &Path) -> Entry {
        let mut jars: Vec<PathBuf> = std::fs::read_dir(dir)
            .map(|entries| entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.to_str().map_or(false, is_archive))
                .collect())
            .unwrap_or_default();
        jars.sort();

        Entry::Composite(jars.into_iter().map(Entry::Zip).collect())
    }

    /// Reads `file_name` (a relative path such as `java/lang/Object.class`).
    pub fn read_class(&self, file_name: &str) -> Result<Vec<u8>, ClasspathError> {
        match self {
            Entry::Dir(dir) => {
                let path = dir.join(file_name);
                if !path.is_file() {
                    return Err(ClasspathError::NotFound(file_name.to_string()));
                }
                std::fs::read(&path).map_err(|source| ClasspathError::Io { path, source })
            }
            Entry::Zip(jar) => {
                let file = File::open(jar)
                    .map_err(|source| ClasspathError::Io { path: jar.clone(), source })?;
                let mut archive = ZipArchive::new(file)
                    .map_err(|source| ClasspathError::Zip { path: jar.clone(), source })?;

                let mut entry = match archive.by_name(file_name) {
                    Ok(entry) => entry,
                    Err(ZipError::FileNotFound) => return Err(ClasspathError::NotFound(file_name.to_string())),
                    Err(source) => return Err(ClasspathError::Zip { path: jar.clone(), source }),
                };

                let mut buf = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut buf)
                    .map_err(|source| ClasspathError::Io { path: jar.clone(), source })?;
                Ok(buf)
            }
            Entry::Composite(entries) => {
                for e in entries {
                    match e.read_class(file_name) {
                        Err(ClasspathError::NotFound(_)) => continue,
                        res => return res
                    }
                }
                Err(ClasspathError::NotFound(file_name.to_string()))
            }
        }
    }

    /// Like `read_class`, but also names the entry the bytes came from.
    pub fn read_class_from(&self, file_name: &str) -> Result<(Vec<u8>, String), ClasspathError> {
        match self {
            Entry::Composite(entries) => {
                for e in entries {
                    match e.read_class_from(file_name) {
                        Err(ClasspathError::NotFound(_)) => continue,
                        res => return res
                    }
                }
                Err(ClasspathError::NotFound(file_name.to_string()))
            }
            _ => self.read_class(file_name).map(|bytes| (bytes, self.to_string()))
        }
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Entry::Dir(p) | Entry::Zip(p) => write!(f, "{}", p.display()),
            Entry::Composite(entries) => {
                let parts: Vec<String> = entries.iter().map(Entry::to_string).collect();
                write!(f, "{}", parts.join(&PATH_LIST_SEPARATOR.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use zip::write::FileOptions;
    use zip::ZipWriter;
    use crate::classpath::ClasspathError;
    use crate::classpath::entry::{Entry, PATH_LIST_SEPARATOR};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rust-jvm-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_jar(path: &PathBuf, file_name: &str, content: &[u8]) {
        let mut zip = ZipWriter::new(std::fs::File::create(path).unwrap());
        zip.start_file(file_name, FileOptions::default()).unwrap();
        zip.write_all(content).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn entry_kinds() {
        assert_eq!(Entry::new("classes"), Entry::Dir(PathBuf::from("classes")));
        assert_eq!(Entry::new("lib/rt.JAR"), Entry::Zip(PathBuf::from("lib/rt.JAR")));

        let list = format!("a{}b.zip", PATH_LIST_SEPARATOR);
        assert_eq!(Entry::new(&list), Entry::Composite(vec![
            Entry::Dir(PathBuf::from("a")),
            Entry::Zip(PathBuf::from("b.zip")),
        ]));
        assert_eq!(Entry::new(&list).to_string(), list);
    }

    #[test]
    fn reads_from_directory_and_jar() {
        let dir = scratch_dir("entries");
        std::fs::create_dir_all(dir.join("pkg")).unwrap();
        std::fs::write(dir.join("pkg/A.class"), [1, 2, 3]).unwrap();
        write_jar(&dir.join("lib.jar"), "pkg/B.class", &[4, 5]);
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        write_jar(&dir.join("nested/hidden.jar"), "pkg/C.class", &[6]);

        let entry = Entry::new(dir.to_str().unwrap());
        assert_eq!(entry.read_class("pkg/A.class").unwrap(), vec![1, 2, 3]);
        assert!(matches!(entry.read_class("pkg/B.class"), Err(ClasspathError::NotFound(_))));

        let jar = Entry::new(dir.join("lib.jar").to_str().unwrap());
        assert_eq!(jar.read_class("pkg/B.class").unwrap(), vec![4, 5]);

        let wildcard = Entry::new(&format!("{}/*", dir.to_str().unwrap()));
        let (bytes, source) = wildcard.read_class_from("pkg/B.class").unwrap();
        assert_eq!(bytes, vec![4, 5]);
        assert!(source.ends_with("lib.jar"));
        assert!(wildcard.read_class("pkg/C.class").is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
