//! Classpath resolution.
//!
//! A [`ClassLoader`] searches an ordered list of roots (class directories
//! and jar archives) for the class file of a binary name; the first root
//! containing it wins and the ambient root is consulted last. Archives are
//! memory mapped once when the loader is built and stay owned by it, so they
//! are released when the loader is dropped. No class is read before it is
//! asked for.

use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::classfile::{ACC_ABSTRACT, ACC_INTERFACE, ACC_MODULE, ClassFile};
use crate::error::LoadError;
use crate::scan::class_name_to_class_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClasspathRoot {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl ClasspathRoot {
    /// Regular files are treated as archives, everything else as a class
    /// directory.
    pub fn from_path(path: &Path) -> Self {
        if path.is_file() {
            ClasspathRoot::Archive(path.to_path_buf())
        } else {
            ClasspathRoot::Directory(path.to_path_buf())
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ClasspathRoot::Directory(path) | ClasspathRoot::Archive(path) => path,
        }
    }
}

enum OpenRoot {
    Directory(PathBuf),
    Archive {
        path: PathBuf,
        archive: ZipArchive<Cursor<Mmap>>,
    },
}

impl OpenRoot {
    fn open(root: &ClasspathRoot) -> io::Result<Self> {
        match root {
            ClasspathRoot::Directory(path) => {
                fs::read_dir(path)?;
                Ok(OpenRoot::Directory(path.clone()))
            }
            ClasspathRoot::Archive(path) => {
                let file = File::open(path)?;
                // SAFETY: The file is opened read-only; the mapping is owned by
                // the archive and dropped together with it.
                let mmap = unsafe { Mmap::map(&file)? };
                let archive = ZipArchive::new(Cursor::new(mmap)).map_err(io::Error::other)?;
                Ok(OpenRoot::Archive {
                    path: path.clone(),
                    archive,
                })
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            OpenRoot::Directory(path) | OpenRoot::Archive { path, .. } => path,
        }
    }

    fn read(&mut self, class_path: &str) -> io::Result<Option<Vec<u8>>> {
        match self {
            OpenRoot::Directory(root) => match fs::read(root.join(class_path)) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err),
            },
            OpenRoot::Archive { archive, .. } => {
                let mut entry = match archive.by_name(class_path) {
                    Ok(entry) => entry,
                    Err(ZipError::FileNotFound) => return Ok(None),
                    Err(err) => return Err(io::Error::other(err)),
                };
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut bytes)?;
                Ok(Some(bytes))
            }
        }
    }
}

/// Raw class file bytes and the root they were found in.
#[derive(Debug, Clone)]
pub struct ClassBytes {
    pub origin: PathBuf,
    pub bytes: Vec<u8>,
}

pub struct ClassLoader {
    roots: Vec<OpenRoot>,
    ambient: OpenRoot,
    degraded: bool,
}

impl ClassLoader {
    /// Opens every root. If any of them cannot be opened the whole classpath
    /// is replaced by the ambient root alone and the loader reports itself
    /// as degraded.
    pub fn new(roots: &[ClasspathRoot], ambient_root: &Path) -> Self {
        let ambient = OpenRoot::Directory(ambient_root.to_path_buf());

        let mut opened = Vec::with_capacity(roots.len());
        for root in roots {
            match OpenRoot::open(root) {
                Ok(open) => {
                    debug!("Adding classpath element: {}", root.path().display());
                    opened.push(open);
                }
                Err(err) => {
                    debug!(
                        "Couldn't open classpath element {}: {err}; falling back to {}",
                        root.path().display(),
                        ambient_root.display()
                    );
                    return Self {
                        roots: Vec::new(),
                        ambient,
                        degraded: true,
                    };
                }
            }
        }

        Self {
            roots: opened,
            ambient,
            degraded: false,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn root_paths(&self) -> Vec<&Path> {
        self.roots
            .iter()
            .chain(std::iter::once(&self.ambient))
            .map(OpenRoot::path)
            .collect()
    }

    /// Bytes of the first class file named `class_name` on the classpath.
    pub fn find_class_bytes(&mut self, class_name: &str) -> Result<Option<ClassBytes>, LoadError> {
        let class_path = class_name_to_class_path(class_name);
        for root in self.roots.iter_mut().chain(std::iter::once(&mut self.ambient)) {
            let found = root.read(&class_path).map_err(|source| LoadError::Read {
                path: format!("{}!/{class_path}", root.path().display()),
                source,
            })?;
            if let Some(bytes) = found {
                return Ok(Some(ClassBytes {
                    origin: root.path().to_path_buf(),
                    bytes,
                }));
            }
        }
        Ok(None)
    }

    pub fn load_class(&mut self, class_name: &str) -> Result<LoadedClass, LoadError> {
        let found = self
            .find_class_bytes(class_name)?
            .ok_or_else(|| LoadError::NotFound(class_name.to_string()))?;
        LoadedClass::from_bytes(class_name, found)
    }
}

/// A class resolved against the classpath and parsed.
#[derive(Debug, Clone)]
pub struct LoadedClass {
    name: String,
    origin: PathBuf,
    class_file: ClassFile,
}

impl LoadedClass {
    /// Parses `found` and checks that it declares `class_name`.
    pub fn from_bytes(class_name: &str, found: ClassBytes) -> Result<Self, LoadError> {
        let malformed = |source| LoadError::Malformed {
            name: class_name.to_string(),
            source,
        };
        let class_file = ClassFile::parse(&found.bytes).map_err(malformed)?;
        let declared = class_file.name().map_err(malformed)?.replace('/', ".");
        if declared != class_name {
            return Err(LoadError::WrongName {
                origin: found.origin.display().to_string(),
                expected: class_name.to_string(),
                found: declared,
            });
        }

        Ok(Self {
            name: class_name.to_string(),
            origin: found.origin,
            class_file,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn class_file(&self) -> &ClassFile {
        &self.class_file
    }

    pub fn into_class_file(self) -> ClassFile {
        self.class_file
    }

    pub fn is_interface(&self) -> bool {
        self.class_file.has_flag(ACC_INTERFACE)
    }

    pub fn is_abstract(&self) -> bool {
        self.class_file.has_flag(ACC_ABSTRACT)
    }

    pub fn is_module(&self) -> bool {
        self.class_file.has_flag(ACC_MODULE)
    }
}
