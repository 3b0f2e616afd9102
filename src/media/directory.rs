// Directory capabilities - what the scanner and the folder registry talk to
// The local filesystem is one implementation; tests plug in an in-memory tree

use crate::error::PlayerError;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Prompt,
    Denied,
}

/// Opaque capability for re-reading one discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    name: String,
    path: PathBuf,
    size: u64,
}

impl FileHandle {
    pub fn new(name: String, path: PathBuf, size: u64) -> Self {
        Self { name, path, size }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

pub enum DirEntry {
    Directory(Box<dyn DirectoryAccess>),
    File(FileHandle),
}

/// Enumerate/read access to one folder.
pub trait DirectoryAccess {
    fn name(&self) -> String;

    /// Stable location used when the capability is persisted.
    fn location(&self) -> PathBuf;

    /// Direct children only; the caller decides how to recurse.
    fn entries(&self) -> io::Result<Vec<DirEntry>>;

    fn query_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    /// Ask for read access again. Hosts without an interactive grant just re-check.
    fn request_permission(&self) -> PermissionState {
        self.query_permission()
    }
}

#[derive(Debug, Clone)]
pub struct LocalDirectory {
    root: PathBuf,
}

impl LocalDirectory {
    pub fn open<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl DirectoryAccess for LocalDirectory {
    fn name(&self) -> String {
        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    fn location(&self) -> PathBuf {
        self.root.clone()
    }

    fn entries(&self) -> io::Result<Vec<DirEntry>> {
        let metadata = fs::metadata(&self.root)?;
        if !metadata.is_dir() {
            return Err(io::Error::other(format!("{} is not a folder", self.root.display())));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                entries.push(DirEntry::Directory(Box::new(LocalDirectory::open(entry.path()))));
            } else if file_type.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                let handle = FileHandle::new(name, entry.path().to_path_buf(), size);
                entries.push(DirEntry::File(handle));
            }
        }

        Ok(entries)
    }

    fn query_permission(&self) -> PermissionState {
        match fs::read_dir(&self.root) {
            Ok(_) => PermissionState::Granted,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => PermissionState::Denied,
            // Gone or unmounted: the user would have to pick it again
            Err(_) => PermissionState::Prompt,
        }
    }

    fn request_permission(&self) -> PermissionState {
        match self.query_permission() {
            PermissionState::Granted => PermissionState::Granted,
            _ => PermissionState::Denied,
        }
    }
}

/// Source of user-chosen folders.
pub trait FolderPicker {
    /// `Ok(None)` means the user cancelled.
    fn pick(&mut self) -> Result<Option<Box<dyn DirectoryAccess>>, PlayerError>;
}

/// Asks for a folder path on an interactive terminal.
pub struct PromptPicker;

impl PromptPicker {
    fn read_answer<R: BufRead>(input: &mut R) -> io::Result<Option<PathBuf>> {
        let mut line = String::new();
        input.read_line(&mut line)?;
        let answer = line.trim();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(answer)))
        }
    }
}

impl FolderPicker for PromptPicker {
    fn pick(&mut self) -> Result<Option<Box<dyn DirectoryAccess>>, PlayerError> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Err(PlayerError::UnsupportedCapability);
        }

        print!("Folder to open: ");
        let _ = io::stdout().flush();

        let answer = Self::read_answer(&mut stdin.lock())
            .map_err(|source| PlayerError::DirectoryRead {
                path: PathBuf::from("<stdin>"),
                source,
            })?;

        Ok(answer.map(|path| Box::new(LocalDirectory::open(path)) as Box<dyn DirectoryAccess>))
    }
}
