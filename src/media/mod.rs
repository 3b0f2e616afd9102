pub mod directory;
pub mod item;
pub mod refs;
pub mod scanner;

pub use directory::{
    DirEntry, DirectoryAccess, FileHandle, FolderPicker, LocalDirectory, PermissionState,
    PromptPicker,
};
pub use item::MediaItem;
pub use refs::{ObjectUrls, PlayableRef};
pub use scanner::FolderScanner;

use serde::{Deserialize, Serialize};

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "wav", "flac", "ogg", "opus"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "mov", "avi", "m4v"];

/// Upper bound on items a single scan will return.
pub const MAX_ITEMS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Classify a lowercase extension. Anything outside both sets is not media.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if AUDIO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// Lowercased extension of a file name, without the dot.
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory directory tree for driving the scanner without a filesystem.

    use super::directory::{DirEntry, DirectoryAccess, FileHandle, PermissionState};
    use std::io;
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub(crate) enum FakeNode {
        Dir(FakeDir),
        File(String, u64),
    }

    #[derive(Debug, Clone)]
    pub(crate) struct FakeDir {
        pub name: String,
        pub children: Vec<FakeNode>,
        pub fail: bool,
        pub permission: PermissionState,
    }

    impl FakeDir {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                children: Vec::new(),
                fail: false,
                permission: PermissionState::Granted,
            }
        }

        pub fn file(mut self, name: &str, size: u64) -> Self {
            self.children.push(FakeNode::File(name.to_string(), size));
            self
        }

        pub fn dir(mut self, dir: FakeDir) -> Self {
            self.children.push(FakeNode::Dir(dir));
            self
        }

        pub fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    impl DirectoryAccess for FakeDir {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn location(&self) -> PathBuf {
            PathBuf::from("/fake").join(&self.name)
        }

        fn entries(&self) -> io::Result<Vec<DirEntry>> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "fake failure"));
            }
            Ok(self
                .children
                .iter()
                .map(|child| match child {
                    FakeNode::Dir(dir) => DirEntry::Directory(Box::new(dir.clone())),
                    FakeNode::File(name, size) => {
                        let path = self.location().join(name);
                        DirEntry::File(FileHandle::new(name.clone(), path, *size))
                    }
                })
                .collect())
        }

        fn query_permission(&self) -> PermissionState {
            self.permission
        }
    }
}
