use super::directory::{DirEntry, DirectoryAccess, FileHandle};
use super::{extension_of, MediaItem, MediaKind, ObjectUrls, MAX_ITEMS};
use crate::error::PlayerError;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, info};
use uuid::Uuid;

/// Breadth-first folder walker that turns media files into library items.
#[derive(Clone)]
pub struct FolderScanner {
    urls: Rc<ObjectUrls>,
    max_items: usize,
}

impl FolderScanner {
    pub fn new(urls: Rc<ObjectUrls>) -> Self {
        Self {
            urls,
            max_items: MAX_ITEMS,
        }
    }

    /// Lower the item cap. Values above `MAX_ITEMS` are clamped to it.
    pub fn with_limit(mut self, max_items: usize) -> Self {
        self.max_items = max_items.min(MAX_ITEMS);
        self
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Walk `root` level by level and return at most `max_items` items in
    /// discovery order. Every item carries a freshly allocated reference the
    /// caller now owns. On failure nothing stays allocated.
    pub async fn scan(&self, root: &dyn DirectoryAccess) -> Result<Vec<MediaItem>, PlayerError> {
        let mut items = Vec::new();
        let mut pending: VecDeque<Box<dyn DirectoryAccess>> = VecDeque::new();

        let mut result = self.visit(root, &mut pending, &mut items);
        while result.is_ok() && items.len() < self.max_items {
            let Some(dir) = pending.pop_front() else {
                break;
            };
            // Yield between folders so the UI keeps breathing on big trees
            tokio::task::yield_now().await;
            result = self.visit(dir.as_ref(), &mut pending, &mut items);
        }

        if let Err(err) = result {
            for item in &items {
                self.urls.revoke(&item.url);
            }
            return Err(err);
        }

        let audio = items.iter().filter(|i| i.kind == MediaKind::Audio).count();
        info!(
            "Scanned '{}': {} items ({} audio, {} video), {} folders left unvisited",
            root.name(),
            items.len(),
            audio,
            items.len() - audio,
            pending.len()
        );

        Ok(items)
    }

    fn visit(
        &self,
        dir: &dyn DirectoryAccess,
        pending: &mut VecDeque<Box<dyn DirectoryAccess>>,
        items: &mut Vec<MediaItem>,
    ) -> Result<(), PlayerError> {
        let entries = dir.entries().map_err(|source| PlayerError::DirectoryRead {
            path: dir.location(),
            source,
        })?;
        debug!("Visiting '{}' ({} entries)", dir.name(), entries.len());

        for entry in entries {
            let file = match entry {
                DirEntry::Directory(child) => {
                    pending.push_back(child);
                    continue;
                }
                DirEntry::File(file) => file,
            };

            if items.len() >= self.max_items {
                break;
            }

            if let Some(item) = self.create_item(file) {
                items.push(item);
            }
        }

        Ok(())
    }

    fn create_item(&self, file: FileHandle) -> Option<MediaItem> {
        let ext = extension_of(file.name())?;
        let kind = MediaKind::from_extension(&ext)?;

        Some(MediaItem {
            id: Uuid::new_v4(),
            name: file.name().to_string(),
            kind,
            url: self.urls.create(&file),
            size: file.size(),
            ext,
            handle: file,
        })
    }
}
