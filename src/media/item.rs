use super::directory::FileHandle;
use super::refs::PlayableRef;
use super::MediaKind;
use uuid::Uuid;

/// One playable file discovered during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub id: Uuid,
    pub name: String,
    pub kind: MediaKind,
    pub url: PlayableRef,
    pub size: u64,
    pub ext: String,
    pub handle: FileHandle,
}

impl MediaItem {
    pub fn display_title(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ObjectUrls;
    use std::path::PathBuf;

    #[test]
    fn test_display_title_strips_extension() {
        let urls = ObjectUrls::new();
        let path = PathBuf::from("/m/Night Drive.flac");
        let handle = FileHandle::new("Night Drive.flac".into(), path, 1);
        let item = MediaItem {
            id: Uuid::new_v4(),
            name: "Night Drive.flac".into(),
            kind: MediaKind::Audio,
            url: urls.create(&handle),
            size: 1,
            ext: "flac".into(),
            handle,
        };

        assert_eq!(item.display_title(), "Night Drive");
        assert!(!item.is_video());
    }
}
