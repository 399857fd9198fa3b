//! Catalog boundary and the local-directory implementation of it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lofty::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::CatalogError;

use super::model::{AlbumRecord, Track, TrackId};

/// The catalog service consumed by the engine.
///
/// `scan` asks the service to re-index its storage; `list` and `albums`
/// read the current index. Every call may fail; callers treat failure as
/// "library unavailable" and try again on the next poll.
pub trait Catalog: Send {
    fn scan(&mut self) -> Result<(), CatalogError>;
    /// Up to `limit` tracks; `0` means no limit.
    fn list(&mut self, limit: usize) -> Result<Vec<Track>, CatalogError>;
    fn albums(&mut self) -> Result<Vec<AlbumRecord>, CatalogError>;
}

const COVER_NAMES: [&str; 4] = ["cover.jpg", "cover.png", "folder.jpg", "folder.png"];

/// Catalog over a folder of audio files, indexed with `walkdir` + `lofty`.
pub struct DirCatalog {
    root: PathBuf,
    settings: LibrarySettings,
    tracks: Option<Vec<Track>>,
}

impl DirCatalog {
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        Self {
            root: root.into(),
            settings,
            tracks: None,
        }
    }

    fn indexed(&self) -> Result<&[Track], CatalogError> {
        self.tracks.as_deref().ok_or(CatalogError::NotScanned)
    }
}

impl Catalog for DirCatalog {
    fn scan(&mut self) -> Result<(), CatalogError> {
        if !self.root.is_dir() {
            return Err(CatalogError::MissingRoot(self.root.clone()));
        }
        let tracks = scan(&self.root, &self.settings);
        info!(root = %self.root.display(), count = tracks.len(), "library scanned");
        self.tracks = Some(tracks);
        Ok(())
    }

    fn list(&mut self, limit: usize) -> Result<Vec<Track>, CatalogError> {
        let tracks = self.indexed()?;
        let n = if limit == 0 {
            tracks.len()
        } else {
            limit.min(tracks.len())
        };
        Ok(tracks[..n].to_vec())
    }

    fn albums(&mut self) -> Result<Vec<AlbumRecord>, CatalogError> {
        Ok(group_albums(self.indexed()?))
    }
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Ids are the path relative to the root with `/` separators, so they stay
/// stable across machines that mount the same library elsewhere. Commas are
/// escaped because album membership travels as a comma-joined list.
fn track_id_for(root: &Path, path: &Path) -> TrackId {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().replace(',', "%2C"))
        .collect();
    TrackId(parts.join("/"))
}

fn non_blank(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn find_cover(dir: Option<&Path>) -> Option<String> {
    let dir = dir?;
    COVER_NAMES
        .iter()
        .map(|n| dir.join(n))
        .find(|p| p.is_file())
        .map(|p| p.display().to_string())
}

pub(super) fn scan(root: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(root).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let mut title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut artist = None;
        let mut album = None;
        let mut genre = None;
        let mut duration = None;

        match lofty::read_from_path(path) {
            Ok(tagged) => {
                duration = Some(tagged.properties().duration().as_secs_f64());
                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    if let Some(t) = non_blank(tag.title()) {
                        title = t;
                    }
                    artist = non_blank(tag.artist());
                    album = non_blank(tag.album());
                    genre = non_blank(tag.genre());
                }
            }
            Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
        }

        tracks.push(Track {
            id: track_id_for(root, path),
            title,
            artist,
            album,
            duration,
            cover: find_cover(path.parent()),
            source: path.display().to_string(),
            genre,
        });
    }

    tracks.sort_by(|a, b| a.label().to_lowercase().cmp(&b.label().to_lowercase()));
    tracks
}

/// Group tracks into albums keyed by (artist, album title). Tracks without
/// an album tag are left out.
pub(super) fn group_albums(tracks: &[Track]) -> Vec<AlbumRecord> {
    let mut groups: BTreeMap<(String, String), AlbumRecord> = BTreeMap::new();

    for t in tracks {
        let Some(title) = t.album.as_deref() else {
            continue;
        };
        let artist = t.artist.clone().unwrap_or_default();
        let key = (artist.to_lowercase(), title.to_lowercase());
        let rec = groups.entry(key).or_insert_with(|| AlbumRecord {
            id: format!("{}::{}", artist, title),
            title: title.to_string(),
            artist: t.artist.clone(),
            cover: t.cover.clone(),
            track_ids: String::new(),
        });
        if !rec.track_ids.is_empty() {
            rec.track_ids.push(',');
        }
        rec.track_ids.push_str(t.id.as_str());
    }

    groups.into_values().collect()
}
