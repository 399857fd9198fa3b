use std::fs;
use std::path::Path;

use tempfile::tempdir;

use super::catalog::{group_albums, scan};
use super::poller::fetch;
use super::*;
use crate::config::LibrarySettings;
use crate::error::CatalogError;

fn t(id: &str, artist: Option<&str>, album: Option<&str>) -> Track {
    Track {
        id: TrackId::from(id),
        title: id.to_string(),
        artist: artist.map(str::to_string),
        album: album.map(str::to_string),
        duration: Some(180.0),
        cover: None,
        source: format!("/music/{id}.mp3"),
        genre: None,
    }
}

#[test]
fn split_member_ids_drops_blanks_and_whitespace() {
    let ids = split_member_ids(" a, b ,,c,");
    assert_eq!(ids, vec![TrackId::from("a"), TrackId::from("b"), TrackId::from("c")]);
    assert!(split_member_ids("").is_empty());
}

#[test]
fn album_from_record_splits_members() {
    let rec = AlbumRecord {
        id: "x".into(),
        title: "X".into(),
        artist: None,
        cover: None,
        track_ids: "one,two".into(),
    };
    let album = Album::from(rec);
    assert_eq!(album.tracks, vec![TrackId::from("one"), TrackId::from("two")]);
}

#[test]
fn library_lookup_and_adopt_keep_first_copy() {
    let mut lib = Library::new(vec![t("a", None, None), t("b", None, None)], Vec::new());
    assert_eq!(lib.len(), 2);
    assert!(lib.contains(&TrackId::from("a")));

    let mut dup = t("a", Some("Someone Else"), None);
    dup.title = "changed".into();
    lib.adopt(dup);
    assert_eq!(lib.len(), 2);
    assert_eq!(lib.get(&TrackId::from("a")).unwrap().title, "a");

    lib.adopt(t("c", None, None));
    assert_eq!(lib.len(), 3);
    assert!(lib.get(&TrackId::from("c")).is_some());
}

#[test]
fn group_albums_joins_members_and_skips_untagged() {
    let tracks = vec![
        t("1", Some("Band"), Some("First")),
        t("2", Some("band"), Some("first")),
        t("3", Some("Band"), Some("Second")),
        t("4", Some("Band"), None),
    ];
    let albums = group_albums(&tracks);
    assert_eq!(albums.len(), 2);
    let first = albums.iter().find(|a| a.title == "First").unwrap();
    assert_eq!(first.track_ids, "1,2");
    let second = albums.iter().find(|a| a.title == "Second").unwrap();
    assert_eq!(second.track_ids, "3");
}

#[test]
fn label_prefers_artist_dash_title() {
    assert_eq!(t("Song", Some("Artist"), None).label(), "Artist - Song");
    assert_eq!(t("Song", Some("   "), None).label(), "Song");
    assert_eq!(t("Song", None, None).label(), "Song");
}

#[test]
fn scan_filters_non_audio_and_sorts_case_insensitive() {
    let dir = tempdir().unwrap();

    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let tracks = scan(dir.path(), &LibrarySettings::default());
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "A");
    assert_eq!(tracks[0].id, TrackId::from("A.ogg"));
    assert_eq!(tracks[1].title, "b");
    assert!(tracks[1].source.ends_with("b.MP3"));
}

#[test]
fn scan_ids_are_relative_and_escape_commas() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("Crosby, Stills");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("song.mp3"), b"not real").unwrap();

    let tracks = scan(dir.path(), &LibrarySettings::default());
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, TrackId::from("Crosby%2C Stills/song.mp3"));
}

#[test]
fn scan_respects_include_hidden_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
    fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        include_hidden: false,
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "visible");
}

#[test]
fn scan_respects_recursive_false() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("child.mp3"), b"not real").unwrap();

    let settings = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "root");
}

#[test]
fn scan_respects_max_depth() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = d1.join("d2");
    fs::create_dir_all(&d2).unwrap();
    fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
    fs::write(d1.join("one.mp3"), b"not real").unwrap();
    fs::write(d2.join("two.mp3"), b"not real").unwrap();

    // WalkDir depth counts root as 0, children as 1, grandchildren as 2.
    let settings = LibrarySettings {
        max_depth: Some(2),
        ..LibrarySettings::default()
    };
    let names: Vec<String> = scan(dir.path(), &settings)
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert!(names.contains(&"root".to_string()));
    assert!(names.contains(&"one".to_string()));
    assert!(!names.contains(&"two".to_string()));
}

#[test]
fn dir_catalog_requires_scan_before_list() {
    let dir = tempdir().unwrap();
    let mut catalog = DirCatalog::new(dir.path(), LibrarySettings::default());
    assert!(matches!(catalog.list(0), Err(CatalogError::NotScanned)));
}

#[test]
fn dir_catalog_list_honours_limit() {
    let dir = tempdir().unwrap();
    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        fs::write(dir.path().join(name), b"not real").unwrap();
    }
    let mut catalog = DirCatalog::new(dir.path(), LibrarySettings::default());
    catalog.scan().unwrap();
    assert_eq!(catalog.list(2).unwrap().len(), 2);
    assert_eq!(catalog.list(0).unwrap().len(), 3);
}

#[test]
fn fetch_reports_missing_root() {
    let mut catalog = DirCatalog::new(
        Path::new("/definitely/not/a/music/dir"),
        LibrarySettings::default(),
    );
    assert!(matches!(
        fetch(&mut catalog, 0),
        Err(CatalogError::MissingRoot(_))
    ));
}

#[test]
fn fetch_builds_library_from_catalog() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("x.mp3"), b"not real").unwrap();
    let mut catalog = DirCatalog::new(dir.path(), LibrarySettings::default());
    let lib = fetch(&mut catalog, 0).unwrap();
    assert_eq!(lib.len(), 1);
    // Untagged files carry no album.
    assert!(lib.albums().is_empty());
}
