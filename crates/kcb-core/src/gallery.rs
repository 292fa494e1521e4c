//! Gallery store: the JSON index of photo file names plus the files it points at.
//!
//! Layout under the public directory:
//! - `gallery.json`: ordered array of file names, the only source of truth
//! - `photo<n>.jpg`: one file per entry
//! - `latest.jpg` / `latest.txt`: copy of the tail photo and the time it was taken over
//!
//! Every mutation is a full read-modify-write of the index. There is a single
//! trusted writer, so the last write wins.

use std::{
    fs,
    io::ErrorKind,
    path::PathBuf,
};

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::{domain::PhotoId, errors::Error, Result};

pub const INDEX_FILE: &str = "gallery.json";
pub const LATEST_PHOTO_FILE: &str = "latest.jpg";
pub const LATEST_STAMP_FILE: &str = "latest.txt";

/// One line of `/list gallery` output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListedEntry {
    /// 1-based display position (insertion order).
    pub position: usize,
    pub file_name: String,
}

impl ListedEntry {
    /// `Photo #<n>` for numbered files, the raw file name otherwise.
    pub fn label(&self) -> String {
        match PhotoId::from_file_name(&self.file_name) {
            Some(id) => format!("Photo #{}", id.0),
            None => self.file_name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryStats {
    pub photos: usize,
    /// Contents of `latest.txt`, `None` when the pointer is cleared.
    pub latest_at: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GalleryStore {
    public_dir: PathBuf,
}

impl GalleryStore {
    /// Open (and on first run, initialize) the gallery under `public_dir`.
    pub fn open(public_dir: impl Into<PathBuf>) -> Result<Self> {
        let public_dir = public_dir.into();
        fs::create_dir_all(&public_dir)?;

        let store = Self { public_dir };
        if !store.index_path().exists() {
            store.save(&[])?;
            info!(path = %store.index_path().display(), "Created empty gallery index");
        }
        if !store.latest_stamp_path().exists() {
            fs::write(store.latest_stamp_path(), "")?;
        }
        Ok(store)
    }

    pub fn index_path(&self) -> PathBuf {
        self.public_dir.join(INDEX_FILE)
    }

    pub fn latest_photo_path(&self) -> PathBuf {
        self.public_dir.join(LATEST_PHOTO_FILE)
    }

    pub fn latest_stamp_path(&self) -> PathBuf {
        self.public_dir.join(LATEST_STAMP_FILE)
    }

    pub fn photo_path(&self, id: PhotoId) -> PathBuf {
        self.public_dir.join(id.file_name())
    }

    /// Current index, in insertion order. A missing index reads as empty.
    pub fn entries(&self) -> Result<Vec<String>> {
        let raw = match fs::read_to_string(self.index_path()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// One greater than the largest numbered entry, so ids are never reused after deletes.
    pub fn next_id(&self) -> Result<PhotoId> {
        next_id_for(&self.entries()?)
    }

    pub fn list(&self) -> Result<Vec<ListedEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .enumerate()
            .map(|(i, file_name)| ListedEntry {
                position: i + 1,
                file_name,
            })
            .collect())
    }

    /// Record a photo whose file is already at `photo_path(id)` and make it the latest.
    pub fn append(&self, id: PhotoId) -> Result<()> {
        let mut entries = self.entries()?;
        let name = id.file_name();
        if entries.contains(&name) {
            return Err(Error::External(format!("{name} is already in the gallery")));
        }

        entries.push(name);
        self.save(&entries)?;
        self.refresh_latest(&entries)?;

        info!(photo = %id, total = entries.len(), "Photo added to gallery");
        Ok(())
    }

    /// Remove a photo from the index and delete its file.
    ///
    /// The latest pointer only moves when the removed entry was the tail.
    pub fn remove(&self, id: PhotoId) -> Result<()> {
        let mut entries = self.entries()?;
        let name = id.file_name();
        let Some(pos) = entries.iter().position(|e| *e == name) else {
            return Err(Error::NotFound(id));
        };

        match fs::remove_file(self.photo_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(photo = %id, "Indexed photo had no file on disk");
            }
            Err(e) => return Err(e.into()),
        }

        let was_tail = pos + 1 == entries.len();
        entries.remove(pos);
        self.save(&entries)?;
        if was_tail {
            self.refresh_latest(&entries)?;
        }

        info!(photo = %id, total = entries.len(), "Photo removed from gallery");
        Ok(())
    }

    pub fn stats(&self) -> Result<GalleryStats> {
        let photos = self.entries()?.len();
        let latest_at = match fs::read_to_string(self.latest_stamp_path()) {
            Ok(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(GalleryStats { photos, latest_at })
    }

    fn save(&self, entries: &[String]) -> Result<()> {
        let txt = serde_json::to_string_pretty(entries)?;
        fs::write(self.index_path(), txt)?;
        Ok(())
    }

    fn refresh_latest(&self, entries: &[String]) -> Result<()> {
        let Some(tail) = entries.last() else {
            return self.clear_latest();
        };

        let tail_path = self.public_dir.join(tail);
        if !tail_path.is_file() {
            warn!(file = %tail, "Latest photo is missing on disk; clearing latest pointer");
            return self.clear_latest();
        }

        fs::copy(&tail_path, self.latest_photo_path())?;
        fs::write(self.latest_stamp_path(), latest_timestamp())?;
        Ok(())
    }

    fn clear_latest(&self) -> Result<()> {
        match fs::remove_file(self.latest_photo_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::write(self.latest_stamp_path(), "")?;
        Ok(())
    }
}

fn next_id_for(entries: &[String]) -> Result<PhotoId> {
    let max = entries
        .iter()
        .filter_map(|e| PhotoId::from_file_name(e))
        .map(|id| id.0)
        .max()
        .unwrap_or(0);
    max.checked_add(1).map(PhotoId).ok_or(Error::IdsExhausted)
}

/// RFC 3339 UTC, second precision: `2026-10-16T12:00:00Z`.
fn latest_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn tmp_dir(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let pid = std::process::id();
        let n = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}-{n}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn upload(store: &GalleryStore, bytes: &[u8]) -> PhotoId {
        let id = store.next_id().unwrap();
        fs::write(store.photo_path(id), bytes).unwrap();
        store.append(id).unwrap();
        id
    }

    #[test]
    fn open_initializes_empty_layout() {
        let dir = tmp_dir("kcb-gallery-open");
        let store = GalleryStore::open(&dir).unwrap();

        assert_eq!(fs::read_to_string(store.index_path()).unwrap(), "[]");
        assert_eq!(fs::read_to_string(store.latest_stamp_path()).unwrap(), "");
        assert!(store.entries().unwrap().is_empty());
        assert_eq!(store.next_id().unwrap(), PhotoId(1));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn open_keeps_existing_index() {
        let dir = tmp_dir("kcb-gallery-reopen");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(INDEX_FILE), r#"["photo3.jpg"]"#).unwrap();

        let store = GalleryStore::open(&dir).unwrap();
        assert_eq!(store.entries().unwrap(), vec!["photo3.jpg".to_string()]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn next_id_uses_max_suffix_not_length() {
        let entries = vec![
            "photo2.jpg".to_string(),
            "photo9.jpg".to_string(),
            "notes.txt".to_string(),
        ];
        assert_eq!(next_id_for(&entries).unwrap(), PhotoId(10));
        assert_eq!(next_id_for(&["notes.txt".to_string()]).unwrap(), PhotoId(1));
        assert_eq!(next_id_for(&[]).unwrap(), PhotoId(1));
    }

    #[test]
    fn next_id_refuses_to_wrap_past_the_largest_id() {
        let entries = vec![format!("photo{}.jpg", u64::MAX)];
        assert!(matches!(next_id_for(&entries), Err(Error::IdsExhausted)));

        let dir = tmp_dir("kcb-gallery-exhausted");
        let store = GalleryStore::open(&dir).unwrap();
        fs::write(store.index_path(), serde_json::to_string(&entries).unwrap()).unwrap();
        assert!(matches!(store.next_id(), Err(Error::IdsExhausted)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn uploads_list_in_order_with_increasing_ids() {
        let dir = tmp_dir("kcb-gallery-order");
        let store = GalleryStore::open(&dir).unwrap();

        let ids: Vec<PhotoId> = (0u8..4).map(|i| upload(&store, &[i])).collect();
        assert_eq!(ids, vec![PhotoId(1), PhotoId(2), PhotoId(3), PhotoId(4)]);

        // Deleting from the middle must not cause id reuse.
        store.remove(PhotoId(2)).unwrap();
        assert_eq!(upload(&store, b"e"), PhotoId(5));

        let listed = store.list().unwrap();
        let names: Vec<&str> = listed.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["photo1.jpg", "photo3.jpg", "photo4.jpg", "photo5.jpg"]
        );
        assert_eq!(listed[0].position, 1);
        assert_eq!(listed[3].position, 4);
        assert_eq!(listed[3].label(), "Photo #5");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn upload_and_delete_scenario_tracks_latest() {
        let dir = tmp_dir("kcb-gallery-scenario");
        let store = GalleryStore::open(&dir).unwrap();

        upload(&store, b"A");
        assert_eq!(store.entries().unwrap(), vec!["photo1.jpg"]);
        assert_eq!(fs::read(store.latest_photo_path()).unwrap(), b"A");

        upload(&store, b"B");
        assert_eq!(store.entries().unwrap(), vec!["photo1.jpg", "photo2.jpg"]);
        assert_eq!(fs::read(store.latest_photo_path()).unwrap(), b"B");

        store.remove(PhotoId(1)).unwrap();
        assert_eq!(store.entries().unwrap(), vec!["photo2.jpg"]);
        assert_eq!(fs::read(store.latest_photo_path()).unwrap(), b"B");
        assert!(!store.photo_path(PhotoId(1)).exists());

        store.remove(PhotoId(2)).unwrap();
        assert!(store.entries().unwrap().is_empty());
        assert!(!store.latest_photo_path().exists());
        assert_eq!(fs::read_to_string(store.latest_stamp_path()).unwrap(), "");
        assert_eq!(
            store.stats().unwrap(),
            GalleryStats {
                photos: 0,
                latest_at: None
            }
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn deleting_non_tail_leaves_latest_untouched() {
        let dir = tmp_dir("kcb-gallery-nontail");
        let store = GalleryStore::open(&dir).unwrap();
        upload(&store, b"A");
        upload(&store, b"B");

        fs::write(store.latest_stamp_path(), "marker").unwrap();
        store.remove(PhotoId(1)).unwrap();

        assert_eq!(fs::read(store.latest_photo_path()).unwrap(), b"B");
        assert_eq!(
            fs::read_to_string(store.latest_stamp_path()).unwrap(),
            "marker"
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn deleting_tail_moves_latest_to_new_tail() {
        let dir = tmp_dir("kcb-gallery-tail");
        let store = GalleryStore::open(&dir).unwrap();
        upload(&store, b"A");
        upload(&store, b"B");

        store.remove(PhotoId(2)).unwrap();
        assert_eq!(fs::read(store.latest_photo_path()).unwrap(), b"A");

        let stamp = store.stats().unwrap().latest_at.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
        assert!(stamp.ends_with('Z'));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn remove_unknown_id_is_not_found_and_changes_nothing() {
        let dir = tmp_dir("kcb-gallery-notfound");
        let store = GalleryStore::open(&dir).unwrap();
        upload(&store, b"A");

        assert!(matches!(
            store.remove(PhotoId(9)),
            Err(Error::NotFound(PhotoId(9)))
        ));
        assert_eq!(store.entries().unwrap(), vec!["photo1.jpg"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let dir = tmp_dir("kcb-gallery-dangling");
        let store = GalleryStore::open(&dir).unwrap();
        upload(&store, b"A");
        fs::remove_file(store.photo_path(PhotoId(1))).unwrap();

        store.remove(PhotoId(1)).unwrap();
        assert!(store.entries().unwrap().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn dangling_tail_clears_latest() {
        let dir = tmp_dir("kcb-gallery-dangling-tail");
        let store = GalleryStore::open(&dir).unwrap();
        upload(&store, b"A");
        upload(&store, b"B");
        fs::remove_file(store.photo_path(PhotoId(1))).unwrap();

        store.remove(PhotoId(2)).unwrap();
        assert_eq!(store.entries().unwrap(), vec!["photo1.jpg"]);
        assert!(!store.latest_photo_path().exists());
        assert_eq!(store.stats().unwrap().latest_at, None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_index_is_reported_and_not_overwritten() {
        let dir = tmp_dir("kcb-gallery-corrupt");
        let store = GalleryStore::open(&dir).unwrap();
        fs::write(store.index_path(), "{not json").unwrap();

        assert!(matches!(store.entries(), Err(Error::Json(_))));
        assert!(matches!(store.remove(PhotoId(1)), Err(Error::Json(_))));
        assert_eq!(fs::read_to_string(store.index_path()).unwrap(), "{not json");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn append_rejects_duplicates() {
        let dir = tmp_dir("kcb-gallery-dup");
        let store = GalleryStore::open(&dir).unwrap();
        let id = upload(&store, b"A");

        assert!(store.append(id).is_err());
        assert_eq!(store.entries().unwrap().len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
