//! Offline persistence of workspace trees.
//!
//! The store keeps one self-contained record per top-level workspace,
//! partitioned by [`Scope`]:
//!
//! ```text
//! <data dir>/
//!   guest/
//!     Ideas.json
//!     .sync_meta.json
//!   users/
//!     alice/
//!       Notes.json
//!       .sync_meta.json
//! ```
//!
//! File names are escaped titles, so any title maps to exactly one record.
//! Titles too long for a file name are truncated and suffixed with a hash;
//! the full title is always read back from the record itself. Guest and user
//! namespaces never overlap; switching scope never touches guest records.

use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{self, WorkspaceDocument};
use crate::error::{MindNoteError, Result};
use crate::fs::FileSystem;
use crate::workspace::WorkspaceTree;

const GUEST_DIR: &str = "guest";
const USERS_DIR: &str = "users";
const META_FILE: &str = ".sync_meta.json";
const RECORD_EXT: &str = "json";
const BACKUP_EXT: &str = "bak";

/// Longest file stem, leaving room for the extension within a 255-byte file name.
const MAX_STEM_BYTES: usize = 200;
/// Joins a truncated stem to its hash; escaping never produces it.
const HASH_MARK: char = '~';
const HASH_SUFFIX_BYTES: usize = 17;

/// Ownership partition of local data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Data created before signing in
    Guest,
    /// Data belonging to a signed-in user
    User(String),
}

impl Scope {
    /// Scope for a user id.
    pub fn user(id: impl Into<String>) -> Self {
        Scope::User(id.into())
    }

    /// Whether this is the guest scope.
    pub fn is_guest(&self) -> bool {
        matches!(self, Scope::Guest)
    }

    /// Owner string stamped on records (empty for guest).
    pub fn owner(&self) -> &str {
        match self {
            Scope::Guest => "",
            Scope::User(id) => id,
        }
    }

    /// Directory of this scope, relative to the store root.
    pub fn namespace(&self) -> PathBuf {
        match self {
            Scope::Guest => PathBuf::from(GUEST_DIR),
            Scope::User(id) => Path::new(USERS_DIR).join(escape_name(id)),
        }
    }

    fn record_label(&self) -> &str {
        match self {
            Scope::Guest => GUEST_DIR,
            Scope::User(id) => id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Guest => write!(f, "guest"),
            Scope::User(id) => write!(f, "user '{}'", id),
        }
    }
}

/// One persisted top-level workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecord {
    /// `"guest"` or the owning user id
    pub scope: String,
    /// The full tree
    pub tree: WorkspaceDocument,
    /// When the record was written
    pub saved_at: DateTime<Utc>,
}

/// Per-scope bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ScopeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_sync_time: Option<DateTime<Utc>>,
}

/// Scope-partitioned record store on top of a [`FileSystem`].
pub struct LocalStore<FS: FileSystem> {
    fs: FS,
    root: PathBuf,
}

impl<FS: FileSystem> LocalStore<FS> {
    /// Create a store rooted at `root`.
    pub fn new(fs: FS, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    /// Get a reference to the underlying filesystem
    pub fn fs_ref(&self) -> &FS {
        &self.fs
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directory of a scope.
    pub fn scope_dir(&self, scope: &Scope) -> PathBuf {
        self.root.join(scope.namespace())
    }

    fn record_path(&self, scope: &Scope, title: &str) -> PathBuf {
        self.scope_dir(scope)
            .join(format!("{}.{}", escape_name(title), RECORD_EXT))
    }

    fn meta_path(&self, scope: &Scope) -> PathBuf {
        self.scope_dir(scope).join(META_FILE)
    }

    /// Persist a tree, replacing any record with the same title in `scope`.
    pub fn save(&self, scope: &Scope, tree: &WorkspaceTree) -> Result<()> {
        let mut doc = codec::encode(tree)?;
        doc.owner = scope.owner().to_string();
        self.save_document(scope, doc)
    }

    /// Persist an already encoded tree.
    pub fn save_document(&self, scope: &Scope, doc: WorkspaceDocument) -> Result<()> {
        let (path, contents) = self.prepare(scope, doc)?;
        self.ensure_scope_dir(scope)?;
        self.fs
            .write_file(&path, &contents)
            .map_err(|e| MindNoteError::FileWrite {
                path: path.clone(),
                source: e,
            })?;
        log::debug!("Saved {} to {} storage", path.display(), scope);
        Ok(())
    }

    /// Persist several trees as one commit.
    ///
    /// Every record is serialized before anything is written. If a write
    /// fails, the records already written are put back the way they were.
    pub fn save_all(&self, scope: &Scope, docs: Vec<WorkspaceDocument>) -> Result<()> {
        let prepared = docs
            .into_iter()
            .map(|doc| self.prepare(scope, doc))
            .collect::<Result<Vec<_>>>()?;
        self.ensure_scope_dir(scope)?;

        let mut written: Vec<(PathBuf, Option<String>)> = Vec::with_capacity(prepared.len());
        for (path, contents) in prepared {
            let previous = if self.fs.exists(&path) {
                match self.fs.read_to_string(&path) {
                    Ok(previous) => Some(previous),
                    Err(e) => {
                        self.roll_back(written);
                        return Err(MindNoteError::FileRead { path, source: e });
                    }
                }
            } else {
                None
            };
            if let Err(e) = self.fs.write_file(&path, &contents) {
                self.roll_back(written);
                return Err(MindNoteError::FileWrite { path, source: e });
            }
            written.push((path, previous));
        }
        log::debug!("Committed {} record(s) to {} storage", written.len(), scope);
        Ok(())
    }

    fn roll_back(&self, written: Vec<(PathBuf, Option<String>)>) {
        for (path, previous) in written.into_iter().rev() {
            let restored = match previous {
                Some(contents) => self.fs.write_file(&path, &contents),
                None => self.fs.delete_file(&path),
            };
            if let Err(e) = restored {
                log::warn!("Could not roll back {}: {}", path.display(), e);
            }
        }
    }

    /// Build the record file for `doc` without writing it.
    fn prepare(&self, scope: &Scope, mut doc: WorkspaceDocument) -> Result<(PathBuf, String)> {
        if doc.title.trim().is_empty() {
            return Err(MindNoteError::InvalidOperation(
                "cannot store a workspace without a title".to_string(),
            ));
        }
        doc.owner = scope.owner().to_string();
        doc.is_main = true;

        let path = self.record_path(scope, &doc.title);
        let record = SyncRecord {
            scope: scope.record_label().to_string(),
            tree: doc,
            saved_at: Utc::now(),
        };
        Ok((path, serde_json::to_string_pretty(&record)?))
    }

    fn ensure_scope_dir(&self, scope: &Scope) -> Result<()> {
        let dir = self.scope_dir(scope);
        self.fs
            .create_dir_all(&dir)
            .map_err(|e| MindNoteError::FileWrite {
                path: dir.clone(),
                source: e,
            })
    }

    /// Copy the record for `title` aside (`<name>.json.bak`) before it is replaced.
    ///
    /// Returns the backup path, or `None` when there is no record.
    pub fn backup_record(&self, scope: &Scope, title: &str) -> Result<Option<PathBuf>> {
        let path = self.record_path(scope, title);
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        let contents = self
            .fs
            .read_to_string(&path)
            .map_err(|e| MindNoteError::FileRead {
                path: path.clone(),
                source: e,
            })?;
        let backup = path.with_extension(format!("{}.{}", RECORD_EXT, BACKUP_EXT));
        self.fs
            .write_file(&backup, &contents)
            .map_err(|e| MindNoteError::FileWrite {
                path: backup.clone(),
                source: e,
            })?;
        Ok(Some(backup))
    }

    /// Read the raw record for a title.
    pub fn load_record(&self, scope: &Scope, title: &str) -> Result<SyncRecord> {
        let path = self.record_path(scope, title);
        if !self.fs.exists(&path) {
            return Err(MindNoteError::NotFound {
                scope: scope.to_string(),
                title: title.to_string(),
            });
        }
        self.read_record(&path)
    }

    fn read_record(&self, path: &Path) -> Result<SyncRecord> {
        let contents = self
            .fs
            .read_to_string(path)
            .map_err(|e| MindNoteError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        serde_json::from_str(&contents).map_err(|e| {
            MindNoteError::Serialization(format!("{}: {}", path.display(), e))
        })
    }

    /// Load one tree. Fails with `NotFound` when absent and `Serialization` when unreadable.
    pub fn load(&self, scope: &Scope, title: &str) -> Result<WorkspaceTree> {
        let record = self.load_record(scope, title)?;
        codec::decode(&record.tree).map_err(|e| match e {
            MindNoteError::Serialization(_) => e,
            other => MindNoteError::Serialization(format!("'{}': {}", title, other)),
        })
    }

    /// Best-effort load: a missing or corrupt record yields an empty tree.
    pub fn load_or_empty(&self, scope: &Scope, title: &str) -> WorkspaceTree {
        match self.load(scope, title) {
            Ok(tree) => tree,
            Err(e) => {
                if !matches!(e, MindNoteError::NotFound { .. }) {
                    log::warn!("Treating '{}' in {} storage as empty: {}", title, scope, e);
                }
                let mut tree = WorkspaceTree::create_root(title);
                tree.set_owner(scope.owner());
                tree
            }
        }
    }

    /// Titles of every record in `scope`.
    pub fn list(&self, scope: &Scope) -> BTreeSet<String> {
        let dir = self.scope_dir(scope);
        let files = match self.fs.list_files_with_extension(&dir, RECORD_EXT) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("Could not list {} storage: {}", scope, e);
                return BTreeSet::new();
            }
        };

        files
            .iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                if stem.starts_with('.') {
                    return None;
                }
                self.title_of(path, stem, scope)
            })
            .collect()
    }

    /// Title stored at `path`: decoded from the name, or read from a hashed record.
    fn title_of(&self, path: &Path, stem: &str, scope: &Scope) -> Option<String> {
        if let Some(title) = unescape_name(stem) {
            return Some(title);
        }
        if stem.contains(HASH_MARK) {
            return match self.read_record(path) {
                Ok(record) => Some(record.tree.title),
                Err(e) => {
                    log::warn!("Ignoring unreadable '{}' in {} storage: {}", stem, scope, e);
                    None
                }
            };
        }
        log::warn!("Ignoring unexpected file '{}' in {} storage", stem, scope);
        None
    }

    /// Every readable tree in `scope`, ordered by title. Corrupt records are skipped.
    pub fn load_all(&self, scope: &Scope) -> Vec<WorkspaceTree> {
        self.list(scope)
            .into_iter()
            .filter_map(|title| match self.load(scope, &title) {
                Ok(tree) => Some(tree),
                Err(e) => {
                    log::warn!("Skipping '{}' in {} storage: {}", title, scope, e);
                    None
                }
            })
            .collect()
    }

    /// Delete one record. Returns whether it existed.
    pub fn remove(&self, scope: &Scope, title: &str) -> Result<bool> {
        let path = self.record_path(scope, title);
        if !self.fs.exists(&path) {
            return Ok(false);
        }
        self.fs
            .delete_file(&path)
            .map_err(|e| MindNoteError::FileWrite {
                path: path.clone(),
                source: e,
            })?;
        log::debug!("Removed '{}' from {} storage", title, scope);
        Ok(true)
    }

    /// Delete every record in `scope`, returning how many were removed.
    pub fn clear_scope(&self, scope: &Scope) -> Result<usize> {
        let mut removed = 0;
        for title in self.list(scope) {
            if self.remove(scope, &title)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Make `scope` hold exactly `docs`.
    pub fn replace_all(&self, scope: &Scope, docs: Vec<WorkspaceDocument>) -> Result<()> {
        let keep: BTreeSet<String> = docs.iter().map(|d| d.title.clone()).collect();
        self.save_all(scope, docs)?;
        for stale in self.list(scope).difference(&keep) {
            self.remove(scope, stale)?;
        }
        Ok(())
    }

    /// Last successful sync for `scope`, if any.
    pub fn last_sync_time(&self, scope: &Scope) -> Option<DateTime<Utc>> {
        let path = self.meta_path(scope);
        let contents = self.fs.read_to_string(&path).ok()?;
        match serde_json::from_str::<ScopeMeta>(&contents) {
            Ok(meta) => meta.last_sync_time,
            Err(e) => {
                log::warn!("Ignoring unreadable sync metadata for {}: {}", scope, e);
                None
            }
        }
    }

    /// Record a successful sync for `scope`.
    pub fn set_last_sync_time(&self, scope: &Scope, time: DateTime<Utc>) -> Result<()> {
        let dir = self.scope_dir(scope);
        let path = self.meta_path(scope);
        let meta = ScopeMeta {
            last_sync_time: Some(time),
        };
        let contents = serde_json::to_string_pretty(&meta)?;
        self.fs
            .create_dir_all(&dir)
            .and_then(|_| self.fs.write_file(&path, &contents))
            .map_err(|e| MindNoteError::FileWrite { path, source: e })
    }
}

/// Escape a title or user id into a single portable file name.
///
/// ASCII letters, digits, space, `-` and `_` are kept, as is any printable
/// non-ASCII character. Every other byte becomes `%XX`. Names longer than
/// 200 bytes are cut at a character boundary and end in `~` plus a 16-digit
/// hash of the full name.
pub fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        push_escaped(&mut out, ch);
    }
    if out.len() <= MAX_STEM_BYTES {
        return out;
    }

    let mut short = String::with_capacity(MAX_STEM_BYTES);
    for ch in name.chars() {
        let before = short.len();
        push_escaped(&mut short, ch);
        if short.len() > MAX_STEM_BYTES - HASH_SUFFIX_BYTES {
            short.truncate(before);
            break;
        }
    }
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    format!("{}{}{:016x}", short, HASH_MARK, hasher.finish())
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        'a'..='z' | 'A'..='Z' | '0'..='9' | ' ' | '-' | '_' => out.push(ch),
        c if !c.is_ascii() && !c.is_control() => out.push(c),
        c => {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
}

/// Inverse of [`escape_name`]. Returns `None` for names it could not have
/// produced and for hashed names, whose title lives only in the record.
pub fn unescape_name(escaped: &str) -> Option<String> {
    if escaped.contains(HASH_MARK) {
        return None;
    }
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = escaped.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFileSystem, RealFileSystem};
    use crate::workspace::Item;

    fn store() -> LocalStore<InMemoryFileSystem> {
        LocalStore::new(InMemoryFileSystem::new(), "data")
    }

    fn tree(title: &str) -> WorkspaceTree {
        let mut tree = WorkspaceTree::create_root(title);
        let root = tree.root();
        tree.add_item(root, Item::text("body")).unwrap();
        tree.create_child(root, "Child").unwrap();
        tree
    }

    #[test]
    fn test_save_and_load() {
        let store = store();
        let alice = Scope::user("alice");
        store.save(&alice, &tree("Notes")).unwrap();

        let loaded = store.load(&alice, "Notes").unwrap();
        assert_eq!(loaded.owner(), "alice");
        assert_eq!(loaded.children(loaded.root()).unwrap().len(), 1);
        assert_eq!(store.list(&alice), BTreeSet::from(["Notes".to_string()]));
    }

    #[test]
    fn test_scopes_are_isolated() {
        let store = store();
        let alice = Scope::user("alice");
        store.save(&Scope::Guest, &tree("Ideas")).unwrap();
        store.save(&alice, &tree("Notes")).unwrap();

        assert_eq!(store.list(&Scope::Guest).len(), 1);
        assert!(store.list(&Scope::user("bob")).is_empty());
        assert!(matches!(
            store.load(&alice, "Ideas"),
            Err(MindNoteError::NotFound { .. })
        ));

        // Clearing a user scope leaves guest data alone
        assert_eq!(store.clear_scope(&alice).unwrap(), 1);
        assert!(store.list(&alice).is_empty());
        assert_eq!(store.list(&Scope::Guest).len(), 1);
    }

    #[test]
    fn test_user_named_guest_does_not_collide() {
        let store = store();
        store.save(&Scope::Guest, &tree("Ideas")).unwrap();
        assert!(store.list(&Scope::user("guest")).is_empty());
    }

    #[test]
    fn test_corrupt_record_degrades() {
        let store = store();
        store.save(&Scope::Guest, &tree("Good")).unwrap();
        store
            .fs_ref()
            .write_file(Path::new("data/guest/Bad.json"), "{not json")
            .unwrap();

        assert!(matches!(
            store.load(&Scope::Guest, "Bad"),
            Err(MindNoteError::Serialization(_))
        ));

        // Best-effort reads skip or blank the corrupt record
        let all = store.load_all(&Scope::Guest);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title(), "Good");

        let empty = store.load_or_empty(&Scope::Guest, "Bad");
        assert_eq!(empty.title(), "Bad");
        assert!(empty.node(empty.root()).unwrap().items().is_empty());
    }

    #[test]
    fn test_titles_with_special_characters() {
        let store = store();
        let title = "Q1/Q2 plans: 50% done?";
        store.save(&Scope::Guest, &tree(title)).unwrap();

        assert!(store.list(&Scope::Guest).contains(title));
        assert_eq!(store.load(&Scope::Guest, title).unwrap().title(), title);
        assert!(store.remove(&Scope::Guest, title).unwrap());
        assert!(!store.remove(&Scope::Guest, title).unwrap());
    }

    #[test]
    fn test_replace_all_drops_stale_records() {
        let store = store();
        let alice = Scope::user("alice");
        store.save(&alice, &tree("Old")).unwrap();
        store.save(&alice, &tree("Kept")).unwrap();

        let docs = vec![
            codec::encode(&tree("Kept")).unwrap(),
            codec::encode(&tree("New")).unwrap(),
        ];
        store.replace_all(&alice, docs).unwrap();

        assert_eq!(
            store.list(&alice),
            BTreeSet::from(["Kept".to_string(), "New".to_string()])
        );
    }

    #[test]
    fn test_last_sync_time() {
        let store = store();
        let alice = Scope::user("alice");
        assert!(store.last_sync_time(&alice).is_none());

        let now = Utc::now();
        store.set_last_sync_time(&alice, now).unwrap();
        assert_eq!(store.last_sync_time(&alice), Some(now));
        // Metadata is not mistaken for a record
        assert!(store.list(&alice).is_empty());
        assert!(store.last_sync_time(&Scope::Guest).is_none());
    }

    #[test]
    fn test_escape_round_trip() {
        for name in ["plain", "with space", "a/b\\c", ".hidden", "日記", "100%"] {
            let escaped = escape_name(name);
            assert!(!escaped.contains('/'));
            assert!(!escaped.starts_with('.'));
            assert_eq!(unescape_name(&escaped).as_deref(), Some(name));
        }
        assert!(unescape_name("bad%Z").is_none());
    }

    #[test]
    fn test_long_non_ascii_titles_fit_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(RealFileSystem, dir.path());
        let russian = "Планы на следующую неделю и основные задачи проекта";
        store.save(&Scope::Guest, &tree(russian)).unwrap();
        assert!(dir.path().join("guest").join(format!("{}.json", russian)).exists());

        // Too long even unescaped: truncated and hashed
        let long = "Очень длинный заголовок ".repeat(12);
        let sibling = format!("{}!", long);
        store.save(&Scope::Guest, &tree(&long)).unwrap();
        store.save(&Scope::Guest, &tree(&sibling)).unwrap();
        assert!(escape_name(&long).len() <= MAX_STEM_BYTES);
        assert_ne!(escape_name(&long), escape_name(&sibling));

        let titles = store.list(&Scope::Guest);
        assert_eq!(titles.len(), 3);
        assert!(titles.contains(russian));
        assert!(titles.contains(&long));
        assert_eq!(store.load(&Scope::Guest, &sibling).unwrap().title(), sibling);
        assert_eq!(store.load_all(&Scope::Guest).len(), 3);

        assert_eq!(store.clear_scope(&Scope::Guest).unwrap(), 3);
        assert!(store.list(&Scope::Guest).is_empty());
    }

    #[test]
    fn test_deepest_tree_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(RealFileSystem, dir.path());

        let mut deep = WorkspaceTree::create_root("Deep");
        let mut current = deep.root();
        let mut refused = None;
        for level in 1..=100 {
            match deep.create_child(current, format!("Level {}", level)) {
                Ok(child) => current = child,
                Err(e) => {
                    refused = Some(e);
                    break;
                }
            }
        }
        assert!(matches!(refused, Some(MindNoteError::TooDeep { .. })));
        deep.add_item(current, Item::text("bottom")).unwrap();

        store.save(&Scope::Guest, &deep).unwrap();
        assert_eq!(store.load(&Scope::Guest, "Deep").unwrap(), deep);
        assert_eq!(store.load_all(&Scope::Guest).len(), 1);
    }

    /// Fails every write to a path containing "Broken".
    struct FlakyFileSystem(InMemoryFileSystem);

    impl FileSystem for FlakyFileSystem {
        fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
            self.0.read_to_string(path)
        }
        fn write_file(&self, path: &Path, content: &str) -> std::io::Result<()> {
            if path.to_string_lossy().contains("Broken") {
                return Err(std::io::Error::other("disk full"));
            }
            self.0.write_file(path, content)
        }
        fn delete_file(&self, path: &Path) -> std::io::Result<()> {
            self.0.delete_file(path)
        }
        fn exists(&self, path: &Path) -> bool {
            self.0.exists(path)
        }
        fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
            self.0.create_dir_all(path)
        }
        fn is_dir(&self, path: &Path) -> bool {
            self.0.is_dir(path)
        }
        fn list_files(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
            self.0.list_files(dir)
        }
    }

    #[test]
    fn test_save_all_rolls_back_on_failure() {
        let store = LocalStore::new(FlakyFileSystem(InMemoryFileSystem::new()), "data");
        let alice = Scope::user("alice");
        store.save(&alice, &tree("Notes")).unwrap();
        let before = store.load(&alice, "Notes").unwrap();

        let mut changed = tree("Notes");
        let root = changed.root();
        changed.add_item(root, Item::text("remote edit")).unwrap();
        let docs = vec![
            codec::encode(&changed).unwrap(),
            codec::encode(&tree("Ideas")).unwrap(),
            codec::encode(&tree("Broken")).unwrap(),
        ];

        let err = store.save_all(&alice, docs).unwrap_err();
        assert!(matches!(err, MindNoteError::FileWrite { .. }));
        assert_eq!(store.list(&alice), BTreeSet::from(["Notes".to_string()]));
        assert_eq!(store.load(&alice, "Notes").unwrap(), before);
    }

    #[test]
    fn test_backup_record_keeps_unreadable_copy() {
        let store = store();
        store
            .fs_ref()
            .write_file(Path::new("data/guest/Bad.json"), "{not json")
            .unwrap();

        let backup = store.backup_record(&Scope::Guest, "Bad").unwrap().unwrap();
        assert_eq!(backup, PathBuf::from("data/guest/Bad.json.bak"));
        assert_eq!(store.fs_ref().read_to_string(&backup).unwrap(), "{not json");
        // Backups are not records
        assert_eq!(store.list(&Scope::Guest), BTreeSet::from(["Bad".to_string()]));
        assert!(store.backup_record(&Scope::Guest, "Missing").unwrap().is_none());
    }

    #[test]
    fn test_real_filesystem_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(RealFileSystem, dir.path());
        store.save(&Scope::user("alice"), &tree("Notes")).unwrap();

        assert!(dir.path().join("users/alice/Notes.json").exists());
        let loaded = store.load(&Scope::user("alice"), "Notes").unwrap();
        assert_eq!(loaded.title(), "Notes");
    }
}
