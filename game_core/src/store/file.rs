use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::memory::Tables;
use super::{Collection, Store, StoreError, StoreResult};
use crate::common::Record;

const DATA_DIRECTORY: &str = "see_color";
pub const DEFAULT_FILE_NAME: &str = "see_color.json";

/// A [Store] kept as one JSON document on disk.
///
/// The whole document is rewritten after every mutation. That is plenty for a
/// handful of channels and players, and keeps the file readable by hand.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist yet.
    ///
    /// A bare file name is placed in the user's data directory.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = resolve_path(Cow::Borrowed(path.as_ref()))?.into_owned();
        let tables = if path.exists() {
            log::info!("Loading records from {path:?}");
            let reader = BufReader::new(File::open(&path)?);
            serde_json::from_reader(reader)?
        } else {
            log::info!("No records at {path:?} yet, starting fresh");
            Tables::default()
        };
        Ok(JsonFileStore {
            path,
            tables: Mutex::new(tables),
        })
    }

    pub fn open_default() -> StoreResult<Self> {
        Self::open(DEFAULT_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tables: &Tables) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                log::info!("Creating parent directory {parent:?}");
                std::fs::create_dir_all(parent)?;
            }
        }
        // Write aside and rename so a crash never leaves half a document.
        let staging = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer_pretty(&mut writer, tables)?;
            writer.flush()?;
        }
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut Tables) -> StoreResult<T>) -> StoreResult<T> {
        let mut tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        let mut updated = tables.clone();
        let result = op(&mut updated)?;
        self.persist(&updated)?;
        *tables = updated;
        Ok(result)
    }
}

impl Store for JsonFileStore {
    fn get(&self, collection: Collection, filter: &Record) -> StoreResult<Vec<Record>> {
        let tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.get(collection, filter))
    }

    fn create(&self, collection: Collection, fields: Record) -> StoreResult<Record> {
        self.mutate(|tables| tables.create(collection, fields))
    }

    fn set(&self, collection: Collection, filter: &Record, fields: Record) -> StoreResult<()> {
        self.mutate(|tables| {
            tables.set(collection, filter, &fields);
            Ok(())
        })
    }

    fn remove(&self, collection: Collection, filter: &Record) -> StoreResult<()> {
        self.mutate(|tables| {
            tables.remove(collection, filter);
            Ok(())
        })
    }
}

fn resolve_path(path: Cow<'_, Path>) -> std::io::Result<Cow<'_, Path>> {
    if path.parent() == Some(Path::new("")) {
        let mut path_buf = data_directory()?;
        path_buf.push(path.as_ref());
        Ok(Cow::Owned(path_buf))
    } else {
        Ok(path)
    }
}

/// `$XDG_DATA_HOME/see_color`, or `~/.local/share/see_color` without it.
pub fn data_directory() -> std::io::Result<PathBuf> {
    let mut path = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            let home = homedir::get_my_home()?.ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "No home directory")
            })?;
            let mut path_buf = home;
            path_buf.push(".local");
            path_buf.push("share");
            Ok::<_, std::io::Error>(path_buf)
        })?;
    path.push(DATA_DIRECTORY);
    Ok(path)
}
