use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::utils::get_data_dir;

pub const API_KEY_KEY: &str = "llamaApiKey";
pub const PAGE_KEY: &str = "quizData";
pub const TIMESTAMP_KEY: &str = "timestamp";

const STORE_FILE_NAME: &str = "storage.json";

type Entries = Map<String, Value>;

/// Key-value store persisted as a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn open_default() -> Result<Self> {
        let data_dir = get_data_dir()?;
        Ok(Self::at(data_dir.join(STORE_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(mut entries) = read_entries(&self.path)? else {
            return Ok(None);
        };
        let Some(value) = entries.remove(key) else {
            return Ok(None);
        };

        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| Error::StoreFormat {
                path: self.path.clone(),
                source,
            })
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        self.set_many([(key, value)])
    }

    /// Writes every entry in one read-modify-write of the backing file.
    pub fn set_many<'a, T, I>(&self, entries: I) -> Result<()>
    where
        T: Serialize,
        I: IntoIterator<Item = (&'a str, T)>,
    {
        let mut current = read_entries(&self.path)?.unwrap_or_default();
        for (key, value) in entries {
            let value = serde_json::to_value(value).map_err(|source| Error::StoreFormat {
                path: self.path.clone(),
                source,
            })?;
            current.insert(key.to_string(), value);
        }
        write_entries(&self.path, &current)
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let Some(mut entries) = read_entries(&self.path)? else {
            return Ok(false);
        };

        if entries.remove(key).is_none() {
            return Ok(false);
        }

        if entries.is_empty() {
            fs::remove_file(&self.path).map_err(|source| Error::Store {
                path: self.path.clone(),
                source,
            })?;
            return Ok(true);
        }

        write_entries(&self.path, &entries)?;
        Ok(true)
    }
}

fn read_entries(path: &Path) -> Result<Option<Entries>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse_entries(&contents, path)?)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Store {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_entries(path: &Path, entries: &Entries) -> Result<()> {
    let contents = serialize_entries(entries, path)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| Error::Store {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| Error::Store {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_entries(contents: &str, path: &Path) -> Result<Entries> {
    if contents.trim().is_empty() {
        return Ok(Entries::default());
    }

    serde_json::from_str(contents).map_err(|source| Error::StoreFormat {
        path: path.to_path_buf(),
        source,
    })
}

fn serialize_entries(entries: &Entries, path: &Path) -> Result<String> {
    let contents =
        serde_json::to_string_pretty(entries).map_err(|source| Error::StoreFormat {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(format!("{}\n", contents))
}
