use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// On-disk slot remembering which trip the user is currently planning
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TripStorage {
    path: PathBuf,
}

impl TripStorage {
    pub(crate) fn new(path: PathBuf) -> TripStorage {
        TripStorage { path }
    }

    pub(crate) fn get(&self) -> Result<Option<Uuid>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.error("read", source)),
        };
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }
        Uuid::parse_str(content)
            .map(Some)
            .map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    pub(crate) fn save(&self, trip_id: Uuid) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.error("write", source))?;
        }
        fs::write(&self.path, format!("{trip_id}\n")).map_err(|source| self.error("write", source))?;
        debug!(trip_id = %trip_id, path = %self.path.display(), "Saved current trip");
        Ok(())
    }

    pub(crate) fn remove(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared current trip");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.error("remove", source)),
        }
    }

    fn error(&self, op: &'static str, source: io::Error) -> StorageError {
        StorageError::Io {
            op,
            path: self.path.clone(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("failed to {op} current trip file {}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("current trip file {} does not contain a trip ID", path.display())]
    Parse { path: PathBuf, source: uuid::Error },
}
