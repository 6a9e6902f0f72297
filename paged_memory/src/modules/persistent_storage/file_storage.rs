/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{
    fs::{create_dir, create_dir_all, read_to_string, remove_dir_all, remove_file, rename, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::StorageError, frame::Frame, memory_state::MemorySnapshot, page_table::ProcessTableEntry,
    MemoryConfig, Tier,
};

use super::PersistentStorageModule;

const PRIMARY_FILE: &str = "primary.json";
const SECONDARY_FILE: &str = "secondary.json";
const PROCESS_TABLE_FILE: &str = "process_table.json";

/// names the live generation directory
const CURRENT_FILE: &str = "current";
const CURRENT_TEMP_FILE: &str = "current.tmp";
const GENERATION_PREFIX: &str = "generation-";

#[derive(Serialize)]
struct FrameStoreFileRef<'a> {
    frames: &'a [Frame],
}

#[derive(Deserialize)]
struct FrameStoreFile {
    frames: Vec<Frame>,
}

#[derive(Serialize)]
struct ProcessTableFileRef<'a> {
    processes: &'a [ProcessTableEntry],
}

#[derive(Deserialize)]
struct ProcessTableFile {
    processes: Vec<ProcessTableEntry>,
}

/// Stores each frame store and the process table as json files.
///
/// The files live in a generation directory. A commit writes a complete new
/// generation and then renames a new `current` file into place, which makes
/// the new generation live. Until that rename the previous generation stays
/// untouched, so a failed commit leaves the previous state behind.
pub struct FilePersistentStorageModule {
    /// directory holding the `current` file and the generations
    directory: PathBuf,

    /// remove the directory when this module is dropped
    remove_on_drop: bool,
}

impl FilePersistentStorageModule {
    /// Creates a new store inside of `directory` where every frame is free.
    ///
    /// An existing store in that directory is overwritten.
    pub fn create<P: Into<PathBuf>>(directory: P, config: &MemoryConfig) -> Result<Self, StorageError> {
        let mut module = Self {
            directory: directory.into(),
            remove_on_drop: false,
        };

        create_dir_all(&module.directory)?;
        module.commit(&MemorySnapshot::formatted(config))?;

        debug!("Created new frame store in {}", module.directory.display());
        Ok(module)
    }

    /// Opens an existing store
    pub fn open<P: Into<PathBuf>>(directory: P) -> Result<Self, StorageError> {
        let module = Self {
            directory: directory.into(),
            remove_on_drop: false,
        };

        let generation = module.generation_directory()?;
        for name in [PRIMARY_FILE, SECONDARY_FILE, PROCESS_TABLE_FILE] {
            let path = generation.join(name);
            if !path.is_file() {
                return Err(StorageError::Missing {
                    what: path.display().to_string(),
                });
            }
        }

        Ok(module)
    }

    /// Like [`FilePersistentStorageModule::create`], but the directory is removed again on drop
    pub fn temporary<P: Into<PathBuf>>(directory: P, config: &MemoryConfig) -> Result<Self, StorageError> {
        let mut module = Self::create(directory, config)?;
        module.remove_on_drop = true;
        Ok(module)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Directory of the live generation, holding the three json files
    pub fn generation_directory(&self) -> Result<PathBuf, StorageError> {
        match self.current_generation()? {
            Some(generation) => Ok(self.generation_path(generation)),
            None => Err(StorageError::Missing {
                what: self.directory.join(CURRENT_FILE).display().to_string(),
            }),
        }
    }

    fn generation_path(&self, generation: u64) -> PathBuf {
        self.directory
            .join(format!("{}{}", GENERATION_PREFIX, generation))
    }

    fn current_generation(&self) -> Result<Option<u64>, StorageError> {
        let path = self.directory.join(CURRENT_FILE);
        if !path.is_file() {
            return Ok(None);
        }

        let content = read_to_string(&path)?;
        let name = content.trim();
        name.strip_prefix(GENERATION_PREFIX)
            .and_then(|generation| generation.parse().ok())
            .map(Some)
            .ok_or_else(|| StorageError::Inconsistent {
                reason: format!("{} does not name a generation: {:?}", path.display(), name),
            })
    }

    fn frame_file(tier: Tier) -> &'static str {
        match tier {
            Tier::Primary => PRIMARY_FILE,
            Tier::Secondary => SECONDARY_FILE,
        }
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, StorageError> {
        let path = self.generation_directory()?.join(name);
        if !path.is_file() {
            return Err(StorageError::Missing {
                what: path.display().to_string(),
            });
        }

        trace!("Read {}", path.display());
        let file = File::open(&path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
        trace!("Write {}", path.display());

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        Ok(())
    }

    /// Writes all parts of `snapshot` into a fresh generation directory
    fn write_generation(&self, generation: u64, snapshot: &MemorySnapshot) -> Result<(), StorageError> {
        let directory = self.generation_path(generation);
        if directory.exists() {
            // left behind by an interrupted commit, never live
            remove_dir_all(&directory)?;
        }
        create_dir(&directory)?;

        Self::write_json(
            &directory.join(PRIMARY_FILE),
            &FrameStoreFileRef {
                frames: &snapshot.primary,
            },
        )?;
        Self::write_json(
            &directory.join(SECONDARY_FILE),
            &FrameStoreFileRef {
                frames: &snapshot.secondary,
            },
        )?;
        Self::write_json(
            &directory.join(PROCESS_TABLE_FILE),
            &ProcessTableFileRef {
                processes: &snapshot.processes,
            },
        )?;

        sync_directory(&directory)?;
        Ok(())
    }

    /// Makes `generation` live. The rename is the commit point.
    fn publish(&self, generation: u64) -> Result<(), StorageError> {
        let temp = self.directory.join(CURRENT_TEMP_FILE);

        let mut file = File::create(&temp)?;
        write!(file, "{}{}", GENERATION_PREFIX, generation)?;
        file.sync_all()?;
        drop(file);

        rename(&temp, self.directory.join(CURRENT_FILE))?;
        Ok(())
    }

    /// Removes everything a failed commit of `generation` left behind
    fn discard(&self, generation: u64) {
        let directory = self.generation_path(generation);
        if directory.exists() {
            if let Err(err) = remove_dir_all(&directory) {
                warn!("Could not remove {}: {}", directory.display(), err);
            }
        }

        let temp = self.directory.join(CURRENT_TEMP_FILE);
        if temp.is_file() {
            let _ = remove_file(temp);
        }
    }

    fn load_snapshot(&mut self) -> Result<MemorySnapshot, StorageError> {
        Ok(MemorySnapshot {
            primary: self.load_frame_store(Tier::Primary)?,
            secondary: self.load_frame_store(Tier::Secondary)?,
            processes: self.load_process_table()?,
        })
    }
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> io::Result<()> {
    Ok(())
}

impl PersistentStorageModule for FilePersistentStorageModule {
    fn load_frame_store(&mut self, tier: Tier) -> Result<Vec<Frame>, StorageError> {
        let file: FrameStoreFile = self.read_json(Self::frame_file(tier))?;
        Ok(file.frames)
    }

    /// Commits a new generation where only the frames of `tier` changed
    fn save_frame_store(&mut self, tier: Tier, frames: &[Frame]) -> Result<(), StorageError> {
        let mut snapshot = self.load_snapshot()?;
        match tier {
            Tier::Primary => snapshot.primary = frames.to_vec(),
            Tier::Secondary => snapshot.secondary = frames.to_vec(),
        }
        self.commit(&snapshot)
    }

    fn load_process_table(&mut self) -> Result<Vec<ProcessTableEntry>, StorageError> {
        let file: ProcessTableFile = self.read_json(PROCESS_TABLE_FILE)?;
        Ok(file.processes)
    }

    fn save_process_table(&mut self, processes: &[ProcessTableEntry]) -> Result<(), StorageError> {
        let mut snapshot = self.load_snapshot()?;
        snapshot.processes = processes.to_vec();
        self.commit(&snapshot)
    }

    fn commit(&mut self, snapshot: &MemorySnapshot) -> Result<(), StorageError> {
        let current = self.current_generation()?;
        let next = current.map_or(0, |generation| generation + 1);

        if let Err(err) = self
            .write_generation(next, snapshot)
            .and_then(|_| self.publish(next))
        {
            self.discard(next);
            return Err(err);
        }

        // the new generation is live from here on
        if let Err(err) = sync_directory(&self.directory) {
            warn!("Could not sync {}: {}", self.directory.display(), err);
        }

        if let Some(previous) = current {
            let previous = self.generation_path(previous);
            if let Err(err) = remove_dir_all(&previous) {
                warn!("Could not remove {}: {}", previous.display(), err);
            }
        }

        debug!("Committed generation {} in {}", next, self.directory.display());
        Ok(())
    }
}

impl Drop for FilePersistentStorageModule {
    fn drop(&mut self) {
        if self.remove_on_drop && self.directory.exists() {
            let _ = remove_dir_all(&self.directory);
        }
    }
}
