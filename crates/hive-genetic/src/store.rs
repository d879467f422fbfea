use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    chromosome::{Chromosome, DecodeChromosomeError},
    gene::Gene,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StoreError {
    #[display("I/O error at {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("failed to decode chromosome {}", path.display())]
    Decode {
        path: PathBuf,
        source: DecodeChromosomeError,
    },
    #[display("unexpected chromosome file name {}", path.display())]
    InvalidFileName { path: PathBuf },
    #[display("chromosome {} has {actual} genes, expected {expected}", path.display())]
    ChromosomeSize {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
}

/// Where seed chromosomes come from and where each generation's best goes.
pub trait ChromosomeStore<G>
where
    G: Gene,
{
    /// Chromosomes to place in the initial population, best candidates first.
    fn load_seeds(&mut self) -> Result<Vec<Chromosome<G>>, StoreError>;

    /// Records `chromosome` as the best of `generation`.
    fn save_best(&mut self, generation: u32, chromosome: &Chromosome<G>)
    -> Result<(), StoreError>;
}

/// In-memory store, mainly for tests and embedding.
#[derive(Debug, Clone)]
pub struct MemoryStore<G> {
    seeds: Vec<Chromosome<G>>,
    saved: Vec<Chromosome<G>>,
}

impl<G> Default for MemoryStore<G> {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl<G> MemoryStore<G> {
    #[must_use]
    pub fn new(seeds: Vec<Chromosome<G>>) -> Self {
        Self {
            seeds,
            saved: vec![],
        }
    }

    #[must_use]
    pub fn saved(&self) -> &[Chromosome<G>] {
        &self.saved
    }
}

impl<G> ChromosomeStore<G> for MemoryStore<G>
where
    G: Gene,
{
    fn load_seeds(&mut self) -> Result<Vec<Chromosome<G>>, StoreError> {
        Ok(self.seeds.clone())
    }

    fn save_best(
        &mut self,
        _generation: u32,
        chromosome: &Chromosome<G>,
    ) -> Result<(), StoreError> {
        self.saved.push(chromosome.clone());
        Ok(())
    }
}

/// Chromosome files in one directory, named `{generation:05}_{id}.txt`.
///
/// Every saved generation gets its own file, even when the same chromosome
/// stays best. Seeds are the files already present, newest generation first,
/// with each id loaded once. Files that do not end in `.txt` are ignored. A
/// missing directory holds no seeds and is created on the first save.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
    chromosome_size: usize,
}

impl DirectoryStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, chromosome_size: usize) -> Self {
        Self {
            dir: dir.into(),
            chromosome_size,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.dir.clone(),
            source,
        }
    }
}

impl<G> ChromosomeStore<G> for DirectoryStore
where
    G: Gene,
{
    fn load_seeds(&mut self) -> Result<Vec<Chromosome<G>>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut files = vec![];
        for entry in entries {
            let path = entry.map_err(|e| self.io_error(e))?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".txt") {
                continue;
            }
            let Some((generation, id)) = Chromosome::<G>::parse_file_name(name) else {
                return Err(StoreError::InvalidFileName { path });
            };
            files.push((generation, id, path));
        }
        files.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut seen = HashSet::new();
        let mut seeds = Vec::with_capacity(files.len());
        for (generation, id, path) in files {
            if !seen.insert(id) {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let chromosome = Chromosome::decode(id, generation, &text).map_err(|source| {
                StoreError::Decode {
                    path: path.clone(),
                    source,
                }
            })?;
            if chromosome.len() != self.chromosome_size {
                return Err(StoreError::ChromosomeSize {
                    path,
                    expected: self.chromosome_size,
                    actual: chromosome.len(),
                });
            }
            seeds.push(chromosome);
        }
        tracing::info!(dir = %self.dir.display(), count = seeds.len(), "loaded seed chromosomes");
        Ok(seeds)
    }

    fn save_best(
        &mut self,
        generation: u32,
        chromosome: &Chromosome<G>,
    ) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| self.io_error(e))?;
        let path = self.dir.join(chromosome.file_name_at(generation));
        fs::write(&path, chromosome.encode()).map_err(|source| StoreError::Io { path, source })
    }
}
