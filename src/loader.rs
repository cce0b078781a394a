//! Sources of phantom file paths for sample generation

use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::io::Format;
use crate::{Error, Result};

/// Supplies the path of the phantom to use for the next sample
pub trait PhantomLoader {
    fn next_path(&mut self) -> Result<PathBuf>;
}

/// Cycles through the phantom files of one directory, in file name order
#[derive(Clone, Debug)]
pub struct FileLoader {
    files: Vec<PathBuf>,
    cursor: usize,
}

impl FileLoader {

    /// All `.npy` and `.raw` files in `folder` whose names do not contain `exclude`
    pub fn new(folder: &Path, exclude: Option<&str>) -> Result<Self> {
        let entries = std::fs::read_dir(folder)
            .map_err(|e| Error::data_load(folder, e))?;
        let mut paths = vec![];
        for entry in entries {
            paths.push(entry.map_err(|e| Error::data_load(folder, e))?.path());
        }
        let files: Vec<PathBuf> = paths.into_iter()
            .filter(|path| path.is_file() && Format::of(path).is_some())
            .filter(|path| match (exclude, path.file_name()) {
                (Some(pattern), Some(name)) => !name.to_string_lossy().contains(pattern),
                _ => true,
            })
            .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
            .collect();
        if files.is_empty() {
            return Err(Error::data_load(folder, "no phantom files found"));
        }
        Ok(Self { files, cursor: 0 })
    }

    pub fn files(&self) -> &[PathBuf] { &self.files }

    /// Position of the file to be served next
    pub fn cursor(&self) -> usize { self.cursor }
}

impl PhantomLoader for FileLoader {
    fn next_path(&mut self) -> Result<PathBuf> {
        let path = self.files[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.files.len();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    fn touch(dir: &Path, names: &[&str]) -> std::io::Result<()> {
        for name in names { std::fs::write(dir.join(name), b"")?; }
        Ok(())
    }

    fn names(loader: &FileLoader) -> Vec<String> {
        loader.files().iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn lists_sorts_and_excludes() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["L333_b.npy", "L286_a.npy", "L067_c.raw", "notes.txt", "L109.npy"])?;
        std::fs::create_dir(dir.path().join("sub.npy"))?;

        let loader = FileLoader::new(dir.path(), Some("L286"))?;
        assert_eq!(names(&loader), vec!["L067_c.raw", "L109.npy", "L333_b.npy"]);

        let loader = FileLoader::new(dir.path(), None)?;
        assert_eq!(loader.files().len(), 4);
        Ok(())
    }

    #[test]
    fn cursor_cycles() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["a.npy", "b.npy"])?;
        let mut loader = FileLoader::new(dir.path(), None)?;
        let served: Vec<_> = (0..5)
            .map(|_| loader.next_path())
            .collect::<Result<_>>()?;
        let a = dir.path().join("a.npy");
        let b = dir.path().join("b.npy");
        assert_eq!(served, vec![a.clone(), b.clone(), a.clone(), b, a]);
        assert_eq!(loader.cursor(), 1);
        Ok(())
    }

    #[test]
    fn empty_or_missing_folder() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["L286_only.npy"])?;
        assert!(matches!(FileLoader::new(dir.path(), Some("L286")), Err(Error::DataLoad { .. })));
        assert!(matches!(FileLoader::new(&dir.path().join("nope"), None), Err(Error::DataLoad { .. })));
        Ok(())
    }
}
