use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temp directory with small file helpers. Removed when dropped.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new(label: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("link_ingest-{}-", label))
            .tempdir()
            .unwrap();
        ScratchDir { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path().join(rel)).unwrap()
    }

    /// Every file under the directory with its contents, sorted by path.
    pub fn snapshot(&self) -> Vec<(PathBuf, String)> {
        fn walk(dir: &Path, out: &mut Vec<(PathBuf, String)>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    let contents = std::fs::read_to_string(&path).unwrap();
                    out.push((path, contents));
                }
            }
        }
        let mut out = Vec::new();
        walk(self.path(), &mut out);
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let dir = ScratchDir::new("drop");
        let root = dir.path().to_path_buf();
        dir.write("a/b.txt", "x");
        assert_eq!(dir.snapshot(), [(root.join("a/b.txt"), "x".to_string())]);
        drop(dir);
        assert!(!root.exists());
    }
}
