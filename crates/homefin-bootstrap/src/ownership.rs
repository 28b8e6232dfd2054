//! Best-effort recursive re-owning of the data directory.
//!
//! Mirrors `chown -R` without following symlinks: every inode under the
//! root (links included) gets the new owner, errors are collected instead
//! of aborting the walk, and the caller decides how loudly to report them.
//! A failure here is never fatal to startup.

use std::path::{Path, PathBuf};

/// Outcome of one ownership walk.
#[derive(Debug)]
pub struct OwnershipReport {
    /// Inodes whose ownership was changed.
    pub changed: usize,
    /// Paths that could not be changed or read, with the I/O error.
    pub failures: Vec<(PathBuf, std::io::Error)>,
}

impl OwnershipReport {
    /// Returns `true` when every inode was re-owned.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Recursively changes ownership of `root` and everything beneath it.
///
/// Symlinks are re-owned themselves and never followed, so the walk stays
/// inside the tree. All failures end up in the report.
#[must_use]
pub fn reown_tree(root: &Path, uid: u32, gid: u32) -> OwnershipReport {
    let mut report = OwnershipReport {
        changed: 0,
        failures: Vec::new(),
    };
    let mut stack = vec![root.to_path_buf()];

    while let Some(path) = stack.pop() {
        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                report.failures.push((path, e));
                continue;
            }
        };

        match std::os::unix::fs::lchown(&path, Some(uid), Some(gid)) {
            Ok(()) => report.changed += 1,
            Err(e) => report.failures.push((path.clone(), e)),
        }

        if metadata.is_dir() {
            match std::fs::read_dir(&path) {
                Ok(entries) => {
                    for entry in entries {
                        match entry {
                            Ok(entry) => stack.push(entry.path()),
                            Err(e) => report.failures.push((path.clone(), e)),
                        }
                    }
                }
                Err(e) => report.failures.push((path.clone(), e)),
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_ids() -> (u32, u32) {
        (
            nix::unistd::getuid().as_raw(),
            nix::unistd::getgid().as_raw(),
        )
    }

    #[test]
    fn walks_every_inode_in_the_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("data");
        std::fs::create_dir(&root).expect("mkdir");
        std::fs::write(root.join("a.txt"), b"a").expect("write");
        std::fs::create_dir(root.join("sub")).expect("mkdir sub");
        std::fs::write(root.join("sub").join("b.txt"), b"b").expect("write");
        std::os::unix::fs::symlink("a.txt", root.join("link")).expect("symlink");

        let (uid, gid) = current_ids();
        let report = reown_tree(&root, uid, gid);

        assert!(report.is_clean(), "failures: {:?}", report.failures);
        // root, a.txt, sub, sub/b.txt, link
        assert_eq!(report.changed, 5);
    }

    #[test]
    fn dangling_symlinks_are_reowned_not_followed() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::os::unix::fs::symlink("missing-target", dir.path().join("dangling"))
            .expect("symlink");

        let (uid, gid) = current_ids();
        let report = reown_tree(dir.path(), uid, gid);

        assert!(report.is_clean(), "failures: {:?}", report.failures);
        assert_eq!(report.changed, 2);
    }

    #[test]
    fn symlinked_directories_are_not_descended() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outside = dir.path().join("outside");
        std::fs::create_dir(&outside).expect("mkdir outside");
        std::fs::write(outside.join("secret.txt"), b"s").expect("write");
        let root = dir.path().join("data");
        std::fs::create_dir(&root).expect("mkdir root");
        std::os::unix::fs::symlink(&outside, root.join("escape")).expect("symlink");

        let (uid, gid) = current_ids();
        let report = reown_tree(&root, uid, gid);

        assert!(report.is_clean(), "failures: {:?}", report.failures);
        // root and the link itself; nothing behind the link.
        assert_eq!(report.changed, 2);
    }

    #[test]
    fn missing_root_is_a_single_recorded_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (uid, gid) = current_ids();
        let report = reown_tree(&dir.path().join("absent"), uid, gid);

        assert_eq!(report.changed, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_clean());
    }
}
