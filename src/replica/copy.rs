// Pcheckers — Read-only replica
//
// Copies the tables of a loaded store over existing files of the same name
// in a destination directory. Every copy keeps the access and modification
// times of its source and ends up owner-read-only; the directory itself is
// left read-only too.
//
// Sources are read completely before the first destination is touched.

use std::fs::{self, File, FileTimes};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::ReplicaError;
use crate::store::CredentialStore;

/// One copied table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaCopy {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// Permission bits after the copy, e.g. `400`.
    pub access: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    ReadWrite,
    ReadOnly,
}

struct Snapshot {
    source: PathBuf,
    dest: PathBuf,
    data: Vec<u8>,
    times: FileTimes,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ReplicaError + '_ {
    move |source| ReplicaError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Copy every table of `store` into `dest`.
pub fn replicate(store: &CredentialStore, dest: &Path) -> Result<Vec<ReplicaCopy>, ReplicaError> {
    if !dest.is_dir() {
        return Err(ReplicaError::NotADirectory(dest.to_path_buf()));
    }

    let mut targets = Vec::new();
    for kind in store.kinds() {
        let Some(table) = store.table(kind) else {
            continue;
        };
        let target = dest.join(kind.file_name());
        if !target.is_file() || File::open(&target).is_err() {
            return Err(ReplicaError::MissingDestination(target));
        }
        targets.push((table.origin().to_path_buf(), target));
    }

    let mut snapshots = Vec::with_capacity(targets.len());
    for (source, target) in targets {
        let data = fs::read(&source).map_err(io_err(&source))?;
        let meta = fs::metadata(&source).map_err(io_err(&source))?;
        let accessed = meta.accessed().map_err(io_err(&source))?;
        let modified = meta.modified().map_err(io_err(&source))?;
        snapshots.push(Snapshot {
            source,
            dest: target,
            data,
            times: FileTimes::new().set_accessed(accessed).set_modified(modified),
        });
    }

    let mut copies = Vec::with_capacity(snapshots.len());
    for snap in snapshots {
        set_access(dest, Access::ReadWrite)?;
        set_access(&snap.dest, Access::ReadWrite)?;

        tracing::info!(source = %snap.source.display(), dest = %snap.dest.display(), "Copying table");
        let mut out = File::create(&snap.dest).map_err(io_err(&snap.dest))?;
        out.write_all(&snap.data).map_err(io_err(&snap.dest))?;
        out.set_times(snap.times).map_err(io_err(&snap.dest))?;
        drop(out);

        set_access(&snap.dest, Access::ReadOnly)?;
        copies.push(ReplicaCopy {
            access: access_string(&snap.dest)?,
            source: snap.source,
            dest: snap.dest,
        });
    }

    if let Err(e) = set_access(dest, Access::ReadOnly) {
        tracing::warn!(dest = %dest.display(), error = %e, "Could not make replica directory read-only");
    }
    Ok(copies)
}

#[cfg(unix)]
fn set_access(path: &Path, access: Access) -> Result<(), ReplicaError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match (path.is_dir(), access) {
        (true, Access::ReadWrite) => 0o700,
        (true, Access::ReadOnly) => 0o500,
        (false, Access::ReadWrite) => 0o600,
        (false, Access::ReadOnly) => 0o400,
    };
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(io_err(path))
}

#[cfg(not(unix))]
fn set_access(path: &Path, access: Access) -> Result<(), ReplicaError> {
    let mut perms = fs::metadata(path).map_err(io_err(path))?.permissions();
    perms.set_readonly(access == Access::ReadOnly);
    fs::set_permissions(path, perms).map_err(io_err(path))
}

#[cfg(unix)]
fn access_string(path: &Path) -> Result<String, ReplicaError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::symlink_metadata(path).map_err(io_err(path))?.permissions().mode();
    Ok(format!("{:03o}", mode & 0o777))
}

#[cfg(not(unix))]
fn access_string(path: &Path) -> Result<String, ReplicaError> {
    let readonly = fs::metadata(path).map_err(io_err(path))?.permissions().readonly();
    Ok(if readonly { "r" } else { "rw" }.to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TableKind;

    fn source_store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("accs.mi"), "#title;user;pass\nalpha;u1;p1\n").unwrap();
        fs::write(dir.path().join("users.mi"), "#user;name\nu1;Alice\n").unwrap();
        fs::write(dir.path().join("pmap.mi"), "#ref;password\np1;secret\n").unwrap();
        fs::write(dir.path().join("rank.mi"), "#title;rank;description\nalpha;1;\n").unwrap();
        let store = CredentialStore::load(dir.path()).unwrap();
        (dir, store)
    }

    fn prepare_dest(store: &CredentialStore) -> tempfile::TempDir {
        let dest = tempfile::tempdir().unwrap();
        for kind in store.kinds() {
            fs::write(dest.path().join(kind.file_name()), "stale\n").unwrap();
        }
        dest
    }

    #[test]
    fn test_destination_must_be_a_directory() {
        let (dir, store) = source_store();
        let err = replicate(&store, &dir.path().join("accs.mi")).unwrap_err();
        assert!(matches!(err, ReplicaError::NotADirectory(_)));
    }

    #[test]
    fn test_destination_files_must_exist() {
        let (_dir, store) = source_store();
        let dest = tempfile::tempdir().unwrap();
        let err = replicate(&store, dest.path()).unwrap_err();
        match err {
            ReplicaError::MissingDestination(path) => {
                assert_eq!(path, dest.path().join(TableKind::Accounts.file_name()));
            }
            other => panic!("Expected MissingDestination, got {other:?}"),
        }
    }

    #[test]
    fn test_replica_copies_content_and_times() {
        let (dir, store) = source_store();
        let dest = prepare_dest(&store);

        let copies = replicate(&store, dest.path()).unwrap();
        set_access(dest.path(), Access::ReadWrite).unwrap();

        assert_eq!(copies.len(), 4);
        for copy in &copies {
            assert_eq!(fs::read(&copy.source).unwrap(), fs::read(&copy.dest).unwrap());
            let src_time = fs::metadata(&copy.source).unwrap().modified().unwrap();
            let dst_time = fs::metadata(&copy.dest).unwrap().modified().unwrap();
            assert_eq!(src_time, dst_time);
            assert!(copy.source.starts_with(dir.path()));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_replica_is_left_read_only() {
        let (_dir, store) = source_store();
        let dest = prepare_dest(&store);

        let copies = replicate(&store, dest.path()).unwrap();
        let dir_mode = access_string(dest.path()).unwrap();
        set_access(dest.path(), Access::ReadWrite).unwrap();

        assert_eq!(dir_mode, "500");
        assert!(copies.iter().all(|c| c.access == "400"));
    }
}
