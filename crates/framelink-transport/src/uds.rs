use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::conn::Connection;
use crate::error::{Result, TransportError};

/// A filesystem-addressed listening endpoint.
///
/// Binding creates the socket file; dropping the endpoint removes it again,
/// but only if the path still refers to the socket this endpoint created
/// (device/inode identity check). A stale socket left behind by a dead
/// server is removed at bind time; any other file at the path is refused.
pub struct Endpoint {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl Endpoint {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on `path`.
    ///
    /// A pre-existing socket file at the path is treated as a stale artifact
    /// and removed first. A pre-existing non-socket file, or a stale socket
    /// that cannot be removed, is an [`TransportError::EndpointConflict`].
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    /// Bind and listen on `path` with an explicit socket file mode.
    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        Self::clear_stale_artifact(&path)?;

        let listener = UnixListener::bind(&path).map_err(|e| TransportError::Bind {
            path: path.clone(),
            source: e,
        })?;

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
            TransportError::Bind {
                path: path.clone(),
                source: e,
            }
        })?;
        let created_metadata =
            std::fs::symlink_metadata(&path).map_err(|e| TransportError::Bind {
                path: path.clone(),
                source: e,
            })?;
        let created_inode = Some((created_metadata.dev(), created_metadata.ino()));

        info!(?path, "listening on unix socket endpoint");

        Ok(Self {
            listener,
            path,
            created_inode,
        })
    }

    /// Remove a stale socket at `path`, refusing to touch anything else.
    fn clear_stale_artifact(path: &Path) -> Result<()> {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            // Nothing at the path; bind proceeds.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(TransportError::Bind {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        };

        if !metadata.file_type().is_socket() {
            return Err(TransportError::EndpointConflict {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                ),
            });
        }

        debug!(?path, "removing stale socket");
        if let Err(err) = std::fs::remove_file(path) {
            // A concurrent removal is fine; the conflict is only real if the
            // artifact is still there.
            if path.exists() {
                return Err(TransportError::EndpointConflict {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        }
        Ok(())
    }

    /// Accept the next incoming connection (blocking).
    pub fn accept(&self) -> Result<Connection> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!("accepted connection");
        Ok(Connection::from_unix(stream))
    }

    /// Connect to a listening endpoint (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<Connection> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "connected to unix socket endpoint");
        Ok(Connection::from_unix(stream))
    }

    /// The path this endpoint is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        if let Some((expected_dev, expected_ino)) = self.created_inode {
            if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
                if metadata.file_type().is_socket()
                    && metadata.dev() == expected_dev
                    && metadata.ino() == expected_ino
                {
                    debug!(path = ?self.path, "removing socket endpoint file");
                    let _ = std::fs::remove_file(&self.path);
                } else {
                    debug!(
                        path = ?self.path,
                        "endpoint path identity changed; skipping cleanup"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn unique_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "framelink-transport-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn bind_accept_connect_roundtrip() {
        let dir = unique_dir("roundtrip");
        let sock_path = dir.join("test.sock");

        let endpoint = Endpoint::bind(&sock_path).unwrap();
        assert!(sock_path.exists());

        let path_clone = sock_path.clone();
        let handle = std::thread::spawn(move || {
            let mut client = Endpoint::connect(&path_clone).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = endpoint.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();

        drop(endpoint);
        assert!(
            !sock_path.exists(),
            "socket file should be removed on drop"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn path_too_long_rejected() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = Endpoint::bind(&long_path);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[test]
    fn default_permissions_hardened() {
        let dir = unique_dir("perms");
        let sock_path = dir.join("perm.sock");

        let endpoint = Endpoint::bind(&sock_path).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        drop(endpoint);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn stale_socket_removed_on_bind() {
        let dir = unique_dir("stale");
        let sock_path = dir.join("stale.sock");

        // First server leaks its socket file (no Drop run).
        let first = Endpoint::bind(&sock_path).unwrap();
        std::mem::forget(first);
        assert!(sock_path.exists());

        // Second bind over the stale artifact succeeds.
        let second = Endpoint::bind(&sock_path).unwrap();
        drop(second);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn foreign_file_is_endpoint_conflict() {
        let dir = unique_dir("foreign");
        let sock_path = dir.join("not-a-socket.sock");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        let result = Endpoint::bind(&sock_path);
        assert!(matches!(
            result,
            Err(TransportError::EndpointConflict { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn drop_does_not_remove_replaced_path() {
        let dir = unique_dir("drop-race");
        let sock_path = dir.join("drop.sock");

        let endpoint = Endpoint::bind(&sock_path).unwrap();
        assert!(sock_path.exists());

        // Replace the path while the endpoint is alive.
        std::fs::remove_file(&sock_path).unwrap();
        std::fs::write(&sock_path, b"replacement-file").unwrap();

        drop(endpoint);
        assert!(
            sock_path.exists(),
            "drop must not remove the path if inode identity changed"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
