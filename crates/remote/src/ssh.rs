//! SSH command execution and SFTP upload.
//!
//! libssh2 is a blocking library; every session operation runs inside
//! `spawn_blocking` so the async callers never stall the runtime.

use std::io::Read;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use ssh2::Session;

use wavemill_common::error::AppError;

/// How to authenticate an SSH connection.
#[derive(Debug, Clone)]
pub enum SshAuth {
    /// Private key file with an optional passphrase.
    Key {
        key_file: PathBuf,
        passphrase: Option<String>,
    },
    Password(String),
}

/// Output of one remote command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub exit_status: i32,
}

/// An established SSH session to one host.
pub struct SshSession {
    session: Session,
    hostname: String,
}

impl SshSession {
    /// Connect and authenticate. Blocking; call from `spawn_blocking`, or use
    /// [`SshSession::connect_async`].
    pub fn connect(hostname: &str, port: u16, user: &str, auth: &SshAuth) -> Result<Self, AppError> {
        let stream = TcpStream::connect((hostname, port)).map_err(|e| {
            AppError::Remote(format!("Cannot reach {hostname}:{port}: {e}"))
        })?;

        let mut session = Session::new()
            .map_err(|e| AppError::Remote(format!("SSH session init failed: {e}")))?;
        session.set_tcp_stream(stream);
        session
            .handshake()
            .map_err(|e| AppError::Remote(format!("SSH handshake with {hostname} failed: {e}")))?;

        match auth {
            SshAuth::Key {
                key_file,
                passphrase,
            } => {
                session
                    .userauth_pubkey_file(user, None, key_file, passphrase.as_deref())
                    .map_err(|e| {
                        AppError::Remote(format!(
                            "Key authentication to {hostname} as '{user}' failed \
                             (key file '{}'): {e}",
                            key_file.display()
                        ))
                    })?;
            }
            SshAuth::Password(password) => {
                session.userauth_password(user, password).map_err(|e| {
                    AppError::Remote(format!(
                        "Password authentication to {hostname} as '{user}' failed: {e}"
                    ))
                })?;
            }
        }

        tracing::debug!(hostname, user, port, "SSH session established");

        Ok(Self {
            session,
            hostname: hostname.to_string(),
        })
    }

    /// Async wrapper around [`SshSession::connect`].
    pub async fn connect_async(
        hostname: String,
        port: u16,
        user: String,
        auth: SshAuth,
    ) -> Result<Self, AppError> {
        tokio::task::spawn_blocking(move || Self::connect(&hostname, port, &user, &auth))
            .await
            .map_err(|e| AppError::Remote(format!("SSH connect task panicked: {e}")))?
    }

    /// Run a command, capturing stdout. Non-zero exit or stderr output is an
    /// error carrying the stderr text.
    pub fn exec(&self, command: &str) -> Result<ExecOutput, AppError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| AppError::Remote(format!("SSH channel to {} failed: {e}", self.hostname)))?;

        channel
            .exec(command)
            .map_err(|e| AppError::Remote(format!("exec on {} failed: {e}", self.hostname)))?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| AppError::Remote(format!("reading stdout from {}: {e}", self.hostname)))?;

        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| AppError::Remote(format!("reading stderr from {}: {e}", self.hostname)))?;

        channel
            .wait_close()
            .map_err(|e| AppError::Remote(format!("closing channel to {}: {e}", self.hostname)))?;
        let exit_status = channel
            .exit_status()
            .map_err(|e| AppError::Remote(format!("exit status from {}: {e}", self.hostname)))?;

        if exit_status != 0 || !stderr.trim().is_empty() {
            return Err(AppError::Remote(format!(
                "Command on host '{}' failed (exit {}): {}",
                self.hostname,
                exit_status,
                stderr.trim()
            )));
        }

        Ok(ExecOutput {
            stdout,
            exit_status,
        })
    }

    /// Upload a local file via SFTP.
    pub fn upload(&self, local: &Path, remote: &Path) -> Result<(), AppError> {
        let sftp = self
            .session
            .sftp()
            .map_err(|e| AppError::Remote(format!("SFTP to {} failed: {e}", self.hostname)))?;

        let contents = std::fs::read(local)?;
        let mut remote_file = sftp.create(remote).map_err(|e| {
            AppError::Remote(format!(
                "Creating {} on {} failed: {e}",
                remote.display(),
                self.hostname
            ))
        })?;

        use std::io::Write;
        remote_file.write_all(&contents).map_err(|e| {
            AppError::Remote(format!(
                "Writing {} on {} failed: {e}",
                remote.display(),
                self.hostname
            ))
        })?;

        tracing::info!(
            local = %local.display(),
            host = %self.hostname,
            remote = %remote.display(),
            "File uploaded"
        );
        Ok(())
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}
