//! PowerShell remoting via the local `pwsh` binary.
//!
//! Windows hosts are driven with `Invoke-Command -ComputerName ...` script
//! blocks, optionally under an explicit domain credential.

use tokio::process::Command;

use wavemill_common::error::AppError;

/// Optional domain credential injected into remoting invocations.
#[derive(Debug, Clone)]
pub struct WindowsCredential {
    pub user: String,
    pub password: String,
}

/// Runner for PowerShell remoting commands.
#[derive(Debug, Clone, Default)]
pub struct PowerShell {
    credential: Option<WindowsCredential>,
}

impl PowerShell {
    pub fn new(credential: Option<WindowsCredential>) -> Self {
        Self { credential }
    }

    /// Run a script block on a remote computer and return its stdout.
    pub async fn invoke(&self, computer: &str, script_block: &str) -> Result<String, AppError> {
        let mut command = format!(
            "Invoke-Command -ComputerName {computer} -ScriptBlock {{{script_block}}}"
        );
        if let Some(credential) = &self.credential {
            command.push_str(&credential_suffix(credential));
        }

        self.run(&command).await
    }

    /// Run an arbitrary PowerShell command line locally through `pwsh`.
    pub async fn run(&self, command: &str) -> Result<String, AppError> {
        tracing::debug!(command, "Running pwsh");

        let output = Command::new("pwsh")
            .arg("-NoProfile")
            .arg("-Command")
            .arg(command)
            .output()
            .await
            .map_err(|e| AppError::Remote(format!("Cannot launch pwsh: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(AppError::Remote(format!(
                "pwsh exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if !stderr.trim().is_empty() {
            tracing::warn!(stderr = %stderr.trim(), "pwsh wrote to stderr");
        }

        Ok(stdout)
    }

    /// Copy a local directory to a remote computer over a remoting session.
    pub async fn copy_directory(
        &self,
        computer: &str,
        local_dir: &str,
        remote_dir: &str,
    ) -> Result<(), AppError> {
        let mut session = format!("New-PSSession -ComputerName {computer}");
        if let Some(credential) = &self.credential {
            session.push_str(&credential_suffix(credential));
        }

        let command = format!(
            "$session = {session}; \
             Copy-Item -Path '{local_dir}' -Destination '{remote_dir}' -ToSession $session -Recurse -Force; \
             Remove-PSSession $session"
        );
        self.run(&command).await?;

        tracing::info!(computer, local_dir, remote_dir, "Directory copied");
        Ok(())
    }

    /// Force an immediate shutdown of a remote computer.
    pub async fn shutdown(&self, computer: &str) -> Result<(), AppError> {
        self.invoke(computer, "Stop-Computer -Force").await?;
        Ok(())
    }

    /// Create a local user on a remote computer and add it to the local
    /// Administrators group.
    pub async fn add_local_user(
        &self,
        computer: &str,
        user: &str,
        password: &str,
    ) -> Result<(), AppError> {
        self.invoke(computer, &local_user_add_script(user, password))
            .await?;
        tracing::info!(computer, user, "Local admin user created");
        Ok(())
    }

    /// Delete a local user from a remote computer.
    pub async fn remove_local_user(&self, computer: &str, user: &str) -> Result<(), AppError> {
        self.invoke(computer, &local_user_remove_script(user))
            .await?;
        tracing::info!(computer, user, "Local user removed");
        Ok(())
    }
}

fn local_user_add_script(user: &str, password: &str) -> String {
    format!("net user {user} '{password}' /add; net localgroup Administrators {user} /add")
}

fn local_user_remove_script(user: &str) -> String {
    format!("net user {user} /delete")
}

fn credential_suffix(credential: &WindowsCredential) -> String {
    format!(
        " -Credential (New-Object System.Management.Automation.PSCredential('{}', \
         (ConvertTo-SecureString '{}' -AsPlainText -Force))) -Authentication Negotiate",
        credential.user, credential.password
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_user_add_script_creates_and_elevates() {
        let script = local_user_add_script("migrator", "s3cret");
        assert!(script.contains("net user migrator 's3cret' /add"));
        assert!(script.contains("net localgroup Administrators migrator /add"));
    }

    #[test]
    fn test_local_user_remove_script_deletes() {
        assert_eq!(local_user_remove_script("migrator"), "net user migrator /delete");
    }

    #[test]
    fn test_credential_suffix_embeds_user() {
        let suffix = credential_suffix(&WindowsCredential {
            user: "CORP\\migrator".to_string(),
            password: "secret".to_string(),
        });
        assert!(suffix.contains("CORP\\migrator"));
        assert!(suffix.contains("-Authentication Negotiate"));
    }
}
