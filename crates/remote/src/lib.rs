//! Remote execution over SSH (Linux) and PowerShell remoting (Windows).

pub mod powershell;
pub mod ssh;

pub use powershell::PowerShell;
pub use ssh::{SshAuth, SshSession};
