//! Terminate the launched test-target instances of a wave.
//!
//! After cutover testing, each test target is resolved through its
//! replication machine to an EC2 instance ID and terminated; the tracking
//! service gets a migration status per server.

use clap::Args;

use wavemill_common::types::STATUS_TEST_INSTANCE_TERMINATED;
use wavemill_replication::agents::machine_for_server;
use wavemill_replication::session::{CONSOLE_HOST, ReplicationSession};
use wavemill_replication::ReplicationClient;

use crate::aws::Ec2Lookup;

#[derive(Debug, Args)]
pub struct TerminateTestInstancesArgs {
    /// Wave whose test targets get terminated
    #[arg(long)]
    pub wave_id: String,

    /// Replication console host
    #[arg(long, env = "WM_REPLICATION_HOST", default_value = CONSOLE_HOST)]
    pub replication_host: String,
}

pub async fn run(args: TerminateTestInstancesArgs) -> anyhow::Result<()> {
    let factory = super::factory_client()?;
    let mut replication =
        ReplicationClient::new(ReplicationSession::from_env(&args.replication_host)?);
    let ec2 = Ec2Lookup::new().await;

    let projects = factory.servers_for_wave(&args.wave_id).await?;

    let mut terminated = 0usize;
    for project in &projects {
        let remote_project = replication.project_by_name(&project.project_name).await?;
        let machines = replication.machines(&remote_project.id).await?;

        for server in project.windows.iter().chain(&project.linux) {
            let Some(machine) = machine_for_server(&machines, server) else {
                tracing::warn!(server = %server.server_name, "No replication machine, skipping");
                continue;
            };
            let Some(replica_id) = &machine.replica_id else {
                tracing::warn!(server = %server.server_name, "No launched test target, skipping");
                continue;
            };

            let instance_id = replication.replica_instance_id(replica_id).await?;
            ec2.terminate_instance(&instance_id).await?;
            factory
                .set_migration_status(&server.server_id, STATUS_TEST_INSTANCE_TERMINATED)
                .await?;

            println!(
                "Terminated {} ({}) for server {}.",
                instance_id, replica_id, server.server_name
            );
            terminated += 1;
        }
    }

    println!("Terminated {terminated} test instance(s).");
    Ok(())
}
