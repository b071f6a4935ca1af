//! Resolve launched target instance IPs for a wave and write them as CSV.

use std::path::PathBuf;

use clap::Args;

use wavemill_replication::agents::machine_for_server;
use wavemill_replication::session::{CONSOLE_HOST, ReplicationSession};
use wavemill_replication::ReplicationClient;

use crate::aws::Ec2Lookup;

#[derive(Debug, Args)]
pub struct InstanceIpsArgs {
    /// Wave whose launched targets get resolved
    #[arg(long)]
    pub wave_id: String,

    /// Replication console host
    #[arg(long, env = "WM_REPLICATION_HOST", default_value = CONSOLE_HOST)]
    pub replication_host: String,

    /// Output CSV path; defaults to <wave-id>-<date>-ips.csv
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn run(args: InstanceIpsArgs) -> anyhow::Result<()> {
    let factory = super::factory_client()?;
    let mut replication =
        ReplicationClient::new(ReplicationSession::from_env(&args.replication_host)?);
    let ec2 = Ec2Lookup::new().await;

    let out = args.out.unwrap_or_else(|| {
        let today = chrono::Utc::now().format("%Y-%m-%d");
        PathBuf::from(format!("{}-{}-ips.csv", args.wave_id, today))
    });

    let projects = factory.servers_for_wave(&args.wave_id).await?;

    let mut writer = csv::Writer::from_path(&out)?;
    writer.write_record(["server_name", "instance_id", "private_ip", "private_dns"])?;

    let mut resolved = 0usize;
    for project in &projects {
        let remote_project = replication.project_by_name(&project.project_name).await?;
        let machines = replication.machines(&remote_project.id).await?;

        for server in project.windows.iter().chain(&project.linux) {
            let Some(machine) = machine_for_server(&machines, server) else {
                tracing::warn!(server = %server.server_name, "No replication machine, skipping");
                continue;
            };
            let Some(replica_id) = &machine.replica_id else {
                tracing::warn!(server = %server.server_name, "No launched target yet, skipping");
                continue;
            };

            let instance_id = replication.replica_instance_id(replica_id).await?;
            let addresses = ec2.instance_addresses(&instance_id).await?;

            writer.write_record([
                server.server_name.as_str(),
                addresses.instance_id.as_str(),
                addresses.private_ips.join(";").as_str(),
                addresses.private_dns.as_deref().unwrap_or(""),
            ])?;
            resolved += 1;
        }
    }

    writer.flush()?;
    println!("Wrote {} instance record(s) to {}.", resolved, out.display());
    Ok(())
}
