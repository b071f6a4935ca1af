//! EC2 queries for launched target instances.

use anyhow::Context;
use aws_config::BehaviorVersion;

/// IP/hostname details of one launched target instance.
#[derive(Debug, Clone)]
pub struct InstanceAddresses {
    pub instance_id: String,
    pub private_ips: Vec<String>,
    pub private_dns: Option<String>,
}

/// EC2 client using the ambient AWS credential chain (env vars, profile,
/// instance role).
pub struct Ec2Lookup {
    client: aws_sdk_ec2::Client,
}

impl Ec2Lookup {
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            client: aws_sdk_ec2::Client::new(&config),
        }
    }

    /// Private addresses of one instance.
    pub async fn instance_addresses(
        &self,
        instance_id: &str,
    ) -> anyhow::Result<InstanceAddresses> {
        let response = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .with_context(|| format!("describe-instances for '{instance_id}' failed"))?;

        let instance = response
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .find(|instance| instance.instance_id() == Some(instance_id))
            .with_context(|| format!("instance '{instance_id}' not found"))?;

        let private_ips = instance
            .network_interfaces()
            .iter()
            .filter_map(|interface| interface.private_ip_address())
            .map(str::to_string)
            .collect();

        Ok(InstanceAddresses {
            instance_id: instance_id.to_string(),
            private_ips,
            private_dns: instance.private_dns_name().map(str::to_string),
        })
    }

    /// Terminate one instance.
    pub async fn terminate_instance(&self, instance_id: &str) -> anyhow::Result<()> {
        self.client
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .with_context(|| format!("terminate-instances for '{instance_id}' failed"))?;

        tracing::info!(instance_id, "Instance termination requested");
        Ok(())
    }
}
