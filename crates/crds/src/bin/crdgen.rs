//! Print the NetBird GitOps CRDs as a multi-document YAML stream.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/netbird.yaml`

use crds::{NetbirdGroup, NetworkRoute};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crds = [NetworkRoute::crd(), NetbirdGroup::crd()];
    for (i, crd) in crds.iter().enumerate() {
        if i > 0 {
            println!("---");
        }
        let yaml = serde_yaml::to_string(crd)
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD {}: {}", crd.spec.names.kind, e))?;
        print!("{yaml}");
    }
    Ok(())
}
