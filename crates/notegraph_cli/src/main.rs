//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `notegraph_core` linkage.
//! - Open a scratch vault and print the seeded neighbourhood.

use notegraph_core::{GraphService, Vault};

fn main() {
    println!("notegraph_core ping={}", notegraph_core::ping());
    println!("notegraph_core version={}", notegraph_core::core_version());

    let session = Vault::open_in_memory("smoke")
        .map_err(|err| err.to_string())
        .and_then(|vault| {
            println!(
                "notegraph_core vault={} storage={}",
                vault.name(),
                vault
                    .path()
                    .map_or_else(|| "memory".to_string(), |path| path.display().to_string())
            );
            GraphService::open(vault.into_store()).map_err(|err| err.to_string())
        });
    match session {
        Ok(service) => {
            let topology = service.topology();
            let center = topology
                .center
                .as_ref()
                .map_or("<none>", |note| note.title.as_str());
            println!(
                "notegraph_core center={} uppers={} downers={} lefters={} righters={}",
                center,
                topology.uppers.len(),
                topology.downers.len(),
                topology.lefters.len(),
                topology.righters.len()
            );
        }
        Err(err) => {
            eprintln!("notegraph_core session failed: {err}");
            std::process::exit(1);
        }
    }
}
