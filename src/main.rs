use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use flocker_control::cluster_state::ClusterStateService;
use flocker_control::config::ControlConfig;
use flocker_control::persistence::PersistenceService;
use flocker_control::rpc::ControlRpcServer;
use flocker_control::server::build_rocket;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ControlConfig::read("control-config.json")?;
    log::info!(target: "main", "starting with data_path={} port={} agent_port={}", config.data_path, config.port, config.agent_port);

    let persistence = Arc::new(PersistenceService::start(&config.data_path).await?);
    let cluster_state = Arc::new(ClusterStateService::new());

    let rpc_server = ControlRpcServer::new(persistence.clone(), cluster_state.clone());
    let agent_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.agent_port);
    tokio::spawn(async move {
        if let Err(err) = rpc_server.serve(agent_addr).await {
            log::error!(target: "main", "control RPC server exited: {}", err);
        }
    });

    let rocket = build_rocket(config.port, persistence, cluster_state);
    rocket.launch().await?;

    Ok(())
}
