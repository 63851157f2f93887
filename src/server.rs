//! Rocket wiring for the control service's HTTP API.

use std::sync::Arc;

use colored::Colorize;
use rocket::{routes, Build, Rocket};

use crate::api;
use crate::cluster_state::ClusterStateService;
use crate::cors::{cors_preflight, CORS};
use crate::endpoints::health_check;
use crate::logging::print_banner;
use crate::persistence::PersistenceService;

pub trait RocketExt {
    fn mount_routes(self, routes: Vec<(&'static str, Vec<rocket::Route>)>) -> Self;
}

impl RocketExt for Rocket<Build> {
    fn mount_routes(self, routes: Vec<(&'static str, Vec<rocket::Route>)>) -> Self {
        let mut rocket = self;
        for (path, routes) in routes {
            log::info!("{}", format!("mounting routes at {}", path).green());
            rocket = rocket.mount(path, routes);
        }
        rocket
    }
}

pub fn build_rocket(
    port: u16,
    persistence: Arc<PersistenceService>,
    cluster_state: Arc<ClusterStateService>,
) -> Rocket<Build> {
    print_banner("CONTROL SERVICE STARTUP", |s| s.bright_cyan());

    log::info!("{}", "defining API routes".cyan());
    let routes = vec![("/", routes![health_check, cors_preflight]), ("/v1", api::v1::routes())];

    log::info!("{}", "building Rocket instance".cyan());
    let rocket_instance = rocket::build()
        .configure(rocket::Config {
            port,
            address: std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
            ..Default::default()
        })
        .manage(persistence)
        .manage(cluster_state)
        .attach(CORS);

    log::info!("{}", "mounting API routes".cyan());
    rocket_instance.mount_routes(routes)
}
