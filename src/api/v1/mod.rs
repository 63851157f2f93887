use rocket::routes;

pub mod datasets;
pub mod version;

use datasets::*;
use version::*;

pub fn routes() -> Vec<rocket::Route> {
    routes![
        version,
        create_dataset,
        list_configured_datasets,
        list_observed_datasets,
    ]
}
