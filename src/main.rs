#[macro_use] extern crate rocket;

use eventcast::config::ServerConfig;

#[launch]
fn rocket() -> _ {
    dotenvy::dotenv().ok();
    eventcast::build_rocket(ServerConfig::from_env())
}
