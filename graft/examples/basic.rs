//! Basic example of Graft.
//!
//! Run with `RUST_LOG=graft_container=debug cargo run --example basic`.

use graft::{Capability, Component, Container, Properties, Result};
use std::sync::Arc;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Component)]
#[component(capability = "dyn Logger")]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

#[derive(Component)]
#[component(provides(ty = "ConnectionPool", method = "pool"))]
struct Config {
    #[component(property = "database.url")]
    database_url: String,
    #[component(property = "database.pool")]
    pool_size: Option<String>,
}

impl Config {
    fn pool(&self) -> ConnectionPool {
        let size = self
            .pool_size
            .as_deref()
            .and_then(|size| size.parse().ok())
            .unwrap_or(4);
        ConnectionPool {
            url: self.database_url.clone(),
            size,
        }
    }
}

struct ConnectionPool {
    url: String,
    size: usize,
}

#[derive(Component)]
#[component(after_create = "announce")]
struct UserRepository {
    pool: Arc<ConnectionPool>,
    logger: Capability<dyn Logger>,
}

impl UserRepository {
    fn announce(&self) {
        self.logger.log(&format!(
            "Repository ready on {} ({} connections)",
            self.pool.url, self.pool.size
        ));
    }

    fn find_user(&self, id: u64) -> String {
        format!("user #{id} from {}", self.pool.url)
    }
}

#[derive(Component)]
struct UserService {
    repo: Arc<UserRepository>,
    logger: Capability<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let properties = Properties::new()
        .with("database.url", "postgres://localhost/myapp")
        .with("database.pool", "8");

    let container = Container::inject(properties, module_path!())?;
    tracing::info!(instances = container.candidates().len(), "Container ready");

    if let Some(service) = container.get_injected::<UserService>() {
        println!("{}", service.get_user(42));
    }

    for candidate in container.candidates() {
        println!("built {} ({:?})", candidate.key().short_name(), candidate.origin());
    }

    Ok(())
}
