//! Application startup with layered configuration.
//!
//! Resolves the service configuration once at startup and shares it through
//! a `ConfigContext`:
//! - YAML from `demos/startup/config.yml` (or the file named by `XNTHA_BASIC_CONFIG`)
//! - environment overrides such as `XNTHA_DB_PORT=27017`
//! - programmatic overrides passed to `initialize`
//!
//! Run with:
//!   cargo run --example startup
//!   XNTHA_BASIC_LISTEN_PORT=9000 XNTHA_DB_SSL=true cargo run --example startup
//!   XNTHA_DB_PORT=99999 cargo run --example startup   # validation failure

use strata::prelude::*;
use strata::schema::{boolean, integer, object, string};
use strata::DEFAULT_ENV_PREFIX;

fn schema() -> SchemaNode {
    let basic = object([
        ("config", string().optional()),
        ("listenPort", integer().default(3000).coerce()),
    ])
    .default(Value::table());

    let jwt = object([
        ("secret", string()),
        ("expiresIn", string().default("5m")),
        ("algo", string().default("HS256")),
        (
            "refreshToken",
            object([
                ("expiresIn", string().default("7d")),
                ("secret", string()),
            ]),
        ),
    ]);

    let db = object([
        ("authDb", string().default("admin")),
        ("name", string().default("yappa")),
        ("host", string().default("localhost")),
        ("username", string().default("admin")),
        ("password", string().default("admin")),
        ("ssl", boolean().default(false).coerce()),
        ("port", integer().min(0.0).max(65325.0).default(3333).coerce()),
        ("uri", string().default("")),
    ])
    .transform(|mut db| {
        let field = |key: &str| db.get_path(key).map(Value::to_string).unwrap_or_default();
        let uri = format!(
            "mongodb://{}:{}@{}:{}/{}?authSource={}",
            field("username"),
            field("password"),
            field("host"),
            field("port"),
            field("name"),
            field("authDb"),
        );
        db.set_path("uri", Value::String(uri));
        Ok(db)
    })
    .default(Value::table());

    object([
        ("basic", basic),
        ("security", object([("jwt", jwt)])),
        ("db", db),
    ])
}

fn main() {
    tracing_subscriber::fmt::init();

    let resolver = Resolver::new(schema())
        .env_prefix("XNTHA")
        .config_path_key("basic.config")
        .search_dirs(["", "demos/startup"]);

    println!("Environment variables (default prefix would be {}):", DEFAULT_ENV_PREFIX);
    for (var, paths) in resolver.env_map().iter() {
        println!("  {} -> {}", var, paths.join(", "));
    }
    println!();

    let context = ConfigContext::new(resolver);
    let overrides = Input::partial().set("security.jwt.algo", "HS512").build();
    let config = context.initialize(Some(overrides)).unwrap_or_exit();

    // A second caller gets the same configuration; its input is ignored.
    let again = context
        .initialize(Some(Input::partial().set("db.name", "ignored").build()))
        .unwrap_or_exit();
    assert!(config.ptr_eq(&again));

    let service = config.read();
    println!("Listening on port {}", service.get_as::<u16>("basic.listenPort").unwrap_or(3000));
    println!("JWT algorithm: {}", service.get("security.jwt.algo").map(Value::to_string).unwrap_or_default());
    println!("Database: {}", service.get("db.uri").map(Value::to_string).unwrap_or_default());
    println!();

    println!("Resolved keys:");
    for key in service.keys() {
        let shown = if strata::pretty::is_sensitive_path(key) {
            "[REDACTED]".to_string()
        } else {
            service.get(key).map(Value::to_string).unwrap_or_default()
        };
        println!("  {} = {}", key, shown);
    }
}
