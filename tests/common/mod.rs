//! Shared fixtures for integration tests.

#![allow(dead_code)]

use strata::schema::{boolean, integer, object, string, SchemaNode};
use strata::{Resolver, Value};

pub const PREFIX: &str = "XNTHA";

/// Schema of a typical service: HTTP listener, JWT settings and a MongoDB
/// connection whose `uri` is derived from the other fields.
pub fn app_schema() -> SchemaNode {
    object([
        (
            "basic",
            object([
                ("config", string().optional()),
                ("listenPort", integer().default(3000).coerce()),
            ])
            .default(Value::table()),
        ),
        (
            "security",
            object([(
                "jwt",
                object([
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
                ]),
            )]),
        ),
        ("db", db_schema().default(Value::table())),
    ])
}

fn db_schema() -> SchemaNode {
    object([
        ("authDb", string().default("admin")),
        ("name", string().default("yappa")),
        ("host", string().default("localhost")),
        ("username", string().default("admin")),
        ("password", string().default("admin")),
        ("ssl", boolean().default(false).coerce()),
        (
            "port",
            integer().min(0.0).max(65325.0).default(3333).coerce(),
        ),
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
}

pub fn resolver() -> Resolver {
    Resolver::new(app_schema())
        .env_prefix(PREFIX)
        .config_path_key("basic.config")
}

/// The smallest YAML document that satisfies every required leaf.
pub const MINIMAL_YAML: &str = "\
security:
  jwt:
    secret: yaml-secret
    refreshToken:
      secret: yaml-refresh
";
