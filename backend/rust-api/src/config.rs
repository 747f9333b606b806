use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server_address: String,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub relay: RelayConfig,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub state_path: String,
    pub users_path: String,
    pub questions_path: String,
    pub personas_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first (two levels up), local .env as fallback
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/<env>.toml, then APP__SECTION__KEY overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let lookup = |key: &str, var: &str, default: &str| -> String {
            settings
                .get_string(key)
                .or_else(|_| env::var(var))
                .unwrap_or_else(|_| default.to_string())
        };

        let jwt_secret = settings
            .get_string("auth.jwt_secret")
            .or_else(|_| env::var("JWT_SECRET"))
            .or_else(|_| {
                if env == "prod" {
                    return Err(config::ConfigError::NotFound(
                        "JWT_SECRET must be set in production".to_string(),
                    ));
                }
                eprintln!("WARNING: Using default JWT_SECRET (dev mode only!)");
                Ok("dev-secret-only-for-local-testing".to_string())
            })?;

        let token_ttl_seconds = parse_or(
            &lookup("auth.token_ttl_seconds", "JWT_TOKEN_TTL_SECONDS", ""),
            86_400,
        );
        let cookie_secure = lookup("auth.cookie_secure", "COOKIE_SECURE", "true") != "false";

        let timeout_seconds = parse_or(
            &lookup("relay.timeout_seconds", "RELAY_TIMEOUT_SECONDS", ""),
            30,
        );

        let allowed_origins = lookup("cors.allowed_origins", "CORS_ALLOWED_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Config {
            server_address: lookup("server.address", "SERVER_ADDRESS", "0.0.0.0:8080"),
            storage: StorageConfig {
                state_path: lookup("storage.state_path", "STATE_PATH", "./assets/state.json"),
                users_path: lookup("storage.users_path", "USERS_PATH", "./assets/users.json"),
                questions_path: lookup(
                    "storage.questions_path",
                    "QUESTIONS_PATH",
                    "./assets/questions.json",
                ),
                personas_path: lookup(
                    "storage.personas_path",
                    "PERSONAS_PATH",
                    "./assets/personas.json",
                ),
            },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_seconds,
                cookie_name: lookup("auth.cookie_name", "JWT_COOKIE_NAME", "quiz_token"),
                cookie_secure,
            },
            relay: RelayConfig {
                api_url: lookup(
                    "relay.api_url",
                    "RELAY_API_URL",
                    "https://api.openai.com/v1/chat/completions",
                ),
                api_key: lookup("relay.api_key", "RELAY_API_KEY", ""),
                model: lookup("relay.model", "RELAY_MODEL", "gpt-4o-mini"),
                timeout_seconds,
            },
            allowed_origins,
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or(default)
}
