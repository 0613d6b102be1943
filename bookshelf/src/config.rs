use anyhow::{anyhow, Result};
use shelf_axum::UploadLimits;
use shelf_core::ShelfConfig;

const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_MAX_UPLOAD_MB: usize = 10;

/// Prefix for generic overrides: `BOOKSHELF__STORAGE__DIR=/srv/covers` sets `storage.dir`.
pub const ENV_OVERRIDE_PREFIX: &str = "BOOKSHELF__";

/// Load configuration from the process environment.
pub fn from_env() -> Result<ShelfConfig> {
    let mut config = from_lookup(|key| std::env::var(key).ok());
    config.load_env(ENV_OVERRIDE_PREFIX);
    validate(&config)?;
    Ok(config)
}

/// Build configuration from any key lookup (environment, tests, ...).
pub fn from_lookup<F>(lookup: F) -> ShelfConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ShelfConfig::new();
    let var = |key: &str, default: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    // HTTP Server Configuration
    config.set("http.host", var("HTTP_HOST", "127.0.0.1"));
    config.set("http.port", var("HTTP_PORT", "8080"));

    // Books
    config.set("bookshelf.page_size", var("BOOKSHELF_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string()));
    config.set("bookshelf.backend", var("BOOKSHELF_BACKEND", "memory"));
    config.set("bookshelf.database", var("BOOKSHELF_DATABASE", "bookshelf.db"));

    // Cover images
    config.set("storage.backend", var("BOOKSHELF_STORAGE", "local"));
    config.set("storage.dir", var("BOOKSHELF_UPLOAD_DIR", "uploads"));
    config.set("storage.public_url", var("BOOKSHELF_UPLOAD_URL", "/uploads"));
    config.set(
        "storage.max_upload_mb",
        var("BOOKSHELF_MAX_UPLOAD_MB", &DEFAULT_MAX_UPLOAD_MB.to_string()),
    );

    // Identity; unset means every request is anonymous
    if let Some(secret) = lookup("AUTH_JWT_SECRET").filter(|s| !s.trim().is_empty()) {
        config.set("auth.jwt.secret", secret.trim());
    }

    config
}

/// Fail fast on values the server could only trip over later.
pub fn validate(config: &ShelfConfig) -> Result<()> {
    page_size(config)?;
    upload_limits(config)?;

    match config.get("bookshelf.backend") {
        Some("memory") | Some("sqlite") | None => {}
        Some(other) => return Err(anyhow!("unknown bookshelf.backend '{other}' (memory, sqlite)")),
    }
    match config.get("storage.backend") {
        Some("local") | Some("memory") | None => {}
        Some(other) => return Err(anyhow!("unknown storage.backend '{other}' (local, memory)")),
    }
    Ok(())
}

pub fn page_size(config: &ShelfConfig) -> Result<usize> {
    match config.get_usize("bookshelf.page_size")? {
        Some(0) => Err(anyhow!("bookshelf.page_size must be at least 1")),
        Some(n) => Ok(n),
        None => Ok(DEFAULT_PAGE_SIZE),
    }
}

pub fn max_upload_bytes(config: &ShelfConfig) -> Result<u64> {
    let mb = config
        .get_usize("storage.max_upload_mb")?
        .unwrap_or(DEFAULT_MAX_UPLOAD_MB);
    Ok(mb as u64 * 1024 * 1024)
}

pub fn upload_limits(config: &ShelfConfig) -> Result<UploadLimits> {
    Ok(UploadLimits::default().with_max_file_bytes(max_upload_bytes(config)?))
}
