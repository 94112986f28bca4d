use anyhow::{anyhow, Result};

pub fn validate_origin(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("origin is empty"));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(anyhow!("origin '{}' must start with http:// or https://", trimmed));
    }
    if trimmed.ends_with('/') {
        return Err(anyhow!("origin '{}' must not end with '/'", trimmed));
    }
    Ok(())
}

pub fn ensure_positive(name: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(anyhow!("{} must be greater than 0", name));
    }
    Ok(())
}
