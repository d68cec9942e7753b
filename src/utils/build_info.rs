/// Compile-time build metadata produced by `build.rs`.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

/// Returns the statically-embedded build metadata.
pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("CASHFLOW_ENGINE_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("CASHFLOW_ENGINE_BUILD_STATUS").unwrap_or("unknown"),
        timestamp: option_env!("CASHFLOW_ENGINE_BUILD_TIMESTAMP").unwrap_or("unknown"),
        target: option_env!("CASHFLOW_ENGINE_BUILD_TARGET").unwrap_or("unknown"),
        profile: option_env!("CASHFLOW_ENGINE_BUILD_PROFILE").unwrap_or("unknown"),
        rustc: option_env!("CASHFLOW_ENGINE_BUILD_RUSTC").unwrap_or("unknown"),
    }
}

impl BuildMetadata {
    /// One-line form printed by `cashflow_cli version`.
    pub fn summary(&self) -> String {
        format!(
            "cashflow_engine {} ({} {}, {} {}, built {})",
            self.version, self.git_hash, self.git_status, self.target, self.profile, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_carries_crate_version() {
        let meta = current();
        assert_eq!(meta.version, env!("CARGO_PKG_VERSION"));
        assert!(meta.summary().contains(meta.version));
    }
}
