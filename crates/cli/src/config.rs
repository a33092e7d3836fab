//! Account config file loading for the CLI.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    qqbot::QqBotAccountConfig,
    serde::Deserialize,
    tracing::debug,
};

/// Config file names checked in the working directory, in order.
const CONFIG_FILENAMES: &[&str] = &["qqbot.toml", "qqbot.json"];

/// Top-level CLI config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Account used when `--account` is not given.
    pub default_account: Option<String>,
    pub accounts: BTreeMap<String, QqBotAccountConfig>,
}

impl CliConfig {
    /// Pick the account named `requested`, else the default, else the only one.
    pub fn account(&self, requested: Option<&str>) -> anyhow::Result<(String, QqBotAccountConfig)> {
        let name = match requested.or(self.default_account.as_deref()) {
            Some(name) => name.to_string(),
            None if self.accounts.len() == 1 => self
                .accounts
                .keys()
                .next()
                .cloned()
                .unwrap_or_default(),
            None => anyhow::bail!(
                "{} accounts configured; pick one with --account",
                self.accounts.len()
            ),
        };
        let config = self
            .accounts
            .get(&name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("account not found in config: {name}"))?;
        Ok((name, config))
    }
}

/// Load config from `path` with `${ENV}` substitution.
pub fn load_config(path: &Path) -> anyhow::Result<CliConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Find a config file in the working directory.
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<CliConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    debug!(path = %path.display(), format = ext, "parsing config");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

/// Replace `${ENV_VAR}` placeholders. Unresolvable variables are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                result.push_str("${");
                rest = after;
            },
        }
    }
    result.push_str(rest);
    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    fn lookup(name: &str) -> Option<String> {
        match name {
            "QQBOT_TEST_SECRET" => Some("s3cret".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("secret = \"${QQBOT_TEST_SECRET}\"", lookup),
            "secret = \"s3cret\""
        );
    }

    #[test]
    fn leaves_unknown_and_malformed_placeholders() {
        assert_eq!(substitute_env_with("${NOPE} x", lookup), "${NOPE} x");
        assert_eq!(substitute_env_with("a ${} b", lookup), "a ${} b");
        assert_eq!(substitute_env_with("tail ${OPEN", lookup), "tail ${OPEN");
    }

    #[test]
    fn parse_toml_accounts() {
        let raw = r#"
            default_account = "main"

            [accounts.main]
            app_id = "1020"
            client_secret = "abc"

            [accounts.test]
            app_id = "1021"
            client_secret = "def"
            sandbox = true
        "#;
        let cfg = parse_config(raw, Path::new("qqbot.toml")).unwrap();
        let (name, main) = cfg.account(None).unwrap();
        assert_eq!(name, "main");
        assert_eq!(main.app_id, "1020");
        assert_eq!(main.client_secret.expose_secret(), "abc");

        let (_, test) = cfg.account(Some("test")).unwrap();
        assert!(test.sandbox);
        assert!(cfg.account(Some("missing")).is_err());
    }

    #[test]
    fn single_account_is_implicit_default() {
        let raw = r#"{"accounts": {"only": {"app_id": "1", "client_secret": "x"}}}"#;
        let cfg = parse_config(raw, Path::new("qqbot.json")).unwrap();
        assert_eq!(cfg.account(None).unwrap().0, "only");
    }

    #[test]
    fn ambiguous_accounts_require_selection() {
        let raw = r#"
            [accounts.a]
            app_id = "1"
            [accounts.b]
            app_id = "2"
        "#;
        let cfg = parse_config(raw, Path::new("qqbot.toml")).unwrap();
        let err = cfg.account(None).unwrap_err();
        assert!(err.to_string().contains("--account"));
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(parse_config("", Path::new("qqbot.ini")).is_err());
    }
}
