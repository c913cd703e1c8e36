use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "canvas-interop.toml";
pub const DEFAULT_WEB_ROOT: &str = "wwwroot";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Configuration read from canvas-interop.toml. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Web root, relative to the config file.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub host: Option<String>,
}

/// The resolved site context.
#[derive(Debug, Clone)]
pub struct SiteContext {
    /// Directory holding canvas-interop.toml or wwwroot/.
    pub site_dir: PathBuf,
    /// Directory whose files are served.
    pub web_root: PathBuf,
    pub config: Option<SiteConfig>,
}

/// Where and what `serve` listens and serves.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeSettings {
    pub root: PathBuf,
    pub host: String,
    pub port: u16,
}

/// Detect the site starting from a specific directory, walking up.
pub fn detect_site_from(start: &Path) -> anyhow::Result<SiteContext> {
    detect_site_within(start, None)
}

/// Like [`detect_site_from`], but never looks above `ceiling`.
pub fn detect_site_within(start: &Path, ceiling: Option<&Path>) -> anyhow::Result<SiteContext> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: SiteConfig = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid {}: {e}", config_path.display()))?;
            let web_root = dir.join(config.root.as_deref().unwrap_or(DEFAULT_WEB_ROOT));
            return Ok(SiteContext {
                site_dir: dir,
                web_root,
                config: Some(config),
            });
        }
        if dir.join(DEFAULT_WEB_ROOT).is_dir() {
            return Ok(SiteContext {
                web_root: dir.join(DEFAULT_WEB_ROOT),
                site_dir: dir,
                config: None,
            });
        }
        if ceiling.is_some_and(|c| dir.as_path() == c) || !dir.pop() {
            anyhow::bail!(
                "Could not find a site to serve.\n\
                 Run `cicli serve` from a directory containing {CONFIG_FILE} or {DEFAULT_WEB_ROOT}/,\n\
                 or pass the directory explicitly: cicli serve --root <dir>"
            );
        }
    }
}

/// Merge command line arguments over the detected config and defaults.
///
/// An explicit `root` makes site detection optional.
pub fn resolve_serve_settings(
    start: &Path,
    root: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
) -> anyhow::Result<ServeSettings> {
    let (root, config) = match root {
        Some(root) => {
            let config = detect_site_from(start).ok().and_then(|site| site.config);
            (root, config.unwrap_or_default())
        }
        None => {
            let site = detect_site_from(start)?;
            log::debug!("Using site at {}", site.site_dir.display());
            (site.web_root, site.config.unwrap_or_default())
        }
    };
    if !root.is_dir() {
        anyhow::bail!("Web root {} is not a directory", root.display());
    }

    Ok(ServeSettings {
        root,
        host: host.or(config.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: port.or(config.port).unwrap_or(DEFAULT_PORT),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_config_from_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "root = \"public\"\nport = 9000\n").unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        let site = detect_site_from(&nested).unwrap();
        assert_eq!(site.site_dir, dir.path());
        assert_eq!(site.web_root, dir.path().join("public"));
        assert_eq!(site.config.unwrap().port, Some(9000));
    }

    #[test]
    fn test_detect_wwwroot_without_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("wwwroot")).unwrap();

        let site = detect_site_from(dir.path()).unwrap();
        assert_eq!(site.web_root, dir.path().join("wwwroot"));
        assert!(site.config.is_none());
    }

    #[test]
    fn test_detect_no_site() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(detect_site_within(&nested, Some(dir.path())).is_err());
    }

    #[test]
    fn test_ceiling_stops_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("wwwroot")).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        assert!(detect_site_within(&nested, Some(dir.path().join("a").as_path())).is_err());
        let site = detect_site_within(&nested, Some(dir.path())).unwrap();
        assert_eq!(site.site_dir, dir.path());
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "port = \"eighty\"\n").unwrap();
        let err = detect_site_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_arguments_override_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "port = 9000\nhost = \"0.0.0.0\"\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("wwwroot")).unwrap();

        let settings = resolve_serve_settings(dir.path(), None, Some(7000), None).unwrap();
        assert_eq!(
            settings,
            ServeSettings {
                root: dir.path().join("wwwroot"),
                host: "0.0.0.0".into(),
                port: 7000,
            }
        );
    }

    #[test]
    fn test_explicit_root_needs_no_site() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let settings = resolve_serve_settings(&nested, Some(nested.clone()), None, None).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.host, DEFAULT_HOST);
    }

    #[test]
    fn test_missing_web_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "root = \"dist\"\n").unwrap();
        assert!(resolve_serve_settings(dir.path(), None, None, None).is_err());
    }
}
