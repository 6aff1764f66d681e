use anyhow::bail;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use lpc32xx_init::ScriptKind;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::util::logging::LevelFilter;

/// Prefix of environment variables overriding the config, sections are split by `__`.
const ENV_PREFIX: &str = "LPC32XX_INIT_";

/// A struct which holds all configs.
#[derive(Debug, Clone)]
pub struct Configs {
    figment: Figment,
}

/// The main struct holding all the possible config options.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub general: General,
    pub openocd: OpenOcd,
    pub board: Board,
    pub memtest: MemTest,
}

/// The general config struct holding all the possible general options.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct General {
    pub script: ScriptKind,
    pub log_level: Option<LevelFilter>,
}

/// Where to find the OpenOCD TCL-RPC server.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenOcd {
    pub host: String,
    pub port: u16,
    /// Response timeout in ms.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Board {
    pub oscillator_hz: u32,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemTest {
    pub sections: u32,
    pub seed: u32,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u128(duration.as_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl Configs {
    pub fn new(conf_dir: &Path) -> Configs {
        // Start off by merging in the default configuration file.
        let mut figment = Figment::new().merge(Toml::string(include_str!("default.toml")));

        // The first file is meant to be checked in with a project, the hidden
        // one holds personal settings.
        for file in ["lpc32xx-init.toml", ".lpc32xx-init.toml"] {
            figment = figment.merge(Toml::file(conf_dir.join(file)));
        }

        Configs { figment }
    }

    /// Merge an explicitly given config file over the ones found so far.
    pub fn merge(&mut self, conf_file: PathBuf) -> anyhow::Result<()> {
        if conf_file.extension().and_then(|e| e.to_str()) != Some("toml") {
            bail!("Config file {} is not a .toml file", conf_file.display());
        }

        if !conf_file.exists() {
            bail!("Config file {} does not exist", conf_file.display());
        }

        self.figment = self.figment.clone().merge(Toml::file(conf_file));
        Ok(())
    }

    /// Extract the config, with environment variables taking precedence over all files.
    pub fn extract(self) -> anyhow::Result<Config> {
        let figment = self
            .figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        match figment.extract::<Config>() {
            Ok(config) => Ok(config),
            Err(figerr) => {
                // Join all the figment errors into a multiline string.
                bail!(
                    "Failed to parse supplied configuration:\n{}",
                    figerr
                        .into_iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<String>>()
                        .join("\n")
                );
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use figment::Jail;
    use lpc32xx_init::ScriptKind;
    use pretty_assertions::assert_eq;

    use super::Configs;

    #[test]
    fn default_config() {
        Jail::expect_with(|jail| {
            let config = Configs::new(jail.directory())
                .extract()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.general.script, ScriptKind::Orion1040);
            assert_eq!(config.general.log_level, None);
            assert_eq!(config.openocd.host, "127.0.0.1");
            assert_eq!(config.openocd.port, 6666);
            assert_eq!(config.openocd.timeout, Duration::from_secs(5));
            assert_eq!(config.board.oscillator_hz, 12_500_000);
            assert_eq!(config.memtest.sections, 256);
            assert_eq!(config.memtest.seed, 0);
            Ok(())
        });
    }

    #[test]
    fn project_file_and_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "lpc32xx-init.toml",
                r#"
                [general]
                script = "nor-loader"

                [openocd]
                port = 4444
                "#,
            )?;
            jail.set_env("LPC32XX_INIT_OPENOCD__PORT", "5555");
            jail.set_env("LPC32XX_INIT_MEMTEST__SEED", "3");

            let config = Configs::new(jail.directory())
                .extract()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.general.script, ScriptKind::NorLoader);
            assert_eq!(config.openocd.port, 5555);
            assert_eq!(config.memtest.seed, 3);
            // untouched values keep their defaults
            assert_eq!(config.openocd.host, "127.0.0.1");
            Ok(())
        });
    }

    #[test]
    fn explicit_file_overrides_project_file() {
        Jail::expect_with(|jail| {
            jail.create_file(".lpc32xx-init.toml", "[board]\noscillator_hz = 13000000\n")?;
            jail.create_file("bench.toml", "[board]\noscillator_hz = 10000000\n")?;

            let mut configs = Configs::new(jail.directory());
            configs
                .merge(jail.directory().join("bench.toml"))
                .map_err(|e| e.to_string())?;
            let config = configs.extract().map_err(|e| e.to_string())?;

            assert_eq!(config.board.oscillator_hz, 10_000_000);
            Ok(())
        });
    }

    #[test]
    fn unknown_config_items_fail() {
        Jail::expect_with(|jail| {
            jail.create_file("lpc32xx-init.toml", "[openocd]\nbogus = 1\n")?;

            assert!(Configs::new(jail.directory()).extract().is_err());
            Ok(())
        });
    }

    #[test]
    fn unknown_scripts_fail() {
        Jail::expect_with(|jail| {
            jail.set_env("LPC32XX_INIT_GENERAL__SCRIPT", "lpc3180");

            assert!(Configs::new(jail.directory()).extract().is_err());
            Ok(())
        });
    }

    #[test]
    fn only_toml_files_are_merged() {
        Jail::expect_with(|jail| {
            jail.create_file("bench.yaml", "board: {}\n")?;

            let mut configs = Configs::new(jail.directory());
            assert!(configs.merge(jail.directory().join("bench.yaml")).is_err());
            assert!(configs.merge(jail.directory().join("missing.toml")).is_err());
            Ok(())
        });
    }
}
