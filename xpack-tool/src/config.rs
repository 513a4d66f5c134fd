use std::{collections::HashMap, env, fs};

use anyhow::Context;
use xpack_lib::Config;

/// Reads environment variables prefixed with XPACK_
pub fn read_env() -> Config {
    read_vars(env::vars().collect())
}

fn read_vars(vars: HashMap<String, String>) -> Config {
    macro_rules! get_env {
        ($key:expr) => {
            vars.get(&format!("XPACK_{}", $key)).cloned()
        };
    }

    Config {
        dir: get_env!("DIR"),
        config: get_env!("CONFIG"),
        output: get_env!("OUTPUT"),
        destination: get_env!("DESTINATION"),
        skip: get_env!("SKIP").map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }),
        dry: get_env!("DRY").map(|v| parse_flag(&v)),
    }
}

fn parse_flag(v: &str) -> bool {
    v == "true" || v == "1" || v.eq_ignore_ascii_case("yes")
}

/// Reads YAML or JSON config from file
pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
    let lower = path.to_lowercase();
    let cfg = if lower.ends_with(".json") {
        serde_json::from_str(&content).with_context(|| format!("parsing {path}"))?
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("parsing {path}"))?
    };
    Ok(cfg)
}

/// Merge configs by priority: env < file < cli
pub fn merge_configs(env: Config, file: Config, cli: Config) -> Config {
    fn pick<T>(env: Option<T>, file: Option<T>, cli: Option<T>) -> Option<T> {
        cli.or(file).or(env)
    }

    Config {
        dir: pick(env.dir, file.dir, cli.dir),
        config: pick(env.config, file.config, cli.config),
        output: pick(env.output, file.output, cli.output),
        destination: pick(env.destination, file.destination, cli.destination),
        skip: pick(env.skip, file.skip, cli.skip),
        dry: pick(env.dry, file.dry, cli.dry),
    }
}
