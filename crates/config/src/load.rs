use crate::error::{ErrorKind, Result};
use crate::params::{Parameters, keys};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use std::path::{Path, PathBuf};

/// Environment variables starting with this prefix override file values.
/// `DOCFS_FILE_PATH` becomes the `filePath` parameter, and so on.
pub const ENV_PREFIX: &str = "DOCFS_";

/// Location of the per-user configuration file, if the platform has one.
///
/// The file is only returned when it actually exists.
pub fn default_config_file() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "docfs")?;
    let path = dirs.config_dir().join("docfs.toml");
    path.is_file().then_some(path)
}

/// Assemble [`Parameters`] from an optional configuration file and the
/// environment.
///
/// The file format is picked from its extension (`.toml`, `.yaml`/`.yml`,
/// `.json`); anything else is read as TOML. When `file` is `None` the
/// [default configuration file](default_config_file) is used if present.
pub fn load(file: Option<&Path>) -> Result<Parameters> {
    let mut figment = Figment::new();
    if let Some(path) = file.map(Path::to_path_buf).or_else(default_config_file) {
        tracing::debug!(path = %path.display(), "Loading connector parameters from file");
        figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => figment.merge(Yaml::file(&path)),
            Some("json") => figment.merge(Json::file(&path)),
            _ => figment.merge(Toml::file(&path)),
        };
    }
    // `map` resets lowercasing, so it has to be turned off afterwards.
    figment = figment.merge(Env::prefixed(ENV_PREFIX).map(|key| env_key(key.as_str()).into()).lowercase(false));
    figment.extract::<Parameters>().or_raise(|| ErrorKind::Load)
}

/// Map an environment variable suffix onto the host's `camelCase` key, or
/// lowercase it if it isn't one of the reserved keys.
fn env_key(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    keys::ALL
        .iter()
        .find(|(snake, _)| *snake == lower)
        .map(|(_, camel)| camel.to_string())
        .unwrap_or(lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{TimeRange, Value};
    use figment::Jail;
    use rstest::rstest;

    fn jailed(result: Result<Parameters>) -> figment::Result<Parameters> {
        result.map_err(|e| figment::Error::from(e.to_string()))
    }

    #[rstest]
    #[case("FILE_PATH", "filePath")]
    #[case("file_path", "filePath")]
    #[case("METADATA_AS_XML", "metadataAsXml")]
    #[case("INCLUDE_BINARIES", "includeBinaries")]
    #[case("SOMETHING_ELSE", "something_else")]
    fn test_env_key(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(env_key(raw), expected);
    }

    #[test]
    fn test_load_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "docfs.toml",
                r#"
                    filePath = "/srv/source"
                    metadataAsXml = false
                    startTime = 1625506960301
                "#,
            )?;
            let params = jailed(load(Some(Path::new("docfs.toml"))))?;
            assert_eq!(params.file_path().unwrap(), PathBuf::from("/srv/source"));
            assert!(!params.metadata_as_xml().unwrap());
            assert_eq!(params.date_filter().unwrap(), TimeRange::new(1_625_506_960_301, i64::MAX));
            Ok(())
        });
    }

    #[test]
    fn test_load_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file("docfs.yaml", "filePath: /srv/yaml\nincludeBinaries: true\n")?;
            let params = jailed(load(Some(Path::new("docfs.yaml"))))?;
            assert_eq!(params.get(keys::FILE_PATH), Some(&Value::String("/srv/yaml".to_string())));
            assert!(params.include_binaries().unwrap());
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("docfs.json", r#"{"filePath": "/from/file", "endTime": 10}"#)?;
            jail.set_env("DOCFS_FILE_PATH", "/from/env");
            jail.set_env("DOCFS_ALL_VERSIONS", "true");
            let params = jailed(load(Some(Path::new("docfs.json"))))?;
            assert_eq!(params.file_path().unwrap(), PathBuf::from("/from/env"));
            assert!(params.delete_all_versions().unwrap());
            assert_eq!(params.date_filter().unwrap().end, 10);
            Ok(())
        });
    }

    #[test]
    fn test_environment_keeps_camel_case_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("DOCFS_INCLUDE_BINARIES", "true");
            jail.set_env("DOCFS_METADATA_AS_XML", "false");
            let params = jailed(load(Some(Path::new("absent.toml"))))?;
            assert_eq!(params.get(keys::INCLUDE_BINARIES), Some(&Value::Boolean(true)));
            assert!(params.include_binaries().unwrap());
            assert!(!params.metadata_as_xml().unwrap());
            Ok(())
        });
    }

    #[test]
    fn test_unset_keys_fall_back_to_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("docfs.toml", r#"filePath = "/srv/source""#)?;
            let params = jailed(load(Some(Path::new("docfs.toml"))))?;
            assert!(params.metadata_as_xml().unwrap());
            assert_eq!(params.date_filter().unwrap(), TimeRange::default());
            Ok(())
        });
    }
}
