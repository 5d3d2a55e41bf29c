//! Configuração do capgen carregada a partir de `capgen.toml`.
//!
//! A struct [`GenConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `CAPGEN_OPENSCAD` tem precedência sobre o arquivo.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::Profile;
use crate::pool::default_limit;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "capgen.toml";

/// Formatos de saída aceitos pelo `openscad -o`.
const FORMATS: &[&str] = &["stl", "off", "amf", "3mf", "csg", "dxf", "svg"];

/// Configuração de nível superior carregada de `capgen.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenConfig {
    /// Diretório onde os modelos gerados são gravados.
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,

    /// Diretório que contém a biblioteca `KeyV2` (padrão: `target_dir`).
    #[serde(default)]
    pub library_dir: Option<PathBuf>,

    /// Executável do OpenSCAD.
    #[serde(default = "default_openscad")]
    pub openscad: PathBuf,

    /// Extensão do arquivo gerado, repassada ao `openscad -o`.
    #[serde(default = "default_format")]
    pub format: String,

    /// Máximo de processos worker simultâneos.
    #[serde(default)]
    pub max_concurrent: Option<usize>,

    /// Perfis incluídos no catálogo.
    #[serde(default = "default_profiles")]
    pub profiles: Vec<Profile>,

    /// Grava `capgen-report.json` ao final da execução.
    #[serde(default = "default_write_report")]
    pub write_report: bool,
}

// Valor padrão para o diretório de saída: "target".
fn default_target_dir() -> PathBuf {
    PathBuf::from("target")
}

fn default_openscad() -> PathBuf {
    PathBuf::from("openscad")
}

fn default_format() -> String {
    "stl".to_string()
}

// Todos os perfis, na ordem do catálogo.
fn default_profiles() -> Vec<Profile> {
    Profile::ALL.to_vec()
}

fn default_write_report() -> bool {
    true
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            target_dir: default_target_dir(),
            library_dir: None,
            openscad: default_openscad(),
            format: default_format(),
            max_concurrent: None,
            profiles: default_profiles(),
            write_report: default_write_report(),
        }
    }
}

impl GenConfig {
    /// Carrega a configuração de `path`, ou de `capgen.toml` no diretório atual.
    ///
    /// Um caminho explícito precisa existir; sem caminho, usa valores padrão
    /// se o arquivo não existir.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração.
        if let Some(openscad) = std::env::var_os("CAPGEN_OPENSCAD").filter(|v| !v.is_empty()) {
            config.openscad = PathBuf::from(openscad);
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str::<GenConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Rejeita formatos desconhecidos.
    pub fn validate(&self) -> Result<()> {
        if !FORMATS.contains(&self.format.as_str()) {
            bail!(
                "unsupported output format '{}' (expected one of: {})",
                self.format,
                FORMATS.join(", ")
            );
        }
        Ok(())
    }

    pub fn library_dir(&self) -> &Path {
        self.library_dir.as_deref().unwrap_or(&self.target_dir)
    }

    /// Limite de concorrência efetivo; zero é rejeitado pelo pool.
    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrent.unwrap_or_else(default_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = GenConfig::default();
        assert_eq!(config.target_dir, PathBuf::from("target"));
        assert_eq!(config.library_dir(), Path::new("target"));
        assert_eq!(config.format, "stl");
        assert_eq!(config.profiles.len(), 8);
        assert!(config.write_report);
        assert!(config.concurrency_limit() >= 1);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            target_dir = "out"
            max_concurrent = 2
            profiles = ["dsa", "mt3"]
        "#;
        let config: GenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.target_dir, PathBuf::from("out"));
        assert_eq!(config.concurrency_limit(), 2);
        assert_eq!(config.profiles, vec![Profile::Dsa, Profile::Mt3]);
        assert_eq!(config.openscad, PathBuf::from("openscad"));
        assert_eq!(config.library_dir(), Path::new("out"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<GenConfig>("max_concurency = 2").is_err());
        assert!(toml::from_str::<GenConfig>(r#"profiles = ["gmk"]"#).is_err());
    }

    #[test]
    fn unsupported_format_fails_validation() {
        let config = GenConfig {
            format: "glb".into(),
            ..GenConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "format = \"3mf\"\nlibrary_dir = \"/opt/keyv2\"\n").unwrap();

        let config = GenConfig::load(Some(&path)).unwrap();
        assert_eq!(config.format, "3mf");
        assert_eq!(config.library_dir(), Path::new("/opt/keyv2"));
    }

    #[test]
    fn load_fails_on_missing_explicit_path() {
        let tmp = TempDir::new().unwrap();
        assert!(GenConfig::load(Some(&tmp.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn load_falls_back_to_defaults() {
        // No ambiente de teste, tipicamente não há capgen.toml no diretório de trabalho.
        let config = GenConfig::load(None).unwrap();
        assert_eq!(config.format, "stl");
    }
}
