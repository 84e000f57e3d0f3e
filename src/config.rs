//! Configuração do registro de handoffs carregada a partir de `wave.toml`.
//!
//! A struct [`HandoffConfig`] contém os diretórios de armazenamento e a política
//! de durabilidade. Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `WAVE_HANDOFF_DIR` e `WAVE_TRAIL_DIR` têm precedência
//! sobre o arquivo.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{HandoffError, Result};

/// Configuração de nível superior carregada de `wave.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct HandoffConfig {
    /// Diretório com um arquivo `<sessão>.jsonl` de marcadores por sessão.
    #[serde(default = "default_handoff_dir")]
    pub handoff_dir: PathBuf,

    /// Diretório com um arquivo `<sessão>.atom.jsonl` de trilha por sessão.
    #[serde(default = "default_trail_dir")]
    pub trail_dir: PathBuf,

    /// Chama `sync_data` após cada append.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Sessão usada pela CLI quando nenhuma é informada.
    #[serde(default = "default_session")]
    pub default_session: String,
}

// Valor padrão para o diretório de marcadores: ".wave/handoffs".
fn default_handoff_dir() -> PathBuf {
    PathBuf::from(".wave/handoffs")
}

// Valor padrão para o diretório da trilha: ".wave/atom-trail".
fn default_trail_dir() -> PathBuf {
    PathBuf::from(".wave/atom-trail")
}

fn default_sync_writes() -> bool {
    true
}

fn default_session() -> String {
    "default".to_string()
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            handoff_dir: default_handoff_dir(),
            trail_dir: default_trail_dir(),
            sync_writes: default_sync_writes(),
            default_session: default_session(),
        }
    }
}

impl HandoffConfig {
    /// Cria uma configuração apontando para os dois diretórios informados.
    pub fn with_dirs(handoff_dir: impl Into<PathBuf>, trail_dir: impl Into<PathBuf>) -> Self {
        Self {
            handoff_dir: handoff_dir.into(),
            trail_dir: trail_dir.into(),
            ..Self::default()
        }
    }

    /// Carrega a configuração de `wave.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("wave.toml"))
    }

    /// Carrega a configuração de um arquivo explícito, aplicando as variáveis de ambiente.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).map_err(|e| HandoffError::io(path, e))?;
            Self::parse(&contents)?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo de configuração.
        if let Some(dir) = non_empty_env("WAVE_HANDOFF_DIR") {
            config.handoff_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty_env("WAVE_TRAIL_DIR") {
            config.trail_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Interpreta o conteúdo TOML e rejeita valores vazios.
    pub fn parse(contents: &str) -> Result<Self> {
        let config = toml::from_str::<HandoffConfig>(contents)?;
        if config.default_session.trim().is_empty() {
            return Err(HandoffError::Config(
                "default_session must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = HandoffConfig::default();
        assert_eq!(config.handoff_dir, PathBuf::from(".wave/handoffs"));
        assert_eq!(config.trail_dir, PathBuf::from(".wave/atom-trail"));
        assert!(config.sync_writes);
        assert_eq!(config.default_session, "default");
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            handoff_dir = "/var/lib/wave/handoffs"
            sync_writes = false
        "#;
        let config = HandoffConfig::parse(toml_str).unwrap();
        assert_eq!(config.handoff_dir, PathBuf::from("/var/lib/wave/handoffs"));
        assert!(!config.sync_writes);
        assert_eq!(config.trail_dir, PathBuf::from(".wave/atom-trail"));
        assert_eq!(config.default_session, "default");
    }

    #[test]
    fn rejects_blank_default_session() {
        let err = HandoffConfig::parse(r#"default_session = "  ""#).unwrap_err();
        assert!(matches!(err, HandoffError::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = HandoffConfig::parse("handoff_dir = [").unwrap_err();
        assert!(matches!(err, HandoffError::Toml(_)));
    }

    #[test]
    fn load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wave.toml");
        std::fs::write(&path, "default_session = \"nightly\"\n").unwrap();

        let config = HandoffConfig::load_from(&path).unwrap();
        assert_eq!(config.default_session, "nightly");
    }

    #[test]
    fn load_from_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HandoffConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.sync_writes);
        assert_eq!(config.default_session, "default");
    }

    #[test]
    fn with_dirs_keeps_other_defaults() {
        let config = HandoffConfig::with_dirs("/a", "/b");
        assert_eq!(config.handoff_dir, PathBuf::from("/a"));
        assert_eq!(config.trail_dir, PathBuf::from("/b"));
        assert!(config.sync_writes);
    }
}
