use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("Arquivo não encontrado: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Falha ao ler {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exported map fragments available for embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapChoice {
    #[default]
    Classification,
    EconomicDensity,
}

impl MapChoice {
    pub const ALL: [MapChoice; 2] = [MapChoice::Classification, MapChoice::EconomicDensity];

    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("densidade") => MapChoice::EconomicDensity,
            _ => MapChoice::Classification,
        }
    }

    pub fn param(&self) -> &'static str {
        match self {
            MapChoice::Classification => "classificacao",
            MapChoice::EconomicDensity => "densidade",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MapChoice::Classification => "Classificação de Bairros (4 categorias)",
            MapChoice::EconomicDensity => "Densidade Econômica",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            MapChoice::Classification => "mapa_classificacao_bairros.html",
            MapChoice::EconomicDensity => "mapa_densidade_economica.html",
        }
    }
}

pub fn load_map(dir: &Path, choice: MapChoice) -> Result<String, MapError> {
    let path = dir.join(choice.file_name());
    fs::read_to_string(&path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            MapError::NotFound(path)
        } else {
            MapError::Io { path, source }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_existing_map() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mapa_densidade_economica.html"), "<div>mapa</div>").unwrap();

        let html = load_map(dir.path(), MapChoice::EconomicDensity).unwrap();
        assert_eq!(html, "<div>mapa</div>");
    }

    #[test]
    fn missing_map_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_map(dir.path(), MapChoice::Classification).unwrap_err();
        assert!(matches!(err, MapError::NotFound(_)));
        assert!(err.to_string().contains("mapa_classificacao_bairros.html"));
    }

    #[test]
    fn choice_params_round_trip() {
        for choice in MapChoice::ALL {
            assert_eq!(MapChoice::from_param(Some(choice.param())), choice);
        }
        assert_eq!(MapChoice::from_param(Some("x")), MapChoice::Classification);
    }
}
