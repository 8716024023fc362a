use daletou_db::models::Region;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerateError>;

/// Entrées mal formées. Un résultat vide ou incomplet n'est jamais une erreur.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("le nombre de grilles demandé doit être positif")]
    ZeroCount,
    #[error("budget de tentatives nul (attempts_per_candidate = 0)")]
    ZeroBudget,
    #[error("{field} : numéro {number} hors de l'univers de la zone {region}")]
    NumberOutOfRange {
        region: Region,
        field: &'static str,
        number: u8,
    },
    #[error("bloc inconnu {name:?} pour la zone {region}")]
    UnknownBlock { region: Region, name: String },
    #[error("poids {weight} invalide pour le bloc {name:?}")]
    InvalidBlockWeight { name: String, weight: f64 },
    #[error("bloc {name:?} [{start}, {end}] invalide pour la zone {region}")]
    InvalidBlock {
        region: Region,
        name: String,
        start: u8,
        end: u8,
    },
    #[error("bloc {name:?} défini deux fois pour la zone {region}")]
    DuplicateBlock { region: Region, name: String },
    #[error("poids {field} invalide : {value}")]
    InvalidWeight { field: &'static str, value: f64 },
}
