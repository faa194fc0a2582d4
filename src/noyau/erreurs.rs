// src/noyau/erreurs.rs
//
// Taxonomie des erreurs du noyau.
// Chaque action utilisateur renvoie Result<_, ErreurNoyau> ; la vue convertit
// l’erreur en bandeau (Display) sans interrompre la session.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ErreurNoyau {
    /// Chaîne mal formée (parenthèses, symbole inconnu, opérateur mal placé).
    #[error("analyse : {0}")]
    Analyse(String),

    /// Le moteur symbolique ne produit pas de résultat exploitable.
    #[error("intégration symbolique : {0}")]
    Integration(String),

    /// Fonction indéfinie en un point échantillonné.
    #[error("évaluation numérique : {0}")]
    EvaluationNumerique(String),

    #[error("partition invalide : n = {0} (il faut 1 ≤ n ≤ 1000000)")]
    PartitionInvalide(i64),

    /// Échec du solveur (≠ « aucune intersection », qui est un résultat valide).
    #[error("intersections : {0}")]
    Intersection(String),

    /// Résultat symbolique non réductible à un réel.
    #[error("conversion en réel impossible : {0}")]
    Coercion(String),

    #[error("intervalle invalide : [{a}, {b}] (bornes finies attendues)")]
    IntervalleInvalide { a: f64, b: f64 },
}

impl ErreurNoyau {
    pub fn analyse(msg: impl Into<String>) -> Self {
        ErreurNoyau::Analyse(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        ErreurNoyau::EvaluationNumerique(msg.into())
    }
}

/// Erreurs de chargement des réglages (fichier JSON).
#[derive(Debug, Error)]
pub enum ErreurReglages {
    #[error("lecture du fichier de réglages : {0}")]
    Lecture(#[from] std::io::Error),

    #[error("réglages JSON invalides : {0}")]
    Json(#[from] serde_json::Error),

    #[error("réglage invalide : {0}")]
    Invalide(String),
}
