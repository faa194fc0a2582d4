// src/noyau/reglages.rs
//
// Réglages (valeurs par défaut des saisies + paramètres des moteurs).
// Chargés une fois au démarrage depuis un fichier JSON optionnel ; tout champ
// absent garde sa valeur par défaut.

use serde::{Deserialize, Serialize};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::analyse::valider_variable;
use super::erreurs::ErreurReglages;
use super::riemann::{Methode, SUBDIVISIONS_MAX};

/// Fonction proposée au lancement.
pub const FONCTION_DEFAUT: &str = "((-3**(x+1.893))+8)**2-((3**(x-10))**2)";

pub const DIGITS_DEFAUT: usize = 20;
pub const DIGITS_MAX: usize = 200;

/// Garde-fou : points d’échantillonnage d’une courbe.
pub const RESOLUTION_MAX: usize = 100_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReglagesQuadrature {
    pub tol_abs: f64,
    pub tol_rel: f64,
    pub max_subdivisions: usize,
}

impl Default for ReglagesQuadrature {
    fn default() -> Self {
        ReglagesQuadrature {
            tol_abs: 1.49e-8,
            tol_rel: 1.49e-8,
            max_subdivisions: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReglagesVerification {
    /// Écart absolu toléré entre résultats symbolique et numérique.
    pub tolerance: f64,
    /// Part relative (0 = critère purement absolu).
    pub tolerance_relative: f64,
}

impl Default for ReglagesVerification {
    fn default() -> Self {
        ReglagesVerification {
            tolerance: 1e-5,
            tolerance_relative: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReglagesSymbolique {
    /// Nombre maximal d’étapes de recherche de primitive.
    pub budget: usize,
    /// Points de contrôle (dérivée de la primitive, domaine de l’intégrande).
    pub points_controle: usize,
}

impl Default for ReglagesSymbolique {
    fn default() -> Self {
        ReglagesSymbolique {
            budget: 10_000,
            points_controle: 257,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reglages {
    pub variable: String,
    pub fonction: String,
    /// Seconde courbe (aire entre f et g).
    pub fonction_2: String,
    pub borne_a: f64,
    pub borne_b: f64,
    pub subdivisions: i64,
    pub methode: Methode,
    /// Nombre de points par courbe tracée.
    pub resolution: usize,
    /// Chiffres de la lecture décimale (ΣLocal).
    pub digits: usize,
    pub verification: ReglagesVerification,
    pub quadrature: ReglagesQuadrature,
    pub symbolique: ReglagesSymbolique,
}

impl Default for Reglages {
    fn default() -> Self {
        Reglages {
            variable: "x".to_string(),
            fonction: FONCTION_DEFAUT.to_string(),
            fonction_2: "0".to_string(),
            borne_a: 0.0,
            borne_b: 1.0,
            subdivisions: 10,
            methode: Methode::Gauche,
            resolution: 1000,
            digits: DIGITS_DEFAUT,
            verification: ReglagesVerification::default(),
            quadrature: ReglagesQuadrature::default(),
            symbolique: ReglagesSymbolique::default(),
        }
    }
}

impl Reglages {
    pub fn depuis_json(texte: &str) -> Result<Reglages, ErreurReglages> {
        let r: Reglages = serde_json::from_str(texte)?;
        r.valider()?;
        Ok(r)
    }

    pub fn charger(chemin: impl AsRef<Path>) -> Result<Reglages, ErreurReglages> {
        let fichier = File::open(chemin)?;
        let r: Reglages = serde_json::from_reader(BufReader::new(fichier))?;
        r.valider()?;
        Ok(r)
    }

    pub fn valider(&self) -> Result<(), ErreurReglages> {
        let invalide = |m: &str| Err(ErreurReglages::Invalide(m.to_string()));

        if valider_variable(&self.variable).is_err() {
            return invalide("variable : identifiant attendu (ex: x)");
        }
        if !self.borne_a.is_finite() || !self.borne_b.is_finite() {
            return invalide("bornes : valeurs finies attendues");
        }
        if !(1..=SUBDIVISIONS_MAX).contains(&self.subdivisions) {
            return invalide("subdivisions : 1 ≤ n ≤ 1000000 attendu");
        }
        if !(2..=RESOLUTION_MAX).contains(&self.resolution) {
            return invalide("resolution : entre 2 et 100000 points");
        }
        if self.digits > DIGITS_MAX {
            return invalide("digits : 200 au plus");
        }
        let v = &self.verification;
        if !(v.tolerance > 0.0) || !(v.tolerance_relative >= 0.0) {
            return invalide("verification : tolérance > 0 et part relative ≥ 0 attendues");
        }
        let q = &self.quadrature;
        if !(q.tol_abs > 0.0) || !(q.tol_rel >= 0.0) || q.max_subdivisions < 1 {
            return invalide("quadrature : tol_abs > 0, tol_rel ≥ 0, max_subdivisions ≥ 1 attendus");
        }
        if self.symbolique.budget < 1 || self.symbolique.points_controle < 2 {
            return invalide("symbolique : budget ≥ 1 et points_controle ≥ 2 attendus");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defauts_valides() {
        let r = Reglages::default();
        assert!(r.valider().is_ok());
        assert_eq!(r.borne_a, 0.0);
        assert_eq!(r.borne_b, 1.0);
        assert_eq!(r.subdivisions, 10);
        assert_eq!(r.methode, Methode::Gauche);
        assert_eq!(r.verification.tolerance, 1e-5);
        // tolérances et limite de scipy `quad`
        assert_eq!(r.quadrature.tol_abs, 1.49e-8);
        assert_eq!(r.quadrature.tol_rel, 1.49e-8);
        assert_eq!(r.quadrature.max_subdivisions, 50);
    }

    #[test]
    fn fusion_avec_defauts() {
        let r = Reglages::depuis_json(r#"{ "borne_b": 2.5, "methode": "right", "quadrature": { "max_subdivisions": 200 } }"#)
            .unwrap();
        assert_eq!(r.borne_b, 2.5);
        assert_eq!(r.methode, Methode::Droite);
        assert_eq!(r.quadrature.max_subdivisions, 200);
        // champs absents : défauts
        assert_eq!(r.quadrature.tol_abs, 1.49e-8);
        assert_eq!(r.fonction, FONCTION_DEFAUT);
    }

    #[test]
    fn valeurs_refusees() {
        assert!(matches!(
            Reglages::depuis_json(r#"{ "subdivisions": 0 }"#),
            Err(ErreurReglages::Invalide(_))
        ));
        assert!(matches!(
            Reglages::depuis_json(r#"{ "fonction": "x", "subdivisions": 4611686018427387904 }"#),
            Err(ErreurReglages::Invalide(_))
        ));
        assert!(matches!(
            Reglages::depuis_json(r#"{ "resolution": 1000000000 }"#),
            Err(ErreurReglages::Invalide(_))
        ));
        assert!(Reglages::depuis_json(r#"{ "subdivisions": 1000000 }"#).is_ok());
        assert!(matches!(
            Reglages::depuis_json(r#"{ "verification": { "tolerance": -1.0 } }"#),
            Err(ErreurReglages::Invalide(_))
        ));
        assert!(matches!(
            Reglages::depuis_json(r#"{ "variable": "sin" }"#),
            Err(ErreurReglages::Invalide(_))
        ));
        assert!(matches!(Reglages::depuis_json("{ oups"), Err(ErreurReglages::Json(_))));
    }

    #[test]
    fn fichier_absent() {
        let e = Reglages::charger("/chemin/qui/n/existe/pas.json").unwrap_err();
        assert!(matches!(e, ErreurReglages::Lecture(_)));
    }
}
