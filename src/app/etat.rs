//! src/app/etat.rs
//!
//! État UI (sans vue, sans calcul).
//!
//! Rôle : contenir la saisie courante, les sorties déjà mises en forme et la figure,
//! et offrir des opérations simples (AC / effacement) sans logique d’affichage.
//!
//! Contrats :
//! - Aucun calcul ici : les actions du noyau sont appelées par vue.rs.
//! - Les réglages chargés au démarrage restent la référence de AC.
//! - Défense en profondeur : bornes sur ΣLocal (digits).

use crate::noyau::figure::Figure;
use crate::noyau::reglages::{Reglages, DIGITS_MAX};

/// Bandeau de statut (une action = au plus un bandeau).
#[derive(Clone, Debug, PartialEq)]
pub enum Bandeau {
    Succes(String),
    Avertissement(String),
    Erreur(String),
}

#[derive(Clone, Default, Debug)]
pub struct Demarche {
    pub jetons: String,
    pub rpn: String,
    pub avant: String,
    pub apres: String,
    pub primitive: String,
}

#[derive(Clone, Debug)]
pub struct AppIntegrale {
    // --- valeurs de départ (fichier de réglages ou défauts) ---
    defauts: Reglages,

    // --- saisie utilisateur ---
    pub saisie: Reglages,

    // --- sorties ---
    pub titre_resultat: String,
    pub exact: String,          // résultat symbolique (forme lisible)
    pub latex: String,          // source LaTeX
    pub lecture: Option<String>, // ΣLocal (résultat rationnel seulement)
    pub numerique: String,      // quadrature / somme / aire
    pub intersections: String,
    pub bandeau: Option<Bandeau>,
    pub figure: Option<Figure>,

    // --- démarche (panneau d’explication) ---
    pub demarche: Demarche,
}

impl Default for AppIntegrale {
    fn default() -> Self {
        Self::avec_reglages(Reglages::default())
    }
}

impl AppIntegrale {
    pub fn avec_reglages(reglages: Reglages) -> Self {
        Self {
            saisie: reglages.clone(),
            defauts: reglages,
            titre_resultat: String::new(),
            exact: String::new(),
            latex: String::new(),
            lecture: None,
            numerique: String::new(),
            intersections: String::new(),
            bandeau: None,
            figure: None,
            demarche: Demarche::default(),
        }
    }

    /* ------------------------ Actions “boutons” (état seulement) ------------------------ */

    /// AC : saisie remise aux réglages de départ + résultats effacés.
    pub fn reset_total(&mut self) {
        self.saisie = self.defauts.clone();
        self.clear_resultats();
    }

    /// Efface résultats + bandeau + figure + démarche (sans toucher à la saisie).
    pub fn clear_resultats(&mut self) {
        self.titre_resultat.clear();
        self.exact.clear();
        self.latex.clear();
        self.lecture = None;
        self.numerique.clear();
        self.intersections.clear();
        self.bandeau = None;
        self.figure = None;
        self.demarche = Demarche::default();
    }

    /// Erreur d’action : résultats précédents effacés (non fiables), session intacte.
    pub fn set_erreur(&mut self, msg: impl Into<String>) {
        self.clear_resultats();
        self.bandeau = Some(Bandeau::Erreur(msg.into()));
    }

    pub fn set_bandeau(&mut self, bandeau: Bandeau) {
        self.bandeau = Some(bandeau);
    }

    /// Garde-fou : limite digits (évite abus / gel plus tard).
    pub fn set_digits(&mut self, digits: usize) {
        self.saisie.digits = digits.min(DIGITS_MAX);
    }
}
