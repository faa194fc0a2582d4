//! Noyau : intégrales définies, sommes de Riemann, aire entre courbes
//!
//! Organisation interne :
//! - jetons.rs, rpn.rs : tokenisation + shunting-yard
//! - expr.rs           : AST exact + simplify + évaluation (réelle / complexe) + dérivée
//! - analyse.rs        : pipeline de saisie -> Fonction validée
//! - polynome.rs       : polynômes / fractions rationnelles exacts
//! - primitive.rs      : intégrale symbolique (règles + garde-fous)
//! - quadrature.rs     : Gauss–Kronrod adaptatif
//! - riemann.rs        : sommes gauche / droite + grille
//! - verification.rs   : comparaison symbolique / numérique
//! - intersections.rs  : racines de f1 - f2
//! - figure.rs         : données de tracé
//! - format.rs         : affichage EXACT “joli” + LaTeX
//! - lecture.rs        : ΣLocal (décimal tronqué)
//! - reglages.rs       : valeurs par défaut (JSON)
//! - actions.rs        : les quatre actions de l’interface

pub mod actions;
pub mod analyse;
pub mod erreurs;
pub mod expr;
pub mod figure;
pub mod format;
pub mod intersections;
pub mod jetons;
pub mod lecture;
pub mod polynome;
pub mod primitive;
pub mod quadrature;
pub mod reglages;
pub mod riemann;
pub mod rpn;
pub mod verification;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_fuzz_safe;

// API publique minimale
pub use actions::{calculer_aire, calculer_integrale, calculer_riemann, tracer};
pub use erreurs::{ErreurNoyau, ErreurReglages};
pub use reglages::Reglages;
