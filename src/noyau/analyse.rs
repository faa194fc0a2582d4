//! Noyau — analyse d’une fonction saisie (pipeline réel)
//!
//! tokenize -> RPN -> Expr (variable désignée seulement) -> simplify
//!
//! Une `Fonction` validée est la seule entrée acceptée par les moteurs
//! (quadrature, Riemann, intersections, figure).

use log::debug;

use super::erreurs::ErreurNoyau;
use super::expr::Expr;
use super::format::format_expr_pretty;
use super::jetons::{format_tokens, tokenize};
use super::rpn::{from_rpn, to_rpn, FONCTIONS};

/// Fonction réelle d’une variable, validée.
#[derive(Clone, Debug, PartialEq)]
pub struct Fonction {
    pub source: String,
    pub variable: String,
    pub expr: Expr,
}

impl Fonction {
    /// f(x), erreur explicite si indéfinie en x.
    pub fn evaluer(&self, x: f64) -> Result<f64, ErreurNoyau> {
        self.expr.evaluer(&self.variable, x)
    }

    pub fn depuis_expr(expr: Expr, variable: &str) -> Fonction {
        Fonction {
            source: format_expr_pretty(&expr),
            variable: variable.to_string(),
            expr,
        }
    }
}

/// Intervalle d’intégration [a, b] ; bornes finies, a ≥ b accepté (aire signée).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intervalle {
    pub a: f64,
    pub b: f64,
}

impl Intervalle {
    pub fn nouveau(a: f64, b: f64) -> Result<Intervalle, ErreurNoyau> {
        if !a.is_finite() || !b.is_finite() {
            return Err(ErreurNoyau::IntervalleInvalide { a, b });
        }
        Ok(Intervalle { a, b })
    }

    pub fn est_degenere(&self) -> bool {
        self.a == self.b
    }

    pub fn largeur(&self) -> f64 {
        self.b - self.a
    }

    /// (min, max) : bornes dans l’ordre croissant.
    pub fn ordonne(&self) -> (f64, f64) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct DemarcheAnalyse {
    pub jetons: String,
    pub rpn: String,
    pub avant: String,
    pub apres: String,
}

/// Nom de variable acceptable : identifiant ASCII, ni fonction ni constante.
pub fn valider_variable(variable: &str) -> Result<(), ErreurNoyau> {
    let mut chars = variable.chars();
    let premier_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    if !premier_ok || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(ErreurNoyau::analyse(format!("nom de variable invalide: '{variable}'")));
    }
    if variable == "e" || variable == "pi" || FONCTIONS.contains(&variable) {
        return Err(ErreurNoyau::analyse(format!("nom de variable réservé: '{variable}'")));
    }
    Ok(())
}

/// API publique : valide une saisie et retourne la fonction simplifiée.
pub fn analyser(source: &str, variable: &str) -> Result<Fonction, ErreurNoyau> {
    analyser_avec_demarche(source, variable).map(|(f, _)| f)
}

/// Comme `analyser`, avec la démarche (jetons, RPN, avant/après simplification).
pub fn analyser_avec_demarche(
    source: &str,
    variable: &str,
) -> Result<(Fonction, DemarcheAnalyse), ErreurNoyau> {
    valider_variable(variable)?;

    let s = source.trim();
    if s.is_empty() {
        return Err(ErreurNoyau::analyse("entrée vide"));
    }

    // 1) Jetons
    let jetons = tokenize(s)?;

    // 2) RPN
    let rpn = to_rpn(&jetons)?;

    // 3) AST (Expr)
    let expr0 = from_rpn(&rpn, variable)?;

    // 4) Simplification de base
    let expr = expr0.clone().simplify();

    let d = DemarcheAnalyse {
        jetons: format_tokens(&jetons),
        rpn: format_tokens(&rpn),
        avant: format_expr_pretty(&expr0),
        apres: format_expr_pretty(&expr),
    };
    debug!("analyse '{s}' -> {}", d.apres);

    Ok((
        Fonction {
            source: s.to_string(),
            variable: variable.to_string(),
            expr,
        },
        d,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyse_et_evaluation() {
        let f = analyser("x**2", "x").unwrap();
        assert_eq!(f.evaluer(3.0).unwrap(), 9.0);

        let f = analyser("-x**2", "x").unwrap();
        assert_eq!(f.evaluer(3.0).unwrap(), -9.0);

        let f = analyser("2**-1", "x").unwrap();
        assert_eq!(f.evaluer(0.0).unwrap(), 0.5);
    }

    #[test]
    fn decimal_lu_exactement() {
        let f = analyser("1.893", "x").unwrap();
        assert_eq!(f.expr, Expr::fraction(1893, 1000));
    }

    #[test]
    fn entree_vide_refusee() {
        assert!(matches!(analyser("   ", "x"), Err(ErreurNoyau::Analyse(_))));
    }

    #[test]
    fn variable_reservee_refusee() {
        assert!(analyser("1", "sin").is_err());
        assert!(analyser("1", "e").is_err());
        assert!(analyser("1", "2t").is_err());
        assert!(analyser("t**2", "t").is_ok());
    }

    #[test]
    fn demarche_renseignee() {
        let (_, d) = analyser_avec_demarche("x*1 + 0", "x").unwrap();
        assert_eq!(d.apres, "x");
        assert!(d.rpn.contains('*'));
    }

    #[test]
    fn intervalle_bornes_finies() {
        assert!(Intervalle::nouveau(0.0, 1.0).is_ok());
        assert!(matches!(
            Intervalle::nouveau(f64::NAN, 1.0),
            Err(ErreurNoyau::IntervalleInvalide { .. })
        ));
        assert!(Intervalle::nouveau(0.0, f64::INFINITY).is_err());
        assert_eq!(Intervalle::nouveau(2.0, -1.0).unwrap().ordonne(), (-1.0, 2.0));
    }
}
