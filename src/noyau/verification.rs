// src/noyau/verification.rs
//
// Comparaison symbolique / numérique.
// Un écart hors tolérance est un VERDICT (avertissement), pas une erreur ;
// seule l’impossibilité de convertir le résultat symbolique en réel est une erreur.

use log::info;

use super::erreurs::ErreurNoyau;
use super::primitive::ValeurSymbolique;
use super::reglages::ReglagesVerification;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    Concordant { ecart: f64 },
    Discordant { ecart: f64 },
}

impl Verdict {
    pub fn est_concordant(&self) -> bool {
        matches!(self, Verdict::Concordant { .. })
    }

    pub fn ecart(&self) -> f64 {
        match self {
            Verdict::Concordant { ecart } | Verdict::Discordant { ecart } => *ecart,
        }
    }
}

/// |s - n| < tolérance (stricte).
pub fn verifier(symbolique: f64, numerique: f64, tolerance: f64) -> bool {
    (symbolique - numerique).abs() < tolerance
}

/// Tolérance effective : max(absolue, relative · max(|s|, |n|)).
fn tolerance_effective(s: f64, n: f64, reglages: &ReglagesVerification) -> f64 {
    reglages
        .tolerance
        .max(reglages.tolerance_relative * s.abs().max(n.abs()))
}

pub fn verifier_resultats(
    symbolique: &ValeurSymbolique,
    numerique: f64,
    reglages: &ReglagesVerification,
) -> Result<Verdict, ErreurNoyau> {
    let s = symbolique.vers_f64()?;
    let ecart = (s - numerique).abs();
    let tol = tolerance_effective(s, numerique, reglages);

    let verdict = if verifier(s, numerique, tol) {
        Verdict::Concordant { ecart }
    } else {
        Verdict::Discordant { ecart }
    };
    info!("vérification : symbolique {s}, numérique {numerique}, écart {ecart:e} (tolérance {tol:e})");
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    #[test]
    fn tolerance_absolue() {
        assert!(verifier(1.0, 1.000_000_1, 1e-5));
        assert!(!verifier(1.0, 1.1, 1e-5));
        // borne stricte
        assert!(!verifier(0.0, 0.5, 0.5));
    }

    #[test]
    fn tiers_contre_quadrature() {
        let s = ValeurSymbolique::Constante(BigRational::new(BigInt::from(1), BigInt::from(3)));
        let v = verifier_resultats(&s, 0.333_333_333_333_333_3, &ReglagesVerification::default()).unwrap();
        assert!(v.est_concordant());
        assert!(v.ecart() < 1e-15);
    }

    #[test]
    fn ecart_est_un_verdict() {
        let s = ValeurSymbolique::Constante(BigRational::from_integer(BigInt::from(1)));
        let v = verifier_resultats(&s, 1.1, &ReglagesVerification::default()).unwrap();
        assert!(matches!(v, Verdict::Discordant { .. }));
    }

    #[test]
    fn part_relative() {
        let s = ValeurSymbolique::Constante(BigRational::from_integer(BigInt::from(1_000_000)));
        let r = ReglagesVerification {
            tolerance: 1e-5,
            tolerance_relative: 1e-9,
        };
        // écart 1e-4 : refusé en absolu, accepté avec 1e-9 · 1e6 = 1e-3
        assert!(!verifier_resultats(&s, 1_000_000.0001, &ReglagesVerification::default())
            .unwrap()
            .est_concordant());
        assert!(verifier_resultats(&s, 1_000_000.0001, &r).unwrap().est_concordant());
    }

    #[test]
    fn coercion_impossible() {
        let s = ValeurSymbolique::NonEvaluee {
            integrande: crate::noyau::expr::Expr::var("x"),
            variable: "x".into(),
            a: 0.0,
            b: 1.0,
        };
        let e = verifier_resultats(&s, 0.5, &ReglagesVerification::default()).unwrap_err();
        assert!(matches!(e, ErreurNoyau::Coercion(_)));
    }
}
