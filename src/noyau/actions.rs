// src/noyau/actions.rs
//
// Les quatre actions de l’interface, chacune fonction pure de la saisie courante.
// Aucune mémoire entre deux appels : chaque clic recalcule tout depuis les champs.

use log::info;

use super::analyse::{analyser, analyser_avec_demarche, DemarcheAnalyse, Fonction, Intervalle};
use super::erreurs::ErreurNoyau;
use super::expr::Expr;
use super::figure::{figure_aire, figure_courbe, figure_riemann, Figure};
use super::format::{format_integrale_latex, format_valeur};
use super::intersections::{trouver_intersections, Racine};
use super::lecture::lecture_rationnelle;
use super::primitive::{integrale_symbolique_detaillee, ValeurSymbolique};
use super::quadrature::{aire_entre, integrale_numerique, ResultatQuadrature};
use super::reglages::Reglages;
use super::riemann::{somme_riemann, Partition, SommeRiemann};
use super::verification::{verifier_resultats, Verdict};

/// Intégrale définie : symbolique + numérique + comparaison.
#[derive(Clone, Debug)]
pub struct RapportIntegrale {
    pub demarche: DemarcheAnalyse,
    pub symbolique: ValeurSymbolique,
    pub primitive: Option<Expr>,
    /// Forme lisible du résultat symbolique.
    pub texte: String,
    pub latex: String,
    /// Lecture décimale tronquée (résultat rationnel seulement).
    pub lecture: Option<String>,
    pub numerique: ResultatQuadrature,
    /// Err(Coercion) : comparaison impossible, distincte d’un désaccord.
    pub verification: Result<Verdict, ErreurNoyau>,
}

#[derive(Clone, Debug)]
pub struct RapportRiemann {
    pub somme: SommeRiemann,
    pub figure: Figure,
}

#[derive(Clone, Debug)]
pub struct RapportAire {
    /// Échec du solveur conservé tel quel (≠ aucune intersection).
    pub intersections: Result<Vec<Racine>, ErreurNoyau>,
    pub aire: ResultatQuadrature,
    pub figure: Figure,
}

fn intervalle(saisie: &Reglages) -> Result<Intervalle, ErreurNoyau> {
    Intervalle::nouveau(saisie.borne_a, saisie.borne_b)
}

fn fonction(saisie: &Reglages) -> Result<Fonction, ErreurNoyau> {
    analyser(&saisie.fonction, &saisie.variable)
}

pub fn calculer_integrale(saisie: &Reglages) -> Result<RapportIntegrale, ErreurNoyau> {
    let (f, demarche) = analyser_avec_demarche(&saisie.fonction, &saisie.variable)?;
    let iv = intervalle(saisie)?;
    info!("intégrale de {} sur [{}, {}]", f.source, iv.a, iv.b);

    let (symbolique, primitive) = integrale_symbolique_detaillee(&f, iv, &saisie.symbolique)?;
    let numerique = integrale_numerique(&f, iv, &saisie.quadrature)?;
    let verification = verifier_resultats(&symbolique, numerique.valeur, &saisie.verification);

    let lecture = match &symbolique {
        ValeurSymbolique::Constante(r) => Some(lecture_rationnelle(r, saisie.digits)),
        _ => None,
    };

    Ok(RapportIntegrale {
        texte: format_valeur(&symbolique),
        latex: format_integrale_latex(&f.expr, &f.variable, iv.a, iv.b, &symbolique),
        demarche,
        symbolique,
        primitive,
        lecture,
        numerique,
        verification,
    })
}

pub fn calculer_riemann(saisie: &Reglages) -> Result<RapportRiemann, ErreurNoyau> {
    let f = fonction(saisie)?;
    let iv = intervalle(saisie)?;
    let partition = Partition::nouvelle(saisie.subdivisions, saisie.methode)?;
    info!(
        "somme de Riemann ({}) de {} sur [{}, {}], n = {}",
        partition.methode(),
        f.source,
        iv.a,
        iv.b,
        partition.n()
    );

    let somme = somme_riemann(&f, iv, partition)?;
    let figure = figure_riemann(&f, iv, &somme, saisie.resolution);
    Ok(RapportRiemann { somme, figure })
}

/// Aire entre f et g : intersections (découpage) puis ∫ |f - g|.
pub fn calculer_aire(saisie: &Reglages) -> Result<RapportAire, ErreurNoyau> {
    let f1 = fonction(saisie)?;
    let f2 = analyser(&saisie.fonction_2, &saisie.variable)?;
    let iv = intervalle(saisie)?;
    info!("aire entre {} et {} sur [{}, {}]", f1.source, f2.source, iv.a, iv.b);

    let intersections = trouver_intersections(&f1, &f2);
    let coupures: Vec<f64> = match &intersections {
        Ok(r) => r.iter().map(|r| r.valeur).collect(),
        Err(_) => Vec::new(),
    };

    let aire = aire_entre(&f1, &f2, iv, &coupures, &saisie.quadrature)?;
    let figure = figure_aire(&f1, &f2, iv, saisie.resolution);
    Ok(RapportAire {
        intersections,
        aire,
        figure,
    })
}

pub fn tracer(saisie: &Reglages) -> Result<Figure, ErreurNoyau> {
    let f = fonction(saisie)?;
    let iv = intervalle(saisie)?;
    Ok(figure_courbe(&f, iv, saisie.resolution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::riemann::Methode;
    use approx::assert_abs_diff_eq;

    fn saisie(f: &str, a: f64, b: f64) -> Reglages {
        Reglages {
            fonction: f.to_string(),
            borne_a: a,
            borne_b: b,
            ..Reglages::default()
        }
    }

    #[test]
    fn integrale_du_carre() {
        let r = calculer_integrale(&saisie("x**2", 0.0, 1.0)).unwrap();
        assert_eq!(r.texte, "1/3");
        assert_eq!(r.lecture.as_deref(), Some("0.33333333333333333333"));
        assert!(r.latex.starts_with("\\int_{0}^{1}"));
        assert!(r.verification.unwrap().est_concordant());
        assert_eq!(r.demarche.apres, "x^2");
    }

    #[test]
    fn comparaison_impossible_distincte() {
        let r = calculer_integrale(&saisie("sqrt(x)", -1.0, 0.0));
        // racine de négatifs : la quadrature échoue avant toute comparaison
        assert!(matches!(r, Err(ErreurNoyau::EvaluationNumerique(_))));

        let r = calculer_integrale(&saisie("x*sin(x)", 0.0, 1.0)).unwrap();
        assert!(matches!(r.symbolique, ValeurSymbolique::NonEvaluee { .. }));
        assert!(matches!(r.verification, Err(ErreurNoyau::Coercion(_))));
        assert!(r.lecture.is_none());
    }

    #[test]
    fn singularite_en_borne_concordante() {
        let r = calculer_integrale(&saisie("ln(x)", 0.0, 1.0)).unwrap();
        assert_eq!(r.texte, "-1");
        assert!(r.verification.unwrap().est_concordant());

        let r = calculer_integrale(&saisie("1/sqrt(x)", 0.0, 1.0)).unwrap();
        assert!(r.verification.unwrap().est_concordant());

        assert!(matches!(
            calculer_integrale(&saisie("1/x", 0.0, 1.0)),
            Err(ErreurNoyau::Integration(_))
        ));
    }

    #[test]
    fn erreurs_propagees() {
        assert!(matches!(calculer_integrale(&saisie("2x", 0.0, 1.0)), Err(ErreurNoyau::Analyse(_))));
        assert!(matches!(
            calculer_integrale(&saisie("x", f64::NAN, 1.0)),
            Err(ErreurNoyau::IntervalleInvalide { .. })
        ));
        let mut s = saisie("x", 0.0, 1.0);
        s.subdivisions = 0;
        assert!(matches!(calculer_riemann(&s), Err(ErreurNoyau::PartitionInvalide(0))));
        // n démesuré (saisie sans validation) : refusé avant toute allocation
        s.subdivisions = 1 << 62;
        assert!(matches!(calculer_riemann(&s), Err(ErreurNoyau::PartitionInvalide(_))));
    }

    #[test]
    fn riemann_et_figure_coherentes() {
        let mut s = saisie("x**2", 0.0, 1.0);
        s.subdivisions = 1000;
        s.methode = Methode::Droite;
        let r = calculer_riemann(&s).unwrap();
        assert_abs_diff_eq!(r.somme.approximation, 0.333_833_5, epsilon = 1e-6);
        assert_eq!(r.figure.rectangles.len(), 1000);
        assert_eq!(r.figure.courbes[0].echantillons, s.resolution);
    }

    #[test]
    fn aire_entre_droite_et_parabole() {
        let mut s = saisie("x", 0.0, 1.0);
        s.fonction_2 = "x**2".into();
        let r = calculer_aire(&s).unwrap();
        assert_abs_diff_eq!(r.aire.valeur, 1.0 / 6.0, epsilon = 1e-10);
        let xs: Vec<f64> = r.intersections.unwrap().iter().map(|r| r.valeur).collect();
        assert_eq!(xs, vec![0.0, 1.0]);
        assert!(!r.figure.zones.is_empty());
    }

    #[test]
    fn aire_sans_forme_close() {
        // sin(x) = x/2 : pas de forme close, l’aire reste calculable
        let mut s = saisie("sin(x)", 0.0, 1.0);
        s.fonction_2 = "x/2".into();
        let r = calculer_aire(&s).unwrap();
        assert!(matches!(r.intersections, Err(ErreurNoyau::Intersection(_))));
        assert_abs_diff_eq!(r.aire.valeur, 1.0 - 1f64.cos() - 0.25, epsilon = 1e-10);
    }

    #[test]
    fn trace_simple() {
        let fig = tracer(&saisie("exp(x)", 0.0, 1.0)).unwrap();
        assert_eq!(fig.courbes.len(), 1);
        assert_eq!(fig.courbes[0].points().count(), 1000);
    }
}
