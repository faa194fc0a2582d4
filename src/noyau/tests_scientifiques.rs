//! Tests scientifiques (campagne) : propriétés de bout en bout + limites contrôlées.
//!
//! But : vérifier les propriétés attendues du calcul (convergence, exactitude,
//! cohérence grille/somme, intersections) sans faire chauffer la machine.
//! - budget temps global sur les stress
//! - tailles bornées (degré, longueur)

use std::time::{Duration, Instant};

use approx::assert_abs_diff_eq;
use num_bigint::BigInt;
use num_rational::BigRational;

use super::actions::{calculer_aire, calculer_integrale};
use super::analyse::{analyser, Fonction, Intervalle};
use super::erreurs::ErreurNoyau;
use super::intersections::trouver_intersections;
use super::primitive::{integrale_symbolique, ValeurSymbolique};
use super::quadrature::integrale_numerique;
use super::reglages::{Reglages, ReglagesQuadrature, ReglagesSymbolique, FONCTION_DEFAUT};
use super::riemann::{somme_riemann, Methode, Partition};
use super::verification::{verifier, verifier_resultats};

fn f(src: &str) -> Fonction {
    analyser(src, "x").unwrap_or_else(|e| panic!("src={src:?} err={e}"))
}

fn iv(a: f64, b: f64) -> Intervalle {
    Intervalle::nouveau(a, b).unwrap()
}

fn riemann(src: &str, a: f64, b: f64, n: i64, m: Methode) -> f64 {
    let p = Partition::nouvelle(n, m).unwrap();
    somme_riemann(&f(src), iv(a, b), p).unwrap().approximation
}

/// Budget global anti-gel.
fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Riemann ------------------------ */

#[test]
fn sci_convergence_riemann() {
    for (src, a, b, vraie) in [
        ("x**2", 0.0, 1.0, 1.0 / 3.0),
        ("sin(x)", 0.0, std::f64::consts::PI, 2.0),
        ("exp(x)", 0.0, 1.0, std::f64::consts::E - 1.0),
    ] {
        for m in [Methode::Gauche, Methode::Droite] {
            let mut ecart_prec = f64::INFINITY;
            for n in [10, 100, 1000, 10_000] {
                let ecart = (riemann(src, a, b, n, m) - vraie).abs();
                assert!(ecart < ecart_prec, "src={src:?} {m} n={n} : {ecart} ≥ {ecart_prec}");
                ecart_prec = ecart;
            }
            assert!(ecart_prec < 1e-3, "src={src:?} {m}");
        }
    }

    // valeurs de référence n = 1000
    assert!((riemann("x**2", 0.0, 1.0, 1000, Methode::Gauche) - 0.3328).abs() < 1e-4);
    assert!((riemann("x**2", 0.0, 1.0, 1000, Methode::Droite) - 0.3338).abs() < 1e-4);
}

#[test]
fn sci_riemann_largeur_nulle() {
    for src in ["x**2", "1/x", "ln(x)", "sqrt(x)"] {
        for n in [1, 7, 100] {
            for m in [Methode::Gauche, Methode::Droite] {
                assert_eq!(riemann(src, 0.0, 0.0, n, m), 0.0, "src={src:?}");
                assert_eq!(riemann(src, -2.5, -2.5, n, m), 0.0, "src={src:?}");
            }
        }
    }
}

#[test]
fn sci_grille_coherente() {
    let carre = f("x**2");
    for (a, b) in [(0.0, 1.0), (-3.0, 2.0), (0.1, 0.7), (1e-3, 1e3)] {
        for n in [1i64, 2, 3, 10, 97, 1000] {
            let w = (b - a) / n as f64;

            let g = somme_riemann(&carre, iv(a, b), Partition::nouvelle(n, Methode::Gauche).unwrap())
                .unwrap()
                .grille;
            assert_eq!(g.points.len() as i64, n);
            assert_eq!(g.hauteurs.len() as i64, n);
            let dernier = *g.points.last().unwrap();
            assert!(dernier < b);
            if n > 1 {
                assert_eq!(dernier, b - w);
            }

            let d = somme_riemann(&carre, iv(a, b), Partition::nouvelle(n, Methode::Droite).unwrap())
                .unwrap()
                .grille;
            assert_eq!(d.points.len() as i64, n);
            assert_eq!(*d.points.last().unwrap(), b);
        }
    }
}

/* ------------------------ Intégrale définie ------------------------ */

#[test]
fn sci_carre_exact_et_numerique() {
    let carre = f("x**2");
    let s = integrale_symbolique(&carre, iv(0.0, 1.0), &ReglagesSymbolique::default()).unwrap();
    assert_eq!(
        s,
        ValeurSymbolique::Constante(BigRational::new(BigInt::from(1), BigInt::from(3)))
    );

    let q = integrale_numerique(&carre, iv(0.0, 1.0), &ReglagesQuadrature::default()).unwrap();
    assert!((q.valeur - 0.33333).abs() < 1e-5);
    assert!(q.erreur < 1e-8);

    let r = calculer_integrale(&Reglages {
        fonction: "x**2".into(),
        ..Reglages::default()
    })
    .unwrap();
    assert!(r.verification.unwrap().est_concordant());
}

#[test]
fn sci_fonction_par_defaut_concordante() {
    // La saisie proposée au lancement doit passer la comparaison
    let r = calculer_integrale(&Reglages::default()).unwrap();
    assert!(!r.demarche.jetons.is_empty());
    assert!(matches!(r.symbolique, ValeurSymbolique::FormeFermee(_)));
    let v = r.verification.unwrap();
    assert!(v.est_concordant(), "écart {}", v.ecart());

    // et la somme de Riemann s’en approche
    let g = riemann(FONCTION_DEFAUT, 0.0, 1.0, 10_000, Methode::Gauche);
    assert!((g - r.numerique.valeur).abs() < 0.1);
}

#[test]
fn sci_exactitudes_usuelles() {
    let reglages = ReglagesSymbolique::default();
    let reel = |src: &str, a: f64, b: f64| {
        integrale_symbolique(&f(src), iv(a, b), &reglages)
            .and_then(|v| v.vers_f64())
            .unwrap_or_else(|e| panic!("src={src:?} err={e}"))
    };

    assert_abs_diff_eq!(reel("exp(x)", 0.0, 1.0), std::f64::consts::E - 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(reel("sin(x)", 0.0, std::f64::consts::PI), 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(reel("1/x", 1.0, 2.0), 2f64.ln(), epsilon = 1e-12);
    assert_abs_diff_eq!(reel("2**x", 0.0, 1.0), 1.0 / 2f64.ln(), epsilon = 1e-12);
    assert_abs_diff_eq!(reel("sqrt(x)", 0.0, 4.0), 16.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn sci_orientation_signee() {
    let reglages = ReglagesQuadrature::default();
    for src in ["x**2", "exp(x)", "cos(3*x)"] {
        let aller = integrale_numerique(&f(src), iv(0.0, 2.0), &reglages).unwrap().valeur;
        let retour = integrale_numerique(&f(src), iv(2.0, 0.0), &reglages).unwrap().valeur;
        assert_eq!(aller, -retour, "src={src:?}");
    }
    let s = integrale_symbolique(&f("x**2"), iv(1.0, 0.0), &ReglagesSymbolique::default()).unwrap();
    assert_eq!(
        s,
        ValeurSymbolique::Constante(BigRational::new(BigInt::from(-1), BigInt::from(3)))
    );
}

/* ------------------------ Vérification ------------------------ */

#[test]
fn sci_verifier() {
    assert!(verifier(1.0, 1.000_000_1, 1e-5));
    assert!(!verifier(1.0, 1.1, 1e-5));

    // coercion impossible : erreur distincte du désaccord
    let s = integrale_symbolique(&f("sqrt(x)"), iv(-1.0, 0.0), &ReglagesSymbolique::default()).unwrap();
    let e = verifier_resultats(&s, 0.0, &Default::default()).unwrap_err();
    assert!(matches!(e, ErreurNoyau::Coercion(_)));
}

/* ------------------------ Analyse ------------------------ */

#[test]
fn sci_analyse() {
    for mauvais in ["((", "x +* 2", "2x", "sin x", "y + 1", "()", ")"] {
        assert!(
            matches!(analyser(mauvais, "x"), Err(ErreurNoyau::Analyse(_))),
            "src={mauvais:?}"
        );
    }
    assert_eq!(f("x**2").evaluer(3.0).unwrap(), 9.0);
    assert_eq!(f("-x**2").evaluer(3.0).unwrap(), -9.0);
    assert_eq!(f("2**-1").evaluer(0.0).unwrap(), 0.5);
}

/* ------------------------ Intersections / aire ------------------------ */

#[test]
fn sci_intersections() {
    let xs = |a: &str, b: &str| -> Vec<f64> {
        trouver_intersections(&f(a), &f(b))
            .unwrap()
            .iter()
            .map(|r| r.valeur)
            .collect()
    };
    assert_eq!(xs("x", "x**2"), vec![0.0, 1.0]);
    assert_eq!(xs("x**2", "-1"), Vec::<f64>::new());
    assert_eq!(xs("x**3", "x"), vec![-1.0, 0.0, 1.0]);

    let r = xs("x**2", "2");
    assert_abs_diff_eq!(r[0], -2f64.sqrt(), epsilon = 1e-15);
    assert_abs_diff_eq!(r[1], 2f64.sqrt(), epsilon = 1e-15);

    assert!(matches!(
        trouver_intersections(&f("sin(x)"), &f("0")),
        Err(ErreurNoyau::Intersection(_))
    ));
    assert!(matches!(
        trouver_intersections(&f("x"), &f("x")),
        Err(ErreurNoyau::Intersection(_))
    ));
}

#[test]
fn sci_aire_entre_courbes() {
    let r = calculer_aire(&Reglages {
        fonction: "x".into(),
        fonction_2: "x**2".into(),
        ..Reglages::default()
    })
    .unwrap();
    assert_abs_diff_eq!(r.aire.valeur, 1.0 / 6.0, epsilon = 1e-12);

    // coupure intérieure : |x - x³| sur [-1, 1] = 1/2
    let r = calculer_aire(&Reglages {
        fonction: "x".into(),
        fonction_2: "x**3".into(),
        borne_a: -1.0,
        ..Reglages::default()
    })
    .unwrap();
    assert_abs_diff_eq!(r.aire.valeur, 0.5, epsilon = 1e-12);
}

/* ------------------------ Stress contrôlé (sans brûler) ------------------------ */

#[test]
fn sci_stress_polynome_degre_eleve() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);

    // ∫_0^1 (x+1)^20 = (2^21 - 1)/21, exact
    let s = integrale_symbolique(&f("(x+1)**20"), iv(0.0, 1.0), &ReglagesSymbolique::default()).unwrap();
    budget(t0, max);
    assert_eq!(
        s,
        ValeurSymbolique::Constante(BigRational::new(BigInt::from(2_097_151), BigInt::from(21)))
    );
}

#[test]
fn sci_stress_somme_longue() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);

    let mut src = String::new();
    for k in 0..80 {
        if k > 0 {
            src.push_str(" + ");
        }
        src.push_str("x/2");
        budget(t0, max);
    }

    // 80·(x/2) = 40x
    let q = integrale_numerique(&f(&src), iv(0.0, 1.0), &ReglagesQuadrature::default()).unwrap();
    budget(t0, max);
    assert_abs_diff_eq!(q.valeur, 20.0, epsilon = 1e-10);
}
