//! Tests fuzz safe : robustesse + déterminisme + limites contrôlées.
//!
//! But : marteler l’analyse et les moteurs numériques sans brûler la machine.
//! - RNG déterministe (seed fixe)
//! - profondeur bornée
//! - budget temps global
//! - seules les erreurs de la bonne famille sont acceptées (analyse / évaluation)

use std::time::{Duration, Instant};

use super::analyse::{analyser, Intervalle};
use super::erreurs::ErreurNoyau;
use super::quadrature::integrale_numerique;
use super::reglages::ReglagesQuadrature;
use super::riemann::{somme_riemann, Methode, Partition};

/* ------------------------ RNG déterministe minimal ------------------------ */

#[derive(Clone)]
struct Rng {
    state: u64,
}
impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }
    fn next_u32(&mut self) -> u32 {
        // LCG simple (déterministe)
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }
    fn pick(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.next_u32() % n
        }
    }
    fn coin(&mut self) -> bool {
        (self.next_u32() & 1) == 1
    }
}

/* ------------------------ Budget anti-gel ------------------------ */

fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Génération d’expressions (bornée) ------------------------ */

fn gen_nombre(rng: &mut Rng) -> String {
    let a = rng.pick(8);
    match rng.pick(3) {
        0 => format!("{a}"),
        1 => format!("{a}/{}", rng.pick(7) + 1),
        _ => format!("{a}.{}", rng.pick(1000)),
    }
}

fn gen_atome(rng: &mut Rng) -> String {
    match rng.pick(6) {
        0 | 1 => "x".to_string(),
        2 => "pi".to_string(),
        3 => "e".to_string(),
        _ => gen_nombre(rng),
    }
}

fn gen_expr(rng: &mut Rng, depth: usize) -> String {
    if depth == 0 {
        return gen_atome(rng);
    }

    let d = depth - 1;
    match rng.pick(12) {
        0 => gen_atome(rng),
        1 => format!("({}+{})", gen_expr(rng, d), gen_expr(rng, d)),
        2 => format!("({}-{})", gen_expr(rng, d), gen_expr(rng, d)),
        3 => format!("({}*{})", gen_expr(rng, d), gen_expr(rng, d)),
        4 => format!("({}/{})", gen_expr(rng, d), gen_expr(rng, d)),
        5 => {
            // exposants courts : la taille reste bornée
            let k = match rng.pick(4) {
                0 => "2",
                1 => "3",
                2 => "(1/2)",
                _ => "-1",
            };
            format!("({})**{k}", gen_expr(rng, d))
        }
        6 => format!("-{}", gen_expr(rng, d)),
        7 => format!("sin({})", gen_expr(rng, d)),
        8 => format!("cos({})", gen_expr(rng, d)),
        9 => format!("exp({})", gen_expr(rng, d)),
        10 => format!("sqrt({})", gen_expr(rng, d)),
        _ => {
            if rng.coin() {
                format!("ln({})", gen_expr(rng, d))
            } else {
                format!("abs({})", gen_expr(rng, d))
            }
        }
    }
}

/// Chaîne arbitraire sur un alphabet proche de la grammaire.
fn gen_bruit(rng: &mut Rng, len: usize) -> String {
    const ALPHABET: &[char] = &[
        'x', 'y', '1', '2', '.', '+', '-', '*', '/', '^', '(', ')', ' ', 's', 'i', 'n', 'e', 'p',
    ];
    (0..len)
        .map(|_| ALPHABET[rng.pick(ALPHABET.len() as u32) as usize])
        .collect()
}

/* ------------------------ Helper somme balancée anti pile ------------------------ */

fn somme_balancee(terme: &str, n: usize) -> String {
    let mut items: Vec<String> = (0..n).map(|_| terme.to_string()).collect();
    while items.len() > 1 {
        let mut next = Vec::new();
        let mut i = 0;
        while i < items.len() {
            if i + 1 < items.len() {
                next.push(format!("({}+{})", items[i], items[i + 1]));
                i += 2;
            } else {
                next.push(items[i].clone());
                i += 1;
            }
        }
        items = next;
    }
    items.pop().unwrap_or_else(|| "0".to_string())
}

/* ------------------------ Tests ------------------------ */

#[test]
fn fuzz_safe_expressions_valides_analysees() {
    let t0 = Instant::now();
    let max = Duration::from_millis(1500);

    let mut rng = Rng::new(0xC0FFEE_u64);

    for _ in 0..150 {
        budget(t0, max);

        let src = gen_expr(&mut rng, 4);
        let f = analyser(&src, "x").unwrap_or_else(|e| panic!("src={src:?} err={e}"));

        // évaluation : une valeur finie ou une erreur d’évaluation, rien d’autre
        for x in [-1.5, 0.0, 0.5, 2.0] {
            match f.evaluer(x) {
                Ok(v) => assert!(v.is_finite(), "src={src:?} x={x} v={v}"),
                Err(e) => assert!(
                    matches!(e, ErreurNoyau::EvaluationNumerique(_)),
                    "src={src:?} err={e}"
                ),
            }
        }
    }
}

#[test]
fn fuzz_safe_bruit_refuse_proprement() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);

    let mut rng = Rng::new(0xBADC0DE_u64);
    let mut seen_ok = 0usize;
    let mut seen_err = 0usize;

    for _ in 0..400 {
        budget(t0, max);

        let len = 1 + rng.pick(12) as usize;
        let src = gen_bruit(&mut rng, len);
        match analyser(&src, "x") {
            Ok(_) => seen_ok += 1,
            Err(e) => {
                assert!(matches!(e, ErreurNoyau::Analyse(_)), "src={src:?} err={e}");
                seen_err += 1;
            }
        }
    }

    // On veut voir un mix des deux, sinon le fuzz ne “balaye” rien.
    assert!(seen_err > 100, "trop peu de refus: {seen_err}");
    assert!(seen_ok > 0, "aucun succès vu: fuzz trop “sauvage”");
}

#[test]
fn fuzz_safe_riemann_grille_et_determinisme() {
    let t0 = Instant::now();
    let max = Duration::from_millis(1500);

    let mut rng = Rng::new(0x5EED_u64);
    let mut rng_bis = rng.clone();

    for _ in 0..60 {
        budget(t0, max);

        let src = gen_expr(&mut rng, 3);
        assert_eq!(src, gen_expr(&mut rng_bis, 3));

        let f = analyser(&src, "x").unwrap_or_else(|e| panic!("src={src:?} err={e}"));
        let n = 1 + rng.pick(200) as i64;
        let _ = rng_bis.pick(200);
        let methode = if rng.coin() { Methode::Gauche } else { Methode::Droite };
        let _ = rng_bis.coin();
        let iv = Intervalle::nouveau(0.25, 2.0).unwrap();

        let p = Partition::nouvelle(n, methode).unwrap();
        match somme_riemann(&f, iv, p) {
            Ok(s) => {
                assert_eq!(s.grille.points.len() as i64, n, "src={src:?}");
                // même entrée => même sortie, au bit près
                let s2 = somme_riemann(&f, iv, p).unwrap();
                assert_eq!(s.approximation.to_bits(), s2.approximation.to_bits());
            }
            Err(e) => assert!(
                matches!(e, ErreurNoyau::EvaluationNumerique(_)),
                "src={src:?} err={e}"
            ),
        }
    }
}

#[test]
fn fuzz_safe_quadrature_bornee() {
    let t0 = Instant::now();
    let max = Duration::from_millis(2000);

    let mut rng = Rng::new(0xFACADE_u64);
    let reglages = ReglagesQuadrature::default();
    let iv = Intervalle::nouveau(0.5, 1.5).unwrap();

    for _ in 0..40 {
        budget(t0, max);

        let src = gen_expr(&mut rng, 3);
        let f = analyser(&src, "x").unwrap_or_else(|e| panic!("src={src:?} err={e}"));
        match integrale_numerique(&f, iv, &reglages) {
            Ok(r) => {
                assert!(r.sous_intervalles <= reglages.max_subdivisions, "src={src:?}");
                assert!(r.valeur.is_finite() || !r.converge, "src={src:?}");
            }
            Err(e) => assert!(
                matches!(e, ErreurNoyau::EvaluationNumerique(_)),
                "src={src:?} err={e}"
            ),
        }
    }
}

#[test]
fn fuzz_safe_somme_balancee_anti_pile() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);

    let src = somme_balancee("x", 800);
    budget(t0, max);

    let f = analyser(&src, "x").unwrap_or_else(|e| panic!("err: {e}"));
    budget(t0, max);

    // 800·(1/2) = 400
    assert_eq!(f.evaluer(0.5).unwrap(), 400.0);
}
