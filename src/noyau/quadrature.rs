//! Quadrature numérique adaptative (Gauss–Kronrod 7/15)
//!
//! Tolérances et limite de subdivisions par défaut alignées sur scipy `quad`
//! (qui, lui, emploie une règle à 21 points).
//!
//! On subdivise toujours le sous-intervalle de plus grande erreur estimée
//! (tas binaire), jusqu’à `max(tol_abs, tol_rel·|I|)` ou `max_subdivisions`
//! sous-intervalles. La fonction est faillible : un point indéfini arrête tout
//! (jamais de NaN propagé dans la somme).
//!
//! Orientation : ∫_a^b = -∫_b^a ; a == b donne exactement 0.

use log::{debug, warn};

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::analyse::{Fonction, Intervalle};
use super::erreurs::ErreurNoyau;
use super::reglages::ReglagesQuadrature;

/* ------------------------ Règle G7K15 ------------------------ */

// Noeuds de Kronrod (partie positive, symétriques autour de 0)
const NOEUDS_K15: [f64; 8] = [
    0.0,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.586_087_235_467_691_130_294_144_838_258_730,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.991_455_371_120_812_639_206_854_697_526_329,
];

const POIDS_K15: [f64; 8] = [
    0.209_482_141_084_727_828_012_999_174_891_714,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.022_935_322_010_529_224_963_732_008_058_970,
];

// Gauss 7 points : noeuds de Kronrod d’indice pair (0, 2, 4, 6)
const POIDS_G7: [f64; 4] = [
    0.417_959_183_673_469_387_755_102_040_816_327,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.129_484_966_168_869_693_270_611_432_679_082,
];

/// Résultat d’une intégration numérique.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultatQuadrature {
    pub valeur: f64,
    /// Erreur absolue estimée (somme des |K15 - G7| par sous-intervalle).
    pub erreur: f64,
    pub evaluations: usize,
    pub sous_intervalles: usize,
    pub converge: bool,
}

impl ResultatQuadrature {
    fn nul() -> ResultatQuadrature {
        ResultatQuadrature {
            valeur: 0.0,
            erreur: 0.0,
            evaluations: 0,
            sous_intervalles: 0,
            converge: true,
        }
    }
}

struct Morceau {
    a: f64,
    b: f64,
    valeur: f64,
    erreur: f64,
}

impl PartialEq for Morceau {
    fn eq(&self, other: &Self) -> bool {
        self.erreur == other.erreur
    }
}

impl Eq for Morceau {}

impl PartialOrd for Morceau {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Morceau {
    fn cmp(&self, other: &Self) -> Ordering {
        // tas max : plus grande erreur d’abord
        self.erreur.total_cmp(&other.erreur)
    }
}

/// Une application de G7K15 sur [a, b] : (valeur Kronrod, |K - G|).
fn gk15<F>(f: &F, a: f64, b: f64) -> Result<(f64, f64), ErreurNoyau>
where
    F: Fn(f64) -> Result<f64, ErreurNoyau>,
{
    let milieu = 0.5 * (a + b);
    let demi = 0.5 * (b - a);

    let f0 = f(milieu)?;
    let mut somme_k = POIDS_K15[0] * f0;
    let mut somme_g = POIDS_G7[0] * f0;

    for i in 1..NOEUDS_K15.len() {
        let dx = demi * NOEUDS_K15[i];
        let paire = f(milieu - dx)? + f(milieu + dx)?;
        somme_k += POIDS_K15[i] * paire;
        if i % 2 == 0 {
            somme_g += POIDS_G7[i / 2] * paire;
        }
    }

    let k = demi * somme_k;
    let g = demi * somme_g;
    Ok((k, (k - g).abs()))
}

const EVALS_PAR_REGLE: usize = 15;

/// Intégration adaptative d’une fonction faillible sur [a, b] (orientation respectée).
pub fn integrer_adaptatif<F>(
    f: &F,
    a: f64,
    b: f64,
    reglages: &ReglagesQuadrature,
) -> Result<ResultatQuadrature, ErreurNoyau>
where
    F: Fn(f64) -> Result<f64, ErreurNoyau>,
{
    if a == b {
        return Ok(ResultatQuadrature::nul());
    }
    if a > b {
        let mut r = integrer_adaptatif(f, b, a, reglages)?;
        r.valeur = -r.valeur;
        return Ok(r);
    }

    let tolerance = |v: f64| reglages.tol_abs.max(reglages.tol_rel * v.abs());

    let (v0, e0) = gk15(f, a, b)?;
    let mut tas: BinaryHeap<Morceau> = BinaryHeap::new();
    tas.push(Morceau { a, b, valeur: v0, erreur: e0 });

    let mut total = v0;
    let mut erreur = e0;
    let mut evaluations = EVALS_PAR_REGLE;

    while erreur > tolerance(total) && tas.len() < reglages.max_subdivisions {
        let Some(pire) = tas.pop() else {
            break;
        };

        let milieu = 0.5 * (pire.a + pire.b);
        // intervalle épuisé en précision machine
        if milieu <= pire.a || milieu >= pire.b {
            tas.push(pire);
            break;
        }

        let (vg, eg) = gk15(f, pire.a, milieu)?;
        let (vd, ed) = gk15(f, milieu, pire.b)?;
        evaluations += 2 * EVALS_PAR_REGLE;

        total += vg + vd - pire.valeur;
        erreur += eg + ed - pire.erreur;

        tas.push(Morceau { a: pire.a, b: milieu, valeur: vg, erreur: eg });
        tas.push(Morceau { a: milieu, b: pire.b, valeur: vd, erreur: ed });
    }

    // resommation : évite la dérive des mises à jour incrémentales
    let valeur: f64 = tas.iter().map(|m| m.valeur).sum();
    let erreur: f64 = tas.iter().map(|m| m.erreur).sum();
    let converge = erreur <= tolerance(valeur);

    if !converge {
        warn!(
            "quadrature non convergée sur [{a}, {b}] : erreur estimée {erreur:e} après {} sous-intervalles",
            tas.len()
        );
    }

    Ok(ResultatQuadrature {
        valeur,
        erreur,
        evaluations,
        sous_intervalles: tas.len(),
        converge,
    })
}

/// ∫_a^b f, numérique.
pub fn integrale_numerique(
    f: &Fonction,
    intervalle: Intervalle,
    reglages: &ReglagesQuadrature,
) -> Result<ResultatQuadrature, ErreurNoyau> {
    let r = integrer_adaptatif(&|x| f.evaluer(x), intervalle.a, intervalle.b, reglages)?;
    debug!(
        "∫ {} sur [{}, {}] ≈ {} (± {:e}, {} évaluations)",
        f.source, intervalle.a, intervalle.b, r.valeur, r.erreur, r.evaluations
    );
    Ok(r)
}

/// Aire entre deux courbes : ∫ |f1 - f2|, l’intervalle étant découpé aux `coupures`
/// (typiquement les intersections) pour que chaque morceau soit lisse.
pub fn aire_entre(
    f1: &Fonction,
    f2: &Fonction,
    intervalle: Intervalle,
    coupures: &[f64],
    reglages: &ReglagesQuadrature,
) -> Result<ResultatQuadrature, ErreurNoyau> {
    if intervalle.est_degenere() {
        return Ok(ResultatQuadrature::nul());
    }

    let (lo, hi) = intervalle.ordonne();
    let mut bornes: Vec<f64> = coupures
        .iter()
        .copied()
        .filter(|c| c.is_finite() && *c > lo && *c < hi)
        .collect();
    bornes.sort_by(f64::total_cmp);
    bornes.dedup();
    bornes.insert(0, lo);
    bornes.push(hi);

    let ecart = |x: f64| -> Result<f64, ErreurNoyau> { Ok((f1.evaluer(x)? - f2.evaluer(x)?).abs()) };

    let mut total = ResultatQuadrature::nul();
    for w in bornes.windows(2) {
        let r = integrer_adaptatif(&ecart, w[0], w[1], reglages)?;
        total.valeur += r.valeur;
        total.erreur += r.erreur;
        total.evaluations += r.evaluations;
        total.sous_intervalles += r.sous_intervalles;
        total.converge &= r.converge;
    }

    if intervalle.a > intervalle.b {
        total.valeur = -total.valeur;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::analyse::analyser;
    use approx::assert_abs_diff_eq;

    fn reglages() -> ReglagesQuadrature {
        ReglagesQuadrature::default()
    }

    fn intervalle(a: f64, b: f64) -> Intervalle {
        Intervalle::nouveau(a, b).unwrap()
    }

    #[test]
    fn carre_sur_unite() {
        let f = analyser("x**2", "x").unwrap();
        let r = integrale_numerique(&f, intervalle(0.0, 1.0), &reglages()).unwrap();
        assert_abs_diff_eq!(r.valeur, 1.0 / 3.0, epsilon = 1e-12);
        assert!(r.erreur < 1e-8);
        assert!(r.converge);
        assert_eq!(r.sous_intervalles, 1);
    }

    #[test]
    fn orientation_et_degenere() {
        let f = analyser("x**2", "x").unwrap();
        let r = integrale_numerique(&f, intervalle(1.0, 0.0), &reglages()).unwrap();
        assert_abs_diff_eq!(r.valeur, -1.0 / 3.0, epsilon = 1e-12);

        let r = integrale_numerique(&f, intervalle(2.0, 2.0), &reglages()).unwrap();
        assert_eq!(r.valeur, 0.0);
        assert_eq!(r.evaluations, 0);
    }

    #[test]
    fn subdivision_adaptative() {
        // pic étroit : une seule règle ne suffit pas
        let f = analyser("1/(1 + 10000*(x - 0.3)**2)", "x").unwrap();
        let r = integrale_numerique(&f, intervalle(0.0, 1.0), &reglages()).unwrap();
        let exact = ((100.0f64 * 0.7).atan() + (100.0f64 * 0.3).atan()) / 100.0;
        assert_abs_diff_eq!(r.valeur, exact, epsilon = 1e-8);
        assert!(r.sous_intervalles > 1);
        assert!(r.converge);
    }

    #[test]
    fn point_indefini() {
        let f = analyser("sqrt(x)", "x").unwrap();
        let e = integrale_numerique(&f, intervalle(-1.0, 1.0), &reglages()).unwrap_err();
        assert!(matches!(e, ErreurNoyau::EvaluationNumerique(_)));
    }

    #[test]
    fn racine_sur_zero_un() {
        // les extrémités ne sont jamais évaluées
        let f = analyser("sqrt(x)", "x").unwrap();
        let r = integrale_numerique(&f, intervalle(0.0, 1.0), &reglages()).unwrap();
        assert_abs_diff_eq!(r.valeur, 2.0 / 3.0, epsilon = 1e-7);
    }

    #[test]
    fn non_convergence_signalee() {
        let f = analyser("sin(1/x)", "x").unwrap();
        let mut q = reglages();
        q.max_subdivisions = 3;
        let r = integrale_numerique(&f, intervalle(0.001, 1.0), &q).unwrap();
        assert!(!r.converge);
        assert!(r.sous_intervalles <= 3);
    }

    #[test]
    fn aire_entre_identite_et_carre() {
        let f1 = analyser("x", "x").unwrap();
        let f2 = analyser("x**2", "x").unwrap();
        let r = aire_entre(&f1, &f2, intervalle(0.0, 1.0), &[0.0, 1.0], &reglages()).unwrap();
        assert_abs_diff_eq!(r.valeur, 1.0 / 6.0, epsilon = 1e-10);

        // découpe en 0 : |x - x^2| sur [-1, 1] = 1/6 + 5/6
        let r = aire_entre(&f1, &f2, intervalle(-1.0, 1.0), &[0.0, 1.0], &reglages()).unwrap();
        assert_abs_diff_eq!(r.valeur, 1.0, epsilon = 1e-10);
    }
}
