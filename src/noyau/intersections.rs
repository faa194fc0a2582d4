//! Intersections de deux courbes : f1(x) = f2(x)
//!
//! f1 - f2 est converti en fraction rationnelle exacte N/D, puis :
//! - racines rationnelles de N (x = 0 d’abord, puis ±p/q) avec déflation ;
//! - reste de degré 1, 2 ou bicarré (degré 4) : formes closes exactes (√) ;
//! - reste de degré 3 : Cardano en complexes, puis Newton sur la partie réelle ;
//! - au-delà : pas de forme close, erreur `Intersection`.
//!
//! Sinon (profondeur bornée) :
//! - polynôme de degré ≤ 2 à coefficients constants quelconques (π·x = 1) ;
//! - x dans un seul sous-terme inversible √u, exp(u), c^u, ln(u) : on résout
//!   en y = ce sous-terme, puis u = y², ln y, log_c y, e^y ;
//! - √u (u affine) avec x ailleurs : x = (y² - β)/α, y ≥ 0.
//!
//! Ces racines-là sont revérifiées sur f1 et f2.
//!
//! Les racines non réelles et celles de D sont écartées. Aucune racine réelle
//! est un résultat valide (liste vide), distinct d’un échec du solveur.

use log::{debug, info};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

use super::analyse::Fonction;
use super::erreurs::ErreurNoyau;
use super::expr::{entier_i64, rat_vers_f64, rational_pow_int, rational_sqrt_exact, Expr};
use super::jetons::f64_exact;
use super::format::format_expr_pretty;
use super::polynome::{FractionRationnelle, Polynome};

/// Garde-fou : plus grand facteur carré cherché dans √n.
const MAX_FACTEUR_CARRE: u64 = 1_000_000;

/// Seuil de partie imaginaire résiduelle (Cardano) pour accepter une racine réelle.
const SEUIL_IMAGINAIRE: f64 = 1e-7;

const ITERATIONS_NEWTON: usize = 60;

/// Garde-fou : imbrications de sous-termes inversibles résolues.
const PROFONDEUR_MAX: usize = 3;

/// Garde-fou : degré des polynômes à coefficients symboliques développés.
const DEGRE_SYMBOLIQUE_MAX: usize = 8;

/// Abscisse d’intersection ; `exacte` quand une forme close est connue.
#[derive(Clone, Debug, PartialEq)]
pub struct Racine {
    pub valeur: f64,
    pub exacte: Option<Expr>,
}

impl Racine {
    fn rationnelle(r: &BigRational) -> Racine {
        Racine {
            valeur: rat_vers_f64(r),
            exacte: Some(Expr::Rat(r.clone())),
        }
    }

    /// Forme lisible : exacte si possible, sinon décimale.
    pub fn affichage(&self) -> String {
        match &self.exacte {
            Some(e) => format_expr_pretty(e),
            None => format!("{}", self.valeur),
        }
    }
}

pub fn trouver_intersections(f1: &Fonction, f2: &Fonction) -> Result<Vec<Racine>, ErreurNoyau> {
    if f1.variable != f2.variable {
        return Err(ErreurNoyau::Intersection(format!(
            "variables différentes ({} / {})",
            f1.variable, f2.variable
        )));
    }
    let var = f1.variable.as_str();

    let difference = (f1.expr.clone() - f2.expr.clone()).simplify();
    let sans_forme_close = || {
        ErreurNoyau::Intersection(format!(
            "pas de forme close pour {} = {} (équation non polynomiale)",
            f1.source, f2.source
        ))
    };

    let mut racines = match FractionRationnelle::depuis_expr(&difference, var) {
        Some(fraction) => racines_fraction(&fraction)?,
        None => resoudre(&difference, var, PROFONDEUR_MAX)?
            .ok_or_else(sans_forme_close)?
            .into_iter()
            .filter(|r| verifiee(f1, f2, r.valeur))
            .collect(),
    };

    racines.retain(|r| r.valeur.is_finite());
    racines.sort_by(|p, q| p.valeur.total_cmp(&q.valeur));
    racines.dedup_by(|q, p| (q.valeur - p.valeur).abs() <= 1e-12 * p.valeur.abs().max(1.0));

    info!(
        "intersections {} = {} : {} racine(s) réelle(s)",
        f1.source,
        f2.source,
        racines.len()
    );
    Ok(racines)
}

fn courbes_identiques() -> ErreurNoyau {
    ErreurNoyau::Intersection("courbes identiques : infinité de solutions".into())
}

/// Racines réelles de N/D (racines de D écartées).
fn racines_fraction(fraction: &FractionRationnelle) -> Result<Vec<Racine>, ErreurNoyau> {
    if fraction.num.est_zero() {
        return Err(courbes_identiques());
    }

    let (rationnelles, reste) = fraction.num.racines_rationnelles();
    let mut racines: Vec<Racine> = rationnelles
        .iter()
        .filter(|r| !fraction.den.evaluer(r).is_zero())
        .map(Racine::rationnelle)
        .collect();

    for r in racines_du_reste(&reste)? {
        if !annule(&fraction.den, r.valeur) {
            racines.push(r);
        }
    }
    Ok(racines)
}

/// f1(x) = f2(x) aux arrondis près, les deux étant définies en x.
fn verifiee(f1: &Fonction, f2: &Fonction, x: f64) -> bool {
    match (f1.evaluer(x), f2.evaluer(x)) {
        (Ok(a), Ok(b)) => (a - b).abs() <= 1e-8 * a.abs().max(b.abs()).max(1.0),
        _ => false,
    }
}

/* ------------------------ Formes non rationnelles ------------------------ */

/// e = 0 en `var`. Ok(None) : aucune méthode ne s’applique.
fn resoudre(e: &Expr, var: &str, profondeur: usize) -> Result<Option<Vec<Racine>>, ErreurNoyau> {
    if let Some(fraction) = FractionRationnelle::depuis_expr(e, var) {
        return racines_fraction(&fraction).map(Some);
    }
    if let Some(coeffs) = coefficients_constants(e, var) {
        return racines_coefficients(coeffs).map(Some);
    }
    if profondeur == 0 {
        return Ok(None);
    }
    let Some((noeud, forme)) = chercher_inversible(e, var) else {
        return Ok(None);
    };

    let y = format!("{var}_");
    let reduite = e.remplacer(&noeud, &Expr::var(&y)).simplify();

    if !reduite.contient_var(var) {
        debug!("sous-terme inversible isolé : {}", format_expr_pretty(&noeud));
        let Some(valeurs_y) = resoudre(&reduite, &y, profondeur - 1)? else {
            return Ok(None);
        };
        let mut racines = Vec::new();
        for ry in &valeurs_y {
            let Some(cible) = forme.inverse(ry) else {
                continue;
            };
            let equation = (forme.argument().clone() - cible).simplify();
            let Some(r) = resoudre(&equation, var, profondeur - 1)? else {
                return Ok(None);
            };
            let approchee = ry.exacte.is_none();
            racines.extend(r.into_iter().map(|mut r| {
                if approchee {
                    r.exacte = None;
                }
                r
            }));
        }
        return Ok(Some(racines));
    }

    // √u, u = αx + β, x ailleurs : x = (y² - β)/α avec y ≥ 0
    let Inversible::Racine(u) = &forme else {
        return Ok(None);
    };
    let Some(c) = coefficients_constants(u, var).filter(|c| c.len() == 2) else {
        return Ok(None);
    };
    let x_de_y = ((Expr::var(&y).puissance(Expr::entier(2)) - c[0].clone()) / c[1].clone()).simplify();
    let equation = reduite.substituer(var, &x_de_y).simplify();
    let Some(valeurs_y) = resoudre(&equation, &y, profondeur - 1)? else {
        return Ok(None);
    };

    let mut racines = Vec::new();
    for ry in valeurs_y.into_iter().filter(|ry| ry.valeur >= 0.0) {
        let exacte = ry.exacte.map(|ey| x_de_y.substituer(&y, &ey).simplify());
        let valeur = match exacte.as_ref().and_then(valeur_reelle) {
            Some(v) => v,
            None => match x_de_y.evaluer_complexe_en(&y, ry.valeur) {
                Ok(z) => z.re,
                Err(_) => continue,
            },
        };
        racines.push(Racine { valeur, exacte });
    }
    Ok(Some(racines))
}

/// Sous-terme G contenant x et inversible une fois isolé (G = y).
#[derive(Clone, Debug)]
enum Inversible {
    /// √u
    Racine(Expr),
    /// exp(u)
    Exp(Expr),
    /// c^u, c constante
    Puissance(Expr, Expr),
    /// ln(u)
    Ln(Expr),
}

impl Inversible {
    fn argument(&self) -> &Expr {
        match self {
            Inversible::Racine(u) | Inversible::Exp(u) | Inversible::Ln(u) => u,
            Inversible::Puissance(_, u) => u,
        }
    }

    /// Valeur de u telle que G(u) = y ; None si y hors de l’image de G.
    fn inverse(&self, ry: &Racine) -> Option<Expr> {
        let y = match &ry.exacte {
            Some(e) => e.clone(),
            None => Expr::Rat(f64_exact(ry.valeur)?),
        };
        match self {
            Inversible::Racine(_) => {
                (ry.valeur >= 0.0).then(|| y.puissance(Expr::entier(2)).simplify())
            }
            Inversible::Exp(_) => (ry.valeur > 0.0).then(|| Expr::Ln(Box::new(y)).simplify()),
            Inversible::Ln(_) => Some(Expr::Exp(Box::new(y)).simplify()),
            Inversible::Puissance(c, _) => {
                let base = valeur_reelle(c)?;
                if !(base > 0.0) || base == 1.0 || !(ry.valeur > 0.0) {
                    return None;
                }
                if let (Expr::Rat(rc), Expr::Rat(rv)) = (c, &y) {
                    if let Some(k) = logarithme_exact(rc, rv) {
                        return Some(Expr::Rat(k));
                    }
                }
                Some((Expr::Ln(Box::new(y)) / Expr::Ln(Box::new(c.clone()))).simplify())
            }
        }
    }
}

/// Premier sous-terme inversible contenant `var` (parcours préfixe).
fn chercher_inversible(e: &Expr, var: &str) -> Option<(Expr, Inversible)> {
    use Expr::*;

    if !e.contient_var(var) {
        return None;
    }
    let demi = BigRational::new(BigInt::from(1), BigInt::from(2));
    match e {
        Sqrt(u) => Some((e.clone(), Inversible::Racine((**u).clone()))),
        Pow(u, k) if k.as_rat() == Some(&demi) => Some((e.clone(), Inversible::Racine((**u).clone()))),
        Exp(u) => Some((e.clone(), Inversible::Exp((**u).clone()))),
        Ln(u) => Some((e.clone(), Inversible::Ln((**u).clone()))),
        Pow(c, u) if !c.contient_var(var) => {
            Some((e.clone(), Inversible::Puissance((**c).clone(), (**u).clone())))
        }
        Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Pow(a, b) => {
            chercher_inversible(a, var).or_else(|| chercher_inversible(b, var))
        }
        Sin(u) | Cos(u) | Tan(u) | Abs(u) => chercher_inversible(u, var),
        Rat(_) | Pi | E | Var(_) => None,
    }
}

/// k = p/q (q ≤ 4, |p| ≤ 64) tel que c^k = y, si c, y > 0.
fn logarithme_exact(c: &BigRational, y: &BigRational) -> Option<BigRational> {
    if !c.is_positive() || !y.is_positive() {
        return None;
    }
    for q in 1..=4i64 {
        let yq = rational_pow_int(y.clone(), q);
        for p in -64..=64i64 {
            if rational_pow_int(c.clone(), p) == yq {
                return Some(BigRational::new(BigInt::from(p), BigInt::from(q)));
            }
        }
    }
    None
}

/* ------------------------ Coefficients constants quelconques ------------------------ */

/// Coefficients (degré 0 → n) si `e` est polynomiale en `var` à coefficients
/// constants (π, e, √2, ln 2…), degré borné.
fn coefficients_constants(e: &Expr, var: &str) -> Option<Vec<Expr>> {
    use Expr::*;

    if !e.contient_var(var) {
        return Some(vec![e.clone()]);
    }
    let c: Vec<Expr> = match e {
        Var(_) => vec![Expr::entier(0), Expr::entier(1)],
        Add(a, b) => combiner(coefficients_constants(a, var)?, coefficients_constants(b, var)?, |p, q| p + q),
        Sub(a, b) => combiner(coefficients_constants(a, var)?, coefficients_constants(b, var)?, |p, q| p - q),
        Mul(a, b) => produit_coefficients(&coefficients_constants(a, var)?, &coefficients_constants(b, var)?)?,
        Div(a, d) if !d.contient_var(var) => coefficients_constants(a, var)?
            .into_iter()
            .map(|k| k / (**d).clone())
            .collect(),
        Pow(u, k) => {
            let n = usize::try_from(k.as_rat().and_then(entier_i64)?).ok()?;
            if n > DEGRE_SYMBOLIQUE_MAX {
                return None;
            }
            let base = coefficients_constants(u, var)?;
            let mut acc = vec![Expr::entier(1)];
            for _ in 0..n {
                acc = produit_coefficients(&acc, &base)?;
            }
            acc
        }
        _ => return None,
    };
    Some(c.into_iter().map(Expr::simplify).collect())
}

fn combiner(p: Vec<Expr>, q: Vec<Expr>, op: impl Fn(Expr, Expr) -> Expr) -> Vec<Expr> {
    let n = p.len().max(q.len());
    let coeff = |v: &[Expr], k: usize| v.get(k).cloned().unwrap_or_else(|| Expr::entier(0));
    (0..n).map(|k| op(coeff(&p, k), coeff(&q, k))).collect()
}

fn produit_coefficients(p: &[Expr], q: &[Expr]) -> Option<Vec<Expr>> {
    if p.len() + q.len() > DEGRE_SYMBOLIQUE_MAX + 2 {
        return None;
    }
    let mut out = vec![Expr::entier(0); p.len() + q.len() - 1];
    for (i, a) in p.iter().enumerate() {
        for (j, b) in q.iter().enumerate() {
            out[i + j] = (out[i + j].clone() + a.clone() * b.clone()).simplify();
        }
    }
    Some(out)
}

fn valeur_reelle(e: &Expr) -> Option<f64> {
    let z = e.evaluer_complexe().ok()?;
    (z.im.abs() <= 1e-12 * z.re.abs().max(1.0) && z.re.is_finite()).then_some(z.re)
}

/// Degré ≤ 2, coefficients constants évalués en réels ; formes exactes conservées.
fn racines_coefficients(mut c: Vec<Expr>) -> Result<Vec<Racine>, ErreurNoyau> {
    while c.last().is_some_and(|k| k.est_zero() || valeur_reelle(k) == Some(0.0)) {
        c.pop();
    }
    let v: Vec<f64> = c
        .iter()
        .map(|k| {
            valeur_reelle(k).ok_or_else(|| {
                ErreurNoyau::Intersection(format!("coefficient non réel : {}", format_expr_pretty(k)))
            })
        })
        .collect::<Result<_, _>>()?;

    match c.len() {
        0 => Err(courbes_identiques()),
        1 => Ok(Vec::new()),
        2 => Ok(vec![Racine {
            valeur: -v[0] / v[1],
            exacte: Some((-c[0].clone() / c[1].clone()).simplify()),
        }]),
        3 => {
            let delta = v[1] * v[1] - 4.0 * v[2] * v[0];
            let echelle = (v[1] * v[1]).max((4.0 * v[2] * v[0]).abs());
            let deux_a = Expr::entier(2) * c[2].clone();
            let centre = -c[1].clone() / deux_a.clone();
            if delta.abs() <= 1e-14 * echelle {
                return Ok(vec![Racine {
                    valeur: -v[1] / (2.0 * v[2]),
                    exacte: Some(centre.simplify()),
                }]);
            }
            if delta < 0.0 {
                return Ok(Vec::new());
            }
            let delta_exact = (c[1].clone() * c[1].clone() - Expr::entier(4) * c[2].clone() * c[0].clone()).simplify();
            let racine_delta = Expr::Sqrt(Box::new(delta_exact)) / deux_a;
            Ok([-1.0, 1.0]
                .into_iter()
                .map(|signe: f64| {
                    let exacte = if signe < 0.0 {
                        centre.clone() - racine_delta.clone()
                    } else {
                        centre.clone() + racine_delta.clone()
                    };
                    Racine {
                        valeur: (-v[1] + signe * delta.sqrt()) / (2.0 * v[2]),
                        exacte: Some(exacte.simplify()),
                    }
                })
                .collect())
        }
        d => Err(ErreurNoyau::Intersection(format!(
            "degré {} à coefficients non rationnels : pas de forme close",
            d - 1
        ))),
    }
}

/* ------------------------ Reste après déflation rationnelle ------------------------ */

fn racines_du_reste(p: &Polynome) -> Result<Vec<Racine>, ErreurNoyau> {
    let c = p.coeffs();
    match p.degre() {
        None | Some(0) => Ok(Vec::new()),
        Some(1) => Ok(vec![Racine::rationnelle(&(-&c[0] / &c[1]))]),
        Some(2) => Ok(racines_quadratiques(&c[2], &c[1], &c[0])
            .into_iter()
            .map(|(valeur, exacte)| Racine {
                valeur,
                exacte: Some(exacte),
            })
            .collect()),
        Some(3) => {
            debug!("reste cubique : Cardano puis Newton");
            Ok(racines_cubiques(p))
        }
        Some(4) if c[1].is_zero() && c[3].is_zero() => Ok(racines_bicarrees(&c[4], &c[2], &c[0])),
        Some(d) => Err(ErreurNoyau::Intersection(format!(
            "facteur irréductible de degré {d} : pas de forme close"
        ))),
    }
}

/// Racines réelles de a·x² + b·x + c (a ≠ 0), valeur et forme exacte.
fn racines_quadratiques(a: &BigRational, b: &BigRational, c: &BigRational) -> Vec<(f64, Expr)> {
    let deux_a = a * BigRational::from_integer(BigInt::from(2));
    let quatre = BigRational::from_integer(BigInt::from(4));
    let delta = b * b - quatre * a * c;

    if delta.is_negative() {
        return Vec::new();
    }
    let centre = -b / &deux_a;
    if delta.is_zero() {
        return vec![(rat_vers_f64(&centre), Expr::Rat(centre))];
    }

    let pente = BigRational::from_integer(BigInt::from(1)) / &deux_a;
    let racine_delta = racine_reduite(&delta);
    let r_delta = rat_vers_f64(&delta).sqrt();

    let mut v = Vec::with_capacity(2);
    for signe in [-1i64, 1] {
        let k = &pente * BigRational::from_integer(BigInt::from(signe));
        let exacte = (Expr::Rat(centre.clone()) + Expr::Rat(k.clone()) * racine_delta.clone()).simplify();
        let valeur = rat_vers_f64(&centre) + rat_vers_f64(&k) * r_delta;
        v.push((valeur, exacte));
    }
    v
}

/// a·x⁴ + b·x² + c : y = x², puis x = ±√y pour chaque y ≥ 0.
fn racines_bicarrees(a: &BigRational, b: &BigRational, c: &BigRational) -> Vec<Racine> {
    let mut v = Vec::new();
    for (y, y_exact) in racines_quadratiques(a, b, c) {
        if y < 0.0 {
            continue;
        }
        if y == 0.0 {
            v.push(Racine {
                valeur: 0.0,
                exacte: Some(Expr::entier(0)),
            });
            continue;
        }
        let x = Expr::Sqrt(Box::new(y_exact)).simplify();
        v.push(Racine {
            valeur: -y.sqrt(),
            exacte: Some((-x.clone()).simplify()),
        });
        v.push(Racine {
            valeur: y.sqrt(),
            exacte: Some(x),
        });
    }
    v
}

/// Cardano (coefficients réels) puis polissage de Newton des racines réelles.
fn racines_cubiques(p: &Polynome) -> Vec<Racine> {
    let c: Vec<f64> = p.coeffs().iter().map(rat_vers_f64).collect();
    let (a, b, cc, d) = (c[3], c[2], c[1], c[0]);

    // forme réduite t³ + p·t + q, x = t - b/(3a)
    let pr = (3.0 * a * cc - b * b) / (3.0 * a * a);
    let qr = (2.0 * b * b * b - 9.0 * a * b * cc + 27.0 * a * a * d) / (27.0 * a * a * a);
    let decalage = b / (3.0 * a);

    let disc = Complex64::new(qr * qr / 4.0 + pr * pr * pr / 27.0, 0.0);
    let mut u = (Complex64::new(-qr / 2.0, 0.0) + disc.sqrt()).powf(1.0 / 3.0);
    if u.norm() < 1e-300 {
        u = (Complex64::new(-qr / 2.0, 0.0) - disc.sqrt()).powf(1.0 / 3.0);
    }
    let omega = Complex64::new(-0.5, 3f64.sqrt() * 0.5);

    let mut v = Vec::new();
    let mut rot = Complex64::new(1.0, 0.0);
    for _ in 0..3 {
        let uk = u * rot;
        let t = if uk.norm() < 1e-300 {
            Complex64::new(0.0, 0.0)
        } else {
            uk - Complex64::new(pr, 0.0) / (uk * 3.0)
        };
        let z = t - decalage;
        rot *= omega;

        if z.im.abs() > SEUIL_IMAGINAIRE * z.norm().max(1.0) {
            continue;
        }
        let x = newton(p, z.re);
        v.push(Racine {
            valeur: x,
            exacte: None,
        });
    }
    v
}

fn newton(p: &Polynome, depart: f64) -> f64 {
    let dp = p.derivee();
    let mut x = depart;
    for _ in 0..ITERATIONS_NEWTON {
        let pente = dp.evaluer_f64(x);
        if pente == 0.0 || !pente.is_finite() {
            break;
        }
        let pas = p.evaluer_f64(x) / pente;
        if !pas.is_finite() {
            break;
        }
        x -= pas;
        if pas.abs() <= f64::EPSILON * x.abs().max(1.0) {
            break;
        }
    }
    x
}

/// D(x) ≈ 0, relativement à l’échelle des termes.
fn annule(den: &Polynome, x: f64) -> bool {
    let echelle: f64 = den
        .coeffs()
        .iter()
        .enumerate()
        .map(|(k, c)| rat_vers_f64(c).abs() * x.abs().powi(k as i32))
        .sum();
    den.evaluer_f64(x).abs() <= 1e-12 * echelle.max(f64::MIN_POSITIVE)
}

/// √r sous la forme k·√m (m sans facteur carré, recherche bornée).
fn racine_reduite(r: &BigRational) -> Expr {
    if let Some(s) = rational_sqrt_exact(r) {
        return Expr::Rat(s);
    }
    // √(p/q) = √(p·q)/q
    let produit = r.numer() * r.denom();
    let Some(mut n) = produit.to_u64() else {
        return Expr::Sqrt(Box::new(Expr::Rat(r.clone())));
    };

    let mut facteur: u64 = 1;
    let mut d: u64 = 2;
    while d <= MAX_FACTEUR_CARRE && d.saturating_mul(d) <= n {
        while n % (d * d) == 0 {
            n /= d * d;
            facteur *= d;
        }
        d += 1;
    }

    let k = BigRational::new(BigInt::from(facteur), r.denom().clone());
    let racine = Expr::Sqrt(Box::new(Expr::Rat(BigRational::from_integer(BigInt::from(n)))));
    (Expr::Rat(k) * racine).simplify()
}
