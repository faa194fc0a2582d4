// src/noyau/polynome.rs
//
// Polynômes à coefficients rationnels EXACTS (une variable) et fractions rationnelles.
// - coefficients du degré 0 vers le degré n, jamais de zéro en tête (forme normale)
// - conversion Expr -> N/D refusée dès qu’un terme n’est pas rationnel (π, e, sin, √…)
// - garde-fou : degré borné (anti-explosion sur (x+1)^1000)

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use std::ops;

use super::expr::{entier_i64, rat_vers_f64, Expr};

/// Garde-fou : degré maximal manipulé exactement.
pub const MAX_DEGRE: usize = 64;

/// Garde-fou : |coefficient| maximal pour l’énumération des diviseurs (théorème des racines rationnelles).
const MAX_DIVISEURS: u64 = 1_000_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polynome {
    coeffs: Vec<BigRational>,
}

impl Polynome {
    pub fn depuis_coeffs(coeffs: Vec<BigRational>) -> Polynome {
        let mut p = Polynome { coeffs };
        p.normaliser();
        p
    }

    pub fn zero() -> Polynome {
        Polynome { coeffs: Vec::new() }
    }

    pub fn constante(c: BigRational) -> Polynome {
        Polynome::depuis_coeffs(vec![c])
    }

    /// Le monôme x.
    pub fn x() -> Polynome {
        Polynome::depuis_coeffs(vec![BigRational::zero(), BigRational::one()])
    }

    fn normaliser(&mut self) {
        while self.coeffs.last().is_some_and(|c| c.is_zero()) {
            self.coeffs.pop();
        }
    }

    pub fn coeffs(&self) -> &[BigRational] {
        &self.coeffs
    }

    pub fn est_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// None pour le polynôme nul.
    pub fn degre(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    /// Coefficient du degré k (0 au-delà du degré).
    pub fn coeff(&self, k: usize) -> BigRational {
        self.coeffs.get(k).cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn dominant(&self) -> BigRational {
        self.coeffs.last().cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn puissance(&self, k: u32) -> Option<Polynome> {
        let deg = self.degre().unwrap_or(0);
        if deg.saturating_mul(k as usize) > MAX_DEGRE {
            return None;
        }
        let mut acc = Polynome::constante(BigRational::one());
        for _ in 0..k {
            acc = &acc * self;
        }
        Some(acc)
    }

    pub fn derivee(&self) -> Polynome {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, c)| c * BigRational::from_integer(BigInt::from(k)))
            .collect();
        Polynome::depuis_coeffs(coeffs)
    }

    /// Primitive nulle en 0.
    pub fn primitive(&self) -> Polynome {
        let mut coeffs = vec![BigRational::zero()];
        for (k, c) in self.coeffs.iter().enumerate() {
            coeffs.push(c / BigRational::from_integer(BigInt::from(k + 1)));
        }
        Polynome::depuis_coeffs(coeffs)
    }

    /// Horner exact.
    pub fn evaluer(&self, x: &BigRational) -> BigRational {
        let mut acc = BigRational::zero();
        for c in self.coeffs.iter().rev() {
            acc = acc * x + c;
        }
        acc
    }

    pub fn evaluer_f64(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * x + rat_vers_f64(c))
    }

    /// Division synthétique par (x - r) ; le reste est ignoré (r doit être racine).
    pub fn diviser_par_lineaire(&self, r: &BigRational) -> Polynome {
        let n = self.coeffs.len();
        if n <= 1 {
            return Polynome::zero();
        }
        let mut q = vec![BigRational::zero(); n - 1];
        let mut acc = BigRational::zero();
        for k in (1..n).rev() {
            acc = acc * r + &self.coeffs[k];
            q[k - 1] = acc.clone();
        }
        Polynome::depuis_coeffs(q)
    }

    /// Coefficients entiers proportionnels (multiplie par le ppcm des dénominateurs).
    fn coeffs_entiers(&self) -> Vec<BigInt> {
        let m = self
            .coeffs
            .iter()
            .fold(BigInt::one(), |acc, c| ppcm(&acc, c.denom()));
        self.coeffs
            .iter()
            .map(|c| (c * BigRational::from_integer(m.clone())).to_integer())
            .collect()
    }

    /// Racines rationnelles (sans multiplicité), par ordre de découverte,
    /// et le polynôme restant après déflation.
    /// Cherche d’abord la racine 0, puis les candidats ±p/q (p | a0, q | an).
    pub fn racines_rationnelles(&self) -> (Vec<BigRational>, Polynome) {
        let mut racines: Vec<BigRational> = Vec::new();
        let mut p = self.clone();

        // x = 0 (facteur x^k)
        while p.degre().is_some_and(|d| d >= 1) && p.coeffs[0].is_zero() {
            if !racines.iter().any(|r| r.is_zero()) {
                racines.push(BigRational::zero());
            }
            p.coeffs.remove(0);
        }

        'deflation: while p.degre().is_some_and(|d| d >= 1) {
            let entiers = p.coeffs_entiers();
            let (Some(a0), Some(an)) = (entiers.first(), entiers.last()) else {
                break;
            };
            let (Some(div_p), Some(div_q)) = (diviseurs(a0), diviseurs(an)) else {
                break;
            };

            for dp in &div_p {
                for dq in &div_q {
                    for signe in [1i64, -1] {
                        let cand = BigRational::new(BigInt::from(*dp) * signe, BigInt::from(*dq));
                        if p.evaluer(&cand).is_zero() {
                            if !racines.contains(&cand) {
                                racines.push(cand.clone());
                            }
                            p = p.diviser_par_lineaire(&cand);
                            continue 'deflation;
                        }
                    }
                }
            }
            break;
        }

        (racines, p)
    }

    /// Expression développée : c_n x^n ± … ± c_0.
    pub fn vers_expr(&self, var: &str) -> Expr {
        let mut acc: Option<Expr> = None;

        for (k, c) in self.coeffs.iter().enumerate().rev() {
            if c.is_zero() {
                continue;
            }
            let monome = match k {
                0 => None,
                1 => Some(Expr::var(var)),
                _ => Some(Expr::var(var).puissance(Expr::entier(k as i64))),
            };
            let terme = |c: BigRational| match &monome {
                None => Expr::Rat(c),
                Some(m) if c.is_one() => m.clone(),
                Some(m) => Expr::Rat(c) * m.clone(),
            };

            acc = Some(match acc {
                None => terme(c.clone()),
                Some(a) if c.is_negative() => a - terme(-c),
                Some(a) => a + terme(c.clone()),
            });
        }

        acc.map(Expr::simplify).unwrap_or_else(|| Expr::entier(0))
    }

    /// Polynôme si `e` en est un (dénominateur constant), sinon None.
    pub fn depuis_expr(e: &Expr, var: &str) -> Option<Polynome> {
        let f = FractionRationnelle::depuis_expr(e, var)?;
        if f.den.degre() != Some(0) {
            return None;
        }
        let d = f.den.dominant();
        let coeffs = f.num.coeffs.iter().map(|c| c / &d).collect();
        Some(Polynome::depuis_coeffs(coeffs))
    }
}

impl ops::Add for &Polynome {
    type Output = Polynome;
    fn add(self, rhs: &Polynome) -> Polynome {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Polynome::depuis_coeffs((0..n).map(|k| self.coeff(k) + rhs.coeff(k)).collect())
    }
}

impl ops::Sub for &Polynome {
    type Output = Polynome;
    fn sub(self, rhs: &Polynome) -> Polynome {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Polynome::depuis_coeffs((0..n).map(|k| self.coeff(k) - rhs.coeff(k)).collect())
    }
}

impl ops::Mul for &Polynome {
    type Output = Polynome;
    fn mul(self, rhs: &Polynome) -> Polynome {
        if self.est_zero() || rhs.est_zero() {
            return Polynome::zero();
        }
        let mut out = vec![BigRational::zero(); self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in rhs.coeffs.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynome::depuis_coeffs(out)
    }
}

fn pgcd(a: &BigInt, b: &BigInt) -> BigInt {
    let (mut a, mut b) = (a.abs(), b.abs());
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

fn ppcm(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() || b.is_zero() {
        return BigInt::zero();
    }
    (a * b).abs() / pgcd(a, b)
}

/// Diviseurs positifs de |n| (None si n trop grand pour une énumération raisonnable).
/// Pour n = 0, renvoie [1] (cas déjà traité par la recherche de la racine 0).
fn diviseurs(n: &BigInt) -> Option<Vec<u64>> {
    let n = n.abs().to_u64()?;
    if n > MAX_DIVISEURS {
        return None;
    }
    if n == 0 {
        return Some(vec![1]);
    }
    let mut petits = Vec::new();
    let mut grands = Vec::new();
    let mut d: u64 = 1;
    while d * d <= n {
        if n % d == 0 {
            petits.push(d);
            if d * d != n {
                grands.push(n / d);
            }
        }
        d += 1;
    }
    petits.extend(grands.into_iter().rev());
    Some(petits)
}

/* ------------------------ Fractions rationnelles ------------------------ */

/// N/D exact, D jamais nul.
#[derive(Clone, Debug, PartialEq)]
pub struct FractionRationnelle {
    pub num: Polynome,
    pub den: Polynome,
}

impl FractionRationnelle {
    fn polynome(p: Polynome) -> FractionRationnelle {
        FractionRationnelle {
            num: p,
            den: Polynome::constante(BigRational::one()),
        }
    }

    fn borne(self) -> Option<FractionRationnelle> {
        let ok = |p: &Polynome| p.degre().unwrap_or(0) <= MAX_DEGRE;
        if ok(&self.num) && ok(&self.den) {
            Some(self)
        } else {
            None
        }
    }

    /// Conversion exacte ; None si un terme n’est pas une fraction rationnelle en `var`
    /// à coefficients rationnels.
    pub fn depuis_expr(e: &Expr, var: &str) -> Option<FractionRationnelle> {
        use Expr::*;

        let r = match e {
            Rat(c) => Self::polynome(Polynome::constante(c.clone())),
            Var(v) if v == var => Self::polynome(Polynome::x()),
            Var(_) | Pi | E => return None,

            Add(a, b) | Sub(a, b) => {
                let fa = Self::depuis_expr(a, var)?;
                let fb = Self::depuis_expr(b, var)?;
                let na = &fa.num * &fb.den;
                let nb = &fb.num * &fa.den;
                let num = if matches!(e, Add(_, _)) { &na + &nb } else { &na - &nb };
                FractionRationnelle {
                    num,
                    den: &fa.den * &fb.den,
                }
            }
            Mul(a, b) => {
                let fa = Self::depuis_expr(a, var)?;
                let fb = Self::depuis_expr(b, var)?;
                FractionRationnelle {
                    num: &fa.num * &fb.num,
                    den: &fa.den * &fb.den,
                }
            }
            Div(a, b) => {
                let fa = Self::depuis_expr(a, var)?;
                let fb = Self::depuis_expr(b, var)?;
                if fb.num.est_zero() {
                    return None;
                }
                FractionRationnelle {
                    num: &fa.num * &fb.den,
                    den: &fa.den * &fb.num,
                }
            }
            Pow(base, exposant) => {
                let k = exposant.as_rat().and_then(entier_i64)?;
                let fb = Self::depuis_expr(base, var)?;
                let k_abs = u32::try_from(k.unsigned_abs()).ok()?;
                let num = fb.num.puissance(k_abs)?;
                let den = fb.den.puissance(k_abs)?;
                if k >= 0 {
                    FractionRationnelle { num, den }
                } else {
                    if num.est_zero() {
                        return None;
                    }
                    FractionRationnelle { num: den, den: num }
                }
            }

            Sqrt(_) | Sin(_) | Cos(_) | Tan(_) | Exp(_) | Ln(_) | Abs(_) => return None,
        };

        r.borne()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::analyse::analyser;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn poly(c: &[i64]) -> Polynome {
        Polynome::depuis_coeffs(c.iter().map(|&k| rat(k, 1)).collect())
    }

    #[test]
    fn arithmetique_et_normalisation() {
        let p = poly(&[1, 1]); // 1 + x
        let q = &p * &p;
        assert_eq!(q, poly(&[1, 2, 1]));
        assert_eq!(&q - &q, Polynome::zero());
        assert_eq!(Polynome::zero().degre(), None);
        assert_eq!(poly(&[3, 0, 0]).degre(), Some(0));
    }

    #[test]
    fn primitive_et_derivee() {
        let p = poly(&[0, 0, 1]); // x^2
        let prim = p.primitive();
        assert_eq!(prim.evaluer(&rat(1, 1)), rat(1, 3));
        assert_eq!(prim.derivee(), p);
    }

    #[test]
    fn depuis_expression() {
        let f = analyser("(x + 1)**2 - 2*x", "x").unwrap();
        let p = Polynome::depuis_expr(&f.expr, "x").unwrap();
        assert_eq!(p, poly(&[1, 0, 1]));

        let f = analyser("x/2", "x").unwrap();
        let p = Polynome::depuis_expr(&f.expr, "x").unwrap();
        assert_eq!(p.coeffs(), &[rat(0, 1), rat(1, 2)]);

        let f = analyser("sin(x)", "x").unwrap();
        assert!(Polynome::depuis_expr(&f.expr, "x").is_none());

        let f = analyser("1/x", "x").unwrap();
        assert!(Polynome::depuis_expr(&f.expr, "x").is_none());
        assert!(FractionRationnelle::depuis_expr(&f.expr, "x").is_some());
    }

    #[test]
    fn garde_fou_degre() {
        let f = analyser("(x + 1)**1000", "x").unwrap();
        assert!(Polynome::depuis_expr(&f.expr, "x").is_none());
    }

    #[test]
    fn racines_rationnelles_et_deflation() {
        // x^3 - x = x(x-1)(x+1)
        let (r, reste) = poly(&[0, -1, 0, 1]).racines_rationnelles();
        assert_eq!(r.len(), 3);
        assert!(r.contains(&rat(0, 1)) && r.contains(&rat(1, 1)) && r.contains(&rat(-1, 1)));
        assert_eq!(reste.degre(), Some(0));

        // 2x^2 - 3x + 1 = (2x-1)(x-1)
        let (r, _) = poly(&[1, -3, 2]).racines_rationnelles();
        assert!(r.contains(&rat(1, 2)) && r.contains(&rat(1, 1)));

        // x^2 - 2 : aucune racine rationnelle
        let (r, reste) = poly(&[-2, 0, 1]).racines_rationnelles();
        assert!(r.is_empty());
        assert_eq!(reste.degre(), Some(2));
    }

    #[test]
    fn racine_double_sans_doublon() {
        // (x-1)^2
        let (r, reste) = poly(&[1, -2, 1]).racines_rationnelles();
        assert_eq!(r, vec![rat(1, 1)]);
        assert_eq!(reste.degre(), Some(0));
    }

    #[test]
    fn retour_en_expression() {
        let p = poly(&[-1, -2, 1]); // x^2 - 2x - 1
        let e = p.vers_expr("x");
        for x in [-1.5, 0.0, 2.25] {
            assert_eq!(e.evaluer("x", x).unwrap(), p.evaluer_f64(x));
        }
    }
}
