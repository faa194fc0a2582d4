// src/noyau/expr.rs
//
// AST exact d’une fonction réelle d’une variable.
// - Rat : rationnel exact (les littéraux décimaux sont lus exactement)
// - Pi, E : constantes symboliques
// - Var : la variable libre (ex: x)
// - négation = Sub(0, x) (convention conservée partout : rendu, signes, primitives)
//
// IMPORTANT (SAFE):
// - simplify() ne doit jamais “inventer” une valeur pour Var.
// - evaluer() échoue explicitement (division par zéro, domaine) : jamais de NaN silencieux.

use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use std::f64::consts;
use std::fmt;
use std::ops;

use super::erreurs::ErreurNoyau;

/// Garde-fou : exposant entier maximal développé exactement.
const EXPOSANT_EXACT_MAX: i64 = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Rat(BigRational),
    Pi,
    E,

    Var(String),

    Sqrt(Box<Expr>),          // √(x)
    Pow(Box<Expr>, Box<Expr>), // x^y

    Sin(Box<Expr>),
    Cos(Box<Expr>),
    Tan(Box<Expr>),
    Exp(Box<Expr>),
    Ln(Box<Expr>),
    Abs(Box<Expr>),

    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

/* ------------------------ Constructeurs ------------------------ */

impl Expr {
    pub fn entier(n: i64) -> Expr {
        Expr::Rat(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn fraction(n: i64, d: i64) -> Expr {
        Expr::Rat(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    pub fn var(nom: &str) -> Expr {
        Expr::Var(nom.to_string())
    }

    pub fn puissance(self, exposant: Expr) -> Expr {
        Expr::Pow(Box::new(self), Box::new(exposant))
    }

    pub fn as_rat(&self) -> Option<&BigRational> {
        match self {
            Expr::Rat(r) => Some(r),
            _ => None,
        }
    }

    pub fn est_zero(&self) -> bool {
        matches!(self, Expr::Rat(r) if r.is_zero())
    }
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::Div(Box::new(self), Box::new(rhs))
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        match self {
            Expr::Rat(r) => Expr::Rat(-r),
            other => Expr::Sub(Box::new(Expr::Rat(BigRational::zero())), Box::new(other)),
        }
    }
}

/// Sub(0, x) => Some(x)
fn oppose_de(e: &Expr) -> Option<&Expr> {
    match e {
        Expr::Sub(a, b) if a.est_zero() => Some(b.as_ref()),
        _ => None,
    }
}

impl Expr {
    /// Simplification locale (SAFE), sans heuristiques.
    /// Objectif: réduire ce qui est strictement démontrable sans exploser l’arbre.
    pub fn simplify(self) -> Expr {
        use Expr::*;

        match self {
            // Feuilles: aucune simplification à faire
            Rat(_) | Pi | E | Var(_) => self,

            Add(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                if let Some(y) = oppose_de(&b) {
                    return Sub(Box::new(a), Box::new(y.clone())).simplify();
                }
                match (&a, &b) {
                    (Rat(x), Rat(y)) => Rat(x + y),
                    (Rat(x), _) if x.is_zero() => b,
                    (_, Rat(y)) if y.is_zero() => a,
                    _ => Add(Box::new(a), Box::new(b)),
                }
            }

            Sub(a, b) => {
                let a = a.simplify();
                let b = b.simplify();

                // x - x => 0 (renforce la normalisation)
                if a == b {
                    return Rat(BigRational::zero());
                }
                // a - (-y) => a + y
                if let Some(y) = oppose_de(&b) {
                    return Add(Box::new(a), Box::new(y.clone())).simplify();
                }

                match (&a, &b) {
                    (Rat(x), Rat(y)) => Rat(x - y),
                    (_, Rat(y)) if y.is_zero() => a,
                    _ => Sub(Box::new(a), Box::new(b)),
                }
            }

            Mul(a, b) => {
                let a = a.simplify();
                let b = b.simplify();

                // √x * √x => x
                if let (Sqrt(x), Sqrt(y)) = (&a, &b) {
                    if x.as_ref() == y.as_ref() {
                        return (*x.clone()).simplify();
                    }
                }

                // signes : (-p)*(-q) => p*q ; (-p)*q => -(p*q)
                match (oppose_de(&a), oppose_de(&b)) {
                    (Some(p), Some(q)) => return Mul(Box::new(p.clone()), Box::new(q.clone())).simplify(),
                    (Some(p), None) => return (-Mul(Box::new(p.clone()), Box::new(b)).simplify()).simplify(),
                    (None, Some(q)) => return (-Mul(Box::new(a), Box::new(q.clone())).simplify()).simplify(),
                    (None, None) => {}
                }

                match (&a, &b) {
                    (Rat(x), Rat(y)) => Rat(x * y),
                    (Rat(x), _) if x.is_zero() => Rat(BigRational::zero()),
                    (_, Rat(y)) if y.is_zero() => Rat(BigRational::zero()),
                    (Rat(x), _) if x.is_one() => b,
                    (_, Rat(y)) if y.is_one() => a,
                    (Rat(x), _) if *x == -BigRational::one() => -b,
                    // constante devant : p * c => c * p
                    (_, Rat(_)) => Mul(Box::new(b), Box::new(a)).simplify(),
                    // c1 * (c2 * z) => (c1*c2) * z
                    (Rat(x), Mul(c, z)) => match c.as_ref() {
                        Rat(y) => Mul(Box::new(Rat(x * y)), z.clone()).simplify(),
                        _ => Mul(Box::new(a), Box::new(b)),
                    },
                    _ => Mul(Box::new(a), Box::new(b)),
                }
            }

            Div(a, b) => {
                let a = a.simplify();
                let b = b.simplify();

                // division par zéro : on garde symbolique ici (evaluer() signalera l’erreur)
                if b.est_zero() {
                    return Div(Box::new(a), Box::new(b));
                }

                if let Some(p) = oppose_de(&a) {
                    return (-Div(Box::new(p.clone()), Box::new(b))).simplify();
                }

                match (&a, &b) {
                    (Rat(x), Rat(y)) => Rat(x / y),
                    (_, Rat(y)) if y.is_one() => a,
                    (Rat(x), _) if x.is_zero() => Rat(BigRational::zero()),
                    // (c*z)/k => (c/k)*z
                    (Mul(c, z), Rat(k)) => match c.as_ref() {
                        Rat(c) => Mul(Box::new(Rat(c / k)), z.clone()).simplify(),
                        _ => Div(Box::new(a), Box::new(b)),
                    },
                    // z/k => (1/k)*z
                    (_, Rat(k)) => Mul(Box::new(Rat(k.recip())), Box::new(a)).simplify(),
                    _ => Div(Box::new(a), Box::new(b)),
                }
            }

            Pow(base, exposant) => {
                let base = base.simplify();
                let exposant = exposant.simplify();

                if exposant.est_zero() {
                    return Rat(BigRational::one());
                }
                if matches!(&exposant, Rat(n) if n.is_one()) {
                    return base;
                }
                if matches!(&base, Rat(r) if r.is_one()) {
                    return Rat(BigRational::one());
                }
                // e^u => exp(u)
                if base == E {
                    return Exp(Box::new(exposant));
                }

                if let (Rat(r), Rat(n)) = (&base, &exposant) {
                    // r^k (k entier, borné)
                    if let Some(k) = entier_i64(n) {
                        if k.abs() <= EXPOSANT_EXACT_MAX && !(r.is_zero() && k < 0) {
                            return Rat(rational_pow_int(r.clone(), k));
                        }
                    }
                    // r^(1/2) exact (carré parfait)
                    if *n == BigRational::new(BigInt::one(), BigInt::from(2)) {
                        if let Some(s) = rational_sqrt_exact(r) {
                            return Rat(s);
                        }
                    }
                }

                // (x^p)^k => x^(p*k) si k entier (identité valide sur les réels)
                if let (Pow(x, p), Rat(k)) = (&base, &exposant) {
                    if k.is_integer() {
                        return Pow(x.clone(), Box::new(Mul(p.clone(), Box::new(Rat(k.clone())))))
                            .simplify();
                    }
                }

                Pow(Box::new(base), Box::new(exposant))
            }

            Sqrt(x) => {
                let x = x.simplify();
                if let Rat(r) = &x {
                    if let Some(s) = rational_sqrt_exact(r) {
                        return Rat(s);
                    }
                }
                Sqrt(Box::new(x))
            }

            Sin(x) => {
                let x = x.simplify();
                if x.est_zero() || x == Pi {
                    return Rat(BigRational::zero());
                }
                Sin(Box::new(x))
            }
            Cos(x) => {
                let x = x.simplify();
                if x.est_zero() {
                    return Rat(BigRational::one());
                }
                if x == Pi {
                    return Rat(-BigRational::one());
                }
                Cos(Box::new(x))
            }
            Tan(x) => {
                let x = x.simplify();
                if x.est_zero() {
                    return Rat(BigRational::zero());
                }
                Tan(Box::new(x))
            }
            Exp(x) => {
                let x = x.simplify();
                if x.est_zero() {
                    return Rat(BigRational::one());
                }
                if matches!(&x, Rat(r) if r.is_one()) {
                    return E;
                }
                Exp(Box::new(x))
            }
            Ln(x) => {
                let x = x.simplify();
                match x {
                    Rat(ref r) if r.is_one() => Rat(BigRational::zero()),
                    E => Rat(BigRational::one()),
                    // ln(exp(u)) = u sur les réels
                    Exp(u) => *u,
                    _ => Ln(Box::new(x)),
                }
            }
            Abs(x) => {
                let x = x.simplify();
                match x {
                    Rat(r) => Rat(r.abs()),
                    Pi => Pi,
                    E => E,
                    Abs(_) => x,
                    _ => Abs(Box::new(x)),
                }
            }
        }
    }

    /// Détecte si l’expression contient la variable `var`.
    /// Itératif + garde-fous : si l'arbre est trop gros, on retourne true (SAFE).
    pub fn contient_var(&self, var: &str) -> bool {
        self.visiter(|e| matches!(e, Expr::Var(v) if v == var))
    }

    /// Vrai si aucune variable (quelle qu’elle soit) n’apparaît.
    pub fn est_constante(&self) -> bool {
        !self.visiter(|e| matches!(e, Expr::Var(_)))
    }

    /// Parcours itératif : true dès qu’un noeud satisfait `cible`.
    fn visiter(&self, cible: impl Fn(&Expr) -> bool) -> bool {
        use Expr::*;

        const MAX_PILE: usize = 8192;
        const MAX_NOEUDS: usize = 200_000;

        let mut pile: Vec<&Expr> = Vec::with_capacity(64);
        pile.push(self);

        let mut visites: usize = 0;

        while let Some(e) = pile.pop() {
            visites += 1;
            if visites > MAX_NOEUDS || pile.len() > MAX_PILE {
                return true;
            }
            if cible(e) {
                return true;
            }

            match e {
                Rat(_) | Pi | E | Var(_) => {}

                Sqrt(x) | Sin(x) | Cos(x) | Tan(x) | Exp(x) | Ln(x) | Abs(x) => pile.push(x.as_ref()),

                Pow(a, b) | Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) => {
                    pile.push(a.as_ref());
                    pile.push(b.as_ref());
                }
            }
        }

        false
    }

    /// Nombre de noeuds (borné : s’arrête à `plafond`).
    pub fn taille(&self, plafond: usize) -> usize {
        use Expr::*;

        let mut pile: Vec<&Expr> = vec![self];
        let mut n = 0;
        while let Some(e) = pile.pop() {
            n += 1;
            if n >= plafond {
                return plafond;
            }
            match e {
                Rat(_) | Pi | E | Var(_) => {}
                Sqrt(x) | Sin(x) | Cos(x) | Tan(x) | Exp(x) | Ln(x) | Abs(x) => pile.push(x.as_ref()),
                Pow(a, b) | Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) => {
                    pile.push(a.as_ref());
                    pile.push(b.as_ref());
                }
            }
        }
        n
    }

    /// Remplace chaque occurrence de `var` par `valeur`.
    pub fn substituer(&self, var: &str, valeur: &Expr) -> Expr {
        use Expr::*;

        let s = |x: &Expr| Box::new(x.substituer(var, valeur));
        match self {
            Var(v) if v == var => valeur.clone(),
            Rat(_) | Pi | E | Var(_) => self.clone(),

            Sqrt(x) => Sqrt(s(x)),
            Sin(x) => Sin(s(x)),
            Cos(x) => Cos(s(x)),
            Tan(x) => Tan(s(x)),
            Exp(x) => Exp(s(x)),
            Ln(x) => Ln(s(x)),
            Abs(x) => Abs(s(x)),

            Pow(a, b) => Pow(s(a), s(b)),
            Add(a, b) => Add(s(a), s(b)),
            Sub(a, b) => Sub(s(a), s(b)),
            Mul(a, b) => Mul(s(a), s(b)),
            Div(a, b) => Div(s(a), s(b)),
        }
    }

    /// Remplace chaque occurrence (égalité structurelle) du sous-arbre `cible`.
    pub fn remplacer(&self, cible: &Expr, par: &Expr) -> Expr {
        use Expr::*;

        if self == cible {
            return par.clone();
        }
        let r = |x: &Expr| Box::new(x.remplacer(cible, par));
        match self {
            Rat(_) | Pi | E | Var(_) => self.clone(),

            Sqrt(x) => Sqrt(r(x)),
            Sin(x) => Sin(r(x)),
            Cos(x) => Cos(r(x)),
            Tan(x) => Tan(r(x)),
            Exp(x) => Exp(r(x)),
            Ln(x) => Ln(r(x)),
            Abs(x) => Abs(r(x)),

            Pow(a, b) => Pow(r(a), r(b)),
            Add(a, b) => Add(r(a), r(b)),
            Sub(a, b) => Sub(r(a), r(b)),
            Mul(a, b) => Mul(r(a), r(b)),
            Div(a, b) => Div(r(a), r(b)),
        }
    }

    /* ------------------------ Évaluation réelle ------------------------ */

    /// Évalue en `var = x`. Toute valeur indéfinie (division par zéro, racine ou
    /// logarithme hors domaine, puissance réelle d’une base négative) est une erreur.
    pub fn evaluer(&self, var: &str, x: f64) -> Result<f64, ErreurNoyau> {
        use Expr::*;

        let v = match self {
            Rat(r) => rat_vers_f64(r),
            Pi => consts::PI,
            E => consts::E,
            Var(nom) => {
                if nom == var {
                    x
                } else {
                    return Err(ErreurNoyau::evaluation(format!("symbole libre '{nom}'")));
                }
            }

            Add(a, b) => a.evaluer(var, x)? + b.evaluer(var, x)?,
            Sub(a, b) => a.evaluer(var, x)? - b.evaluer(var, x)?,
            Mul(a, b) => a.evaluer(var, x)? * b.evaluer(var, x)?,
            Div(a, b) => {
                let n = a.evaluer(var, x)?;
                let d = b.evaluer(var, x)?;
                if d == 0.0 {
                    return Err(ErreurNoyau::evaluation(format!("division par zéro en {var} = {x}")));
                }
                n / d
            }

            Pow(base, exposant) => {
                let vb = base.evaluer(var, x)?;
                // exposant entier connu : powi (exact pour les bases négatives)
                if let Some(k) = exposant.as_rat().and_then(entier_i64) {
                    if vb == 0.0 && k < 0 {
                        return Err(ErreurNoyau::evaluation(format!("division par zéro en {var} = {x}")));
                    }
                    match i32::try_from(k) {
                        Ok(k) => vb.powi(k),
                        Err(_) => vb.powf(k as f64),
                    }
                } else {
                    let ve = exposant.evaluer(var, x)?;
                    if vb < 0.0 && ve.fract() != 0.0 {
                        return Err(ErreurNoyau::evaluation(format!(
                            "base négative ({vb}) à exposant non entier ({ve}) en {var} = {x}"
                        )));
                    }
                    if vb == 0.0 && ve < 0.0 {
                        return Err(ErreurNoyau::evaluation(format!("division par zéro en {var} = {x}")));
                    }
                    vb.powf(ve)
                }
            }

            Sqrt(u) => {
                let vu = u.evaluer(var, x)?;
                if vu < 0.0 {
                    return Err(ErreurNoyau::evaluation(format!("√ d’un négatif ({vu}) en {var} = {x}")));
                }
                vu.sqrt()
            }
            Ln(u) => {
                let vu = u.evaluer(var, x)?;
                if vu <= 0.0 {
                    return Err(ErreurNoyau::evaluation(format!("ln({vu}) indéfini en {var} = {x}")));
                }
                vu.ln()
            }

            Sin(u) => u.evaluer(var, x)?.sin(),
            Cos(u) => u.evaluer(var, x)?.cos(),
            Tan(u) => u.evaluer(var, x)?.tan(),
            Exp(u) => u.evaluer(var, x)?.exp(),
            Abs(u) => u.evaluer(var, x)?.abs(),
        };

        if !v.is_finite() {
            return Err(ErreurNoyau::evaluation(format!("valeur non finie en {var} = {x}")));
        }
        Ok(v)
    }

    /* ------------------------ Évaluation complexe (formes closes) ------------------------ */

    /// Évalue une expression CONSTANTE dans ℂ (branches principales).
    /// Sert à classer une forme close : réelle, ou complexe (ex: (-1)^(3/2)).
    pub fn evaluer_complexe(&self) -> Result<Complex64, ErreurNoyau> {
        self.complexe(None)
    }

    /// Évaluation dans ℂ en `var = x` (x réel) : √ et ln des négatifs sont définis,
    /// seuls les pôles (division par zéro, ln 0) échouent.
    pub fn evaluer_complexe_en(&self, var: &str, x: f64) -> Result<Complex64, ErreurNoyau> {
        self.complexe(Some((var, x)))
    }

    fn complexe(&self, point: Option<(&str, f64)>) -> Result<Complex64, ErreurNoyau> {
        use Expr::*;

        let z = match self {
            Rat(r) => Complex64::new(rat_vers_f64(r), 0.0),
            Pi => Complex64::new(consts::PI, 0.0),
            E => Complex64::new(consts::E, 0.0),
            Var(nom) => match point {
                Some((v, x)) if v == nom => Complex64::new(x, 0.0),
                _ => return Err(ErreurNoyau::evaluation(format!("symbole libre '{nom}'"))),
            },

            Add(a, b) => a.complexe(point)? + b.complexe(point)?,
            Sub(a, b) => a.complexe(point)? - b.complexe(point)?,
            Mul(a, b) => a.complexe(point)? * b.complexe(point)?,
            Div(a, b) => {
                let d = b.complexe(point)?;
                if d.norm() == 0.0 {
                    return Err(ErreurNoyau::evaluation("division par zéro"));
                }
                a.complexe(point)? / d
            }

            Pow(base, exposant) => {
                let zb = base.complexe(point)?;
                let ze = exposant.complexe(point)?;
                if zb.norm() == 0.0 {
                    if ze.re > 0.0 {
                        Complex64::new(0.0, 0.0)
                    } else {
                        return Err(ErreurNoyau::evaluation("division par zéro (0 à exposant ≤ 0)"));
                    }
                } else if ze.im == 0.0 && ze.re.fract() == 0.0 && ze.re.abs() <= i32::MAX as f64 {
                    zb.powi(ze.re as i32)
                } else if zb.im == 0.0 && zb.re > 0.0 && ze.im == 0.0 {
                    Complex64::new(zb.re.powf(ze.re), 0.0)
                } else {
                    (zb.ln() * ze).exp()
                }
            }

            Sqrt(u) => u.complexe(point)?.sqrt(),
            Ln(u) => {
                let zu = u.complexe(point)?;
                if zu.norm() == 0.0 {
                    return Err(ErreurNoyau::evaluation("ln(0) indéfini"));
                }
                zu.ln()
            }
            Sin(u) => u.complexe(point)?.sin(),
            Cos(u) => u.complexe(point)?.cos(),
            Tan(u) => u.complexe(point)?.tan(),
            Exp(u) => u.complexe(point)?.exp(),
            Abs(u) => Complex64::new(u.complexe(point)?.norm(), 0.0),
        };

        if !z.re.is_finite() || !z.im.is_finite() {
            return Err(ErreurNoyau::evaluation("valeur non finie"));
        }
        Ok(z)
    }

    /* ------------------------ Dérivation symbolique ------------------------ */

    /// d/d`var`, simplifiée.
    pub fn derivee(&self, var: &str) -> Expr {
        use Expr::*;

        let zero = || Expr::entier(0);
        let d = match self {
            Rat(_) | Pi | E => zero(),
            Var(v) => {
                if v == var {
                    Expr::entier(1)
                } else {
                    zero()
                }
            }

            Add(a, b) => a.derivee(var) + b.derivee(var),
            Sub(a, b) => a.derivee(var) - b.derivee(var),
            Mul(a, b) => a.derivee(var) * (**b).clone() + (**a).clone() * b.derivee(var),
            Div(a, b) => {
                let num = a.derivee(var) * (**b).clone() - (**a).clone() * b.derivee(var);
                num / (**b).clone().puissance(Expr::entier(2))
            }

            Pow(base, exposant) => {
                let b = (**base).clone();
                let e = (**exposant).clone();
                if !exposant.contient_var(var) {
                    // e * b^(e-1) * b'
                    e.clone() * b.clone().puissance(e - Expr::entier(1)) * base.derivee(var)
                } else if !base.contient_var(var) {
                    // b^e * ln(b) * e'
                    self.clone() * Ln(Box::new(b)) * exposant.derivee(var)
                } else {
                    // b^e * (e' ln b + e b'/b)
                    self.clone()
                        * (exposant.derivee(var) * Ln(Box::new(b.clone()))
                            + e * base.derivee(var) / b)
                }
            }

            Sqrt(u) => u.derivee(var) / (Expr::entier(2) * Sqrt(u.clone())),
            Sin(u) => Cos(u.clone()) * u.derivee(var),
            Cos(u) => -(Sin(u.clone()) * u.derivee(var)),
            Tan(u) => u.derivee(var) / Cos(u.clone()).puissance(Expr::entier(2)),
            Exp(u) => Exp(u.clone()) * u.derivee(var),
            Ln(u) => u.derivee(var) / (**u).clone(),
            Abs(u) => u.derivee(var) * (**u).clone() / Abs(u.clone()),
        };
        d.simplify()
    }
}

/* ------------------------ Affichage debug (pas “joli” final) ------------------------ */

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Expr::*;
        match self {
            Rat(r) => {
                let n = r.numer();
                let d = r.denom();
                if d.is_one() {
                    write!(f, "{n}")
                } else {
                    write!(f, "{n}/{d}")
                }
            }
            Pi => write!(f, "π"),
            E => write!(f, "e"),
            Var(s) => write!(f, "{s}"),
            Sqrt(x) => write!(f, "√({x})"),
            Pow(x, n) => write!(f, "({x})^({n})"),
            Sin(x) => write!(f, "sin({x})"),
            Cos(x) => write!(f, "cos({x})"),
            Tan(x) => write!(f, "tan({x})"),
            Exp(x) => write!(f, "exp({x})"),
            Ln(x) => write!(f, "ln({x})"),
            Abs(x) => write!(f, "|{x}|"),
            Add(a, b) => write!(f, "({a}+{b})"),
            Sub(a, b) => write!(f, "({a}-{b})"),
            Mul(a, b) => write!(f, "({a}*{b})"),
            Div(a, b) => write!(f, "({a}/{b})"),
        }
    }
}

/* ------------------------ Outils rationnels (utilisés par simplify) ------------------------ */

pub(crate) fn rat_vers_f64(r: &BigRational) -> f64 {
    r.to_f64().unwrap_or(f64::NAN)
}

/// Rationnel entier qui tient dans un i64.
pub(crate) fn entier_i64(r: &BigRational) -> Option<i64> {
    if !r.is_integer() {
        return None;
    }
    r.numer().to_i64()
}

pub(crate) fn rational_pow_int(base: BigRational, exp: i64) -> BigRational {
    if exp == 0 {
        return BigRational::one();
    }
    if exp < 0 {
        let pos = rational_pow_int(base.clone(), -exp);
        return BigRational::one() / pos;
    }

    let mut e = exp as u64;
    let mut acc = BigRational::one();
    let mut b = base;

    while e > 0 {
        if (e & 1) == 1 {
            acc *= b.clone();
        }
        e >>= 1;
        if e > 0 {
            b *= b.clone();
        }
    }
    acc
}

pub(crate) fn rational_sqrt_exact(r: &BigRational) -> Option<BigRational> {
    if r.is_negative() {
        return None;
    }
    let n = r.numer();
    let d = r.denom();
    let sn = int_sqrt_exact(n)?;
    let sd = int_sqrt_exact(d)?;
    Some(BigRational::new(sn, sd))
}

fn int_sqrt_exact(x: &BigInt) -> Option<BigInt> {
    if x.is_negative() {
        return None;
    }
    let s = int_sqrt_floor(x);
    if &s * &s == *x {
        Some(s)
    } else {
        None
    }
}

fn int_sqrt_floor(x: &BigInt) -> BigInt {
    if x.is_zero() || x.is_negative() {
        return BigInt::zero();
    }

    let mut y = approx_sqrt_start(x);
    loop {
        let y_next = (&y + (x / &y)) >> 1;
        if y_next >= y {
            let mut z = y_next;
            while (&z + 1u32) * (&z + 1u32) <= *x {
                z += 1u32;
            }
            while &z * &z > *x {
                z -= 1u32;
            }
            return z;
        }
        y = y_next;
    }
}

fn approx_sqrt_start(x: &BigInt) -> BigInt {
    let bits = x.bits();
    let half = bits.div_ceil(2);
    BigInt::one() << half
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn simplify_rationnels_et_neutres() {
        let e = (Expr::fraction(1, 2) + Expr::fraction(1, 3)).simplify();
        assert_eq!(e, Expr::fraction(5, 6));

        let e = (x() * Expr::entier(1) + Expr::entier(0)).simplify();
        assert_eq!(e, x());

        let e = (x() - x()).simplify();
        assert_eq!(e, Expr::entier(0));
    }

    #[test]
    fn simplify_constante_devant() {
        // (x*2)*3 => 6*x
        let e = ((x() * Expr::entier(2)) * Expr::entier(3)).simplify();
        assert_eq!(e, Expr::entier(6) * x());
    }

    #[test]
    fn simplify_signes() {
        // (-x)*(-x) => x*x
        let e = ((-x()) * (-x())).simplify();
        assert_eq!(e, x() * x());
        // a - (-b) => a + b
        let e = (x() - (-Expr::Pi)).simplify();
        assert_eq!(e, x() + Expr::Pi);
    }

    #[test]
    fn simplify_puissances() {
        assert_eq!(Expr::entier(2).puissance(Expr::entier(10)).simplify(), Expr::entier(1024));
        assert_eq!(Expr::entier(4).puissance(Expr::fraction(1, 2)).simplify(), Expr::entier(2));
        assert_eq!(x().puissance(Expr::entier(1)).simplify(), x());
        assert_eq!(Expr::E.puissance(x()).simplify(), Expr::Exp(Box::new(x())));
        // 0^-1 reste symbolique (pas de valeur inventée)
        let e = Expr::entier(0).puissance(Expr::entier(-1)).simplify();
        assert!(matches!(e, Expr::Pow(_, _)));
    }

    #[test]
    fn evaluer_carre() {
        let e = x().puissance(Expr::entier(2));
        assert_eq!(e.evaluer("x", 3.0).unwrap(), 9.0);
    }

    #[test]
    fn evaluer_erreurs_de_domaine() {
        let inv = Expr::entier(1) / x();
        assert!(matches!(inv.evaluer("x", 0.0), Err(ErreurNoyau::EvaluationNumerique(_))));

        let racine = x().puissance(Expr::fraction(1, 2));
        assert!(racine.evaluer("x", -1.0).is_err());
        assert!(Expr::Ln(Box::new(x())).evaluer("x", 0.0).is_err());
        assert!(Expr::Sqrt(Box::new(x())).evaluer("x", -4.0).is_err());

        // base négative, exposant entier : défini
        assert_eq!(x().puissance(Expr::entier(3)).evaluer("x", -2.0).unwrap(), -8.0);
    }

    #[test]
    fn evaluer_symbole_libre() {
        let e = x() + Expr::var("y");
        assert!(e.evaluer("x", 1.0).is_err());
    }

    #[test]
    fn complexe_branche_principale() {
        // (-1)^(3/2) = -i (branche principale)
        let e = Expr::entier(-1).puissance(Expr::fraction(3, 2));
        let z = e.evaluer_complexe().unwrap();
        assert_abs_diff_eq!(z.re, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z.im, -1.0, epsilon = 1e-12);

        // (-2)^3 reste réel
        let z = Expr::entier(-2).puissance(Expr::entier(3)).evaluer_complexe().unwrap();
        assert_eq!(z, Complex64::new(-8.0, 0.0));
    }

    #[test]
    fn derivees_usuelles() {
        let f = x().puissance(Expr::entier(3));
        let d = f.derivee("x");
        assert_abs_diff_eq!(d.evaluer("x", 2.0).unwrap(), 12.0, epsilon = 1e-12);

        let f = Expr::Sin(Box::new(Expr::entier(2) * x()));
        let d = f.derivee("x");
        assert_abs_diff_eq!(d.evaluer("x", 0.3).unwrap(), 2.0 * (0.6f64).cos(), epsilon = 1e-12);

        let f = Expr::entier(3).puissance(x());
        let d = f.derivee("x");
        assert_abs_diff_eq!(
            d.evaluer("x", 1.5).unwrap(),
            3f64.powf(1.5) * 3f64.ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn substitution() {
        let f = x() * x() + Expr::entier(1);
        let g = f.substituer("x", &Expr::entier(3)).simplify();
        assert_eq!(g, Expr::entier(10));
    }

    #[test]
    fn contient_var_et_constante() {
        let f = Expr::Sin(Box::new(x())) + Expr::Pi;
        assert!(f.contient_var("x"));
        assert!(!f.contient_var("y"));
        assert!(!f.est_constante());
        assert!((Expr::Pi * Expr::E).est_constante());
    }
}
