//! Noyau — intégrale définie symbolique
//!
//! Recherche de primitive par règles (bornée), puis F(b) - F(a) :
//! - intégrande polynomial : primitive exacte, bornes relues exactement => Constante
//! - sinon : linéarité, constantes, puissances / inverses / exp / c^u / trig / √ / ln / |·|
//!   d’une forme affine u = αx + β, après développement si besoin
//! - aucune règle : intégrale laissée NON ÉVALUÉE (résultat valide, pas une erreur)
//!
//! Garde-fous (SAFE):
//! - budget d’étapes (épuisé => erreur d’intégration)
//! - pôle à l’intérieur de ]a, b[ => erreur d’intégration (pas de valeur inventée)
//! - singularité à une borne : F y est prise en limite ; limite infinie => divergente
//! - primitive re-dérivée et comparée à l’intégrande en des points de contrôle

use log::debug;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use super::analyse::{Fonction, Intervalle};
use super::erreurs::ErreurNoyau;
use super::expr::{rat_vers_f64, Expr};
use super::jetons::f64_exact;
use super::polynome::Polynome;
use super::reglages::ReglagesSymbolique;
use super::riemann::linspace;

/// Garde-fou : taille maximale d’une expression développée.
const MAX_NOEUDS_DEVELOPPEMENT: usize = 4000;

/// Exposant entier maximal développé par multiplication répétée.
const MAX_EXPOSANT_DEVELOPPE: i64 = 8;

/// Résultat symbolique d’une intégrale définie.
#[derive(Clone, Debug, PartialEq)]
pub enum ValeurSymbolique {
    /// Rationnel exact (ex: 1/3).
    Constante(BigRational),
    /// Forme close réelle (ex: e - 1).
    FormeFermee(Expr),
    /// Aucune primitive trouvée : l’intégrale reste sous forme ∫.
    NonEvaluee {
        integrande: Expr,
        variable: String,
        a: f64,
        b: f64,
    },
    /// Forme close à valeur complexe (ex: ∫_{-1}^0 √x dx = 2i/3).
    Complexe { forme: Expr, valeur: Complex64 },
}

impl ValeurSymbolique {
    /// Conversion en réel ; échoue (Coercion) si le résultat n’est pas un nombre réel.
    pub fn vers_f64(&self) -> Result<f64, ErreurNoyau> {
        match self {
            ValeurSymbolique::Constante(r) => Ok(rat_vers_f64(r)),
            ValeurSymbolique::FormeFermee(e) => {
                let z = e
                    .evaluer_complexe()
                    .map_err(|err| ErreurNoyau::Coercion(err.to_string()))?;
                if est_reel(z) {
                    Ok(z.re)
                } else {
                    Err(ErreurNoyau::Coercion(format!("valeur complexe {z}")))
                }
            }
            ValeurSymbolique::NonEvaluee { .. } => {
                Err(ErreurNoyau::Coercion("intégrale non évaluée".to_string()))
            }
            ValeurSymbolique::Complexe { valeur, .. } => {
                Err(ErreurNoyau::Coercion(format!("valeur complexe {valeur}")))
            }
        }
    }
}

fn est_reel(z: Complex64) -> bool {
    z.im.abs() <= 1e-12 * z.re.abs().max(1.0)
}

/* ------------------------ Recherche de primitive ------------------------ */

struct Recherche<'a> {
    var: &'a str,
    budget: usize,
}

impl Recherche<'_> {
    fn etape(&mut self) -> Result<(), ErreurNoyau> {
        if self.budget == 0 {
            return Err(ErreurNoyau::Integration(
                "budget de calcul symbolique épuisé".to_string(),
            ));
        }
        self.budget -= 1;
        Ok(())
    }

    fn x(&self) -> Expr {
        Expr::var(self.var)
    }

    /// u = αx + β (α constant non nul) => Some(α)
    fn lineaire(&self, u: &Expr) -> Option<Expr> {
        if !u.contient_var(self.var) {
            return None;
        }
        let alpha = u.derivee(self.var);
        if alpha.contient_var(self.var) || alpha.est_zero() {
            return None;
        }
        Some(alpha)
    }

    /// Primitive de `e` (None : aucune règle ne s’applique).
    fn primitive(&mut self, e: &Expr) -> Result<Option<Expr>, ErreurNoyau> {
        use Expr::*;

        self.etape()?;

        if !e.contient_var(self.var) {
            return Ok(Some(e.clone() * self.x()));
        }
        if let Some(p) = Polynome::depuis_expr(e, self.var) {
            return Ok(Some(p.primitive().vers_expr(self.var)));
        }

        let directe = match e {
            Add(a, b) => match (self.primitive(a)?, self.primitive(b)?) {
                (Some(fa), Some(fb)) => Some(fa + fb),
                _ => None,
            },
            Sub(a, b) => match (self.primitive(a)?, self.primitive(b)?) {
                (Some(fa), Some(fb)) => Some(fa - fb),
                _ => None,
            },

            Mul(c, u) if !c.contient_var(self.var) => self.primitive(u)?.map(|fu| (**c).clone() * fu),
            Mul(u, c) if !c.contient_var(self.var) => self.primitive(u)?.map(|fu| fu * (**c).clone()),
            Div(u, c) if !c.contient_var(self.var) => self.primitive(u)?.map(|fu| fu / (**c).clone()),

            // c/u^k = c·u^(-k), c/√u = c·u^(-1/2)
            Div(c, d) if !c.contient_var(self.var) && inverse_puissance(d).is_some() => {
                match inverse_puissance(d) {
                    Some(inv) => self.primitive(&((**c).clone() * inv).simplify())?,
                    None => None,
                }
            }
            // c/u = c·u^(-1)
            Div(c, u) if !c.contient_var(self.var) => self
                .lineaire(u)
                .map(|alpha| (**c).clone() * Ln(Box::new(Abs(u.clone()))) / alpha),

            Pow(u, k) if !k.contient_var(self.var) => self.lineaire(u).map(|alpha| {
                if matches!(k.as_ref(), Rat(r) if *r == -BigRational::from_integer(1.into())) {
                    Ln(Box::new(Abs(u.clone()))) / alpha
                } else {
                    let k1 = ((**k).clone() + Expr::entier(1)).simplify();
                    (**u).clone().puissance(k1.clone()) / (k1 * alpha)
                }
            }),

            // c^u = exp(u ln c)
            Pow(c, u) if !c.contient_var(self.var) => self
                .lineaire(u)
                .map(|alpha| e.clone() / (alpha * Ln(c.clone()))),

            Exp(u) => self.lineaire(u).map(|alpha| e.clone() / alpha),
            Sin(u) => self.lineaire(u).map(|alpha| -(Cos(u.clone()) / alpha)),
            Cos(u) => self.lineaire(u).map(|alpha| Sin(u.clone()) / alpha),
            Tan(u) => self
                .lineaire(u)
                .map(|alpha| -(Ln(Box::new(Abs(Box::new(Cos(u.clone()))))) / alpha)),
            Sqrt(u) => self.lineaire(u).map(|alpha| {
                Expr::fraction(2, 3) * ((**u).clone() * Sqrt(u.clone())) / alpha
            }),
            Ln(u) => self
                .lineaire(u)
                .map(|alpha| ((**u).clone() * Ln(u.clone()) - (**u).clone()) / alpha),
            Abs(u) => self
                .lineaire(u)
                .map(|alpha| (**u).clone() * Abs(u.clone()) / (Expr::entier(2) * alpha)),

            _ => None,
        };

        if directe.is_some() {
            return Ok(directe.map(Expr::simplify));
        }

        // dernier recours : développer (produits, puissances entières, exponentielles de même base)
        let developpe = self.developper(e)?;
        if developpe != *e && developpe.taille(MAX_NOEUDS_DEVELOPPEMENT) < MAX_NOEUDS_DEVELOPPEMENT {
            return self.primitive(&developpe);
        }
        Ok(None)
    }

    /* ------------------------ Développement ------------------------ */

    fn developper(&mut self, e: &Expr) -> Result<Expr, ErreurNoyau> {
        use Expr::*;

        self.etape()?;

        let d = match e {
            Add(a, b) => self.developper(a)? + self.developper(b)?,
            Sub(a, b) => self.developper(a)? - self.developper(b)?,
            Mul(a, b) => {
                let da = self.developper(a)?;
                let db = self.developper(b)?;
                self.produit(da, db)?
            }
            Div(a, c) if !c.contient_var(self.var) => {
                let da = self.developper(a)?;
                self.produit(da, Expr::entier(1) / (**c).clone())?
            }
            Pow(u, k) if u.contient_var(self.var) => match k.as_ref() {
                Rat(r) if r.is_integer() && r.is_positive() && *r <= BigRational::from_integer(MAX_EXPOSANT_DEVELOPPE.into()) => {
                    let du = self.developper(u)?;
                    let mut acc = du.clone();
                    let mut reste = r.clone() - BigRational::from_integer(1.into());
                    while !reste.is_zero() {
                        acc = self.produit(acc, du.clone())?;
                        reste -= BigRational::from_integer(1.into());
                    }
                    acc
                }
                _ => e.clone(),
            },
            _ => e.clone(),
        };
        Ok(d.simplify())
    }

    /// a·b distribué sur les sommes, exponentielles de même base fusionnées.
    fn produit(&mut self, a: Expr, b: Expr) -> Result<Expr, ErreurNoyau> {
        use Expr::*;

        self.etape()?;

        let r = match (a, b) {
            (Add(p, q), b) => {
                let gauche = self.produit(*p, b.clone())?;
                let droite = self.produit(*q, b)?;
                gauche + droite
            }
            (Sub(p, q), b) => {
                let gauche = self.produit(*p, b.clone())?;
                let droite = self.produit(*q, b)?;
                gauche - droite
            }
            (a, Add(p, q)) => {
                let gauche = self.produit(a.clone(), *p)?;
                let droite = self.produit(a, *q)?;
                gauche + droite
            }
            (a, Sub(p, q)) => {
                let gauche = self.produit(a.clone(), *p)?;
                let droite = self.produit(a, *q)?;
                gauche - droite
            }

            // constantes sorties en tête : (k·X)·Y => k·(X·Y)
            (Mul(k, x), b) if !k.contient_var(self.var) => *k * self.produit(*x, b)?,
            (a, Mul(k, y)) if !k.contient_var(self.var) => *k * self.produit(a, *y)?,

            // c^u · c^v => c^(u+v)
            (Pow(c1, u), Pow(c2, v)) if c1 == c2 && !c1.contient_var(self.var) => {
                Pow(c1, Box::new(*u + *v))
            }
            (Exp(u), Exp(v)) => Exp(Box::new(*u + *v)),

            (a, b) => a * b,
        };

        if r.taille(MAX_NOEUDS_DEVELOPPEMENT) >= MAX_NOEUDS_DEVELOPPEMENT {
            return Err(ErreurNoyau::Integration("développement trop volumineux".to_string()));
        }
        Ok(r.simplify())
    }
}

/// 1/√u => u^(-1/2), 1/u^k => u^(-k) (k constant).
fn inverse_puissance(d: &Expr) -> Option<Expr> {
    match d {
        Expr::Sqrt(u) => Some((**u).clone().puissance(Expr::fraction(-1, 2))),
        Expr::Pow(u, k) if k.as_rat().is_some() => {
            Some((**u).clone().puissance((-(**k).clone()).simplify()))
        }
        _ => None,
    }
}

/// Primitive de f (sans constante), None si aucune règle ne s’applique.
pub fn primitive(f: &Fonction, reglages: &ReglagesSymbolique) -> Result<Option<Expr>, ErreurNoyau> {
    let mut r = Recherche {
        var: &f.variable,
        budget: reglages.budget,
    };
    r.primitive(&f.expr)
}

/* ------------------------ Domaine : pôles dans [a, b] ------------------------ */

/// Sous-expressions dont l’annulation rend l’intégrande infinie (dénominateurs,
/// bases à exposant négatif, cos sous une tangente).
fn denominateurs(e: &Expr, var: &str, out: &mut Vec<Expr>) {
    use Expr::*;

    match e {
        Rat(_) | Pi | E | Var(_) => {}
        Div(a, b) => {
            if b.contient_var(var) {
                out.push((**b).clone());
            }
            denominateurs(a, var, out);
            denominateurs(b, var, out);
        }
        Pow(u, k) => {
            let negatif = !k.contient_var(var)
                && k.evaluer_complexe().is_ok_and(|z| z.re < 0.0);
            if negatif && u.contient_var(var) {
                out.push((**u).clone());
            }
            denominateurs(u, var, out);
            denominateurs(k, var, out);
        }
        Tan(u) => {
            if u.contient_var(var) {
                out.push(Cos(u.clone()));
            }
            denominateurs(u, var, out);
        }
        Sqrt(u) | Sin(u) | Cos(u) | Exp(u) | Ln(u) | Abs(u) => denominateurs(u, var, out),
        Add(a, b) | Sub(a, b) | Mul(a, b) => {
            denominateurs(a, var, out);
            denominateurs(b, var, out);
        }
    }
}

fn pole(x: f64) -> ErreurNoyau {
    ErreurNoyau::Integration(format!("intégrande non définie en x ≈ {x} (pôle dans l’intervalle)"))
}

/// Refuse un intervalle contenant un pôle INTÉRIEUR : racine rationnelle exacte d’un
/// dénominateur polynomial, changement de signe ou zéro aux points de contrôle,
/// ou échec de l’évaluation (complexe) de l’intégrande.
///
/// Les singularités aux bornes passent : la primitive y est prise en limite
/// (voir `valeur_en_borne`), une divergence y est refusée.
fn verifier_domaine(f: &Fonction, lo: f64, hi: f64, n: usize) -> Result<(), ErreurNoyau> {
    let var = f.variable.as_str();
    let mut dens = Vec::new();
    denominateurs(&f.expr, var, &mut dens);

    let interieur: Vec<f64> = linspace(lo, hi, n)
        .into_iter()
        .filter(|x| *x > lo && *x < hi)
        .collect();

    for d in &dens {
        if let Some(p) = Polynome::depuis_expr(d, var) {
            let (racines, _) = p.racines_rationnelles();
            if let Some(r) = racines
                .iter()
                .map(rat_vers_f64)
                .find(|r| *r > lo && *r < hi)
            {
                return Err(pole(r));
            }
        }

        let mut precedent: Option<f64> = None;
        for &x in &interieur {
            // hors du domaine réel : laissé à l’évaluation complexe
            let Ok(v) = d.evaluer(var, x) else {
                precedent = None;
                continue;
            };
            if v == 0.0 || precedent.is_some_and(|p| p.signum() != v.signum()) {
                return Err(pole(x));
            }
            precedent = Some(v);
        }
    }

    for &x in &interieur {
        f.expr
            .evaluer_complexe_en(var, x)
            .map_err(|_| pole(x))?;
    }
    Ok(())
}

/// F' = f aux points de contrôle (là où les deux sont définies).
fn verifier_primitive(f: &Fonction, primitive: &Expr, lo: f64, hi: f64) -> Result<(), ErreurNoyau> {
    let var = f.variable.as_str();
    let derivee = primitive.derivee(var);

    for x in linspace(lo, hi, 17) {
        let (Ok(attendu), Ok(obtenu)) = (
            f.expr.evaluer_complexe_en(var, x),
            derivee.evaluer_complexe_en(var, x),
        ) else {
            continue;
        };
        if (attendu - obtenu).norm() > 1e-6 * attendu.norm().max(1.0) {
            return Err(ErreurNoyau::Integration(format!(
                "primitive incohérente en x = {x} (F' = {obtenu}, f = {attendu})"
            )));
        }
    }
    Ok(())
}

/* ------------------------ Intégrale définie ------------------------ */

fn borne_exacte(x: f64) -> Result<Expr, ErreurNoyau> {
    f64_exact(x)
        .map(Expr::Rat)
        .ok_or(ErreurNoyau::IntervalleInvalide { a: x, b: x })
}

/// Pas (relatifs) vers l’intérieur pour une limite unilatérale en une borne.
const PAS_LIMITE: [f64; 4] = [1e-8, 1e-10, 1e-12, 1e-14];

/// F en une borne. Si F n’y est pas définie : limite unilatérale, `vers` = ±1
/// indique le côté intérieur.
/// - limite nulle => 0 exact
/// - limite finie non nulle => None (intégrale laissée non évaluée)
/// - pas de limite finie => intégrale divergente (erreur)
fn valeur_en_borne(
    prim: &Expr,
    var: &str,
    borne: &Expr,
    x: f64,
    vers: f64,
) -> Result<Option<Expr>, ErreurNoyau> {
    let valeur = prim.substituer(var, borne).simplify();
    if valeur.evaluer_complexe().is_ok() {
        return Ok(Some(valeur));
    }

    let divergente = || {
        ErreurNoyau::Integration(format!("intégrale divergente : primitive non bornée en x = {x}"))
    };
    let echelle = x.abs().max(1.0);
    let mut precedent: Option<Complex64> = None;
    let mut ecart = f64::INFINITY;
    for h in PAS_LIMITE {
        let z = prim
            .evaluer_complexe_en(var, x + vers * h * echelle)
            .map_err(|_| divergente())?;
        if !(z.re.is_finite() && z.im.is_finite()) {
            return Err(divergente());
        }
        if let Some(p) = precedent {
            ecart = (z - p).norm();
        }
        precedent = Some(z);
    }

    let Some(limite) = precedent else {
        return Err(divergente());
    };
    if ecart > 1e-5 * limite.norm().max(1.0) {
        return Err(divergente());
    }
    debug!("primitive prise en limite en x = {x} : {limite}");
    if limite.norm() <= 1e-5 {
        Ok(Some(Expr::entier(0)))
    } else {
        Ok(None)
    }
}

/// Classe F(b) - F(a) simplifiée : rationnel, forme close réelle ou complexe.
fn classer(forme: Expr) -> Result<ValeurSymbolique, ErreurNoyau> {
    if let Expr::Rat(r) = forme {
        return Ok(ValeurSymbolique::Constante(r));
    }
    let z = forme.evaluer_complexe().map_err(|err| {
        ErreurNoyau::Integration(format!("primitive indéfinie aux bornes ({err})"))
    })?;
    if est_reel(z) {
        Ok(ValeurSymbolique::FormeFermee(forme))
    } else {
        Ok(ValeurSymbolique::Complexe { forme, valeur: z })
    }
}

/// ∫_a^b f, symbolique ; renvoie aussi la primitive utilisée (si trouvée).
pub fn integrale_symbolique_detaillee(
    f: &Fonction,
    intervalle: Intervalle,
    reglages: &ReglagesSymbolique,
) -> Result<(ValeurSymbolique, Option<Expr>), ErreurNoyau> {
    if intervalle.est_degenere() {
        return Ok((ValeurSymbolique::Constante(BigRational::zero()), None));
    }

    let var = f.variable.as_str();
    let a = borne_exacte(intervalle.a)?;
    let b = borne_exacte(intervalle.b)?;

    // polynôme : tout est exact
    if let Some(p) = Polynome::depuis_expr(&f.expr, var) {
        let prim = p.primitive();
        let (Expr::Rat(ra), Expr::Rat(rb)) = (&a, &b) else {
            return Err(ErreurNoyau::Integration("bornes non rationnelles".to_string()));
        };
        let v = prim.evaluer(rb) - prim.evaluer(ra);
        return Ok((ValeurSymbolique::Constante(v), Some(prim.vers_expr(var))));
    }

    let (lo, hi) = intervalle.ordonne();
    verifier_domaine(f, lo, hi, reglages.points_controle)?;

    let Some(prim) = primitive(f, reglages)? else {
        debug!("aucune primitive pour {} : intégrale non évaluée", f.source);
        return Ok((
            ValeurSymbolique::NonEvaluee {
                integrande: f.expr.clone(),
                variable: f.variable.clone(),
                a: intervalle.a,
                b: intervalle.b,
            },
            None,
        ));
    };

    verifier_primitive(f, &prim, lo, hi)?;

    let sens = if intervalle.a <= intervalle.b { 1.0 } else { -1.0 };
    let fb = valeur_en_borne(&prim, var, &b, intervalle.b, -sens)?;
    let fa = valeur_en_borne(&prim, var, &a, intervalle.a, sens)?;
    let (Some(fb), Some(fa)) = (fb, fa) else {
        debug!("limite non nulle aux bornes pour {} : intégrale non évaluée", f.source);
        return Ok((
            ValeurSymbolique::NonEvaluee {
                integrande: f.expr.clone(),
                variable: f.variable.clone(),
                a: intervalle.a,
                b: intervalle.b,
            },
            Some(prim),
        ));
    };

    let v = classer((fb - fa).simplify())?;
    Ok((v, Some(prim)))
}

/// ∫_a^b f, symbolique.
pub fn integrale_symbolique(
    f: &Fonction,
    intervalle: Intervalle,
    reglages: &ReglagesSymbolique,
) -> Result<ValeurSymbolique, ErreurNoyau> {
    integrale_symbolique_detaillee(f, intervalle, reglages).map(|(v, _)| v)
}
