// src/noyau/format.rs

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::expr::Expr;
use super::primitive::ValeurSymbolique;

// Niveaux de priorité du rendu (plus grand = plus liant)
const P_ADD: u8 = 1;
const P_MUL: u8 = 2;
const P_NEG: u8 = 3;
const P_POW: u8 = 4;
const P_ATOME: u8 = 5;

/* ------------------------ Helpers rationnels ------------------------ */

pub fn format_rat_pretty(r: &BigRational) -> String {
    let n = r.numer();
    let d = r.denom();
    if d.is_one() {
        format!("{n}")
    } else {
        format!("{n}/{d}")
    }
}

fn prio_rat(r: &BigRational) -> u8 {
    if !r.is_integer() {
        P_MUL
    } else if r.is_negative() {
        P_NEG
    } else {
        P_ATOME
    }
}

fn format_sqrt_of_int(n: &BigInt) -> String {
    format!("√{n}")
}

/// (p/q)*√n -> p√n/q ; √n/q si p=1 ; -√n/q si p=-1
fn format_mul_rat_sqrt(r: &BigRational, n: &BigInt) -> String {
    let p = r.numer();
    let q = r.denom();

    if p.is_zero() {
        return "0".to_string();
    }

    let tete = if p.is_one() {
        String::new()
    } else if *p == BigInt::from(-1) {
        "-".to_string()
    } else {
        format!("{p}")
    };

    if q.is_one() {
        format!("{tete}{}", format_sqrt_of_int(n))
    } else {
        format!("{tete}{}/{q}", format_sqrt_of_int(n))
    }
}

/// Tente de reconnaître √(entier) et renvoie cet entier (n) si oui.
fn as_sqrt_of_int(e: &Expr) -> Option<&BigInt> {
    if let Expr::Sqrt(inner) = e {
        if let Expr::Rat(r) = inner.as_ref() {
            if r.denom().is_one() {
                return Some(r.numer());
            }
        }
    }
    None
}

fn parens_si(s: String, besoin: bool) -> String {
    if besoin {
        format!("({s})")
    } else {
        s
    }
}

/* ------------------------ Affichage “joli” ------------------------ */

/// Formate l’expression en privilégiant une sortie lisible et relisible:
/// - √2/2, -√3/3, 3√5
/// - parenthèses seulement si la priorité l’exige
pub fn format_expr_pretty(e: &Expr) -> String {
    pretty(e).0
}

fn pretty(e: &Expr) -> (String, u8) {
    use Expr::*;

    match e {
        Rat(r) => (format_rat_pretty(r), prio_rat(r)),
        Pi => ("π".to_string(), P_ATOME),
        E => ("e".to_string(), P_ATOME),
        Var(s) => (s.clone(), P_ATOME),

        // √2, √3, etc. si argument entier
        Sqrt(x) => match as_sqrt_of_int(e) {
            Some(n) => (format_sqrt_of_int(n), P_ATOME),
            None => (format!("√({})", pretty(x).0), P_ATOME),
        },

        Pow(x, n) => {
            let (sx, px) = pretty(x);
            let (sn, pn) = pretty(n);
            (
                format!("{}^{}", parens_si(sx, px <= P_POW), parens_si(sn, pn < P_POW)),
                P_POW,
            )
        }

        Sin(x) => (format!("sin({})", pretty(x).0), P_ATOME),
        Cos(x) => (format!("cos({})", pretty(x).0), P_ATOME),
        Tan(x) => (format!("tan({})", pretty(x).0), P_ATOME),
        Exp(x) => (format!("exp({})", pretty(x).0), P_ATOME),
        Ln(x) => (format!("ln({})", pretty(x).0), P_ATOME),
        Abs(x) => (format!("|{}|", pretty(x).0), P_ATOME),

        Mul(a, b) => {
            // cas joli : (p/q)*√n => p√n/q (donc √2/2, √3/3, etc.)
            if let (Rat(r), Some(n)) = (a.as_ref(), as_sqrt_of_int(b)) {
                let s = format_mul_rat_sqrt(r, n);
                let p = if s.contains('/') || s.starts_with('-') { P_MUL } else { P_ATOME };
                return (s, p);
            }

            let (sa, pa) = pretty(a);
            let (sb, pb) = pretty(b);
            let droite = pb < P_MUL || sb.starts_with('-');
            (format!("{}*{}", parens_si(sa, pa < P_MUL), parens_si(sb, droite)), P_MUL)
        }

        Div(a, b) => {
            let (sa, pa) = pretty(a);
            let (sb, pb) = pretty(b);
            (format!("{}/{}", parens_si(sa, pa < P_MUL), parens_si(sb, pb <= P_MUL)), P_MUL)
        }

        Add(a, b) => {
            let sa = pretty(a).0;
            // a + (-k) => a - k
            if let Rat(r) = b.as_ref() {
                if r.is_negative() {
                    return (format!("{sa} - {}", format_rat_pretty(&-r)), P_ADD);
                }
            }
            let (sb, pb) = pretty(b);
            (format!("{sa} + {}", parens_si(sb.clone(), pb <= P_ADD || sb.starts_with('-'))), P_ADD)
        }

        // 0 - x => -x (rendu propre), sinon affichage normal
        Sub(a, b) => {
            let (sb, pb) = pretty(b);
            let besoin = pb <= P_ADD || sb.starts_with('-');
            let sb = parens_si(sb, besoin);
            if a.est_zero() {
                (format!("-{sb}"), P_NEG)
            } else {
                (format!("{} - {sb}", pretty(a).0), P_ADD)
            }
        }
    }
}

/* ------------------------ LaTeX ------------------------ */

/// Source LaTeX de l’expression (affichée telle quelle, à copier).
pub fn format_latex(e: &Expr) -> String {
    latex(e).0
}

fn tex_parens(s: String, besoin: bool) -> String {
    if besoin {
        format!("\\left({s}\\right)")
    } else {
        s
    }
}

fn latex_rat(r: &BigRational) -> String {
    let n = r.numer();
    let d = r.denom();
    if d.is_one() {
        format!("{n}")
    } else if n.is_negative() {
        format!("-\\frac{{{}}}{{{d}}}", -n)
    } else {
        format!("\\frac{{{n}}}{{{d}}}")
    }
}

fn latex(e: &Expr) -> (String, u8) {
    use Expr::*;

    let fonction = |nom: &str, x: &Expr| (format!("\\{nom}\\left({}\\right)", latex(x).0), P_ATOME);

    match e {
        Rat(r) => (latex_rat(r), if r.is_negative() { P_NEG } else { P_ATOME }),
        Pi => ("\\pi".to_string(), P_ATOME),
        E => ("e".to_string(), P_ATOME),
        Var(s) => (s.clone(), P_ATOME),

        Sqrt(x) => (format!("\\sqrt{{{}}}", latex(x).0), P_ATOME),
        Pow(x, n) => {
            let (sx, px) = latex(x);
            (format!("{{{}}}^{{{}}}", tex_parens(sx, px <= P_POW), latex(n).0), P_POW)
        }

        Sin(x) => fonction("sin", x),
        Cos(x) => fonction("cos", x),
        Tan(x) => fonction("tan", x),
        Ln(x) => fonction("ln", x),
        Exp(x) => (format!("e^{{{}}}", latex(x).0), P_POW),
        Abs(x) => (format!("\\left|{}\\right|", latex(x).0), P_ATOME),

        Mul(a, b) => {
            let (sa, pa) = latex(a);
            let (sb, pb) = latex(b);
            let droite = pb < P_MUL || sb.starts_with('-');
            (
                format!("{} \\cdot {}", tex_parens(sa, pa < P_MUL), tex_parens(sb, droite)),
                P_MUL,
            )
        }
        Div(a, b) => (format!("\\frac{{{}}}{{{}}}", latex(a).0, latex(b).0), P_ATOME),

        Add(a, b) => {
            let (sb, pb) = latex(b);
            (format!("{} + {}", latex(a).0, tex_parens(sb.clone(), pb <= P_ADD || sb.starts_with('-'))), P_ADD)
        }
        Sub(a, b) => {
            let (sb, pb) = latex(b);
            let besoin = pb <= P_ADD || sb.starts_with('-');
            let sb = tex_parens(sb, besoin);
            if a.est_zero() {
                (format!("-{sb}"), P_NEG)
            } else {
                (format!("{} - {sb}", latex(a).0), P_ADD)
            }
        }
    }
}

/// ∫_a^b f(x) dx = valeur, en LaTeX.
pub fn format_integrale_latex(f: &Expr, variable: &str, a: f64, b: f64, valeur: &ValeurSymbolique) -> String {
    format!(
        "\\int_{{{a}}}^{{{b}}} {} \\, d{variable} = {}",
        format_latex(f),
        format_valeur_latex(valeur)
    )
}

/* ------------------------ Valeurs symboliques ------------------------ */

/// Rendu texte d’un résultat symbolique.
pub fn format_valeur(v: &ValeurSymbolique) -> String {
    match v {
        ValeurSymbolique::Constante(r) => format_rat_pretty(r),
        ValeurSymbolique::FormeFermee(e) => format_expr_pretty(e),
        ValeurSymbolique::NonEvaluee { integrande, variable, a, b } => {
            format!("∫[{a}, {b}] {} d{variable} (non évaluée)", format_expr_pretty(integrande))
        }
        ValeurSymbolique::Complexe { forme, valeur } => {
            format!("{} ≈ {} {} {}i", format_expr_pretty(forme), valeur.re, signe(valeur.im), valeur.im.abs())
        }
    }
}

fn format_valeur_latex(v: &ValeurSymbolique) -> String {
    match v {
        ValeurSymbolique::Constante(r) => latex_rat(r),
        ValeurSymbolique::FormeFermee(e) | ValeurSymbolique::Complexe { forme: e, .. } => format_latex(e),
        ValeurSymbolique::NonEvaluee { integrande, variable, a, b } => {
            format!("\\int_{{{a}}}^{{{b}}} {} \\, d{variable}", format_latex(integrande))
        }
    }
}

fn signe(x: f64) -> char {
    if x.is_sign_negative() {
        '-'
    } else {
        '+'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn rendu_puissances_et_negation() {
        assert_eq!(format_expr_pretty(&(-(x().puissance(Expr::entier(2))))), "-x^2");
        assert_eq!(format_expr_pretty(&(-x()).puissance(Expr::entier(2))), "(-x)^2");
        assert_eq!(format_expr_pretty(&x().puissance(Expr::fraction(1, 2))), "x^(1/2)");
        assert_eq!(format_expr_pretty(&x().puissance(Expr::entier(-1))), "x^(-1)");
    }

    #[test]
    fn rendu_parentheses_minimales() {
        let e = (x() + Expr::entier(1)) * x();
        assert_eq!(format_expr_pretty(&e), "(x + 1)*x");
        let e = x() - (x() + Expr::entier(1));
        assert_eq!(format_expr_pretty(&e), "x - (x + 1)");
        let e = x() / (Expr::entier(2) * x());
        assert_eq!(format_expr_pretty(&e), "x/(2*x)");
        let e = x() + Expr::entier(-3);
        assert_eq!(format_expr_pretty(&e), "x - 3");
    }

    #[test]
    fn rendu_racines_jolies() {
        let s2 = Expr::Sqrt(Box::new(Expr::entier(2)));
        assert_eq!(format_expr_pretty(&(Expr::fraction(1, 2) * s2.clone())), "√2/2");
        assert_eq!(format_expr_pretty(&(Expr::fraction(-1, 3) * s2.clone())), "-√2/3");
        assert_eq!(format_expr_pretty(&(Expr::entier(3) * s2)), "3√2");
    }

    #[test]
    fn latex_usuel() {
        let e = x().puissance(Expr::entier(2)) / Expr::entier(3);
        assert_eq!(format_latex(&e), "\\frac{{x}^{2}}{3}");
        assert_eq!(format_latex(&Expr::Sin(Box::new(Expr::Pi))), "\\sin\\left(\\pi\\right)");
        assert_eq!(latex_rat(&BigRational::new(BigInt::from(-1), BigInt::from(3))), "-\\frac{1}{3}");
    }

    #[test]
    fn latex_integrale() {
        let v = ValeurSymbolique::Constante(BigRational::new(BigInt::from(1), BigInt::from(3)));
        let s = format_integrale_latex(&x().puissance(Expr::entier(2)), "x", 0.0, 1.0, &v);
        assert_eq!(s, "\\int_{0}^{1} {x}^{2} \\, dx = \\frac{1}{3}");
    }
}
