// src/noyau/jetons.rs

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use super::erreurs::ErreurNoyau;

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Num(BigRational),
    Pi,

    // Fonctions + variables + constante e (tout ce qui n’est pas pi / opérateur / nombre)
    // NOTE: le parse (RPN->Expr) décidera si c’est une fonction, une constante ou la variable.
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Caret, // ^ ou **

    // Moins unaire : produit uniquement par to_rpn (jamais par tokenize)
    Neg,

    LPar,
    RPar,
}

/// Tokenize une chaîne en jetons.
/// Supporte:
/// - nombres décimaux lus EXACTEMENT (ex: 1.893 -> 1893/1000, 1e-3 -> 1/1000)
/// - opérateurs + - * / ^ et ** (puissance, comme Python)
/// - parenthèses ( )
/// - π ou pi
/// - identifiants [a-zA-Z_][a-zA-Z0-9_]* (normalisés en minuscules)
/// - √ (équivaut à ident("sqrt"))
pub fn tokenize(s: &str) -> Result<Vec<Tok>, ErreurNoyau> {
    let mut out = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut i: usize = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Parenthèses
        if c == '(' {
            out.push(Tok::LPar);
            i += 1;
            continue;
        }
        if c == ')' {
            out.push(Tok::RPar);
            i += 1;
            continue;
        }

        // Opérateurs
        match c {
            '+' => {
                out.push(Tok::Plus);
                i += 1;
                continue;
            }
            '-' => {
                out.push(Tok::Minus);
                i += 1;
                continue;
            }
            '*' => {
                // "**" = puissance
                if i + 1 < chars.len() && chars[i + 1] == '*' {
                    out.push(Tok::Caret);
                    i += 2;
                } else {
                    out.push(Tok::Star);
                    i += 1;
                }
                continue;
            }
            '/' => {
                out.push(Tok::Slash);
                i += 1;
                continue;
            }
            '^' => {
                out.push(Tok::Caret);
                i += 1;
                continue;
            }
            _ => {}
        }

        if c == 'π' {
            out.push(Tok::Pi);
            i += 1;
            continue;
        }

        // Racine carrée unicode : √  => ident("sqrt")
        if c == '√' {
            out.push(Tok::Ident("sqrt".to_string()));
            i += 1;
            continue;
        }

        // Identifiants ASCII : [a-zA-Z_][a-zA-Z0-9_]*
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let w = word.to_lowercase();

            if w == "pi" {
                out.push(Tok::Pi);
            } else {
                out.push(Tok::Ident(w));
            }
            continue;
        }

        // Nombre : chiffres [. chiffres] [e|E [+-] chiffres]
        if c.is_ascii_digit() || (c == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit()) {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i < chars.len() && chars[i] == '.' {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }

            // exposant seulement s’il est suivi d’un chiffre (sinon "2e" = 2 puis ident e)
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    while j < chars.len() && chars[j].is_ascii_digit() {
                        j += 1;
                    }
                    i = j;
                }
            }

            let lit: String = chars[start..i].iter().collect();
            let rat = decimal_exact(&lit)
                .ok_or_else(|| ErreurNoyau::analyse(format!("nombre invalide: '{lit}'")))?;
            out.push(Tok::Num(rat));
            continue;
        }

        return Err(ErreurNoyau::analyse(format!("caractère inattendu: '{c}'")));
    }

    Ok(out)
}

/// Lecture exacte d’un littéral décimal ("1.893", "2.5e-3", "-0.1") en rationnel.
/// Sert aussi à relire les bornes f64 via leur forme décimale la plus courte.
pub fn decimal_exact(lit: &str) -> Option<BigRational> {
    let s = lit.trim();
    let (neg, s) = match s.strip_prefix('-') {
        Some(reste) => (true, reste),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (mantisse, exposant) = match s.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => (&s[..pos], s[pos + 1..].parse::<i64>().ok()?),
        None => (s, 0),
    };

    let (ent, frac) = match mantisse.split_once('.') {
        Some((e, f)) => (e, f),
        None => (mantisse, ""),
    };
    if ent.is_empty() && frac.is_empty() {
        return None;
    }
    if !ent.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let chiffres = format!("{ent}{frac}");
    let n = BigInt::parse_bytes(chiffres.as_bytes(), 10)?;

    // garde-fou : exposant démesuré => refus (anti-gel)
    let echelle = exposant - frac.len() as i64;
    if echelle.abs() > 4096 {
        return None;
    }
    let dix = BigInt::from(10);
    let mut r = BigRational::from_integer(n);
    if echelle >= 0 {
        r *= BigRational::from_integer(dix.pow(echelle as u32));
    } else {
        r /= BigRational::from_integer(dix.pow((-echelle) as u32));
    }

    if neg {
        r = -r;
    }
    Some(r)
}

/// Relit un f64 par sa forme décimale la plus courte (0.1 -> 1/10, pas 3602879701896397/2^55).
pub fn f64_exact(x: f64) -> Option<BigRational> {
    if !x.is_finite() {
        return None;
    }
    if x == 0.0 {
        return Some(BigRational::zero());
    }
    decimal_exact(&format!("{x:e}"))
}

/// Format utilitaire (debug/“démarche”) : liste de jetons en texte.
pub fn format_tokens(tokens: &[Tok]) -> String {
    fn format_rat(r: &BigRational) -> String {
        let n = r.numer();
        let d = r.denom();
        if d.is_one() {
            format!("{n}")
        } else {
            format!("{n}/{d}")
        }
    }

    let mut out = Vec::new();
    for t in tokens {
        let s = match t {
            Tok::Num(r) => format_rat(r),
            Tok::Pi => "π".to_string(),
            Tok::Ident(name) => name.clone(),

            Tok::Plus => "+".to_string(),
            Tok::Minus => "-".to_string(),
            Tok::Star => "*".to_string(),
            Tok::Slash => "/".to_string(),
            Tok::Caret => "^".to_string(),
            Tok::Neg => "neg".to_string(),

            Tok::LPar => "(".to_string(),
            Tok::RPar => ")".to_string(),
        };
        out.push(s);
    }
    out.join(" ")
}
