// src/noyau/rpn.rs
//
// Shunting-yard -> RPN -> AST
// Objectif:
// - Convertir une suite de Tok en RPN (postfix), en refusant toute syntaxe douteuse
// - Puis reconstruire Expr
//
// Règles:
// - Ident(name):
//    - si name ∈ FONCTIONS => fonction unaire (doit être suivie de '(')
//    - "e" => constante d’Euler
//    - la variable désignée => Expr::Var
//    - sinon => erreur (symbole inconnu)
// - Moins unaire => Tok::Neg (préfixe), plus faible que la puissance : -x^2 = -(x^2)
// - Plus unaire => ignoré
// - Pas de multiplication implicite : "2x", "2(x)", "x y" sont refusés.

use super::erreurs::ErreurNoyau;
use super::expr::Expr;
use super::jetons::Tok;

/// Fonctions unaires reconnues (log = logarithme népérien).
pub const FONCTIONS: [&str; 8] = ["sin", "cos", "tan", "sqrt", "exp", "ln", "log", "abs"];

fn precedence(t: &Tok) -> i32 {
    match t {
        Tok::Plus | Tok::Minus => 1,
        Tok::Star | Tok::Slash => 2,
        Tok::Neg => 3,
        Tok::Caret => 4,
        _ => 0,
    }
}

fn is_right_associative(t: &Tok) -> bool {
    matches!(t, Tok::Caret)
}

/// Identificateurs reconnus comme fonctions (unaire).
fn is_fonction_ident(name: &str) -> bool {
    FONCTIONS.contains(&name)
}

fn symbole(t: &Tok) -> &'static str {
    match t {
        Tok::Plus => "+",
        Tok::Minus => "-",
        Tok::Star => "*",
        Tok::Slash => "/",
        Tok::Caret => "^",
        _ => "?",
    }
}

/// Convertit une suite de jetons en RPN (notation polonaise inversée).
///
/// Exemple:
///   tokens: [Minus, Ident("x"), Caret, Num(2)]
///   rpn:    [Ident("x"), Num(2), Caret, Neg]
pub fn to_rpn(tokens: &[Tok]) -> Result<Vec<Tok>, ErreurNoyau> {
    if tokens.is_empty() {
        return Err(ErreurNoyau::analyse("expression vide"));
    }

    let mut out: Vec<Tok> = Vec::new();
    let mut ops: Vec<Tok> = Vec::new();

    // true tant qu’on attend un opérande (début, après un opérateur ou '(')
    let mut attend_valeur = true;
    // fonction lue, '(' obligatoire ensuite
    let mut fonction_en_attente: Option<String> = None;

    for tok in tokens.iter().cloned() {
        if let Some(f) = fonction_en_attente.take() {
            if !matches!(tok, Tok::LPar) {
                return Err(ErreurNoyau::analyse(format!("'{f}' doit être suivi de '('")));
            }
        }

        match tok {
            Tok::Num(_) | Tok::Pi => {
                if !attend_valeur {
                    return Err(ErreurNoyau::analyse("opérateur manquant entre deux valeurs"));
                }
                out.push(tok);
                attend_valeur = false;
            }

            Tok::Ident(name) => {
                if !attend_valeur {
                    return Err(ErreurNoyau::analyse(format!("opérateur manquant avant '{name}'")));
                }
                if is_fonction_ident(&name) {
                    // fonction : on la garde sur la pile (elle sortira après son argument)
                    fonction_en_attente = Some(name.clone());
                    ops.push(Tok::Ident(name));
                } else {
                    // variable/constante : sortie directe
                    out.push(Tok::Ident(name));
                    attend_valeur = false;
                }
            }

            Tok::LPar => {
                if !attend_valeur {
                    return Err(ErreurNoyau::analyse("opérateur manquant avant '('"));
                }
                ops.push(tok);
            }

            Tok::RPar => {
                if attend_valeur {
                    return Err(ErreurNoyau::analyse("parenthèse fermante inattendue"));
                }

                // dépile jusqu’à '('
                let mut ouvrante = false;
                while let Some(top) = ops.pop() {
                    if matches!(top, Tok::LPar) {
                        ouvrante = true;
                        break;
                    }
                    out.push(top);
                }
                if !ouvrante {
                    return Err(ErreurNoyau::analyse("parenthèse fermante sans ouvrante"));
                }

                // si une fonction est au sommet, on la sort aussi
                if matches!(ops.last(), Some(Tok::Ident(name)) if is_fonction_ident(name)) {
                    if let Some(f) = ops.pop() {
                        out.push(f);
                    }
                }
            }

            Tok::Plus | Tok::Minus if attend_valeur => {
                // signe unaire : '+' ignoré, '-' devient Neg (préfixe, rien à dépiler)
                if matches!(tok, Tok::Minus) {
                    ops.push(Tok::Neg);
                }
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Caret => {
                if attend_valeur {
                    return Err(ErreurNoyau::analyse(format!(
                        "opérateur '{}' mal placé",
                        symbole(&tok)
                    )));
                }

                // dépile tant que:
                // - on n'est pas bloqué par '('
                // - et on ne traverse pas une fonction (fonction reste collée à son argument)
                // - et la précédence/associativité exige de sortir l'opérateur du haut
                while let Some(top) = ops.last() {
                    if matches!(top, Tok::LPar) {
                        break;
                    }
                    if matches!(top, Tok::Ident(name) if is_fonction_ident(name)) {
                        break;
                    }

                    let p_top = precedence(top);
                    let p_tok = precedence(&tok);

                    let doit_pop = if is_right_associative(&tok) {
                        p_top > p_tok
                    } else {
                        p_top >= p_tok
                    };

                    if !doit_pop {
                        break;
                    }
                    if let Some(op) = ops.pop() {
                        out.push(op);
                    }
                }

                ops.push(tok);
                attend_valeur = true;
            }

            Tok::Neg => return Err(ErreurNoyau::analyse("jeton interne inattendu")),
        }
    }

    if let Some(f) = fonction_en_attente {
        return Err(ErreurNoyau::analyse(format!("'{f}' doit être suivi de '('")));
    }
    if attend_valeur {
        return Err(ErreurNoyau::analyse("expression incomplète"));
    }

    // vide la pile ops
    while let Some(op) = ops.pop() {
        if matches!(op, Tok::LPar) {
            return Err(ErreurNoyau::analyse("parenthèses non fermées"));
        }
        out.push(op);
    }

    Ok(out)
}

/// Construit une Expr à partir d’une RPN.
///
/// - Ident(name):
///     - si name ∈ FONCTIONS => fonction unaire
///     - "e" => Expr::E
///     - name == variable => Expr::Var
pub fn from_rpn(rpn: &[Tok], variable: &str) -> Result<Expr, ErreurNoyau> {
    let invalide = || ErreurNoyau::analyse("expression invalide");
    let mut st: Vec<Expr> = Vec::new();

    for tok in rpn.iter().cloned() {
        match tok {
            Tok::Num(r) => st.push(Expr::Rat(r)),
            Tok::Pi => st.push(Expr::Pi),

            Tok::Neg => {
                let x = st.pop().ok_or_else(invalide)?;
                st.push(-x);
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Caret => {
                let b = st.pop().ok_or_else(invalide)?;
                let a = st.pop().ok_or_else(invalide)?;

                let e = match tok {
                    Tok::Plus => a + b,
                    Tok::Minus => a - b,
                    Tok::Star => a * b,
                    Tok::Slash => a / b,
                    _ => a.puissance(b),
                };

                st.push(e);
            }

            Tok::Ident(name) => {
                if is_fonction_ident(&name) {
                    let x = Box::new(st.pop().ok_or_else(|| {
                        ErreurNoyau::analyse(format!("'{name}' sans argument"))
                    })?);
                    let e = match name.as_str() {
                        "sqrt" => Expr::Sqrt(x),
                        "sin" => Expr::Sin(x),
                        "cos" => Expr::Cos(x),
                        "tan" => Expr::Tan(x),
                        "exp" => Expr::Exp(x),
                        "abs" => Expr::Abs(x),
                        _ => Expr::Ln(x),
                    };
                    st.push(e);
                } else if name == variable {
                    st.push(Expr::Var(name));
                } else if name == "e" {
                    st.push(Expr::E);
                } else {
                    return Err(ErreurNoyau::analyse(format!(
                        "symbole inconnu '{name}' (variable : {variable})"
                    )));
                }
            }

            Tok::LPar | Tok::RPar => return Err(ErreurNoyau::analyse("parenthèse inattendue en RPN")),
        }
    }

    match (st.pop(), st.is_empty()) {
        (Some(e), true) => Ok(e),
        _ => Err(invalide()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::jetons::tokenize;

    fn parse(s: &str) -> Result<Expr, ErreurNoyau> {
        let t = tokenize(s)?;
        let rpn = to_rpn(&t)?;
        from_rpn(&rpn, "x")
    }

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn moins_unaire_plus_faible_que_puissance() {
        assert_eq!(parse("-x**2").unwrap(), -(x().puissance(Expr::entier(2))));
        assert_eq!(parse("2**-1").unwrap(), Expr::entier(2).puissance(Expr::entier(-1)));
    }

    #[test]
    fn puissance_associative_a_droite() {
        let attendu = Expr::entier(2).puissance(Expr::entier(3).puissance(Expr::entier(2)));
        assert_eq!(parse("2^3^2").unwrap(), attendu);
    }

    #[test]
    fn moins_unaire_devant_produit() {
        // -x*3 = (-x)*3
        assert_eq!(parse("-x*3").unwrap(), (-x()) * Expr::entier(3));
    }

    #[test]
    fn fonctions_et_constantes() {
        assert_eq!(parse("sin(pi)").unwrap(), Expr::Sin(Box::new(Expr::Pi)));
        assert_eq!(parse("log(e)").unwrap(), Expr::Ln(Box::new(Expr::E)));
        assert_eq!(parse("+x").unwrap(), x());
    }

    #[test]
    fn variable_designee() {
        let t = tokenize("t + 1").unwrap();
        let rpn = to_rpn(&t).unwrap();
        assert!(from_rpn(&rpn, "t").is_ok());
        assert!(from_rpn(&rpn, "x").is_err());
    }

    #[test]
    fn syntaxes_refusees() {
        for s in ["((", "x +* 2", "2x", "2(x)", "sin x", "()", ")", "x +", "", "(x", "x)", "sin"] {
            assert!(
                matches!(parse(s), Err(ErreurNoyau::Analyse(_))),
                "devrait être refusé: {s:?}"
            );
        }
    }

    #[test]
    fn symbole_inconnu() {
        let e = parse("y + 1").unwrap_err();
        assert!(matches!(e, ErreurNoyau::Analyse(m) if m.contains("'y'")));
    }
}
