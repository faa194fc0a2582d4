// src/noyau/lecture.rs
//
// Lecture décimale tronquée d’un résultat EXACT (rationnel) : « ΣLocal ».
// Aucune approximation flottante : r -> floor(|r| * 10^digits) en entier.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;

/* ------------------------ Décimal (scaled -> texte) ------------------------ */

fn pow10(n: usize) -> BigInt {
    BigInt::from(10).pow(n as u32)
}

/// Convertit un entier “scalé” (×10^digits) en texte décimal tronqué.
pub fn scaled_to_decimal(mut scaled: BigInt, digits: usize, neg: bool) -> String {
    if scaled.is_negative() {
        scaled = -scaled;
    }

    let scale = pow10(digits);
    let int_part = &scaled / &scale;
    let frac_part = &scaled % &scale;

    let signe = if neg { "-" } else { "" };

    if digits == 0 {
        return format!("{signe}{int_part}");
    }

    let mut frac = frac_part.to_str_radix(10);
    while frac.len() < digits {
        frac.insert(0, '0');
    }

    format!("{signe}{int_part}.{frac}")
}

/// |r| -> entier “scalé” = floor(|r| * 10^digits)
fn rational_scaled(r: &BigRational, digits: usize) -> BigInt {
    let scale = pow10(digits);
    (r.numer().abs() * scale) / r.denom()
}

/// Lecture décimale tronquée (vers zéro) d’un rationnel, `digits` chiffres après la virgule.
pub fn lecture_rationnelle(r: &BigRational, digits: usize) -> String {
    scaled_to_decimal(rational_scaled(r, digits), digits, r.is_negative())
}
