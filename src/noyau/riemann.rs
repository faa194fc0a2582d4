//! Sommes de Riemann (gauche / droite)
//!
//! w = (b - a)/n ; points gauches = linspace(a, b - w, n), droits = linspace(a + w, b, n).
//! Le dernier point est posé exactement (b - w à gauche, b à droite), comme numpy.

use log::debug;
use serde::{Deserialize, Serialize};

use std::fmt;

use super::analyse::{Fonction, Intervalle};
use super::erreurs::ErreurNoyau;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Methode {
    #[default]
    #[serde(alias = "left")]
    Gauche,
    #[serde(alias = "right")]
    Droite,
}

impl fmt::Display for Methode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Methode::Gauche => write!(f, "gauche"),
            Methode::Droite => write!(f, "droite"),
        }
    }
}

/// Garde-fou : nombre maximal de sous-intervalles (grille allouée en entier).
pub const SUBDIVISIONS_MAX: i64 = 1_000_000;

/// Nombre de sous-intervalles (1 ≤ n ≤ SUBDIVISIONS_MAX) et méthode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    n: usize,
    methode: Methode,
}

impl Partition {
    pub fn nouvelle(n: i64, methode: Methode) -> Result<Partition, ErreurNoyau> {
        if !(1..=SUBDIVISIONS_MAX).contains(&n) {
            return Err(ErreurNoyau::PartitionInvalide(n));
        }
        let n = usize::try_from(n).map_err(|_| ErreurNoyau::PartitionInvalide(n))?;
        Ok(Partition { n, methode })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn methode(&self) -> Methode {
        self.methode
    }
}

/// Points d’échantillonnage et hauteurs f(point).
#[derive(Clone, Debug, PartialEq)]
pub struct GrilleRiemann {
    pub points: Vec<f64>,
    pub hauteurs: Vec<f64>,
    pub largeur: f64,
    pub methode: Methode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SommeRiemann {
    pub grille: GrilleRiemann,
    pub approximation: f64,
}

/// n points régulièrement espacés de `debut` à `fin` inclus ; le dernier vaut `fin` exactement.
pub fn linspace(debut: f64, fin: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![debut],
        _ => {
            let pas = (fin - debut) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| debut + i as f64 * pas).collect();
            v[n - 1] = fin;
            v
        }
    }
}

/// Points d’échantillonnage selon la méthode.
pub fn points_echantillon(intervalle: Intervalle, partition: Partition) -> (Vec<f64>, f64) {
    let Intervalle { a, b } = intervalle;
    let n = partition.n;
    let w = (b - a) / n as f64;
    let points = match partition.methode {
        Methode::Gauche => linspace(a, b - w, n),
        Methode::Droite => {
            let mut v = linspace(a + w, b, n);
            // n = 1 : a + w peut différer de b d’un ulp
            if let Some(dernier) = v.last_mut() {
                *dernier = b;
            }
            v
        }
    };
    (points, w)
}

/// Somme de Riemann w·Σ f(points).
pub fn somme_riemann(
    f: &Fonction,
    intervalle: Intervalle,
    partition: Partition,
) -> Result<SommeRiemann, ErreurNoyau> {
    // intervalle vide : aucune évaluation, somme exactement nulle
    if intervalle.est_degenere() {
        return Ok(SommeRiemann {
            grille: GrilleRiemann {
                points: vec![intervalle.a; partition.n],
                hauteurs: vec![0.0; partition.n],
                largeur: 0.0,
                methode: partition.methode,
            },
            approximation: 0.0,
        });
    }

    let (points, largeur) = points_echantillon(intervalle, partition);
    let hauteurs = points
        .iter()
        .map(|&x| f.evaluer(x))
        .collect::<Result<Vec<f64>, ErreurNoyau>>()?;

    let approximation = hauteurs.iter().map(|h| h * largeur).sum();
    debug!(
        "Riemann {} de {} sur [{}, {}], n = {} : {approximation}",
        partition.methode, f.source, intervalle.a, intervalle.b, partition.n
    );

    Ok(SommeRiemann {
        grille: GrilleRiemann {
            points,
            hauteurs,
            largeur,
            methode: partition.methode,
        },
        approximation,
    })
}
