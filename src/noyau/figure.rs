//! Figure (données pures, sans egui)
//!
//! Courbes échantillonnées, zones entre courbes et rectangles de Riemann,
//! dans un cadre commun. La vue ne fait que projeter ces données à l’écran :
//! les rectangles viennent de la grille qui a produit la somme affichée.

use super::analyse::{Fonction, Intervalle};
use super::riemann::{linspace, Methode, SommeRiemann};

/// Marge relative autour des données.
const MARGE: f64 = 0.05;

/// Polyligne continue (points définis consécutifs).
pub type Troncon = Vec<[f64; 2]>;

#[derive(Clone, Debug, PartialEq)]
pub struct Courbe {
    pub libelle: String,
    /// Coupée à chaque point indéfini.
    pub troncons: Vec<Troncon>,
    /// Nombre de points échantillonnés (définis ou non).
    pub echantillons: usize,
}

impl Courbe {
    pub fn points(&self) -> impl Iterator<Item = &[f64; 2]> {
        self.troncons.iter().flatten()
    }
}

/// Bande entre f1 (haut) et f2 (bas) sur [x0, x1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trapeze {
    pub x0: f64,
    pub x1: f64,
    pub haut0: f64,
    pub haut1: f64,
    pub bas0: f64,
    pub bas1: f64,
}

/// Rectangle de Riemann : de y = 0 à y = hauteur entre x0 et x1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    pub x0: f64,
    pub x1: f64,
    pub hauteur: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cadre {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub courbes: Vec<Courbe>,
    pub zones: Vec<Trapeze>,
    pub rectangles: Vec<Rectangle>,
    pub cadre: Cadre,
}

/* ------------------------ Échantillonnage ------------------------ */

fn abscisses(intervalle: Intervalle, resolution: usize) -> Vec<f64> {
    let (lo, hi) = intervalle.ordonne();
    linspace(lo, hi, resolution.max(2))
}

fn echantillonner(f: &Fonction, xs: &[f64]) -> Vec<Option<f64>> {
    xs.iter().map(|&x| f.evaluer(x).ok()).collect()
}

fn courbe(f: &Fonction, xs: &[f64], ys: &[Option<f64>]) -> Courbe {
    let mut troncons: Vec<Troncon> = Vec::new();
    let mut courant: Troncon = Vec::new();

    for (&x, y) in xs.iter().zip(ys) {
        match y {
            Some(y) => courant.push([x, *y]),
            None if !courant.is_empty() => troncons.push(std::mem::take(&mut courant)),
            None => {}
        }
    }
    if !courant.is_empty() {
        troncons.push(courant);
    }

    Courbe {
        libelle: f.source.clone(),
        troncons,
        echantillons: xs.len(),
    }
}

/* ------------------------ Cadre ------------------------ */

fn cadre(intervalle: Intervalle, ordonnees: impl Iterator<Item = f64>) -> Cadre {
    let (mut x_min, mut x_max) = intervalle.ordonne();
    if x_min == x_max {
        x_min -= 1.0;
        x_max += 1.0;
    }

    // l’axe des x est toujours visible
    let (mut y_min, mut y_max) = ordonnees
        .filter(|y| y.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if y_min == y_max {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let mx = (x_max - x_min) * MARGE;
    let my = (y_max - y_min) * MARGE;
    Cadre {
        x_min: x_min - mx,
        x_max: x_max + mx,
        y_min: y_min - my,
        y_max: y_max + my,
    }
}

/* ------------------------ Constructeurs ------------------------ */

/// Courbe seule.
pub fn figure_courbe(f: &Fonction, intervalle: Intervalle, resolution: usize) -> Figure {
    let xs = abscisses(intervalle, resolution);
    let ys = echantillonner(f, &xs);
    let c = courbe(f, &xs, &ys);
    let cadre = cadre(intervalle, c.points().map(|p| p[1]));

    Figure {
        courbes: vec![c],
        zones: Vec::new(),
        rectangles: Vec::new(),
        cadre,
    }
}

/// Courbe + un rectangle par point de la grille de Riemann.
pub fn figure_riemann(f: &Fonction, intervalle: Intervalle, somme: &SommeRiemann, resolution: usize) -> Figure {
    let grille = &somme.grille;
    let w = grille.largeur;

    let rectangles: Vec<Rectangle> = grille
        .points
        .iter()
        .zip(&grille.hauteurs)
        .map(|(&x, &h)| {
            let (x0, x1) = match grille.methode {
                Methode::Gauche => (x, x + w),
                Methode::Droite => (x - w, x),
            };
            Rectangle { x0, x1, hauteur: h }
        })
        .collect();

    let xs = abscisses(intervalle, resolution);
    let ys = echantillonner(f, &xs);
    let c = courbe(f, &xs, &ys);
    let cadre = cadre(
        intervalle,
        c.points().map(|p| p[1]).chain(rectangles.iter().map(|r| r.hauteur)),
    );

    Figure {
        courbes: vec![c],
        zones: Vec::new(),
        rectangles,
        cadre,
    }
}

/// Deux courbes + zone ombrée là où f1 > f2 (aux deux extrémités d’un pas de grille).
pub fn figure_aire(f1: &Fonction, f2: &Fonction, intervalle: Intervalle, resolution: usize) -> Figure {
    let xs = abscisses(intervalle, resolution);
    let y1 = echantillonner(f1, &xs);
    let y2 = echantillonner(f2, &xs);

    let mut zones = Vec::new();
    for i in 0..xs.len().saturating_sub(1) {
        let (Some(h0), Some(h1), Some(b0), Some(b1)) = (y1[i], y1[i + 1], y2[i], y2[i + 1]) else {
            continue;
        };
        if h0 > b0 && h1 > b1 {
            zones.push(Trapeze {
                x0: xs[i],
                x1: xs[i + 1],
                haut0: h0,
                haut1: h1,
                bas0: b0,
                bas1: b1,
            });
        }
    }

    let c1 = courbe(f1, &xs, &y1);
    let c2 = courbe(f2, &xs, &y2);
    let cadre = cadre(intervalle, c1.points().chain(c2.points()).map(|p| p[1]));

    Figure {
        courbes: vec![c1, c2],
        zones,
        rectangles: Vec::new(),
        cadre,
    }
}
