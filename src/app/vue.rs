// src/app/vue.rs
//
// Vue (UI egui) — natif + web
// ---------------------------
// Objectifs :
// - Même AppIntegrale (etat.rs) pour natif + wasm
// - Saisie : f, g, bornes, méthode, n, ΣLocal
// - Quatre actions indépendantes + AC ; chaque erreur devient un bandeau
// - Figure dessinée au Painter à partir des données du noyau (aucun calcul ici)
//
// Note :
// - Enter dans le champ f lance l’intégrale définie

use eframe::egui;
use log::warn;

use super::etat::{AppIntegrale, Bandeau, Demarche};
use crate::noyau::actions::{RapportAire, RapportIntegrale, RapportRiemann};
use crate::noyau::erreurs::ErreurNoyau;
use crate::noyau::figure::Figure;
use crate::noyau::format::format_expr_pretty;
use crate::noyau::riemann::{Methode, SUBDIVISIONS_MAX};
use crate::noyau::verification::Verdict;
use crate::noyau::{calculer_aire, calculer_integrale, calculer_riemann, tracer};

/// Hauteur du canevas de la figure.
const HAUTEUR_FIGURE: f32 = 320.0;

const COULEUR_F: egui::Color32 = egui::Color32::from_rgb(31, 119, 180);
const COULEUR_G: egui::Color32 = egui::Color32::from_rgb(255, 127, 14);
const COULEUR_ZONE: egui::Color32 = egui::Color32::from_rgba_premultiplied(40, 100, 160, 90);
const COULEUR_RECT: egui::Color32 = egui::Color32::from_rgba_premultiplied(60, 140, 60, 90);

impl AppIntegrale {
    /// UI principale : à appeler depuis eframe::App::update(...)
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Intégrales & sommes de Riemann");
                ui.add_space(6.0);

                self.ui_saisie(ui);

                ui.add_space(8.0);
                self.ui_actions(ui);
                self.ui_bandeau(ui);

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                self.ui_resultats(ui);

                if let Some(figure) = &self.figure {
                    ui.add_space(8.0);
                    Self::ui_figure(ui, figure);
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                self.ui_demarche(ui);
            });
    }

    fn ui_saisie(&mut self, ui: &mut egui::Ui) {
        let variable = self.saisie.variable.clone();

        egui::Grid::new("saisie_integrale")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label(format!("f({variable}) :"));
                let resp = ui.add(
                    egui::TextEdit::singleline(&mut self.saisie.fonction)
                        .desired_width(ui.available_width())
                        .hint_text("Ex: x**2, exp(-x)*2, sqrt(x)")
                        .id_salt("fonction_f")
                        .code_editor(),
                );
                let enter = ui.input(|i| i.key_pressed(egui::Key::Enter));
                if resp.lost_focus() && enter {
                    self.action_integrale();
                }
                ui.end_row();

                ui.label(format!("g({variable}) :"));
                ui.add(
                    egui::TextEdit::singleline(&mut self.saisie.fonction_2)
                        .desired_width(ui.available_width())
                        .hint_text("Seconde courbe (aire entre f et g)")
                        .id_salt("fonction_g")
                        .code_editor(),
                );
                ui.end_row();

                ui.label("Bornes :");
                ui.horizontal(|ui| {
                    ui.label("a");
                    ui.add(egui::DragValue::new(&mut self.saisie.borne_a).speed(0.1));
                    ui.label("b");
                    ui.add(egui::DragValue::new(&mut self.saisie.borne_b).speed(0.1));
                });
                ui.end_row();

                ui.label("Riemann :");
                ui.horizontal(|ui| {
                    egui::ComboBox::from_id_salt("methode_riemann")
                        .selected_text(self.saisie.methode.to_string())
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.saisie.methode, Methode::Gauche, "gauche");
                            ui.selectable_value(&mut self.saisie.methode, Methode::Droite, "droite");
                        });
                    ui.label("n");
                    ui.add(
                        egui::DragValue::new(&mut self.saisie.subdivisions)
                            .speed(1)
                            .range(0..=SUBDIVISIONS_MAX),
                    );
                });
                ui.end_row();

                ui.label("ΣLocal :");
                let mut d = self.saisie.digits as u32;
                let resp = ui.add(
                    egui::DragValue::new(&mut d)
                        .speed(1)
                        .range(0..=200)
                        .suffix(" chiffres"),
                );
                if resp.changed() {
                    self.set_digits(d as usize);
                }
                ui.end_row();
            });
    }

    fn ui_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if Self::bouton(ui, "Intégrale définie", "Symbolique + numérique + comparaison") {
                self.action_integrale();
            }
            if Self::bouton(ui, "Somme de Riemann", "Approximation par rectangles") {
                self.action_riemann();
            }
            if Self::bouton(ui, "Aire entre f et g", "Intersections + ∫|f - g|") {
                self.action_aire();
            }
            if Self::bouton(ui, "Tracer", "Courbe de f sur [a, b]") {
                self.action_tracer();
            }

            ui.separator();

            if Self::bouton(ui, "AC", "Remise à zéro totale (réglages de départ)") {
                self.reset_total();
            }
        });
    }

    fn bouton(ui: &mut egui::Ui, label: &str, tip: &str) -> bool {
        ui.add(egui::Button::new(label).min_size(egui::vec2(56.0, 30.0)))
            .on_hover_text(tip)
            .clicked()
    }

    fn ui_bandeau(&self, ui: &mut egui::Ui) {
        let Some(bandeau) = &self.bandeau else {
            return;
        };
        let (couleur, texte) = match bandeau {
            Bandeau::Succes(t) => (egui::Color32::from_rgb(40, 150, 60), t),
            Bandeau::Avertissement(t) => (ui.visuals().warn_fg_color, t),
            Bandeau::Erreur(t) => (ui.visuals().error_fg_color, t),
        };
        ui.add_space(6.0);
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.colored_label(couleur, texte);
        });
    }

    fn ui_resultats(&mut self, ui: &mut egui::Ui) {
        if !self.titre_resultat.is_empty() {
            ui.strong(&self.titre_resultat);
        }

        if !self.exact.is_empty() {
            ui.label("EXACT :");
            Self::champ_monospace(ui, "exact_out", &self.exact, 2);

            ui.add_space(6.0);
            ui.label("LaTeX :");
            Self::champ_monospace(ui, "latex_out", &self.latex, 2);

            ui.add_space(6.0);
            ui.label("ΣLocal :");
            match &self.lecture {
                Some(v) => Self::champ_monospace(ui, "socal_out", v, 1),
                None => {
                    ui.monospace("indisponible");
                }
            }
        }

        if !self.numerique.is_empty() {
            ui.add_space(6.0);
            ui.label("Numérique :");
            Self::champ_monospace(ui, "numerique_out", &self.numerique, 1);
        }

        if !self.intersections.is_empty() {
            ui.add_space(6.0);
            ui.label("Intersections :");
            Self::champ_monospace(ui, "intersections_out", &self.intersections, 1);
        }
    }

    fn ui_demarche(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Démarche")
            .default_open(false)
            .show(ui, |ui| {
                Self::champ_demarche(ui, "Jetons", "demarche_jetons", &self.demarche.jetons);
                Self::champ_demarche(ui, "RPN", "demarche_rpn", &self.demarche.rpn);
                Self::champ_demarche(ui, "Avant", "demarche_avant", &self.demarche.avant);
                Self::champ_demarche(ui, "Après", "demarche_apres", &self.demarche.apres);
                Self::champ_demarche(ui, "Primitive", "demarche_primitive", &self.demarche.primitive);
            });
    }

    fn champ_demarche(ui: &mut egui::Ui, titre: &str, id: &str, contenu: &str) {
        ui.add_space(4.0);
        ui.label(format!("{titre} :"));
        Self::champ_monospace(ui, id, contenu, 2);
    }

    fn champ_monospace(ui: &mut egui::Ui, id: &str, contenu: &str, rows: usize) {
        // Affichage lecture seule “stable”, sans TextEdit interactif.
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.push_id(id, |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.set_min_height(
                        rows as f32 * ui.text_style_height(&egui::TextStyle::Monospace),
                    );
                    ui.monospace(contenu);
                });
            });
    }

    /* ------------------------ Figure ------------------------ */

    fn ui_figure(ui: &mut egui::Ui, figure: &Figure) {
        let taille = egui::vec2(ui.available_width(), HAUTEUR_FIGURE);
        let (rect, _resp) = ui.allocate_exact_size(taille, egui::Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 4.0, ui.visuals().extreme_bg_color);

        let c = figure.cadre;
        let ecran = |x: f64, y: f64| {
            egui::pos2(
                rect.left() + ((x - c.x_min) / (c.x_max - c.x_min)) as f32 * rect.width(),
                rect.bottom() - ((y - c.y_min) / (c.y_max - c.y_min)) as f32 * rect.height(),
            )
        };
        let trait_axe = egui::Stroke::new(1.0, ui.visuals().weak_text_color());

        // axes
        painter.line_segment([ecran(c.x_min, 0.0), ecran(c.x_max, 0.0)], trait_axe);
        if c.x_min < 0.0 && c.x_max > 0.0 {
            painter.line_segment([ecran(0.0, c.y_min), ecran(0.0, c.y_max)], trait_axe);
        }

        for z in &figure.zones {
            let pts = vec![
                ecran(z.x0, z.bas0),
                ecran(z.x0, z.haut0),
                ecran(z.x1, z.haut1),
                ecran(z.x1, z.bas1),
            ];
            painter.add(egui::Shape::convex_polygon(pts, COULEUR_ZONE, egui::Stroke::NONE));
        }

        for r in &figure.rectangles {
            let coins = egui::Rect::from_two_pos(ecran(r.x0, 0.0), ecran(r.x1, r.hauteur));
            painter.rect_filled(coins, 0.0, COULEUR_RECT);
            let contour = vec![coins.left_top(), coins.right_top(), coins.right_bottom(), coins.left_bottom()];
            painter.add(egui::Shape::closed_line(contour, egui::Stroke::new(1.0, COULEUR_RECT.to_opaque())));
        }

        for (k, courbe) in figure.courbes.iter().enumerate() {
            let couleur = if k == 0 { COULEUR_F } else { COULEUR_G };
            for troncon in &courbe.troncons {
                let pts: Vec<egui::Pos2> = troncon.iter().map(|p| ecran(p[0], p[1])).collect();
                painter.add(egui::Shape::line(pts, egui::Stroke::new(2.0, couleur)));
            }
            painter.text(
                rect.left_top() + egui::vec2(8.0, 8.0 + 16.0 * k as f32),
                egui::Align2::LEFT_TOP,
                &courbe.libelle,
                egui::FontId::proportional(13.0),
                couleur,
            );
        }
    }

    /* ------------------------ Actions (noyau -> état) ------------------------ */

    /// Frontière d’erreur : journalise et affiche, la session reste utilisable.
    fn echec(&mut self, action: &str, e: ErreurNoyau) {
        warn!("{action} : {e}");
        self.set_erreur(format!("{action} : {e}"));
    }

    fn action_integrale(&mut self) {
        match calculer_integrale(&self.saisie) {
            Ok(r) => self.deposer_integrale(r),
            Err(e) => self.echec("Intégrale définie", e),
        }
    }

    fn deposer_integrale(&mut self, r: RapportIntegrale) {
        self.clear_resultats();
        self.titre_resultat = format!(
            "∫ de {} sur [{}, {}]",
            r.demarche.apres, self.saisie.borne_a, self.saisie.borne_b
        );
        self.exact = r.texte;
        self.latex = r.latex;
        self.lecture = r.lecture;
        self.numerique = format!(
            "{} (erreur estimée {:e}, {} évaluations)",
            r.numerique.valeur, r.numerique.erreur, r.numerique.evaluations
        );
        self.demarche = Demarche {
            jetons: r.demarche.jetons,
            rpn: r.demarche.rpn,
            avant: r.demarche.avant,
            apres: r.demarche.apres,
            primitive: r.primitive.as_ref().map(format_expr_pretty).unwrap_or_default(),
        };

        let bandeau = match r.verification {
            Ok(Verdict::Concordant { ecart }) => Bandeau::Succes(format!(
                "Résultats symbolique et numérique concordants (écart {ecart:e})."
            )),
            Ok(Verdict::Discordant { ecart }) => Bandeau::Avertissement(format!(
                "Résultats symbolique et numérique discordants (écart {ecart:e}) : vérifier la fonction."
            )),
            Err(e) => Bandeau::Avertissement(format!("Comparaison impossible : {e}")),
        };
        self.set_bandeau(bandeau);
    }

    fn action_riemann(&mut self) {
        match calculer_riemann(&self.saisie) {
            Ok(r) => self.deposer_riemann(r),
            Err(e) => self.echec("Somme de Riemann", e),
        }
    }

    fn deposer_riemann(&mut self, r: RapportRiemann) {
        self.clear_resultats();
        let g = &r.somme.grille;
        self.titre_resultat = format!(
            "Somme de Riemann ({}) de {} sur [{}, {}], n = {}",
            g.methode,
            self.saisie.fonction,
            self.saisie.borne_a,
            self.saisie.borne_b,
            g.points.len()
        );
        self.numerique = format!("{}", r.somme.approximation);
        self.figure = Some(r.figure);
    }

    fn action_aire(&mut self) {
        match calculer_aire(&self.saisie) {
            Ok(r) => self.deposer_aire(r),
            Err(e) => self.echec("Aire entre f et g", e),
        }
    }

    fn deposer_aire(&mut self, r: RapportAire) {
        self.clear_resultats();
        self.titre_resultat = format!(
            "Aire entre {} et {} sur [{}, {}]",
            self.saisie.fonction, self.saisie.fonction_2, self.saisie.borne_a, self.saisie.borne_b
        );
        self.numerique = format!("{} (erreur estimée {:e})", r.aire.valeur, r.aire.erreur);
        self.figure = Some(r.figure);

        match r.intersections {
            Ok(racines) if racines.is_empty() => {
                self.intersections = "aucune".to_string();
            }
            Ok(racines) => {
                self.intersections = racines
                    .iter()
                    .map(|r| r.affichage())
                    .collect::<Vec<_>>()
                    .join(", ");
            }
            Err(e) => {
                warn!("intersections : {e}");
                self.intersections = "non déterminées".to_string();
                self.set_bandeau(Bandeau::Avertissement(format!("{e}")));
            }
        }
    }

    fn action_tracer(&mut self) {
        match tracer(&self.saisie) {
            Ok(figure) => {
                self.clear_resultats();
                self.figure = Some(figure);
            }
            Err(e) => self.echec("Tracer", e),
        }
    }
}
