// src/app.rs
//
// Intégrales Q-pur — module App (racine)
// -------------------------------------
// Rôle:
// - Déclarer les sous-modules (etat.rs + vue.rs)
// - Ré-exporter AppIntegrale (pour main.rs: use crate::app::AppIntegrale;)
// - Fournir l’impl eframe::App (compatible NATIF + WEB)

pub mod etat;
pub mod vue;

// Ré-export pratique : `use crate::app::AppIntegrale;`
pub use etat::AppIntegrale;

use eframe::egui;

impl eframe::App for AppIntegrale {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ESC = effacer les résultats (la saisie reste).
        let esc = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        if esc {
            self.clear_resultats();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.ui(ui); // méthode publique (dans vue.rs)
        });
    }
}
