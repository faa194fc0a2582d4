// src/main.rs
//
// Intégrales & sommes de Riemann (Q-pur) — point d’entrée NATIF + WEB (WASM)
// --------------------------------------------------------------------------
// But:
// - NATIF (Linux/Windows/macOS) : env_logger + réglages JSON optionnels + eframe::run_native
// - WEB  (wasm32)              : eframe::WebRunner + WebOptions + <canvas>, réglages par défaut
//
// Côté WEB (WASM) : index.html doit contenir un canvas :
//   <canvas id="the_canvas_id"></canvas>
//
// Réglages (natif) : chemin d’un fichier JSON dans INTEGRALE_REGLAGES ;
// champs absents = valeurs par défaut.

#![cfg_attr(target_arch = "wasm32", allow(unused_imports))]

use eframe::egui;

mod app;
mod noyau;

use app::AppIntegrale;

/// Titre unique (natif + web).
const TITRE_APP: &str = "Intégrales Q-pur";

/* ------------------------ Entrée NATIF (PC) ------------------------ */

/// Variable d’environnement : chemin du fichier de réglages.
#[cfg(not(target_arch = "wasm32"))]
const VAR_REGLAGES: &str = "INTEGRALE_REGLAGES";

/// Réglages de départ ; un fichier illisible ou invalide est signalé puis ignoré.
#[cfg(not(target_arch = "wasm32"))]
fn charger_reglages() -> noyau::Reglages {
    let Ok(chemin) = std::env::var(VAR_REGLAGES) else {
        return noyau::Reglages::default();
    };
    match noyau::Reglages::charger(&chemin) {
        Ok(r) => {
            log::info!("réglages chargés depuis {chemin}");
            r
        }
        Err(e) => {
            log::warn!("{chemin} : {e} ; valeurs par défaut utilisées");
            noyau::Reglages::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let reglages = charger_reglages();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITRE_APP)
            .with_inner_size([760.0, 900.0])
            .with_min_inner_size([520.0, 620.0]),
        ..Default::default()
    };

    eframe::run_native(
        TITRE_APP,
        options,
        Box::new(|_cc| Ok(Box::new(AppIntegrale::avec_reglages(reglages)))),
    )
}

/* ------------------------ Entrée WEB (WASM) ------------------------ */

#[cfg(target_arch = "wasm32")]
fn main() {
    // En wasm32, le démarrage réel passe par `start()` (wasm_bindgen).
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{AppIntegrale, TITRE_APP};

    use wasm_bindgen::JsCast;
    use web_sys::{window, HtmlCanvasElement};

    /// ID du canvas attendu dans index.html.
    const CANVAS_ID: &str = "the_canvas_id";

    /// Point d’entrée automatique au chargement de la page.
    /// - Fixe le titre de l’onglet (document.title)
    /// - Récupère le <canvas id="the_canvas_id">
    /// - Démarre eframe WebRunner dessus
    #[wasm_bindgen::prelude::wasm_bindgen(start)]
    pub async fn start() -> Result<(), wasm_bindgen::JsValue> {
        let w = window().ok_or_else(|| js_err("window() indisponible"))?;
        let d = w
            .document()
            .ok_or_else(|| js_err("document() indisponible"))?;

        d.set_title(TITRE_APP);

        let el = d
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| js_err("canvas introuvable (id incorrect dans index.html)"))?;

        let canvas: HtmlCanvasElement = el
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_err("l’élément trouvé n’est pas un <canvas>"))?;

        let web_options = eframe::WebOptions::default();

        eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|_cc| Ok(Box::<AppIntegrale>::default())),
            )
            .await
    }

    fn js_err(msg: &str) -> wasm_bindgen::JsValue {
        wasm_bindgen::JsValue::from_str(msg)
    }
}
