use serde::Serialize;

use crate::constants::{
    CAMERA_MAX_ZOOM, CAMERA_PADDING, HEIGHT, WIDTH, ZOOM_EFFECT_PEAK, ZOOM_HOLD_MS, ZOOM_IN_MS,
    ZOOM_OUT_MS,
};
use crate::geometry::Rect;
use crate::types::{Camera, Viewport};

/// Frames both fighters: centers on their midpoint and zooms so the padded
/// box around them fills the viewport, never showing past the stage edges.
pub fn compute_camera(a: Rect, b: Rect, viewport: Viewport, zoom_multiplier: f64) -> Camera {
    let (x1, y1) = a.center();
    let (x2, y2) = b.center();
    let cx = (x1 + x2) / 2.0;
    let cy = (y1 + y2) / 2.0;

    let box_w = (x2 - x1).abs() + a.w + b.w + CAMERA_PADDING;
    let box_h = (y2 - y1).abs() + a.h + b.h + CAMERA_PADDING;
    let fit = (viewport.width / box_w).min(viewport.height / box_h);
    let min_zoom = (viewport.width / WIDTH).max(viewport.height / HEIGHT);
    let zoom = fit.min(CAMERA_MAX_ZOOM).max(min_zoom) * zoom_multiplier;

    let view_w = viewport.width / zoom;
    let view_h = viewport.height / zoom;
    Camera {
        cx: cx.min(WIDTH - view_w / 2.0).max(view_w / 2.0),
        cy: cy.min(HEIGHT - view_h / 2.0).max(view_h / 2.0),
        zoom,
    }
}

fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Eased zoom pulse layered on top of the framing zoom: rises to the peak,
/// holds, then returns to 1.0. Runs on the engine clock, independent of
/// the gameplay pause.
#[derive(Clone, Debug, Serialize)]
pub struct ZoomEffect {
    #[serde(rename = "startedAtMs")]
    started_at_ms: Option<u64>,
    multiplier: f64,
}

impl Default for ZoomEffect {
    fn default() -> Self {
        Self {
            started_at_ms: None,
            multiplier: 1.0,
        }
    }
}

impl ZoomEffect {
    pub fn start(&mut self, now_ms: u64) {
        self.started_at_ms = Some(now_ms);
        self.multiplier = 1.0;
    }

    pub fn is_active(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn update(&mut self, now_ms: u64) {
        let Some(started) = self.started_at_ms else {
            self.multiplier = 1.0;
            return;
        };
        let t = now_ms.saturating_sub(started);
        let span = ZOOM_EFFECT_PEAK - 1.0;
        self.multiplier = if t < ZOOM_IN_MS {
            1.0 + span * ease_in_out(t as f64 / ZOOM_IN_MS as f64)
        } else if t < ZOOM_IN_MS + ZOOM_HOLD_MS {
            ZOOM_EFFECT_PEAK
        } else if t < ZOOM_IN_MS + ZOOM_HOLD_MS + ZOOM_OUT_MS {
            let out = (t - ZOOM_IN_MS - ZOOM_HOLD_MS) as f64 / ZOOM_OUT_MS as f64;
            ZOOM_EFFECT_PEAK - span * ease_in_out(out)
        } else {
            self.started_at_ms = None;
            1.0
        };
    }
}
