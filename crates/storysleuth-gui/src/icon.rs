//! StorySleuth application icon generator.
//!
//! Produces a procedural icon: a story page with coloured text lines and an
//! `@`-tag stripe, overlaid by a magnifying-glass ring and handle. The icon
//! is rendered at an arbitrary resolution as RGBA pixel data suitable for use
//! as a window icon.

/// Generate a StorySleuth icon as egui `IconData`.
pub fn generate_icon(size: u32) -> egui::IconData {
    let rgba = render_icon(size);
    egui::IconData {
        rgba,
        width: size,
        height: size,
    }
}

/// Render the icon into an RGBA pixel buffer (top-to-bottom row order).
pub fn render_icon(size: u32) -> Vec<u8> {
    let s = size as f32;
    let mut pixels = vec![0u8; (size * size * 4) as usize];

    // ── Layout ──────────────────────────────────────────────────
    // The page sits top-left; the lens overlaps its lower-right corner.
    let page = Rect {
        x0: s * 0.10,
        y0: s * 0.06,
        x1: s * 0.68,
        y1: s * 0.80,
    };
    let page_radius = s * 0.06;

    // Text lines on the page: (y centre, right end, colour).
    let line_h = s * 0.045;
    let lines: &[(f32, f32, [u8; 3])] = &[
        (0.20, 0.56, [0xcb, 0xa6, 0xf7]), // Meta:
        (0.31, 0.46, [0xf9, 0xe2, 0xaf]), // @tag
        (0.42, 0.60, [0x89, 0xb4, 0xfa]), // Scenario:
        (0.53, 0.52, [0xa6, 0xe3, 0xa1]), // Given
        (0.64, 0.40, [0xa6, 0xe3, 0xa1]), // Then
    ];
    let line_x0 = s * 0.18;

    let cx = s * 0.62;
    let cy = s * 0.62;
    let radius = s * 0.20;
    let ring_width = s * 0.05;
    let ring_outer = radius + ring_width;

    let angle_45: f32 = std::f32::consts::FRAC_PI_4;
    let h_start_x = cx + ring_outer * angle_45.cos();
    let h_start_y = cy + ring_outer * angle_45.sin();
    let h_end_x = s * 0.94;
    let h_end_y = s * 0.94;
    let h_width = s * 0.06;

    // ── Per-pixel rendering ─────────────────────────────────────
    for y in 0..size {
        for x in 0..size {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;

            let mut col = [0u8; 3];
            let mut ca: f32 = 0.0;

            // 1. Page. ───────────────────────────────────────────
            let page_d = page.rounded_dist(px, py, page_radius);
            let page_alpha = smooth_edge(page_d, 0.0);
            if page_alpha > 0.0 {
                col = [0x2a, 0x2a, 0x3c];
                ca = page_alpha;

                for &(ly, lx1, lcol) in lines {
                    let yc = s * ly;
                    let d = point_to_seg_dist(px, py, line_x0, yc, s * lx1, yc);
                    let a = smooth_edge(d, line_h * 0.5);
                    col = lerp_rgb(col, lcol, a);
                }
            }

            // 2. Lens interior: tint whatever is below it. ──────
            let dx = px - cx;
            let dy = py - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < radius + 1.5 {
                let glass = smooth_edge(dist, radius) * 0.35;
                col = lerp_rgb(col, [0xe4, 0xe4, 0xe8], glass);
                ca = ca + (1.0 - ca) * glass;
            }

            // 3. Ring. ───────────────────────────────────────────
            if dist > radius - 1.5 && dist < ring_outer + 1.5 {
                let ring = smooth_edge_inv(dist, radius) * smooth_edge(dist, ring_outer);
                col = lerp_rgb(col, [0x89, 0xb4, 0xfa], ring);
                ca = ca + (1.0 - ca) * ring;
            }

            // 4. Handle. ─────────────────────────────────────────
            let hd = point_to_seg_dist(px, py, h_start_x, h_start_y, h_end_x, h_end_y);
            let handle = smooth_edge(hd, h_width);
            if handle > 0.0 {
                col = lerp_rgb(col, [0x6a, 0x9a, 0xf0], handle);
                ca = ca + (1.0 - ca) * handle;
            }

            let idx = ((y * size + x) * 4) as usize;
            pixels[idx] = col[0];
            pixels[idx + 1] = col[1];
            pixels[idx + 2] = col[2];
            pixels[idx + 3] = (ca * 255.0).clamp(0.0, 255.0) as u8;
        }
    }

    pixels
}

// ── Helpers ─────────────────────────────────────────────────────

struct Rect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Rect {
    /// Signed distance to a rounded rectangle (negative inside).
    fn rounded_dist(&self, px: f32, py: f32, r: f32) -> f32 {
        let hx = (self.x1 - self.x0) * 0.5;
        let hy = (self.y1 - self.y0) * 0.5;
        let qx = (px - (self.x0 + hx)).abs() - (hx - r);
        let qy = (py - (self.y0 + hy)).abs() - (hy - r);
        let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
        outside + qx.max(qy).min(0.0) - r
    }
}

/// Smooth anti-aliased edge (1 → 0 as `dist` crosses `edge`).
fn smooth_edge(dist: f32, edge: f32) -> f32 {
    (0.5 - (dist - edge) * 0.5).clamp(0.0, 1.0)
}

/// Inverted smooth edge (0 → 1 as `dist` crosses `edge` going up).
fn smooth_edge_inv(dist: f32, edge: f32) -> f32 {
    1.0 - smooth_edge(dist, edge)
}

/// Perpendicular distance from a point to a line segment.
fn point_to_seg_dist(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let abx = bx - ax;
    let aby = by - ay;
    let len_sq = abx * abx + aby * aby;
    if len_sq < 0.0001 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    let t = (((px - ax) * abx + (py - ay) * aby) / len_sq).clamp(0.0, 1.0);
    let proj_x = ax + t * abx;
    let proj_y = ay + t * aby;
    ((px - proj_x).powi(2) + (py - proj_y).powi(2)).sqrt()
}

fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    [0, 1, 2].map(|i| (a[i] as f32 * (1.0 - t) + b[i] as f32 * t) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_has_rgba_for_every_pixel() {
        let icon = generate_icon(32);
        assert_eq!(icon.rgba.len(), 32 * 32 * 4);
        // Corners are transparent, the page body is opaque.
        assert_eq!(icon.rgba[3], 0);
        let idx = ((8 * 32 + 8) * 4 + 3) as usize;
        assert_eq!(icon.rgba[idx], 255);
    }
}
