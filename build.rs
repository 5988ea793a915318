//! Build script -- writes `assets/icon.ico` and embeds the Windows
//! application manifest and icon resource.

const ICON_PATH: &str = "assets/icon.ico";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if !std::path::Path::new(ICON_PATH).exists() {
        std::fs::create_dir_all("assets").ok();
        let data = encode_ico(&[48, 32, 16]);
        if let Err(e) = std::fs::write(ICON_PATH, &data) {
            println!("cargo:warning=Failed to write icon: {e}");
        }
    }

    // Resources are only meaningful for Windows targets.
    if std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }

    let mut res = winresource::WindowsResource::new();
    res.set_manifest(
        r#"
<assembly xmlns="urn:schemas-microsoft-com:asm.v1" manifestVersion="1.0">
  <trustInfo xmlns="urn:schemas-microsoft-com:asm.v3">
    <security>
      <requestedPrivileges>
        <requestedExecutionLevel level="asInvoker" uiAccess="false"/>
      </requestedPrivileges>
    </security>
  </trustInfo>
  <application xmlns="urn:schemas-microsoft-com:asm.v3">
    <windowsSettings>
      <dpiAware xmlns="http://schemas.microsoft.com/SMI/2005/WindowsSettings">true/pm</dpiAware>
      <dpiAwareness xmlns="http://schemas.microsoft.com/SMI/2016/WindowsSettings">PerMonitorV2</dpiAwareness>
    </windowsSettings>
  </application>
</assembly>
"#,
    );
    if std::path::Path::new(ICON_PATH).exists() {
        res.set_icon(ICON_PATH);
    }
    if let Err(e) = res.compile() {
        println!("cargo:warning=Failed to compile Windows resources: {e}");
    }
}

// ════════════════════════════════════════════════════════════════
// ICO encoding
// ════════════════════════════════════════════════════════════════

/// A multi-resolution ICO file with one 32-bit BMP entry per size.
fn encode_ico(sizes: &[u32]) -> Vec<u8> {
    let entries: Vec<(u32, Vec<u8>)> = sizes
        .iter()
        .map(|&size| (size, bmp_entry(&render_rgba(size), size)))
        .collect();

    let mut ico = Vec::new();
    ico.extend_from_slice(&0u16.to_le_bytes());
    ico.extend_from_slice(&1u16.to_le_bytes());
    ico.extend_from_slice(&(entries.len() as u16).to_le_bytes());

    let mut offset = 6 + 16 * entries.len();
    for (size, bmp) in &entries {
        let dim = if *size >= 256 { 0 } else { *size as u8 };
        ico.extend_from_slice(&[dim, dim, 0, 0]);
        ico.extend_from_slice(&1u16.to_le_bytes());
        ico.extend_from_slice(&32u16.to_le_bytes());
        ico.extend_from_slice(&(bmp.len() as u32).to_le_bytes());
        ico.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += bmp.len();
    }
    for (_, bmp) in &entries {
        ico.extend_from_slice(bmp);
    }
    ico
}

/// BITMAPINFOHEADER, bottom-up BGRA pixels, then the 1-bpp AND mask.
fn bmp_entry(rgba: &[u8], size: u32) -> Vec<u8> {
    let mut bmp = Vec::new();
    bmp.extend_from_slice(&40u32.to_le_bytes());
    bmp.extend_from_slice(&(size as i32).to_le_bytes());
    // Height is doubled to cover the mask.
    bmp.extend_from_slice(&(size as i32 * 2).to_le_bytes());
    bmp.extend_from_slice(&1u16.to_le_bytes());
    bmp.extend_from_slice(&32u16.to_le_bytes());
    bmp.extend_from_slice(&[0u8; 24]);

    for y in (0..size).rev() {
        for x in 0..size {
            let i = ((y * size + x) * 4) as usize;
            bmp.extend_from_slice(&[rgba[i + 2], rgba[i + 1], rgba[i], rgba[i + 3]]);
        }
    }

    let row_bytes = (size.div_ceil(32) * 4) as usize;
    for y in (0..size).rev() {
        let mut row = vec![0u8; row_bytes];
        for x in 0..size {
            if rgba[((y * size + x) * 4 + 3) as usize] < 128 {
                row[(x / 8) as usize] |= 1 << (7 - x % 8);
            }
        }
        bmp.extend_from_slice(&row);
    }
    bmp
}

// ════════════════════════════════════════════════════════════════
// Icon rendering
// ════════════════════════════════════════════════════════════════

/// The story page and lens from `crates/storysleuth-gui/src/icon.rs`,
/// repeated here so the build script needs no workspace crates.
fn render_rgba(size: u32) -> Vec<u8> {
    let s = size as f32;
    let mut out = vec![0u8; (size * size * 4) as usize];

    let (px0, py0, px1, py1) = (s * 0.10, s * 0.06, s * 0.68, s * 0.80);
    let page_r = s * 0.06;
    let line_h = s * 0.045;
    let line_x0 = s * 0.18;
    let lines: [(f32, f32, [u8; 3]); 5] = [
        (0.20, 0.56, [0xcb, 0xa6, 0xf7]),
        (0.31, 0.46, [0xf9, 0xe2, 0xaf]),
        (0.42, 0.60, [0x89, 0xb4, 0xfa]),
        (0.53, 0.52, [0xa6, 0xe3, 0xa1]),
        (0.64, 0.40, [0xa6, 0xe3, 0xa1]),
    ];

    let (cx, cy) = (s * 0.62, s * 0.62);
    let radius = s * 0.20;
    let ring_outer = radius + s * 0.05;
    let diag = std::f32::consts::FRAC_1_SQRT_2;
    let (hx0, hy0) = (cx + ring_outer * diag, cy + ring_outer * diag);
    let (hx1, hy1) = (s * 0.94, s * 0.94);
    let h_width = s * 0.06;

    for y in 0..size {
        for x in 0..size {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let mut col = [0u8; 3];
            let mut alpha: f32 = 0.0;

            let page = edge(rounded_rect_dist(px, py, px0, py0, px1, py1, page_r), 0.0);
            if page > 0.0 {
                col = [0x2a, 0x2a, 0x3c];
                alpha = page;
                for (ly, lx1, lcol) in lines {
                    let d = seg_dist(px, py, line_x0, s * ly, s * lx1, s * ly);
                    col = mix(col, lcol, edge(d, line_h * 0.5));
                }
            }

            let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
            let glass = edge(dist, radius) * 0.35;
            col = mix(col, [0xe4, 0xe4, 0xe8], glass);
            alpha += (1.0 - alpha) * glass;

            let ring = (1.0 - edge(dist, radius)) * edge(dist, ring_outer);
            col = mix(col, [0x89, 0xb4, 0xfa], ring);
            alpha += (1.0 - alpha) * ring;

            let handle = edge(seg_dist(px, py, hx0, hy0, hx1, hy1), h_width);
            col = mix(col, [0x6a, 0x9a, 0xf0], handle);
            alpha += (1.0 - alpha) * handle;

            let i = ((y * size + x) * 4) as usize;
            out[i..i + 3].copy_from_slice(&col);
            out[i + 3] = (alpha * 255.0).clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn rounded_rect_dist(px: f32, py: f32, x0: f32, y0: f32, x1: f32, y1: f32, r: f32) -> f32 {
    let hx = (x1 - x0) * 0.5;
    let hy = (y1 - y0) * 0.5;
    let qx = (px - (x0 + hx)).abs() - (hx - r);
    let qy = (py - (y0 + hy)).abs() - (hy - r);
    (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt() + qx.max(qy).min(0.0) - r
}

fn edge(dist: f32, at: f32) -> f32 {
    (0.5 - (dist - at) * 0.5).clamp(0.0, 1.0)
}

fn seg_dist(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let (abx, aby) = (bx - ax, by - ay);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq < 0.0001 {
        0.0
    } else {
        (((px - ax) * abx + (py - ay) * aby) / len_sq).clamp(0.0, 1.0)
    };
    ((px - (ax + t * abx)).powi(2) + (py - (ay + t * aby)).powi(2)).sqrt()
}

fn mix(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    [0, 1, 2].map(|i| (a[i] as f32 * (1.0 - t) + b[i] as f32 * t) as u8)
}
