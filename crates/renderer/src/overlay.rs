//! Screen-space HUD overlay: solid rectangles and bitmap-font text.

use bytemuck::{Pod, Zeroable};

/// Vertex for screen-space text / UI overlay.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct OverlayVertex {
    /// NDC position (x, y) in -1..1
    pub position: [f32; 2],
    /// UV into font atlas (negative x = solid color quad)
    pub tex_coords: [f32; 2],
    /// RGBA color
    pub color: [f32; 4],
}

impl OverlayVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Characters the HUD font can draw, in atlas order. Lowercase maps onto uppercase.
const GLYPHS: &str = " 0123456789:ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Atlas layout: 8 columns x 5 rows of 6x8 pixel cells.
const FONT_COLS: u32 = 8;
const FONT_ROWS: u32 = 5;
pub const GLYPH_PX_W: f32 = 6.0;
pub const GLYPH_PX_H: f32 = 8.0;

fn glyph_index(ch: char) -> Option<u32> {
    GLYPHS
        .chars()
        .position(|g| g == ch.to_ascii_uppercase())
        .map(|i| i as u32)
}

/// Builds overlay geometry (background rects + glyph quads) in pixel coordinates.
#[derive(Debug, Clone)]
pub struct OverlayTextBuilder {
    pub vertices: Vec<OverlayVertex>,
    pub indices: Vec<u32>,
    screen_w: f32,
    screen_h: f32,
}

impl OverlayTextBuilder {
    pub fn new(screen_w: f32, screen_h: f32) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            screen_w: screen_w.max(1.0),
            screen_h: screen_h.max(1.0),
        }
    }

    /// Convert pixel coords to NDC.
    fn px_to_ndc(&self, px: f32, py: f32) -> [f32; 2] {
        [
            (px / self.screen_w) * 2.0 - 1.0,
            1.0 - (py / self.screen_h) * 2.0,
        ]
    }

    fn push_quad(&mut self, x: f32, y: f32, w: f32, h: f32, uv: [[f32; 2]; 2], color: [f32; 4]) {
        let tl = self.px_to_ndc(x, y);
        let br = self.px_to_ndc(x + w, y + h);
        let [uv0, uv1] = uv;
        let base = self.vertices.len() as u32;
        self.vertices.push(OverlayVertex { position: [tl[0], tl[1]], tex_coords: [uv0[0], uv0[1]], color });
        self.vertices.push(OverlayVertex { position: [br[0], tl[1]], tex_coords: [uv1[0], uv0[1]], color });
        self.vertices.push(OverlayVertex { position: [br[0], br[1]], tex_coords: [uv1[0], uv1[1]], color });
        self.vertices.push(OverlayVertex { position: [tl[0], br[1]], tex_coords: [uv0[0], uv1[1]], color });
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Add a solid-color rectangle. Coordinates in pixels.
    pub fn add_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
        // Negative UV is the shader's solid-colour sentinel.
        self.push_quad(x, y, w, h, [[-1.0, -1.0], [-1.0, -1.0]], color);
    }

    /// Add a line of text with its top-left corner at pixel (x, y).
    /// `scale` = 1.0 draws each glyph as 6x8 screen pixels. Unknown characters leave a gap.
    pub fn add_text(&mut self, x: f32, y: f32, text: &str, scale: f32, color: [f32; 4]) {
        let gw = GLYPH_PX_W * scale;
        let gh = GLYPH_PX_H * scale;
        let mut cx = x;
        for ch in text.chars() {
            if let Some(idx) = glyph_index(ch).filter(|_| ch != ' ') {
                let col = (idx % FONT_COLS) as f32;
                let row = (idx / FONT_COLS) as f32;
                let uv0 = [col / FONT_COLS as f32, row / FONT_ROWS as f32];
                let uv1 = [(col + 1.0) / FONT_COLS as f32, (row + 1.0) / FONT_ROWS as f32];
                self.push_quad(cx, y, gw, gh, [uv0, uv1], color);
            }
            cx += gw;
        }
    }

    /// Height in pixels of one text line at `scale`.
    pub fn line_height(scale: f32) -> f32 {
        GLYPH_PX_H * scale
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Overlay geometry tagged with a generation; the renderer re-uploads only when it changes.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub generation: u64,
    pub text: OverlayTextBuilder,
}

/// Rasterise the HUD glyph set into an `R8Unorm` atlas. Returns (pixels, width, height).
pub fn generate_font_atlas() -> (Vec<u8>, u32, u32) {
    let atlas_w = FONT_COLS * GLYPH_PX_W as u32;
    let atlas_h = FONT_ROWS * GLYPH_PX_H as u32;
    let mut pixels = vec![0u8; (atlas_w * atlas_h) as usize];

    for (idx, glyph) in FONT_5X7.iter().enumerate() {
        let idx = idx as u32;
        let base_x = (idx % FONT_COLS) * GLYPH_PX_W as u32;
        let base_y = (idx / FONT_COLS) * GLYPH_PX_H as u32;

        for (gy, bits) in glyph.iter().enumerate() {
            for gx in 0..5u32 {
                if (bits >> (4 - gx)) & 1 != 0 {
                    let px = base_x + gx;
                    let py = base_y + gy as u32;
                    pixels[(py * atlas_w + px) as usize] = 255;
                }
            }
        }
    }

    (pixels, atlas_w, atlas_h)
}

/// 5x7 glyph rows for [`GLYPHS`], 5 MSBs used with bit4 leftmost.
#[rustfmt::skip]
const FONT_5X7: [[u8; 7]; 38] = [
    [0x00,0x00,0x00,0x00,0x00,0x00,0x00], // ' '
    [0x0E,0x11,0x13,0x15,0x19,0x11,0x0E], // '0'
    [0x04,0x0C,0x04,0x04,0x04,0x04,0x0E], // '1'
    [0x0E,0x11,0x01,0x06,0x08,0x10,0x1F], // '2'
    [0x0E,0x11,0x01,0x06,0x01,0x11,0x0E], // '3'
    [0x02,0x06,0x0A,0x12,0x1F,0x02,0x02], // '4'
    [0x1F,0x10,0x1E,0x01,0x01,0x11,0x0E], // '5'
    [0x06,0x08,0x10,0x1E,0x11,0x11,0x0E], // '6'
    [0x1F,0x01,0x02,0x04,0x08,0x08,0x08], // '7'
    [0x0E,0x11,0x11,0x0E,0x11,0x11,0x0E], // '8'
    [0x0E,0x11,0x11,0x0F,0x01,0x02,0x0C], // '9'
    [0x00,0x00,0x04,0x00,0x00,0x04,0x00], // ':'
    [0x0E,0x11,0x11,0x1F,0x11,0x11,0x11], // 'A'
    [0x1E,0x11,0x11,0x1E,0x11,0x11,0x1E], // 'B'
    [0x0E,0x11,0x10,0x10,0x10,0x11,0x0E], // 'C'
    [0x1E,0x11,0x11,0x11,0x11,0x11,0x1E], // 'D'
    [0x1F,0x10,0x10,0x1E,0x10,0x10,0x1F], // 'E'
    [0x1F,0x10,0x10,0x1E,0x10,0x10,0x10], // 'F'
    [0x0E,0x11,0x10,0x17,0x11,0x11,0x0F], // 'G'
    [0x11,0x11,0x11,0x1F,0x11,0x11,0x11], // 'H'
    [0x0E,0x04,0x04,0x04,0x04,0x04,0x0E], // 'I'
    [0x07,0x02,0x02,0x02,0x02,0x12,0x0C], // 'J'
    [0x11,0x12,0x14,0x18,0x14,0x12,0x11], // 'K'
    [0x10,0x10,0x10,0x10,0x10,0x10,0x1F], // 'L'
    [0x11,0x1B,0x15,0x15,0x11,0x11,0x11], // 'M'
    [0x11,0x19,0x15,0x13,0x11,0x11,0x11], // 'N'
    [0x0E,0x11,0x11,0x11,0x11,0x11,0x0E], // 'O'
    [0x1E,0x11,0x11,0x1E,0x10,0x10,0x10], // 'P'
    [0x0E,0x11,0x11,0x11,0x15,0x12,0x0D], // 'Q'
    [0x1E,0x11,0x11,0x1E,0x14,0x12,0x11], // 'R'
    [0x0E,0x11,0x10,0x0E,0x01,0x11,0x0E], // 'S'
    [0x1F,0x04,0x04,0x04,0x04,0x04,0x04], // 'T'
    [0x11,0x11,0x11,0x11,0x11,0x11,0x0E], // 'U'
    [0x11,0x11,0x11,0x11,0x0A,0x0A,0x04], // 'V'
    [0x11,0x11,0x11,0x15,0x15,0x1B,0x11], // 'W'
    [0x11,0x11,0x0A,0x04,0x0A,0x11,0x11], // 'X'
    [0x11,0x11,0x0A,0x04,0x04,0x04,0x04], // 'Y'
    [0x1F,0x01,0x02,0x04,0x08,0x10,0x1F], // 'Z'
];
