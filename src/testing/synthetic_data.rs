//! Deterministic frame generators
//!
//! Patterns with known quality characteristics so estimator and controller
//! behaviour can be checked without a camera attached.

use crate::types::VideoFrame;

/// Every pixel set to the same gray level.
pub fn uniform_frame(width: u32, height: u32, level: u8) -> VideoFrame {
    VideoFrame::new(
        vec![level; (width * height * 3) as usize],
        width,
        height,
    )
}

/// Black/white checkerboard with square cells of `cell` pixels.
pub fn checkerboard_frame(width: u32, height: u32, cell: u32) -> VideoFrame {
    let cell = cell.max(1);
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let white = ((x / cell) + (y / cell)) % 2 == 0;
            let idx = ((y * width + x) * 3) as usize;
            let value = if white { 255 } else { 0 };
            data[idx..idx + 3].fill(value);
        }
    }
    VideoFrame::new(data, width, height)
}

/// Vertical stripes `stripe` pixels wide alternating between two gray levels.
pub fn stripes_frame(width: u32, height: u32, stripe: u32, a: u8, b: u8) -> VideoFrame {
    let stripe = stripe.max(1);
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            let value = if (x / stripe) % 2 == 0 { a } else { b };
            data[idx..idx + 3].fill(value);
        }
    }
    VideoFrame::new(data, width, height)
}

/// Horizontal black-to-white ramp.
pub fn gradient_frame(width: u32, height: u32) -> VideoFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            let intensity = (x * 255 / width.max(1)) as u8;
            data[idx..idx + 3].fill(intensity);
        }
    }
    VideoFrame::new(data, width, height)
}

/// Left half dark, right half bright. Used to observe mirroring.
pub fn split_frame(width: u32, height: u32, left: u8, right: u8) -> VideoFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            let value = if x < width / 2 { left } else { right };
            data[idx..idx + 3].fill(value);
        }
    }
    VideoFrame::new(data, width, height)
}

/// Skin-toned oval over a textured background; scores above the default
/// capture threshold.
pub fn synthetic_face_frame(width: u32, height: u32) -> VideoFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let rx = width as f32 * 0.25;
    let ry = height as f32 * 0.35;

    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            let dx = (x as f32 - cx) / rx;
            let dy = (y as f32 - cy) / ry;
            let inside = dx * dx + dy * dy <= 1.0;
            // Pixel-level texture keeps both contrast and edge energy high.
            let texture = if (x + y) % 2 == 0 { 40i16 } else { -40i16 };
            let (r, g, b) = if inside {
                (205i16, 160i16, 135i16)
            } else {
                (110i16, 125i16, 140i16)
            };
            data[idx] = (r + texture).clamp(0, 255) as u8;
            data[idx + 1] = (g + texture).clamp(0, 255) as u8;
            data[idx + 2] = (b + texture).clamp(0, 255) as u8;
        }
    }
    VideoFrame::new(data, width, height)
}
