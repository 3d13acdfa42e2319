/// Paint command set applied to RGBA layers

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    /// A filled brush disc centred on (cx, cy)
    Dab {
        cx: i32,
        cy: i32,
        radius: u32,
        rgba: (u8, u8, u8, u8),
    },
}

impl PaintCommand {
    /// Write this command's pixels into `target`, replacing what is there.
    /// Anything outside the target bounds is clipped.
    pub fn apply(&self, target: &mut RgbaImage) {
        match *self {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => {
                if width == 0 || height == 0 {
                    return;
                }
                let rect = Rect::at(x, y).of_size(width, height);
                draw_filled_rect_mut(target, rect, to_pixel(rgba));
            }
            PaintCommand::Dab { cx, cy, radius, rgba } => {
                draw_filled_circle_mut(target, (cx, cy), radius as i32, to_pixel(rgba));
            }
        }
    }
}

fn to_pixel((r, g, b, a): (u8, u8, u8, u8)) -> Rgba<u8> {
    Rgba([r, g, b, a])
}
