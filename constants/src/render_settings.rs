use bevy::color::Color;

/// Minor grid lines are drawn at this fraction of the plane opacity.
pub const GRID_MINOR_LINE_OPACITY: f32 = 0.5;
pub const GRID_LINE_COLOUR: Color = Color::srgb(0.0, 0.0, 0.0);
pub const GRID_BORDER_COLOUR: Color = Color::srgb(0.0, 0.0, 0.0);

pub const TICK_LABEL_FONT_SIZE: f32 = 12.0;
pub const TICK_LABEL_COLOUR: Color = Color::srgb(0.0, 0.0, 0.0);

pub const MARKER_SPHERE_SIZE: f32 = 0.0125;
pub const MARKER_STICK_COLOUR: Color = Color::srgb(0.0, 0.0, 0.0);
pub const MARKER_HOVER_COLOUR: Color = Color::srgb(1.0, 0.85, 0.2);
pub const MARKER_CLICK_COLOUR: Color = Color::srgb(1.0, 0.27, 0.0);
pub const MARKER_LABEL_WIDTH: f32 = 160.0;
pub const MARKER_LABEL_HEIGHT: f32 = 36.0;
pub const MARKER_LABEL_FONT_SIZE: f32 = 14.0;

pub const HITBOX_WIREFRAME_COLOUR: Color = Color::srgb(0.5, 0.0, 0.5);

pub const SURFACE_METALLIC: f32 = 0.1;
pub const SURFACE_ROUGHNESS: f32 = 0.6;
