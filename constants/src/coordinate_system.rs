/// Coordinate transformation matrix (row-major: [x_new, y_new, z_new])
/// Plot data is Z-up, the engine is Y-up: -90° X rotation (Z→Y, -Y→Z, X→X)
pub const COORDINATE_TRANSFORM: [[f32; 3]; 3] = [
    [1.0, 0.0, 0.0],  // X = X
    [0.0, 0.0, 1.0],  // Y = Z
    [0.0, -1.0, 0.0], // Z = -Y
];

/// Rotation about X that takes plot space into engine space, in radians.
pub const DATA_TO_WORLD_ROTATION_X: f32 = -std::f32::consts::FRAC_PI_2;

/// Apply coordinate transformation matrix to a plot-space point.
pub fn transform_coordinates(x: f32, y: f32, z: f32) -> (f32, f32, f32) {
    let input = [x, y, z];
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            output[i] += COORDINATE_TRANSFORM[i][j] * input[j];
        }
    }

    (output[0], output[1], output[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_up_becomes_engine_up() {
        assert_eq!(transform_coordinates(0.0, 0.0, 1.0), (0.0, 1.0, 0.0));
        assert_eq!(transform_coordinates(0.0, 1.0, 0.0), (0.0, 0.0, -1.0));
        assert_eq!(transform_coordinates(2.0, 0.0, 0.0), (2.0, 0.0, 0.0));
    }
}
