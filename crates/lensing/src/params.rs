use crate::bend;

/// Physical and camera parameters shared by every pixel of a frame.
///
/// All radii are world units. The kernel never validates these values; hosts
/// are expected to reject nonsensical geometry (see `sceneconfig`) before a
/// frame is rendered. Invalid values still shade without panicking, they just
/// look wrong.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackHoleParams {
    /// Event-horizon radius `rs`; every other radius is read relative to it.
    pub schwarzschild_radius: f32,
    /// Distance from the hole to the camera along its view axis.
    pub camera_distance: f32,
    /// Inner edge of the accretion disk annulus.
    pub disk_inner: f32,
    /// Outer edge of the accretion disk annulus.
    pub disk_outer: f32,
    /// Elevation of the camera above the disk plane, in radians.
    ///
    /// Zero keeps the camera on the +z axis looking edge-on at the disk.
    pub camera_inclination: f32,
}

impl Default for BlackHoleParams {
    fn default() -> Self {
        Self {
            schwarzschild_radius: 1.0,
            camera_distance: 8.0,
            disk_inner: 1.2,
            disk_outer: 8.0,
            camera_inclination: 0.0,
        }
    }
}

impl BlackHoleParams {
    /// Builds parameters with an edge-on camera.
    pub fn new(
        schwarzschild_radius: f32,
        camera_distance: f32,
        disk_inner: f32,
        disk_outer: f32,
    ) -> Self {
        Self {
            schwarzschild_radius,
            camera_distance,
            disk_inner,
            disk_outer,
            camera_inclination: 0.0,
        }
    }

    /// Returns a copy with the camera raised by `degrees` above the disk plane.
    pub fn with_inclination_degrees(mut self, degrees: f32) -> Self {
        self.camera_inclination = degrees.to_radians();
        self
    }

    /// Impact parameter below which light is captured, `(3√3/2)·rs`.
    pub fn critical_impact_parameter(&self) -> f32 {
        bend::critical_impact_parameter(self.schwarzschild_radius)
    }
}
