// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output surfaces and camera fitting.

use crate::{CameraId, Matrix};

/// How a camera rectangle is fitted into a canvas of a different size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Scale X and Y independently to fill the canvas exactly.
    Stretch,
    /// Scale uniformly to the canvas width and center vertically.
    FitX,
    /// Scale uniformly to the canvas height and center horizontally.
    FitY,
    /// Pick [`FitX`](Self::FitX) if the scaled camera height fits strictly
    /// inside the canvas, otherwise [`FitY`](Self::FitY).
    #[default]
    Fit,
}

impl ViewMode {
    /// Parses `stretch`, `fit-x`, `fit-y` or `fit`; anything else is `Fit`.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim() {
            "stretch" => Self::Stretch,
            "fit-x" => Self::FitX,
            "fit-y" => Self::FitY,
            _ => Self::Fit,
        }
    }
}

/// Offset and scale placing camera pixels on a canvas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitTransform {
    /// Horizontal offset in canvas pixels.
    pub x: f64,
    /// Vertical offset in canvas pixels.
    pub y: f64,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
}

impl FitTransform {
    /// No offset, unit scale.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    /// `translation(x, y) · scaling(scale_x, scale_y)`.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix {
        Matrix::translation(self.x, self.y) * Matrix::scaling(self.scale_x, self.scale_y)
    }
}

/// Computes how a `camera_width × camera_height` rectangle is placed on a
/// `canvas_width × canvas_height` surface.
///
/// A camera with a zero dimension cannot be fitted and yields
/// [`FitTransform::IDENTITY`].
///
/// ```
/// use understory_scene::{ViewMode, fit_transform};
///
/// let fit = fit_transform(300.0, 150.0, 50.0, 200.0, ViewMode::Fit);
/// assert_eq!((fit.scale_x, fit.scale_y), (0.75, 0.75));
/// assert_eq!((fit.x, fit.y), (131.25, 0.0));
/// ```
#[must_use]
pub fn fit_transform(
    canvas_width: f64,
    canvas_height: f64,
    camera_width: f64,
    camera_height: f64,
    mode: ViewMode,
) -> FitTransform {
    if camera_width == 0.0 || camera_height == 0.0 {
        return FitTransform::IDENTITY;
    }
    let by_width = || {
        let scale = canvas_width / camera_width;
        FitTransform {
            x: 0.0,
            y: (canvas_height - camera_height * scale) / 2.0,
            scale_x: scale,
            scale_y: scale,
        }
    };
    let by_height = || {
        let scale = canvas_height / camera_height;
        FitTransform {
            x: (canvas_width - camera_width * scale) / 2.0,
            y: 0.0,
            scale_x: scale,
            scale_y: scale,
        }
    };
    match mode {
        ViewMode::Stretch => FitTransform {
            x: 0.0,
            y: 0.0,
            scale_x: canvas_width / camera_width,
            scale_y: canvas_height / camera_height,
        },
        ViewMode::FitX => by_width(),
        ViewMode::FitY => by_height(),
        ViewMode::Fit => {
            if camera_height * (canvas_width / camera_width) < canvas_height {
                by_width()
            } else {
                by_height()
            }
        }
    }
}

/// An output surface observed through one camera.
///
/// The canvas does not own its camera; a camera removed from the scene leaves
/// the canvas without one until another is attached.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    width: f64,
    height: f64,
    view_mode: ViewMode,
    camera: Option<CameraId>,
    generation: u64,
}

impl Canvas {
    /// Creates a canvas of the given pixel size with no camera.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            view_mode: ViewMode::default(),
            camera: None,
            generation: 0,
        }
    }

    /// Builder-style [`set_view_mode`](Self::set_view_mode).
    #[must_use]
    pub fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        self.set_view_mode(view_mode);
        self
    }

    /// Builder-style [`set_camera`](Self::set_camera).
    #[must_use]
    pub fn with_camera(mut self, camera: CameraId) -> Self {
        self.set_camera(Some(camera));
        self
    }

    /// Width in device pixels.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height in device pixels.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The fitting policy.
    #[must_use]
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// The attached camera, if any.
    #[must_use]
    pub fn camera(&self) -> Option<CameraId> {
        self.camera
    }

    /// Counter bumped by every mutation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resizes the canvas.
    pub fn set_size(&mut self, width: f64, height: f64) -> &mut Self {
        self.width = width;
        self.height = height;
        self.bump()
    }

    /// Changes the fitting policy.
    pub fn set_view_mode(&mut self, view_mode: ViewMode) -> &mut Self {
        self.view_mode = view_mode;
        self.bump()
    }

    /// Attaches or detaches the camera.
    pub fn set_camera(&mut self, camera: Option<CameraId>) -> &mut Self {
        self.camera = camera;
        self.bump()
    }

    /// The fit of a camera of the given size onto this canvas.
    #[must_use]
    pub fn fit(&self, camera_width: f64, camera_height: f64) -> FitTransform {
        fit_transform(
            self.width,
            self.height,
            camera_width,
            camera_height,
            self.view_mode,
        )
    }

    fn bump(&mut self) -> &mut Self {
        self.generation += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_picks_height_for_tall_cameras() {
        let fit = fit_transform(300.0, 150.0, 50.0, 200.0, ViewMode::Fit);
        assert_eq!(
            fit,
            FitTransform {
                x: 131.25,
                y: 0.0,
                scale_x: 0.75,
                scale_y: 0.75,
            }
        );
    }

    #[test]
    fn fit_picks_width_for_wide_cameras() {
        // 300×50 scaled by width (×2) is 100 tall, inside 150.
        let fit = fit_transform(600.0, 150.0, 300.0, 50.0, ViewMode::Fit);
        assert_eq!(
            fit,
            FitTransform {
                x: 0.0,
                y: 25.0,
                scale_x: 2.0,
                scale_y: 2.0,
            }
        );
    }

    #[test]
    fn fit_tie_goes_to_height() {
        // Scaled height equals the canvas height exactly: `<` is strict.
        let fit = fit_transform(600.0, 300.0, 300.0, 150.0, ViewMode::Fit);
        assert_eq!(fit, fit_transform(600.0, 300.0, 300.0, 150.0, ViewMode::FitY));
        assert_eq!((fit.scale_x, fit.x, fit.y), (2.0, 0.0, 0.0));
    }

    #[test]
    fn fit_keeps_the_whole_camera_visible() {
        // Canvas 600×150, camera 300×150: width scaling (×2) would overflow
        // vertically, so the height wins and the camera is centered.
        let fit = fit_transform(600.0, 150.0, 300.0, 150.0, ViewMode::Fit);
        assert_eq!(
            fit,
            FitTransform {
                x: 150.0,
                y: 0.0,
                scale_x: 1.0,
                scale_y: 1.0,
            }
        );
    }

    #[test]
    fn forced_axes_and_stretch() {
        let fit_x = fit_transform(600.0, 150.0, 300.0, 150.0, ViewMode::FitX);
        assert_eq!((fit_x.scale_x, fit_x.x, fit_x.y), (2.0, 0.0, -75.0));

        let stretch = fit_transform(600.0, 150.0, 300.0, 50.0, ViewMode::Stretch);
        assert_eq!((stretch.scale_x, stretch.scale_y), (2.0, 3.0));
        assert_eq!((stretch.x, stretch.y), (0.0, 0.0));
    }

    #[test]
    fn degenerate_camera_is_identity() {
        assert_eq!(
            fit_transform(600.0, 150.0, 0.0, 150.0, ViewMode::Fit),
            FitTransform::IDENTITY
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(ViewMode::from_keyword("fit-x"), ViewMode::FitX);
        assert_eq!(ViewMode::from_keyword("stretch"), ViewMode::Stretch);
        assert_eq!(ViewMode::from_keyword("cover"), ViewMode::Fit);
    }

    #[test]
    fn mutations_bump_generation() {
        let mut canvas = Canvas::new(100.0, 100.0).with_view_mode(ViewMode::Stretch);
        let before = canvas.generation();
        canvas.set_size(200.0, 100.0);
        assert!(canvas.generation() > before);
        assert_eq!(
            canvas.fit(100.0, 100.0).to_matrix(),
            Matrix::scaling(2.0, 1.0)
        );
    }
}
