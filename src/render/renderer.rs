use image::{imageops, GrayImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;

use super::assets::Assets;
use super::error::RenderError;
use super::raster::{blank, RasterPair, INK};
use crate::tracker::{PositionSample, Projector};

const INTERVAL_HALF_WIDTH: i32 = 2;
const TRAIL_RADIUS: i32 = 1;

/// Glyph drawn for a sample, chosen by its place in the trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Newest sample: the position icon.
    Current,
    /// Every `intervals_per_marker`-th sample: a filled square.
    Interval,
    /// Everything else: a small ring.
    Trail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedMarker {
    pub marker: Marker,
    pub x: i32,
    pub y: i32,
}

/// Classifies the sample at `index` in a trajectory of `len` samples.
/// The newest sample always wins over an interval marker.
pub fn classify(index: usize, len: usize, intervals_per_marker: usize) -> Marker {
    if index + 1 == len {
        Marker::Current
    } else if (index + 1) % intervals_per_marker.max(1) == 0 {
        Marker::Interval
    } else {
        Marker::Trail
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

pub struct TrajectoryRenderer {
    assets: Assets,
    projector: Projector,
    size: RasterSize,
    intervals_per_marker: usize,
    rotate_180: bool,
}

impl TrajectoryRenderer {
    pub fn new(
        assets: Assets,
        projector: Projector,
        size: RasterSize,
        intervals_per_marker: usize,
    ) -> Result<Self, RenderError> {
        let (icon_width, icon_height) = assets.icon().dimensions();
        if icon_width > size.width || icon_height > size.height {
            return Err(RenderError::IconTooLarge {
                icon_width,
                icon_height,
                width: size.width,
                height: size.height,
            });
        }
        Ok(Self {
            assets,
            projector,
            size,
            intervals_per_marker: intervals_per_marker.max(1),
            rotate_180: false,
        })
    }

    /// Flip both layers for panels mounted upside down.
    pub fn rotated(mut self, rotate_180: bool) -> Self {
        self.rotate_180 = rotate_180;
        self
    }

    pub fn size(&self) -> RasterSize {
        self.size
    }

    pub fn intervals_per_marker(&self) -> usize {
        self.intervals_per_marker
    }

    /// Marker plan for a trajectory, oldest sample first.
    pub fn markers(&self, samples: &[PositionSample]) -> Vec<PlacedMarker> {
        let len = samples.len();
        samples
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let (x, y) = self.projector.project(sample.latitude, sample.longitude);
                PlacedMarker {
                    marker: classify(i, len, self.intervals_per_marker),
                    x,
                    y,
                }
            })
            .collect()
    }

    pub fn render(&self, samples: &[PositionSample]) -> RasterPair {
        let mut base = blank(self.size.width, self.size.height);
        imageops::replace(&mut base, self.assets.base_map(), 0, 0);

        let mut overlay = blank(self.size.width, self.size.height);
        for placed in self.markers(samples) {
            self.draw(&mut overlay, placed);
        }

        if self.rotate_180 {
            imageops::rotate180_in_place(&mut base);
            imageops::rotate180_in_place(&mut overlay);
        }

        RasterPair { base, overlay }
    }

    /// Whether a glyph centred on (x, y) can touch the raster at all.
    fn reaches_raster(&self, x: i32, y: i32) -> bool {
        let (icon_width, icon_height) = self.assets.icon().dimensions();
        let margin = i64::from(icon_width.max(icon_height)) + i64::from(INTERVAL_HALF_WIDTH);
        let (x, y) = (i64::from(x), i64::from(y));
        (-margin..i64::from(self.size.width) + margin).contains(&x)
            && (-margin..i64::from(self.size.height) + margin).contains(&y)
    }

    fn draw(&self, overlay: &mut GrayImage, placed: PlacedMarker) {
        let PlacedMarker { marker, x, y } = placed;
        if !self.reaches_raster(x, y) {
            log::debug!("Skipping {:?} marker at ({}, {}), off the raster", marker, x, y);
            return;
        }
        match marker {
            Marker::Current => {
                let icon = self.assets.icon();
                let left = i64::from(x) - i64::from(icon.width() / 2);
                let top = i64::from(y) - i64::from(icon.height() / 2);
                imageops::replace(overlay, icon, left, top);
            }
            Marker::Interval => {
                let side = (2 * INTERVAL_HALF_WIDTH + 1) as u32;
                let rect = Rect::at(x - INTERVAL_HALF_WIDTH, y - INTERVAL_HALF_WIDTH)
                    .of_size(side, side);
                draw_filled_rect_mut(overlay, rect, INK);
            }
            Marker::Trail => draw_hollow_circle_mut(overlay, (x, y), TRAIL_RADIUS, INK),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use image::Luma;

    use super::*;
    use crate::render::raster::{ink_count, PAPER};
    use crate::tracker::Fix;

    const WIDTH: u32 = 60;
    const HEIGHT: u32 = 40;

    // x = lon + 30, y = 20 - lat
    fn projector() -> Projector {
        Projector {
            x_scale: 1.0,
            x_offset: 30.0,
            y_scale: -1.0,
            y_offset: 20.0,
        }
    }

    fn assets() -> Assets {
        // taller than the raster, with a stripe in column 3 and a dot below the cut
        let mut map = GrayImage::from_pixel(WIDTH, HEIGHT + 5, PAPER);
        for y in 0..HEIGHT + 5 {
            map.put_pixel(3, y, INK);
        }
        map.put_pixel(10, HEIGHT + 2, INK);
        let icon = GrayImage::from_pixel(5, 5, INK);
        Assets::new(map, icon).unwrap()
    }

    fn renderer(intervals_per_marker: usize) -> TrajectoryRenderer {
        TrajectoryRenderer::new(
            assets(),
            projector(),
            RasterSize {
                width: WIDTH,
                height: HEIGHT,
            },
            intervals_per_marker,
        )
        .unwrap()
    }

    fn samples(points: &[(f64, f64)]) -> Vec<PositionSample> {
        points
            .iter()
            .enumerate()
            .map(|(i, (lat, lon))| {
                let ts = Utc.timestamp_opt(1_700_000_000 + i as i64 * 30, 0).unwrap();
                Fix::new(*lat, *lon, ts).into_sample(i as u64)
            })
            .collect()
    }

    fn count(markers: &[PlacedMarker], kind: Marker) -> usize {
        markers.iter().filter(|m| m.marker == kind).count()
    }

    #[test]
    fn classify_precedence() {
        assert_eq!(classify(0, 1, 30), Marker::Current);
        assert_eq!(classify(29, 30, 30), Marker::Current);
        assert_eq!(classify(29, 31, 30), Marker::Interval);
        assert_eq!(classify(28, 31, 30), Marker::Trail);
        assert_eq!(classify(59, 100, 30), Marker::Interval);
        assert_eq!(classify(0, 3, 1), Marker::Interval);
    }

    #[test]
    fn empty_trajectory_is_base_map_only() {
        let pair = renderer(30).render(&[]);
        assert_eq!(pair.dimensions(), (WIDTH, HEIGHT));
        assert_eq!(ink_count(&pair.overlay), 0);
        assert_eq!(ink_count(&pair.base), HEIGHT as usize);
        assert!((0..HEIGHT).all(|y| pair.base.get_pixel(3, y) == &INK));
    }

    #[test]
    fn single_sample_is_just_the_icon() {
        let r = renderer(30);
        let trajectory = samples(&[(0.0, 0.0)]);
        let markers = r.markers(&trajectory);
        assert_eq!(count(&markers, Marker::Current), 1);
        assert_eq!(count(&markers, Marker::Interval), 0);
        assert_eq!(markers[0], PlacedMarker { marker: Marker::Current, x: 30, y: 20 });

        let pair = r.render(&trajectory);
        assert_eq!(ink_count(&pair.overlay), 25);
        for y in 18..=22 {
            for x in 28..=32 {
                assert_eq!(pair.overlay.get_pixel(x, y), &INK);
            }
        }
    }

    #[test]
    fn newest_sample_wins_over_interval_marker() {
        let r = renderer(30);
        let points: Vec<(f64, f64)> = (0..30).map(|i| (0.0, i as f64 - 15.0)).collect();
        let markers = r.markers(&samples(&points));
        assert_eq!(count(&markers, Marker::Interval), 0);
        assert_eq!(count(&markers, Marker::Current), 1);
        assert_eq!(markers[29].marker, Marker::Current);

        let points: Vec<(f64, f64)> = (0..31).map(|i| (0.0, i as f64 - 15.0)).collect();
        let markers = r.markers(&samples(&points));
        assert_eq!(count(&markers, Marker::Interval), 1);
        assert_eq!(markers[29].marker, Marker::Interval);
        assert_eq!(markers[30].marker, Marker::Current);
    }

    #[test]
    fn interval_marker_is_filled_square() {
        let r = renderer(1);
        let pair = r.render(&samples(&[(10.0, -20.0), (-10.0, 20.0)]));
        // square centred on (10, 10)
        for y in 8..=12 {
            for x in 8..=12 {
                assert_eq!(pair.overlay.get_pixel(x, y), &INK);
            }
        }
        assert_eq!(pair.overlay.get_pixel(13, 10), &PAPER);
        assert_eq!(ink_count(&pair.overlay), 25 + 25);
    }

    #[test]
    fn trail_dot_is_unfilled() {
        let r = renderer(100);
        let pair = r.render(&samples(&[(10.0, -20.0), (-10.0, 20.0)]));
        assert_eq!(pair.overlay.get_pixel(10, 10), &PAPER);
        assert_eq!(pair.overlay.get_pixel(11, 10), &INK);
        assert_eq!(pair.overlay.get_pixel(10, 9), &INK);
    }

    #[test]
    fn icon_overwrites_earlier_marks() {
        let mut map = GrayImage::from_pixel(WIDTH, HEIGHT, PAPER);
        map.put_pixel(0, 0, INK);
        let mut icon = GrayImage::from_pixel(5, 5, PAPER);
        icon.put_pixel(0, 0, INK);
        let r = TrajectoryRenderer::new(
            Assets::new(map, icon).unwrap(),
            projector(),
            RasterSize {
                width: WIDTH,
                height: HEIGHT,
            },
            1,
        )
        .unwrap();
        // an interval square and the icon on the same point
        let pair = r.render(&samples(&[(0.0, 0.0), (0.0, 0.0)]));
        assert_eq!(ink_count(&pair.overlay), 1);
        assert_eq!(pair.overlay.get_pixel(28, 18), &INK);
    }

    #[test]
    fn rendering_is_repeatable() {
        let r = renderer(3);
        let trajectory = samples(&[(1.0, 1.0), (2.0, 3.0), (5.0, 8.0), (13.0, 21.0), (-4.0, -9.0)]);
        let first = r.render(&trajectory);
        let second = r.render(&trajectory);
        assert_eq!(first, second);
        assert_eq!(r.render(&[]).base, first.base);
    }

    #[test]
    fn off_raster_points_are_clipped() {
        let r = renderer(2);
        let pair = r.render(&samples(&[(80.0, -100.0), (-80.0, 100.0), (60.0, 100.0)]));
        assert_eq!(pair.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn far_off_raster_positions_are_skipped() {
        let r = renderer(1);
        let trajectory = samples(&[
            (0.0, -1e12),
            (1e12, 0.0),
            (-1e12, 1e12),
            (0.0, 0.0),
        ]);
        let pair = r.render(&trajectory);
        // only the icon at (30, 20) is drawn
        assert_eq!(ink_count(&pair.overlay), 25);

        let r = renderer(100);
        let pair = r.render(&samples(&[(0.0, f64::MAX), (0.0, f64::MIN), (0.0, 0.0)]));
        assert_eq!(ink_count(&pair.overlay), 25);
    }

    #[test]
    fn rotation_flips_both_layers() {
        let r = renderer(30).rotated(true);
        let pair = r.render(&samples(&[(10.0, -20.0), (-10.0, 20.0)]));
        assert_eq!(pair.base.get_pixel(WIDTH - 1 - 3, 0), &INK);
        assert_eq!(pair.overlay.get_pixel(WIDTH - 1 - 11, HEIGHT - 1 - 10), &INK);
        assert_eq!(pair.overlay.get_pixel(WIDTH - 1 - 10, HEIGHT - 1 - 10), &PAPER);
    }

    #[test]
    fn oversized_icon_is_rejected() {
        let icon = GrayImage::from_pixel(WIDTH + 1, 2, Luma([0]));
        let map = GrayImage::from_pixel(WIDTH, HEIGHT, PAPER);
        let err = TrajectoryRenderer::new(
            Assets::new(map, icon).unwrap(),
            projector(),
            RasterSize {
                width: WIDTH,
                height: HEIGHT,
            },
            30,
        )
        .err()
        .unwrap();
        assert!(matches!(err, RenderError::IconTooLarge { .. }));
    }
}
