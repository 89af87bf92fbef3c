//! Fixed scalar -> RGB colormaps.
//!
//! Each map is a piecewise-linear table over documented control points, so
//! output is deterministic and bit-reproducible without pulling in a plotting
//! library. `hot` uses matplotlib's exact channel breakpoints; the three
//! perceptual maps use their published quarter-point anchors.

use crate::foundation::math::lerp;

/// A control point: position in [0,1] and the RGB value at that position.
type ControlPoint = (f32, [f32; 3]);

/// Black -> red -> yellow -> white ramp (matplotlib `hot` breakpoints:
/// red saturates at t=0.365079, green at t=0.746032).
const HOT: &[ControlPoint] = &[
    (0.0, [0.0416, 0.0, 0.0]),
    (0.365079, [1.0, 0.0, 0.0]),
    (0.746032, [1.0, 1.0, 0.0]),
    (1.0, [1.0, 1.0, 1.0]),
];

/// Dark purple -> pink -> yellow ramp, quarter anchors
/// #0d0887 #9c179e #cc4778 #ed7953 #f0f921.
const PLASMA: &[ControlPoint] = &[
    (0.0, [0.050980, 0.031373, 0.529412]),
    (0.25, [0.611765, 0.090196, 0.619608]),
    (0.5, [0.800000, 0.278431, 0.470588]),
    (0.75, [0.929412, 0.474510, 0.325490]),
    (1.0, [0.941176, 0.976471, 0.129412]),
];

/// Near-black -> purple -> orange -> pale yellow ramp, quarter anchors
/// #000004 #781c6d #bb3754 #ed6925 #fcffa4.
const INFERNO: &[ControlPoint] = &[
    (0.0, [0.0, 0.0, 0.015686]),
    (0.25, [0.470588, 0.109804, 0.427451]),
    (0.5, [0.733333, 0.215686, 0.329412]),
    (0.75, [0.929412, 0.411765, 0.145098]),
    (1.0, [0.988235, 1.0, 0.643137]),
];

/// Purple -> blue -> green -> yellow ramp, quarter anchors
/// #440154 #3b528b #21918c #5ec962 #fde725.
const VIRIDIS: &[ControlPoint] = &[
    (0.0, [0.266667, 0.003922, 0.329412]),
    (0.25, [0.231373, 0.321569, 0.545098]),
    (0.5, [0.129412, 0.568627, 0.549020]),
    (0.75, [0.368627, 0.788235, 0.384314]),
    (1.0, [0.992157, 0.905882, 0.145098]),
];

/// The fixed set of supported colormaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    Hot,
    Plasma,
    Inferno,
    Viridis,
}

impl Default for Colormap {
    fn default() -> Self {
        Self::Hot
    }
}

impl Colormap {
    /// The control points defining this map.
    pub fn control_points(self) -> &'static [(f32, [f32; 3])] {
        match self {
            Self::Hot => HOT,
            Self::Plasma => PLASMA,
            Self::Inferno => INFERNO,
            Self::Viridis => VIRIDIS,
        }
    }

    /// Map a normalized value to RGB in [0,1]. Input outside [0,1] clamps to
    /// the nearest endpoint.
    pub fn sample(self, t: f32) -> [f32; 3] {
        let points = self.control_points();
        let t = t.clamp(0.0, 1.0);

        let mut prev = points[0];
        if t <= prev.0 {
            return prev.1;
        }
        for &next in &points[1..] {
            if t <= next.0 {
                let span = next.0 - prev.0;
                let frac = (t - prev.0) / span;
                return [
                    lerp(prev.1[0], next.1[0], frac),
                    lerp(prev.1[1], next.1[1], frac),
                    lerp(prev.1[2], next.1[2], frac),
                ];
            }
            prev = next;
        }
        prev.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Colormap; 4] = [
        Colormap::Hot,
        Colormap::Plasma,
        Colormap::Inferno,
        Colormap::Viridis,
    ];

    #[test]
    fn endpoints_match_control_points() {
        for map in ALL {
            let points = map.control_points();
            assert_eq!(map.sample(0.0), points[0].1);
            assert_eq!(map.sample(1.0), points[points.len() - 1].1);
        }
    }

    #[test]
    fn hot_saturates_red_at_first_breakpoint() {
        assert_eq!(Colormap::Hot.sample(0.365079), [1.0, 0.0, 0.0]);
        assert_eq!(Colormap::Hot.sample(0.746032), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn interior_samples_interpolate_linearly() {
        // Halfway between viridis anchors 0 and 0.25.
        let [r, g, b] = Colormap::Viridis.sample(0.125);
        let p = Colormap::Viridis.control_points();
        assert!((r - (p[0].1[0] + p[1].1[0]) / 2.0).abs() < 1e-6);
        assert!((g - (p[0].1[1] + p[1].1[1]) / 2.0).abs() < 1e-6);
        assert!((b - (p[0].1[2] + p[1].1[2]) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_input_clamps() {
        for map in ALL {
            assert_eq!(map.sample(-1.0), map.sample(0.0));
            assert_eq!(map.sample(2.0), map.sample(1.0));
        }
    }

    #[test]
    fn control_positions_are_strictly_increasing() {
        for map in ALL {
            let points = map.control_points();
            for pair in points.windows(2) {
                assert!(pair[0].0 < pair[1].0);
            }
            assert_eq!(points[0].0, 0.0);
            assert_eq!(points[points.len() - 1].0, 1.0);
        }
    }

    #[test]
    fn serde_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Colormap::Viridis).unwrap(), "\"viridis\"");
        let map: Colormap = serde_json::from_str("\"hot\"").unwrap();
        assert_eq!(map, Colormap::Hot);
    }
}
