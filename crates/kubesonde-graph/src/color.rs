//! Deterministic node colors per deployment or ungrouped pod.

use kubesonde_core::{Graph, GraphNode, INTERNET_ID, TEST_POD_ID};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::cluster::deployments;

pub type ColorMap = BTreeMap<String, String>;

pub const TEST_POD_COLOR: &str = "red";
pub const INTERNET_COLOR: &str = "#FFBF00";

/// Assigns one color to each id. Implementations must be deterministic for a
/// given configuration and id list.
pub trait Palette {
    fn assign_colors(&self, ids: &[String]) -> ColorMap;
}

impl<F> Palette for F
where
    F: Fn(&[String]) -> ColorMap,
{
    fn assign_colors(&self, ids: &[String]) -> ColorMap {
        self(ids)
    }
}

fn stable_u32(s: &str) -> u32 {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut h);
    (h.finish() & 0xFFFF_FFFF) as u32
}

/// Light pastel colors, spread around the hue circle from a seeded start.
/// The same seed gives the same colors for builds with the same Rust
/// toolchain; `DefaultHasher` output may change between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededPalette {
    seed: u64,
}

impl SeededPalette {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn color_at(&self, index: usize) -> String {
        let start = f64::from(stable_u32(&self.seed.to_string()) % 360);
        let hue = (start + index as f64 * 137.508) % 360.0;
        let jitter = stable_u32(&format!("{}:{index}", self.seed));
        let saturation = 0.55 + f64::from(jitter % 20) / 100.0;
        let lightness = 0.72 + f64::from((jitter >> 8) % 12) / 100.0;
        hsl_to_hex(hue, saturation, lightness)
    }
}

impl Default for SeededPalette {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Palette for SeededPalette {
    fn assign_colors(&self, ids: &[String]) -> ColorMap {
        ids.iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), self.color_at(i)))
            .collect()
    }
}

fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("#{:02X}{:02X}{:02X}", channel(r), channel(g), channel(b))
}

/// Colors for every deployment followed by every pod without one, plus the
/// reserved colors of the probe pod and the internet node.
pub fn build_color_map(nodes: &[GraphNode], palette: &dyn Palette) -> ColorMap {
    let mut ids = deployments(nodes);
    ids.extend(
        nodes
            .iter()
            .filter(|n| n.deployment.is_none())
            .map(|n| n.name.clone()),
    );
    let mut map = palette.assign_colors(&ids);
    map.insert(TEST_POD_ID.to_string(), TEST_POD_COLOR.to_string());
    map.insert(INTERNET_ID.to_string(), INTERNET_COLOR.to_string());
    map
}

fn reserved_color(id: &str) -> Option<&'static str> {
    match id {
        TEST_POD_ID => Some(TEST_POD_COLOR),
        INTERNET_ID => Some(INTERNET_COLOR),
        _ => None,
    }
}

/// Copies the graph with each node colored by its deployment, falling back to
/// its name.
pub fn colored<E: Clone>(graph: &Graph<E>, colors: &ColorMap) -> Graph<E> {
    let nodes = graph
        .nodes
        .iter()
        .map(|node| {
            let color = match reserved_color(&node.id) {
                Some(reserved) => Some(reserved.to_string()),
                None => node
                    .deployment
                    .as_ref()
                    .and_then(|d| colors.get(d))
                    .or_else(|| colors.get(&node.name))
                    .cloned(),
            };
            GraphNode {
                color,
                ..node.clone()
            }
        })
        .collect();
    Graph {
        nodes,
        edges: graph.edges.clone(),
    }
}
