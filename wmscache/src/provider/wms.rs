//! WMS GetMap request construction.

use crate::cache::CacheDescription;
use crate::codec::ContentType;
use crate::grid::{LATITUDE_SPAN, LONGITUDE_SPAN};

/// Geographic extent in degrees (EPSG:4326 axis order as sent: lon, lat).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Extent of finest-level tile `(x, y)`, widened by the configured
    /// padding converted from pixels to degrees.
    pub fn for_tile(desc: &CacheDescription, x: u32, y: u32) -> Self {
        let grid = desc.grid();
        let tiles_x = grid.tiles_x() as f64;
        let tiles_y = grid.tiles_y() as f64;
        let tile_width_deg = LONGITUDE_SPAN / tiles_x;
        let tile_height_deg = LATITUDE_SPAN / tiles_y;

        let padding = desc.padding();
        let per_px_x = tile_width_deg / desc.tile_width() as f64;
        let per_px_y = tile_height_deg / desc.tile_height() as f64;

        let left = x as f64 / tiles_x * LONGITUDE_SPAN - LONGITUDE_SPAN / 2.0;
        let top = LATITUDE_SPAN / 2.0 - y as f64 / tiles_y * LATITUDE_SPAN;

        Self {
            min_x: left - padding.left as f64 * per_px_x,
            max_x: left + tile_width_deg + padding.right as f64 * per_px_x,
            max_y: top + padding.top as f64 * per_px_y,
            min_y: top - tile_height_deg - padding.bottom as f64 * per_px_y,
        }
    }

    /// `minX,minY,maxX,maxY` with six decimals.
    pub fn to_query_value(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// One WMS 1.3.0 GetMap request.
#[derive(Debug, Clone, PartialEq)]
pub struct GetMapRequest {
    pub layer: String,
    pub width: u32,
    pub height: u32,
    pub format: ContentType,
    pub bbox: BoundingBox,
}

impl GetMapRequest {
    /// Request for finest-level tile `(x, y)`.
    pub fn for_tile(desc: &CacheDescription, x: u32, y: u32) -> Self {
        Self {
            layer: desc.source().layer().to_string(),
            width: desc.tile_width(),
            height: desc.tile_height(),
            format: desc.source_content_type(),
            bbox: BoundingBox::for_tile(desc, x, y),
        }
    }

    /// Query parameters in protocol order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SERVICE", "WMS".to_string()),
            ("VERSION", "1.3.0".to_string()),
            ("REQUEST", "GetMap".to_string()),
            ("CRS", "EPSG:4326".to_string()),
            ("LAYERS", self.layer.clone()),
            ("STYLES", String::new()),
            ("WIDTH", self.width.to_string()),
            ("HEIGHT", self.height.to_string()),
            ("FORMAT", self.format.id()),
            ("BBOX", self.bbox.to_query_value()),
        ]
    }

    /// Unencoded query string, for logging.
    pub fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&")
    }
}
