//! Routing error taxonomy (spec §7). Infrastructure/transport concerns (HTTP
//! status mapping, request-id propagation) live in the server crate; this enum
//! carries only the classification a gateway failure or routing miss can produce.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Consumer point is outside configured franchise zones.")]
    OutsideFranchise,

    #[error("No fiber nodes available in resolved franchise.")]
    NoFiberNode,

    #[error("Nearest fiber node geometry could not be resolved.")]
    FiberNodeGeometryMissing,

    #[error("Road-node snapping failed for franchise subgraph.")]
    RoadSnapFailed,

    #[error("No route could be computed inside the franchise road subgraph.")]
    RouteNotFound,

    #[error("spatial gateway error: {0}")]
    Gateway(#[from] anyhow::Error),
}

impl RouteError {
    /// Stable machine-readable code from spec §7's taxonomy table.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutsideFranchise => "outside_franchise",
            Self::NoFiberNode => "no_fiber_node",
            Self::FiberNodeGeometryMissing => "fiber_node_geometry_missing",
            Self::RoadSnapFailed => "road_snap_failed",
            Self::RouteNotFound => "route_not_found",
            Self::Gateway(_) => "internal_error",
        }
    }

    /// True for the four user-visible routing failures (400); false for internal
    /// inconsistencies (fiber_node_geometry_missing, gateway errors) which are 500.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::OutsideFranchise | Self::NoFiberNode | Self::RoadSnapFailed | Self::RouteNotFound
        )
    }
}
