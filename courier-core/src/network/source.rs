//! Pluggable origins for road network data.

use log::{info, warn};

use super::RoadNetwork;
use super::error::{NetworkLoadError, SourceError};

/// Something that can produce a [`RoadNetwork`], such as a map extract on disk.
///
/// Implementations live outside the core crate so that it stays free of I/O.
pub trait NetworkSource {
    /// Human-readable description used in logs and error messages.
    fn describe(&self) -> String;

    /// Produce a network.
    ///
    /// # Errors
    /// Returns the source-specific failure, boxed.
    fn load(&self) -> Result<RoadNetwork, SourceError>;
}

pub(super) fn load_with_fallback<P, F>(
    primary: &P,
    fallback: &F,
) -> Result<RoadNetwork, NetworkLoadError>
where
    P: NetworkSource + ?Sized,
    F: NetworkSource + ?Sized,
{
    let primary_err = match primary.load() {
        Ok(network) => {
            log_loaded(&primary.describe(), &network);
            return Ok(network);
        }
        Err(err) => err,
    };
    warn!(
        "primary road network source {} failed: {primary_err}; trying fallback {}",
        primary.describe(),
        fallback.describe()
    );
    match fallback.load() {
        Ok(network) => {
            log_loaded(&fallback.describe(), &network);
            Ok(network)
        }
        Err(fallback_err) => Err(NetworkLoadError {
            primary_source: primary.describe(),
            primary: primary_err,
            fallback_source: fallback.describe(),
            fallback: fallback_err,
        }),
    }
}

fn log_loaded(source: &str, network: &RoadNetwork) {
    info!(
        "loaded road network from {source}: {} nodes, {} edges",
        network.node_count(),
        network.edge_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::lat_lon;
    use rstest::rstest;
    use std::io;

    struct Fixed(Option<u64>);

    impl NetworkSource for Fixed {
        fn describe(&self) -> String {
            format!("fixed({:?})", self.0)
        }

        fn load(&self) -> Result<RoadNetwork, SourceError> {
            let id = self
                .0
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no extract"))?;
            Ok(RoadNetwork::builder()
                .with_node(id, lat_lon(14.5547, 121.0244))
                .build()?)
        }
    }

    #[rstest]
    fn prefers_primary_source() {
        let network = RoadNetwork::load_with_fallback(&Fixed(Some(1)), &Fixed(Some(2)))
            .unwrap_or_else(|err| panic!("primary should load: {err}"));
        assert!(network.node(1).is_some());
    }

    #[rstest]
    fn falls_back_when_primary_fails() {
        let network = RoadNetwork::load_with_fallback(&Fixed(None), &Fixed(Some(2)))
            .unwrap_or_else(|err| panic!("fallback should load: {err}"));
        assert!(network.node(2).is_some());
    }

    #[rstest]
    fn reports_both_failures() {
        let Err(err) = RoadNetwork::load_with_fallback(&Fixed(None), &Fixed(None)) else {
            panic!("both sources fail");
        };
        assert_eq!(err.primary_source, "fixed(None)");
        assert_eq!(err.primary.to_string(), "no extract");
        assert_eq!(err.fallback.to_string(), "no extract");
    }
}
