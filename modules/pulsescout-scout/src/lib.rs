pub mod browser;
pub mod enricher;
pub mod filter;
pub mod harvester;
pub mod pipeline;
pub mod ranker;
pub mod session;
pub mod surfaces;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
