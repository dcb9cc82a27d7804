//! Storage abstraction traits

mod domain_repository;

pub use domain_repository::DomainRepository;

// Re-export the download-client boundary so consumers depend on one crate.
pub use zone_collector_czds::ZoneFeed;
