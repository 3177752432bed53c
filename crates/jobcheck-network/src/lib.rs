//! # jobcheck-network
//!
//! 오브젝트 스토리지 어댑터.
//! `jobcheck-core::ports::object_store::ObjectStore`를 GCS JSON API로 구현한다.

pub mod gcs_client;

pub use gcs_client::GcsObjectStore;
